//! Light-curve product types (spec.md §3). Two shapes: [`ArbitraryRaster`]
//! (strictly increasing times) and [`FixedStep`] (a start time and a fixed
//! step). Arithmetic and rebinning live in [`crate::resample`] to keep this
//! module a leaf the resampler can depend on without creating a cycle.

use crate::error::{EasError, EasResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A light curve sampled on an arbitrary (but strictly increasing) raster of
/// times, measured in days.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArbitraryRaster {
    pub times: Vec<f64>,
    pub fluxes: Vec<f64>,
    #[serde(default)]
    pub uncertainties: Vec<f64>,
    #[serde(default)]
    pub flags: Vec<f64>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl ArbitraryRaster {
    pub fn new(times: Vec<f64>, fluxes: Vec<f64>) -> EasResult<Self> {
        let uncertainties = vec![0.0; fluxes.len()];
        let flags = vec![0.0; fluxes.len()];
        Self::with_fields(times, fluxes, uncertainties, flags, HashMap::new())
    }

    pub fn with_fields(
        times: Vec<f64>,
        fluxes: Vec<f64>,
        uncertainties: Vec<f64>,
        flags: Vec<f64>,
        metadata: HashMap<String, String>,
    ) -> EasResult<Self> {
        let lc = ArbitraryRaster {
            times,
            fluxes,
            uncertainties,
            flags,
            metadata,
        };
        lc.validate()?;
        Ok(lc)
    }

    /// Invariant from spec.md §3: all four arrays equal length >= 3; `times`
    /// strictly monotonic.
    pub fn validate(&self) -> EasResult<()> {
        let n = self.times.len();
        if n < 3 {
            return Err(EasError::InvalidLightCurve(format!(
                "raster must have at least 3 points, got {n}"
            )));
        }
        if self.fluxes.len() != n || self.uncertainties.len() != n || self.flags.len() != n {
            return Err(EasError::InvalidLightCurve(
                "times/fluxes/uncertainties/flags must have equal length".to_string(),
            ));
        }
        if !self.times.windows(2).all(|w| w[1] > w[0]) {
            return Err(EasError::InvalidLightCurve(
                "times must be strictly increasing".to_string(),
            ));
        }
        Ok(())
    }

    /// Interquartile-mean estimate of the sampling interval, rounded to
    /// whole seconds then converted back to days (spec.md §4.6.7).
    pub fn estimate_sampling_interval(&self) -> f64 {
        let mut diffs: Vec<f64> = self.times.windows(2).map(|w| w[1] - w[0]).collect();
        diffs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let start = (diffs.len() as f64 * 0.25) as usize;
        let end = (diffs.len() as f64 * 0.75) as usize;
        let slice = &diffs[start..end.max(start + 1).min(diffs.len())];
        let mean = slice.iter().sum::<f64>() / slice.len() as f64;
        (mean * 86_400.0).round() / 86_400.0
    }

    /// Run the fixed-step gap check described in spec.md §4.6.7 / §8
    /// property 5. Returns the indices (into `diff(times)`) where a gap was
    /// found, each tagged with how many points were missing.
    pub fn check_fixed_step(&self) -> Vec<FixedStepError> {
        let spacing = self.estimate_sampling_interval();
        let step_tol = 1e-4 * spacing;
        let ratio_tol = 1e-4;
        let mut errors = Vec::new();
        for (index, window) in self.times.windows(2).enumerate() {
            let step = window[1] - window[0];
            if (step - spacing).abs() <= step_tol {
                continue;
            }
            let points_missed = step / spacing - 1.0;
            let rounded = points_missed.round();
            if (points_missed - rounded).abs() <= ratio_tol && rounded >= 1.0 {
                errors.push(FixedStepError {
                    index,
                    points_missing: rounded as i64,
                    unexpected_step: None,
                });
            } else {
                errors.push(FixedStepError {
                    index,
                    points_missing: 0,
                    unexpected_step: Some(step),
                });
            }
        }
        errors
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FixedStepError {
    pub index: usize,
    /// Number of points missing, classified as "`k` points missing".
    pub points_missing: i64,
    /// Set when the gap didn't resolve to an integer multiple of the
    /// estimated spacing.
    pub unexpected_step: Option<f64>,
}

/// A light curve sampled at a fixed cadence starting at `t0`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixedStep {
    pub t0: f64,
    pub dt: f64,
    pub fluxes: Vec<f64>,
    #[serde(default)]
    pub uncertainties: Vec<f64>,
    #[serde(default)]
    pub flags: Vec<f64>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl FixedStep {
    pub fn new(t0: f64, dt: f64, fluxes: Vec<f64>) -> EasResult<Self> {
        if dt <= 0.0 {
            return Err(EasError::InvalidLightCurve(
                "dt must be strictly positive".to_string(),
            ));
        }
        let n = fluxes.len();
        Ok(FixedStep {
            t0,
            dt,
            uncertainties: vec![0.0; n],
            flags: vec![0.0; n],
            fluxes,
            metadata: HashMap::new(),
        })
    }
}

/// Either product shape, as stored in the [`crate::arena`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LightCurveProduct {
    ArbitraryRaster(ArbitraryRaster),
    FixedStep(FixedStep),
}

impl LightCurveProduct {
    pub fn as_arbitrary_raster(&self) -> EasResult<&ArbitraryRaster> {
        match self {
            LightCurveProduct::ArbitraryRaster(r) => Ok(r),
            LightCurveProduct::FixedStep(_) => Err(EasError::InvalidLightCurve(
                "expected an arbitrary-raster product, found fixed-step".to_string(),
            )),
        }
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        match self {
            LightCurveProduct::ArbitraryRaster(r) => &r.metadata,
            LightCurveProduct::FixedStep(f) => &f.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_raster() {
        let err = ArbitraryRaster::new(vec![0.0, 1.0], vec![1.0, 1.0]).unwrap_err();
        assert!(matches!(err, EasError::InvalidLightCurve(_)));
    }

    #[test]
    fn rejects_non_monotonic_times() {
        let err = ArbitraryRaster::new(vec![0.0, 2.0, 1.0], vec![1.0, 1.0, 1.0]).unwrap_err();
        assert!(matches!(err, EasError::InvalidLightCurve(_)));
    }

    #[test]
    fn fixed_step_rejects_nonpositive_dt() {
        assert!(FixedStep::new(0.0, 0.0, vec![1.0, 1.0, 1.0]).is_err());
    }

    #[test]
    fn fixed_step_check_finds_no_gaps_on_uniform_raster() {
        let times: Vec<f64> = (0..20).map(|i| i as f64 / 86_400.0 * 10.0).collect();
        let fluxes = vec![1.0; times.len()];
        let lc = ArbitraryRaster::new(times, fluxes).unwrap();
        assert!(lc.check_fixed_step().is_empty());
    }

    #[test]
    fn fixed_step_check_finds_injected_gap() {
        let dt = 10.0 / 86_400.0;
        let mut times: Vec<f64> = (0..10).map(|i| i as f64 * dt).collect();
        // Inject a gap of 3*dt after the 5th point (step becomes 4*dt).
        for t in times.iter_mut().skip(5) {
            *t += 3.0 * dt;
        }
        let fluxes = vec![1.0; times.len()];
        let lc = ArbitraryRaster::new(times, fluxes).unwrap();
        let errors = lc.check_fixed_step();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].index, 4);
        assert_eq!(errors[0].points_missing, 3);
    }
}
