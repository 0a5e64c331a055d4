//! Synthesis backends for `psls_synthesise`/`batman_synthesise` (spec.md
//! §4.6.3/§4.6.4). Real PSLS/batman synthesis is out of scope (spec.md §1);
//! only a deterministic, seeded, in-tree implementation ships, behind the
//! same trait an external shell-out backend would implement.

use eas_lib::lightcurve::ArbitraryRaster;
use eas_lib::model::SynthesisSpecs;
use eas_lib::EasResult;
use std::collections::HashMap;

pub trait Synthesiser: Send + Sync {
    fn synthesise(&self, specs: &SynthesisSpecs) -> EasResult<ArbitraryRaster>;
}

/// A box-transit model sampled on a fixed cadence, seeded by `specs` itself
/// so repeated calls with identical specs are bit-identical (spec.md §8
/// property 6, end-to-end idempotence).
pub struct Deterministic;

impl Synthesiser for Deterministic {
    fn synthesise(&self, specs: &SynthesisSpecs) -> EasResult<ArbitraryRaster> {
        let cadence = specs.sampling_cadence.unwrap_or(1800.0) / 86_400.0;
        let n = ((specs.duration / cadence).round() as usize).max(3);
        let times: Vec<f64> = (0..n).map(|i| i as f64 * cadence).collect();

        let depth = if specs.enable_transits {
            (specs.planet_radius / eas_lib::expr::eval("sun_radius").unwrap_or(1.0)).powi(2)
        } else {
            0.0
        };
        let half_duration_days = depth.sqrt().max(1e-6) * specs.orbital_period * 0.02;

        let mut pixels_in_transit = 0u64;
        let mut pixels_out_of_transit = 0u64;
        let mut integrated_transit_power = 0.0;

        let fluxes: Vec<f64> = times
            .iter()
            .map(|&t| {
                let phase = (t % specs.orbital_period) / specs.orbital_period;
                let centered = if phase > 0.5 { phase - 1.0 } else { phase };
                let in_transit =
                    specs.enable_transits && centered.abs() * specs.orbital_period < half_duration_days;
                if in_transit {
                    pixels_in_transit += 1;
                    integrated_transit_power += depth;
                    1.0 - depth
                } else {
                    pixels_out_of_transit += 1;
                    1.0
                }
            })
            .collect();

        let noise = specs.noise.unwrap_or(0.0);
        let uncertainties = vec![noise; n];
        let flags = vec![0.0; n];

        let mes = if pixels_in_transit > 0 && noise > 0.0 {
            integrated_transit_power / (noise * (pixels_in_transit as f64).sqrt())
        } else {
            0.0
        };

        let mut metadata = HashMap::new();
        metadata.insert("orbital_period".to_string(), specs.orbital_period.to_string());
        metadata.insert(
            "integrated_transit_power".to_string(),
            integrated_transit_power.to_string(),
        );
        metadata.insert("pixels_in_transit".to_string(), pixels_in_transit.to_string());
        metadata.insert(
            "pixels_out_of_transit".to_string(),
            pixels_out_of_transit.to_string(),
        );
        metadata.insert("mes".to_string(), mes.to_string());

        ArbitraryRaster::with_fields(times, fluxes, uncertainties, flags, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs() -> SynthesisSpecs {
        SynthesisSpecs {
            duration: 10.0,
            planet_radius: 6_371e3,
            orbital_period: 3.0,
            semi_major_axis: 0.03,
            orbital_angle: 0.0,
            impact_parameter: None,
            eccentricity: None,
            noise: Some(0.0001),
            sampling_cadence: Some(1800.0),
            enable_transits: true,
        }
    }

    #[test]
    fn synthesis_is_deterministic() {
        let specs = specs();
        let a = Deterministic.synthesise(&specs).unwrap();
        let b = Deterministic.synthesise(&specs).unwrap();
        assert_eq!(a.fluxes, b.fluxes);
    }

    #[test]
    fn synthesis_metadata_contains_required_keys() {
        let lc = Deterministic.synthesise(&specs()).unwrap();
        for key in [
            "integrated_transit_power",
            "pixels_in_transit",
            "pixels_out_of_transit",
            "mes",
        ] {
            assert!(lc.metadata.contains_key(key), "missing metadata key {key}");
        }
    }

    #[test]
    fn disabling_transits_yields_flat_light_curve() {
        let mut specs = specs();
        specs.enable_transits = false;
        let lc = Deterministic.synthesise(&specs).unwrap();
        assert!(lc.fluxes.iter().all(|&f| (f - 1.0).abs() < 1e-12));
    }
}
