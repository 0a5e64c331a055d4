//! Area-preserving resampling and light-curve arithmetic (spec.md §4.5,
//! §4.6.5, §4.6.6). Kept as a leaf module: it constructs new
//! [`ArbitraryRaster`] values but never reaches back into [`crate::arena`],
//! per Design Note §9 ("keep the resampler a leaf module to avoid a cycle").

use crate::error::EasResult;
use crate::lightcurve::ArbitraryRaster;

/// Turn a raster of pixel-center times into pixel start-time edges (N+1
/// edges for N centers), extrapolating the first and last half-pixel.
fn pixel_start_times(raster: &[f64]) -> Vec<f64> {
    let n = raster.len();
    let mut edges = Vec::with_capacity(n + 1);
    edges.push(raster[0] * 1.5 - raster[1] * 0.5);
    for w in raster.windows(2) {
        edges.push((w[0] + w[1]) / 2.0);
    }
    edges.push(raster[n - 1] * 1.5 - raster[n - 2] * 0.5);
    edges
}

fn pixel_widths(edges: &[f64]) -> Vec<f64> {
    edges.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Piecewise-linear interpolation of `(xp, fp)` at `x`, matching
/// `numpy.interp`'s clamp-to-endpoint behavior outside the input range.
fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[xp.len() - 1] {
        return fp[fp.len() - 1];
    }
    // xp is sorted ascending; linear scan is fine at our pixel counts.
    let mut hi = 1;
    while xp[hi] < x {
        hi += 1;
    }
    let lo = hi - 1;
    let t = (x - xp[lo]) / (xp[hi] - xp[lo]);
    fp[lo] + t * (fp[hi] - fp[lo])
}

/// Area-preserving resample of `(x_in, y_in)` onto raster `x_new`: the
/// cumulative integral of `y_in` (by linear interpolation between pixel
/// edges) is differenced across each output pixel and divided by its
/// width, so `sum(y_new * width(x_new))` over the overlap equals
/// `integral(y_in)` there.
pub fn resample(x_new: &[f64], x_in: &[f64], y_in: &[f64]) -> Vec<f64> {
    let in_edges = pixel_start_times(x_in);
    let in_widths = pixel_widths(&in_edges);

    let mut cumulative = Vec::with_capacity(in_edges.len());
    cumulative.push(0.0);
    let mut running = 0.0;
    for (y, w) in y_in.iter().zip(in_widths.iter()) {
        running += y * w;
        cumulative.push(running);
    }

    let out_edges = pixel_start_times(x_new);
    let out_widths = pixel_widths(&out_edges);

    out_edges
        .windows(2)
        .zip(out_widths.iter())
        .map(|(edge_pair, width)| {
            let hi = interp(edge_pair[1], &in_edges, &cumulative);
            let lo = interp(edge_pair[0], &in_edges, &cumulative);
            (hi - lo) / width
        })
        .collect()
}

/// Resample `other` onto `target`'s time raster (spec.md §4.5/§4.6.5).
/// Uncertainties combine in quadrature; flags combine as an elementwise
/// Euclidean norm (any non-zero flag on either side survives); metadata is
/// unioned with the right operand winning conflicts.
pub fn resample_onto(target: &ArbitraryRaster, other: &ArbitraryRaster) -> ArbitraryRaster {
    let fluxes = resample(&target.times, &other.times, &other.fluxes);
    let uncertainties = resample(&target.times, &other.times, &other.uncertainties);
    let flags = resample(&target.times, &other.times, &other.flags);
    ArbitraryRaster {
        times: target.times.clone(),
        fluxes,
        uncertainties,
        flags,
        metadata: other.metadata.clone(),
    }
}

fn combine_metadata(
    left: &std::collections::HashMap<String, String>,
    right: &std::collections::HashMap<String, String>,
) -> std::collections::HashMap<String, String> {
    let mut merged = left.clone();
    for (k, v) in right {
        merged.insert(k.clone(), v.clone());
    }
    merged
}

fn quadrature(a: f64, b: f64) -> f64 {
    a.hypot(b)
}

enum ArithOp {
    Add,
    Sub,
    Mul,
}

fn arithmetic(left: &ArbitraryRaster, right: &ArbitraryRaster, op: ArithOp) -> EasResult<ArbitraryRaster> {
    let right_resampled = resample_onto(left, right);
    let fluxes: Vec<f64> = left
        .fluxes
        .iter()
        .zip(right_resampled.fluxes.iter())
        .map(|(&a, &b)| match op {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
        })
        .collect();
    let uncertainties: Vec<f64> = left
        .uncertainties
        .iter()
        .zip(right_resampled.uncertainties.iter())
        .map(|(&a, &b)| quadrature(a, b))
        .collect();
    let flags: Vec<f64> = left
        .flags
        .iter()
        .zip(right_resampled.flags.iter())
        .map(|(&a, &b)| quadrature(a, b))
        .collect();
    let metadata = combine_metadata(&left.metadata, &right.metadata);
    ArbitraryRaster::with_fields(left.times.clone(), fluxes, uncertainties, flags, metadata)
}

pub fn add(left: &ArbitraryRaster, right: &ArbitraryRaster) -> EasResult<ArbitraryRaster> {
    arithmetic(left, right, ArithOp::Add)
}

pub fn sub(left: &ArbitraryRaster, right: &ArbitraryRaster) -> EasResult<ArbitraryRaster> {
    arithmetic(left, right, ArithOp::Sub)
}

pub fn multiply(left: &ArbitraryRaster, right: &ArbitraryRaster) -> EasResult<ArbitraryRaster> {
    arithmetic(left, right, ArithOp::Mul)
}

/// Rebin `source` onto `arange(min(t), max(t), cadence_days)`, forcing the
/// first and last output fluxes to 1.0 to suppress edge artifacts (spec.md
/// §4.6.6 / scenario S6).
pub fn rebin_to_cadence(source: &ArbitraryRaster, cadence_days: f64) -> EasResult<ArbitraryRaster> {
    let t_start = source.times[0];
    let t_end = *source.times.last().unwrap();
    let mut new_times = Vec::new();
    let mut t = t_start;
    while t < t_end {
        new_times.push(t);
        t += cadence_days;
    }
    if new_times.len() < 3 {
        return Err(crate::error::EasError::InvalidLightCurve(
            "binning cadence too coarse for source duration".to_string(),
        ));
    }

    let mut fluxes = resample(&new_times, &source.times, &source.fluxes);
    let uncertainties = resample(&new_times, &source.times, &source.uncertainties);
    let flags = resample(&new_times, &source.times, &source.flags);
    let n = fluxes.len();
    fluxes[0] = 1.0;
    fluxes[n - 1] = 1.0;

    ArbitraryRaster::with_fields(new_times, fluxes, uncertainties, flags, source.metadata.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_preserves_total_area_on_constant_signal() {
        let x_in: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let y_in = vec![2.0; x_in.len()];
        let x_new: Vec<f64> = (0..10).map(|i| i as f64 * 2.0 + 0.5).collect();
        let y_new = resample(&x_new, &x_in, &y_in);
        for y in y_new {
            assert!((y - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn multiply_combines_uncertainties_in_quadrature() {
        let left = ArbitraryRaster::with_fields(
            vec![0.0, 1.0, 2.0, 3.0],
            vec![1.0, 1.0, 1.0, 1.0],
            vec![3.0, 3.0, 3.0, 3.0],
            vec![0.0, 0.0, 0.0, 0.0],
            Default::default(),
        )
        .unwrap();
        let right = ArbitraryRaster::with_fields(
            vec![0.0, 1.0, 2.0, 3.0],
            vec![1.0, 1.0, 1.0, 1.0],
            vec![4.0, 4.0, 4.0, 4.0],
            vec![0.0, 0.0, 0.0, 0.0],
            Default::default(),
        )
        .unwrap();
        let result = multiply(&left, &right).unwrap();
        for u in result.uncertainties {
            assert!((u - 5.0).abs() < 1e-6);
        }
    }

    #[test]
    fn rebin_forces_unity_at_edges() {
        let times: Vec<f64> = (0..100).map(|i| i as f64 * 0.01).collect();
        let fluxes: Vec<f64> = times.iter().map(|t| 1.0 - 0.1 * (t - 0.5).abs()).collect();
        let lc = ArbitraryRaster::new(times, fluxes).unwrap();
        let rebinned = rebin_to_cadence(&lc, 0.1).unwrap();
        assert_eq!(*rebinned.fluxes.first().unwrap(), 1.0);
        assert_eq!(*rebinned.fluxes.last().unwrap(), 1.0);
    }

    #[test]
    fn rebin_rejects_cadence_too_coarse() {
        let times = vec![0.0, 1.0, 2.0, 3.0];
        let fluxes = vec![1.0, 1.0, 1.0, 1.0];
        let lc = ArbitraryRaster::new(times, fluxes).unwrap();
        assert!(rebin_to_cadence(&lc, 10.0).is_err());
    }
}
