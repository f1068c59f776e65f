//! Small numeric helpers shared by the supervisor's speed and path math.
//!
//! All functions are allocation-free and operate on caller-provided slices.

/// Linear interpolation of `x` over the sample points `(xp, fp)`.
///
/// `xp` must be sorted ascending. Outside the sample range the nearest
/// endpoint value is returned (clamped extrapolation).
pub fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    debug_assert_eq!(xp.len(), fp.len());
    debug_assert!(!xp.is_empty());

    if x <= xp[0] {
        return fp[0];
    }
    let last = xp.len() - 1;
    if x >= xp[last] {
        return fp[last];
    }
    // xp is tiny in practice (2..33 points); linear scan beats bisection.
    for i in 1..=last {
        if x < xp[i] {
            let w = (x - xp[i - 1]) / (xp[i] - xp[i - 1]);
            return fp[i - 1] + w * (fp[i] - fp[i - 1]);
        }
    }
    fp[last]
}

/// Arithmetic mean of a slice. Returns 0.0 for an empty slice.
pub fn mean(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    v.iter().sum::<f64>() / v.len() as f64
}

/// Numerical gradient dy/dx on a non-uniform grid, written into `out`.
///
/// Interior points use the second-order weighted central difference; the
/// endpoints use one-sided differences. `y`, `x` and `out` must have the
/// same length ≥ 2.
pub fn gradient(y: &[f64], x: &[f64], out: &mut [f64]) {
    let n = y.len();
    debug_assert_eq!(x.len(), n);
    debug_assert_eq!(out.len(), n);
    debug_assert!(n >= 2);

    out[0] = (y[1] - y[0]) / (x[1] - x[0]);
    out[n - 1] = (y[n - 1] - y[n - 2]) / (x[n - 1] - x[n - 2]);
    for i in 1..n - 1 {
        let hd = x[i] - x[i - 1];
        let hs = x[i + 1] - x[i];
        out[i] = (hd * hd * y[i + 1] + (hs * hs - hd * hd) * y[i] - hs * hs * y[i - 1])
            / (hs * hd * (hd + hs));
    }
}
