//! FFT-based cross-correlation scorer (spec.md C8 / §4.8).

use context_error::{BoxedError, Context, ErrorKind};
use rustfft::FftPlanner;
use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};

/// The lag window `L` of spec.md §4.8: `XCorr` is evaluated over `tau` in `[-L, L]`.
pub const LAG_WINDOW: usize = 75;

/// The `NumericalError` of spec.md §7: the FFT produced a non-finite value. Fatal — the run is
/// aborted rather than emit a meaningless score.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct NumericalErrorKind;

impl ErrorKind for NumericalErrorKind {
    type Settings = ();
    fn descriptor(&self) -> &'static str {
        "error"
    }
    fn ignored(&self, (): Self::Settings) -> bool {
        false
    }
    fn is_error(&self, (): Self::Settings) -> bool {
        true
    }
}

/// The result of [`score_xcorr`]: the final score plus its two components, kept around for
/// diagnostics and testing against [`direct_correlation`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct XCorrResult {
    /// `R[0] - background`.
    pub xcorr: f64,
    /// The raw correlation at lag 0.
    pub r0: f64,
    /// Mean correlation over the background lag window, excluding `{-1, 0, 1}`.
    pub background: f64,
}

/// Score `v` (observed) against `t` (theoretical) via FFT-based cross-correlation (spec.md
/// §4.8). `lag_window` is `L`; the correlation is evaluated at every lag in `[-L, L]`.
///
/// Implementation contract (spec.md §4.8): `R` is computed via FFT of the zero-padded inputs,
/// inverse FFT of the elementwise product of one transform with the conjugate of the other, and
/// selection of the lag window — `O(B log B)` rather than the `O(B * L)` of direct convolution.
///
/// # Errors
/// Returns a `NumericalError` if the FFT produces a non-finite value anywhere in the lag window;
/// this should not happen on validated (finite) inputs but is checked defensively since a
/// malformed score must never reach the FDR engine.
///
/// # Panics
/// Panics if `v.len() != t.len()`.
pub fn score_xcorr(
    v: &[f64],
    t: &[f64],
    lag_window: usize,
) -> Result<XCorrResult, BoxedError<'static, NumericalErrorKind>> {
    assert_eq!(
        v.len(),
        t.len(),
        "observed and theoretical vectors must share the same bin grid"
    );
    let r = fft_correlation(v, t, lag_window);

    if r.iter().any(|x| !x.is_finite()) {
        return Err(BoxedError::new(
            NumericalErrorKind,
            "Non-finite XCorr value",
            "The FFT-based cross-correlation produced a NaN or infinite value",
            Context::none(),
        ));
    }

    let r0 = r[lag_window];
    let background_sum: f64 = r
        .iter()
        .enumerate()
        .filter_map(|(i, &value)| {
            let lag = i as isize - lag_window as isize;
            (!(-1..=1).contains(&lag)).then_some(value)
        })
        .sum();
    let background_count = (2 * lag_window + 1) - 3;
    let background = if background_count > 0 {
        background_sum / background_count as f64
    } else {
        0.0
    };

    Ok(XCorrResult {
        xcorr: r0 - background,
        r0,
        background,
    })
}

/// Compute `R[tau] = Σ_i v[i] * t[i - tau]` for `tau ∈ [-lag_window, lag_window]` via FFT, per
/// spec.md §4.8. Returns a vector of length `2 * lag_window + 1`, indexed by `tau + lag_window`.
///
/// Zero-pads both inputs to a power of two at least `2 * v.len()`, which is large enough that no
/// lag in `[-lag_window, lag_window]` can wrap around (the true linear cross-correlation has
/// support `[-(B-1), B-1]`), then reads the required lags out of the resulting circular
/// correlation. Runs in `O(B log B)`.
fn fft_correlation(v: &[f64], t: &[f64], lag_window: usize) -> Vec<f64> {
    let b = v.len();
    let n = (2 * b).max(1).next_power_of_two();

    let mut v_c: Vec<Complex<f64>> = v.iter().map(|&x| Complex::new(x, 0.0)).collect();
    v_c.resize(n, Complex::new(0.0, 0.0));
    let mut t_c: Vec<Complex<f64>> = t.iter().map(|&x| Complex::new(x, 0.0)).collect();
    t_c.resize(n, Complex::new(0.0, 0.0));

    let mut planner = FftPlanner::new();
    let forward = planner.plan_fft_forward(n);
    forward.process(&mut v_c);
    forward.process(&mut t_c);

    // Elementwise product with the conjugate of the theoretical transform: the inverse FFT of
    // this is the circular cross-correlation of v and t (IDFT(X * conj(Y))[m] = sum_n x[n]
    // y[(n-m) mod N], i.e. exactly R[m] once the padding above rules out wraparound).
    let mut product: Vec<Complex<f64>> = v_c
        .iter()
        .zip(t_c.iter())
        .map(|(&a, &b)| a * b.conj())
        .collect();

    let inverse = planner.plan_fft_inverse(n);
    inverse.process(&mut product);

    let scale = 1.0 / n as f64;
    (0..=2 * lag_window)
        .map(|offset| {
            let tau = offset as isize - lag_window as isize;
            let index = tau.rem_euclid(n as isize) as usize;
            product[index].re * scale
        })
        .collect()
}

/// Direct (non-FFT) computation of the same lag window, for testing [`score_xcorr`]'s numerical
/// agreement against spec.md §8 item 6 and §4.8's `1e-9` tolerance. `O(B * L)`; not used outside
/// tests.
#[cfg(test)]
fn direct_correlation(v: &[f64], t: &[f64], lag_window: usize) -> Vec<f64> {
    let b = v.len() as isize;
    (0..=2 * lag_window)
        .map(|offset| {
            let tau = offset as isize - lag_window as isize;
            (0..b)
                .map(|i| {
                    let j = i - tau;
                    if j >= 0 && j < b {
                        v[i as usize] * t[j as usize]
                    } else {
                        0.0
                    }
                })
                .sum()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pseudo_random_vector(len: usize, seed: u64) -> Vec<f64> {
        let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
        (0..len)
            .map(|_| {
                state = state
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                ((state >> 33) as f64 / u32::MAX as f64).abs()
            })
            .collect()
    }

    #[test]
    fn fft_correlation_matches_direct_computation() {
        for &b in &[16usize, 50, 200, 1024] {
            let v = pseudo_random_vector(b, 1);
            let t = pseudo_random_vector(b, 2);
            let lag_window = 75.min(b - 1);
            let fft = fft_correlation(&v, &t, lag_window);
            let direct = direct_correlation(&v, &t, lag_window);
            for (a, d) in fft.iter().zip(direct.iter()) {
                assert!((a - d).abs() <= 1e-9, "fft={a} direct={d}");
            }
        }
    }

    #[test]
    fn xcorr_is_r0_minus_background() {
        let v = pseudo_random_vector(200, 3);
        let t = pseudo_random_vector(200, 4);
        let result = score_xcorr(&v, &t, 75).unwrap();
        assert!((result.xcorr - (result.r0 - result.background)).abs() < 1e-12);
    }

    #[test]
    fn perfectly_matched_vectors_score_highest_at_zero_lag() {
        let v = vec![0.0, 0.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let t = v.clone();
        let r = fft_correlation(&v, &t, 3);
        let r0 = r[3];
        assert!(r.iter().all(|&x| x <= r0 + 1e-9));
    }
}
