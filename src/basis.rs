//! Canonical response shapes (bases) of event-related components.
use std::f64::consts::PI;

/// Returns a Hann window of `num_samples` samples, equal to 1 at its center.
pub fn hann_window(num_samples: usize) -> Vec<f64> {
    match num_samples {
        0 => vec![],
        1 => vec![1.0],
        n => (0..n)
            .map(|k| 0.5 * (1.0 - (2.0 * PI * k as f64 / (n - 1) as f64).cos()))
            .collect(),
    }
}

/// Returns a Hann window of `duration` seconds centered at `offset` seconds after the event onset.
/// The window is preceded by zeros up to its start. If the offset is shorter than half the duration, the
/// window cannot start before the event onset: it starts at the onset and peaks at half the duration
/// rather than at `offset`.
pub fn hanning(duration: f64, offset: f64, sfreq: f64) -> Vec<f64> {
    let window = hann_window((duration * sfreq).round_ties_even().max(0.0) as usize);
    let pad = (offset * sfreq - window.len() as f64 / 2.0)
        .round_ties_even()
        .max(0.0) as usize;

    let mut basis = vec![0.0; pad];
    basis.extend(window);
    basis
}

/// A positive deflection peaking around 100 ms.
pub fn p100(sfreq: f64) -> Vec<f64> {
    hanning(0.1, 0.1, sfreq)
}

/// A negative deflection peaking around 170 ms.
pub fn n170(sfreq: f64) -> Vec<f64> {
    hanning(0.15, 0.17, sfreq).iter().map(|x| -x).collect()
}

/// A positive deflection peaking around 300 ms.
pub fn p300(sfreq: f64) -> Vec<f64> {
    hanning(0.3, 0.3, sfreq)
}

/// A negative deflection peaking around 400 ms.
pub fn n400(sfreq: f64) -> Vec<f64> {
    hanning(0.4, 0.4, sfreq).iter().map(|x| -x).collect()
}
