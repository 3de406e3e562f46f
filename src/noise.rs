//! Module implementing background noise models.
//!
//! Every model produces noise of unit scale with its own spectral or statistical character; the noise level
//! is applied afterwards by [`NoiseModel::generate`], so that it never changes the shape of the spectrum.
use std::fmt;

use nalgebra::{Cholesky, DMatrix, DVector};
use rand::RngCore;
use rand_distr::{Distribution, StandardNormal};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::signal::ContinuousSignal;

/// The default number of samples discarded at the start of an autoregressive process.
pub const AR_BURN_IN: usize = 100;

/// A model of background noise.
pub trait NoiseModel: fmt::Debug {
    /// The factor applied to the generated noise.
    fn noiselevel(&self) -> f64;

    /// The channel count of the produced noise if fixed by the model, or `None` if it follows the target signal.
    fn num_channels(&self) -> Option<usize> {
        None
    }

    /// The number of samples of the noise, if the model has an intrinsic length.
    fn required_len(&self) -> Option<usize> {
        None
    }

    /// Generate noise of unit scale, with independent channels.
    fn generate_unscaled(
        &self,
        num_channels: usize,
        num_samples: usize,
        rng: &mut dyn RngCore,
    ) -> Result<ContinuousSignal, SimError>;

    /// Generate noise and scale it by the noise level.
    fn generate(
        &self,
        num_channels: usize,
        num_samples: usize,
        rng: &mut dyn RngCore,
    ) -> Result<ContinuousSignal, SimError> {
        let mut noise = self.generate_unscaled(num_channels, num_samples, rng)?;
        noise.scale(self.noiselevel());
        Ok(noise)
    }
}

fn white_samples(num_samples: usize, rng: &mut dyn RngCore) -> Vec<f64> {
    (0..num_samples)
        .map(|_| Distribution::<f64>::sample(&StandardNormal, rng))
        .collect()
}

fn per_channel<F>(num_channels: usize, mut channel: F) -> Result<ContinuousSignal, SimError>
where
    F: FnMut() -> Result<Vec<f64>, SimError>,
{
    let rows = (0..num_channels)
        .map(|_| channel())
        .collect::<Result<Vec<_>, _>>()?;
    ContinuousSignal::from_rows(&rows)
}

/// The absence of noise.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize, Default)]
pub struct NoNoise;

impl NoiseModel for NoNoise {
    fn noiselevel(&self) -> f64 {
        0.0
    }

    fn generate_unscaled(
        &self,
        num_channels: usize,
        num_samples: usize,
        _rng: &mut dyn RngCore,
    ) -> Result<ContinuousSignal, SimError> {
        Ok(ContinuousSignal::zeros(num_channels, num_samples))
    }
}

/// White Gaussian noise.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct WhiteNoise {
    pub noiselevel: f64,
}

impl WhiteNoise {
    pub fn new(noiselevel: f64) -> Self {
        WhiteNoise { noiselevel }
    }
}

impl NoiseModel for WhiteNoise {
    fn noiselevel(&self) -> f64 {
        self.noiselevel
    }

    fn generate_unscaled(
        &self,
        num_channels: usize,
        num_samples: usize,
        rng: &mut dyn RngCore,
    ) -> Result<ContinuousSignal, SimError> {
        per_channel(num_channels, || Ok(white_samples(num_samples, rng)))
    }
}

/// Gaussian noise with a power spectrum proportional to `1 / f^exponent`, normalized to unit variance.
/// The exponent is 1 for pink noise and 2 for red (Brownian) noise.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct PowerLawNoise {
    pub exponent: f64,
    pub noiselevel: f64,
}

impl PowerLawNoise {
    pub fn new(exponent: f64, noiselevel: f64) -> Self {
        PowerLawNoise {
            exponent,
            noiselevel,
        }
    }

    /// Pink noise, with equal power per octave.
    pub fn pink(noiselevel: f64) -> Self {
        PowerLawNoise::new(1.0, noiselevel)
    }

    /// Red (Brownian) noise.
    pub fn red(noiselevel: f64) -> Self {
        PowerLawNoise::new(2.0, noiselevel)
    }

    fn shape(&self, white: Vec<f64>, planner: &mut FftPlanner<f64>) -> Vec<f64> {
        let n = white.len();
        if n == 0 {
            return white;
        }

        let mut buffer: Vec<Complex<f64>> =
            white.into_iter().map(|x| Complex::new(x, 0.0)).collect();
        planner.plan_fft_forward(n).process(&mut buffer);

        // the gain only depends on the distance to DC, which keeps the spectrum hermitian
        for (k, bin) in buffer.iter_mut().enumerate() {
            let frequency = k.min(n - k) as f64;
            *bin = match frequency == 0.0 {
                true => Complex::new(0.0, 0.0),
                false => *bin * frequency.powf(-self.exponent / 2.0),
            };
        }
        planner.plan_fft_inverse(n).process(&mut buffer);

        let shaped: Vec<f64> = buffer.iter().map(|c| c.re / n as f64).collect();
        let std = (shaped.iter().map(|x| x * x).sum::<f64>() / n as f64).sqrt();
        match std > 0.0 {
            true => shaped.iter().map(|x| x / std).collect(),
            false => shaped,
        }
    }
}

impl NoiseModel for PowerLawNoise {
    fn noiselevel(&self) -> f64 {
        self.noiselevel
    }

    fn generate_unscaled(
        &self,
        num_channels: usize,
        num_samples: usize,
        rng: &mut dyn RngCore,
    ) -> Result<ContinuousSignal, SimError> {
        if !self.exponent.is_finite() {
            return Err(SimError::InvalidParameter(format!(
                "The spectral exponent must be finite, got {}",
                self.exponent
            )));
        }
        let mut planner = FftPlanner::new();
        per_channel(num_channels, || {
            Ok(self.shape(white_samples(num_samples, rng), &mut planner))
        })
    }
}

/// Autoregressive noise, `x[t] = sum_i coefficients[i] * x[t - 1 - i] + e[t]` with white Gaussian innovations.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct AutoRegressiveNoise {
    pub coefficients: Vec<f64>,
    pub noiselevel: f64,
    /// The number of samples discarded at the start of the process.
    #[serde(default = "default_burn_in")]
    pub burn_in: usize,
}

fn default_burn_in() -> usize {
    AR_BURN_IN
}

impl AutoRegressiveNoise {
    pub fn new(coefficients: Vec<f64>, noiselevel: f64) -> Self {
        AutoRegressiveNoise {
            coefficients,
            noiselevel,
            burn_in: AR_BURN_IN,
        }
    }
}

impl NoiseModel for AutoRegressiveNoise {
    fn noiselevel(&self) -> f64 {
        self.noiselevel
    }

    fn generate_unscaled(
        &self,
        num_channels: usize,
        num_samples: usize,
        rng: &mut dyn RngCore,
    ) -> Result<ContinuousSignal, SimError> {
        let order = self.coefficients.len();
        per_channel(num_channels, || {
            let innovations = white_samples(self.burn_in + num_samples, rng);
            let mut process: Vec<f64> = Vec::with_capacity(innovations.len());
            for (t, innovation) in innovations.into_iter().enumerate() {
                let past: f64 = (0..order.min(t))
                    .map(|i| self.coefficients[i] * process[t - 1 - i])
                    .sum();
                process.push(past + innovation);
            }
            Ok(process.split_off(self.burn_in))
        })
    }
}

/// Gaussian noise with an exponentially decaying autocovariance `exp(-|i - j| / length_scale)`.
/// The noise is generated by independent blocks of `block_len` samples, each correlated through the Cholesky
/// factor of the block covariance.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct ExponentialNoise {
    pub length_scale: f64,
    pub block_len: usize,
    pub noiselevel: f64,
}

impl ExponentialNoise {
    pub fn new(length_scale: f64, noiselevel: f64) -> Self {
        ExponentialNoise {
            length_scale,
            block_len: 1000,
            noiselevel,
        }
    }

    fn cholesky_factor(&self, len: usize) -> Result<DMatrix<f64>, SimError> {
        let covariance = DMatrix::from_fn(len, len, |i, j| {
            (-(i as f64 - j as f64).abs() / self.length_scale).exp()
        });
        Cholesky::new(covariance).map(|c| c.l()).ok_or_else(|| {
            SimError::InvalidParameter(
                "The exponential covariance is not positive definite".to_string(),
            )
        })
    }
}

impl NoiseModel for ExponentialNoise {
    fn noiselevel(&self) -> f64 {
        self.noiselevel
    }

    fn generate_unscaled(
        &self,
        num_channels: usize,
        num_samples: usize,
        rng: &mut dyn RngCore,
    ) -> Result<ContinuousSignal, SimError> {
        if !(self.length_scale > 0.0) || self.block_len == 0 {
            return Err(SimError::InvalidParameter(format!(
                "Exponential noise needs a positive length scale and block length, got {} and {}",
                self.length_scale, self.block_len
            )));
        }

        let factor = self.cholesky_factor(self.block_len.min(num_samples).max(1))?;
        per_channel(num_channels, || {
            let mut samples = Vec::with_capacity(num_samples);
            while samples.len() < num_samples {
                // the factor of a leading block is the leading block of the factor
                let len = factor.nrows().min(num_samples - samples.len());
                let white = DVector::from_vec(white_samples(len, rng));
                let block = factor.view((0, 0), (len, len)) * white;
                samples.extend(block.iter());
            }
            Ok(samples)
        })
    }
}

/// A fixed, user-supplied noise signal.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct UserNoise {
    pub signal: ContinuousSignal,
    pub noiselevel: f64,
}

impl UserNoise {
    pub fn new(signal: ContinuousSignal, noiselevel: f64) -> Self {
        UserNoise { signal, noiselevel }
    }
}

impl NoiseModel for UserNoise {
    fn noiselevel(&self) -> f64 {
        self.noiselevel
    }

    fn num_channels(&self) -> Option<usize> {
        Some(self.signal.num_channels())
    }

    fn required_len(&self) -> Option<usize> {
        Some(self.signal.len())
    }

    /// Returns the first `num_samples` samples of the user signal.
    /// The function returns an error if the user signal is too short: it is never looped nor extrapolated.
    fn generate_unscaled(
        &self,
        _num_channels: usize,
        num_samples: usize,
        _rng: &mut dyn RngCore,
    ) -> Result<ContinuousSignal, SimError> {
        if self.signal.len() < num_samples {
            return Err(SimError::InsufficientLength {
                required: num_samples,
                available: self.signal.len(),
            });
        }
        let mut noise = self.signal.clone();
        noise.resize(num_samples);
        Ok(noise)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    const SEED: u64 = 42;

    fn mean(x: &[f64]) -> f64 {
        x.iter().sum::<f64>() / x.len() as f64
    }

    fn variance(x: &[f64]) -> f64 {
        let m = mean(x);
        x.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / x.len() as f64
    }

    fn lag_one_correlation(x: &[f64]) -> f64 {
        let m = mean(x);
        let num: f64 = x.windows(2).map(|w| (w[0] - m) * (w[1] - m)).sum();
        num / (variance(x) * x.len() as f64)
    }

    #[test]
    fn test_no_noise() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let noise = NoNoise.generate(2, 10, &mut rng).unwrap();
        assert_eq!(noise, ContinuousSignal::zeros(2, 10));
    }

    #[test]
    fn test_white_noise() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let noise = WhiteNoise::new(2.0).generate(3, 20_000, &mut rng).unwrap();
        assert_eq!(noise.num_channels(), 3);
        assert_eq!(noise.len(), 20_000);

        let channel = noise.channel(0).unwrap();
        assert_relative_eq!(mean(&channel), 0.0, epsilon = 0.1);
        assert_relative_eq!(variance(&channel), 4.0, max_relative = 0.05);
        assert!(lag_one_correlation(&channel).abs() < 0.05);

        // channels are independent
        assert_ne!(noise.channel(0), noise.channel(1));
    }

    #[test]
    fn test_noiselevel_is_applied_after_generation() {
        let model = PowerLawNoise::pink(1.0);
        let unit = model
            .generate(1, 1000, &mut StdRng::seed_from_u64(SEED))
            .unwrap();
        let doubled = PowerLawNoise::pink(2.0)
            .generate(1, 1000, &mut StdRng::seed_from_u64(SEED))
            .unwrap();

        for (a, b) in unit
            .channel(0)
            .unwrap()
            .iter()
            .zip(doubled.channel(0).unwrap())
        {
            assert_relative_eq!(2.0 * a, b);
        }
    }

    #[test]
    fn test_power_law_noise() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let pink = PowerLawNoise::pink(1.0)
            .generate(1, 4096, &mut rng)
            .unwrap()
            .channel(0)
            .unwrap();
        let red = PowerLawNoise::red(1.0)
            .generate(1, 4096, &mut rng)
            .unwrap()
            .channel(0)
            .unwrap();

        assert_relative_eq!(variance(&pink), 1.0, max_relative = 1e-6);
        assert_relative_eq!(variance(&red), 1.0, max_relative = 1e-6);

        // the steeper the spectrum, the smoother the noise
        assert!(lag_one_correlation(&pink) > 0.2);
        assert!(lag_one_correlation(&red) > lag_one_correlation(&pink));

        assert!(PowerLawNoise::pink(1.0)
            .generate(1, 0, &mut rng)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_auto_regressive_noise() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let noise = AutoRegressiveNoise::new(vec![0.9], 1.0)
            .generate(1, 20_000, &mut rng)
            .unwrap()
            .channel(0)
            .unwrap();

        assert_eq!(noise.len(), 20_000);
        assert_relative_eq!(lag_one_correlation(&noise), 0.9, epsilon = 0.02);
        // stationary variance of an AR(1) process
        assert_relative_eq!(variance(&noise), 1.0 / (1.0 - 0.81), max_relative = 0.15);
    }

    #[test]
    fn test_exponential_noise() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let mut model = ExponentialNoise::new(10.0, 1.0);
        model.block_len = 200;
        let noise = model.generate(2, 10_050, &mut rng).unwrap();
        assert_eq!(noise.len(), 10_050);

        let channel = noise.channel(1).unwrap();
        assert_relative_eq!(variance(&channel), 1.0, max_relative = 0.2);
        assert_relative_eq!(
            lag_one_correlation(&channel),
            (-0.1_f64).exp(),
            epsilon = 0.05
        );

        model.length_scale = 0.0;
        assert!(matches!(
            model.generate(1, 10, &mut rng),
            Err(SimError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_user_noise() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let model = UserNoise::new(ContinuousSignal::from_samples(&[1.0, 2.0, 3.0]), 0.5);
        assert_eq!(model.num_channels(), Some(1));
        assert_eq!(model.required_len(), Some(3));

        let noise = model.generate(4, 2, &mut rng).unwrap();
        assert_eq!(noise.channel(0), Some(vec![0.5, 1.0]));
        assert_eq!(noise.num_channels(), 1);

        assert_eq!(
            model.generate(1, 4, &mut rng),
            Err(SimError::InsufficientLength {
                required: 4,
                available: 3
            })
        );
    }
}
