//! Power-line interference.
use std::f64::consts::PI;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::Artifact;
use crate::error::SimError;
use crate::signal::ContinuousSignal;
use crate::DEFAULT_SAMPLING_RATE;

/// Power-line interference, a sum of sinusoids at multiples of the base frequency.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PowerLineNoise {
    /// The frequency of the power line, in Hz.
    pub base_freq: f64,
    /// The multiples of the base frequency present in the interference.
    pub harmonics: Vec<f64>,
    /// The amplitude of each harmonic, paired with `harmonics`.
    pub weights_harmonics: Vec<f64>,
    /// The sampling rate of the simulated signal, in Hz.
    pub sampling_rate: f64,
    /// Optional per-channel gains; without them the interference is a single channel, identical on every channel.
    #[serde(default)]
    pub channel_weights: Option<Vec<f64>>,
}

impl Default for PowerLineNoise {
    fn default() -> Self {
        PowerLineNoise {
            base_freq: 50.0,
            harmonics: vec![1.0, 3.0, 5.0],
            weights_harmonics: vec![1.0, 1.0, 1.0],
            sampling_rate: DEFAULT_SAMPLING_RATE,
            channel_weights: None,
        }
    }
}

impl PowerLineNoise {
    pub fn new(
        base_freq: f64,
        harmonics: Vec<f64>,
        weights_harmonics: Vec<f64>,
        sampling_rate: f64,
    ) -> Self {
        PowerLineNoise {
            base_freq,
            harmonics,
            weights_harmonics,
            sampling_rate,
            channel_weights: None,
        }
    }

    /// Set per-channel gains.
    pub fn with_channel_weights(mut self, channel_weights: Vec<f64>) -> Self {
        self.channel_weights = Some(channel_weights);
        self
    }

    fn waveform(&self, num_samples: usize) -> Result<Vec<f64>, SimError> {
        if self.harmonics.len() != self.weights_harmonics.len() {
            return Err(SimError::ConfigMismatch(format!(
                "{} harmonics but {} harmonic weights",
                self.harmonics.len(),
                self.weights_harmonics.len()
            )));
        }
        if !(self.sampling_rate > 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "The sampling rate must be positive, got {}",
                self.sampling_rate
            )));
        }

        Ok((0..num_samples)
            .map(|t| {
                let time = t as f64 / self.sampling_rate;
                self.harmonics
                    .iter()
                    .zip(self.weights_harmonics.iter())
                    .map(|(harmonic, weight)| {
                        weight * (2.0 * PI * self.base_freq * harmonic * time).sin()
                    })
                    .sum()
            })
            .collect())
    }
}

impl Artifact for PowerLineNoise {
    fn name(&self) -> &str {
        "power_line"
    }

    fn num_channels(&self) -> usize {
        self.channel_weights
            .as_ref()
            .map_or(1, |weights| weights.len())
    }

    fn generate(
        &self,
        num_samples: usize,
        _rng: &mut dyn RngCore,
    ) -> Result<ContinuousSignal, SimError> {
        let waveform = self.waveform(num_samples)?;
        match &self.channel_weights {
            None => Ok(ContinuousSignal::from_samples(&waveform)),
            Some(weights) => ContinuousSignal::from_rows(
                &weights
                    .iter()
                    .map(|gain| waveform.iter().map(|x| gain * x).collect())
                    .collect::<Vec<Vec<f64>>>(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    const SEED: u64 = 42;

    #[test]
    fn test_power_line_harmonics() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let artifact = PowerLineNoise::new(50.0, vec![1.0, 3.0, 5.0], vec![1.0, 1.0, 1.0], 1000.0);
        assert_eq!(artifact, PowerLineNoise::default());
        assert_eq!(artifact.num_channels(), 1);

        let signal = artifact.generate(1000, &mut rng).unwrap();
        assert_eq!(signal.len(), 1000);
        for t in 0..1000 {
            let time = t as f64 / 1000.0;
            let expected = (2.0 * PI * 50.0 * time).sin()
                + (2.0 * PI * 150.0 * time).sin()
                + (2.0 * PI * 250.0 * time).sin();
            assert_relative_eq!(signal.get(0, t).unwrap(), expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_power_line_weights() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let artifact = PowerLineNoise::new(60.0, vec![1.0, 2.0], vec![0.5, 0.0], 600.0);
        let signal = artifact.generate(20, &mut rng).unwrap();
        for t in 0..20 {
            let expected = 0.5 * (2.0 * PI * 60.0 * t as f64 / 600.0).sin();
            assert_relative_eq!(signal.get(0, t).unwrap(), expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_power_line_channel_weights() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let artifact = PowerLineNoise::default().with_channel_weights(vec![1.0, 0.0, -2.0]);
        assert_eq!(artifact.num_channels(), 3);

        let signal = artifact.generate(100, &mut rng).unwrap();
        let reference = PowerLineNoise::default().generate(100, &mut rng).unwrap();
        assert_eq!(signal.channel(0), reference.channel(0));
        assert!(signal.channel(1).unwrap().iter().all(|x| *x == 0.0));
        for t in 0..100 {
            assert_relative_eq!(
                signal.get(2, t).unwrap(),
                -2.0 * reference.get(0, t).unwrap()
            );
        }
    }

    #[test]
    fn test_power_line_mismatch() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let artifact = PowerLineNoise::new(50.0, vec![1.0, 3.0, 5.0], vec![1.0, 1.0], 1000.0);
        assert!(matches!(
            artifact.generate(100, &mut rng),
            Err(SimError::ConfigMismatch(_))
        ));

        let artifact = PowerLineNoise::new(50.0, vec![1.0], vec![1.0], 0.0);
        assert!(matches!(
            artifact.generate(100, &mut rng),
            Err(SimError::InvalidParameter(_))
        ));
    }
}
