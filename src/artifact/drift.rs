//! Slow drifts of the recording baseline.
//!
//! A [`Drift`] combines up to three independent sub-processes: a linear ramp, an autoregressive process of
//! order 1, and a constant offset. Sub-processes left out do not contribute.
use rand::RngCore;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use super::{Artifact, ControlSignal};
use crate::error::SimError;
use crate::signal::ContinuousSignal;

/// Linear ramp from 0 at the first sample to `scaling_factor` at the last one.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct LinearDrift {
    pub scaling_factor: f64,
}

impl LinearDrift {
    pub fn new(scaling_factor: f64) -> Self {
        LinearDrift { scaling_factor }
    }
}

impl Artifact for LinearDrift {
    fn name(&self) -> &str {
        "linear_drift"
    }

    fn generate(
        &self,
        num_samples: usize,
        _rng: &mut dyn RngCore,
    ) -> Result<ContinuousSignal, SimError> {
        let samples: Vec<f64> = match num_samples {
            0 | 1 => vec![0.0; num_samples],
            _ => (0..num_samples)
                .map(|t| self.scaling_factor * t as f64 / (num_samples - 1) as f64)
                .collect(),
        };
        Ok(ContinuousSignal::from_samples(&samples))
    }
}

/// Autoregressive drift of order 1, i.e., x[0] = s e[0] and x[t] = c x[t-1] + s e[t] with e[t] ~ N(0, 1),
/// where c is the coefficient and s the noise scale.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct AutoRegressiveDrift {
    pub coefficient: f64,
    pub sigma: f64,
}

impl AutoRegressiveDrift {
    pub fn new(coefficient: f64, sigma: f64) -> Self {
        AutoRegressiveDrift { coefficient, sigma }
    }

    /// Draw the state of the drift process over `num_samples` samples.
    pub fn control_signal(
        &self,
        num_samples: usize,
        rng: &mut dyn RngCore,
    ) -> Result<ControlSignal, SimError> {
        if !self.coefficient.is_finite() {
            return Err(SimError::InvalidParameter(format!(
                "The drift coefficient must be finite, got {}",
                self.coefficient
            )));
        }
        if !(self.sigma >= 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "The drift noise scale must be non-negative, got {}",
                self.sigma
            )));
        }
        let innovation = Normal::new(0.0, self.sigma).map_err(|e| {
            SimError::InvalidParameter(format!("Invalid drift noise scale {}: {}", self.sigma, e))
        })?;

        let mut state = 0.0;
        let samples: Vec<f64> = (0..num_samples)
            .map(|_| {
                state = self.coefficient * state + innovation.sample(rng);
                state
            })
            .collect();
        Ok(ControlSignal::new(ContinuousSignal::from_samples(&samples)))
    }
}

impl Artifact for AutoRegressiveDrift {
    fn name(&self) -> &str {
        "autoregressive_drift"
    }

    fn generate(
        &self,
        num_samples: usize,
        rng: &mut dyn RngCore,
    ) -> Result<ContinuousSignal, SimError> {
        self.control_signal(num_samples, rng)?.head(num_samples)
    }
}

/// Constant offset.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct DCOffset {
    pub scaling_factor: f64,
}

impl DCOffset {
    pub fn new(scaling_factor: f64) -> Self {
        DCOffset { scaling_factor }
    }
}

impl Artifact for DCOffset {
    fn name(&self) -> &str {
        "dc_offset"
    }

    fn generate(
        &self,
        num_samples: usize,
        _rng: &mut dyn RngCore,
    ) -> Result<ContinuousSignal, SimError> {
        Ok(ContinuousSignal::from_samples(&vec![self.scaling_factor; num_samples]))
    }
}

/// Sum of the configured drift sub-processes.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct Drift {
    #[serde(default)]
    pub linear: Option<LinearDrift>,
    #[serde(default)]
    pub autoregressive: Option<AutoRegressiveDrift>,
    #[serde(default)]
    pub dc: Option<DCOffset>,
}

impl Drift {
    pub fn new() -> Self {
        Drift::default()
    }

    pub fn with_linear(mut self, scaling_factor: f64) -> Self {
        self.linear = Some(LinearDrift::new(scaling_factor));
        self
    }

    pub fn with_autoregressive(mut self, coefficient: f64, sigma: f64) -> Self {
        self.autoregressive = Some(AutoRegressiveDrift::new(coefficient, sigma));
        self
    }

    pub fn with_dc(mut self, scaling_factor: f64) -> Self {
        self.dc = Some(DCOffset::new(scaling_factor));
        self
    }
}

impl Artifact for Drift {
    fn name(&self) -> &str {
        "drift"
    }

    fn generate(
        &self,
        num_samples: usize,
        rng: &mut dyn RngCore,
    ) -> Result<ContinuousSignal, SimError> {
        let mut signal = ContinuousSignal::zeros(1, num_samples);
        if let Some(linear) = &self.linear {
            signal.add_assign(&linear.generate(num_samples, rng)?)?;
        }
        if let Some(autoregressive) = &self.autoregressive {
            signal.add_assign(&autoregressive.generate(num_samples, rng)?)?;
        }
        if let Some(dc) = &self.dc {
            signal.add_assign(&dc.generate(num_samples, rng)?)?;
        }
        Ok(signal)
    }
}
