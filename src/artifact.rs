//! Module implementing artifact sources, i.e., continuous signals driven by a process independent of the events.
//!
//! - [`eye`]: eye movements projected through a forward model
//! - [`powerline`]: power-line interference and its harmonics
//! - [`drift`]: linear, autoregressive and constant drifts
//!
//! Artifacts driven by a [`ControlSignal`] are synchronized with the simulated signal through the control
//! signal's first sample: it must coincide with the first sample of the simulation.
use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::signal::ContinuousSignal;

pub mod drift;
pub mod eye;
pub mod powerline;

/// A source of artifact signal.
pub trait Artifact: fmt::Debug {
    /// A short label identifying the artifact in the per-source output.
    fn name(&self) -> &str;

    /// The number of channels of the produced signal.
    fn num_channels(&self) -> usize {
        1
    }

    /// The number of samples the artifact needs to be simulated entirely, if it has an intrinsic length.
    fn required_len(&self) -> Option<usize> {
        None
    }

    /// Generate `num_samples` samples of artifact, starting at the first sample of the simulation.
    fn generate(
        &self,
        num_samples: usize,
        rng: &mut dyn RngCore,
    ) -> Result<ContinuousSignal, SimError>;
}

/// A driving time series, with one row per dimension of the driving process and one column per sample.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ControlSignal {
    start: usize,
    values: ContinuousSignal,
}

impl ControlSignal {
    /// Create a control signal starting at the first sample of the simulation.
    pub fn new(values: ContinuousSignal) -> Self {
        ControlSignal { start: 0, values }
    }

    /// Create a control signal starting at an arbitrary sample.
    /// Such a signal is rejected by the artifacts it drives unless `start` is 0.
    pub fn with_start(values: ContinuousSignal, start: usize) -> Self {
        ControlSignal { start, values }
    }

    /// Create a control signal from a sequence of per-sample vectors.
    pub fn from_vectors(samples: &[Vec<f64>]) -> Result<Self, SimError> {
        let dim = samples.first().map(|sample| sample.len()).unwrap_or(0);
        let rows: Vec<Vec<f64>> = (0..dim)
            .map(|d| {
                samples
                    .iter()
                    .map(|sample| {
                        sample.get(d).copied().ok_or_else(|| {
                            SimError::ShapeMismatch(
                                "All control samples must have the same dimension".to_string(),
                            )
                        })
                    })
                    .collect::<Result<Vec<f64>, SimError>>()
            })
            .collect::<Result<_, _>>()?;
        if samples.iter().any(|sample| sample.len() != dim) {
            return Err(SimError::ShapeMismatch(
                "All control samples must have the same dimension".to_string(),
            ));
        }
        Ok(ControlSignal::new(ContinuousSignal::from_rows(&rows)?))
    }

    /// Returns the sample of the simulation at which the control signal starts.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the control signal has no sample.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the dimension of the driving process.
    pub fn dim(&self) -> usize {
        self.values.num_channels()
    }

    /// Returns the values of the control signal.
    pub fn values(&self) -> &ContinuousSignal {
        &self.values
    }

    /// Check that the control signal starts at the first sample of the simulation.
    pub fn check_anchor(&self) -> Result<(), SimError> {
        match self.start {
            0 => Ok(()),
            start => Err(SimError::UnanchoredControlSignal { start }),
        }
    }

    /// Returns the first `num_samples` samples of the control signal.
    /// The function returns an error if the control signal is not anchored or too short.
    pub fn head(&self, num_samples: usize) -> Result<ContinuousSignal, SimError> {
        self.check_anchor()?;
        if self.len() < num_samples {
            return Err(SimError::InsufficientLength {
                required: num_samples,
                available: self.len(),
            });
        }
        let mut values = self.values.clone();
        values.resize(num_samples);
        Ok(values)
    }
}

/// A literal, pre-computed artifact signal (e.g., recorded from a real setup), passed through unchanged.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct UserArtifact {
    signal: ContinuousSignal,
}

impl UserArtifact {
    pub fn new(signal: ContinuousSignal) -> Self {
        UserArtifact { signal }
    }
}

impl Artifact for UserArtifact {
    fn name(&self) -> &str {
        "user_artifact"
    }

    fn num_channels(&self) -> usize {
        self.signal.num_channels()
    }

    fn required_len(&self) -> Option<usize> {
        Some(self.signal.len())
    }

    fn generate(
        &self,
        num_samples: usize,
        _rng: &mut dyn RngCore,
    ) -> Result<ContinuousSignal, SimError> {
        if self.signal.len() < num_samples {
            return Err(SimError::InsufficientLength {
                required: num_samples,
                available: self.signal.len(),
            });
        }
        let mut signal = self.signal.clone();
        signal.resize(num_samples);
        Ok(signal)
    }
}
