//! Eye movement artifacts.
//!
//! The control signal is a sequence of 3-dimensional gaze direction vectors, one per sample. Each vector is
//! passed through the forward model under the eye source label, so that the channel-space artifact follows
//! the orientation of the eyes.
use std::sync::Arc;

use rand::RngCore;

use super::{Artifact, ControlSignal};
use crate::error::SimError;
use crate::forward::ForwardModel;
use crate::signal::ContinuousSignal;

/// Returns the unit gaze direction towards a point on a screen.
/// `x` (rightwards) and `y` (upwards) are measured from the point straight ahead of the eyes, at
/// `screen_distance` from them, all in the same unit. The vector components are ordered as
/// (right, forward, up).
pub fn gaze_direction(x: f64, y: f64, screen_distance: f64) -> [f64; 3] {
    let norm = (x * x + y * y + screen_distance * screen_distance).sqrt();
    match norm > 0.0 {
        true => [x / norm, screen_distance / norm, y / norm],
        false => [0.0, 1.0, 0.0],
    }
}

/// Eye movement artifact, driven by a gaze trajectory.
#[derive(Debug)]
pub struct EyeMovement {
    control_signal: ControlSignal,
    forward_model: Arc<dyn ForwardModel>,
    source: String,
}

impl EyeMovement {
    /// Create an eye movement artifact from a gaze trajectory and the label of the eye source model in
    /// the forward model.
    pub fn new(
        control_signal: ControlSignal,
        forward_model: Arc<dyn ForwardModel>,
        source: &str,
    ) -> Self {
        EyeMovement {
            control_signal,
            forward_model,
            source: source.to_string(),
        }
    }

    /// Create an eye movement artifact from screen coordinates, converted to gaze directions.
    pub fn from_screen_coordinates(
        points: &[(f64, f64)],
        screen_distance: f64,
        forward_model: Arc<dyn ForwardModel>,
        source: &str,
    ) -> Result<Self, SimError> {
        let directions: Vec<Vec<f64>> = points
            .iter()
            .map(|(x, y)| gaze_direction(*x, *y, screen_distance).to_vec())
            .collect();
        Ok(EyeMovement::new(
            ControlSignal::from_vectors(&directions)?,
            forward_model,
            source,
        ))
    }

    /// Returns the gaze trajectory.
    pub fn control_signal(&self) -> &ControlSignal {
        &self.control_signal
    }
}

impl Artifact for EyeMovement {
    fn name(&self) -> &str {
        "eye_movement"
    }

    fn num_channels(&self) -> usize {
        self.forward_model.num_channels()
    }

    fn required_len(&self) -> Option<usize> {
        Some(self.control_signal.len())
    }

    fn generate(
        &self,
        num_samples: usize,
        _rng: &mut dyn RngCore,
    ) -> Result<ContinuousSignal, SimError> {
        let gaze = self.control_signal.head(num_samples)?;
        self.forward_model.project_signal(&self.source, &gaze)
    }
}
