//! Error module for the Rusty EEGSim library.
use std::error::Error;
use std::fmt;

/// Error types for the library.
#[derive(Debug, PartialEq)]
pub enum SimError {
    /// Error for an inter-onset gap that is negative, not finite, or zero where a strictly increasing onset is required.
    InvalidOnset { index: usize, gap: f64 },
    /// Error for a component whose basis, coefficients or formula do not fit the condition it is asked to synthesize.
    ComponentConfig(String),
    /// Error for a fixed-length signal (user noise, control signal, ...) shorter than requested.
    InsufficientLength { required: usize, available: usize },
    /// Error for paired parameters whose lengths or labels do not agree, e.g., harmonics and their weights.
    ConfigMismatch(String),
    /// Error for channel counts that cannot be reconciled by broadcast.
    ShapeMismatch(String),
    /// Error for a control signal that does not start at the first sample of the epoch.
    UnanchoredControlSignal { start: usize },
    /// Error for invalid parameters
    InvalidParameter(String),
    /// Error for I/O operations.
    IOError(String),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SimError::InvalidOnset { index, gap } => {
                write!(f, "Invalid inter-onset gap {} for event {}", gap, index)
            }
            SimError::ComponentConfig(e) => write!(f, "Invalid component configuration: {}", e),
            SimError::InsufficientLength {
                required,
                available,
            } => write!(
                f,
                "Insufficient signal length: {} samples required but only {} available",
                required, available
            ),
            SimError::ConfigMismatch(e) => write!(f, "Configuration mismatch: {}", e),
            SimError::ShapeMismatch(e) => write!(f, "Shape mismatch: {}", e),
            SimError::UnanchoredControlSignal { start } => write!(
                f,
                "Control signal must start at sample 0 but starts at sample {}",
                start
            ),
            SimError::InvalidParameter(e) => write!(f, "Invalid parameters: {}", e),
            SimError::IOError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl Error for SimError {}
