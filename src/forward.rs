//! Module implementing forward (head) models, i.e., the spatial projection of source signals into channel space.
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::signal::ContinuousSignal;

/// A forward model maps a source-space sample (a vector) to a channel-space sample.
/// Projections are deterministic and stateless.
pub trait ForwardModel: fmt::Debug {
    /// The number of channels of the projected signals.
    fn num_channels(&self) -> usize;

    /// The dimension of the samples expected for a given source, if the source is known.
    fn source_dim(&self, source: &str) -> Option<usize>;

    /// Project a single source sample into channel space.
    fn project(&self, source: &str, sample: &[f64]) -> Result<Vec<f64>, SimError>;

    /// Project a source signal, whose channels are the source dimensions, sample by sample.
    /// The function returns an error if a projected sample does not have one value per channel.
    fn project_signal(
        &self,
        source: &str,
        signal: &ContinuousSignal,
    ) -> Result<ContinuousSignal, SimError> {
        let mut projected = DMatrix::zeros(self.num_channels(), signal.len());
        let matrix = signal.as_matrix();
        for (t, column) in matrix.column_iter().enumerate() {
            let sample: Vec<f64> = column.iter().copied().collect();
            let channels = self.project(source, &sample)?;
            if channels.len() != self.num_channels() {
                return Err(SimError::ShapeMismatch(format!(
                    "Source {} was projected on {} channels instead of {}",
                    source,
                    channels.len(),
                    self.num_channels()
                )));
            }
            projected.set_column(t, &DVector::from_vec(channels));
        }
        Ok(ContinuousSignal::from_matrix(projected))
    }
}

/// A linear forward model, with one leadfield matrix (channels x source dimensions) per source label.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct LeadfieldModel {
    channel_labels: Vec<String>,
    leadfields: BTreeMap<String, DMatrix<f64>>,
}

impl LeadfieldModel {
    /// Create a forward model without any source.
    pub fn new(channel_labels: Vec<String>) -> Self {
        LeadfieldModel {
            channel_labels,
            leadfields: BTreeMap::new(),
        }
    }

    /// Add (or replace) the leadfield of a source, given as one row per channel.
    /// The function returns an error if the number of rows does not match the number of channels.
    pub fn add_source(&mut self, source: &str, rows: &[Vec<f64>]) -> Result<(), SimError> {
        let leadfield = ContinuousSignal::from_rows(rows)?.as_matrix().clone();
        if leadfield.nrows() != self.channel_labels.len() {
            return Err(SimError::ShapeMismatch(format!(
                "Leadfield of source {} has {} rows for {} channels",
                source,
                leadfield.nrows(),
                self.channel_labels.len()
            )));
        }
        self.leadfields.insert(source.to_string(), leadfield);
        Ok(())
    }

    /// Returns the channel labels.
    pub fn channel_labels(&self) -> &[String] {
        &self.channel_labels
    }

    /// Returns the labels of the known sources.
    pub fn sources(&self) -> impl Iterator<Item = &String> {
        self.leadfields.keys()
    }

    /// Save the forward model to a file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), SimError> {
        let file = File::create(path).map_err(|e| SimError::IOError(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| SimError::IOError(e.to_string()))?;
        writer.flush().map_err(|e| SimError::IOError(e.to_string()))
    }

    /// Load a forward model from a file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let file = File::open(path).map_err(|e| SimError::IOError(e.to_string()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| SimError::IOError(e.to_string()))
    }
}

impl ForwardModel for LeadfieldModel {
    fn num_channels(&self) -> usize {
        self.channel_labels.len()
    }

    fn source_dim(&self, source: &str) -> Option<usize> {
        self.leadfields.get(source).map(|leadfield| leadfield.ncols())
    }

    fn project(&self, source: &str, sample: &[f64]) -> Result<Vec<f64>, SimError> {
        let leadfield = self.leadfields.get(source).ok_or_else(|| {
            SimError::ConfigMismatch(format!("Unknown source {} in the forward model", source))
        })?;
        if leadfield.ncols() != sample.len() {
            return Err(SimError::ShapeMismatch(format!(
                "Source {} expects {}-dimensional samples, got {}",
                source,
                leadfield.ncols(),
                sample.len()
            )));
        }
        Ok((leadfield * DVector::from_column_slice(sample))
            .iter()
            .copied()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> LeadfieldModel {
        let mut model =
            LeadfieldModel::new(vec!["Fz".to_string(), "Cz".to_string(), "Pz".to_string()]);
        model
            .add_source("p300", &[vec![0.2], vec![0.6], vec![1.0]])
            .unwrap();
        model
            .add_source(
                "eyes",
                &[
                    vec![1.0, 0.0, 0.5],
                    vec![0.5, 0.0, 0.25],
                    vec![0.1, 0.0, 0.0],
                ],
            )
            .unwrap();
        model
    }

    #[test]
    fn test_add_source() {
        let mut model = model();
        assert_eq!(model.num_channels(), 3);
        assert_eq!(model.source_dim("p300"), Some(1));
        assert_eq!(model.source_dim("eyes"), Some(3));
        assert_eq!(model.source_dim("n170"), None);
        assert_eq!(model.sources().collect::<Vec<_>>(), vec!["eyes", "p300"]);

        assert!(matches!(
            model.add_source("n170", &[vec![1.0], vec![1.0]]),
            Err(SimError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_project() {
        let model = model();
        assert_eq!(model.project("p300", &[2.0]), Ok(vec![0.4, 1.2, 2.0]));
        assert_eq!(
            model.project("eyes", &[1.0, 0.0, 2.0]),
            Ok(vec![2.0, 1.0, 0.1])
        );
        assert!(matches!(
            model.project("n170", &[1.0]),
            Err(SimError::ConfigMismatch(_))
        ));
        assert!(matches!(
            model.project("eyes", &[1.0]),
            Err(SimError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_project_signal() {
        let model = model();
        let signal = ContinuousSignal::from_samples(&[1.0, 0.0, -1.0]);
        let projected = model.project_signal("p300", &signal).unwrap();

        assert_eq!(projected.num_channels(), 3);
        assert_eq!(projected.len(), 3);
        assert_eq!(projected.channel(2), Some(vec![1.0, 0.0, -1.0]));
        assert_eq!(projected.channel(0), Some(vec![0.2, 0.0, -0.2]));
    }

    #[test]
    fn test_save_load() {
        let model = model();
        let file = tempfile::NamedTempFile::new().unwrap();
        model.save_to(file.path()).unwrap();
        let loaded = LeadfieldModel::load_from(file.path()).unwrap();
        assert_eq!(model, loaded);
    }

    /// A head model that drops its last channel.
    #[derive(Debug)]
    struct TruncatingModel;

    impl ForwardModel for TruncatingModel {
        fn num_channels(&self) -> usize {
            3
        }

        fn source_dim(&self, _source: &str) -> Option<usize> {
            Some(1)
        }

        fn project(&self, _source: &str, sample: &[f64]) -> Result<Vec<f64>, SimError> {
            Ok(vec![sample[0]; 2])
        }
    }

    #[test]
    fn test_project_signal_wrong_channels() {
        let signal = ContinuousSignal::from_samples(&[1.0, 2.0]);
        assert!(matches!(
            TruncatingModel.project_signal("p300", &signal),
            Err(SimError::ShapeMismatch(_))
        ));
    }
}
