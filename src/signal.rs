//! Module implementing continuous multichannel signals.
//!
//! Every source of a simulation (the event-related base signal, the background noise and each artifact)
//! is represented as a [`ContinuousSignal`], a channels x samples matrix. Signals are summed sample-wise
//! and channel-wise; single-channel signals are broadcast to the channel count of the others.
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// A real-valued signal with a fixed number of channels, stored as a channels x samples matrix.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ContinuousSignal {
    data: DMatrix<f64>,
}

impl ContinuousSignal {
    /// Create a signal filled with zeros.
    pub fn zeros(num_channels: usize, len: usize) -> Self {
        ContinuousSignal {
            data: DMatrix::zeros(num_channels, len),
        }
    }

    /// Create a single-channel signal from a sequence of samples.
    pub fn from_samples(samples: &[f64]) -> Self {
        ContinuousSignal {
            data: DMatrix::from_row_slice(1, samples.len(), samples),
        }
    }

    /// Create a multichannel signal from one row of samples per channel.
    /// The function returns an error if there is no row or if the rows have different lengths.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, SimError> {
        let len = match rows.first() {
            Some(row) => row.len(),
            None => {
                return Err(SimError::ShapeMismatch(
                    "A signal must have at least one channel".to_string(),
                ))
            }
        };
        if let Some(row) = rows.iter().find(|row| row.len() != len) {
            return Err(SimError::ShapeMismatch(format!(
                "All channels must have the same length, got {} and {}",
                len,
                row.len()
            )));
        }

        Ok(ContinuousSignal {
            data: DMatrix::from_fn(rows.len(), len, |i, j| rows[i][j]),
        })
    }

    /// Wrap an existing channels x samples matrix.
    pub fn from_matrix(data: DMatrix<f64>) -> Self {
        ContinuousSignal { data }
    }

    /// Returns the underlying channels x samples matrix.
    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Returns the number of channels.
    pub fn num_channels(&self) -> usize {
        self.data.nrows()
    }

    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.data.ncols()
    }

    /// Returns true if the signal has no sample.
    pub fn is_empty(&self) -> bool {
        self.data.ncols() == 0
    }

    /// Returns the value of a channel at a given sample, if any.
    pub fn get(&self, channel: usize, sample: usize) -> Option<f64> {
        self.data.get((channel, sample)).copied()
    }

    /// Returns the samples of a single channel, if any.
    pub fn channel(&self, channel: usize) -> Option<Vec<f64>> {
        if channel >= self.num_channels() {
            return None;
        }
        Some(self.data.row(channel).iter().copied().collect())
    }

    /// Returns the signal as one row of samples per channel.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect()
    }

    /// Zero-pad or truncate the signal to the given number of samples.
    pub fn resize(&mut self, len: usize) {
        let num_channels = self.num_channels();
        let data = std::mem::replace(&mut self.data, DMatrix::zeros(0, 0));
        self.data = data.resize(num_channels, len, 0.0);
    }

    /// Multiply every sample by a constant factor.
    pub fn scale(&mut self, factor: f64) {
        self.data *= factor;
    }

    /// Add a waveform into the signal, starting at the given onset sample.
    /// The signal grows as needed; overlapping waveforms add up sample-wise.
    pub fn add_at(&mut self, onset: usize, waveform: &ContinuousSignal) -> Result<(), SimError> {
        if waveform.num_channels() != self.num_channels() {
            return Err(SimError::ShapeMismatch(format!(
                "Cannot place a {}-channel waveform into a {}-channel signal",
                waveform.num_channels(),
                self.num_channels()
            )));
        }

        let end = onset.checked_add(waveform.len()).ok_or_else(|| {
            SimError::ShapeMismatch(format!(
                "A {}-sample waveform at onset {} exceeds the addressable length",
                waveform.len(),
                onset
            ))
        })?;
        if end > self.len() {
            self.resize(end);
        }

        for t in 0..waveform.len() {
            for ch in 0..waveform.num_channels() {
                self.data[(ch, onset + t)] += waveform.data[(ch, t)];
            }
        }
        Ok(())
    }

    /// Returns a copy of the signal with the given number of channels.
    /// A single-channel signal is replicated identically across channels; any other mismatch is an error.
    pub fn broadcast_to(&self, num_channels: usize) -> Result<Self, SimError> {
        if self.num_channels() == num_channels {
            return Ok(self.clone());
        }
        if self.num_channels() != 1 {
            return Err(SimError::ShapeMismatch(format!(
                "Cannot broadcast a {}-channel signal to {} channels",
                self.num_channels(),
                num_channels
            )));
        }

        Ok(ContinuousSignal {
            data: DMatrix::from_fn(num_channels, self.len(), |_, j| self.data[(0, j)]),
        })
    }

    /// Add another signal of identical shape, sample-wise and channel-wise.
    pub fn add_assign(&mut self, other: &ContinuousSignal) -> Result<(), SimError> {
        if self.data.shape() != other.data.shape() {
            return Err(SimError::ShapeMismatch(format!(
                "Cannot add a {:?} signal to a {:?} signal",
                other.data.shape(),
                self.data.shape()
            )));
        }
        self.data += &other.data;
        Ok(())
    }

    /// Returns the sample-wise sum of signals sharing the same shape, in order.
    pub fn sum_of(signals: &[ContinuousSignal]) -> Result<ContinuousSignal, SimError> {
        let mut iter = signals.iter();
        let mut sum = match iter.next() {
            Some(first) => first.clone(),
            None => return Ok(ContinuousSignal::zeros(1, 0)),
        };
        for signal in iter {
            sum.add_assign(signal)?;
        }
        Ok(sum)
    }
}

/// Returns the common channel count of several signals under broadcast rules.
/// Single-channel signals fit any count; two different counts greater than one cannot be reconciled.
pub fn reconcile_channels<I: IntoIterator<Item = usize>>(counts: I) -> Result<usize, SimError> {
    counts.into_iter().try_fold(1, |target, count| {
        if count == 1 || count == target {
            Ok(target)
        } else if target == 1 {
            Ok(count)
        } else {
            Err(SimError::ShapeMismatch(format!(
                "Cannot reconcile {} and {} channels",
                target, count
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows() {
        let signal = ContinuousSignal::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])
            .unwrap();
        assert_eq!(signal.num_channels(), 2);
        assert_eq!(signal.len(), 3);
        assert_eq!(signal.get(1, 0), Some(4.0));
        assert_eq!(signal.get(2, 0), None);
        assert_eq!(signal.channel(0), Some(vec![1.0, 2.0, 3.0]));

        assert!(matches!(
            ContinuousSignal::from_rows(&[vec![1.0], vec![1.0, 2.0]]),
            Err(SimError::ShapeMismatch(_))
        ));
        assert!(matches!(
            ContinuousSignal::from_rows(&[]),
            Err(SimError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_add_at_with_overlap() {
        let mut signal = ContinuousSignal::zeros(1, 0);
        let waveform = ContinuousSignal::from_samples(&[1.0, 2.0, 3.0]);

        signal.add_at(2, &waveform).unwrap();
        assert_eq!(signal.channel(0), Some(vec![0.0, 0.0, 1.0, 2.0, 3.0]));

        // overlapping waveforms are summed, never clipped
        signal.add_at(3, &waveform).unwrap();
        assert_eq!(signal.channel(0), Some(vec![0.0, 0.0, 1.0, 3.0, 5.0, 3.0]));

        let multichannel = ContinuousSignal::zeros(2, 3);
        assert!(matches!(
            signal.add_at(0, &multichannel),
            Err(SimError::ShapeMismatch(_))
        ));

        // the signal is left untouched when the waveform end cannot be addressed
        assert!(matches!(
            signal.add_at(usize::MAX - 1, &waveform),
            Err(SimError::ShapeMismatch(_))
        ));
        assert_eq!(signal.len(), 6);
    }

    #[test]
    fn test_resize() {
        let mut signal = ContinuousSignal::from_samples(&[1.0, 2.0]);
        signal.resize(4);
        assert_eq!(signal.channel(0), Some(vec![1.0, 2.0, 0.0, 0.0]));
        signal.resize(1);
        assert_eq!(signal.channel(0), Some(vec![1.0]));
    }

    #[test]
    fn test_broadcast_to() {
        let signal = ContinuousSignal::from_samples(&[1.0, -1.0]);
        let broadcast = signal.broadcast_to(3).unwrap();
        assert_eq!(broadcast.num_channels(), 3);
        for ch in 0..3 {
            assert_eq!(broadcast.channel(ch), Some(vec![1.0, -1.0]));
        }

        let multichannel = ContinuousSignal::zeros(2, 2);
        assert_eq!(multichannel.broadcast_to(2).unwrap(), multichannel);
        assert!(matches!(
            multichannel.broadcast_to(3),
            Err(SimError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_sum_of() {
        let a = ContinuousSignal::from_samples(&[1.0, 2.0]);
        let b = ContinuousSignal::from_samples(&[0.5, -2.0]);
        let sum = ContinuousSignal::sum_of(&[a.clone(), b]).unwrap();
        assert_eq!(sum.channel(0), Some(vec![1.5, 0.0]));

        let c = ContinuousSignal::from_samples(&[1.0]);
        assert!(matches!(
            ContinuousSignal::sum_of(&[a, c]),
            Err(SimError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_reconcile_channels() {
        assert_eq!(reconcile_channels(vec![]), Ok(1));
        assert_eq!(reconcile_channels(vec![1, 1]), Ok(1));
        assert_eq!(reconcile_channels(vec![1, 64, 1, 64]), Ok(64));
        assert!(matches!(
            reconcile_channels(vec![32, 1, 64]),
            Err(SimError::ShapeMismatch(_))
        ));
    }
}
