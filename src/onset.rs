//! Module implementing the sampling of event onsets.
//!
//! Onsets accumulate inter-onset gaps: the first event starts at `offset + gap[0]` and every following event
//! starts `offset + gap[i]` samples after the previous one. Gaps are drawn independently from a
//! [`GapDistribution`] and must be non-negative; they are never clamped.
//!
//! ```rust
//! use rusty_eegsim::onset::{sample_onsets, Onset, UniformGap};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let onset = Onset::new(UniformGap::new(20, 10), 5);
//! let onsets = sample_onsets(100, &onset, &mut rng).unwrap();
//!
//! assert_eq!(onsets.len(), 100);
//! assert!(onsets.windows(2).all(|w| w[1] - w[0] >= 25 && w[1] - w[0] <= 35));
//! ```
use std::fmt;

use rand::RngCore;
use rand_distr::{Distribution, LogNormal, Uniform};
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::LARGE_GAP_WARNING;

/// The number of draws after which a truncated gap distribution gives up.
pub const MAX_TRUNCATION_DRAWS: usize = 10_000;

/// A distribution of inter-onset gaps (in samples).
pub trait GapDistribution: fmt::Debug {
    /// Draw `n` gaps, in event order.
    /// Implementations must only produce non-negative gaps; invalid draws are reported by [`sample_onsets`].
    fn draw_gaps(&self, n: usize, rng: &mut dyn RngCore) -> Result<Vec<f64>, SimError>;
}

/// Integer gaps drawn uniformly in `[min_gap, min_gap + width]`.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct UniformGap {
    pub min_gap: usize,
    pub width: usize,
}

impl UniformGap {
    pub fn new(min_gap: usize, width: usize) -> Self {
        UniformGap { min_gap, width }
    }
}

impl GapDistribution for UniformGap {
    fn draw_gaps(&self, n: usize, rng: &mut dyn RngCore) -> Result<Vec<f64>, SimError> {
        let dist = Uniform::new_inclusive(self.min_gap, self.min_gap + self.width);
        Ok((0..n).map(|_| dist.sample(rng) as f64).collect())
    }
}

/// Gaps drawn from a log-normal distribution, optionally truncated from above.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct LogNormalGap {
    /// The mean of the underlying normal distribution.
    pub mu: f64,
    /// The standard deviation of the underlying normal distribution.
    pub sigma: f64,
    /// The largest admissible gap, if any. Larger draws are rejected and redrawn.
    pub truncate_upper: Option<f64>,
}

impl LogNormalGap {
    pub fn new(mu: f64, sigma: f64) -> Self {
        LogNormalGap {
            mu,
            sigma,
            truncate_upper: None,
        }
    }

    /// Truncate the distribution from above.
    pub fn with_truncate_upper(mut self, upper: f64) -> Self {
        self.truncate_upper = Some(upper);
        self
    }
}

impl GapDistribution for LogNormalGap {
    fn draw_gaps(&self, n: usize, rng: &mut dyn RngCore) -> Result<Vec<f64>, SimError> {
        if !(self.sigma >= 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "The log-normal sigma must be non-negative, got {}",
                self.sigma
            )));
        }
        let dist = LogNormal::new(self.mu, self.sigma).map_err(|e| {
            SimError::InvalidParameter(format!("Invalid log-normal gap distribution: {}", e))
        })?;

        match self.truncate_upper {
            None => Ok((0..n).map(|_| dist.sample(rng)).collect()),
            Some(upper) => {
                if !(upper > 0.0) {
                    return Err(SimError::InvalidParameter(format!(
                        "The truncation bound must be positive, got {}",
                        upper
                    )));
                }
                (0..n)
                    .map(|index| {
                        (0..MAX_TRUNCATION_DRAWS)
                            .map(|_| dist.sample(&mut *rng))
                            .find(|gap| *gap <= upper)
                            .ok_or_else(|| {
                                SimError::InvalidParameter(format!(
                                    "No gap below {} after {} draws for event {}",
                                    upper, MAX_TRUNCATION_DRAWS, index
                                ))
                            })
                    })
                    .collect()
            }
        }
    }
}

/// A fixed list of gaps, consumed in order.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct FixedGaps(pub Vec<f64>);

impl GapDistribution for FixedGaps {
    fn draw_gaps(&self, n: usize, _rng: &mut dyn RngCore) -> Result<Vec<f64>, SimError> {
        if self.0.len() < n {
            return Err(SimError::InsufficientLength {
                required: n,
                available: self.0.len(),
            });
        }
        Ok(self.0[..n].to_vec())
    }
}

/// Gaps drawn independently from any real-valued distribution.
#[derive(Debug, Clone)]
pub struct Sampled<D>(pub D);

impl<D: Distribution<f64> + fmt::Debug> GapDistribution for Sampled<D> {
    fn draw_gaps(&self, n: usize, rng: &mut dyn RngCore) -> Result<Vec<f64>, SimError> {
        Ok((0..n).map(|_| self.0.sample(rng)).collect())
    }
}

/// The onset model of a simulation: a gap distribution and a fixed offset added to every gap.
#[derive(Debug)]
pub struct Onset {
    gaps: Box<dyn GapDistribution>,
    offset: usize,
}

impl Onset {
    pub fn new<G: GapDistribution + 'static>(gaps: G, offset: usize) -> Self {
        Onset {
            gaps: Box::new(gaps),
            offset,
        }
    }

    /// Returns the offset added to every gap.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the gap distribution.
    pub fn gaps(&self) -> &dyn GapDistribution {
        self.gaps.as_ref()
    }
}

/// Sample the onsets of `n_events` events, as a strictly increasing sequence of sample indices.
/// Gaps are rounded to the nearest sample (ties to even).
/// The function returns an error if a gap is negative or not finite, or if a gap after the first event is
/// zero sample long, since two events would then share the same onset.
pub fn sample_onsets(
    n_events: usize,
    onset: &Onset,
    rng: &mut dyn RngCore,
) -> Result<Vec<usize>, SimError> {
    let gaps = onset.gaps.draw_gaps(n_events, rng)?;
    if gaps.len() != n_events {
        return Err(SimError::ConfigMismatch(format!(
            "Expected {} inter-onset gaps but got {}",
            n_events,
            gaps.len()
        )));
    }

    let mut onsets = Vec::with_capacity(n_events);
    let mut current: usize = 0;
    for (index, gap) in gaps.into_iter().enumerate() {
        if !gap.is_finite() || gap < 0.0 {
            return Err(SimError::InvalidOnset { index, gap });
        }
        let rounded = gap.round_ties_even();
        if rounded >= usize::MAX as f64 {
            return Err(SimError::InvalidOnset { index, gap });
        }
        let step = onset
            .offset
            .checked_add(rounded as usize)
            .ok_or(SimError::InvalidOnset { index, gap })?;
        if index > 0 && step == 0 {
            return Err(SimError::InvalidOnset { index, gap });
        }
        if step > LARGE_GAP_WARNING {
            log::warn!(
                "Inter-onset distance of {} samples for event {}, check the onset configuration",
                step,
                index
            );
        }
        current = current
            .checked_add(step)
            .ok_or(SimError::InvalidOnset { index, gap })?;
        onsets.push(current);
    }

    log::debug!("Sampled {} onsets", onsets.len());
    Ok(onsets)
}
