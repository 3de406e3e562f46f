//! Module implementing the composition of a simulated recording.
//!
//! A [`Simulation`] bundles the declarative description of an experiment: its design, the response components
//! attached to every event, the onset model, the background noise and the artifacts. Running it with a random
//! stream yields a [`SimulationOutput`], i.e., the composite signal, the event table and the signal of every
//! source taken separately.
//!
//! ```rust
//! use rusty_eegsim::basis::p100;
//! use rusty_eegsim::component::{Component, LinearComponent};
//! use rusty_eegsim::design::SingleSubjectDesign;
//! use rusty_eegsim::formula::Formula;
//! use rusty_eegsim::noise::WhiteNoise;
//! use rusty_eegsim::onset::{Onset, UniformGap};
//! use rusty_eegsim::simulation::Simulation;
//!
//! let design = SingleSubjectDesign::new(vec![], 10);
//! let component = LinearComponent::new(p100(100.0), Formula::intercept(), vec![5.0]);
//! let simulation = Simulation::new(
//!     design,
//!     vec![Box::new(component) as Box<dyn Component>],
//!     Onset::new(UniformGap::new(20, 10), 5),
//!     WhiteNoise::new(0.5),
//!     vec![],
//! );
//!
//! let output = simulation.simulate_seeded(42).unwrap();
//! assert_eq!(output.events.len(), 10);
//! assert_eq!(output.sources.len(), 2);
//! ```
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;
use crate::component::{components_channels, synthesize_event, Component};
use crate::design::Design;
use crate::error::SimError;
use crate::event::EventTable;
use crate::noise::NoiseModel;
use crate::onset::{sample_onsets, Onset};
use crate::signal::{reconcile_channels, ContinuousSignal};

/// Label of the signal obtained by placing the event waveforms.
pub const BASE_LABEL: &str = "base";
/// Label of the background noise signal.
pub const NOISE_LABEL: &str = "noise";

/// The configuration of a simulation. It holds no runtime state and can be run any number of times.
#[derive(Debug)]
pub struct Simulation {
    design: Box<dyn Design>,
    components: Vec<Box<dyn Component>>,
    onset: Onset,
    noise: Box<dyn NoiseModel>,
    artifacts: Vec<Box<dyn Artifact>>,
}

impl Simulation {
    pub fn new<D, N>(
        design: D,
        components: Vec<Box<dyn Component>>,
        onset: Onset,
        noise: N,
        artifacts: Vec<Box<dyn Artifact>>,
    ) -> Self
    where
        D: Design + 'static,
        N: NoiseModel + 'static,
    {
        Simulation {
            design: Box::new(design),
            components,
            onset,
            noise: Box::new(noise),
            artifacts,
        }
    }

    pub fn design(&self) -> &dyn Design {
        self.design.as_ref()
    }

    pub fn components(&self) -> &[Box<dyn Component>] {
        &self.components
    }

    pub fn onset(&self) -> &Onset {
        &self.onset
    }

    pub fn noise(&self) -> &dyn NoiseModel {
        self.noise.as_ref()
    }

    pub fn artifacts(&self) -> &[Box<dyn Artifact>] {
        &self.artifacts
    }

    /// Run the simulation with the provided random stream.
    pub fn simulate<R: RngCore>(&self, rng: &mut R) -> Result<SimulationOutput, SimError> {
        compose(
            self.design.as_ref(),
            &self.components,
            &self.onset,
            self.noise.as_ref(),
            &self.artifacts,
            rng,
        )
    }

    /// Run the simulation with a fresh random stream seeded by `seed`.
    /// Two runs with the same seed produce identical outputs.
    pub fn simulate_seeded(&self, seed: u64) -> Result<SimulationOutput, SimError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.simulate(&mut rng)
    }
}

/// The signal produced by a single source of the simulation.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SourceSignal {
    pub label: String,
    pub signal: ContinuousSignal,
}

/// The result of a simulation.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SimulationOutput {
    /// The composite signal, sum of all sources.
    pub signal: ContinuousSignal,
    /// The event table, one row per event.
    pub events: EventTable,
    /// The signal of every source, in order: the base signal, the noise, then the artifacts.
    pub sources: Vec<SourceSignal>,
}

impl SimulationOutput {
    /// Returns the signal of the first source with the given label, if any.
    pub fn source(&self, label: &str) -> Option<&ContinuousSignal> {
        self.sources
            .iter()
            .find(|source| source.label == label)
            .map(|source| &source.signal)
    }

    /// Save the simulation output to a file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), SimError> {
        let file = File::create(path).map_err(|e| SimError::IOError(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self).map_err(|e| SimError::IOError(e.to_string()))?;
        writer.flush().map_err(|e| SimError::IOError(e.to_string()))
    }

    /// Load a simulation output from a file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let file = File::open(path).map_err(|e| SimError::IOError(e.to_string()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| SimError::IOError(e.to_string()))
    }
}

/// Compose a simulated recording.
///
/// Events are drawn from the design and placed at their sampled onsets, where the waveforms of all components
/// are added up (overlapping waveforms of adjacent events add up too). The noise and every artifact are then
/// generated over the length of the longest source, broadcast to a common channel count and summed.
///
/// The function returns an error if any source fails, or if the channel counts of the sources cannot be
/// reconciled, i.e., two sources have different channel counts and neither of them is single-channel.
pub fn compose(
    design: &dyn Design,
    components: &[Box<dyn Component>],
    onset: &Onset,
    noise: &dyn NoiseModel,
    artifacts: &[Box<dyn Artifact>],
    rng: &mut dyn RngCore,
) -> Result<SimulationOutput, SimError> {
    let conditions = design.generate_events(rng);
    let onsets = sample_onsets(conditions.len(), onset, rng)?;
    log::debug!("{} events drawn from the design", conditions.len());

    let num_channels = reconcile_channels(
        std::iter::once(components_channels(components)?)
            .chain(noise.num_channels())
            .chain(artifacts.iter().map(|artifact| artifact.num_channels())),
    )?;
    log::debug!("Composing a {}-channel signal", num_channels);

    let mut base = ContinuousSignal::zeros(num_channels, 0);
    for (condition, onset) in conditions.iter().zip(onsets.iter()) {
        let waveform = synthesize_event(components, num_channels, condition, rng)?;
        base.add_at(*onset, &waveform)?;
    }

    let len = std::iter::once(base.len())
        .chain(noise.required_len())
        .chain(artifacts.iter().filter_map(|artifact| artifact.required_len()))
        .max()
        .unwrap_or(0);
    base.resize(len);
    log::debug!("Final signal length is {} samples", len);

    let mut sources = Vec::with_capacity(artifacts.len() + 2);
    sources.push(SourceSignal {
        label: BASE_LABEL.to_string(),
        signal: base,
    });
    sources.push(SourceSignal {
        label: NOISE_LABEL.to_string(),
        signal: noise
            .generate(num_channels, len, rng)?
            .broadcast_to(num_channels)?,
    });
    for artifact in artifacts.iter() {
        sources.push(SourceSignal {
            label: artifact.name().to_string(),
            signal: artifact.generate(len, rng)?.broadcast_to(num_channels)?,
        });
    }

    let mut signal = ContinuousSignal::zeros(num_channels, len);
    for source in sources.iter() {
        signal.add_assign(&source.signal)?;
    }

    log::info!(
        "Simulated {} events over {} samples and {} channels ({} sources)",
        conditions.len(),
        len,
        num_channels,
        sources.len()
    );

    Ok(SimulationOutput {
        signal,
        events: EventTable::new(design.factors(), conditions, &onsets),
        sources,
    })
}
