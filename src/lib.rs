//! This crate provides tools for simulating continuous EEG-like recordings in Rust.
//!
//! A simulated recording is the sum of event-related responses, placed at random onsets, of background
//! noise and of artifacts (eye movements, power-line interference, drifts). Alongside the composite signal,
//! every simulation returns the table of events and the signal of each source.
//!
//! # Describing an Experiment
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use rusty_eegsim::basis::n170;
//! use rusty_eegsim::component::{Component, LinearComponent};
//! use rusty_eegsim::design::{Level, SingleSubjectDesign};
//! use rusty_eegsim::formula::{Formula, Term};
//!
//! // Two conditions, each presented 20 times
//! let design = SingleSubjectDesign::new(
//!     vec![("stimulus".to_string(), vec![Level::from("car"), Level::from("face")])],
//!     20,
//! );
//!
//! // An N170 whose amplitude is larger for faces
//! let formula = Formula::new(vec![Term::Intercept, Term::dummy("stimulus", "face")]);
//! let component = LinearComponent::new(n170(100.0), formula, vec![5.0, 3.0]);
//! assert_eq!(component.amplitude(&BTreeMap::from([("stimulus".to_string(), Level::from("face"))])), Ok(8.0));
//! ```
//!
//! # Simulating a Recording
//!
//! ```rust
//! use rusty_eegsim::artifact::Artifact;
//! use rusty_eegsim::artifact::drift::Drift;
//! use rusty_eegsim::artifact::powerline::PowerLineNoise;
//! use rusty_eegsim::basis::p300;
//! use rusty_eegsim::component::{Component, LinearComponent};
//! use rusty_eegsim::design::SingleSubjectDesign;
//! use rusty_eegsim::formula::Formula;
//! use rusty_eegsim::noise::PowerLawNoise;
//! use rusty_eegsim::onset::{LogNormalGap, Onset};
//! use rusty_eegsim::simulation::Simulation;
//!
//! let simulation = Simulation::new(
//!     SingleSubjectDesign::new(vec![], 50),
//!     vec![Box::new(LinearComponent::new(p300(1000.0), Formula::intercept(), vec![4.0])) as Box<dyn Component>],
//!     Onset::new(LogNormalGap::new(6.5, 0.2), 200),
//!     PowerLawNoise::pink(1.0),
//!     vec![
//!         Box::new(PowerLineNoise::default()) as Box<dyn Artifact>,
//!         Box::new(Drift::new().with_linear(2.0).with_dc(-1.0)),
//!     ],
//! );
//!
//! let output = simulation.simulate_seeded(42).unwrap();
//! assert_eq!(output.events.len(), 50);
//! assert_eq!(output.sources.len(), 4);
//!
//! // The recording ends with the response to the last event
//! assert_eq!(output.signal.len(), output.events.latencies()[49] + p300(1000.0).len());
//! ```

pub mod artifact;
pub mod basis;
pub mod component;
pub mod design;
pub mod error;
pub mod event;
pub mod formula;
pub mod forward;
pub mod noise;
pub mod onset;
pub mod signal;
pub mod simulation;

/// The sampling rate assumed when none is provided, in Hz.
pub const DEFAULT_SAMPLING_RATE: f64 = 1000.0;
/// The inter-onset gap, in samples, above which a warning is logged.
pub const LARGE_GAP_WARNING: usize = 10_000;
