//! Module implementing experimental designs, i.e., the ordered sequence of condition assignments of a simulation.
use std::collections::BTreeMap;
use std::fmt;

use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// The level taken by a design factor in a given event.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Level {
    /// A categorical level, e.g., "face" or "car".
    Categorical(String),
    /// A continuous level, e.g., a stimulus luminance.
    Continuous(f64),
}

impl Level {
    /// Returns the continuous value of the level, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Level::Continuous(value) => Some(*value),
            Level::Categorical(_) => None,
        }
    }

    /// Returns the label of the level, if categorical.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Level::Categorical(label) => Some(label),
            Level::Continuous(_) => None,
        }
    }
}

impl From<&str> for Level {
    fn from(label: &str) -> Self {
        Level::Categorical(label.to_string())
    }
}

impl From<f64> for Level {
    fn from(value: f64) -> Self {
        Level::Continuous(value)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Level::Categorical(label) => write!(f, "{}", label),
            Level::Continuous(value) => write!(f, "{}", value),
        }
    }
}

/// The condition assignment of an event, mapping every factor name to its level.
pub type Condition = BTreeMap<String, Level>;

/// An experimental design produces an ordered, finite sequence of condition assignments.
pub trait Design: fmt::Debug {
    /// The names of the design factors.
    fn factors(&self) -> Vec<String>;

    /// The number of events produced by the design.
    fn size(&self) -> usize;

    /// Generate the condition assignments, in event order.
    fn generate_events(&self, rng: &mut dyn RngCore) -> Vec<Condition>;
}

/// The order in which the events of a design are emitted.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize, Default)]
pub enum EventOrder {
    /// Keep the enumeration order of the full factorial design.
    #[default]
    Sequential,
    /// Shuffle the events with the random stream of the simulation.
    Shuffled,
}

/// A single-subject design, the full factorial combination of all factor levels repeated `n_repeats` times.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SingleSubjectDesign {
    conditions: Vec<(String, Vec<Level>)>,
    n_repeats: usize,
    event_order: EventOrder,
}

impl SingleSubjectDesign {
    /// Create a new design with the specified factors and their levels.
    pub fn new(conditions: Vec<(String, Vec<Level>)>, n_repeats: usize) -> Self {
        SingleSubjectDesign {
            conditions,
            n_repeats,
            event_order: EventOrder::Sequential,
        }
    }

    /// Set the order in which the events are emitted.
    pub fn with_event_order(mut self, event_order: EventOrder) -> Self {
        self.event_order = event_order;
        self
    }

    /// Returns the number of repetitions of the full factorial design.
    pub fn n_repeats(&self) -> usize {
        self.n_repeats
    }

    fn full_factorial(&self) -> Vec<Condition> {
        if self.conditions.is_empty() {
            return vec![Condition::new()];
        }
        self.conditions
            .iter()
            .map(|(factor, levels)| levels.iter().map(move |level| (factor, level)))
            .multi_cartesian_product()
            .map(|combination| {
                combination
                    .into_iter()
                    .map(|(factor, level)| (factor.clone(), level.clone()))
                    .collect()
            })
            .collect()
    }
}

impl Design for SingleSubjectDesign {
    fn factors(&self) -> Vec<String> {
        self.conditions
            .iter()
            .map(|(factor, _)| factor.clone())
            .collect()
    }

    fn size(&self) -> usize {
        self.conditions
            .iter()
            .map(|(_, levels)| levels.len())
            .product::<usize>()
            * self.n_repeats
    }

    fn generate_events(&self, rng: &mut dyn RngCore) -> Vec<Condition> {
        let factorial = self.full_factorial();
        let mut events: Vec<Condition> = (0..self.n_repeats)
            .flat_map(|_| factorial.iter().cloned())
            .collect();

        if self.event_order == EventOrder::Shuffled {
            events.shuffle(rng);
        }
        events
    }
}

/// A design given as a literal, ordered list of condition assignments.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ListDesign {
    events: Vec<Condition>,
}

impl ListDesign {
    pub fn new(events: Vec<Condition>) -> Self {
        ListDesign { events }
    }
}

impl Design for ListDesign {
    fn factors(&self) -> Vec<String> {
        self.events
            .iter()
            .flat_map(|condition| condition.keys().cloned())
            .unique()
            .sorted()
            .collect()
    }

    fn size(&self) -> usize {
        self.events.len()
    }

    fn generate_events(&self, _rng: &mut dyn RngCore) -> Vec<Condition> {
        self.events.clone()
    }
}
