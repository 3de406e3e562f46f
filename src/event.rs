//! Module implementing the event table returned by a simulation.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::design::{Condition, Level};

/// Name of the column holding the onset samples.
pub const LATENCY: &str = "latency";

/// A single trial: its position in the design, its condition assignment and its onset sample.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Event {
    pub index: usize,
    pub condition: Condition,
    pub onset: usize,
}

/// The values of a single column of an event table.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Column {
    /// The levels taken by a design factor.
    Levels(Vec<Level>),
    /// The onset samples.
    Latency(Vec<usize>),
}

impl Column {
    /// Returns the levels, if the column is a design factor.
    pub fn levels(&self) -> Option<&[Level]> {
        match self {
            Column::Levels(levels) => Some(levels),
            Column::Latency(_) => None,
        }
    }

    /// Returns the onset samples, if the column is the latency.
    pub fn latencies(&self) -> Option<&[usize]> {
        match self {
            Column::Latency(onsets) => Some(onsets),
            Column::Levels(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Levels(levels) => levels.len(),
            Column::Latency(onsets) => onsets.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One row per event, with one column per design factor plus the latency column.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct EventTable {
    factors: Vec<String>,
    events: Vec<Event>,
}

impl EventTable {
    /// Create an event table by pairing condition assignments with onsets, in order.
    /// Surplus conditions or onsets are ignored.
    pub fn new(factors: Vec<String>, conditions: Vec<Condition>, onsets: &[usize]) -> Self {
        let events = conditions
            .into_iter()
            .zip(onsets.iter())
            .enumerate()
            .map(|(index, (condition, onset))| Event {
                index,
                condition,
                onset: *onset,
            })
            .collect();
        EventTable { factors, events }
    }

    /// Returns the design factors, i.e., the columns of the table apart from the latency.
    pub fn factors(&self) -> &[String] {
        &self.factors
    }

    /// Returns the column names, the factors followed by the latency.
    pub fn columns(&self) -> Vec<&str> {
        self.factors
            .iter()
            .map(|factor| factor.as_str())
            .chain(std::iter::once(LATENCY))
            .collect()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns the onset sample of every event, in order.
    pub fn latencies(&self) -> Vec<usize> {
        self.events.iter().map(|event| event.onset).collect()
    }

    /// Returns the values of a column, or None if the table has no such column.
    /// Latencies are integer onset samples; events missing a factor are skipped.
    pub fn column(&self, name: &str) -> Option<Column> {
        if name == LATENCY {
            return Some(Column::Latency(self.latencies()));
        }
        if !self.factors.iter().any(|factor| factor == name) {
            return None;
        }
        Some(Column::Levels(
            self.events
                .iter()
                .filter_map(|event| event.condition.get(name).cloned())
                .collect(),
        ))
    }
}

impl fmt::Display for EventTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.columns().join("\t"))?;
        for event in self.events.iter() {
            for factor in self.factors.iter() {
                match event.condition.get(factor) {
                    Some(level) => write!(f, "{}\t", level)?,
                    None => write!(f, "\t")?,
                }
            }
            writeln!(f, "{}", event.onset)?;
        }
        Ok(())
    }
}
