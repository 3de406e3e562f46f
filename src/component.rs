//! Module implementing response components, i.e., the mapping from an event's condition to its waveform.
//!
//! A component scales a basis waveform by a per-trial amplitude, the linear predictor of its formula
//! evaluated at the event's condition, optionally transformed by a link function.
//!
//! ```rust
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use rusty_eegsim::component::{Component, LinearComponent};
//! use rusty_eegsim::design::{Condition, Level};
//! use rusty_eegsim::formula::{Formula, Term};
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let component = LinearComponent::new(
//!     vec![0.0, 0.5, 1.0, 0.5, 0.0],
//!     Formula::new(vec![Term::Intercept, Term::dummy("condition", "face")]),
//!     vec![1.0, 2.0],
//! );
//!
//! let face = Condition::from([("condition".to_string(), Level::from("face"))]);
//! let waveform = component.synthesize(&face, &mut rng).unwrap();
//! assert_eq!(waveform.channel(0), Some(vec![0.0, 1.5, 3.0, 1.5, 0.0]));
//! ```
use std::fmt;
use std::sync::Arc;

use rand::RngCore;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::design::Condition;
use crate::error::SimError;
use crate::formula::Formula;
use crate::forward::ForwardModel;
use crate::signal::{reconcile_channels, ContinuousSignal};

/// A response component produces the waveform of a single event.
pub trait Component: fmt::Debug {
    /// The number of samples of the produced waveforms.
    fn basis_len(&self) -> usize;

    /// The number of channels of the produced waveforms.
    fn num_channels(&self) -> usize {
        1
    }

    /// Synthesize the waveform of an event with the given condition.
    /// Configuration errors are only detected here, so that a component can be checked against several designs.
    fn synthesize(
        &self,
        condition: &Condition,
        rng: &mut dyn RngCore,
    ) -> Result<ContinuousSignal, SimError>;
}

/// The nonlinearity applied to the linear predictor of a component.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize, Default)]
pub enum Link {
    #[default]
    Identity,
    Exponential,
    Logistic,
}

impl Link {
    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Link::Identity => x,
            Link::Exponential => x.exp(),
            Link::Logistic => 1.0 / (1.0 + (-x).exp()),
        }
    }
}

/// A single-channel component whose amplitude is given by a linear formula.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct LinearComponent {
    basis: Vec<f64>,
    formula: Formula,
    coefficients: Vec<f64>,
    #[serde(default)]
    link: Link,
}

impl LinearComponent {
    pub fn new(basis: Vec<f64>, formula: Formula, coefficients: Vec<f64>) -> Self {
        LinearComponent {
            basis,
            formula,
            coefficients,
            link: Link::Identity,
        }
    }

    /// Set the nonlinearity applied to the linear predictor.
    pub fn with_link(mut self, link: Link) -> Self {
        self.link = link;
        self
    }

    /// Returns the basis waveform.
    pub fn basis(&self) -> &[f64] {
        &self.basis
    }

    /// Returns the regression coefficients.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Returns the per-trial amplitude for the given condition.
    pub fn amplitude(&self, condition: &Condition) -> Result<f64, SimError> {
        let predictor = self
            .formula
            .linear_predictor(&self.coefficients, condition)?;
        Ok(self.link.apply(predictor))
    }
}

impl Component for LinearComponent {
    fn basis_len(&self) -> usize {
        self.basis.len()
    }

    fn synthesize(
        &self,
        condition: &Condition,
        _rng: &mut dyn RngCore,
    ) -> Result<ContinuousSignal, SimError> {
        if self.basis.is_empty() {
            return Err(SimError::ComponentConfig(
                "The basis of a component must not be empty".to_string(),
            ));
        }
        let amplitude = self.amplitude(condition)?;
        let waveform: Vec<f64> = self.basis.iter().map(|x| x * amplitude).collect();
        Ok(ContinuousSignal::from_samples(&waveform))
    }
}

/// A component whose amplitude varies from trial to trial by a random factor drawn from `N(1, amplitude_sd)`.
#[derive(Debug)]
pub struct JitteredComponent {
    component: Box<dyn Component>,
    amplitude_sd: f64,
}

impl JitteredComponent {
    pub fn new<C: Component + 'static>(component: C, amplitude_sd: f64) -> Self {
        JitteredComponent {
            component: Box::new(component),
            amplitude_sd,
        }
    }
}

impl Component for JitteredComponent {
    fn basis_len(&self) -> usize {
        self.component.basis_len()
    }

    fn num_channels(&self) -> usize {
        self.component.num_channels()
    }

    fn synthesize(
        &self,
        condition: &Condition,
        rng: &mut dyn RngCore,
    ) -> Result<ContinuousSignal, SimError> {
        if !(self.amplitude_sd >= 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "The amplitude variability must be non-negative, got {}",
                self.amplitude_sd
            )));
        }
        let dist = Normal::new(1.0, self.amplitude_sd).map_err(|e| {
            SimError::InvalidParameter(format!("Invalid amplitude variability: {}", e))
        })?;
        let mut waveform = self.component.synthesize(condition, rng)?;
        waveform.scale(dist.sample(rng));
        Ok(waveform)
    }
}

/// A component projected into channel space through a forward model.
#[derive(Debug)]
pub struct MultichannelComponent {
    component: Box<dyn Component>,
    forward_model: Arc<dyn ForwardModel>,
    source: String,
}

impl MultichannelComponent {
    pub fn new<C: Component + 'static>(
        component: C,
        forward_model: Arc<dyn ForwardModel>,
        source: &str,
    ) -> Self {
        MultichannelComponent {
            component: Box::new(component),
            forward_model,
            source: source.to_string(),
        }
    }
}

impl Component for MultichannelComponent {
    fn basis_len(&self) -> usize {
        self.component.basis_len()
    }

    fn num_channels(&self) -> usize {
        self.forward_model.num_channels()
    }

    fn synthesize(
        &self,
        condition: &Condition,
        rng: &mut dyn RngCore,
    ) -> Result<ContinuousSignal, SimError> {
        let waveform = self.component.synthesize(condition, rng)?;
        self.forward_model.project_signal(&self.source, &waveform)
    }
}

/// Returns the common channel count of several components under broadcast rules.
pub fn components_channels(components: &[Box<dyn Component>]) -> Result<usize, SimError> {
    reconcile_channels(components.iter().map(|component| component.num_channels()))
}

/// Synthesize the waveform of an event as the sum of the waveforms of all components.
/// Shorter waveforms are zero-padded; single-channel waveforms are broadcast to `num_channels`.
pub fn synthesize_event(
    components: &[Box<dyn Component>],
    num_channels: usize,
    condition: &Condition,
    rng: &mut dyn RngCore,
) -> Result<ContinuousSignal, SimError> {
    let waveforms = components
        .iter()
        .map(|component| {
            component
                .synthesize(condition, rng)
                .and_then(|waveform| waveform.broadcast_to(num_channels))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let len = waveforms.iter().map(|w| w.len()).max().unwrap_or(0);
    let mut event = ContinuousSignal::zeros(num_channels, len);
    for waveform in waveforms.iter() {
        event.add_at(0, waveform)?;
    }
    Ok(event)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::design::Level;
    use crate::formula::Term;
    use crate::forward::LeadfieldModel;

    const SEED: u64 = 42;

    fn condition(label: &str) -> Condition {
        Condition::from([("condition".to_string(), Level::from(label))])
    }

    fn face_component() -> LinearComponent {
        LinearComponent::new(
            vec![1.0, 2.0, 1.0],
            Formula::new(vec![Term::Intercept, Term::dummy("condition", "face")]),
            vec![1.0, -3.0],
        )
    }

    fn forward_model() -> Arc<dyn ForwardModel> {
        let mut model = LeadfieldModel::new(vec!["Cz".to_string(), "Pz".to_string()]);
        model.add_source("p300", &[vec![0.5], vec![1.0]]).unwrap();
        Arc::new(model)
    }

    #[test]
    fn test_linear_component() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let component = face_component();

        assert_eq!(component.basis_len(), 3);
        assert_eq!(component.num_channels(), 1);

        let waveform = component.synthesize(&condition("car"), &mut rng).unwrap();
        assert_eq!(waveform.channel(0), Some(vec![1.0, 2.0, 1.0]));

        let waveform = component.synthesize(&condition("face"), &mut rng).unwrap();
        assert_eq!(waveform.channel(0), Some(vec![-2.0, -4.0, -2.0]));
    }

    #[test]
    fn test_linear_component_link() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let component = face_component().with_link(Link::Exponential);
        let waveform = component.synthesize(&condition("car"), &mut rng).unwrap();
        assert_relative_eq!(waveform.get(0, 1).unwrap(), 2.0 * 1_f64.exp());

        assert_relative_eq!(Link::Logistic.apply(0.0), 0.5);
        assert_relative_eq!(Link::Identity.apply(-1.5), -1.5);
    }

    #[test]
    fn test_linear_component_invalid() {
        let mut rng = StdRng::seed_from_u64(SEED);

        // the configuration is only checked at synthesis time
        let component = LinearComponent::new(vec![], Formula::intercept(), vec![1.0]);
        assert!(matches!(
            component.synthesize(&condition("car"), &mut rng),
            Err(SimError::ComponentConfig(_))
        ));

        let component = LinearComponent::new(vec![1.0], Formula::intercept(), vec![1.0, 2.0]);
        assert!(matches!(
            component.synthesize(&condition("car"), &mut rng),
            Err(SimError::ComponentConfig(_))
        ));

        let component = face_component();
        assert!(matches!(
            component.synthesize(&Condition::new(), &mut rng),
            Err(SimError::ComponentConfig(_))
        ));
    }

    #[test]
    fn test_jittered_component() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let component = JitteredComponent::new(face_component(), 0.1);

        let w1 = component.synthesize(&condition("car"), &mut rng).unwrap();
        let w2 = component.synthesize(&condition("car"), &mut rng).unwrap();
        assert_ne!(w1, w2);
        // the shape is preserved, only the amplitude varies
        assert_relative_eq!(w1.get(0, 1).unwrap(), 2.0 * w1.get(0, 0).unwrap());

        let component = JitteredComponent::new(JitteredComponent::new(face_component(), 0.0), -1.0);
        assert!(matches!(
            component.synthesize(&condition("car"), &mut rng),
            Err(SimError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_multichannel_component() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let component = MultichannelComponent::new(face_component(), forward_model(), "p300");
        assert_eq!(component.num_channels(), 2);
        assert_eq!(component.basis_len(), 3);

        let waveform = component.synthesize(&condition("car"), &mut rng).unwrap();
        assert_eq!(waveform.channel(0), Some(vec![0.5, 1.0, 0.5]));
        assert_eq!(waveform.channel(1), Some(vec![1.0, 2.0, 1.0]));

        let component = MultichannelComponent::new(face_component(), forward_model(), "n170");
        assert!(matches!(
            component.synthesize(&condition("car"), &mut rng),
            Err(SimError::ConfigMismatch(_))
        ));
    }

    #[test]
    fn test_synthesize_event() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let components: Vec<Box<dyn Component>> = vec![
            Box::new(MultichannelComponent::new(face_component(), forward_model(), "p300")),
            Box::new(LinearComponent::new(
                vec![1.0; 5],
                Formula::intercept(),
                vec![0.5],
            )),
        ];
        assert_eq!(components_channels(&components), Ok(2));

        let event = synthesize_event(&components, 2, &condition("car"), &mut rng).unwrap();
        assert_eq!(event.len(), 5);
        assert_eq!(event.channel(0), Some(vec![1.0, 1.5, 1.0, 0.5, 0.5]));
        assert_eq!(event.channel(1), Some(vec![1.5, 2.5, 1.5, 0.5, 0.5]));

        assert_eq!(
            synthesize_event(&[], 1, &condition("car"), &mut rng).map(|e| e.len()),
            Ok(0)
        );
    }
}
