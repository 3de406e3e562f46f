//! Module implementing linear formulas, i.e., the encoding of a condition assignment into a numeric design row.
//!
//! A formula is an ordered list of terms, one per regression coefficient. For example, the formula
//! `1 + condition` with treatment coding of the level "face" reads:
//!
//! ```rust
//! use rusty_eegsim::design::{Condition, Level};
//! use rusty_eegsim::formula::{Formula, Term};
//!
//! let formula = Formula::new(vec![Term::Intercept, Term::dummy("condition", "face")]);
//! let condition = Condition::from([("condition".to_string(), Level::from("face"))]);
//!
//! assert_eq!(formula.design_row(&condition).unwrap(), vec![1.0, 1.0]);
//! ```
use serde::{Deserialize, Serialize};

use crate::design::{Condition, Level};
use crate::error::SimError;

/// A single term of a linear formula.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Term {
    /// The constant term.
    Intercept,
    /// Indicator of a categorical level (treatment coding).
    Dummy { factor: String, level: String },
    /// The value of a continuous factor.
    Continuous { factor: String },
    /// The product of several terms.
    Interaction(Vec<Term>),
}

impl Term {
    /// Create a dummy term for the given factor level.
    pub fn dummy(factor: &str, level: &str) -> Self {
        Term::Dummy {
            factor: factor.to_string(),
            level: level.to_string(),
        }
    }

    /// Create a continuous term for the given factor.
    pub fn continuous(factor: &str) -> Self {
        Term::Continuous {
            factor: factor.to_string(),
        }
    }

    /// Evaluate the term for a condition assignment.
    pub fn eval(&self, condition: &Condition) -> Result<f64, SimError> {
        match self {
            Term::Intercept => Ok(1.0),
            Term::Dummy { factor, level } => match lookup(condition, factor)? {
                Level::Categorical(label) => Ok(if label == level { 1.0 } else { 0.0 }),
                Level::Continuous(_) => Err(SimError::ComponentConfig(format!(
                    "Factor {} is continuous but is used as categorical",
                    factor
                ))),
            },
            Term::Continuous { factor } => lookup(condition, factor)?.as_f64().ok_or_else(|| {
                SimError::ComponentConfig(format!(
                    "Factor {} is categorical but is used as continuous",
                    factor
                ))
            }),
            Term::Interaction(terms) => terms
                .iter()
                .try_fold(1.0, |acc, term| term.eval(condition).map(|value| acc * value)),
        }
    }
}

fn lookup<'a>(condition: &'a Condition, factor: &str) -> Result<&'a Level, SimError> {
    condition.get(factor).ok_or_else(|| {
        SimError::ComponentConfig(format!("Factor {} is missing from the condition", factor))
    })
}

/// A linear formula, an ordered list of terms.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Formula {
    terms: Vec<Term>,
}

impl Formula {
    pub fn new(terms: Vec<Term>) -> Self {
        Formula { terms }
    }

    /// The formula with a single intercept term.
    pub fn intercept() -> Self {
        Formula {
            terms: vec![Term::Intercept],
        }
    }

    /// Returns the terms of the formula.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Returns the number of terms, i.e., the number of coefficients the formula expects.
    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    /// Encode a condition assignment as a design row, one value per term.
    pub fn design_row(&self, condition: &Condition) -> Result<Vec<f64>, SimError> {
        self.terms.iter().map(|term| term.eval(condition)).collect()
    }

    /// Returns the linear predictor, i.e., the dot product between the coefficients and the design row.
    pub fn linear_predictor(
        &self,
        coefficients: &[f64],
        condition: &Condition,
    ) -> Result<f64, SimError> {
        if coefficients.len() != self.terms.len() {
            return Err(SimError::ComponentConfig(format!(
                "Expected {} coefficients but got {}",
                self.terms.len(),
                coefficients.len()
            )));
        }
        Ok(self
            .design_row(condition)?
            .iter()
            .zip(coefficients)
            .map(|(x, beta)| x * beta)
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition(label: &str, value: f64) -> Condition {
        Condition::from([
            ("condition".to_string(), Level::from(label)),
            ("continuous".to_string(), Level::from(value)),
        ])
    }

    #[test]
    fn test_term_eval() {
        let c = condition("face", 2.5);
        assert_eq!(Term::Intercept.eval(&c), Ok(1.0));
        assert_eq!(Term::dummy("condition", "face").eval(&c), Ok(1.0));
        assert_eq!(Term::dummy("condition", "car").eval(&c), Ok(0.0));
        assert_eq!(Term::continuous("continuous").eval(&c), Ok(2.5));
        assert_eq!(
            Term::Interaction(vec![
                Term::dummy("condition", "face"),
                Term::continuous("continuous")
            ])
            .eval(&c),
            Ok(2.5)
        );
    }

    #[test]
    fn test_term_eval_invalid() {
        let c = condition("face", 2.5);
        assert!(matches!(
            Term::continuous("condition").eval(&c),
            Err(SimError::ComponentConfig(_))
        ));
        assert!(matches!(
            Term::dummy("continuous", "face").eval(&c),
            Err(SimError::ComponentConfig(_))
        ));
        assert!(matches!(
            Term::Intercept.eval(&c).and(Term::continuous("missing").eval(&c)),
            Err(SimError::ComponentConfig(_))
        ));
    }

    #[test]
    fn test_linear_predictor() {
        let formula = Formula::new(vec![
            Term::Intercept,
            Term::dummy("condition", "face"),
            Term::continuous("continuous"),
        ]);
        assert_eq!(formula.num_terms(), 3);
        assert_eq!(
            formula.linear_predictor(&[1.0, 0.5, -2.0], &condition("face", 1.0)),
            Ok(-0.5)
        );
        assert_eq!(
            formula.linear_predictor(&[1.0, 0.5, -2.0], &condition("car", 0.0)),
            Ok(1.0)
        );
        assert!(matches!(
            formula.linear_predictor(&[1.0, 0.5], &condition("car", 0.0)),
            Err(SimError::ComponentConfig(_))
        ));
    }
}
