//! Simulation environments driven by a remote agent.
//!
//! The driver only talks to the [`Environment`] trait, so any simulation
//! exposing reset/step/render/close can be substituted for [`CartPole`].

pub mod cartpole;

pub use cartpole::CartPole;

use crate::error::EnvError;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Observation vector produced by an environment.
pub type Observation = Vec<f64>;

/// An action accepted by an environment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Action {
    Discrete(i64),
    Continuous(f64),
}

impl Action {
    pub fn as_f64(self) -> f64 {
        match self {
            Action::Discrete(index) => index as f64,
            Action::Continuous(value) => value,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Discrete(index) => write!(f, "{index}"),
            Action::Continuous(value) => write!(f, "{value}"),
        }
    }
}

/// Shape of the actions an environment accepts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionSpace {
    /// Indices `0..n`.
    Discrete(u32),
    /// Any value in `[low, high]`.
    Continuous { low: f64, high: f64 },
}

impl ActionSpace {
    /// Converts the number returned by the remote agent into an action.
    ///
    /// Discrete spaces truncate toward zero; continuous spaces clamp.
    pub fn coerce(&self, raw: f64) -> Result<Action, EnvError> {
        if !raw.is_finite() {
            return Err(EnvError::NonFiniteAction(raw));
        }
        match *self {
            ActionSpace::Discrete(n) => {
                let index = raw.trunc();
                if index < 0.0 || index >= f64::from(n) {
                    return Err(EnvError::InvalidAction {
                        value: raw,
                        space: self.to_string(),
                    });
                }
                Ok(Action::Discrete(index as i64))
            }
            ActionSpace::Continuous { low, high } => Ok(Action::Continuous(raw.clamp(low, high))),
        }
    }
}

impl fmt::Display for ActionSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionSpace::Discrete(n) => write!(f, "Discrete({n})"),
            ActionSpace::Continuous { low, high } => write!(f, "Continuous([{low}, {high}])"),
        }
    }
}

/// Result of a single environment step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub observation: Observation,
    pub reward: f64,
    pub done: bool,
    pub info: HashMap<String, serde_json::Value>,
}

/// Capability interface of a simulation environment.
pub trait Environment {
    fn action_space(&self) -> ActionSpace;

    /// Starts a new episode and returns its first observation.
    fn reset(&mut self) -> Result<Observation, EnvError>;

    fn step(&mut self, action: Action) -> Result<StepOutcome, EnvError>;

    fn render(&self);

    fn close(&mut self) {}
}
