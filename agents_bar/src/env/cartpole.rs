//! Classic cart-pole balancing task (CartPole-v0 dynamics).
//!
//! A pole is hinged on a cart moving along a frictionless track. Action 0
//! pushes the cart left, action 1 pushes it right. Every step earns a reward
//! of 1.0; the episode ends when the pole leans past 12 degrees, the cart
//! leaves the track, or the step limit is reached.

use super::{Action, ActionSpace, Environment, Observation, StepOutcome};
use crate::error::EnvError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use tracing::debug;

const GRAVITY: f64 = 9.8;
const CART_MASS: f64 = 1.0;
const POLE_MASS: f64 = 0.1;
const TOTAL_MASS: f64 = CART_MASS + POLE_MASS;
/// Half the pole's length.
const POLE_HALF_LENGTH: f64 = 0.5;
const POLE_MASS_LENGTH: f64 = POLE_MASS * POLE_HALF_LENGTH;
const FORCE_MAG: f64 = 10.0;
/// Seconds between state updates.
const TAU: f64 = 0.02;
const THETA_THRESHOLD_RADIANS: f64 = 12.0 * 2.0 * std::f64::consts::PI / 360.0;
const X_THRESHOLD: f64 = 2.4;
const INITIAL_STATE_BOUND: f64 = 0.05;

pub const DEFAULT_MAX_STEPS: u32 = 200;

/// Cart-pole environment with an episode step limit.
pub struct CartPole {
    /// `[x, x_dot, theta, theta_dot]`
    state: Option<[f64; 4]>,
    steps: u32,
    max_steps: u32,
    done: bool,
    rng: StdRng,
}

impl CartPole {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Reproducible environment: identical seeds yield identical episodes.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            state: None,
            steps: 0,
            max_steps: DEFAULT_MAX_STEPS,
            done: false,
            rng,
        }
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    fn frame(&self) -> String {
        const WIDTH: usize = 41;
        let Some([x, _, theta, _]) = self.state else {
            return String::from("[ not started ]");
        };
        let mut track = vec!['-'; WIDTH];
        let ratio = ((x + X_THRESHOLD) / (2.0 * X_THRESHOLD)).clamp(0.0, 1.0);
        let cart = (ratio * (WIDTH - 1) as f64).round() as usize;
        track[cart] = if theta > 0.035 {
            '/'
        } else if theta < -0.035 {
            '\\'
        } else {
            '|'
        };
        format!(
            "[{}] step {:>3} x={:+.3} theta={:+.3}",
            track.into_iter().collect::<String>(),
            self.steps,
            x,
            theta
        )
    }
}

impl Default for CartPole {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for CartPole {
    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(2)
    }

    fn reset(&mut self) -> Result<Observation, EnvError> {
        let mut state = [0.0; 4];
        for value in state.iter_mut() {
            *value = self.rng.gen_range(-INITIAL_STATE_BOUND..INITIAL_STATE_BOUND);
        }
        self.state = Some(state);
        self.steps = 0;
        self.done = false;
        Ok(state.to_vec())
    }

    fn step(&mut self, action: Action) -> Result<StepOutcome, EnvError> {
        let [mut x, mut x_dot, mut theta, mut theta_dot] = self.state.ok_or(EnvError::NotReset)?;
        if self.done {
            return Err(EnvError::EpisodeFinished);
        }

        let force = match action {
            Action::Discrete(1) => FORCE_MAG,
            Action::Discrete(0) => -FORCE_MAG,
            other => {
                return Err(EnvError::InvalidAction {
                    value: other.as_f64(),
                    space: self.action_space().to_string(),
                })
            }
        };

        let (sin_theta, cos_theta) = theta.sin_cos();
        let temp = (force + POLE_MASS_LENGTH * theta_dot * theta_dot * sin_theta) / TOTAL_MASS;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (POLE_HALF_LENGTH * (4.0 / 3.0 - POLE_MASS * cos_theta * cos_theta / TOTAL_MASS));
        let x_acc = temp - POLE_MASS_LENGTH * theta_acc * cos_theta / TOTAL_MASS;

        x += TAU * x_dot;
        x_dot += TAU * x_acc;
        theta += TAU * theta_dot;
        theta_dot += TAU * theta_acc;

        let state = [x, x_dot, theta, theta_dot];
        self.state = Some(state);
        self.steps += 1;

        let failed = !(-X_THRESHOLD..=X_THRESHOLD).contains(&x)
            || !(-THETA_THRESHOLD_RADIANS..=THETA_THRESHOLD_RADIANS).contains(&theta);
        let truncated = !failed && self.steps >= self.max_steps;
        self.done = failed || truncated;

        let mut info = HashMap::new();
        if truncated {
            info.insert("TimeLimit.truncated".to_string(), serde_json::Value::Bool(true));
        }
        if self.done {
            debug!(steps = self.steps, failed, "cart-pole episode finished");
        }

        Ok(StepOutcome {
            observation: state.to_vec(),
            reward: 1.0,
            done: self.done,
            info,
        })
    }

    fn render(&self) {
        println!("{}", self.frame());
    }

    fn close(&mut self) {
        self.state = None;
        self.done = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_starts_near_upright() {
        let mut env = CartPole::seeded(7);
        let obs = env.reset().unwrap();
        assert_eq!(obs.len(), 4);
        assert!(obs.iter().all(|v| v.abs() <= INITIAL_STATE_BOUND));
    }

    #[test]
    fn constant_push_topples_the_pole() {
        let mut env = CartPole::seeded(1);
        env.reset().unwrap();
        let mut steps = 0;
        loop {
            let outcome = env.step(Action::Discrete(1)).unwrap();
            steps += 1;
            assert_eq!(outcome.reward, 1.0);
            if outcome.done {
                assert!(!outcome.info.contains_key("TimeLimit.truncated"));
                break;
            }
        }
        assert!(steps < DEFAULT_MAX_STEPS);
        assert_eq!(env.step(Action::Discrete(0)), Err(EnvError::EpisodeFinished));
    }

    #[test]
    fn step_limit_truncates_episode() {
        let mut env = CartPole::seeded(3).with_max_steps(3);
        env.reset().unwrap();
        env.step(Action::Discrete(0)).unwrap();
        env.step(Action::Discrete(1)).unwrap();
        let last = env.step(Action::Discrete(0)).unwrap();
        assert!(last.done);
        assert_eq!(
            last.info.get("TimeLimit.truncated"),
            Some(&serde_json::Value::Bool(true))
        );
    }

    #[test]
    fn rejects_unknown_actions_and_unreset_steps() {
        let mut env = CartPole::seeded(5);
        assert_eq!(env.step(Action::Discrete(0)), Err(EnvError::NotReset));
        env.reset().unwrap();
        assert!(matches!(
            env.step(Action::Discrete(2)),
            Err(EnvError::InvalidAction { .. })
        ));
        assert!(matches!(
            env.step(Action::Continuous(0.5)),
            Err(EnvError::InvalidAction { .. })
        ));
    }

    #[test]
    fn seeded_environments_are_reproducible() {
        let mut a = CartPole::seeded(42);
        let mut b = CartPole::seeded(42);
        assert_eq!(a.reset().unwrap(), b.reset().unwrap());
        assert_eq!(
            a.step(Action::Discrete(1)).unwrap(),
            b.step(Action::Discrete(1)).unwrap()
        );
    }
}
