//! The remote-agent capability used by the simulation driver.

use crate::env::Action;
use crate::error::AgentError;
use async_trait::async_trait;
use serde::Serialize;

/// One (state, action, reward, next state, done) tuple reported for learning.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: Vec<f64>,
    pub action: Action,
    pub reward: f64,
    pub next_state: Vec<f64>,
    pub done: bool,
}

impl Transition {
    /// Wire envelope expected by the `step` endpoint.
    pub(crate) fn to_wire(&self) -> StepRequest<'_> {
        StepRequest {
            step_data: StepData {
                state: &self.state,
                action: [self.action],
                reward: self.reward,
                next_state: &self.next_state,
                done: self.done,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StepRequest<'a> {
    step_data: StepData<'a>,
}

#[derive(Debug, Serialize)]
struct StepData<'a> {
    state: &'a [f64],
    /// Singleton, mirroring the shape of the act response.
    action: [Action; 1],
    reward: f64,
    next_state: &'a [f64],
    done: bool,
}

/// An agent that picks actions and learns from reported transitions.
#[async_trait]
pub trait RemoteAgent: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the agent's action for `observation`; callers coerce it.
    async fn request_action(&self, observation: &[f64], noise: f64) -> Result<f64, AgentError>;

    async fn report_step(&self, transition: &Transition) -> Result<(), AgentError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transition_wire_format_wraps_action() {
        let transition = Transition {
            state: vec![0.1, 0.2],
            action: Action::Discrete(1),
            reward: 1.0,
            next_state: vec![0.3, 0.4],
            done: false,
        };
        let value = serde_json::to_value(transition.to_wire()).unwrap();
        assert_eq!(
            value,
            json!({
                "step_data": {
                    "state": [0.1, 0.2],
                    "action": [1],
                    "reward": 1.0,
                    "next_state": [0.3, 0.4],
                    "done": false
                }
            })
        );
    }
}
