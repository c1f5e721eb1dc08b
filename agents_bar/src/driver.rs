//! Episode loop: the remote agent chooses actions, the environment plays
//! them, and every transition is reported back so the agent can learn.

use crate::agent::{RemoteAgent, Transition};
use crate::env::Environment;
use crate::error::DriverError;
use crate::settings::TrainingConfig;
use tracing::{debug, info, instrument};

/// Outcome of [`train`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSummary {
    /// Score of every training episode, in order.
    pub scores: Vec<f64>,
    /// Index of the first episode whose score met the threshold.
    pub solved_at: Option<u32>,
    /// Score of the rendered rollout that follows a solved episode.
    pub final_score: Option<f64>,
}

impl TrainingSummary {
    pub fn episodes_run(&self) -> usize {
        self.scores.len()
    }
}

/// Exploration noise for `episode`: `decay ^ episode`.
pub fn exploration_noise(episode: u32, decay: f64) -> f64 {
    decay.powi(episode.min(i32::MAX as u32) as i32)
}

/// Plays one episode, reporting every transition. Returns the total reward.
#[instrument(skip(env, agent), fields(agent = agent.name()))]
pub async fn run_episode<E, A>(env: &mut E, agent: &A, noise: f64) -> Result<f64, DriverError>
where
    E: Environment + ?Sized,
    A: RemoteAgent + ?Sized,
{
    let space = env.action_space();
    let mut observation = env.reset()?;
    let mut score = 0.0;

    loop {
        let raw = agent.request_action(&observation, noise).await?;
        let action = space.coerce(raw)?;
        let outcome = env.step(action)?;
        score += outcome.reward;

        let transition = Transition {
            state: observation,
            action,
            reward: outcome.reward,
            next_state: outcome.observation,
            done: outcome.done,
        };
        agent.report_step(&transition).await?;

        if transition.done {
            debug!(score, "Episode done");
            return Ok(score);
        }
        observation = transition.next_state;
    }
}

/// Plays one episode without reporting transitions, optionally rendering
/// after every step.
#[instrument(skip(env, agent), fields(agent = agent.name()))]
pub async fn greedy_rollout<E, A>(
    env: &mut E,
    agent: &A,
    noise: f64,
    render: bool,
) -> Result<f64, DriverError>
where
    E: Environment + ?Sized,
    A: RemoteAgent + ?Sized,
{
    let space = env.action_space();
    let mut observation = env.reset()?;
    let mut score = 0.0;

    loop {
        let raw = agent.request_action(&observation, noise).await?;
        let outcome = env.step(space.coerce(raw)?)?;
        score += outcome.reward;
        if render {
            env.render();
        }
        if outcome.done {
            return Ok(score);
        }
        observation = outcome.observation;
    }
}

/// Runs up to `config.max_episodes` episodes with decaying exploration.
///
/// The first episode scoring at least `config.score_threshold` is followed by
/// one rendered rollout at the same noise level, after which training stops.
/// The environment is closed on every exit path.
pub async fn train<E, A>(env: &mut E, agent: &A, config: &TrainingConfig) -> Result<TrainingSummary, DriverError>
where
    E: Environment + ?Sized,
    A: RemoteAgent + ?Sized,
{
    let result = train_episodes(env, agent, config).await;
    env.close();
    result
}

async fn train_episodes<E, A>(env: &mut E, agent: &A, config: &TrainingConfig) -> Result<TrainingSummary, DriverError>
where
    E: Environment + ?Sized,
    A: RemoteAgent + ?Sized,
{
    let mut summary = TrainingSummary::default();

    for episode in 0..config.max_episodes {
        let noise = exploration_noise(episode, config.noise_decay);
        let score = run_episode(env, agent, noise).await?;
        println!("score: {score}");
        info!(episode, noise, score, "Episode finished");
        summary.scores.push(score);

        if score >= config.score_threshold {
            info!(
                episode,
                threshold = config.score_threshold,
                "Score threshold reached, running final rollout"
            );
            let final_score = greedy_rollout(env, agent, noise, config.render_final).await?;
            info!(score = final_score, "Final rollout finished");
            summary.solved_at = Some(episode);
            summary.final_score = Some(final_score);
            break;
        }
    }

    if summary.solved_at.is_none() {
        info!(
            episodes = summary.episodes_run(),
            threshold = config.score_threshold,
            "Score threshold not reached"
        );
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_decays_geometrically() {
        assert_eq!(exploration_noise(0, 0.99), 1.0);
        assert!((exploration_noise(1, 0.99) - 0.99).abs() < 1e-12);
        assert!((exploration_noise(2, 0.99) - 0.9801).abs() < 1e-12);
        assert!(exploration_noise(500, 0.99) < 0.01);
    }

    #[test]
    fn unit_decay_keeps_noise_constant() {
        assert_eq!(exploration_noise(0, 1.0), 1.0);
        assert_eq!(exploration_noise(1_000, 1.0), 1.0);
    }
}
