//! Main entry point for the Agents Bar CLI.

use agents_bar::{
    cli::{self, Commands},
    driver,
    env::CartPole,
    settings::Settings,
    telemetry, AgentsBarClient,
};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let mut settings = Settings::load(args.config.as_deref())?;
    telemetry::init(&settings.logging)?;

    if let Commands::Train {
        max_episodes,
        score_threshold,
        no_render,
        seed,
    } = &args.command
    {
        let training = &mut settings.training;
        if let Some(max_episodes) = *max_episodes {
            training.max_episodes = max_episodes;
        }
        if let Some(score_threshold) = *score_threshold {
            training.score_threshold = score_threshold;
        }
        if *no_render {
            training.render_final = false;
        }
        if seed.is_some() {
            training.seed = *seed;
        }
    }
    settings.validate()?;

    match args.command {
        Commands::Train { .. } => {
            let client = connect(&settings).await?;
            let mut env = match settings.training.seed {
                Some(seed) => CartPole::seeded(seed),
                None => CartPole::new(),
            };

            let summary = driver::train(&mut env, &client, &settings.training).await?;
            match summary.solved_at {
                Some(episode) => info!(
                    episode,
                    final_score = summary.final_score,
                    "Agent '{}' reached the score threshold",
                    client.agent_name()
                ),
                None => info!(
                    episodes = summary.episodes_run(),
                    "Agent '{}' did not reach the score threshold",
                    client.agent_name()
                ),
            }
            Ok(())
        }
        Commands::Check => {
            let client = connect(&settings).await?;
            println!("agent '{}' is reachable at {}", client.agent_name(), settings.api.base_url);
            Ok(())
        }
    }
}

async fn connect(settings: &Settings) -> Result<AgentsBarClient> {
    let credentials = settings.credentials(|username| {
        rpassword::prompt_password(format!("Password for {username}: "))
            .context("could not read password")
    })?;
    AgentsBarClient::connect(&settings.api, &credentials)
        .await
        .with_context(|| format!("could not connect to {}", settings.api.base_url))
}
