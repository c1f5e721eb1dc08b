//! Command-line interface definitions using clap derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Drive a remote Agents Bar agent through a CartPole simulation
#[derive(Parser)]
#[command(name = "agents-bar-cli")]
#[command(about = "Train a remote Agents Bar agent on CartPole")]
#[command(version)]
pub struct Cli {
    /// Settings file layered over the built-in defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run training episodes until the score threshold is reached
    Train {
        /// Maximum number of training episodes
        #[arg(long)]
        max_episodes: Option<u32>,
        /// Score that ends training
        #[arg(long)]
        score_threshold: Option<f64>,
        /// Skip rendering the final rollout
        #[arg(long)]
        no_render: bool,
        /// Seed for reproducible CartPole episodes
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Log in and verify that the configured agent exists
    Check,
}
