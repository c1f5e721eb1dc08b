//! Agents Bar - remote reinforcement-learning agent client
//!
//! Authenticates against the Agents Bar API, asks a remote agent for actions
//! and reports transitions back to it, and drives simulation episodes through
//! that agent.

pub mod agent;
pub mod cli;
pub mod client;
pub mod driver;
pub mod env;
pub mod error;
pub mod settings;
pub mod telemetry;

pub use agent::{RemoteAgent, Transition};
pub use client::{AgentsBarClient, Credentials};
pub use error::{AgentError, DriverError, EnvError};
