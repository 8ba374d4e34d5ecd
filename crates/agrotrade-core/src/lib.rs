//! Negotiation orchestration for the Agrotrade simulation.
//!
//! This crate drives the sequential negotiations between the central party
//! and each counterparty. It owns the turn loop, the pure termination
//! decision, the transcript, and the scenario configuration.
//!
//! # Modules
//!
//! - [`command`] -- Parser for the free-text transaction command.
//! - [`config`] -- Scenario loading from YAML into strongly-typed structs.
//! - [`decision`] -- The pure [`decide`] function and the turn policies.
//! - [`negotiator`] -- [`Negotiator`] trait and [`ScriptedNegotiator`].
//! - [`prompt`] -- [`RolePrompts`] seam and the built-in prompts.
//! - [`report`] -- End-of-run text report.
//! - [`scheduler`] -- The negotiation state machine.
//! - [`transcript`] -- Transcript entries and sinks.
//!
//! [`decide`]: decision::decide
//! [`Negotiator`]: negotiator::Negotiator
//! [`ScriptedNegotiator`]: negotiator::ScriptedNegotiator
//! [`RolePrompts`]: prompt::RolePrompts

pub mod command;
pub mod config;
pub mod decision;
pub mod negotiator;
pub mod prompt;
pub mod report;
pub mod scheduler;
pub mod transcript;

pub use config::{ConfigError, NegotiationConfig, PartyConfig, SimulationConfig};
pub use decision::{AGREEMENT_PHRASE, Decision, DecisionStep, TurnPolicy, WITHDRAWAL_PHRASE, decide};
pub use negotiator::{Negotiator, NegotiatorError, Reply, ScriptedNegotiator, TurnContext};
pub use prompt::{BuiltinPrompts, PromptContext, RolePrompts};
pub use report::Report;
pub use scheduler::{NegotiationOutcome, RunSummary, SchedulerState, run_negotiations};
pub use transcript::{NoOpSink, Speaker, Transcript, TranscriptEntry, TranscriptSink};
