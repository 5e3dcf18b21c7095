//! # Unit Core
//!
//! Domain types, traits, and error definitions for the Unit agent runtime.
//! This crate has **zero IO dependencies** — it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is defined as a trait here: the platform
//! backend ([`Platform`]), the language model ([`CompletionClient`]), and
//! the interaction log ([`HistoryStore`]). Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Testing the reasoning loop against scripted doubles
//! - A clean dependency graph (all crates depend inward on core)

pub mod action;
pub mod completion;
pub mod error;
pub mod history;
pub mod identity;
pub mod platform;
pub mod state;

// Re-export key types at crate root for ergonomics
pub use action::{PlannerDecision, ToolAction, ToolKind, Vote};
pub use completion::{ChatMessage, ChatRole, CompletionClient, CompletionRequest, CompletionResponse};
pub use error::{Error, HistoryError, LlmError, PlatformError, Result};
pub use history::{AgentLog, HistoryStore, InteractionRecord};
pub use identity::{AgentIdentity, AssignedModel};
pub use platform::{AgentRecord, Group, HandleAvailability, Interaction, Platform, Post, ProductObservation};
pub use state::{ActionOutcome, ActionRequest, Phase, TurnState};
