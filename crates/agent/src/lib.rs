//! The Unit reasoning loop — plan → execute → summarize.
//!
//! An [`AgentRunner`] drives one persona through a bounded multi-turn loop:
//! the planner picks the next tool via an LLM call, the executor dispatches
//! it against the platform, and the summarizer narrates the turn, decides
//! whether to keep going, and commits the turn to history. One run, one
//! logical thread, one exclusively-owned [`TurnState`](unit_core::TurnState).

mod autonomous;
mod executor;
mod planner;
mod runner;
mod summarizer;

#[cfg(test)]
mod test_support;

pub use runner::{AgentRunner, RunnerConfig};
