//! HTTP client for the Unit platform backend.
//!
//! The backend exposes identity, health, posts, groups, interactions,
//! votes, and merge proposals as JSON-over-HTTP resources. This crate is
//! the concrete [`Platform`] implementation; the reasoning loop only ever
//! sees the trait.

mod client;

pub use client::PlatformClient;
