//! # Handshake Testing Utils
//!
//! Shared testing utilities for the handshake workspace.
//!
//! - **Mock Notifiers / Sinks**: scripted [`ParticipantNotifier`] and recording
//!   [`CallbackSink`] implementations for coordinator tests without a network
//! - **Test Data Builders**: [`DispatchPayloadBuilder`] with sensible defaults
//! - **HTTP Stubs**: real axum servers standing in for participants and the
//!   orchestrator in end-to-end tests
//!
//! ```toml
//! [dev-dependencies]
//! handshake-testing-utils = { path = "../testing-utils" }
//! ```
//!
//! [`ParticipantNotifier`]: handshake_dispatcher::ParticipantNotifier
//! [`CallbackSink`]: handshake_dispatcher::CallbackSink

pub mod builders;
pub mod helpers;
pub mod mocks;

// Re-export commonly used items
pub use builders::*;
pub use helpers::*;
pub use mocks::*;
