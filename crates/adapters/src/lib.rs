// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Collaborator contracts for the flock session runner
//!
//! Browser sessions, identity minting, inbox polling and persistence, plus
//! an in-process simulated world implementing all of them.

pub mod identity;
pub mod inbox;
pub mod session;
pub mod sim;
pub mod sink;
pub mod traced;

pub use identity::{Identity, IdentityError, IdentityService};
pub use inbox::{InboxError, InboxWatcher, Message};
pub use session::{ArtifactRef, BrowserSession, Element, SessionError, SessionProvider};
pub use sim::{Fault, FaultMode, SimBehavior, SimSession, SimStats, SimWorld};
pub use sink::{AccountRecord, JsonlSink, NoOpSink, PersistenceSink, SinkError};
pub use traced::{TracedIdentityService, TracedInboxWatcher, TracedSession, TracedSessionProvider};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use sink::MemorySink;
