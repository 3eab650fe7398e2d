// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Publish/subscribe fan-out of orchestrator events
//!
//! - `EventBus` - route events to matching subscribers over channels
//! - `EventPattern` - pattern matching on event names (`run:*`, `attempt:**`)

mod bus;
mod subscription;

pub use bus::{EventBus, EventReceiver, EventSender};
pub use subscription::{EventPattern, SubscriberId, Subscription};
