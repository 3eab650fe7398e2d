// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event subscriptions
//!
//! Event names are `kind:action` (`run:updated`, `attempt:completed`).
//! A pattern is parsed once into segments: `*` matches one segment and
//! `**` matches everything after it, so `*:completed` and `attempt:**` both
//! work. A lone `*` matches every event. A subscription can also be
//! narrowed to a single run.

use crate::event::Event;
use crate::id::RunId;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    One,
    Rest,
}

/// A parsed event name pattern
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl EventPattern {
    pub fn new(pattern: &str) -> Self {
        let segments = if pattern.is_empty() {
            Vec::new()
        } else if pattern == "*" {
            vec![Segment::Rest]
        } else {
            pattern
                .split(':')
                .map(|segment| match segment {
                    "*" => Segment::One,
                    "**" => Segment::Rest,
                    literal => Segment::Literal(literal.to_string()),
                })
                .collect()
        };
        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    /// An empty pattern matches nothing
    pub fn matches(&self, event_name: &str) -> bool {
        if self.segments.is_empty() {
            return false;
        }
        let mut parts = event_name.split(':');
        for segment in &self.segments {
            match (segment, parts.next()) {
                (Segment::Rest, _) => return true,
                (Segment::One, Some(_)) => {}
                (Segment::Literal(expected), Some(part)) if expected == part => {}
                _ => return false,
            }
        }
        parts.next().is_none()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for EventPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub String);

#[derive(Clone, Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    pub patterns: Vec<EventPattern>,
    /// Only deliver events of this run
    pub run: Option<RunId>,
}

impl Subscription {
    pub fn new(id: impl Into<String>, patterns: &[&str]) -> Self {
        Self {
            id: SubscriberId(id.into()),
            patterns: patterns.iter().map(|p| EventPattern::new(p)).collect(),
            run: None,
        }
    }

    pub fn all(id: impl Into<String>) -> Self {
        Self::new(id, &["**"])
    }

    pub fn for_run(mut self, run: RunId) -> Self {
        self.run = Some(run);
        self
    }

    /// Whether any pattern matches the event name
    pub fn matches(&self, event_name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(event_name))
    }

    /// Name match plus the run filter
    pub fn accepts(&self, event: &Event) -> bool {
        if let Some(run) = &self.run {
            if run != event.run_id() {
                return false;
            }
        }
        self.matches(event.name())
    }
}

#[cfg(test)]
#[path = "subscription_tests.rs"]
mod tests;
