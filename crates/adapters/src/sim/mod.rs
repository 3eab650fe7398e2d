// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process simulation of the signup surface
//!
//! [`SimWorld`] implements every collaborator contract against a small page
//! model. Each acquired session gets a [`SimBehavior`] from the world's plan,
//! keyed by the 1-based acquisition index, so tests can script faults per
//! session.

mod session;

pub use session::SimSession;

use crate::identity::{Identity, IdentityError, IdentityService};
use crate::inbox::{InboxError, InboxWatcher, Message};
use crate::session::{ArtifactRef, Element, SessionError, SessionProvider};
use async_trait::async_trait;
use flock_core::config::TargetConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How a faulted element misbehaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultMode {
    NotFound,
    Timeout,
}

/// A scripted element failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub element: Element,
    pub mode: FaultMode,
    /// Number of interactions that fail; `None` fails forever
    pub times: Option<u32>,
}

impl Fault {
    pub fn always(element: Element, mode: FaultMode) -> Self {
        Self {
            element,
            mode,
            times: None,
        }
    }

    pub fn times(element: Element, mode: FaultMode, times: u32) -> Self {
        Self {
            element,
            mode,
            times: Some(times),
        }
    }
}

/// Scripted behavior of one simulated session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimBehavior {
    pub faults: Vec<Fault>,
    /// The enrollment is rejected with an ineligibility notice
    pub ineligible: bool,
    /// The confirmation message is never delivered
    pub inbox_drop: bool,
    /// The confirmation link points off the target domain
    pub malformed_link: bool,
    /// The confirmation page shows an error banner
    pub confirm_error: bool,
    /// Artifacts listed after onboarding
    pub artifacts: Vec<ArtifactRef>,
    /// Delay applied to every session action
    pub latency: Duration,
    /// Session acquisition fails
    pub acquire_fails: bool,
}

impl SimBehavior {
    /// A session where everything works
    pub fn healthy(domain: &str) -> Self {
        let artifacts = ["landing", "portfolio", "blog"]
            .iter()
            .map(|name| ArtifactRef {
                id: name.to_string(),
                title: format!("{} template", name),
                url: format!("https://{}/projects/{}", domain, name),
            })
            .collect();
        Self {
            faults: Vec::new(),
            ineligible: false,
            inbox_drop: false,
            malformed_link: false,
            confirm_error: false,
            artifacts,
            latency: Duration::ZERO,
            acquire_fails: false,
        }
    }

    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.faults.push(fault);
        self
    }

    /// With probability `failure_rate`, inject one randomly chosen fault
    pub fn random<R: Rng>(rng: &mut R, domain: &str, failure_rate: f64) -> Self {
        let mut behavior = Self::healthy(domain);
        if !rng.gen_bool(failure_rate.clamp(0.0, 1.0)) {
            return behavior;
        }
        match rng.gen_range(0..8) {
            0 => behavior.ineligible = true,
            1 => behavior.inbox_drop = true,
            2 => behavior.malformed_link = true,
            3 => behavior.confirm_error = true,
            4 => behavior.artifacts.clear(),
            5 => {
                behavior = behavior.with_fault(Fault::always(
                    Element::OnboardingContinue,
                    FaultMode::NotFound,
                ))
            }
            6 => {
                behavior = behavior.with_fault(Fault::times(
                    Element::PublishButton,
                    FaultMode::Timeout,
                    rng.gen_range(1..=6),
                ))
            }
            _ => {
                behavior =
                    behavior.with_fault(Fault::always(Element::EmailInput, FaultMode::Timeout))
            }
        }
        behavior
    }
}

/// Counters describing session usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimStats {
    pub acquired: u64,
    pub released: u64,
    pub live: u64,
    pub peak_live: u64,
    pub accounts: u64,
}

type Plan = dyn Fn(u64) -> SimBehavior + Send + Sync;

struct WorldState {
    stats: SimStats,
    next_identity: u64,
    mailboxes: HashMap<String, Vec<Message>>,
    /// Confirmation tokens issued and not yet used
    tokens: HashMap<String, String>,
}

/// Shared simulated world
#[derive(Clone)]
pub struct SimWorld {
    target: Arc<TargetConfig>,
    plan: Arc<Plan>,
    state: Arc<Mutex<WorldState>>,
}

impl SimWorld {
    /// A world where every session is healthy
    pub fn new(target: TargetConfig) -> Self {
        let domain = target.domain.clone();
        Self::with_plan(target, move |_| SimBehavior::healthy(&domain))
    }

    /// A world whose n-th acquired session behaves as `plan(n)`
    pub fn with_plan(
        target: TargetConfig,
        plan: impl Fn(u64) -> SimBehavior + Send + Sync + 'static,
    ) -> Self {
        Self {
            target: Arc::new(target),
            plan: Arc::new(plan),
            state: Arc::new(Mutex::new(WorldState {
                stats: SimStats::default(),
                next_identity: 0,
                mailboxes: HashMap::new(),
                tokens: HashMap::new(),
            })),
        }
    }

    /// A world injecting random faults at `failure_rate`, reproducible by seed
    pub fn random(target: TargetConfig, seed: u64, failure_rate: f64, latency: Duration) -> Self {
        let rng = Mutex::new(StdRng::seed_from_u64(seed));
        let domain = target.domain.clone();
        Self::with_plan(target, move |_| {
            let mut rng = rng.lock().unwrap_or_else(|e| e.into_inner());
            let mut behavior = SimBehavior::random(&mut *rng, &domain, failure_rate);
            behavior.latency = latency;
            behavior
        })
    }

    pub fn target(&self) -> &TargetConfig {
        &self.target
    }

    pub fn stats(&self) -> SimStats {
        self.lock().stats
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, WorldState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register an account for `address` and, unless dropped, mail its
    /// confirmation link
    pub(crate) fn enroll(&self, address: &str, behavior: &SimBehavior) {
        let token = format!("{:016x}", rand::thread_rng().gen::<u64>());
        let host = if behavior.malformed_link {
            "mailer.invalid"
        } else {
            self.target.domain.as_str()
        };
        let link = format!("https://{}/auth/confirm?token={}", host, token);

        let mut state = self.lock();
        state.stats.accounts += 1;
        if behavior.inbox_drop {
            return;
        }
        let id = format!("msg-{}", state.stats.accounts);
        state.tokens.insert(token, address.to_string());
        state
            .mailboxes
            .entry(address.to_string())
            .or_default()
            .push(Message {
                id,
                to: address.to_string(),
                subject: "Confirm your email".to_string(),
                body: format!(
                    "Welcome! Confirm your address at {link}.\n\
                     <a href='{link}'>Confirm email</a>"
                ),
            });
    }

    /// Consume a confirmation token
    pub(crate) fn redeem_token(&self, token: &str) -> bool {
        self.lock().tokens.remove(token).is_some()
    }
}

#[async_trait]
impl SessionProvider for SimWorld {
    type Session = SimSession;

    async fn acquire(&self, proxy: Option<&str>) -> Result<SimSession, SessionError> {
        let index = {
            let mut state = self.lock();
            state.stats.acquired += 1;
            state.stats.acquired
        };
        let behavior = (self.plan)(index);
        if behavior.acquire_fails {
            return Err(SessionError::Acquire(format!(
                "browser context {} refused to start",
                index
            )));
        }
        {
            let mut state = self.lock();
            state.stats.live += 1;
            state.stats.peak_live = state.stats.peak_live.max(state.stats.live);
        }
        Ok(SimSession::new(
            format!("sim-{}", index),
            self.clone(),
            behavior,
            proxy.map(str::to_string),
        ))
    }

    async fn release(&self, session: SimSession) -> Result<(), SessionError> {
        if !session.close() {
            return Err(SessionError::Closed(session.session_id().to_string()));
        }
        let mut state = self.lock();
        state.stats.released += 1;
        state.stats.live = state.stats.live.saturating_sub(1);
        Ok(())
    }
}

#[async_trait]
impl IdentityService for SimWorld {
    async fn mint(&self, domain: Option<&str>) -> Result<Identity, IdentityError> {
        let n = {
            let mut state = self.lock();
            state.next_identity += 1;
            state.next_identity
        };
        let domain = domain.unwrap_or("mail.test");
        let secret: String = {
            let mut rng = rand::thread_rng();
            (0..16)
                .map(|_| rng.sample(rand::distributions::Alphanumeric) as char)
                .collect()
        };
        Ok(Identity {
            address: format!("user{:05}@{}", n, domain),
            handle: format!("user{:05}", n),
            secret,
        })
    }
}

#[async_trait]
impl InboxWatcher for SimWorld {
    async fn await_confirmation(
        &self,
        identity: &Identity,
        max_attempts: u32,
        interval: Duration,
    ) -> Result<Message, InboxError> {
        for poll in 1..=max_attempts {
            let found = self
                .lock()
                .mailboxes
                .get(&identity.address)
                .and_then(|messages| messages.first().cloned());
            if let Some(message) = found {
                return Ok(message);
            }
            if poll < max_attempts {
                tokio::time::sleep(interval).await;
            }
        }
        Err(InboxError::Timeout {
            address: identity.address.clone(),
            attempts: max_attempts,
        })
    }
}
