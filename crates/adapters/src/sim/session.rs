// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Simulated browser session and its page model

use super::{Fault, FaultMode, SimBehavior, SimWorld};
use crate::session::{ArtifactRef, BrowserSession, Element, SessionError};
use async_trait::async_trait;
use flock_core::config::{host_on_domain, url_host};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Blank,
    Enroll,
    AwaitingConfirmation,
    ConfirmError,
    Onboarding { question: usize },
    Gallery,
    Artifact,
    Project { step: u8 },
    Published,
}

struct PageState {
    page: Page,
    url: String,
    filled: HashMap<Element, String>,
    selected: HashMap<usize, u8>,
    faults: Vec<Fault>,
    ineligible_shown: bool,
    forks: u32,
    closed: bool,
}

/// One simulated browser context
pub struct SimSession {
    id: String,
    world: SimWorld,
    behavior: SimBehavior,
    proxy: Option<String>,
    state: Mutex<PageState>,
}

impl SimSession {
    pub(super) fn new(
        id: String,
        world: SimWorld,
        behavior: SimBehavior,
        proxy: Option<String>,
    ) -> Self {
        let faults = behavior.faults.clone();
        Self {
            id,
            world,
            behavior,
            proxy,
            state: Mutex::new(PageState {
                page: Page::Blank,
                url: "about:blank".to_string(),
                filled: HashMap::new(),
                selected: HashMap::new(),
                faults,
                ineligible_shown: false,
                forks: 0,
                closed: false,
            }),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.id
    }

    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    /// Mark closed. Returns false if it was already closed.
    pub(super) fn close(&self) -> bool {
        let mut state = self.lock();
        !std::mem::replace(&mut state.closed, true)
    }

    fn lock(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply latency, then lock the page if the session is still open
    async fn open_page(&self) -> Result<MutexGuard<'_, PageState>, SessionError> {
        if !self.behavior.latency.is_zero() {
            tokio::time::sleep(self.behavior.latency).await;
        }
        let state = self.lock();
        if state.closed {
            return Err(SessionError::Closed(self.id.clone()));
        }
        Ok(state)
    }

    fn domain(&self) -> &str {
        &self.world.target().domain
    }

    fn page_url(&self, path: &str) -> String {
        format!("https://{}{}", self.domain(), path)
    }

    fn visible(&self, state: &PageState, element: Element) -> bool {
        match (state.page, element) {
            (
                Page::Enroll,
                Element::EmailInput
                | Element::HandleInput
                | Element::PasswordInput
                | Element::EnrollSubmit,
            ) => true,
            (Page::Enroll, Element::IneligibleNotice) => state.ineligible_shown,
            (Page::ConfirmError, Element::ConfirmErrorBanner) => true,
            (Page::Onboarding { question }, Element::OnboardingOption { question: q, choice }) => {
                let options = self
                    .world
                    .target()
                    .onboarding_choices
                    .get(question)
                    .copied()
                    .unwrap_or(0);
                usize::from(q) == question && choice < options
            }
            (Page::Onboarding { .. }, Element::OnboardingContinue) => true,
            (Page::Artifact, Element::ForkButton) => true,
            (Page::Project { step: 0 }, Element::PublishButton) => true,
            (Page::Project { step: 1 }, Element::PublishConfirm) => true,
            (Page::Project { step: 2 }, Element::PublishFinalConfirm) => true,
            (Page::Published, Element::PublishedBadge) => true,
            _ => false,
        }
    }

    /// Resolve an element for interaction, honoring scripted faults
    fn locate(
        &self,
        state: &mut PageState,
        element: Element,
        timeout: Duration,
    ) -> Result<(), SessionError> {
        if let Some(mode) = take_fault(&mut state.faults, element) {
            return Err(match mode {
                FaultMode::NotFound => SessionError::ElementNotFound(element),
                FaultMode::Timeout => SessionError::Timeout {
                    what: element.to_string(),
                    after: timeout,
                },
            });
        }
        if self.visible(state, element) {
            Ok(())
        } else {
            Err(SessionError::Timeout {
                what: element.to_string(),
                after: timeout,
            })
        }
    }

    fn navigate(&self, state: &mut PageState, url: &str) -> Result<(), SessionError> {
        let host = url_host(url).ok_or_else(|| SessionError::Navigation(url.to_string()))?;
        if !host_on_domain(host, self.domain()) {
            return Err(SessionError::Navigation(format!("could not resolve {}", host)));
        }
        let target = self.world.target();

        if url.contains("/auth/confirm") {
            let token = url.split("token=").nth(1).unwrap_or_default();
            if !self.behavior.confirm_error && self.world.redeem_token(token) {
                state.page = Page::Onboarding { question: 0 };
                state.url = self.page_url("/onboarding");
            } else {
                state.page = Page::ConfirmError;
                state.url = url.to_string();
            }
        } else if url.contains("/invite/") || url.contains(&target.enroll_path) {
            state.page = Page::Enroll;
            state.url = self.page_url(&target.enroll_path);
        } else if url.contains("/onboarding") {
            state.page = Page::Onboarding { question: 0 };
            state.url = url.to_string();
        } else if url.contains("/gallery") {
            state.page = Page::Gallery;
            state.url = url.to_string();
        } else if url == target.fallback_artifact_url
            || self.behavior.artifacts.iter().any(|a| a.url == url)
        {
            state.page = Page::Artifact;
            state.url = url.to_string();
        } else {
            return Err(SessionError::Navigation(format!("404 {}", url)));
        }
        Ok(())
    }

    fn activate(&self, state: &mut PageState, element: Element) {
        match (state.page, element) {
            (Page::Enroll, Element::EnrollSubmit) => {
                let Some(address) = state.filled.get(&Element::EmailInput).cloned() else {
                    return;
                };
                if self.behavior.ineligible {
                    state.ineligible_shown = true;
                    return;
                }
                self.world.enroll(&address, &self.behavior);
                state.page = Page::AwaitingConfirmation;
                state.url = self.page_url("/welcome/verify");
            }
            (Page::Onboarding { question }, Element::OnboardingOption { choice, .. }) => {
                state.selected.insert(question, choice);
            }
            (Page::Onboarding { question }, Element::OnboardingContinue) => {
                if !state.selected.contains_key(&question) {
                    return;
                }
                let questions = self.world.target().onboarding_choices.len();
                if question + 1 < questions {
                    state.page = Page::Onboarding {
                        question: question + 1,
                    };
                } else {
                    state.page = Page::Gallery;
                    state.url = self.page_url("/gallery");
                }
            }
            (Page::Artifact, Element::ForkButton) => {
                state.forks += 1;
                state.page = Page::Project { step: 0 };
                state.url = self.page_url(&format!("/projects/fork-{}-{}", self.id, state.forks));
            }
            (Page::Project { step }, Element::PublishButton)
            | (Page::Project { step }, Element::PublishConfirm) => {
                state.page = Page::Project { step: step + 1 };
            }
            (Page::Project { .. }, Element::PublishFinalConfirm) => {
                state.page = Page::Published;
            }
            _ => {}
        }
    }
}

fn take_fault(faults: &mut [Fault], element: Element) -> Option<FaultMode> {
    let fault = faults
        .iter_mut()
        .find(|f| f.element.same_kind(&element) && f.times != Some(0))?;
    if let Some(times) = fault.times.as_mut() {
        *times -= 1;
    }
    Some(fault.mode)
}

#[async_trait]
impl BrowserSession for SimSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn goto(&self, url: &str, _timeout: Duration) -> Result<(), SessionError> {
        let mut state = self.open_page().await?;
        self.navigate(&mut state, url)
    }

    async fn current_url(&self) -> Result<String, SessionError> {
        let state = self.open_page().await?;
        Ok(state.url.clone())
    }

    async fn wait_visible(&self, element: Element, timeout: Duration) -> Result<(), SessionError> {
        let mut state = self.open_page().await?;
        self.locate(&mut state, element, timeout)
    }

    async fn is_visible(&self, element: Element) -> Result<bool, SessionError> {
        let state = self.open_page().await?;
        Ok(self.visible(&state, element))
    }

    async fn fill(
        &self,
        element: Element,
        value: &str,
        timeout: Duration,
    ) -> Result<(), SessionError> {
        let mut state = self.open_page().await?;
        self.locate(&mut state, element, timeout)?;
        state.filled.insert(element, value.to_string());
        Ok(())
    }

    async fn click(&self, element: Element, timeout: Duration) -> Result<(), SessionError> {
        let mut state = self.open_page().await?;
        self.locate(&mut state, element, timeout)?;
        self.activate(&mut state, element);
        Ok(())
    }

    async fn wait_for_url_change(
        &self,
        fragment: &str,
        timeout: Duration,
    ) -> Result<String, SessionError> {
        let state = self.open_page().await?;
        if state.url.contains(fragment) {
            return Err(SessionError::Timeout {
                what: format!("navigation away from {}", fragment),
                after: timeout,
            });
        }
        Ok(state.url.clone())
    }

    async fn reload(&self, _timeout: Duration) -> Result<(), SessionError> {
        let mut state = self.open_page().await?;
        if let Page::Project { .. } = state.page {
            state.page = Page::Project { step: 0 };
        }
        Ok(())
    }

    async fn list_artifacts(&self, timeout: Duration) -> Result<Vec<ArtifactRef>, SessionError> {
        let state = self.open_page().await?;
        if state.page != Page::Gallery {
            return Err(SessionError::Timeout {
                what: "artifact list".to_string(),
                after: timeout,
            });
        }
        Ok(self.behavior.artifacts.clone())
    }
}
