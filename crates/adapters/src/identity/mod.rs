// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identity minting

use async_trait::async_trait;
use flock_core::IdentityRecord;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("identity service unavailable: {0}")]
    Unavailable(String),
    #[error("unsupported mailbox domain: {0}")]
    UnsupportedDomain(String),
}

/// A freshly minted identity
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub address: String,
    pub handle: String,
    pub secret: String,
}

impl Identity {
    /// The identity without its secret, for results and persistence
    pub fn record(&self) -> IdentityRecord {
        IdentityRecord {
            address: self.address.clone(),
            handle: self.handle.clone(),
        }
    }
}

// Keep the secret out of logs
impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address)
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

/// Mints identities, unique per process
#[async_trait]
pub trait IdentityService: Clone + Send + Sync + 'static {
    async fn mint(&self, domain: Option<&str>) -> Result<Identity, IdentityError>;
}
