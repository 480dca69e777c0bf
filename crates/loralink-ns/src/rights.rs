//! Per-application authorization gates.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use crate::context::Context;

/// A right a caller may hold on an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Right {
    /// Read device state.
    DevicesRead,
    /// Read plaintext session keys.
    DevicesReadKeys,
    /// Write device state.
    DevicesWrite,
    /// Write session keys.
    DevicesWriteKeys,
    /// Use the application link, including its downlink queue.
    ApplicationLink,
}

impl Right {
    /// The wire-stable right name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DevicesRead => "RIGHT_APPLICATION_DEVICES_READ",
            Self::DevicesReadKeys => "RIGHT_APPLICATION_DEVICES_READ_KEYS",
            Self::DevicesWrite => "RIGHT_APPLICATION_DEVICES_WRITE",
            Self::DevicesWriteKeys => "RIGHT_APPLICATION_DEVICES_WRITE_KEYS",
            Self::ApplicationLink => "RIGHT_APPLICATION_LINK",
        }
    }
}

impl fmt::Display for Right {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by rights gates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RightsError {
    /// The caller does not hold the required right.
    #[error("caller `{caller}` lacks {right} on application `{application_id}`")]
    PermissionDenied {
        /// The caller identity.
        caller: String,
        /// The application the right was required on.
        application_id: String,
        /// The missing right.
        right: Right,
    },
}

/// Resolves whether a caller holds a right on an application.
#[async_trait]
pub trait RightsFetcher: Send + Sync {
    /// Requires `right` for the context's caller on `application_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RightsError::PermissionDenied`] when the right is not
    /// held.
    async fn require(
        &self,
        ctx: &Context,
        application_id: &str,
        right: Right,
    ) -> Result<(), RightsError>;
}

/// In-memory grant table.
#[derive(Debug, Default)]
pub struct MemRights {
    grants: RwLock<HashMap<(String, String), HashSet<Right>>>,
}

impl MemRights {
    /// An empty grant table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants `rights` to `caller` on `application_id`.
    pub fn grant(&self, caller: &str, application_id: &str, rights: &[Right]) {
        let mut grants = self.grants.write().expect("grant table lock");
        grants
            .entry((caller.to_string(), application_id.to_string()))
            .or_default()
            .extend(rights.iter().copied());
    }
}

#[async_trait]
impl RightsFetcher for MemRights {
    async fn require(
        &self,
        ctx: &Context,
        application_id: &str,
        right: Right,
    ) -> Result<(), RightsError> {
        let grants = self.grants.read().expect("grant table lock");
        let held = grants
            .get(&(ctx.caller.clone(), application_id.to_string()))
            .is_some_and(|rights| rights.contains(&right));
        if held {
            Ok(())
        } else {
            Err(RightsError::PermissionDenied {
                caller: ctx.caller.clone(),
                application_id: application_id.to_string(),
                right,
            })
        }
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_granted_right_passes() {
        let rights = MemRights::new();
        rights.grant("user", "app", &[Right::DevicesRead]);
        let ctx = Context::new("user");
        assert!(rights.require(&ctx, "app", Right::DevicesRead).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_right_is_denied() {
        let rights = MemRights::new();
        rights.grant("user", "app", &[Right::DevicesRead]);
        let ctx = Context::new("user");
        let err = rights
            .require(&ctx, "app", Right::DevicesWrite)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RightsError::PermissionDenied {
                caller: "user".to_string(),
                application_id: "app".to_string(),
                right: Right::DevicesWrite,
            }
        );
    }

    #[tokio::test]
    async fn test_rights_are_scoped_per_application() {
        let rights = MemRights::new();
        rights.grant("user", "app-a", &[Right::DevicesRead]);
        let ctx = Context::new("user");
        assert!(rights
            .require(&ctx, "app-b", Right::DevicesRead)
            .await
            .is_err());
    }
}
