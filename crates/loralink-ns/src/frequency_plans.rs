//! Frequency-plan resolution.
//!
//! A device references a frequency plan by identifier; the plan names the
//! band it specializes. Resolving a device's radio parameters combines the
//! plan's band with the device's Regional Parameters version. Plans are
//! static configuration, so the seam is synchronous and callable from
//! inside store transactions.

use std::collections::HashMap;

use thiserror::Error;

/// Errors produced by frequency-plan resolution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrequencyPlanError {
    /// No plan is registered under the identifier.
    #[error("unknown frequency plan `{id}`")]
    Unknown {
        /// The unresolved plan identifier.
        id: String,
    },
}

/// A frequency plan: a named specialization of a band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyPlan {
    /// Plan identifier.
    pub id: String,
    /// Identifier of the band this plan specializes.
    pub band_id: String,
}

/// Resolves frequency-plan identifiers.
pub trait FrequencyPlanStore: Send + Sync {
    /// The plan registered under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`FrequencyPlanError::Unknown`] for unregistered plans.
    fn get_by_id(&self, id: &str) -> Result<FrequencyPlan, FrequencyPlanError>;
}

/// Static in-memory plan table.
#[derive(Debug, Default)]
pub struct StaticFrequencyPlans {
    plans: HashMap<String, FrequencyPlan>,
}

impl StaticFrequencyPlans {
    /// A table with the given `(plan id, band id)` pairs.
    #[must_use]
    pub fn with_plans<I, P, B>(plans: I) -> Self
    where
        I: IntoIterator<Item = (P, B)>,
        P: Into<String>,
        B: Into<String>,
    {
        Self {
            plans: plans
                .into_iter()
                .map(|(id, band_id)| {
                    let id = id.into();
                    (
                        id.clone(),
                        FrequencyPlan {
                            id,
                            band_id: band_id.into(),
                        },
                    )
                })
                .collect(),
        }
    }
}

impl FrequencyPlanStore for StaticFrequencyPlans {
    fn get_by_id(&self, id: &str) -> Result<FrequencyPlan, FrequencyPlanError> {
        self.plans
            .get(id)
            .cloned()
            .ok_or_else(|| FrequencyPlanError::Unknown { id: id.to_string() })
    }
}
