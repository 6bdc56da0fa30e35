//! Token redemption

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backends::Backends;
use crate::error::SharingError;
use crate::fallback::{Attempt, FallbackChain};
use crate::sharing::validator::TokenValidator;
use crate::sync::SyncCoordinator;
use crate::types::{FunnelStep, FunnelTemplate, TemplateId, UsageAction};

/// Outcome of a redemption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub success: bool,

    /// Id of the new copy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funnel_id: Option<TemplateId>,

    pub message: String,

    /// The copy exists but has fewer steps than its source
    pub needs_repair: bool,

    pub steps_copied: usize,

    /// Steps the copy should have
    pub steps_expected: usize,
}

impl Redemption {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            funnel_id: None,
            message: message.into(),
            needs_repair: false,
            steps_copied: 0,
            steps_expected: 0,
        }
    }

    /// The soft error describing an incomplete copy, if any
    pub fn incomplete(&self) -> Option<SharingError> {
        self.needs_repair.then_some(SharingError::IncompleteCopy {
            copied: self.steps_copied,
            expected: self.steps_expected,
        })
    }
}

/// A new template produced by one of the copy strategies
struct Materialized {
    funnel_id: TemplateId,
    steps_copied: usize,
}

/// Turns a valid token into a new, independently owned template
pub struct TokenRedeemer {
    backends: Backends,
    validator: TokenValidator,
    coordinator: Arc<SyncCoordinator>,
}

impl TokenRedeemer {
    pub fn new(coordinator: Arc<SyncCoordinator>, validator: TokenValidator) -> Self {
        Self {
            backends: coordinator.backends().clone(),
            validator,
            coordinator,
        }
    }

    /// Redeem `token_value` into a copy owned by the current identity
    ///
    /// Strategies, in order: the atomic copy procedure (signed in only),
    /// then a manual rebuild saved through the coordinator. The manual
    /// rebuild pulls steps from the live source when the snapshot has none.
    /// A copy with fewer steps than expected is returned with
    /// `needs_repair` set instead of failing.
    pub async fn redeem(&self, token_value: &str) -> Redemption {
        let token_value = token_value.trim();
        let validation = self.validator.validate_token(token_value).await;
        let Some(resolved) = validation.resolved() else {
            return Redemption::failure(
                validation
                    .message
                    .unwrap_or_else(|| "Share link is invalid or expired".to_string()),
            );
        };

        let owner = self.backends.identity();
        let snapshot = &resolved.snapshot;
        let recovered = if snapshot.steps.is_empty() {
            self.live_source_steps(&resolved.funnel_id).await
        } else {
            None
        };
        let steps_expected = snapshot
            .steps
            .len()
            .max(recovered.as_ref().map_or(0, Vec::len));

        let outcome = FallbackChain::new("redeem")
            .strategy("atomic_copy", async {
                let Some(owner) = owner.as_deref() else {
                    return Attempt::miss("anonymous");
                };
                match self
                    .backends
                    .call(self.backends.procedures.copy_from_token(token_value, owner))
                    .await
                {
                    Ok(copy) => Attempt::Resolved(Materialized {
                        funnel_id: copy.funnel_id,
                        steps_copied: copy.steps_copied,
                    }),
                    Err(e) => Attempt::failed(e.to_string()),
                }
            })
            .strategy("manual_copy", async {
                let mut template =
                    FunnelTemplate::from_snapshot(snapshot, owner.clone(), &resolved.funnel_id);
                if let Some(steps) = &recovered {
                    warn!(
                        source_id = %resolved.funnel_id,
                        steps = steps.len(),
                        "Snapshot has no steps, recovered them from the live source"
                    );
                    template.steps = steps.clone();
                }
                match self.coordinator.persist(template).await {
                    Some(saved) => Attempt::Resolved(Materialized {
                        funnel_id: saved.id,
                        steps_copied: saved.steps.len(),
                    }),
                    None => Attempt::failed("copy could not be saved to any store"),
                }
            })
            .resolve()
            .await;

        let Some(copy) = outcome.value() else {
            return Redemption::failure("Template could not be copied");
        };

        self.validator
            .record_usage(&resolved.token_id, UsageAction::Copy)
            .await;

        let needs_repair = copy.steps_copied < steps_expected;
        let message = if needs_repair {
            warn!(
                funnel_id = %copy.funnel_id,
                copied = copy.steps_copied,
                expected = steps_expected,
                "Redeemed copy is missing steps"
            );
            format!(
                "Template copied, but only {} of {} steps came through; repair it to restore the rest",
                copy.steps_copied, steps_expected
            )
        } else {
            info!(
                funnel_id = %copy.funnel_id,
                source_id = %resolved.funnel_id,
                steps = copy.steps_copied,
                "Redeemed share token"
            );
            "Template copied".to_string()
        };

        Redemption {
            success: true,
            funnel_id: Some(copy.funnel_id),
            message,
            needs_repair,
            steps_copied: copy.steps_copied,
            steps_expected,
        }
    }

    /// Steps of the source template, when it is still reachable and has any
    async fn live_source_steps(&self, source_id: &str) -> Option<Vec<FunnelStep>> {
        match self
            .backends
            .call(self.backends.remote.get_template(source_id, None))
            .await
        {
            Ok(Some(source)) if !source.steps.is_empty() => Some(source.steps),
            Ok(_) => None,
            Err(e) => {
                warn!(source_id, error = %e, "Source template unreachable");
                None
            }
        }
    }
}
