//! Token validation

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backends::Backends;
use crate::error::SharingError;
use crate::fallback::{Attempt, ChainOutcome, FallbackChain};
use crate::types::{ResolvedToken, TemplateSnapshot, TokenUsageRecord, UsageAction};

/// Outcome of validating a token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenValidation {
    pub valid: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<TemplateSnapshot>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub funnel_id: Option<String>,

    /// Why validation failed
    #[serde(skip)]
    pub error: Option<SharingError>,
}

impl TokenValidation {
    fn accepted(resolved: ResolvedToken) -> Self {
        Self {
            valid: true,
            message: None,
            snapshot: Some(resolved.snapshot),
            token_id: Some(resolved.token_id),
            funnel_id: Some(resolved.funnel_id),
            error: None,
        }
    }

    fn rejected(error: SharingError, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
            snapshot: None,
            token_id: None,
            funnel_id: None,
            error: Some(error),
        }
    }

    /// The bound token when valid
    pub fn resolved(&self) -> Option<ResolvedToken> {
        match (&self.token_id, &self.funnel_id, &self.snapshot) {
            (Some(token_id), Some(funnel_id), Some(snapshot)) if self.valid => Some(ResolvedToken {
                token_id: token_id.clone(),
                funnel_id: funnel_id.clone(),
                snapshot: snapshot.clone(),
            }),
            _ => None,
        }
    }
}

/// Resolves tokens to their bound snapshot
///
/// Resolution order: a direct read of the active token row, then the
/// resolve procedure. An explicitly expired row ends resolution there.
#[derive(Clone)]
pub struct TokenValidator {
    backends: Backends,
}

impl TokenValidator {
    pub fn new(backends: Backends) -> Self {
        Self { backends }
    }

    /// Validate `token_value` and record a `view` usage on success
    pub async fn validate_token(&self, token_value: &str) -> TokenValidation {
        let token_value = token_value.trim();
        if token_value.is_empty() {
            return TokenValidation::rejected(
                SharingError::not_found("empty token"),
                "Share link is invalid or expired",
            );
        }

        let now = self.backends.clock.now();
        let outcome = FallbackChain::new("validate_token")
            .strategy("direct", async {
                match self
                    .backends
                    .call(self.backends.remote.find_active_token(token_value))
                    .await
                {
                    Ok(Some(token)) if !token.is_active => Attempt::miss("token inactive"),
                    Ok(Some(token)) if token.is_expired_at(now) => {
                        Attempt::Resolved(Err(SharingError::Expired))
                    }
                    Ok(Some(token)) => Attempt::Resolved(Ok(ResolvedToken::from(&token))),
                    Ok(None) => Attempt::miss("no active token row"),
                    Err(e) => Attempt::failed(e.to_string()),
                }
            })
            .strategy("procedure", async {
                match self
                    .backends
                    .call(self.backends.procedures.resolve_token(token_value))
                    .await
                {
                    Ok(Some(resolved)) => Attempt::Resolved(Ok(resolved)),
                    Ok(None) => Attempt::miss("procedure found no usable token"),
                    Err(e) => Attempt::failed(e.to_string()),
                }
            })
            .resolve()
            .await;

        let resolved = match outcome {
            ChainOutcome::Resolved {
                value: Ok(resolved),
                strategy,
            } => {
                debug!(token_id = %resolved.token_id, strategy, "Token resolved");
                resolved
            }
            ChainOutcome::Resolved {
                value: Err(error), ..
            } => {
                return TokenValidation::rejected(error, "Share link has expired");
            }
            exhausted if exhausted.all_failed() => {
                let reasons = exhausted.reasons();
                return TokenValidation::rejected(
                    SharingError::TransientBackendFailure(reasons),
                    "Share link could not be checked right now, try again later",
                );
            }
            _ => {
                return TokenValidation::rejected(
                    SharingError::not_found("share token"),
                    "Share link is invalid or expired",
                );
            }
        };

        self.record_usage(&resolved.token_id, UsageAction::View).await;
        TokenValidation::accepted(resolved)
    }

    /// Append a usage record; failures are logged and swallowed
    pub(crate) async fn record_usage(&self, token_id: &str, action: UsageAction) {
        let record = TokenUsageRecord {
            token_id: token_id.to_string(),
            used_by: self.backends.identity(),
            used_at: self.backends.clock.now(),
            action,
        };
        if let Err(e) = self
            .backends
            .call(self.backends.remote.append_usage(&record))
            .await
        {
            warn!(token_id, ?action, error = %e, "Failed to record token usage");
        }
    }
}
