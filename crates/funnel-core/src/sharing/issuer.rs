//! Token issuance and owner-side token management

use std::sync::Arc;

use chrono::Duration;
use funnel_config::SharingConfig;
use tracing::{info, warn};
use uuid::Uuid;

use crate::backends::Backends;
use crate::error::{RemoteError, SharingError, SharingResult};
use crate::sharing::generator::TokenGenerator;
use crate::sync::SyncCoordinator;
use crate::types::{OwnerId, ShareToken, TemplateSnapshot};

/// Mints share tokens bound to an immutable snapshot
pub struct TokenIssuer {
    backends: Backends,
    coordinator: Arc<SyncCoordinator>,
    generator: Arc<dyn TokenGenerator>,
    config: SharingConfig,
}

impl TokenIssuer {
    pub fn new(
        coordinator: Arc<SyncCoordinator>,
        generator: Arc<dyn TokenGenerator>,
        config: SharingConfig,
    ) -> Self {
        Self {
            backends: coordinator.backends().clone(),
            coordinator,
            generator,
            config,
        }
    }

    /// Issue a token for `funnel_id`, valid for `days_valid` days or forever
    ///
    /// The snapshot holds every display field and the full step list as of
    /// now. A failed token write is fatal: a token with no stored record can
    /// never validate.
    pub async fn issue_token(
        &self,
        funnel_id: &str,
        days_valid: Option<i64>,
    ) -> SharingResult<String> {
        let funnel_id = funnel_id.trim();
        if funnel_id.is_empty() {
            return Err(SharingError::invalid_argument("funnel id must not be empty"));
        }
        if let Some(days) = days_valid {
            if days <= 0 || days > i64::from(self.config.max_days_valid) {
                return Err(SharingError::invalid_argument(format!(
                    "days valid must be between 1 and {}, got {}",
                    self.config.max_days_valid, days
                )));
            }
        }

        let owner = self.require_identity("issuing a share token")?;
        let template = self
            .coordinator
            .get_template(funnel_id)
            .await
            .ok_or_else(|| SharingError::not_found(format!("template {}", funnel_id)))?;

        let snapshot = TemplateSnapshot::from(&template);
        let now = self.backends.clock.now();
        let expires_at = days_valid.map(|days| now + Duration::days(days));

        for attempt in 1..=self.config.issue_attempts {
            let token = ShareToken {
                id: Uuid::new_v4().to_string(),
                token_value: self.generator.generate(self.config.token_length),
                funnel_id: funnel_id.to_string(),
                created_by: owner.clone(),
                created_at: now,
                expires_at,
                is_active: true,
                snapshot: snapshot.clone(),
            };

            match self
                .backends
                .call(self.backends.remote.insert_share_token(&token))
                .await
            {
                Ok(()) => {
                    info!(
                        funnel_id,
                        token_id = %token.id,
                        steps = token.snapshot.steps.len(),
                        expires_at = ?token.expires_at,
                        "Issued share token"
                    );
                    return Ok(token.token_value);
                }
                Err(RemoteError::Conflict(reason)) => {
                    warn!(funnel_id, attempt, %reason, "Token value collision, regenerating");
                }
                Err(e) => return Err(SharingError::from(e)),
            }
        }

        Err(SharingError::TransientBackendFailure(format!(
            "no unique token value after {} attempts",
            self.config.issue_attempts
        )))
    }

    /// Permanently disable a token the current identity issued
    ///
    /// Deactivating an already inactive token succeeds without writing.
    pub async fn deactivate_token(&self, token_value: &str) -> SharingResult<()> {
        let owner = self.require_identity("deactivating a share token")?;
        let token = self
            .backends
            .call(self.backends.remote.find_token(token_value.trim()))
            .await?
            .ok_or_else(|| SharingError::not_found("share token"))?;

        if token.created_by != owner {
            return Err(SharingError::invalid_argument(
                "only the issuer can deactivate a token",
            ));
        }
        if !token.is_active {
            return Ok(());
        }

        self.backends
            .call(self.backends.remote.deactivate_token(&token.id))
            .await?;
        info!(token_id = %token.id, funnel_id = %token.funnel_id, "Deactivated share token");
        Ok(())
    }

    /// Tokens the current identity issued for `funnel_id`
    pub async fn list_issued_tokens(&self, funnel_id: &str) -> SharingResult<Vec<ShareToken>> {
        let owner = self.require_identity("listing share tokens")?;
        Ok(self
            .backends
            .call(self.backends.remote.list_tokens(funnel_id, &owner))
            .await?)
    }

    fn require_identity(&self, action: &str) -> SharingResult<OwnerId> {
        self.backends
            .identity()
            .ok_or_else(|| SharingError::Unauthenticated(format!("{} requires sign-in", action)))
    }
}
