//! Composition root
//!
//! [`FunnelCore`] wires every component over one set of [`Backends`] and
//! exposes the operations the UI layer calls.

use std::sync::Arc;

use funnel_config::FunnelConfig;
use tokio::task::JoinHandle;

use crate::backends::Backends;
use crate::error::SharingResult;
use crate::sharing::{
    ConsistencyAuditor, RandomTokenGenerator, Redemption, RepairReport, TokenGenerator,
    TokenIssuer, TokenRedeemer, TokenValidation, TokenValidator,
};
use crate::sync::{MigrationReport, SyncCoordinator};
use crate::types::{ConsistencyIssue, FunnelTemplate, ShareToken, TokenUsageRecord};

/// All components of the persistence-and-sharing core
pub struct FunnelCore {
    coordinator: Arc<SyncCoordinator>,
    issuer: TokenIssuer,
    validator: TokenValidator,
    redeemer: TokenRedeemer,
    auditor: ConsistencyAuditor,
}

impl FunnelCore {
    /// Build with random token values
    pub fn new(config: &FunnelConfig, backends: Backends) -> Self {
        Self::with_generator(config, backends, Arc::new(RandomTokenGenerator))
    }

    pub fn with_generator(
        config: &FunnelConfig,
        backends: Backends,
        generator: Arc<dyn TokenGenerator>,
    ) -> Self {
        let backends = backends.with_remote_timeout(config.sync.remote_timeout());
        let coordinator = Arc::new(SyncCoordinator::new(backends.clone()));
        let validator = TokenValidator::new(backends);

        Self {
            issuer: TokenIssuer::new(Arc::clone(&coordinator), generator, config.sharing.clone()),
            redeemer: TokenRedeemer::new(Arc::clone(&coordinator), validator.clone()),
            auditor: ConsistencyAuditor::new(Arc::clone(&coordinator)),
            validator,
            coordinator,
        }
    }

    pub fn coordinator(&self) -> &Arc<SyncCoordinator> {
        &self.coordinator
    }

    /// Run migrations on sign-in for as long as the auth signal lives
    pub fn spawn_auth_listener(&self) -> JoinHandle<()> {
        self.coordinator.spawn_auth_listener()
    }

    pub async fn list_templates(&self) -> Vec<FunnelTemplate> {
        self.coordinator.list_templates().await
    }

    pub async fn get_template(&self, id: &str) -> Option<FunnelTemplate> {
        self.coordinator.get_template(id).await
    }

    pub async fn save_template(&self, template: FunnelTemplate) -> FunnelTemplate {
        self.coordinator.save_template(template).await
    }

    pub async fn delete_template(&self, id: &str) -> bool {
        self.coordinator.delete_template(id).await
    }

    pub async fn migrate_on_sign_in(&self) -> MigrationReport {
        self.coordinator.migrate_on_sign_in().await
    }

    pub async fn issue_token(
        &self,
        funnel_id: &str,
        days_valid: Option<i64>,
    ) -> SharingResult<String> {
        self.issuer.issue_token(funnel_id, days_valid).await
    }

    pub async fn deactivate_token(&self, token_value: &str) -> SharingResult<()> {
        self.issuer.deactivate_token(token_value).await
    }

    pub async fn list_issued_tokens(&self, funnel_id: &str) -> SharingResult<Vec<ShareToken>> {
        self.issuer.list_issued_tokens(funnel_id).await
    }

    pub async fn validate_token(&self, token_value: &str) -> TokenValidation {
        self.validator.validate_token(token_value).await
    }

    pub async fn redeem(&self, token_value: &str) -> Redemption {
        self.redeemer.redeem(token_value).await
    }

    pub async fn repair_empty_copy(
        &self,
        funnel_id: &str,
        token_value: Option<&str>,
    ) -> RepairReport {
        self.auditor.repair_empty_copy(funnel_id, token_value).await
    }

    pub async fn check_all_consistency(&self) -> Vec<ConsistencyIssue> {
        self.auditor.check_all_consistency().await
    }

    pub async fn token_usage(&self, token_id: &str) -> Vec<TokenUsageRecord> {
        self.auditor.token_usage(token_id).await
    }
}
