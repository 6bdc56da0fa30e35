//! Empty-copy repair and consistency auditing

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backends::Backends;
use crate::fallback::{Attempt, FallbackChain};
use crate::sync::SyncCoordinator;
use crate::types::{ConsistencyIssue, FunnelStep, FunnelTemplate, TokenUsageRecord};

/// Outcome of a repair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps_count: Option<usize>,

    pub message: String,
}

impl RepairReport {
    fn repaired(steps_count: usize, message: impl Into<String>) -> Self {
        Self {
            success: true,
            steps_count: Some(steps_count),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            steps_count: None,
            message: message.into(),
        }
    }
}

/// Repairs redeemed copies that lost their steps and reports others
pub struct ConsistencyAuditor {
    backends: Backends,
    coordinator: Arc<SyncCoordinator>,
}

impl ConsistencyAuditor {
    pub fn new(coordinator: Arc<SyncCoordinator>) -> Self {
        Self {
            backends: coordinator.backends().clone(),
            coordinator,
        }
    }

    /// Restore the steps of an empty copy
    ///
    /// A template that already has steps is left alone. Otherwise the repair
    /// procedure runs first; without it, steps come from the token's
    /// snapshot, then from the live source template.
    pub async fn repair_empty_copy(
        &self,
        funnel_id: &str,
        token_value: Option<&str>,
    ) -> RepairReport {
        let Some(target) = self.coordinator.get_template(funnel_id).await else {
            return RepairReport::failure(format!("Template {} not found", funnel_id));
        };
        if !target.steps.is_empty() {
            return RepairReport::repaired(target.steps.len(), "Template already has its steps");
        }
        let token_value = token_value.map(str::trim).filter(|v| !v.is_empty());

        let outcome = FallbackChain::new("repair_empty_copy")
            .strategy("repair_procedure", async {
                match self
                    .backends
                    .call(self.backends.procedures.repair_empty_copy(funnel_id, token_value))
                    .await
                {
                    Ok(repair) if repair.steps_count > 0 => {
                        // Keep a cached copy in step with the repaired row
                        if let Ok(Some(mut cached)) = self.backends.cache.find(funnel_id) {
                            if let Some(fresh) = self.coordinator.get_template(funnel_id).await {
                                cached.steps = fresh.steps;
                                if let Err(e) = self.backends.cache.upsert(&cached) {
                                    warn!(funnel_id, error = %e, "Cached copy not refreshed");
                                }
                            }
                        }
                        Attempt::Resolved(repair.steps_count)
                    }
                    Ok(_) => Attempt::miss("procedure recovered nothing"),
                    Err(e) => Attempt::failed(e.to_string()),
                }
            })
            .strategy("token_snapshot", async {
                let Some(token_value) = token_value else {
                    return Attempt::miss("no token given");
                };
                match self
                    .backends
                    .call(self.backends.remote.find_token(token_value))
                    .await
                {
                    Ok(Some(token)) if !token.snapshot.steps.is_empty() => {
                        match self.restore(&target, token.snapshot.steps).await {
                            Some(steps) => Attempt::Resolved(steps),
                            None => Attempt::failed("repaired copy could not be saved"),
                        }
                    }
                    Ok(_) => Attempt::miss("token snapshot has no steps"),
                    Err(e) => Attempt::failed(e.to_string()),
                }
            })
            .strategy("source_template", async {
                let Some(source_id) = self.source_of(&target, token_value).await else {
                    return Attempt::miss("source unknown");
                };
                match self
                    .backends
                    .call(self.backends.remote.get_template(&source_id, None))
                    .await
                {
                    Ok(Some(source)) if !source.steps.is_empty() => {
                        match self.restore(&target, source.steps).await {
                            Some(steps) => Attempt::Resolved(steps),
                            None => Attempt::failed("repaired copy could not be saved"),
                        }
                    }
                    Ok(_) => Attempt::miss("source has no steps"),
                    Err(e) => Attempt::failed(e.to_string()),
                }
            })
            .resolve()
            .await;

        let reasons = outcome.reasons();
        match (outcome.strategy(), outcome.value()) {
            (Some(strategy), Some(steps)) => {
                info!(funnel_id, strategy, steps, "Repaired empty copy");
                RepairReport::repaired(steps, format!("Recovered {} steps", steps))
            }
            _ => RepairReport::failure(format!("No steps could be recovered ({})", reasons)),
        }
    }

    /// Copies missing content relative to their source
    ///
    /// Computed remotely across all owners when the procedure exists,
    /// otherwise over the current identity's templates.
    pub async fn check_all_consistency(&self) -> Vec<ConsistencyIssue> {
        FallbackChain::new("check_all_consistency")
            .strategy("consistency_procedure", async {
                match self
                    .backends
                    .call(self.backends.procedures.check_consistency())
                    .await
                {
                    Ok(issues) => Attempt::Resolved(issues),
                    Err(e) => Attempt::failed(e.to_string()),
                }
            })
            .strategy("owner_scan", async { Attempt::Resolved(self.scan_own_templates().await) })
            .resolve()
            .await
            .value()
            .unwrap_or_default()
    }

    /// Usage history of a token; empty when unreachable
    pub async fn token_usage(&self, token_id: &str) -> Vec<TokenUsageRecord> {
        match self
            .backends
            .call(self.backends.remote.list_usage(token_id))
            .await
        {
            Ok(records) => records,
            Err(e) => {
                warn!(token_id, error = %e, "Token usage unavailable");
                Vec::new()
            }
        }
    }

    async fn scan_own_templates(&self) -> Vec<ConsistencyIssue> {
        let mut issues = Vec::new();
        for copy in self.coordinator.list_templates().await {
            let Some(source_id) = copy.source_funnel_id.as_deref() else {
                continue;
            };
            if !copy.steps.is_empty() {
                continue;
            }
            if let Ok(Some(source)) = self
                .backends
                .call(self.backends.remote.get_template(source_id, None))
                .await
            {
                if !source.steps.is_empty() {
                    issues.push(ConsistencyIssue {
                        funnel_id: copy.id.clone(),
                        issue: format!(
                            "copy has 0 steps, source {} has {}",
                            source_id,
                            source.steps.len()
                        ),
                    });
                }
            }
        }
        issues
    }

    async fn source_of(
        &self,
        target: &FunnelTemplate,
        token_value: Option<&str>,
    ) -> Option<String> {
        if let Some(source) = &target.source_funnel_id {
            return Some(source.clone());
        }
        let token_value = token_value?;
        match self
            .backends
            .call(self.backends.remote.find_token(token_value))
            .await
        {
            Ok(token) => token.map(|t| t.funnel_id),
            Err(_) => None,
        }
    }

    /// Steps written, or `None` when no store took the repaired copy
    async fn restore(&self, target: &FunnelTemplate, steps: Vec<FunnelStep>) -> Option<usize> {
        let mut repaired = target.clone();
        repaired.steps = steps;
        self.coordinator
            .persist(repaired)
            .await
            .map(|saved| saved.steps.len())
    }
}
