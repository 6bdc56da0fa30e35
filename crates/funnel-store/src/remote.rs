//! In-process authoritative store
//!
//! [`MemoryRemote`] implements both [`RemoteStore`] and [`RemoteProcedures`]
//! over a single locked state. It is the backend for integration tests and
//! for the CLI, which persists its state as JSON between runs.
//!
//! # Fault injection
//!
//! - [`MemoryRemote::set_unavailable`] fails every call
//! - [`MemoryRemote::fail_op`] fails one kind of call
//! - [`MemoryRemote::set_procedures_enabled`] removes the server procedures
//! - [`MemoryRemote::set_latency`] delays every call
//! - [`MemoryRemote::set_drop_snapshot_steps`] stores token snapshots without
//!   their steps, reproducing copies that come out empty

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use funnel_core::{
    Clock, ConsistencyIssue, CopyOutcome, FunnelTemplate, RemoteError, RemoteProcedures,
    RemoteResult, RemoteStore, RepairOutcome, ResolvedToken, ShareToken, SystemClock,
    TokenUsageRecord,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// Kinds of remote call, for targeted failure injection and statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    ListTemplates,
    GetTemplate,
    InsertTemplate,
    UpdateTemplate,
    DeleteTemplate,
    InsertShareToken,
    FindToken,
    ListTokens,
    DeactivateToken,
    AppendUsage,
    ListUsage,
    ResolveToken,
    CopyFromToken,
    RepairEmptyCopy,
    CheckConsistency,
}

impl RemoteOp {
    fn is_procedure(self) -> bool {
        matches!(
            self,
            Self::ResolveToken
                | Self::CopyFromToken
                | Self::RepairEmptyCopy
                | Self::CheckConsistency
        )
    }

    fn name(self) -> &'static str {
        match self {
            Self::ListTemplates => "list_templates",
            Self::GetTemplate => "get_template",
            Self::InsertTemplate => "insert_template",
            Self::UpdateTemplate => "update_template",
            Self::DeleteTemplate => "delete_template",
            Self::InsertShareToken => "insert_share_token",
            Self::FindToken => "find_token",
            Self::ListTokens => "list_tokens",
            Self::DeactivateToken => "deactivate_token",
            Self::AppendUsage => "append_usage",
            Self::ListUsage => "list_usage",
            Self::ResolveToken => "resolve_token",
            Self::CopyFromToken => "copy_from_token",
            Self::RepairEmptyCopy => "repair_empty_copy",
            Self::CheckConsistency => "check_consistency",
        }
    }
}

/// Operation counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryRemoteStats {
    /// Calls that reached the store, including rejected ones
    pub calls: usize,
    /// Successful template inserts
    pub template_inserts: usize,
    /// Successful template updates
    pub template_updates: usize,
    /// Successful token inserts
    pub token_inserts: usize,
    /// Usage records appended
    pub usage_appends: usize,
    /// Calls failed by injection
    pub injected_failures: usize,
}

/// Everything the store holds; this is what gets persisted
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteState {
    #[serde(default)]
    templates: BTreeMap<String, FunnelTemplate>,
    /// Keyed by token id
    #[serde(default)]
    tokens: BTreeMap<String, ShareToken>,
    #[serde(default)]
    usage: Vec<TokenUsageRecord>,
}

impl RemoteState {
    fn token_by_value(&self, token_value: &str) -> Option<&ShareToken> {
        self.tokens.values().find(|t| t.token_value == token_value)
    }
}

#[derive(Debug)]
struct Faults {
    unavailable: Option<String>,
    failing: HashSet<RemoteOp>,
    procedures_enabled: bool,
    drop_snapshot_steps: bool,
    latency: Option<Duration>,
}

impl Default for Faults {
    fn default() -> Self {
        Self {
            unavailable: None,
            failing: HashSet::new(),
            procedures_enabled: true,
            drop_snapshot_steps: false,
            latency: None,
        }
    }
}

/// In-memory authoritative store
///
/// Cloning shares the underlying state.
#[derive(Clone)]
pub struct MemoryRemote {
    state: Arc<Mutex<RemoteState>>,
    faults: Arc<Mutex<Faults>>,
    stats: Arc<Mutex<MemoryRemoteStats>>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RemoteState::default())),
            faults: Arc::new(Mutex::new(Faults::default())),
            stats: Arc::new(Mutex::new(MemoryRemoteStats::default())),
            clock: Arc::new(SystemClock),
        }
    }

    /// Builder-style: time source for expiry checks inside procedures
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Load state written by [`Self::save_json`]; a missing file is an empty store
    pub fn load_json(path: &Path) -> StoreResult<Self> {
        let remote = Self::new();
        let raw = match std::fs::read(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(remote),
            Err(e) => return Err(StoreError::io(path, e)),
        };
        let state: RemoteState =
            serde_json::from_slice(&raw).map_err(|e| StoreError::serialization(path, e))?;
        debug!(
            path = %path.display(),
            templates = state.templates.len(),
            tokens = state.tokens.len(),
            "Loaded remote state"
        );
        *remote.state.lock() = state;
        Ok(remote)
    }

    /// Atomically write the full state as JSON
    pub fn save_json(&self, path: &Path) -> StoreResult<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

        let json = {
            let state = self.state.lock();
            serde_json::to_vec_pretty(&*state).map_err(|e| StoreError::serialization(path, e))?
        };
        let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
        std::io::Write::write_all(&mut file, &json).map_err(|e| StoreError::io(path, e))?;
        file.persist(path).map_err(|e| StoreError::io(path, e.error))?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Fault injection
    // ------------------------------------------------------------------------

    /// Fail every call with [`RemoteError::Unavailable`]
    pub fn set_unavailable(&self, reason: Option<&str>) {
        self.faults.lock().unavailable = reason.map(str::to_string);
    }

    /// Fail every call of kind `op`
    pub fn fail_op(&self, op: RemoteOp) {
        self.faults.lock().failing.insert(op);
    }

    pub fn restore_op(&self, op: RemoteOp) {
        self.faults.lock().failing.remove(&op);
    }

    /// With procedures disabled every procedure reports itself unavailable
    pub fn set_procedures_enabled(&self, enabled: bool) {
        self.faults.lock().procedures_enabled = enabled;
    }

    pub fn set_drop_snapshot_steps(&self, drop: bool) {
        self.faults.lock().drop_snapshot_steps = drop;
    }

    /// Delay every call by `latency`
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.faults.lock().latency = latency;
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    pub fn stats(&self) -> MemoryRemoteStats {
        self.stats.lock().clone()
    }

    /// Every stored template regardless of owner
    pub fn templates(&self) -> Vec<FunnelTemplate> {
        self.state.lock().templates.values().cloned().collect()
    }

    /// Every stored token
    pub fn tokens(&self) -> Vec<ShareToken> {
        self.state.lock().tokens.values().cloned().collect()
    }

    /// Every usage record in append order
    pub fn usage(&self) -> Vec<TokenUsageRecord> {
        self.state.lock().usage.clone()
    }

    /// Put a template in place without going through the store API
    pub fn seed_template(&self, template: FunnelTemplate) {
        self.state
            .lock()
            .templates
            .insert(template.id.clone(), template);
    }

    /// Put a token in place without going through the store API
    pub fn seed_token(&self, token: ShareToken) {
        self.state.lock().tokens.insert(token.id.clone(), token);
    }

    /// Count the call, wait out any latency, then apply injected faults
    async fn enter(&self, op: RemoteOp) -> RemoteResult<()> {
        self.stats.lock().calls += 1;

        let latency = self.faults.lock().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let faults = self.faults.lock();
        let injected = if let Some(reason) = &faults.unavailable {
            Some(RemoteError::unavailable(reason.clone()))
        } else if op.is_procedure() && !faults.procedures_enabled {
            Some(RemoteError::procedure_unavailable(op.name()))
        } else if faults.failing.contains(&op) {
            Some(RemoteError::unavailable(format!("{} failed", op.name())))
        } else {
            None
        };
        drop(faults);

        match injected {
            Some(err) => {
                self.stats.lock().injected_failures += 1;
                Err(err)
            }
            None => Ok(()),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn list_templates(&self, owner: &str) -> RemoteResult<Vec<FunnelTemplate>> {
        self.enter(RemoteOp::ListTemplates).await?;
        let state = self.state.lock();
        Ok(state
            .templates
            .values()
            .filter(|t| t.owner_id.as_deref() == Some(owner))
            .cloned()
            .collect())
    }

    async fn get_template(
        &self,
        id: &str,
        owner: Option<&str>,
    ) -> RemoteResult<Option<FunnelTemplate>> {
        self.enter(RemoteOp::GetTemplate).await?;
        let state = self.state.lock();
        Ok(state
            .templates
            .get(id)
            .filter(|t| owner.map_or(true, |owner| t.owner_id.as_deref() == Some(owner)))
            .cloned())
    }

    async fn insert_template(&self, template: &FunnelTemplate) -> RemoteResult<()> {
        self.enter(RemoteOp::InsertTemplate).await?;
        if !template.has_id() {
            return Err(RemoteError::rejected("template id is required"));
        }
        let mut state = self.state.lock();
        if state.templates.contains_key(&template.id) {
            return Err(RemoteError::conflict(format!("template {} exists", template.id)));
        }
        state
            .templates
            .insert(template.id.clone(), template.clone());
        self.stats.lock().template_inserts += 1;
        Ok(())
    }

    async fn update_template(&self, template: &FunnelTemplate) -> RemoteResult<()> {
        self.enter(RemoteOp::UpdateTemplate).await?;
        let mut state = self.state.lock();
        match state.templates.get_mut(&template.id) {
            Some(existing) if existing.owner_id == template.owner_id => {
                *existing = template.clone();
                self.stats.lock().template_updates += 1;
                Ok(())
            }
            _ => Err(RemoteError::rejected(format!(
                "template {} not found for owner",
                template.id
            ))),
        }
    }

    async fn delete_template(&self, id: &str, owner: &str) -> RemoteResult<bool> {
        self.enter(RemoteOp::DeleteTemplate).await?;
        let mut state = self.state.lock();
        let owned = state
            .templates
            .get(id)
            .is_some_and(|t| t.owner_id.as_deref() == Some(owner));
        if owned {
            state.templates.remove(id);
        }
        Ok(owned)
    }

    async fn insert_share_token(&self, token: &ShareToken) -> RemoteResult<()> {
        self.enter(RemoteOp::InsertShareToken).await?;
        let drop_steps = self.faults.lock().drop_snapshot_steps;

        let mut state = self.state.lock();
        if state.token_by_value(&token.token_value).is_some() {
            return Err(RemoteError::conflict("token value already in use"));
        }
        if state.tokens.contains_key(&token.id) {
            return Err(RemoteError::conflict(format!("token {} exists", token.id)));
        }

        let mut stored = token.clone();
        if drop_steps {
            stored.snapshot.steps.clear();
        }
        state.tokens.insert(stored.id.clone(), stored);
        self.stats.lock().token_inserts += 1;
        Ok(())
    }

    async fn find_active_token(&self, token_value: &str) -> RemoteResult<Option<ShareToken>> {
        self.enter(RemoteOp::FindToken).await?;
        let state = self.state.lock();
        Ok(state
            .token_by_value(token_value)
            .filter(|t| t.is_active)
            .cloned())
    }

    async fn find_token(&self, token_value: &str) -> RemoteResult<Option<ShareToken>> {
        self.enter(RemoteOp::FindToken).await?;
        Ok(self.state.lock().token_by_value(token_value).cloned())
    }

    async fn list_tokens(
        &self,
        funnel_id: &str,
        created_by: &str,
    ) -> RemoteResult<Vec<ShareToken>> {
        self.enter(RemoteOp::ListTokens).await?;
        let state = self.state.lock();
        let mut tokens: Vec<ShareToken> = state
            .tokens
            .values()
            .filter(|t| t.funnel_id == funnel_id && t.created_by == created_by)
            .cloned()
            .collect();
        tokens.sort_by_key(|t| t.created_at);
        Ok(tokens)
    }

    async fn deactivate_token(&self, token_id: &str) -> RemoteResult<()> {
        self.enter(RemoteOp::DeactivateToken).await?;
        let mut state = self.state.lock();
        match state.tokens.get_mut(token_id) {
            Some(token) => {
                token.is_active = false;
                Ok(())
            }
            None => Err(RemoteError::rejected(format!("token {} not found", token_id))),
        }
    }

    async fn append_usage(&self, record: &TokenUsageRecord) -> RemoteResult<()> {
        self.enter(RemoteOp::AppendUsage).await?;
        self.state.lock().usage.push(record.clone());
        self.stats.lock().usage_appends += 1;
        Ok(())
    }

    async fn list_usage(&self, token_id: &str) -> RemoteResult<Vec<TokenUsageRecord>> {
        self.enter(RemoteOp::ListUsage).await?;
        let state = self.state.lock();
        Ok(state
            .usage
            .iter()
            .filter(|r| r.token_id == token_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RemoteProcedures for MemoryRemote {
    async fn resolve_token(&self, token_value: &str) -> RemoteResult<Option<ResolvedToken>> {
        self.enter(RemoteOp::ResolveToken).await?;
        let now = self.now();
        let state = self.state.lock();
        Ok(state
            .token_by_value(token_value)
            .filter(|t| t.is_usable_at(now))
            .map(ResolvedToken::from))
    }

    async fn copy_from_token(
        &self,
        token_value: &str,
        new_owner: &str,
    ) -> RemoteResult<CopyOutcome> {
        self.enter(RemoteOp::CopyFromToken).await?;
        let now = self.now();
        let mut state = self.state.lock();

        let token = state
            .token_by_value(token_value)
            .filter(|t| t.is_usable_at(now))
            .cloned()
            .ok_or_else(|| RemoteError::rejected("token is invalid or expired"))?;

        let mut copy = FunnelTemplate::from_snapshot(
            &token.snapshot,
            Some(new_owner.to_string()),
            &token.funnel_id,
        );
        copy.id = Uuid::new_v4().to_string();
        copy.created_at = Some(now);
        copy.last_modified_at = Some(now);

        let outcome = CopyOutcome {
            funnel_id: copy.id.clone(),
            steps_copied: copy.steps.len(),
        };
        state.templates.insert(copy.id.clone(), copy);
        self.stats.lock().template_inserts += 1;

        info!(
            token_id = %token.id,
            funnel_id = %outcome.funnel_id,
            steps = outcome.steps_copied,
            "Copied template from token"
        );
        Ok(outcome)
    }

    async fn repair_empty_copy(
        &self,
        funnel_id: &str,
        token_value: Option<&str>,
    ) -> RemoteResult<RepairOutcome> {
        self.enter(RemoteOp::RepairEmptyCopy).await?;
        let mut state = self.state.lock();

        let target = state
            .templates
            .get(funnel_id)
            .cloned()
            .ok_or_else(|| RemoteError::rejected(format!("template {} not found", funnel_id)))?;
        if !target.steps.is_empty() {
            return Ok(RepairOutcome {
                steps_count: target.steps.len(),
            });
        }

        let token = token_value.and_then(|v| state.token_by_value(v)).cloned();
        let from_token = token
            .as_ref()
            .map(|t| t.snapshot.steps.clone())
            .filter(|steps| !steps.is_empty());
        let source_id = target
            .source_funnel_id
            .clone()
            .or_else(|| token.as_ref().map(|t| t.funnel_id.clone()));
        let steps = from_token
            .or_else(|| {
                source_id
                    .and_then(|id| state.templates.get(&id))
                    .map(|source| source.steps.clone())
            })
            .unwrap_or_default();

        let steps_count = steps.len();
        if steps_count > 0 {
            let now = self.now();
            if let Some(target) = state.templates.get_mut(funnel_id) {
                target.steps = steps;
                target.last_modified_at = Some(now);
            }
        }
        Ok(RepairOutcome { steps_count })
    }

    async fn check_consistency(&self) -> RemoteResult<Vec<ConsistencyIssue>> {
        self.enter(RemoteOp::CheckConsistency).await?;
        let state = self.state.lock();
        Ok(state
            .templates
            .values()
            .filter(|copy| copy.steps.is_empty())
            .filter_map(|copy| {
                let source_id = copy.source_funnel_id.as_ref()?;
                let source = state.templates.get(source_id)?;
                (!source.steps.is_empty()).then(|| ConsistencyIssue {
                    funnel_id: copy.id.clone(),
                    issue: format!(
                        "copy has 0 steps, source {} has {}",
                        source_id,
                        source.steps.len()
                    ),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use funnel_core::{FunnelStep, ManualClock, TemplateSnapshot};

    fn template(id: &str, owner: &str, steps: usize) -> FunnelTemplate {
        FunnelTemplate::new(id)
            .with_id(id)
            .with_owner(owner)
            .with_steps(
                (0..steps)
                    .map(|i| FunnelStep::new("email", format!("Step {}", i)))
                    .collect(),
            )
    }

    fn token(
        value: &str,
        source: &FunnelTemplate,
        expires_at: Option<DateTime<Utc>>,
    ) -> ShareToken {
        ShareToken {
            id: format!("id-{}", value),
            token_value: value.to_string(),
            funnel_id: source.id.clone(),
            created_by: source.owner_id.clone().unwrap_or_default(),
            created_at: Utc::now(),
            expires_at,
            is_active: true,
            snapshot: TemplateSnapshot::from(source),
        }
    }

    #[tokio::test]
    async fn test_templates_are_scoped_by_owner() {
        let remote = MemoryRemote::new();
        remote.insert_template(&template("a", "alice", 1)).await.unwrap();
        remote.insert_template(&template("b", "bob", 1)).await.unwrap();

        let alice = remote.list_templates("alice").await.unwrap();
        assert_eq!(alice.len(), 1);
        assert!(remote.get_template("b", Some("alice")).await.unwrap().is_none());
        assert!(remote.get_template("b", None).await.unwrap().is_some());
        assert!(!remote.delete_template("b", "alice").await.unwrap());
        assert!(remote.delete_template("b", "bob").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_ids_conflict() {
        let remote = MemoryRemote::new();
        let t = template("a", "alice", 1);
        remote.insert_template(&t).await.unwrap();
        let err = remote.insert_template(&t).await.unwrap_err();
        assert!(matches!(err, RemoteError::Conflict(_)));

        let first = token("abcdefgh", &t, None);
        remote.insert_share_token(&first).await.unwrap();
        let mut second = first.clone();
        second.id = "other".to_string();
        let err = remote.insert_share_token(&second).await.unwrap_err();
        assert!(matches!(err, RemoteError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_requires_same_owner() {
        let remote = MemoryRemote::new();
        remote.insert_template(&template("a", "alice", 1)).await.unwrap();
        let stolen = template("a", "mallory", 0);
        assert!(remote.update_template(&stolen).await.is_err());
        assert_eq!(remote.templates()[0].steps.len(), 1);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let remote = MemoryRemote::new();
        remote.set_unavailable(Some("maintenance"));
        let err = remote.list_templates("alice").await.unwrap_err();
        assert!(err.is_transient());

        remote.set_unavailable(None);
        remote.fail_op(RemoteOp::InsertTemplate);
        assert!(remote.insert_template(&template("a", "alice", 0)).await.is_err());
        assert!(remote.list_templates("alice").await.is_ok());

        remote.set_procedures_enabled(false);
        let err = remote.check_consistency().await.unwrap_err();
        assert!(matches!(err, RemoteError::ProcedureUnavailable { .. }));

        let stats = remote.stats();
        assert_eq!(stats.calls, 4);
        assert_eq!(stats.injected_failures, 3);
    }

    #[tokio::test]
    async fn test_resolve_honours_expiry_and_deactivation() {
        let start = Utc::now();
        let clock = Arc::new(ManualClock::new(start));
        let remote = MemoryRemote::new().with_clock(clock.clone());
        let source = template("src", "alice", 2);
        remote.seed_token(token("expiring", &source, Some(start + ChronoDuration::days(1))));
        remote.seed_token(token("forever", &source, None));

        assert!(remote.resolve_token("expiring").await.unwrap().is_some());
        clock.advance(ChronoDuration::days(2));
        assert!(remote.resolve_token("expiring").await.unwrap().is_none());

        remote.deactivate_token("id-forever").await.unwrap();
        assert!(remote.resolve_token("forever").await.unwrap().is_none());
        assert!(remote.find_active_token("forever").await.unwrap().is_none());
        assert!(remote.find_token("forever").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_copy_from_token_uses_snapshot() {
        let remote = MemoryRemote::new();
        let source = template("src", "alice", 3);
        remote.seed_template(source.clone());
        remote.seed_token(token("share123", &source, None));

        let outcome = remote.copy_from_token("share123", "bob").await.unwrap();
        assert_eq!(outcome.steps_copied, 3);

        let copy = remote
            .get_template(&outcome.funnel_id, Some("bob"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(copy.source_funnel_id.as_deref(), Some("src"));
        assert_eq!(copy.steps, source.steps);
    }

    #[tokio::test]
    async fn test_dropped_snapshot_steps_are_repairable() {
        let remote = MemoryRemote::new();
        remote.set_drop_snapshot_steps(true);
        let source = template("src", "alice", 2);
        remote.seed_template(source.clone());
        remote.insert_share_token(&token("share123", &source, None)).await.unwrap();

        let outcome = remote.copy_from_token("share123", "bob").await.unwrap();
        assert_eq!(outcome.steps_copied, 0);

        let issues = remote.check_consistency().await.unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].funnel_id, outcome.funnel_id);

        let repair = remote
            .repair_empty_copy(&outcome.funnel_id, Some("share123"))
            .await
            .unwrap();
        assert_eq!(repair.steps_count, 2);
        assert!(remote.check_consistency().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_state_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remote.json");

        let remote = MemoryRemote::new();
        let source = template("src", "alice", 1);
        remote.seed_template(source.clone());
        remote.seed_token(token("share123", &source, None));
        remote.save_json(&path).unwrap();

        let reloaded = MemoryRemote::load_json(&path).unwrap();
        assert_eq!(reloaded.templates(), remote.templates());
        assert_eq!(reloaded.tokens().len(), 1);
        assert!(MemoryRemote::load_json(&dir.path().join("missing.json"))
            .unwrap()
            .templates()
            .is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_delays_calls() {
        let remote = MemoryRemote::new();
        remote.set_latency(Some(Duration::from_secs(30)));
        let started = tokio::time::Instant::now();
        remote.list_templates("alice").await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(30));
    }
}
