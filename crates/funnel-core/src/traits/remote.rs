//! Remote store contract
//!
//! Every call returns a typed [`RemoteResult`]; callers never inspect the
//! shape of a response to decide whether it succeeded.

use async_trait::async_trait;

use crate::error::{RemoteError, RemoteResult};
use crate::types::{
    ConsistencyIssue, CopyOutcome, FunnelTemplate, RepairOutcome, ResolvedToken, ShareToken,
    TokenUsageRecord,
};

/// Authoritative persistence for templates, tokens and usage records
///
/// Template access is scoped by owner. `get_template` with `owner = None`
/// is an unscoped lookup, used only to read a share token's source.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// All templates whose `owner_id` equals `owner`
    async fn list_templates(&self, owner: &str) -> RemoteResult<Vec<FunnelTemplate>>;

    async fn get_template(
        &self,
        id: &str,
        owner: Option<&str>,
    ) -> RemoteResult<Option<FunnelTemplate>>;

    /// Fails with [`RemoteError::Conflict`] when the id already exists
    async fn insert_template(&self, template: &FunnelTemplate) -> RemoteResult<()>;

    /// Replace an existing template owned by `template.owner_id`
    async fn update_template(&self, template: &FunnelTemplate) -> RemoteResult<()>;

    /// Returns whether a row was removed
    async fn delete_template(&self, id: &str, owner: &str) -> RemoteResult<bool>;

    /// Fails with [`RemoteError::Conflict`] when `token_value` is taken
    async fn insert_share_token(&self, token: &ShareToken) -> RemoteResult<()>;

    /// Lookup restricted to tokens with `is_active = true`
    async fn find_active_token(&self, token_value: &str) -> RemoteResult<Option<ShareToken>>;

    /// Lookup regardless of state
    async fn find_token(&self, token_value: &str) -> RemoteResult<Option<ShareToken>>;

    async fn list_tokens(&self, funnel_id: &str, created_by: &str)
        -> RemoteResult<Vec<ShareToken>>;

    /// Flip `is_active` to false; there is no way back
    async fn deactivate_token(&self, token_id: &str) -> RemoteResult<()>;

    async fn append_usage(&self, record: &TokenUsageRecord) -> RemoteResult<()>;

    async fn list_usage(&self, token_id: &str) -> RemoteResult<Vec<TokenUsageRecord>>;
}

/// Named remote procedures
///
/// Each one has a client-side fallback, so a backend that lacks them can
/// use [`NoProcedures`].
#[async_trait]
pub trait RemoteProcedures: Send + Sync {
    /// Secondary token resolution; `None` when invalid, inactive or expired
    async fn resolve_token(&self, token_value: &str) -> RemoteResult<Option<ResolvedToken>>;

    /// Atomically create a template owned by `new_owner` from the token's snapshot
    async fn copy_from_token(&self, token_value: &str, new_owner: &str)
        -> RemoteResult<CopyOutcome>;

    /// Recover steps of an empty copy from its token or its source
    async fn repair_empty_copy(
        &self,
        funnel_id: &str,
        token_value: Option<&str>,
    ) -> RemoteResult<RepairOutcome>;

    /// Bulk scan for copies missing content relative to their source
    async fn check_consistency(&self) -> RemoteResult<Vec<ConsistencyIssue>>;
}

/// A backend without server-side procedures
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProcedures;

#[async_trait]
impl RemoteProcedures for NoProcedures {
    async fn resolve_token(&self, _token_value: &str) -> RemoteResult<Option<ResolvedToken>> {
        Err(RemoteError::procedure_unavailable("resolve_token"))
    }

    async fn copy_from_token(
        &self,
        _token_value: &str,
        _new_owner: &str,
    ) -> RemoteResult<CopyOutcome> {
        Err(RemoteError::procedure_unavailable("copy_from_token"))
    }

    async fn repair_empty_copy(
        &self,
        _funnel_id: &str,
        _token_value: Option<&str>,
    ) -> RemoteResult<RepairOutcome> {
        Err(RemoteError::procedure_unavailable("repair_empty_copy"))
    }

    async fn check_consistency(&self) -> RemoteResult<Vec<ConsistencyIssue>> {
        Err(RemoteError::procedure_unavailable("check_consistency"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_procedures_reports_unavailable() {
        tokio_test::block_on(async {
            let procedures = NoProcedures;
            let err = procedures.resolve_token("abc").await.unwrap_err();
            assert_eq!(
                err,
                RemoteError::ProcedureUnavailable {
                    name: "resolve_token".to_string()
                }
            );
            assert!(procedures.check_consistency().await.unwrap_err().is_transient());
        });
    }
}
