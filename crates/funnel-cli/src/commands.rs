//! Command implementations

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use funnel_config::FunnelConfig;
use funnel_core::{
    AuthEvent, AuthSignal, Backends, FunnelCore, FunnelTemplate, RemoteStore, SessionAuth,
};
use funnel_store::{JsonFileCache, MemoryRemote};
use serde_json::Value;
use tracing::debug;

use crate::cli::Commands;

const SESSION_FILE: &str = "session";
const REMOTE_FILE: &str = "remote.json";

/// The core wired to on-disk state under one data directory
pub struct Workspace {
    core: FunnelCore,
    remote: MemoryRemote,
    session: Arc<SessionAuth>,
    data_dir: PathBuf,
}

impl Workspace {
    pub fn open(config: &FunnelConfig) -> Result<Self> {
        let data_dir = config.sync.cache_dir.clone();
        let remote = MemoryRemote::load_json(&data_dir.join(REMOTE_FILE))
            .context("Failed to load remote state")?;
        let cache = JsonFileCache::new(config.sync.cache_path());

        let session = Arc::new(match read_session(&data_dir)? {
            Some(owner) => SessionAuth::signed_in(owner),
            None => SessionAuth::anonymous(),
        });

        let backends = Backends::new(
            Arc::new(remote.clone()),
            Arc::new(remote.clone()),
            Arc::new(cache),
            session.clone(),
        );
        debug!(data_dir = %data_dir.display(), "Opened workspace");

        Ok(Self {
            core: FunnelCore::new(config, backends),
            remote,
            session,
            data_dir,
        })
    }

    /// Write the remote state and the session back to disk
    pub fn persist(&self) -> Result<()> {
        self.remote
            .save_json(&self.data_dir.join(REMOTE_FILE))
            .context("Failed to save remote state")?;

        let session_path = self.data_dir.join(SESSION_FILE);
        match self.session.current_identity() {
            Some(owner) => std::fs::write(&session_path, owner)
                .with_context(|| format!("Failed to write {}", session_path.display()))?,
            None if session_path.exists() => std::fs::remove_file(&session_path)
                .with_context(|| format!("Failed to remove {}", session_path.display()))?,
            None => {}
        }
        Ok(())
    }
}

fn read_session(data_dir: &Path) -> Result<Option<String>> {
    let path = data_dir.join(SESSION_FILE);
    match std::fs::read_to_string(&path) {
        Ok(owner) => {
            let owner = owner.trim();
            Ok((!owner.is_empty()).then(|| owner.to_string()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

/// Parse template JSON given inline or as `@path`
pub fn parse_template(input: &str) -> Result<FunnelTemplate> {
    let raw = match input.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read template file {}", path))?,
        None => input.to_string(),
    };
    serde_json::from_str(&raw).context("Template is not valid JSON")
}

pub async fn run(command: Commands, ws: &Workspace, json: bool) -> Result<()> {
    let core = &ws.core;

    match command {
        Commands::List => {
            let templates = core.list_templates().await;
            if json {
                return print_json(&templates);
            }
            if templates.is_empty() {
                println!("No templates");
            }
            for t in &templates {
                println!("{}  {}  ({} steps)", t.id, t.title, t.steps.len());
            }
        }

        Commands::Show { id } => match core.get_template(&id).await {
            Some(template) => print_json(&template)?,
            None => bail!("Template {} not found", id),
        },

        Commands::Save { template } => {
            let saved = core.save_template(parse_template(&template)?).await;
            if json {
                return print_json(&saved);
            }
            println!("Saved {}", saved.id);
        }

        Commands::Delete { id } => {
            if !core.delete_template(&id).await {
                bail!("Template {} could not be deleted", id);
            }
            println!("Deleted {}", id);
        }

        Commands::SignIn { owner } => {
            ws.session.sign_in(owner.clone());
            let report = core
                .coordinator()
                .handle_auth_event(&AuthEvent::SignedIn(owner.clone()))
                .await
                .unwrap_or_default();
            println!(
                "Signed in as {} ({} migrated, {} skipped, {} failed)",
                owner,
                report.inserted.len(),
                report.skipped,
                report.failed.len()
            );
        }

        Commands::SignOut => {
            ws.session.sign_out();
            core.coordinator()
                .handle_auth_event(&AuthEvent::SignedOut)
                .await;
            println!("Signed out");
        }

        Commands::Share { id, days } => {
            let token = core.issue_token(&id, days).await?;
            println!("{}", token);
        }

        Commands::Tokens { id } => {
            let tokens = core.list_issued_tokens(&id).await?;
            if json {
                return print_json(&tokens);
            }
            for t in &tokens {
                let expiry = t
                    .expires_at
                    .map_or_else(|| "never".to_string(), |e| e.to_rfc3339());
                let state = if t.is_active { "active" } else { "inactive" };
                println!("{}  {}  expires {}", t.token_value, state, expiry);
            }
        }

        Commands::Validate { token } => {
            let validation = core.validate_token(&token).await;
            if json || validation.valid {
                print_json(&validation)?;
            }
            if !validation.valid {
                bail!(validation
                    .message
                    .unwrap_or_else(|| "Share link is invalid".to_string()));
            }
        }

        Commands::Redeem { token } => {
            let redemption = core.redeem(&token).await;
            if json {
                print_json(&redemption)?;
            }
            if !redemption.success {
                bail!(redemption.message);
            }
            if !json {
                println!(
                    "{} -> {}",
                    redemption.message,
                    redemption.funnel_id.unwrap_or_default()
                );
            }
        }

        Commands::Repair { id, token } => {
            let report = core.repair_empty_copy(&id, token.as_deref()).await;
            if !report.success {
                bail!(report.message);
            }
            println!("{}", report.message);
        }

        Commands::Audit => {
            let issues = core.check_all_consistency().await;
            if json {
                return print_json(&issues);
            }
            if issues.is_empty() {
                println!("No inconsistencies found");
            }
            for issue in &issues {
                println!("{}  {}", issue.funnel_id, issue.issue);
            }
        }

        Commands::Usage { token } => {
            let Some(found) = ws.remote.find_token(&token).await? else {
                bail!("Share link not found");
            };
            print_json(&core.token_usage(&found.id).await)?;
        }

        Commands::Deactivate { token } => {
            core.deactivate_token(&token).await?;
            println!("Deactivated");
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let value: Value = serde_json::to_value(value)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
