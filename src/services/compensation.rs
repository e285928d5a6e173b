//! Compensation for multi-step provisioning sequences.
//!
//! Engine writes cannot join the relational transaction, so workflows that
//! touch both systems record an undo entry after each engine step that has
//! one. When a later step fails, the recorded entries run in reverse order to
//! bring the engine back in line with the store. Undo entries are plain data
//! rather than closures, so a failed unwind can be logged with enough detail
//! to finish the cleanup by hand.
//!
//! Root credential writes have no undo entry. The engine never discloses a
//! stored secret key, so a previous credential set cannot be rewritten.

use crate::domain::CredentialType;
use crate::errors::Result;
use crate::vault::VaultClient;

/// A single recorded undo action.
#[derive(Debug, Clone)]
pub enum CompensationStep {
    /// Unmount an engine that should not outlive its failed workflow.
    DisableEngine { mount_path: String },
    /// Restore the tune and role settings captured before an update.
    RestoreEngineSettings {
        mount_path: String,
        default_lease_ttl: String,
        max_lease_ttl: String,
        role_name: String,
        credential_type: CredentialType,
        policy_arns: Vec<String>,
    },
}

impl CompensationStep {
    async fn run(&self, client: &VaultClient) -> Result<()> {
        match self {
            Self::DisableEngine { mount_path } => client.disable_engine(mount_path).await,
            Self::RestoreEngineSettings {
                mount_path,
                default_lease_ttl,
                max_lease_ttl,
                role_name,
                credential_type,
                policy_arns,
            } => {
                client.tune_lease_ttls(mount_path, default_lease_ttl, max_lease_ttl).await?;
                client.write_role(mount_path, role_name, *credential_type, policy_arns).await
            }
        }
    }

    fn mount_path(&self) -> &str {
        match self {
            Self::DisableEngine { mount_path } => mount_path,
            Self::RestoreEngineSettings { mount_path, .. } => mount_path,
        }
    }
}

/// Stack of undo actions, run in reverse push order.
#[derive(Debug, Default)]
pub struct CompensationStack {
    steps: Vec<CompensationStep>,
}

impl CompensationStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: CompensationStep) {
        self.steps.push(step);
    }

    /// Run every recorded step in reverse order.
    ///
    /// Step failures are logged and do not stop the unwind; the error that
    /// triggered compensation stays the one surfaced to the caller.
    pub async fn unwind(mut self, client: &VaultClient) {
        while let Some(step) = self.steps.pop() {
            if let Err(e) = step.run(client).await {
                tracing::warn!(
                    error = %e,
                    mount_path = %step.mount_path(),
                    step = ?step,
                    "Compensation step failed, continuing unwind"
                );
            }
        }
    }
}
