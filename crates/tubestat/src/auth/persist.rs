// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Linked-account persistence: load/save to JSON file with atomic writes.
//!
//! Only derived state lives here (tokens, identity). The operator-provided
//! client id/secret never touch disk; they arrive via flags or environment
//! on every start.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::auth::AccountCredential;
use crate::channel::ChannelKind;

/// Persisted state for the linked account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedAccount {
    pub channel_id: String,
    pub channel_title: String,
    #[serde(default)]
    pub kind: ChannelKind,
    pub refresh_token: String,
    pub access_token: String,
    /// Expiry as epoch seconds.
    #[serde(default)]
    pub expires_at: u64,
}

impl PersistedAccount {
    pub fn from_credential(cred: &AccountCredential, kind: ChannelKind) -> Self {
        Self {
            channel_id: cred.channel_id.clone(),
            channel_title: cred.channel_title.clone(),
            kind,
            refresh_token: cred.refresh_token.clone(),
            access_token: cred.access_token.clone(),
            expires_at: cred.expires_at,
        }
    }

    pub fn to_credential(&self) -> AccountCredential {
        AccountCredential {
            channel_id: self.channel_id.clone(),
            channel_title: self.channel_title.clone(),
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expires_at: self.expires_at,
        }
    }
}

/// File-backed store for the linked account under the state directory.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn account_path(&self) -> PathBuf {
        self.dir.join("account.json")
    }

    /// Load the linked account, if one was saved. A missing file is not an
    /// error; a corrupt file is.
    pub fn load_account(&self) -> anyhow::Result<Option<PersistedAccount>> {
        let path = self.account_path();
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let account: PersistedAccount = serde_json::from_str(&contents)?;
        Ok(Some(account))
    }

    /// Save the linked account atomically (write tmp + rename).
    pub fn save_account(&self, account: &PersistedAccount) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        save(&self.account_path(), account)
    }

    /// Remove the linked account. Missing file is fine.
    pub fn clear_account(&self) -> anyhow::Result<bool> {
        match std::fs::remove_file(self.account_path()) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write JSON atomically via a unique temp filename (PID + counter), so
/// concurrent saves racing on the same `.tmp` cannot interleave a shorter
/// write with a longer previous one.
fn save(path: &Path, account: &PersistedAccount) -> anyhow::Result<()> {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    let json = serde_json::to_string_pretty(account)?;
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(
        "{}.{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id(),
        seq,
    );
    let tmp_path = path.with_file_name(tmp_name);
    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;
