// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::Authority;
use crate::ledger::{AuthorizationLedger, StoreResult, LEDGER_FILE};

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<AuthorizationLedger>,
    /// Directory of the on-disk ledger; `None` for in-memory ledgers.
    pub data_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(ledger: AuthorizationLedger) -> Self {
        Self {
            ledger: Arc::new(ledger),
            data_dir: None,
        }
    }

    /// Open (or create) the ledger under `data_dir`.
    pub fn open(data_dir: PathBuf, authority: Authority) -> StoreResult<Self> {
        std::fs::create_dir_all(&data_dir)?;
        let ledger = AuthorizationLedger::open(&data_dir.join(LEDGER_FILE), authority)?;
        Ok(Self {
            ledger: Arc::new(ledger),
            data_dir: Some(data_dir),
        })
    }

    pub fn in_memory(authority: Authority) -> StoreResult<Self> {
        Ok(Self::new(AuthorizationLedger::in_memory(authority)?))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PrincipalId;
    use tempfile::TempDir;

    #[test]
    fn open_creates_data_dir() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("nested").join("data");
        let state = AppState::open(
            data_dir.clone(),
            Authority::single(PrincipalId::from("authority")),
        )
        .unwrap();

        assert!(data_dir.join(LEDGER_FILE).exists());
        assert_eq!(state.data_dir, Some(data_dir));
    }
}
