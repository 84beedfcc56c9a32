// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Viewer kinds for the access-control tracks.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Kind of non-owner actor that can be granted access to a vault.
///
/// Each kind has its own identity registry and its own, independent
/// request/grant/revoke track on every vault. A principal may hold
/// different states on each track at the same time.
///
/// - `Doctor` - may read records and upload new records for the patient
/// - `InsuranceCompany` - may read records
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ViewerKind {
    Doctor,
    InsuranceCompany,
}

impl ViewerKind {
    pub const ALL: [ViewerKind; 2] = [ViewerKind::Doctor, ViewerKind::InsuranceCompany];

    /// Whether viewers of this kind may append content references to a
    /// vault they are authorized on.
    pub fn can_upload(&self) -> bool {
        matches!(self, ViewerKind::Doctor)
    }

    /// Stable lowercase tag used in storage keys and URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewerKind::Doctor => "doctor",
            ViewerKind::InsuranceCompany => "insurance_company",
        }
    }

    /// Parse a kind from its tag (case-insensitive).
    pub fn from_str(s: &str) -> Option<ViewerKind> {
        match s.to_lowercase().as_str() {
            "doctor" => Some(ViewerKind::Doctor),
            "insurance_company" => Some(ViewerKind::InsuranceCompany),
            _ => None,
        }
    }
}

impl std::fmt::Display for ViewerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
