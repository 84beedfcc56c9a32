// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Data Models
//!
//! Identifier newtypes shared by the ledger, the client flows and the REST
//! API, plus the request and response structures of the HTTP surface. All
//! API types derive `Serialize`, `Deserialize`, and `ToSchema` for JSON
//! handling and OpenAPI documentation.
//!
//! ## Identifier Types
//!
//! - [`PrincipalId`]: opaque actor identifier (patient, doctor, insurer, authority)
//! - [`Cid`]: content identifier into the content-addressed blob store
//! - [`WrappedKey`]: content key sealed for one recipient; base64 on the wire

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;

use crate::auth::ViewerKind;
use crate::ledger::AccessState;

// =============================================================================
// Identifier Types
// =============================================================================

/// Opaque, address-like actor identifier.
///
/// Unique per actor and never reused across roles. Compared byte-for-byte;
/// no case folding is applied.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PrincipalId(pub String);

impl PrincipalId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PrincipalId {
    fn from(value: String) -> Self {
        PrincipalId(value)
    }
}

impl From<&str> for PrincipalId {
    fn from(value: &str) -> Self {
        PrincipalId(value.to_string())
    }
}

impl From<PrincipalId> for String {
    fn from(value: PrincipalId) -> Self {
        value.0
    }
}

/// Content identifier of a blob in the content-addressed store.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cid(pub String);

impl Cid {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Cid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Cid {
    fn from(value: String) -> Self {
        Cid(value)
    }
}

impl From<&str> for Cid {
    fn from(value: &str) -> Self {
        Cid(value.to_string())
    }
}

/// A content key sealed under one recipient's public key.
///
/// Opaque to everything except [`crate::crypto::unwrap_key`].
#[derive(Clone, PartialEq, Eq)]
pub struct WrappedKey(pub Vec<u8>);

impl WrappedKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for WrappedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WrappedKey({} bytes)", self.0.len())
    }
}

impl From<Vec<u8>> for WrappedKey {
    fn from(value: Vec<u8>) -> Self {
        WrappedKey(value)
    }
}

impl Serialize for WrappedKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        base64_bytes::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for WrappedKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        base64_bytes::deserialize(deserializer).map(WrappedKey)
    }
}

/// Serde adapter storing raw bytes as standard padded base64 strings.
pub mod base64_bytes {
    use base64ct::{Base64, Encoding};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&Base64::encode_string(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Base64::decode_vec(&encoded).map_err(|e| D::Error::custom(format!("invalid base64: {e}")))
    }
}

// =============================================================================
// Identity Registry Models
// =============================================================================

/// Request to add one identity to a registry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AddIdentityRequest {
    pub principal: PrincipalId,
    /// Human-readable label; must be non-empty after trimming.
    pub name: String,
}

/// Request to add several identities atomically.
///
/// `principals` and `names` are paired by position and must have equal length.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct BatchAddIdentitiesRequest {
    pub principals: Vec<PrincipalId>,
    pub names: Vec<String>,
}

/// Request to remove several identities atomically.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct BatchRemoveIdentitiesRequest {
    pub principals: Vec<PrincipalId>,
}

/// Public view of a registry entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct IdentityResponse {
    pub principal: PrincipalId,
    pub kind: ViewerKind,
    /// Empty string when the principal is not (or no longer) registered.
    pub name: String,
    pub active: bool,
    /// Published secp256k1 public key (SPKI PEM), if any.
    pub public_key: Option<String>,
}

/// Body carrying a PEM-encoded public key.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct PublicKeyBody {
    pub public_key: String,
}

// =============================================================================
// Vault Models
// =============================================================================

/// Request to register the calling patient.
///
/// Key material is optional so that registration and key setup can be done
/// in one transaction or separately.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct RegisterPatientRequest {
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = Byte)]
    pub wrapped_own_key: Option<WrappedKey>,
}

/// Reference to a registered vault.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct VaultRef {
    pub owner: PrincipalId,
    pub created_at: DateTime<Utc>,
}

/// Body carrying a wrapped content key.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct WrappedKeyBody {
    #[schema(value_type = String, format = Byte)]
    pub wrapped_key: WrappedKey,
}

/// Request to append a content reference to a vault.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AddContentRefRequest {
    pub cid: Cid,
    /// Anonymized derivative to contribute to the research pool in the same
    /// transaction. Requires the patient's opt-in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_cid: Option<Cid>,
}

/// Research opt-in flag of a vault.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ResearchOptInBody {
    pub opt_in: bool,
}

// =============================================================================
// Access Workflow Models
// =============================================================================

/// Relation between a viewer and a vault on one track.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AccessStatusResponse {
    pub patient: PrincipalId,
    pub viewer: PrincipalId,
    pub kind: ViewerKind,
    pub state: AccessState,
    /// True iff `state` is `authorized`.
    pub authorized: bool,
}

/// List of principals (pending requests, authorized viewers).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct PrincipalListResponse {
    pub principals: Vec<PrincipalId>,
}

// =============================================================================
// Research Pool Models
// =============================================================================

/// Request to contribute an anonymized record reference.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AddResearchEntryRequest {
    /// Patient whose consent covers this contribution.
    pub patient: PrincipalId,
    pub cid: Cid,
}

/// A single research pool entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ResearchEntryResponse {
    pub index: u64,
    pub cid: Cid,
}
