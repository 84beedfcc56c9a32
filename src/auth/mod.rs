// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authorization Module
//!
//! Caller identity and registry authority for the Patient Vault API.
//!
//! ## Caller Identity
//!
//! Authentication is performed by an upstream identity layer which forwards
//! the authenticated principal in the `x-principal-id` header. Handlers take
//! the [`Caller`] extractor; requests without the header are rejected with
//! `401`.
//!
//! ## Capabilities
//!
//! - Registry mutations require the [`Authority`] of the registry's
//!   [`ViewerKind`]
//! - Vault mutations require ownership, checked in the ledger
//! - Viewer operations require registry membership, checked in the ledger

pub mod authority;
pub mod caller;
pub mod error;
pub mod roles;

pub use authority::Authority;
pub use caller::{Caller, PRINCIPAL_HEADER};
pub use error::AuthError;
pub use roles::ViewerKind;
