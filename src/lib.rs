// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Patient Vault - consent-based key distribution for encrypted medical records
//!
//! Patients keep their records encrypted under a per-patient content key.
//! Doctors and insurance companies receive that key, wrapped for their own
//! public key, only after the patient grants a request. An authorization
//! ledger records who may read what; the records themselves live in an
//! external content-addressed store.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Caller identity and registry authority
//! - `client` - Patient and viewer protocol flows
//! - `content_store` - Content-addressed blob store interface
//! - `crypto` - Content keys, keypairs and key wrapping
//! - `custodian` - PIN-gated private key custody
//! - `ledger` - Authorization ledger (redb)
//! - `records` - Record schema and anonymization

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod content_store;
pub mod crypto;
pub mod custodian;
pub mod error;
pub mod ledger;
pub mod models;
pub mod records;
pub mod state;
