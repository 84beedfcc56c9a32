// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Key Crypto
//!
//! Pure, stateless primitives run by callers off the ledger:
//!
//! - [`ContentKey`]: per-patient symmetric key, AES-GCM record encryption
//! - [`Keypair`]: secp256k1 actor keys, PEM encoded
//! - [`wrap_key`] / [`unwrap_key`]: seal a content key for one recipient
//!
//! Nothing here touches shared state, so a failed decryption never has a
//! side effect.

pub mod content_key;
pub mod keypair;
pub mod wrap;

pub use content_key::{ContentBlob, ContentKey, KeyLength};
pub use keypair::{Keypair, PrivateKey, PublicKey};
pub use wrap::{unwrap_key, wrap_key};
