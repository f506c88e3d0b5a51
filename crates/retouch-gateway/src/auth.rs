// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Optional password gate for generation requests.
//!
//! When a password is configured, clients send the SHA-256 hex digest of it
//! alongside each generation request. The server never sees or stores the
//! plaintext after startup. This is an access gate for a single-user
//! playground, not an account system.

use retouch_core::RetouchError;
use sha2::{Digest, Sha256};

/// SHA-256 hex digest of a string.
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Verifies client-supplied password digests against the configured password.
#[derive(Clone)]
pub struct PasswordGate {
    digest: Option<String>,
}

impl PasswordGate {
    /// Build a gate from the configured plaintext password, if any.
    pub fn new(password: Option<&str>) -> Self {
        Self {
            digest: password.map(sha256_hex),
        }
    }

    /// Whether requests must carry a password digest.
    pub fn enabled(&self) -> bool {
        self.digest.is_some()
    }

    /// Check a client-supplied digest. Always passes when no password is
    /// configured.
    pub fn verify(&self, supplied: Option<&str>) -> Result<(), RetouchError> {
        let Some(expected) = &self.digest else {
            return Ok(());
        };
        match supplied {
            Some(hash) if hash.eq_ignore_ascii_case(expected) => Ok(()),
            Some(_) => Err(RetouchError::Unauthorized(
                "invalid password".to_string(),
            )),
            None => Err(RetouchError::Unauthorized(
                "password required".to_string(),
            )),
        }
    }
}

impl std::fmt::Debug for PasswordGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordGate")
            .field("digest", &self.digest.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}
