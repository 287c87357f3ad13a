//! Password hashing and session token generation.
//!
//! Both primitives sit behind a trait so the login flow in
//! [`crate::core::session`] never touches a concrete algorithm.

use crate::errors::{Error, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString},
};
use std::fmt::{self, Write as _};

/// Random bytes in an issued session token
const TOKEN_BYTES: usize = 32;
/// Random bytes in a password salt
const SALT_BYTES: usize = 16;

/// Turns plain-text passwords into stored hashes and checks them.
pub trait PasswordHasher: Send + Sync {
    /// Hashes `password` into a self-describing string suitable for storage.
    fn hash(&self, password: &str) -> Result<String>;

    /// Whether `password` matches a hash produced by [`PasswordHasher::hash`].
    /// Malformed hashes never match.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Produces opaque bearer tokens for new sessions.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self) -> Result<String>;
}

/// Argon2id hasher emitting PHC strings
#[derive(Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argon2Hasher").finish_non_exhaustive()
    }
}

impl Argon2Hasher {
    /// Hasher with explicit cost parameters (memory in KiB, iterations, lanes).
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self> {
        let params = Params::new(m_cost, t_cost, p_cost, None).map_err(|e| Error::Credential {
            message: format!("Invalid Argon2 parameters: {e}"),
        })?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String> {
        let salt_bytes: [u8; SALT_BYTES] = rand::random();
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| Error::Credential {
            message: format!("Failed to encode salt: {e}"),
        })?;
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| Error::Credential {
                message: format!("Failed to hash password: {e}"),
            })
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        PasswordHash::new(hash).is_ok_and(|parsed| {
            self.argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
    }
}

/// Issues 256-bit random tokens, hex encoded
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokenIssuer;

impl TokenIssuer for RandomTokenIssuer {
    fn issue(&self) -> Result<String> {
        let bytes: [u8; TOKEN_BYTES] = rand::random();
        let mut token = String::with_capacity(TOKEN_BYTES * 2);
        for byte in bytes {
            write!(token, "{byte:02x}").map_err(|e| Error::Credential {
                message: format!("Failed to encode token: {e}"),
            })?;
        }
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::test_hasher;

    #[test]
    fn test_hash_and_verify() -> Result<()> {
        let hasher = test_hasher()?;
        let hash = hasher.hash("s3creta")?;

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("s3creta", &hash));
        assert!(!hasher.verify("otra", &hash));
        assert!(!hasher.verify("s3creta", "not-a-hash"));
        Ok(())
    }

    #[test]
    fn test_hashes_are_salted() -> Result<()> {
        let hasher = test_hasher()?;
        assert_ne!(hasher.hash("s3creta")?, hasher.hash("s3creta")?);
        Ok(())
    }

    #[test]
    fn test_issued_tokens_are_distinct_hex() -> Result<()> {
        let first = RandomTokenIssuer.issue()?;
        let second = RandomTokenIssuer.issue()?;

        assert_eq!(first.len(), TOKEN_BYTES * 2);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
        Ok(())
    }
}
