//! Password value object and the hashing service behind it.
//!
//! `Password` only ever holds a hash. Producing and checking hashes is the job
//! of a `PasswordHasher`; the production implementation is Argon2id with the
//! crate's default cost parameters.

use argon2::{
    password_hash::{
        rand_core::OsRng, Error as PhcError, PasswordHash, PasswordHasher as PhcHasher,
        PasswordVerifier, SaltString,
    },
    Argon2,
};

use crate::error::{DomainError, DomainResult};

/// Stored password hash.
///
/// Value object: immutable, compared by hash bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Password {
    hash: Vec<u8>,
}

// Don't expose hash in debug output (security)
impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Wrap an existing hash (freshly produced or loaded from storage).
    ///
    /// # Errors
    /// Returns a validation error if the hash is empty.
    pub fn from_hash(hash: impl Into<Vec<u8>>) -> DomainResult<Self> {
        let hash = hash.into();
        if hash.is_empty() {
            return Err(DomainError::validation("password is required"));
        }
        Ok(Self { hash })
    }

    /// Raw hash bytes, as passed to `PasswordHasher::verify`.
    pub fn hash(&self) -> &[u8] {
        &self.hash
    }
}

/// One-way password hashing.
///
/// `hash` must salt every call, so hashing the same plaintext twice yields
/// different outputs; `verify` must accept any output of `hash` for the same
/// plaintext. A mismatch is `Ok(false)`; only malformed input is an error.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &[u8]) -> DomainResult<Vec<u8>>;

    fn verify(&self, hash: &[u8], plaintext: &[u8]) -> DomainResult<bool>;
}

/// Argon2id hasher producing PHC-formatted hashes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl Argon2Hasher {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn argon2() -> Argon2<'static> {
        Argon2::default()
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plaintext: &[u8]) -> DomainResult<Vec<u8>> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Self::argon2()
            .hash_password(plaintext, &salt)
            .map_err(|e| DomainError::password(format!("hashing failed: {}", e)))?;
        Ok(hash.to_string().into_bytes())
    }

    fn verify(&self, hash: &[u8], plaintext: &[u8]) -> DomainResult<bool> {
        let encoded = std::str::from_utf8(hash)
            .map_err(|_| DomainError::password("hash is not valid UTF-8"))?;
        let parsed = PasswordHash::new(encoded)
            .map_err(|e| DomainError::password(format!("invalid hash format: {}", e)))?;

        match Self::argon2().verify_password(plaintext, &parsed) {
            Ok(()) => Ok(true),
            Err(PhcError::Password) => Ok(false),
            Err(e) => Err(DomainError::password(format!("verification failed: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let hasher = Argon2Hasher::new();
        let hash = hasher.hash(b"SecurePassword123!").unwrap();

        assert!(hasher.verify(&hash, b"SecurePassword123!").unwrap());
        assert!(!hasher.verify(&hash, b"WrongPassword123").unwrap());
    }

    #[test]
    fn test_same_password_different_salts() {
        let hasher = Argon2Hasher::new();
        let first = hasher.hash(b"SamePassword123").unwrap();
        let second = hasher.hash(b"SamePassword123").unwrap();

        // Different salts produce different hashes
        assert_ne!(first, second);
        // But both verify correctly
        assert!(hasher.verify(&first, b"SamePassword123").unwrap());
        assert!(hasher.verify(&second, b"SamePassword123").unwrap());
    }

    #[test]
    fn test_malformed_hash_is_error_not_panic() {
        let hasher = Argon2Hasher::new();

        assert!(matches!(
            hasher.verify(b"not-a-phc-string", b"whatever"),
            Err(DomainError::Password(_))
        ));
        assert!(hasher.verify(&[0xff, 0xfe], b"whatever").is_err());
    }

    #[test]
    fn test_password_from_empty_hash_rejected() {
        assert!(matches!(
            Password::from_hash(Vec::new()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_password_equality_by_hash_bytes() {
        let a = Password::from_hash(b"abc".to_vec()).unwrap();
        let b = Password::from_hash("abc").unwrap();
        let c = Password::from_hash("abd").unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_debug_redacts_hash() {
        let password = Password::from_hash("secret-hash").unwrap();
        let debug = format!("{:?}", password);

        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("secret-hash"));
    }
}
