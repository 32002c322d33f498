use anyhow::anyhow;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::error;

/// Salted Argon2id digest in PHC string format; parameters are embedded in the output.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow!("hash password: {e}")
        })?
        .to_string();
    Ok(hash)
}

/// Recomputes with the parameters stored in `hash`; comparison is constant-time.
/// A hash that does not parse is an error, not a mismatch.
pub fn verify_password(hash: &str, plain: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow!("parse password hash: {e}")
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_accepts_same_plaintext() {
        for password in ["Secur3P@ssw0rd!", "x", "pässwörd with spaces"] {
            let hash = hash_password(password).expect("hashing should succeed");
            assert!(verify_password(&hash, password).expect("verify should succeed"));
        }
    }

    #[test]
    fn verify_rejects_other_plaintexts() {
        let hash = hash_password("correct-horse-battery-staple").expect("hashing should succeed");
        for wrong in ["correct-horse-battery-stapl", "Correct-horse-battery-staple", ""] {
            assert!(!verify_password(&hash, wrong).expect("verify should not error"));
        }
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("not-a-valid-hash", "anything").unwrap_err();
        assert!(err.to_string().contains("parse password hash"));
    }
}
