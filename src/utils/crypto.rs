use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::error::Result;

pub fn hash_password(plain: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)?
        .to_string();
    Ok(hash)
}

/// Accepts argon2 PHC strings and the bcrypt hashes carried over from older accounts.
/// A stored hash that cannot be parsed never matches.
pub fn verify_password(plain: &str, hashed: &str) -> bool {
    if is_bcrypt(hashed) {
        return bcrypt::verify(plain, hashed).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "stored bcrypt hash is malformed");
            false
        });
    }
    match PasswordHash::new(hashed) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            tracing::warn!(error = %err, "stored password hash is malformed");
            false
        }
    }
}

fn is_bcrypt(hashed: &str) -> bool {
    ["$2a$", "$2b$", "$2y$"]
        .iter()
        .any(|prefix| hashed.starts_with(prefix))
}

/// Hex SHA-256, used to keep one-time tokens out of the database in clear text.
pub fn sha256_hex(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies_only_the_original() {
        let hash = hash_password("Candidate@123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Candidate@123", &hash));
        assert!(!verify_password("candidate@123", &hash));
    }

    #[test]
    fn legacy_bcrypt_hashes_still_verify() {
        let hash = "$2a$05$CCCCCCCCCCCCCCCCCCCCC.E5YPO9kmyuRGyh0XouQYb4YMJKvyOeW";
        assert!(verify_password("U*U", hash));
        assert!(!verify_password("U*V", hash));
        assert!(!verify_password("U*U", "$2b$05$truncated"));
    }

    #[test]
    fn malformed_hash_never_matches() {
        assert!(!verify_password("anything", "not-a-hash"));
    }

    #[test]
    fn sha256_is_stable_hex() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
