use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use uuid::Uuid;

use crate::Error;

/// Hashes a password with Argon2 and a random salt. The result is a PHC string, that embeds the
/// salt and the parameters.
pub fn hash_password(password: &str) -> Result<String, Error> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes()).map_err(hashing_error)?;
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(hashing_error)?
        .to_string())
}

/// Checks a password against a hash created by [hash_password].
pub fn verify_password(password: &str, hash: &str) -> Result<bool, Error> {
    let hash = PasswordHash::new(hash).map_err(hashing_error)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &hash)
        .is_ok())
}

fn hashing_error(error: argon2::password_hash::Error) -> Error {
    Error::Hashing(error.to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hashed_password_can_be_verified() -> Result<(), Error> {
        let hash = hash_password("secret123")?;

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("secret123", &hash)?);
        assert!(!verify_password("secret124", &hash)?);
        Ok(())
    }

    #[test]
    fn same_password_gives_different_hashes() -> Result<(), Error> {
        assert_ne!(hash_password("secret123")?, hash_password("secret123")?);
        Ok(())
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(matches!(
            verify_password("secret123", "not a hash"),
            Err(Error::Hashing(_))
        ));
    }
}
