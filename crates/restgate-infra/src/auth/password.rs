//! Argon2id password hashing. Hashes are stored as PHC strings, so the
//! parameters travel with each hash and old hashes keep verifying after a
//! parameter change.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use restgate_core::ports::{AuthError, PasswordService};

/// [`PasswordService`] backed by Argon2id.
pub struct Argon2PasswordService {
    argon2: Argon2<'static>,
}

impl Argon2PasswordService {
    /// Argon2id with the crate's recommended parameters.
    pub fn new() -> Self {
        Self::with_params(Params::default())
    }

    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }
}

impl Default for Argon2PasswordService {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordService for Argon2PasswordService {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashingError(e.to_string()))?;

        Ok(hash.to_string())
    }

    /// A wrong password is `Ok(false)`; an unreadable stored hash is an error.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let stored = PasswordHash::new(hash)
            .map_err(|e| AuthError::HashingError(format!("stored hash: {e}")))?;

        match self.argon2.verify_password(password.as_bytes(), &stored) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::HashingError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashes_are_salted() {
        let service = Argon2PasswordService::new();

        let first = service.hash("test").unwrap();
        let second = service.hash("test").unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("$argon2"));
    }

    #[test]
    fn test_verify_rejects_non_phc_hash() {
        let service = Argon2PasswordService::new();

        assert!(matches!(
            service.verify("test", "test"),
            Err(AuthError::HashingError(_))
        ));
    }

    #[test]
    fn test_hash_and_verify() {
        let service = Argon2PasswordService::new();
        let password = "secure_password_123";

        let hash = service.hash(password).unwrap();
        assert!(service.verify(password, &hash).unwrap());
        assert!(!service.verify("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_params_travel_with_the_hash() {
        let params = Params::new(8 * 1024, 1, 1, None).unwrap();
        let hash = Argon2PasswordService::with_params(params)
            .hash("test")
            .unwrap();

        assert!(hash.starts_with("$argon2id$v=19$m=8192,t=1,p=1$"));
        assert!(Argon2PasswordService::new().verify("test", &hash).unwrap());
    }
}
