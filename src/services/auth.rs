//! Admin credential verification.

use crate::config::AdminSettings;

/// bcrypt cost used when hashing a configured plain password.
pub const HASH_COST: u32 = 10;

/// Result of a credential check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Granted,
    Denied,
}

/// Checks a username/password pair.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> AuthOutcome;
}

/// The single administrator from configuration.
pub struct ConfiguredAdmin {
    username: String,
    password_hash: String,
}

impl ConfiguredAdmin {
    /// Build from settings. A bcrypt hash is used as-is; anything else is hashed now.
    pub fn from_settings(admin: &AdminSettings) -> Result<Self, bcrypt::BcryptError> {
        Self::with_cost(admin, HASH_COST)
    }

    pub fn with_cost(admin: &AdminSettings, cost: u32) -> Result<Self, bcrypt::BcryptError> {
        let password_hash = if is_bcrypt_hash(&admin.password) {
            admin.password.clone()
        } else {
            for problem in password_weaknesses(&admin.password) {
                tracing::warn!("Admin password is weak: {}", problem);
            }
            bcrypt::hash(admin.password.as_bytes(), cost)?
        };

        Ok(Self {
            username: admin.username.clone(),
            password_hash,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl CredentialVerifier for ConfiguredAdmin {
    fn verify(&self, username: &str, password: &str) -> AuthOutcome {
        // Always run bcrypt so timing does not reveal a username mismatch.
        let password_ok = bcrypt::verify(password.as_bytes(), &self.password_hash).unwrap_or(false);
        if password_ok && username == self.username {
            AuthOutcome::Granted
        } else {
            AuthOutcome::Denied
        }
    }
}

/// True if the value looks like a modular-crypt bcrypt hash.
pub fn is_bcrypt_hash(value: &str) -> bool {
    value.len() == 60 && matches!(value.get(..4), Some("$2a$" | "$2b$" | "$2x$" | "$2y$"))
}

/// Reasons a password is considered weak (empty if acceptable).
pub fn password_weaknesses(password: &str) -> Vec<&'static str> {
    let mut problems = Vec::new();
    if password.chars().count() < 8 {
        problems.push("must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        problems.push("must contain an uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        problems.push("must contain a lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        problems.push("must contain a digit");
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin(password: &str) -> AdminSettings {
        AdminSettings {
            username: "admin".to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_plain_password_is_hashed() {
        let verifier = ConfiguredAdmin::with_cost(&admin("Tower2024"), 4).unwrap();
        assert_eq!(verifier.verify("admin", "Tower2024"), AuthOutcome::Granted);
        assert_eq!(verifier.verify("admin", "tower2024"), AuthOutcome::Denied);
        assert_eq!(verifier.verify("root", "Tower2024"), AuthOutcome::Denied);
    }

    #[test]
    fn test_existing_hash_used_as_is() {
        let hash = bcrypt::hash("Secret99", 4).unwrap();
        assert!(is_bcrypt_hash(&hash));

        let verifier = ConfiguredAdmin::with_cost(&admin(&hash), 4).unwrap();
        assert_eq!(verifier.verify("admin", "Secret99"), AuthOutcome::Granted);
        assert_eq!(verifier.verify("admin", &hash), AuthOutcome::Denied);
    }

    #[test]
    fn test_password_weaknesses() {
        assert_eq!(password_weaknesses("admin123").len(), 1);
        assert!(password_weaknesses("Tower2024").is_empty());
        assert_eq!(password_weaknesses("").len(), 4);
    }
}
