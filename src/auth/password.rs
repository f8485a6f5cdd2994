use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use tracing::{error, warn};

use crate::config::HashConfig;

/// Argon2id hasher with deployment-specific cost.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    // Verified against when the account is unknown so both login failures cost the same.
    decoy_hash: String,
}

impl CredentialHasher {
    pub fn new(cfg: &HashConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 params: {}", e))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let decoy: String = OsRng
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let mut hasher = Self {
            argon2,
            decoy_hash: String::new(),
        };
        hasher.decoy_hash = hasher.hash(&decoy)?;
        Ok(hasher)
    }

    pub fn hash(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// A digest that cannot be parsed never matches.
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "stored password hash is malformed");
                return false;
            }
        };
        self.argon2
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }

    /// Burns one verification against the decoy digest.
    pub fn verify_decoy(&self, plain: &str) {
        let _ = self.verify(plain, &self.decoy_hash);
    }
}

#[cfg(test)]
pub(crate) fn cheap_config() -> HashConfig {
    HashConfig {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    }
}
