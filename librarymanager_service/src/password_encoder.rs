use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use serde::Deserialize;

#[derive(thiserror::Error, Debug)]
pub enum PasswordEncoderError {
    #[error("Invalid hashing parameters {0}")]
    InvalidParams(argon2::Error),

    #[error("Failed to hash password {0}")]
    Hashing(argon2::password_hash::Error),
}

/// Cost factors of the Argon2id hash
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PasswordEncoderSettings {
    #[serde(default = "PasswordEncoderSettings::default_memory_cost_kib")]
    pub memory_cost_kib: u32,
    #[serde(default = "PasswordEncoderSettings::default_iterations")]
    pub iterations: u32,
    #[serde(default = "PasswordEncoderSettings::default_parallelism")]
    pub parallelism: u32,
}

impl PasswordEncoderSettings {
    fn default_memory_cost_kib() -> u32 {
        Params::DEFAULT_M_COST
    }

    fn default_iterations() -> u32 {
        Params::DEFAULT_T_COST
    }

    fn default_parallelism() -> u32 {
        Params::DEFAULT_P_COST
    }
}

impl Default for PasswordEncoderSettings {
    fn default() -> Self {
        Self {
            memory_cost_kib: Self::default_memory_cost_kib(),
            iterations: Self::default_iterations(),
            parallelism: Self::default_parallelism(),
        }
    }
}

/// One-way adaptive password hashing
#[derive(Clone)]
pub struct PasswordEncoder {
    argon2: Argon2<'static>,
}

impl PasswordEncoder {
    pub fn new(settings: &PasswordEncoderSettings) -> Result<Self, PasswordEncoderError> {
        let params = Params::new(
            settings.memory_cost_kib,
            settings.iterations,
            settings.parallelism,
            None,
        )
        .map_err(PasswordEncoderError::InvalidParams)?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hashes the password with a fresh salt, the result is a PHC string
    pub fn encode(&self, raw_password: &str) -> Result<String, PasswordEncoderError> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(self
            .argon2
            .hash_password(raw_password.as_bytes(), &salt)
            .map_err(PasswordEncoderError::Hashing)?
            .to_string())
    }

    /// False for a wrong password and for anything that is not a valid hash
    pub fn matches(&self, raw_password: &str, encoded_password: &str) -> bool {
        match PasswordHash::new(encoded_password) {
            Ok(parsed) => self
                .argon2
                .verify_password(raw_password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
pub(crate) fn cheap_password_encoder() -> PasswordEncoder {
    PasswordEncoder::new(&PasswordEncoderSettings {
        memory_cost_kib: Params::MIN_M_COST,
        iterations: 1,
        parallelism: 1,
    })
    .expect("Failed to create encoder")
}
