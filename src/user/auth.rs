//! Credentials and session tokens

use anyhow::{bail, Result};

use rand::Rng;
use rand_distr::Alphanumeric;
use serde::{Deserialize, Serialize};

use std::str::FromStr;
use std::time::SystemTime;

const AUTH_TOKEN_LENGTH: usize = 64;

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub struct AuthTokenValue(pub String);

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct AuthToken {
    pub user_id: usize,
    pub created: SystemTime,
    pub last_used: Option<SystemTime>,
    pub value: AuthTokenValue,
}

impl AuthTokenValue {
    pub fn generate() -> AuthTokenValue {
        let value: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(AUTH_TOKEN_LENGTH)
            .map(char::from)
            .collect();
        AuthTokenValue(value)
    }
}

mod argon2_hashing {
    use anyhow::{anyhow, Result};
    use argon2::{
        password_hash::{
            rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        },
        Argon2,
    };

    pub fn generate_b64_salt() -> String {
        SaltString::generate(&mut OsRng).to_string()
    }

    pub fn hash(plain: &[u8], b64_salt: &str) -> Result<String> {
        let salt = SaltString::from_b64(b64_salt).map_err(|err| anyhow!("{}", err))?;
        Ok(Argon2::default()
            .hash_password(plain, &salt)
            .map_err(|err| anyhow!("{}", err))?
            .to_string())
    }

    pub fn verify(plain: &[u8], target_hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(target_hash).map_err(|err| anyhow!("{}", err))?;
        Ok(Argon2::default().verify_password(plain, &parsed).is_ok())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum PasswordHasherKind {
    Argon2,
}

impl FromStr for PasswordHasherKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "argon2" => Ok(PasswordHasherKind::Argon2),
            _ => bail!("Unknown hasher {}", s),
        }
    }
}

impl std::fmt::Display for PasswordHasherKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PasswordHasherKind::Argon2 => f.write_str("argon2"),
        }
    }
}

impl PasswordHasherKind {
    pub fn generate_b64_salt(&self) -> String {
        match self {
            PasswordHasherKind::Argon2 => argon2_hashing::generate_b64_salt(),
        }
    }

    pub fn hash(&self, plain: &[u8], b64_salt: &str) -> Result<String> {
        match self {
            PasswordHasherKind::Argon2 => argon2_hashing::hash(plain, b64_salt),
        }
    }

    pub fn verify(&self, plain: &str, target_hash: &str) -> Result<bool> {
        match self {
            PasswordHasherKind::Argon2 => argon2_hashing::verify(plain.as_bytes(), target_hash),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct PasswordCredentials {
    pub user_id: usize,
    pub salt: String,
    pub hash: String,
    pub hasher: PasswordHasherKind,

    pub created: SystemTime,
    pub last_tried: Option<SystemTime>,
    pub last_used: Option<SystemTime>,
}

impl PasswordCredentials {
    pub fn matches(&self, plain: &str) -> Result<bool> {
        self.hasher.verify(plain, &self.hash)
    }
}
