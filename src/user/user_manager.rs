use super::{
    auth::PasswordHasherKind, Account, AccountRecord, AccountsByRole, AuthToken, AuthTokenValue,
    NewAccount, PasswordCredentials, Role, UserStore,
};
use crate::error::{ServiceError, ServiceResult};
use anyhow::{bail, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::{sync::Arc, time::SystemTime};
use tracing::{debug, info};

pub const MIN_PASSWORD_LENGTH: usize = 6;

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Invalid email regex");
}

pub struct UserManager {
    user_store: Arc<dyn UserStore>,
}

impl UserManager {
    pub fn new(user_store: Arc<dyn UserStore>) -> Self {
        Self { user_store }
    }

    /// Self-service sign up. Only the `user` and `owner` roles can be picked.
    pub fn register(&self, new_account: NewAccount) -> ServiceResult<Account> {
        if !new_account.role.is_self_assignable() {
            return Err(ServiceError::forbidden(format!(
                "Cannot sign up with role {}",
                new_account.role
            )));
        }
        self.create_account(new_account)
    }

    /// Creates an account with any role, including admin.
    pub fn create_account(&self, new_account: NewAccount) -> ServiceResult<Account> {
        Self::validate_new_account(&new_account)?;

        let email = new_account.email.trim().to_lowercase();
        if self.user_store.get_account_by_email(&email)?.is_some() {
            return Err(ServiceError::conflict(format!(
                "Email {} is already registered",
                email
            )));
        }

        let user_id = self.user_store.create_account(&AccountRecord {
            name: new_account.name.trim().to_string(),
            email,
            role: new_account.role,
            phone: new_account
                .phone
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        })?;
        self.user_store
            .set_password_credentials(&Self::create_hashed_password(
                user_id,
                &new_account.password,
            )?)?;

        info!("Created account {} with role {}", user_id, new_account.role);
        self.user_store
            .get_account(user_id)?
            .ok_or(ServiceError::NotFound("Account"))
    }

    fn validate_new_account(new_account: &NewAccount) -> ServiceResult<()> {
        if new_account.name.trim().is_empty() {
            return Err(ServiceError::validation("Name cannot be empty"));
        }
        if !EMAIL_REGEX.is_match(new_account.email.trim()) {
            return Err(ServiceError::validation(format!(
                "Invalid email address {}",
                new_account.email
            )));
        }
        Self::validate_password(&new_account.password)
    }

    fn validate_password(password: &str) -> ServiceResult<()> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ServiceError::validation(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LENGTH
            )));
        }
        Ok(())
    }

    fn create_hashed_password(user_id: usize, password: &str) -> Result<PasswordCredentials> {
        let hasher = PasswordHasherKind::Argon2;
        let salt = hasher.generate_b64_salt();
        let hash = hasher.hash(password.as_bytes(), &salt)?;
        Ok(PasswordCredentials {
            user_id,
            salt,
            hash,
            hasher,
            created: SystemTime::now(),
            last_tried: None,
            last_used: None,
        })
    }

    /// Returns the account if the password matches, without issuing a token.
    pub fn check_password(&self, email: &str, password: &str) -> Result<Option<Account>> {
        let Some(account) = self.user_store.get_account_by_email(email)? else {
            return Ok(None);
        };
        let Some(credentials) = self.user_store.get_password_credentials(account.id)? else {
            return Ok(None);
        };
        let matches = credentials.matches(password)?;
        self.user_store
            .record_password_attempt(account.id, matches)?;
        Ok(matches.then_some(account))
    }

    /// Verifies the credentials and issues a new session token.
    pub fn login(&self, email: &str, password: &str) -> ServiceResult<(Account, AuthToken)> {
        let account = self
            .check_password(email, password)?
            .ok_or(ServiceError::InvalidCredentials)?;
        let token = self.generate_auth_token(account.id)?;
        debug!("Issued auth token for user {}", account.id);
        Ok((account, token))
    }

    fn generate_auth_token(&self, user_id: usize) -> Result<AuthToken> {
        let token = AuthToken {
            user_id,
            value: AuthTokenValue::generate(),
            created: SystemTime::now(),
            last_used: None,
        };
        self.user_store.add_user_auth_token(&token)?;
        Ok(token)
    }

    pub fn get_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        self.user_store.get_user_auth_token(value)
    }

    pub fn update_auth_token_last_used(&self, value: &AuthTokenValue) -> Result<()> {
        self.user_store
            .update_user_auth_token_last_used_timestamp(value)
    }

    pub fn delete_auth_token(&self, user_id: usize, value: &AuthTokenValue) -> Result<()> {
        let Some(token) = self.user_store.get_user_auth_token(value)? else {
            bail!("Auth token not found");
        };
        if token.user_id != user_id {
            bail!(
                "User {} tried to delete a token owned by user {}",
                user_id,
                token.user_id
            );
        }
        self.user_store.delete_user_auth_token(value)?;
        Ok(())
    }

    pub fn get_user_tokens(&self, user_id: usize) -> Result<Vec<AuthToken>> {
        self.user_store.get_all_user_auth_tokens(user_id)
    }

    pub fn prune_unused_auth_tokens(&self, unused_for_days: u64) -> Result<usize> {
        self.user_store.prune_unused_auth_tokens(unused_for_days)
    }

    pub fn get_account(&self, user_id: usize) -> Result<Option<Account>> {
        self.user_store.get_account(user_id)
    }

    pub fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.user_store.get_account_by_email(email)
    }

    pub fn list_accounts(&self) -> Result<Vec<Account>> {
        self.user_store.list_accounts()
    }

    pub fn count_accounts_by_role(&self) -> Result<AccountsByRole> {
        self.user_store.count_accounts_by_role()
    }

    pub fn set_role(&self, user_id: usize, role: Role) -> ServiceResult<Account> {
        if !self.user_store.set_account_role(user_id, role)? {
            return Err(ServiceError::NotFound("Account"));
        }
        self.user_store
            .get_account(user_id)?
            .ok_or(ServiceError::NotFound("Account"))
    }

    pub fn set_password(&self, user_id: usize, password: &str) -> ServiceResult<()> {
        Self::validate_password(password)?;
        if self.user_store.get_account(user_id)?.is_none() {
            return Err(ServiceError::NotFound("Account"));
        }
        self.user_store
            .set_password_credentials(&Self::create_hashed_password(user_id, password)?)?;
        Ok(())
    }

    pub fn delete_account(&self, user_id: usize) -> ServiceResult<()> {
        if !self.user_store.delete_account(user_id)? {
            return Err(ServiceError::NotFound("Account"));
        }
        info!("Deleted account {}", user_id);
        Ok(())
    }
}
