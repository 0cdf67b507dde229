use super::auth::{AuthToken, AuthTokenValue, PasswordCredentials};
use super::user_models::{Account, AccountRecord, AccountsByRole};
use super::Role;
use anyhow::Result;

pub trait UserAuthCredentialsStore: Send + Sync {
    /// Returns the password credentials of the given account.
    /// Returns Ok(None) if the account has no password set.
    /// Returns Err if there is a database error.
    fn get_password_credentials(&self, user_id: usize) -> Result<Option<PasswordCredentials>>;

    /// Inserts or replaces the password credentials of an account.
    fn set_password_credentials(&self, credentials: &PasswordCredentials) -> Result<()>;

    /// Records a login attempt against the password credentials.
    /// `last_tried` is always updated, `last_used` only when `succeeded`.
    fn record_password_attempt(&self, user_id: usize, succeeded: bool) -> Result<()>;
}

pub trait UserAuthTokenStore: Send + Sync {
    /// Returns an authentication token given its value.
    /// Returns Ok(None) if the token does not exist.
    /// Returns Err if there is a database error.
    fn get_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Deletes an auth token given the token value.
    /// Returns Ok(None) if the token does not exist.
    fn delete_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Updates an auth token with the latest timestamp.
    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()>;

    /// Adds a new auth token.
    /// Returns Err if the token value already exists.
    fn add_user_auth_token(&self, token: &AuthToken) -> Result<()>;

    /// Returns all authentication tokens of an account.
    fn get_all_user_auth_tokens(&self, user_id: usize) -> Result<Vec<AuthToken>>;

    /// Prunes auth tokens that haven't been used for the specified number of days.
    /// Tokens never used count from their creation time.
    /// Returns the number of tokens that were deleted.
    fn prune_unused_auth_tokens(&self, unused_for_days: u64) -> Result<usize>;
}

pub trait UserStore: UserAuthTokenStore + UserAuthCredentialsStore + Send + Sync {
    /// Creates a new account and returns its id.
    /// Returns Err if the email is already registered.
    fn create_account(&self, record: &AccountRecord) -> Result<usize>;

    /// Returns the account with the given id.
    /// Returns Ok(None) if the account does not exist.
    fn get_account(&self, user_id: usize) -> Result<Option<Account>>;

    /// Returns the account registered with the given email, compared case-insensitively.
    /// Returns Ok(None) if no account uses that email.
    fn get_account_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Returns all accounts ordered by id.
    fn list_accounts(&self) -> Result<Vec<Account>>;

    /// Changes the role of an account.
    /// Returns Ok(false) if the account does not exist.
    fn set_account_role(&self, user_id: usize, role: Role) -> Result<bool>;

    /// Deletes an account along with its tokens and credentials.
    /// Returns Ok(false) if the account does not exist.
    fn delete_account(&self, user_id: usize) -> Result<bool>;

    /// Returns how many accounts hold each role.
    fn count_accounts_by_role(&self) -> Result<AccountsByRole>;
}
