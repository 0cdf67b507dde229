pub mod auth;
mod role;
mod sqlite_user_store;
mod user_manager;
pub mod user_models;
mod user_store;

pub use auth::{AuthToken, AuthTokenValue, PasswordCredentials, PasswordHasherKind};
pub use role::{Capability, Role};
pub use sqlite_user_store::SqliteUserStore;
pub use user_manager::{UserManager, MIN_PASSWORD_LENGTH};
pub use user_models::{Account, AccountRecord, AccountsByRole, NewAccount};
pub use user_store::{UserAuthCredentialsStore, UserAuthTokenStore, UserStore};
