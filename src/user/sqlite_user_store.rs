use crate::sqlite_column;
use crate::sqlite_persistence::{
    open_versioned_db, Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
    DEFAULT_TIMESTAMP,
};
use crate::user::*;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};
use std::{
    path::Path,
    str::FromStr,
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tracing::debug;

use super::auth::PasswordHasherKind;

/// V 0
const USER_TABLE_V_0: Table = Table {
    name: "user",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("email", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "role",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'user'")
        ),
        sqlite_column!("phone", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[("idx_user_email", "email")],
};
const AUTH_TOKEN_TABLE_V_0: Table = Table {
    name: "auth_token",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "user",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("value", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    unique_constraints: &[],
    indices: &[("idx_auth_token_value", "value")],
};
const USER_PASSWORD_CREDENTIALS_V_0: Table = Table {
    name: "user_password_credentials",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            is_unique = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "user",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("salt", &SqlType::Text, non_null = true),
        sqlite_column!("hash", &SqlType::Text, non_null = true),
        sqlite_column!("hasher", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_tried", &SqlType::Integer),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    unique_constraints: &[],
    indices: &[],
};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        USER_TABLE_V_0,
        AUTH_TOKEN_TABLE_V_0,
        USER_PASSWORD_CREDENTIALS_V_0,
    ],
    migration: None,
}];

const ACCOUNT_COLUMNS: &str = "id, name, email, role, phone, created";

fn system_time_from_column(value: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(value.max(0) as u64)
}

fn unix_now() -> i64 {
    Utc::now().timestamp()
}

fn account_from_row(row: &Row) -> rusqlite::Result<Account> {
    let role_str: String = row.get(3)?;
    let role = Role::from_str(&role_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            Type::Text,
            format!("Invalid role {}", role_str).into(),
        )
    })?;
    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role,
        phone: row.get(4)?,
        created_at: DateTime::from_timestamp(row.get(5)?, 0).unwrap_or_default(),
    })
}

fn auth_token_from_row(row: &Row) -> rusqlite::Result<AuthToken> {
    Ok(AuthToken {
        user_id: row.get(0)?,
        value: AuthTokenValue(row.get(1)?),
        created: system_time_from_column(row.get(2)?),
        last_used: row
            .get::<_, Option<i64>>(3)?
            .map(system_time_from_column),
    })
}

#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned_db(db_path, VERSIONED_SCHEMAS)?;
        Ok(SqliteUserStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("User store connection lock poisoned"))
    }
}

impl UserStore for SqliteUserStore {
    fn create_account(&self, record: &AccountRecord) -> Result<usize> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO user (name, email, role, phone) VALUES (?1, ?2, ?3, ?4)",
            params![
                record.name,
                record.email.to_lowercase(),
                record.role.as_str(),
                record.phone
            ],
        )
        .with_context(|| format!("Failed to create account {}", record.email))?;
        Ok(conn.last_insert_rowid() as usize)
    }

    fn get_account(&self, user_id: usize) -> Result<Option<Account>> {
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                &format!("SELECT {} FROM user WHERE id = ?1", ACCOUNT_COLUMNS),
                params![user_id],
                account_from_row,
            )
            .optional()?)
    }

    fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                &format!("SELECT {} FROM user WHERE email = ?1", ACCOUNT_COLUMNS),
                params![email.trim().to_lowercase()],
                account_from_row,
            )
            .optional()?)
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM user ORDER BY id",
            ACCOUNT_COLUMNS
        ))?;
        let accounts = stmt
            .query_map([], account_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(accounts)
    }

    fn set_account_role(&self, user_id: usize, role: Role) -> Result<bool> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE user SET role = ?1 WHERE id = ?2",
            params![role.as_str(), user_id],
        )?;
        Ok(updated > 0)
    }

    fn delete_account(&self, user_id: usize) -> Result<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM user WHERE id = ?1", params![user_id])?;
        debug!("delete_account({}) removed {} rows", user_id, deleted);
        Ok(deleted > 0)
    }

    fn count_accounts_by_role(&self) -> Result<AccountsByRole> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT role, COUNT(*) FROM user GROUP BY role")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, usize>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut counts = AccountsByRole::default();
        for (role, count) in rows {
            match Role::from_str(&role) {
                Some(role) => counts.add(role, count),
                None => debug!("Ignoring {} accounts with unknown role {}", count, role),
            }
        }
        Ok(counts)
    }
}

impl UserAuthTokenStore for SqliteUserStore {
    fn get_user_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                "SELECT user_id, value, created, last_used FROM auth_token WHERE value = ?1",
                params![value.0],
                auth_token_from_row,
            )
            .optional()?)
    }

    fn delete_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let Some(existing) = self.get_user_auth_token(token)? else {
            return Ok(None);
        };
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM auth_token WHERE value = ?1",
            params![existing.value.0],
        )?;
        Ok(Some(existing))
    }

    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE auth_token SET last_used = ?1 WHERE value = ?2",
            params![unix_now(), token.0],
        )?;
        Ok(())
    }

    fn add_user_auth_token(&self, token: &AuthToken) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO auth_token (user_id, value) VALUES (?1, ?2)",
            params![token.user_id, token.value.0],
        )
        .with_context(|| format!("Failed to store auth token for user {}", token.user_id))?;
        Ok(())
    }

    fn get_all_user_auth_tokens(&self, user_id: usize) -> Result<Vec<AuthToken>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT user_id, value, created, last_used FROM auth_token WHERE user_id = ?1",
        )?;
        let tokens = stmt
            .query_map(params![user_id], auth_token_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tokens)
    }

    fn prune_unused_auth_tokens(&self, unused_for_days: u64) -> Result<usize> {
        let cutoff = unix_now() - (unused_for_days as i64) * 24 * 60 * 60;
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM auth_token WHERE COALESCE(last_used, created) < ?1",
            params![cutoff],
        )?;
        Ok(deleted)
    }
}

impl UserAuthCredentialsStore for SqliteUserStore {
    fn get_password_credentials(&self, user_id: usize) -> Result<Option<PasswordCredentials>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT user_id, salt, hash, hasher, created, last_tried, last_used
                 FROM user_password_credentials WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok((
                        row.get::<_, usize>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, Option<i64>>(5)?,
                        row.get::<_, Option<i64>>(6)?,
                    ))
                },
            )
            .optional()?;

        let Some((user_id, salt, hash, hasher, created, last_tried, last_used)) = row else {
            return Ok(None);
        };
        Ok(Some(PasswordCredentials {
            user_id,
            salt,
            hash,
            hasher: PasswordHasherKind::from_str(&hasher)?,
            created: system_time_from_column(created),
            last_tried: last_tried.map(system_time_from_column),
            last_used: last_used.map(system_time_from_column),
        }))
    }

    fn set_password_credentials(&self, credentials: &PasswordCredentials) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO user_password_credentials (user_id, salt, hash, hasher)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id) DO UPDATE SET
                salt = excluded.salt, hash = excluded.hash, hasher = excluded.hasher",
            params![
                credentials.user_id,
                credentials.salt,
                credentials.hash,
                credentials.hasher.to_string()
            ],
        )
        .with_context(|| format!("Failed to store password for user {}", credentials.user_id))?;
        Ok(())
    }

    fn record_password_attempt(&self, user_id: usize, succeeded: bool) -> Result<()> {
        let conn = self.lock()?;
        let now = unix_now();
        if succeeded {
            conn.execute(
                "UPDATE user_password_credentials SET last_tried = ?1, last_used = ?1 WHERE user_id = ?2",
                params![now, user_id],
            )?;
        } else {
            conn.execute(
                "UPDATE user_password_credentials SET last_tried = ?1 WHERE user_id = ?2",
                params![now, user_id],
            )?;
        }
        Ok(())
    }
}
