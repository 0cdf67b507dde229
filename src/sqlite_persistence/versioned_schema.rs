use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OpenFlags};
use std::path::Path;
use tracing::info;

pub const DEFAULT_TIMESTAMP: &str = "(cast(strftime('%s','now') as int))";

/// Offset added to every schema version written to `PRAGMA user_version`, so
/// that a database created by something else is never mistaken for ours.
pub const BASE_DB_VERSION: usize = 99999;

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                is_unique: false,
                default_value: None,
                foreign_key: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
}

impl SqlType {
    fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
        }
    }

    fn from_sql(s: &str) -> Option<&'static SqlType> {
        match s {
            "TEXT" => Some(&SqlType::Text),
            "INTEGER" => Some(&SqlType::Integer),
            "REAL" => Some(&SqlType::Real),
            _ => None,
        }
    }
}

#[allow(unused)]
pub enum ForeignKeyOnChange {
    NoAction,
    Restrict,
    SetNull,
    Cascade,
}

impl ForeignKeyOnChange {
    fn as_sql(&self) -> &'static str {
        match self {
            ForeignKeyOnChange::NoAction => "NO ACTION",
            ForeignKeyOnChange::Restrict => "RESTRICT",
            ForeignKeyOnChange::SetNull => "SET NULL",
            ForeignKeyOnChange::Cascade => "CASCADE",
        }
    }
}

pub struct ForeignKey {
    pub foreign_table: &'static str,
    pub foreign_column: &'static str,
    pub on_delete: ForeignKeyOnChange,
}

pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub is_unique: bool,
    pub default_value: Option<&'static str>,
    pub foreign_key: Option<&'static ForeignKey>,
}

impl Column {
    fn definition(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type.as_sql());
        if self.is_primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if self.non_null {
            sql.push_str(" NOT NULL");
        }
        if self.is_unique {
            sql.push_str(" UNIQUE");
        }
        if let Some(default_value) = self.default_value {
            sql.push_str(&format!(" DEFAULT {}", default_value));
        }
        if let Some(fk) = self.foreign_key {
            sql.push_str(&format!(
                " REFERENCES {}({}) ON DELETE {}",
                fk.foreign_table,
                fk.foreign_column,
                fk.on_delete.as_sql()
            ));
        }
        sql
    }
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub indices: &'static [(&'static str, &'static str)],
    pub unique_constraints: &'static [&'static [&'static str]],
}

/// A column as reported by `PRAGMA table_info`.
struct ActualColumn {
    name: String,
    sql_type: String,
    non_null: bool,
    default_value: Option<String>,
    is_primary_key: bool,
}

fn strip_parentheses(s: &str) -> &str {
    s.strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(s)
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        let mut definitions: Vec<String> = self.columns.iter().map(Column::definition).collect();
        for constraint in self.unique_constraints {
            definitions.push(format!("UNIQUE ({})", constraint.join(", ")));
        }
        conn.execute(
            &format!("CREATE TABLE {} ({});", self.name, definitions.join(", ")),
            params![],
        )
        .with_context(|| format!("Failed to create table {}", self.name))?;

        for (index_name, column_name) in self.indices {
            conn.execute(
                &format!("CREATE INDEX {} ON {}({});", index_name, self.name, column_name),
                params![],
            )?;
        }
        Ok(())
    }

    fn read_columns(&self, conn: &Connection) -> Result<Vec<ActualColumn>> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", self.name))?;
        let columns = stmt
            .query_map(params![], |row| {
                Ok(ActualColumn {
                    name: row.get(1)?,
                    sql_type: row.get(2)?,
                    non_null: row.get::<_, i32>(3)? == 1,
                    default_value: row.get(4)?,
                    is_primary_key: row.get::<_, i32>(5)? == 1,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        let actual_columns = self.read_columns(conn)?;
        if actual_columns.len() != self.columns.len() {
            bail!(
                "Table {} has columns [{}], expected [{}]",
                self.name,
                actual_columns
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                self.columns
                    .iter()
                    .map(|c| c.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        for (actual, expected) in actual_columns.iter().zip(self.columns.iter()) {
            if actual.name != expected.name {
                bail!(
                    "Table {} column name mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    actual.name
                );
            }
            if SqlType::from_sql(&actual.sql_type) != Some(expected.sql_type) {
                bail!(
                    "Table {} column {} type mismatch: expected {:?}, got {}",
                    self.name,
                    expected.name,
                    expected.sql_type,
                    actual.sql_type
                );
            }
            if actual.non_null != expected.non_null {
                bail!(
                    "Table {} column {} non-null mismatch: expected {}",
                    self.name,
                    expected.name,
                    expected.non_null
                );
            }
            if actual.is_primary_key != expected.is_primary_key {
                bail!(
                    "Table {} column {} primary key mismatch: expected {}",
                    self.name,
                    expected.name,
                    expected.is_primary_key
                );
            }
            if actual.default_value.as_deref().map(strip_parentheses)
                != expected.default_value.map(strip_parentheses)
            {
                bail!(
                    "Table {} column {} default value mismatch: expected {:?}, got {:?}",
                    self.name,
                    expected.name,
                    expected.default_value,
                    actual.default_value
                );
            }
        }

        for (index_name, _) in self.indices {
            let exists = conn
                .query_row(
                    "SELECT 1 FROM sqlite_master WHERE type = 'index' AND name = ?1 AND tbl_name = ?2",
                    params![index_name, self.name],
                    |_| Ok(()),
                )
                .is_ok();
            if !exists {
                bail!("Table {} is missing index '{}'", self.name, index_name);
            }
        }

        self.validate_foreign_keys(conn)
    }

    fn validate_foreign_keys(&self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare(&format!("PRAGMA foreign_key_list({})", self.name))?;
        // (from, table, to, on_delete)
        let actual_fks = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        for column in self.columns {
            let Some(expected) = column.foreign_key else {
                continue;
            };
            let found = actual_fks.iter().any(|(from, table, to, on_delete)| {
                from == column.name
                    && table == expected.foreign_table
                    && to == expected.foreign_column
                    && on_delete == expected.on_delete.as_sql()
            });
            if !found {
                bail!(
                    "Table {} column {} is missing foreign key REFERENCES {}({}) ON DELETE {}",
                    self.name,
                    column.name,
                    expected.foreign_table,
                    expected.foreign_column,
                    expected.on_delete.as_sql()
                );
            }
        }
        Ok(())
    }
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

impl VersionedSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.create(conn)?;
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + self.version),
            [],
        )?;
        Ok(())
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.validate(conn)?;
        }
        Ok(())
    }
}

/// Opens the database at `db_path`, creating it with the latest schema when it
/// does not exist, otherwise validating the recorded version and running any
/// pending migrations.
pub fn open_versioned_db<P: AsRef<Path>>(
    db_path: P,
    schemas: &'static [VersionedSchema],
) -> Result<Connection> {
    let db_path = db_path.as_ref();
    let latest = schemas.last().context("No schema versions defined")?;

    let conn = if db_path.exists() {
        Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open database {:?}", db_path))?
    } else {
        info!("Creating database {:?}", db_path);
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to create database {:?}", db_path))?;
        latest.create(&conn)?;
        conn
    };
    conn.execute("PRAGMA foreign_keys = ON;", params![])?;

    let db_version = conn
        .query_row("PRAGMA user_version;", [], |row| row.get::<_, i64>(0))
        .context("Failed to read database version")?
        - BASE_DB_VERSION as i64;
    if db_version < 0 {
        bail!(
            "Database {:?} does not carry the base version {}",
            db_path,
            BASE_DB_VERSION
        );
    }
    let version = db_version as usize;
    let schema = schemas
        .get(version)
        .with_context(|| format!("Database version {} is too new", version))?;
    schema.validate(&conn)?;

    migrate_if_needed(&conn, schemas, version)?;
    Ok(conn)
}

fn migrate_if_needed(
    conn: &Connection,
    schemas: &'static [VersionedSchema],
    version: usize,
) -> Result<()> {
    let mut current = version;
    for schema in schemas.iter().skip(version + 1) {
        if let Some(migration) = schema.migration {
            info!("Migrating db from version {} to {}", current, schema.version);
            migration(conn)?;
        }
        current = schema.version;
    }
    if current != version {
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + current),
            [],
        )?;
    }
    Ok(())
}
