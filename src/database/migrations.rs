//! Declarative migrations: the target schema is materialized in a scratch
//! in-memory database and the live database is brought in line with it.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite, SqliteConnection};
use tracing::{info, instrument, warn};

use crate::error::AppError;

static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"--[^\n]*(\n|$)").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r" *([(),]) *").unwrap());
static QUOTED_IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r#""(\w+)""#).unwrap());

/// Canonical form of a CREATE statement, so cosmetic differences do not
/// register as schema changes.
pub fn normalize_sql(sql: &str) -> String {
    let sql = COMMENT.replace_all(sql, " ");
    let sql = WHITESPACE.replace_all(&sql, " ");
    let sql = PUNCTUATION.replace_all(&sql, "$1");
    let sql = QUOTED_IDENT.replace_all(&sql, "$1");
    sql.trim().to_string()
}

#[derive(Debug, Clone)]
struct TableDef {
    sql: String,
    columns: Vec<String>,
}

#[derive(Debug, Default)]
struct SchemaSnapshot {
    tables: BTreeMap<String, TableDef>,
    indices: BTreeMap<String, String>,
    user_version: i64,
}

impl SchemaSnapshot {
    async fn capture(conn: &mut SqliteConnection) -> Result<Self, AppError> {
        let mut snapshot = SchemaSnapshot {
            indices: read_indices(conn).await?,
            ..Default::default()
        };

        let rows = sqlx::query(
            "SELECT name, sql FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_all(&mut *conn)
        .await?;

        for row in rows {
            let name: String = row.get(0);
            let sql: String = row.get(1);
            let columns = read_columns(conn, &name).await?;
            snapshot.tables.insert(name, TableDef { sql, columns });
        }

        snapshot.user_version = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&mut *conn)
            .await?;

        Ok(snapshot)
    }
}

async fn read_indices(conn: &mut SqliteConnection) -> Result<BTreeMap<String, String>, AppError> {
    let rows = sqlx::query(
        "SELECT name, sql FROM sqlite_master WHERE type = 'index' AND sql IS NOT NULL",
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.get::<String, _>(0), row.get::<String, _>(1)))
        .collect())
}

async fn read_columns(conn: &mut SqliteConnection, table: &str) -> Result<Vec<String>, AppError> {
    let rows = sqlx::query(&format!("PRAGMA table_info(\"{}\")", table))
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows.into_iter().map(|row| row.get::<String, _>(1)).collect())
}

/// A table whose definition changed and will be rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRebuild {
    pub name: String,
    pub kept_columns: Vec<String>,
    pub removed_columns: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangesNeeded {
    pub new_tables: Vec<String>,
    pub removed_tables: Vec<String>,
    pub modified_tables: Vec<TableRebuild>,
    pub new_indices: Vec<String>,
    pub removed_indices: Vec<String>,
    pub modified_indices: Vec<String>,
    pub user_version: Option<i64>,
}

impl ChangesNeeded {
    fn between(current: &SchemaSnapshot, target: &SchemaSnapshot) -> Self {
        let mut changes = ChangesNeeded::default();

        for (name, target_table) in &target.tables {
            match current.tables.get(name) {
                None => changes.new_tables.push(name.clone()),
                Some(current_table)
                    if normalize_sql(&current_table.sql) != normalize_sql(&target_table.sql) =>
                {
                    let wanted: BTreeSet<&String> = target_table.columns.iter().collect();
                    let (kept, removed): (Vec<String>, Vec<String>) = current_table
                        .columns
                        .iter()
                        .cloned()
                        .partition(|column| wanted.contains(column));
                    changes.modified_tables.push(TableRebuild {
                        name: name.clone(),
                        kept_columns: kept,
                        removed_columns: removed,
                    });
                }
                Some(_) => {}
            }
        }
        changes.removed_tables = current
            .tables
            .keys()
            .filter(|name| !target.tables.contains_key(*name))
            .cloned()
            .collect();

        for (name, target_sql) in &target.indices {
            match current.indices.get(name) {
                None => changes.new_indices.push(name.clone()),
                Some(current_sql) if normalize_sql(current_sql) != normalize_sql(target_sql) => {
                    changes.modified_indices.push(name.clone())
                }
                Some(_) => {}
            }
        }
        changes.removed_indices = current
            .indices
            .keys()
            .filter(|name| !target.indices.contains_key(*name))
            .cloned()
            .collect();

        if current.user_version != target.user_version {
            changes.user_version = Some(target.user_version);
        }

        changes
    }

    pub fn has_any_changes(&self) -> bool {
        *self != ChangesNeeded::default()
    }

    /// Human-readable list of changes that would lose data.
    pub fn destructive_changes(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .removed_tables
            .iter()
            .map(|t| format!("Table removed: {}", t))
            .collect();
        for table in &self.modified_tables {
            for column in &table.removed_columns {
                out.push(format!("Column removed from table {}: {}", table.name, column));
            }
        }
        out.extend(
            self.removed_indices
                .iter()
                .map(|i| format!("Index removed: {}", i)),
        );
        out
    }
}

async fn pristine_snapshot(target_schema: &str) -> Result<SchemaSnapshot, AppError> {
    let pristine = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    let mut conn = pristine.acquire().await?;

    sqlx::Executor::execute(&mut *conn, sqlx::raw_sql(target_schema))
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create pristine schema: {}", e)))?;

    SchemaSnapshot::capture(&mut conn).await
}

/// Reports what migrating `pool` to `target_schema` would change, without
/// touching it.
#[instrument(skip_all)]
pub async fn get_schema_changes(
    pool: &Pool<Sqlite>,
    target_schema: &str,
) -> Result<ChangesNeeded, AppError> {
    let target = pristine_snapshot(target_schema).await?;
    let mut conn = pool.acquire().await?;
    let current = SchemaSnapshot::capture(&mut conn).await?;
    Ok(ChangesNeeded::between(&current, &target))
}

/// Brings the live database in line with `target_schema` inside a single
/// transaction. Returns whether anything changed.
#[instrument(skip(pool, target_schema))]
pub async fn migrate_database_declaratively(
    pool: &Pool<Sqlite>,
    target_schema: &str,
    allow_destructive: bool,
) -> Result<bool, AppError> {
    info!("Starting declarative database migration");

    let target = pristine_snapshot(target_schema).await?;

    let mut tx = pool.begin().await?;
    sqlx::query("PRAGMA defer_foreign_keys = TRUE")
        .execute(&mut *tx)
        .await?;

    let current = SchemaSnapshot::capture(&mut tx).await?;
    let changes = ChangesNeeded::between(&current, &target);

    if !changes.has_any_changes() {
        tx.commit().await?;
        info!("No schema changes needed");
        return Ok(false);
    }

    let destructive = changes.destructive_changes();
    if !destructive.is_empty() && !allow_destructive {
        warn!(changes = ?destructive, "Refusing destructive migration");
        return Err(AppError::Internal(format!(
            "Migration would make destructive changes {:?}; set ALLOW_DESTRUCTIVE_MIGRATIONS=true to permit them",
            destructive
        )));
    }

    let mut applied = 0u32;

    for name in &changes.new_tables {
        apply(&mut tx, &format!("Create table {}", name), &target.tables[name].sql).await?;
        applied += 1;
    }

    for rebuild in &changes.modified_tables {
        rebuild_table(&mut tx, rebuild, &target.tables[&rebuild.name].sql).await?;
        applied += 1;
    }

    for name in &changes.removed_tables {
        apply(&mut tx, &format!("Drop table {}", name), &format!("DROP TABLE \"{}\"", name))
            .await?;
        applied += 1;
    }

    // Rebuilt tables lost their indices, so compare against what is there now.
    let live_indices = read_indices(&mut tx).await?;
    for name in live_indices.keys() {
        if !target.indices.contains_key(name) {
            apply(&mut tx, &format!("Drop index {}", name), &format!("DROP INDEX \"{}\"", name))
                .await?;
            applied += 1;
        }
    }
    for (name, sql) in &target.indices {
        match live_indices.get(name) {
            Some(live) if normalize_sql(live) == normalize_sql(sql) => {}
            Some(_) => {
                apply(&mut tx, &format!("Drop changed index {}", name), &format!("DROP INDEX \"{}\"", name))
                    .await?;
                apply(&mut tx, &format!("Recreate index {}", name), sql).await?;
                applied += 1;
            }
            None => {
                apply(&mut tx, &format!("Create index {}", name), sql).await?;
                applied += 1;
            }
        }
    }

    if let Some(version) = changes.user_version {
        apply(
            &mut tx,
            &format!("Set user_version to {}", version),
            &format!("PRAGMA user_version = {}", version),
        )
        .await?;
    }

    tx.commit().await?;

    if applied > 0 {
        info!("Running VACUUM after migration");
        sqlx::query("VACUUM").execute(pool).await?;
    }

    info!("Migration completed. Schema changes made: {}", applied);
    Ok(true)
}

async fn rebuild_table(
    conn: &mut SqliteConnection,
    rebuild: &TableRebuild,
    target_sql: &str,
) -> Result<(), AppError> {
    let name = &rebuild.name;
    let temp_name = format!("{}_migration_new", name);
    let temp_sql = target_sql.replacen(
        &format!("CREATE TABLE {}", name),
        &format!("CREATE TABLE {}", temp_name),
        1,
    );

    apply(conn, &format!("Create replacement for {}", name), &temp_sql).await?;

    if !rebuild.kept_columns.is_empty() {
        let columns = rebuild
            .kept_columns
            .iter()
            .map(|c| format!("\"{}\"", c))
            .collect::<Vec<_>>()
            .join(", ");
        apply(
            conn,
            &format!("Copy rows into new {}", name),
            &format!(
                "INSERT INTO {} ({}) SELECT {} FROM {}",
                temp_name, columns, columns, name
            ),
        )
        .await?;
    }

    apply(conn, &format!("Drop old {}", name), &format!("DROP TABLE {}", name)).await?;
    apply(
        conn,
        &format!("Rename replacement to {}", name),
        &format!("ALTER TABLE {} RENAME TO {}", temp_name, name),
    )
    .await
}

async fn apply(conn: &mut SqliteConnection, description: &str, sql: &str) -> Result<(), AppError> {
    info!("Database migration: {} with SQL:\n{}", description, sql);
    sqlx::query(sql).execute(&mut *conn).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_sql_ignores_formatting() {
        let a = "CREATE TABLE t (\n    id INTEGER PRIMARY KEY, -- key\n    \"name\" TEXT\n)";
        let b = "CREATE TABLE t(id INTEGER PRIMARY KEY,name TEXT)";
        assert_eq!(normalize_sql(a), normalize_sql(b));
    }

    #[test]
    fn diff_separates_kept_and_removed_columns() {
        let mut current = SchemaSnapshot::default();
        current.tables.insert(
            "t".to_string(),
            TableDef {
                sql: "CREATE TABLE t (a INTEGER, b TEXT)".to_string(),
                columns: vec!["a".to_string(), "b".to_string()],
            },
        );
        current
            .indices
            .insert("old_idx".to_string(), "CREATE INDEX old_idx ON t (b)".to_string());

        let mut target = SchemaSnapshot::default();
        target.tables.insert(
            "t".to_string(),
            TableDef {
                sql: "CREATE TABLE t (a INTEGER, c TEXT)".to_string(),
                columns: vec!["a".to_string(), "c".to_string()],
            },
        );
        target.user_version = 2;

        let changes = ChangesNeeded::between(&current, &target);
        assert_eq!(
            changes.modified_tables,
            vec![TableRebuild {
                name: "t".to_string(),
                kept_columns: vec!["a".to_string()],
                removed_columns: vec!["b".to_string()],
            }]
        );
        assert_eq!(changes.removed_indices, vec!["old_idx".to_string()]);
        assert_eq!(changes.user_version, Some(2));
        assert_eq!(
            changes.destructive_changes(),
            vec![
                "Column removed from table t: b".to_string(),
                "Index removed: old_idx".to_string()
            ]
        );
    }
}
