//! # Schema Migrations
//!
//! An ordered, hash-verified, advisory-locked migration runner.
//!
//! Migrations are declared in code as `(name, sql, outside_tx)` records.
//! Each run iteration opens a transaction, takes a transaction-scoped
//! advisory lock on a fixed key so concurrent migrators serialize,
//! creates the bookkeeping table if needed, validates that every applied
//! row matches the in-memory list (by name and hash), then applies the
//! first unapplied migration and commits. The loop repeats until nothing
//! is left to apply.
//!
//! Hashes are `sha256` over whitespace-collapsed SQL, so migrations can
//! be reformatted for readability without invalidating history.

use std::sync::OnceLock;

use regex::Regex;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;

/// Fixed advisory-lock key. Arbitrary, but must be stable across
/// deploys so concurrent processes contend on the same lock.
const MIGRATION_LOCK_KEY: i64 = 4;

/// A single schema migration.
///
/// Some SQL (for example `CREATE INDEX CONCURRENTLY`) cannot run inside
/// a transaction; flag it `outside_tx` and it executes on a fresh
/// connection while the bookkeeping still happens in the migration
/// transaction.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Must match `YYYY-MM-DD.N.<slug>.sql`.
    pub name: &'static str,
    /// The SQL to apply; may contain multiple statements.
    pub sql: &'static str,
    /// Run the SQL outside the migration transaction.
    pub outside_tx: bool,
}

impl Migration {
    /// Canonical hash: sha256 of the whitespace-collapsed SQL.
    pub fn hash(&self) -> String {
        let collapsed = self.sql.split_whitespace().collect::<Vec<_>>().join(" ");
        hex::encode(Sha256::digest(collapsed.as_bytes()))
    }
}

/// Migration runner errors.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    #[error("bad migration name: {0}")]
    BadName(String),

    #[error("migration out of order: {0}")]
    OutOfOrder(String),

    #[error("duplicate migration keys: {0} {1}")]
    DuplicateKey(String, String),

    #[error("{name} at {index}: applied but not requested")]
    AppliedNotRequested { name: String, index: usize },

    #[error("{name} at {index}: name mismatch (applied {applied})")]
    NameMismatch {
        name: String,
        applied: String,
        index: usize,
    },

    #[error("{name} at {index}: hash mismatch")]
    HashMismatch { name: String, index: usize },

    #[error("migration {name}: {source}")]
    Apply {
        name: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Run all unapplied migrations in order.
///
/// Safe to call from any number of processes at startup: losers of the
/// advisory lock wait, find nothing left to apply, and proceed.
pub async fn run(pool: &PgPool, migrations: &[Migration]) -> Result<(), MigrateError> {
    validity(migrations)?;
    // Keep going until there are no more to run (or an error).
    while run_one(pool, migrations).await? {}
    Ok(())
}

/// Apply a single unapplied migration, returning whether one ran.
async fn run_one(pool: &PgPool, migrations: &[Migration]) -> Result<bool, MigrateError> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(&mut *tx)
        .await?;

    const CREATE: &str = "
        CREATE SEQUENCE IF NOT EXISTS migration_seq
            START WITH 1
            INCREMENT BY 1
            NO MINVALUE
            NO MAXVALUE
            CACHE 1;
        CREATE TABLE IF NOT EXISTS migrations (
            filename text NOT NULL,
            hash text NOT NULL,
            applied_at timestamp with time zone DEFAULT now() NOT NULL,
            index int DEFAULT nextval('migration_seq') NOT NULL,
            PRIMARY KEY(filename)
        );
    ";
    sqlx::raw_sql(CREATE).execute(&mut *tx).await?;

    let applied = applied_migrations(&mut tx).await?;
    validate_applied(&applied, migrations)?;

    let Some(m) = migrations.get(applied.len()) else {
        return Ok(false); // all up to date
    };

    // SQL that PostgreSQL refuses to run in a transaction goes out on a
    // pool connection instead; if the bookkeeping insert then fails, the
    // migration has still been applied and needs operator attention.
    let applied_result = if m.outside_tx {
        sqlx::raw_sql(m.sql).execute(pool).await
    } else {
        sqlx::raw_sql(m.sql).execute(&mut *tx).await
    };
    applied_result.map_err(|source| MigrateError::Apply {
        name: m.name.to_string(),
        source,
    })?;

    sqlx::query("INSERT INTO migrations (filename, hash, applied_at) VALUES ($1, $2, now())")
        .bind(m.name)
        .bind(m.hash())
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(migration = m.name, "applied");
    Ok(true)
}

struct AppliedRow {
    filename: String,
    hash: String,
}

async fn applied_migrations(
    tx: &mut Transaction<'_, Postgres>,
) -> Result<Vec<AppliedRow>, MigrateError> {
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT filename, hash FROM migrations ORDER BY index")
            .fetch_all(&mut **tx)
            .await?;
    Ok(rows
        .into_iter()
        .map(|(filename, hash)| AppliedRow { filename, hash })
        .collect())
}

/// Every applied row must be a prefix of the requested list, matching
/// by both name and hash.
fn validate_applied(applied: &[AppliedRow], migrations: &[Migration]) -> Result<(), MigrateError> {
    for (i, row) in applied.iter().enumerate() {
        let Some(m) = migrations.get(i) else {
            return Err(MigrateError::AppliedNotRequested {
                name: row.filename.clone(),
                index: i,
            });
        };
        if row.filename != m.name {
            return Err(MigrateError::NameMismatch {
                name: m.name.to_string(),
                applied: row.filename.clone(),
                index: i,
            });
        }
        if row.hash != m.hash() {
            return Err(MigrateError::HashMismatch {
                name: m.name.to_string(),
                index: i,
            });
        }
    }
    Ok(())
}

fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}\.\d\.[a-z][a-z0-9_-]+\.sql$").expect("static pattern")
    })
}

/// Check that the migration list is well formed: names match the
/// `YYYY-MM-DD.N.<slug>.sql` pattern, are strictly ascending, and no
/// `YYYY-MM-DD.N` key repeats.
pub fn validity(migrations: &[Migration]) -> Result<(), MigrateError> {
    for (i, m) in migrations.iter().enumerate() {
        if !name_regex().is_match(m.name) {
            return Err(MigrateError::BadName(m.name.to_string()));
        }
        if i > 0 && migrations[i - 1].name >= m.name {
            return Err(MigrateError::OutOfOrder(m.name.to_string()));
        }
    }
    for pair in migrations.windows(2) {
        if pair[0].name[..12] == pair[1].name[..12] {
            return Err(MigrateError::DuplicateKey(
                pair[0].name.to_string(),
                pair[1].name.to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mig(name: &'static str) -> Migration {
        Migration {
            name,
            sql: "SELECT 1",
            outside_tx: false,
        }
    }

    #[test]
    fn accepts_well_formed_list() {
        let ms = [
            mig("2024-03-11.0.init.sql"),
            mig("2024-03-11.1.proofs-hashes.sql"),
            mig("2024-04-02.0.root-idx.sql"),
        ];
        assert!(validity(&ms).is_ok());
    }

    #[test]
    fn rejects_bad_names() {
        for name in [
            "init.sql",
            "2024-3-11.0.init.sql",
            "2024-03-11.0.Init.sql",
            "2024-03-11.0.init",
            "2024-03-11.x.init.sql",
        ] {
            assert!(
                matches!(validity(&[mig(name)]), Err(MigrateError::BadName(_))),
                "expected bad name: {name}"
            );
        }
    }

    #[test]
    fn rejects_out_of_order() {
        let ms = [mig("2024-04-02.0.b.sql"), mig("2024-03-11.0.a.sql")];
        assert!(matches!(validity(&ms), Err(MigrateError::OutOfOrder(_))));
    }

    #[test]
    fn rejects_duplicate_keys() {
        // Same YYYY-MM-DD.N key with different slugs.
        let ms = [mig("2024-03-11.0.aaa.sql"), mig("2024-03-11.0.bbb.sql")];
        assert!(matches!(validity(&ms), Err(MigrateError::DuplicateKey(_, _))));
    }

    #[test]
    fn hash_ignores_formatting() {
        let a = Migration {
            name: "2024-03-11.0.init.sql",
            sql: "CREATE TABLE t (\n  id int\n);",
            outside_tx: false,
        };
        let b = Migration {
            name: "2024-03-11.0.init.sql",
            sql: "CREATE   TABLE t ( id int );",
            outside_tx: false,
        };
        assert_eq!(a.hash(), b.hash());

        let c = Migration {
            name: "2024-03-11.0.init.sql",
            sql: "CREATE TABLE other (id int);",
            outside_tx: false,
        };
        assert_ne!(a.hash(), c.hash());
    }

    #[test]
    fn validates_applied_prefix() {
        let ms = [mig("2024-03-11.0.a.sql"), mig("2024-03-12.0.b.sql")];

        let ok = vec![AppliedRow {
            filename: "2024-03-11.0.a.sql".into(),
            hash: ms[0].hash(),
        }];
        assert!(validate_applied(&ok, &ms).is_ok());

        let wrong_hash = vec![AppliedRow {
            filename: "2024-03-11.0.a.sql".into(),
            hash: "deadbeef".into(),
        }];
        assert!(matches!(
            validate_applied(&wrong_hash, &ms),
            Err(MigrateError::HashMismatch { .. })
        ));

        let extra = vec![
            AppliedRow {
                filename: "2024-03-11.0.a.sql".into(),
                hash: ms[0].hash(),
            },
            AppliedRow {
                filename: "2024-03-12.0.b.sql".into(),
                hash: ms[1].hash(),
            },
            AppliedRow {
                filename: "2024-03-13.0.c.sql".into(),
                hash: "abc".into(),
            },
        ];
        assert!(matches!(
            validate_applied(&extra, &ms),
            Err(MigrateError::AppliedNotRequested { .. })
        ));
    }
}
