//! The embedded schema migration list.
//!
//! Applied in order by `garland_migrate::run` at startup. Never edit an
//! entry that has shipped; the runner verifies hashes of applied
//! migrations and will refuse to start on a mismatch. Whitespace-only
//! edits are fine.

use garland_migrate::Migration;

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "2024-03-11.0.init.sql",
        sql: "
            CREATE TABLE trees (
                root bytea PRIMARY KEY,
                unhashed_leaves bytea[] NOT NULL,
                ltd text[] NOT NULL DEFAULT '{}',
                packed boolean NOT NULL DEFAULT false,
                inserted_at timestamptz NOT NULL DEFAULT now()
            );
        ",
        outside_tx: false,
    },
    Migration {
        name: "2024-03-11.1.proofs-hashes.sql",
        sql: "
            CREATE TABLE proofs_hashes (
                hash bytea PRIMARY KEY,
                root bytea NOT NULL
            );
        ",
        outside_tx: false,
    },
    Migration {
        // CONCURRENTLY cannot run inside a transaction.
        name: "2024-04-02.0.proofs-hashes-root-idx.sql",
        sql: "
            CREATE INDEX CONCURRENTLY IF NOT EXISTS proofs_hashes_root_idx
            ON proofs_hashes (root);
        ",
        outside_tx: true,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_is_valid() {
        garland_migrate::validity(MIGRATIONS).unwrap();
    }
}
