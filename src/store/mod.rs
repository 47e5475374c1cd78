//! SQLite persistence
//!
//! One database per project. The `Store` wraps a single connection; every
//! operation is a request-scoped unit relying on SQLite's per-statement
//! atomicity. There is deliberately no cross-table transaction around the
//! document-write/history-append pair (see DESIGN.md).

mod config;
mod history;
mod packages;
mod serialize;
mod sheets;

use std::path::Path;

use rusqlite::Connection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Cannot encode JSON column: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Package number {package_number} already taken for cut {cut_id}")]
    PackageNumberTaken { cut_id: String, package_number: i64 },
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS processor_cut_config (
    processor_org_id         TEXT PRIMARY KEY,
    enabled_animals          TEXT NOT NULL,
    disabled_cuts            TEXT NOT NULL,
    disabled_sausage_flavors TEXT NOT NULL,
    custom_cuts              TEXT NOT NULL,
    default_templates        TEXT NOT NULL,
    processing_fees          TEXT NOT NULL,
    min_hanging_weight_lbs   REAL,
    max_hanging_weight_lbs   REAL,
    producer_notes           TEXT,
    updated_at               TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cut_sheets (
    id                        TEXT PRIMARY KEY,
    processing_order_id       TEXT,
    producer_org_id           TEXT NOT NULL,
    processor_org_id          TEXT,
    is_template               INTEGER NOT NULL DEFAULT 0,
    template_name             TEXT,
    status                    TEXT NOT NULL,
    animal_type               TEXT NOT NULL,
    hanging_weight_lbs        REAL,
    ground_type               TEXT NOT NULL,
    ground_package_weight_lbs REAL,
    patty_size                TEXT,
    organs                    TEXT NOT NULL,
    beef_options              TEXT NOT NULL,
    pork_options              TEXT NOT NULL,
    special_instructions      TEXT,
    processor_notes           TEXT,
    last_modified_by_role     TEXT,
    last_modified_by_user_id  TEXT,
    created_at                TEXT NOT NULL,
    updated_at                TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cut_sheet_items (
    cut_sheet_id       TEXT NOT NULL REFERENCES cut_sheets(id),
    cut_id             TEXT NOT NULL,
    cut_name           TEXT NOT NULL,
    thickness          TEXT,
    weight_lbs         REAL,
    pieces_per_package INTEGER,
    sort_order         INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (cut_sheet_id, cut_id)
);

CREATE TABLE IF NOT EXISTS cut_sheet_sausages (
    cut_sheet_id TEXT NOT NULL REFERENCES cut_sheets(id),
    flavor       TEXT NOT NULL,
    pounds       REAL NOT NULL,
    PRIMARY KEY (cut_sheet_id, flavor)
);

CREATE TABLE IF NOT EXISTS sheet_modifications (
    cut_sheet_id       TEXT NOT NULL REFERENCES cut_sheets(id),
    cut_id             TEXT NOT NULL,
    thickness          TEXT,
    weight_lbs         REAL,
    pieces_per_package INTEGER,
    note               TEXT,
    modified_at        TEXT NOT NULL,
    PRIMARY KEY (cut_sheet_id, cut_id)
);

CREATE TABLE IF NOT EXISTS sheet_removed_cuts (
    cut_sheet_id TEXT NOT NULL REFERENCES cut_sheets(id),
    cut_id       TEXT NOT NULL,
    cut_name     TEXT NOT NULL,
    reason       TEXT NOT NULL,
    removed_at   TEXT NOT NULL,
    PRIMARY KEY (cut_sheet_id, cut_id)
);

CREATE TABLE IF NOT EXISTS sheet_added_cuts (
    cut_sheet_id       TEXT NOT NULL REFERENCES cut_sheets(id),
    cut_id             TEXT NOT NULL,
    cut_name           TEXT NOT NULL,
    thickness          TEXT,
    pieces_per_package INTEGER,
    note               TEXT,
    added_at           TEXT NOT NULL,
    PRIMARY KEY (cut_sheet_id, cut_id)
);

CREATE TABLE IF NOT EXISTS cut_sheet_history (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    cut_sheet_id        TEXT NOT NULL,
    processing_order_id TEXT,
    changed_by_user_id  TEXT NOT NULL,
    changed_by_org_id   TEXT NOT NULL,
    changed_by_role     TEXT NOT NULL,
    change_type         TEXT NOT NULL,
    change_category     TEXT NOT NULL,
    change_summary      TEXT NOT NULL,
    previous_state      TEXT,
    new_state           TEXT NOT NULL,
    changed_fields      TEXT NOT NULL,
    affected_cut_id     TEXT,
    affected_package_id TEXT,
    created_at          TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_history_sheet
    ON cut_sheet_history (cut_sheet_id, created_at);

CREATE TABLE IF NOT EXISTS produced_packages (
    id                    TEXT PRIMARY KEY,
    cut_sheet_id          TEXT NOT NULL REFERENCES cut_sheets(id),
    cut_id                TEXT NOT NULL,
    cut_name              TEXT NOT NULL,
    primal_id             TEXT,
    package_number        INTEGER NOT NULL,
    quantity_in_package   INTEGER NOT NULL,
    actual_weight_lbs     REAL,
    thickness             TEXT,
    processing_style      TEXT,
    processor_added       INTEGER NOT NULL DEFAULT 0,
    processor_notes       TEXT,
    livestock_tracking_id TEXT,
    created_at            TEXT NOT NULL,
    UNIQUE (cut_sheet_id, cut_id, package_number)
);
";

/// Handle to the project database
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (and bootstrap) the database at the given path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::bootstrap(conn)
    }

    /// An in-memory store, for tests and scratch work
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(conn: Connection) -> Result<Self, StoreError> {
        // Writers from other connections back off instead of failing fast.
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Decode a JSON-typed column
pub(crate) fn column_json<T: serde::de::DeserializeOwned>(
    idx: usize,
    text: &str,
) -> rusqlite::Result<T> {
    serde_json::from_str(text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
