//! SQL schema for the Docket SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// `start_at`/`end_at` are stored in the fixed 'YYYY-MM-DD HH:MM:SS'
/// format, which sorts lexicographically, so plain string comparison in
/// the overlap and range queries is interval comparison. Bookkeeping
/// timestamps are RFC 3339 UTC. A NULL `deleted_at` means active; no row
/// is ever physically removed.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS clients (
    client_id  TEXT PRIMARY KEY,
    full_name  TEXT NOT NULL,
    created_at TEXT NOT NULL,
    deleted_at TEXT
);

CREATE TABLE IF NOT EXISTS lawyers (
    lawyer_id  TEXT PRIMARY KEY,
    full_name  TEXT NOT NULL,
    created_at TEXT NOT NULL,
    deleted_at TEXT
);

CREATE TABLE IF NOT EXISTS cases (
    case_id    TEXT PRIMARY KEY,
    client_id  TEXT NOT NULL REFERENCES clients(client_id),
    title      TEXT NOT NULL,
    created_at TEXT NOT NULL,
    deleted_at TEXT
);

CREATE TABLE IF NOT EXISTS appointments (
    appointment_id TEXT PRIMARY KEY,
    client_id      TEXT NOT NULL REFERENCES clients(client_id),
    case_id        TEXT REFERENCES cases(case_id),
    lawyer_id      TEXT REFERENCES lawyers(lawyer_id),
    start_at       TEXT NOT NULL,   -- 'YYYY-MM-DD HH:MM:SS', no timezone
    end_at         TEXT NOT NULL,
    channel        TEXT NOT NULL DEFAULT 'in_person',
    status         TEXT NOT NULL DEFAULT 'scheduled',
    title          TEXT,
    notes          TEXT,
    created_at     TEXT NOT NULL,   -- RFC 3339 UTC; store-assigned
    updated_at     TEXT NOT NULL,
    deleted_at     TEXT
);

CREATE INDEX IF NOT EXISTS appointments_lawyer_time_idx
    ON appointments(lawyer_id, start_at);
CREATE INDEX IF NOT EXISTS appointments_client_idx ON appointments(client_id);
CREATE INDEX IF NOT EXISTS appointments_status_idx ON appointments(status);

PRAGMA user_version = 1;
";
