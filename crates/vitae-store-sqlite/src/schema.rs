//! SQL schema for the vitae SQLite store.
//!
//! This is the loader-era schema: sequence-valued fields are declared `TEXT`
//! and hold the bracketed array-literal form (`{a,b,c}`). The schema
//! migrator evolves those columns to `JSONB` documents in place; see
//! [`crate::migrate`].

/// Full legacy DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS contact_info (
    id         INTEGER PRIMARY KEY,
    full_name  TEXT,
    email      TEXT,
    phone      TEXT,
    location   TEXT,
    linkedin   TEXT
);

-- responsibilities/achievements/narrative hold array-literal text until the
-- document migration has run.
CREATE TABLE IF NOT EXISTS professional_experience (
    id               INTEGER PRIMARY KEY,
    company          TEXT,
    title            TEXT,
    start_date       TEXT,    -- canonical YYYY-MM-DD
    end_date         TEXT,    -- NULL = current position
    location         TEXT,
    responsibilities TEXT,
    achievements     TEXT,
    narrative        TEXT
);

CREATE TABLE IF NOT EXISTS education (
    id           INTEGER PRIMARY KEY,
    institution  TEXT,
    degree       TEXT,
    field        TEXT,
    start_date   TEXT,
    end_date     TEXT,
    location     TEXT,
    achievements TEXT
);

CREATE TABLE IF NOT EXISTS skills (
    id       INTEGER PRIMARY KEY,
    category TEXT,
    skills   TEXT
);

CREATE TABLE IF NOT EXISTS awards (
    id          INTEGER PRIMARY KEY,
    title       TEXT,
    issuer      TEXT,
    date        TEXT,
    description TEXT
);

CREATE TABLE IF NOT EXISTS publications (
    id          INTEGER PRIMARY KEY,
    title       TEXT,
    publisher   TEXT,
    date        TEXT,
    url         TEXT,
    description TEXT
);

-- Scraped postings, written by the scraping application. Backup and
-- migration target only; the entity loader never writes here.
CREATE TABLE IF NOT EXISTS job_content (
    id               INTEGER PRIMARY KEY,
    title            TEXT,
    company          TEXT,
    location         TEXT,
    salary           TEXT,
    description      TEXT,
    requirements     TEXT,
    responsibilities TEXT,
    about_company    TEXT,
    benefits         TEXT,
    raw_content      TEXT,
    url              TEXT,
    created_at       TEXT
);
";

/// The dependent view over `professional_experience`.
///
/// Not part of [`SCHEMA`]: its SELECT must reference live columns, and a
/// store interrupted mid-migration can be missing the column it names.
/// Creation is therefore gated on schema inspection at open, and the
/// migrator recreates it once the column shape is final.
pub const FULL_EXPERIENCE_VIEW: &str = "
CREATE VIEW IF NOT EXISTS full_experience AS
SELECT
    pe.company,
    pe.title,
    pe.start_date,
    pe.end_date,
    pe.location,
    pe.responsibilities,
    pe.achievements,
    pe.narrative
FROM professional_experience pe
ORDER BY pe.start_date DESC;
";
