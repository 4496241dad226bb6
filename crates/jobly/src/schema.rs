//! Table definitions for the three jobly relations.

use crate::client::GenericClient;
use crate::error::JoblyResult;
use crate::query::query;

/// DDL statements, in dependency order.
pub const CREATE_TABLES: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS companies (
        handle TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        num_employees INTEGER,
        description TEXT,
        logo_url TEXT
    )",
    "CREATE TABLE IF NOT EXISTS jobs (
        id SERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        salary DOUBLE PRECISION NOT NULL,
        equity DOUBLE PRECISION NOT NULL CHECK (equity <= 1.0),
        company_handle TEXT NOT NULL REFERENCES companies ON DELETE CASCADE,
        date_posted TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    "CREATE TABLE IF NOT EXISTS users (
        username TEXT PRIMARY KEY,
        password TEXT NOT NULL,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        photo_url TEXT,
        is_admin BOOLEAN NOT NULL DEFAULT FALSE
    )",
];

/// Create any missing tables.
pub async fn setup_schema(conn: &impl GenericClient) -> JoblyResult<()> {
    for ddl in CREATE_TABLES {
        query(ddl).tag("schema.create").execute(conn).await?;
    }
    Ok(())
}

/// Remove every row from every table. Meant for test fixtures.
pub async fn truncate_all(conn: &impl GenericClient) -> JoblyResult<()> {
    query("TRUNCATE users, jobs, companies RESTART IDENTITY CASCADE")
        .tag("schema.truncate")
        .execute(conn)
        .await?;
    Ok(())
}
