use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (time_capsules)");
        conn.execute_batch(
            "
            CREATE TABLE time_capsules (
                id               TEXT PRIMARY KEY,
                message          TEXT NOT NULL,
                sender_name      TEXT NOT NULL,
                recipient_email  TEXT NOT NULL,
                scheduled_date   TEXT NOT NULL,
                created_at       TEXT NOT NULL,
                status           TEXT NOT NULL DEFAULT 'pending'
                                 CHECK (status IN ('pending', 'sent', 'failed'))
            );

            -- Range scans by the dispatcher
            CREATE INDEX idx_time_capsules_scheduled
                ON time_capsules(scheduled_date);

            INSERT INTO schema_version (version) VALUES (1);
            "
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
