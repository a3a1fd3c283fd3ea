use crate::Database;
use crate::models::TimeCapsuleRow;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};

const CAPSULE_COLUMNS: &str =
    "id, message, sender_name, recipient_email, scheduled_date, created_at, status";

impl Database {
    /// Insert a capsule, or update the status of an existing one.
    ///
    /// Only `status` is mutable, and only while the stored row is still
    /// `pending`: `sent` and `failed` rows are never rewritten.
    pub fn upsert_capsule(&self, row: &TimeCapsuleRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO time_capsules (id, message, sender_name, recipient_email, scheduled_date, created_at, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET status = excluded.status
                 WHERE time_capsules.status = 'pending'",
                rusqlite::params![
                    row.id,
                    row.message,
                    row.sender_name,
                    row.recipient_email,
                    row.scheduled_date,
                    row.created_at,
                    row.status,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_capsule(&self, id: &str) -> Result<Option<TimeCapsuleRow>> {
        self.with_conn(|conn| query_capsule(conn, id))
    }

    /// Rows with `start <= scheduled_date <= end`, earliest first.
    pub fn get_capsules_scheduled_between(&self, start: &str, end: &str) -> Result<Vec<TimeCapsuleRow>> {
        self.with_conn(|conn| query_capsules_between(conn, start, end))
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<TimeCapsuleRow> {
    Ok(TimeCapsuleRow {
        id: row.get(0)?,
        message: row.get(1)?,
        sender_name: row.get(2)?,
        recipient_email: row.get(3)?,
        scheduled_date: row.get(4)?,
        created_at: row.get(5)?,
        status: row.get(6)?,
    })
}

fn query_capsule(conn: &Connection, id: &str) -> Result<Option<TimeCapsuleRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM time_capsules WHERE id = ?1",
        CAPSULE_COLUMNS
    ))?;

    let row = stmt.query_row([id], map_row).optional()?;
    Ok(row)
}

fn query_capsules_between(conn: &Connection, start: &str, end: &str) -> Result<Vec<TimeCapsuleRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM time_capsules
         WHERE scheduled_date BETWEEN ?1 AND ?2
         ORDER BY scheduled_date ASC",
        CAPSULE_COLUMNS
    ))?;

    let rows = stmt
        .query_map([start, end], map_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}
