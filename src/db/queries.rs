use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::Result;
use crate::models::{Role, Session};

// ── Key/value ──

pub const PUSH_TOKEN_KEY: &str = "push_token";

pub fn get_value(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}

pub fn set_value(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value],
    )?;
    Ok(())
}

pub fn delete_value(conn: &Connection, key: &str) -> Result<bool> {
    let count = conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
    Ok(count > 0)
}

// ── Session ──

pub fn save_session(conn: &Connection, session: &Session) -> Result<()> {
    conn.execute(
        "INSERT INTO sessions (id, user_id, role, token, logged_in_at)
         VALUES (1, ?1, ?2, ?3, datetime('now'))
         ON CONFLICT(id) DO UPDATE SET
           user_id = excluded.user_id,
           role = excluded.role,
           token = excluded.token,
           logged_in_at = excluded.logged_in_at",
        params![session.user_id, session.role.as_str(), session.token],
    )?;
    Ok(())
}

pub fn load_session(conn: &Connection) -> Result<Option<Session>> {
    let row = conn
        .query_row(
            "SELECT user_id, role, token FROM sessions WHERE id = 1",
            [],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?;

    Ok(row.and_then(|(user_id, role, token)| {
        let role = Role::parse(&role);
        if role.is_none() {
            tracing::warn!("stored session has an unknown role, ignoring it");
        }
        role.map(|role| Session {
            user_id,
            role,
            token,
        })
    }))
}

pub fn clear_session(conn: &Connection) -> Result<bool> {
    let count = conn.execute("DELETE FROM sessions", [])?;
    Ok(count > 0)
}
