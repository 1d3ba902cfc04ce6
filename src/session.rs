use crate::db::{self, queries, Db};
use crate::errors::{ClientError, Result};
use crate::models::{Role, Session};

/// Login/logout lifecycle backed by the local state database. The store
/// never hands out a global session; callers keep what `login`/`restore`
/// return and pass it along.
pub struct SessionStore {
    db: Db,
}

impl SessionStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub fn login(&self, user_id: &str, role: Role, token: &str) -> Result<Session> {
        if user_id.trim().is_empty() || token.trim().is_empty() {
            return Err(ClientError::Validation(
                "A session needs a user id and a token".to_string(),
            ));
        }
        let session = Session {
            user_id: user_id.trim().to_string(),
            role,
            token: token.trim().to_string(),
        };
        queries::save_session(&db::lock(&self.db), &session)?;
        tracing::info!(user_id = %session.user_id, role = role.as_str(), "logged in");
        Ok(session)
    }

    pub fn restore(&self) -> Result<Option<Session>> {
        queries::load_session(&db::lock(&self.db))
    }

    /// Drops the stored session and the cached push token, so the next
    /// account to sign in on this device registers its own.
    pub fn logout(&self) -> Result<()> {
        let conn = db::lock(&self.db);
        let had_session = queries::clear_session(&conn)?;
        queries::delete_value(&conn, queries::PUSH_TOKEN_KEY)?;
        if had_session {
            tracing::info!("logged out");
        }
        Ok(())
    }
}
