use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{
    helpers::{conversion_error, parse_datetime},
    models::UserRecord,
    Database,
};
use crate::settings::MonitorSettings;

fn row_to_user(row: &Row) -> Result<UserRecord, rusqlite::Error> {
    let settings: String = row.get("settings")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(UserRecord {
        id: row.get("id")?,
        settings: serde_json::from_str(&settings)
            .map_err(|err| conversion_error(anyhow::Error::new(err)))?,
        created_at: parse_datetime(&created_at, "created_at").map_err(conversion_error)?,
        updated_at: parse_datetime(&updated_at, "updated_at").map_err(conversion_error)?,
    })
}

fn select_user(conn: &Connection, user_id: &str) -> Result<Option<UserRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, settings, created_at, updated_at
         FROM users
         WHERE id = ?1",
    )?;
    Ok(stmt.query_row(params![user_id], row_to_user).optional()?)
}

impl Database {
    /// Create the user with an empty settings document if missing. Existing
    /// rows are returned untouched.
    pub async fn ensure_user(&self, user_id: &str) -> Result<UserRecord> {
        if user_id.is_empty() {
            bail!("user id is required");
        }
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let now = Utc::now().to_rfc3339();
            conn.execute(
                "INSERT INTO users (id, settings, created_at, updated_at)
                 VALUES (?1, '{}', ?2, ?2)
                 ON CONFLICT(id) DO NOTHING",
                params![user_id, now],
            )
            .with_context(|| "failed to upsert user")?;

            select_user(conn, &user_id)?
                .with_context(|| format!("user {user_id} missing after upsert"))
        })
        .await
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| select_user(conn, &user_id)).await
    }

    pub async fn save_settings(&self, user_id: &str, settings: &MonitorSettings) -> Result<()> {
        settings.validate()?;
        let user_id = user_id.to_string();
        let document =
            serde_json::to_string(settings).context("failed to serialize monitor settings")?;
        self.execute(move |conn| {
            let updated = conn
                .execute(
                    "UPDATE users
                     SET settings = ?1,
                         updated_at = ?2
                     WHERE id = ?3",
                    params![document, Utc::now().to_rfc3339(), user_id],
                )
                .with_context(|| "failed to save settings")?;
            if updated == 0 {
                bail!("unknown user {user_id}");
            }
            Ok(())
        })
        .await
    }

    /// Stored monitor settings, or defaults for a user with none saved.
    pub async fn load_settings(&self, user_id: &str) -> Result<MonitorSettings> {
        let user = self
            .get_user(user_id)
            .await?
            .with_context(|| format!("unknown user {user_id}"))?;
        Ok(user.monitor_settings())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::YellStyle;

    fn open() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("yellmode.db")).unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn ensure_user_is_idempotent() {
        let (_dir, db) = open();

        let first = db.ensure_user("user-1").await.unwrap();
        assert!(first.is_new());

        let custom = MonitorSettings {
            cooldown_seconds: 60,
            style: YellStyle::DrillSergeant,
            ..MonitorSettings::default()
        };
        db.save_settings("user-1", &custom).await.unwrap();

        let second = db.ensure_user("user-1").await.unwrap();
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.monitor_settings(), custom);
    }

    #[tokio::test]
    async fn load_settings_defaults_for_new_user() {
        let (_dir, db) = open();
        db.ensure_user("user-2").await.unwrap();

        let settings = db.load_settings("user-2").await.unwrap();
        assert_eq!(settings, MonitorSettings::default());
    }

    #[tokio::test]
    async fn unknown_users_are_errors() {
        let (_dir, db) = open();

        assert!(db.load_settings("ghost").await.is_err());
        assert!(db
            .save_settings("ghost", &MonitorSettings::default())
            .await
            .is_err());
        assert!(db.ensure_user("").await.is_err());
    }

    #[tokio::test]
    async fn invalid_settings_are_not_written() {
        let (_dir, db) = open();
        db.ensure_user("user-3").await.unwrap();

        let bad = MonitorSettings {
            check_interval_seconds: 1,
            ..MonitorSettings::default()
        };
        assert!(db.save_settings("user-3", &bad).await.is_err());
        assert_eq!(
            db.load_settings("user-3").await.unwrap(),
            MonitorSettings::default()
        );
    }
}
