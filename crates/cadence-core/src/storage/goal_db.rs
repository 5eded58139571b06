//! SQLite-backed goal store.
//!
//! Provides persistent storage for:
//! - Goals, partitioned by owner
//! - Completion history per goal
//!
//! Timestamps are stored as RFC 3339 text.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::data_dir;
use super::goal_store::{next_streak, GoalStore};
use super::migrations;
use crate::error::{CoreError, DatabaseError, Result};
use crate::goal::{Goal, GoalId, GoalType, NewGoal, OwnerId};


/// SQLite database for goal storage.
pub struct SqliteGoalStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteGoalStore {
    /// Open the database at `~/.config/cadence/cadence.db`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_default() -> Result<Self> {
        let path = data_dir()?.join("cadence.db");
        Self::open(path)
    }

    /// Open (or create) the database at `path` and apply migrations.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(|source| DatabaseError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        Self::init(conn, Some(path))
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(DatabaseError::from)?;
        migrations::migrate(&conn).map_err(DatabaseError::from)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Database file path, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Completion timestamps recorded for a goal, oldest first.
    pub fn completions(&self, goal_id: &GoalId) -> Result<Vec<DateTime<Utc>>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT completed_at FROM goal_completions
                 WHERE goal_id = ?1
                 ORDER BY completed_at ASC",
            )
            .map_err(unavailable)?;
        let rows = stmt
            .query_map(params![goal_id.as_str()], |row| row.get::<_, String>(0))
            .map_err(unavailable)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(parse_timestamp(&row.map_err(unavailable)?)?);
        }
        Ok(out)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fetch(conn: &Connection, goal_id: &GoalId) -> Result<Option<Goal>> {
        let raw = conn
            .query_row(
                "SELECT id, owner_id, label, goal_type, interval_minutes,
                        created_at, last_completed_at, streak
                 FROM goals WHERE id = ?1",
                params![goal_id.as_str()],
                RawGoal::from_row,
            )
            .optional()
            .map_err(unavailable)?;
        raw.map(RawGoal::into_goal).transpose()
    }
}

impl GoalStore for SqliteGoalStore {
    fn list(&self, owner_id: &OwnerId) -> Result<Vec<Goal>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, owner_id, label, goal_type, interval_minutes,
                        created_at, last_completed_at, streak
                 FROM goals
                 WHERE owner_id = ?1
                 ORDER BY created_at ASC, id ASC",
            )
            .map_err(unavailable)?;
        let rows = stmt
            .query_map(params![owner_id.as_str()], RawGoal::from_row)
            .map_err(unavailable)?;

        let mut goals = Vec::new();
        for row in rows {
            goals.push(row.map_err(unavailable)?.into_goal()?);
        }
        Ok(goals)
    }

    fn create(
        &self,
        owner_id: &OwnerId,
        goal: &NewGoal,
        created_at: DateTime<Utc>,
    ) -> Result<Goal> {
        let created = Goal {
            id: GoalId::new(Uuid::new_v4().to_string()),
            owner_id: owner_id.clone(),
            label: goal.label.clone(),
            goal_type: goal.goal_type.clone(),
            interval_minutes: goal.interval_minutes,
            created_at,
            last_completed_at: None,
            streak: 0,
        };

        self.conn()
            .execute(
                "INSERT INTO goals (id, owner_id, label, goal_type, interval_minutes, created_at, streak)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
                params![
                    created.id.as_str(),
                    created.owner_id.as_str(),
                    created.label,
                    created.goal_type.key().into_owned(),
                    created.interval_minutes,
                    created.created_at.to_rfc3339(),
                ],
            )
            .map_err(unavailable)?;
        Ok(created)
    }

    fn delete(&self, goal_id: &GoalId) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().map_err(unavailable)?;
        tx.execute(
            "DELETE FROM goal_completions WHERE goal_id = ?1",
            params![goal_id.as_str()],
        )
        .map_err(unavailable)?;
        let removed = tx
            .execute("DELETE FROM goals WHERE id = ?1", params![goal_id.as_str()])
            .map_err(unavailable)?;
        tx.commit().map_err(unavailable)?;

        if removed == 0 {
            return Err(CoreError::NotFound(goal_id.clone()));
        }
        Ok(())
    }

    fn mark_complete(&self, goal_id: &GoalId, at: DateTime<Utc>) -> Result<Goal> {
        let mut conn = self.conn();
        let tx = conn.transaction().map_err(unavailable)?;

        let mut goal =
            Self::fetch(&tx, goal_id)?.ok_or_else(|| CoreError::NotFound(goal_id.clone()))?;
        goal.streak = next_streak(goal.last_completed_at, goal.streak, at, goal.interval_minutes);
        goal.last_completed_at = Some(at);

        tx.execute(
            "UPDATE goals SET last_completed_at = ?1, streak = ?2 WHERE id = ?3",
            params![at.to_rfc3339(), goal.streak, goal_id.as_str()],
        )
        .map_err(unavailable)?;
        tx.execute(
            "INSERT INTO goal_completions (goal_id, completed_at) VALUES (?1, ?2)",
            params![goal_id.as_str(), at.to_rfc3339()],
        )
        .map_err(unavailable)?;
        tx.commit().map_err(unavailable)?;

        Ok(goal)
    }
}

/// Row as read from SQLite, before timestamp and type decoding.
struct RawGoal {
    id: String,
    owner_id: String,
    label: String,
    goal_type: String,
    interval_minutes: u32,
    created_at: String,
    last_completed_at: Option<String>,
    streak: u32,
}

impl RawGoal {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            label: row.get(2)?,
            goal_type: row.get(3)?,
            interval_minutes: row.get(4)?,
            created_at: row.get(5)?,
            last_completed_at: row.get(6)?,
            streak: row.get(7)?,
        })
    }

    fn into_goal(self) -> Result<Goal> {
        Ok(Goal {
            id: GoalId::new(self.id),
            owner_id: OwnerId::new(self.owner_id),
            label: self.label,
            goal_type: GoalType::from_key(&self.goal_type),
            interval_minutes: self.interval_minutes,
            created_at: parse_timestamp(&self.created_at)?,
            last_completed_at: self
                .last_completed_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
            streak: self.streak,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            CoreError::Database(DatabaseError::CorruptRow {
                table: "goals".into(),
                message: format!("bad timestamp '{raw}': {e}"),
            })
        })
}

fn unavailable(err: rusqlite::Error) -> CoreError {
    CoreError::StoreUnavailable {
        message: err.to_string(),
        source: Some(Box::new(DatabaseError::from(err))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
    }

    fn owner() -> OwnerId {
        OwnerId::from("alice@example.com")
    }

    #[test]
    fn create_and_list() {
        let store = SqliteGoalStore::open_memory().unwrap();
        let new_goal = NewGoal::new("Drink water", GoalType::Hydration, 30).unwrap();
        let created = store.create(&owner(), &new_goal, t0()).unwrap();

        let goals = store.list(&owner()).unwrap();
        assert_eq!(goals, vec![created]);
        assert!(store.list(&OwnerId::from("bob@example.com")).unwrap().is_empty());
    }

    #[test]
    fn custom_types_roundtrip() {
        let store = SqliteGoalStore::open_memory().unwrap();
        let custom = GoalType::Custom("hydration".to_string());
        let new_goal = NewGoal::new("Stretch", custom.clone(), 45).unwrap();
        store.create(&owner(), &new_goal, t0()).unwrap();

        let goals = store.list(&owner()).unwrap();
        assert_eq!(goals[0].goal_type, custom);
    }

    #[test]
    fn mark_complete_persists_and_records_history() {
        let store = SqliteGoalStore::open_memory().unwrap();
        let new_goal = NewGoal::new("Journal", GoalType::JournalStreak, 60).unwrap();
        let goal = store.create(&owner(), &new_goal, t0()).unwrap();

        let at = t0() + Duration::minutes(61);
        let updated = store.mark_complete(&goal.id, at).unwrap();
        assert_eq!(updated.last_completed_at, Some(at));
        assert_eq!(updated.streak, 1);

        let listed = store.list(&owner()).unwrap();
        assert_eq!(listed[0].last_completed_at, Some(at));
        assert_eq!(store.completions(&goal.id).unwrap(), vec![at]);
    }

    #[test]
    fn delete_removes_goal_and_history() {
        let store = SqliteGoalStore::open_memory().unwrap();
        let new_goal = NewGoal::new("Mood", GoalType::MoodCheckin, 15).unwrap();
        let goal = store.create(&owner(), &new_goal, t0()).unwrap();
        store.mark_complete(&goal.id, t0() + Duration::minutes(20)).unwrap();

        store.delete(&goal.id).unwrap();
        assert!(store.list(&owner()).unwrap().is_empty());
        assert!(store.completions(&goal.id).unwrap().is_empty());
        assert!(matches!(store.delete(&goal.id), Err(CoreError::NotFound(_))));
    }

    #[test]
    fn file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("goals.db");

        let goal_id = {
            let store = SqliteGoalStore::open(&path).unwrap();
            let new_goal = NewGoal::new("Drink water", GoalType::Hydration, 30).unwrap();
            store.create(&owner(), &new_goal, t0()).unwrap().id
        };

        let reopened = SqliteGoalStore::open(&path).unwrap();
        assert_eq!(reopened.path(), Some(path.as_path()));
        let goals = reopened.list(&owner()).unwrap();
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].id, goal_id);
    }

    #[test]
    fn mark_complete_unknown_goal_is_not_found() {
        let store = SqliteGoalStore::open_memory().unwrap();
        let result = store.mark_complete(&GoalId::from("nope"), t0());
        assert!(matches!(result, Err(CoreError::NotFound(_))));
    }
}
