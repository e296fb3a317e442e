//! SQLite-based mission store.

use super::{
    now_string, parse_launch_date, Mission, MissionPatch, MissionQuery, MissionStats,
    MissionStore, NewMission, StoreError, UpsertOutcome,
};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

const SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS missions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    status TEXT NOT NULL,
    launch_date TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_missions_launch_date ON missions(launch_date);
"#;

/// Pass-through columns added after the first schema version.
const PASS_THROUGH_COLUMNS: &[(&str, &str)] = &[
    ("details", "TEXT"),
    ("rocket", "TEXT"),
    ("flight_number", "INTEGER"),
];

const MISSION_COLUMNS: &str =
    "id, name, status, launch_date, details, rocket, flight_number, created_at, updated_at";

pub struct SqliteMissionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteMissionStore {
    pub async fn new(db_path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Open database in blocking task
        let conn = tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&db_path)?;
            Self::prepare(conn)
        })
        .await??;

        tracing::debug!("Opened SQLite mission store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open a private in-memory database.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let conn = tokio::task::spawn_blocking(|| {
            let conn = Connection::open_in_memory()?;
            Self::prepare(conn)
        })
        .await??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn prepare(conn: Connection) -> Result<Connection, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Self::run_migrations(&conn)?;
        Ok(conn)
    }

    /// Run database migrations for existing databases.
    /// CREATE TABLE IF NOT EXISTS doesn't add columns to existing tables,
    /// so pass-through columns are added one by one.
    fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
        for (column, sql_type) in PASS_THROUGH_COLUMNS {
            let exists: bool = conn
                .prepare("SELECT 1 FROM pragma_table_info('missions') WHERE name = ?1")?
                .exists(params![column])?;

            if !exists {
                tracing::info!(
                    "Running migration: adding '{}' column to missions table",
                    column
                );
                conn.execute(
                    &format!("ALTER TABLE missions ADD COLUMN {} {}", column, sql_type),
                    [],
                )?;
            }
        }
        Ok(())
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.blocking_lock();
            f(&mut conn)
        })
        .await?
    }
}

/// Launch dates are stored as sortable text so range filters compare correctly.
fn format_launch_date(date: &NaiveDateTime) -> String {
    date.format("%Y-%m-%d %H:%M:%S%.f").to_string()
}

fn row_to_mission(row: &Row<'_>) -> rusqlite::Result<Mission> {
    let launch_date: Option<String> = row.get(3)?;
    Ok(Mission {
        id: row.get(0)?,
        name: row.get(1)?,
        status: row.get(2)?,
        launch_date: launch_date.as_deref().and_then(parse_launch_date),
        details: row.get(4)?,
        rocket: row.get(5)?,
        flight_number: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Mission>, StoreError> {
    let mission = conn
        .query_row(
            &format!("SELECT {} FROM missions WHERE name = ?1", MISSION_COLUMNS),
            params![name],
            row_to_mission,
        )
        .optional()?;
    Ok(mission)
}

fn insert_mission(conn: &Connection, mission: NewMission) -> Result<Mission, StoreError> {
    let now = now_string();
    let result = conn.execute(
        "INSERT INTO missions
             (name, status, launch_date, details, rocket, flight_number, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            mission.name,
            mission.status,
            mission.launch_date.as_ref().map(format_launch_date),
            mission.details,
            mission.rocket,
            mission.flight_number,
            now,
            now,
        ],
    );

    match result {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            return Err(StoreError::Duplicate(mission.name));
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Mission {
        id: conn.last_insert_rowid(),
        name: mission.name,
        status: mission.status,
        launch_date: mission.launch_date,
        details: mission.details,
        rocket: mission.rocket,
        flight_number: mission.flight_number,
        created_at: now.clone(),
        updated_at: now,
    })
}

fn update_mission(conn: &Connection, mission: &Mission) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE missions
         SET status = ?1, launch_date = ?2, details = ?3, rocket = ?4, flight_number = ?5,
             updated_at = ?6
         WHERE id = ?7",
        params![
            mission.status,
            mission.launch_date.as_ref().map(format_launch_date),
            mission.details,
            mission.rocket,
            mission.flight_number,
            mission.updated_at,
            mission.id,
        ],
    )?;
    Ok(())
}

#[async_trait]
impl MissionStore for SqliteMissionStore {
    fn is_persistent(&self) -> bool {
        true
    }

    async fn query_missions(&self, query: &MissionQuery) -> Result<Vec<Mission>, StoreError> {
        let mut conditions: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(start) = &query.start_date {
            conditions.push("launch_date >= ?");
            values.push(Value::Text(format_launch_date(start)));
        }
        if let Some(end) = &query.end_date {
            conditions.push("launch_date <= ?");
            values.push(Value::Text(format_launch_date(end)));
        }
        if let Some(keyword) = query.keyword() {
            // instr() is case-sensitive, unlike LIKE
            conditions.push("instr(name, ?) > 0");
            values.push(Value::Text(keyword.to_string()));
        }

        let mut sql = format!("SELECT {} FROM missions", MISSION_COLUMNS);
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        match query.sort {
            Some(sort) => sql.push_str(&format!(
                " ORDER BY {} {}, id ASC",
                sort.key.column(),
                sort.order.sql()
            )),
            None => sql.push_str(" ORDER BY id ASC"),
        }
        sql.push_str(" LIMIT ? OFFSET ?");
        values.push(Value::Integer(i64::from(query.size)));
        values.push(Value::Integer(query.offset().min(i64::MAX as u64) as i64));

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let missions = stmt
                .query_map(params_from_iter(values), row_to_mission)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(missions)
        })
        .await
    }

    async fn get_mission_by_name(&self, name: &str) -> Result<Option<Mission>, StoreError> {
        let name = name.to_string();
        self.with_conn(move |conn| find_by_name(conn, &name)).await
    }

    async fn create_mission(&self, mission: NewMission) -> Result<Mission, StoreError> {
        self.with_conn(move |conn| insert_mission(conn, mission))
            .await
    }

    async fn upsert_mission(
        &self,
        patch: MissionPatch,
    ) -> Result<(Mission, UpsertOutcome), StoreError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let result = match find_by_name(&tx, &patch.name)? {
                Some(mut existing) => {
                    patch.apply_to(&mut existing);
                    existing.updated_at = now_string();
                    update_mission(&tx, &existing)?;
                    (existing, UpsertOutcome::Updated)
                }
                None => (
                    insert_mission(&tx, patch.into_new_mission())?,
                    UpsertOutcome::Created,
                ),
            };
            tx.commit()?;
            Ok(result)
        })
        .await
    }

    async fn mission_stats(&self) -> Result<MissionStats, StoreError> {
        self.with_conn(|conn| {
            let (total, completed, ongoing): (i64, i64, i64) = conn.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(CASE WHEN LOWER(status) = 'completed' THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(CASE WHEN LOWER(status) = 'ongoing' THEN 1 ELSE 0 END), 0)
                 FROM missions",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;
            Ok(MissionStats {
                total: total as u64,
                completed: completed as u64,
                ongoing: ongoing as u64,
            })
        })
        .await
    }
}
