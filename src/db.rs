use std::path::Path;

use crate::report::HARVEST_READY_LEVEL;
use crate::schema::*;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

const CREATE_HIVES: &str = "CREATE TABLE IF NOT EXISTS hives (
    hive_id INTEGER PRIMARY KEY NOT NULL,
    weight_kg DOUBLE NOT NULL,
    level INTEGER NOT NULL,
    extracting BOOLEAN NOT NULL DEFAULT 0,
    last_update TIMESTAMP NOT NULL
)";

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name=hives)]
pub struct NewHiveState {
    pub hive_id: i64,
    pub weight_kg: f64, // kg
    pub level: i32,     // percent
    pub extracting: bool,
    pub last_update: NaiveDateTime, // UTC
}

#[derive(Debug, Clone, PartialEq, Queryable, serde::Serialize, serde::Deserialize)]
pub struct HiveState {
    pub hive_id: i64, // unique, key
    pub weight_kg: f64,
    pub level: i32,
    pub extracting: bool,
    pub last_update: NaiveDateTime,
}

impl HiveState {
    pub fn harvest_ready(&self) -> bool {
        self.level >= HARVEST_READY_LEVEL
    }
}

pub struct Db {
    conn: SqliteConnection,
}

impl Db {
    /// Opens the database at `database_url`, creating its directory if needed.
    /// Use `:memory:` for a throwaway store.
    pub fn connect(database_url: &str) -> Result<Self> {
        if database_url != ":memory:" {
            if let Some(dir) = Path::new(database_url).parent() {
                if !dir.as_os_str().is_empty() {
                    std::fs::create_dir_all(dir)
                        .with_context(|| format!("creating {}", dir.display()))?;
                }
            }
        }
        let conn = SqliteConnection::establish(database_url)
            .with_context(|| format!("opening {database_url}"))?;

        Ok(Self { conn })
    }

    /// Creates the hives table. Safe to call on an initialized database.
    pub fn init(&mut self) -> Result<()> {
        diesel::sql_query(CREATE_HIVES).execute(&mut self.conn)?;
        Ok(())
    }

    /// Stores `state` as the only row for its hive.
    pub fn upsert(&mut self, state: &NewHiveState) -> Result<()> {
        log::debug!(
            "hive {} -> {} kg, {}%, extracting={}",
            state.hive_id,
            state.weight_kg,
            state.level,
            state.extracting
        );

        diesel::replace_into(hives::table)
            .values(state)
            .execute(&mut self.conn)?;

        Ok(())
    }

    pub fn extraction_flag(&mut self, id: i64) -> Result<bool> {
        use crate::schema::hives::dsl::*;
        let flag = hives
            .find(id)
            .select(extracting)
            .first::<bool>(&mut self.conn)
            .optional()?;

        Ok(flag.unwrap_or(false))
    }

    pub fn hive(&mut self, id: i64) -> Result<Option<HiveState>> {
        use crate::schema::hives::dsl::*;
        let res = hives
            .find(id)
            .first::<HiveState>(&mut self.conn)
            .optional()?;

        Ok(res)
    }

    pub fn all_hives(&mut self) -> Result<Vec<HiveState>> {
        use crate::schema::hives::dsl::*;
        let res = hives
            .order(hive_id.asc())
            .load::<HiveState>(&mut self.conn)?;

        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::HiveReport;
    use chrono::Duration;

    fn db() -> Db {
        let mut db = Db::connect(":memory:").unwrap();
        db.init().unwrap();
        db
    }

    fn state(hive: i64, weight_kg: f64, extracting: bool, at: NaiveDateTime) -> NewHiveState {
        HiveReport {
            hive,
            weight_kg,
            extracting,
        }
        .into_state(at)
    }

    #[test]
    fn init_is_idempotent() {
        let mut db = db();
        db.upsert(&state(1, 6.0, false, crate::utils::now())).unwrap();
        db.init().unwrap();
        assert_eq!(db.all_hives().unwrap().len(), 1);
    }

    #[test]
    fn first_report_creates_row() {
        let mut db = db();
        db.upsert(&state(1, 6.0, false, crate::utils::now())).unwrap();

        let hive = db.hive(1).unwrap().unwrap();
        assert_eq!(hive.level, 50);
        assert!(!hive.extracting);
        assert!(hive.harvest_ready());
    }

    #[test]
    fn repeated_report_keeps_one_row() {
        let mut db = db();
        let t0 = crate::utils::now();
        let t1 = t0 + Duration::seconds(30);
        db.upsert(&state(5, 3.0, false, t0)).unwrap();
        db.upsert(&state(5, 3.0, false, t1)).unwrap();

        let all = db.all_hives().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].last_update, t1);
    }

    #[test]
    fn new_report_replaces_all_fields() {
        let mut db = db();
        let now = crate::utils::now();
        db.upsert(&state(1, 12.0, true, now)).unwrap();
        db.upsert(&state(1, 1.5, false, now)).unwrap();

        let hive = db.hive(1).unwrap().unwrap();
        assert_eq!(hive.weight_kg, 1.5);
        assert_eq!(hive.level, 12);
        assert!(!hive.extracting);
        assert!(!hive.harvest_ready());
    }

    #[test]
    fn extraction_flag_lookup() {
        let mut db = db();
        let now = crate::utils::now();
        db.upsert(&state(1, 12.0, true, now)).unwrap();
        db.upsert(&state(2, 12.0, false, now)).unwrap();

        assert!(db.extraction_flag(1).unwrap());
        assert!(!db.extraction_flag(2).unwrap());
        assert!(!db.extraction_flag(999).unwrap());
        assert!(db.hive(999).unwrap().is_none());
    }

    #[test]
    fn all_hives_lists_every_device() {
        let mut db = db();
        let now = crate::utils::now();
        for (id, w) in [(3, 0.0), (1, 6.0), (2, 20.0)] {
            db.upsert(&state(id, w, false, now)).unwrap();
        }

        let levels: Vec<(i64, i32)> = db
            .all_hives()
            .unwrap()
            .iter()
            .map(|h| (h.hive_id, h.level))
            .collect();
        assert_eq!(levels, vec![(1, 50), (2, 100), (3, 0)]);
    }

    #[test]
    fn state_survives_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("hives.db");
        let url = path.to_str().unwrap().to_owned();

        {
            let mut db = Db::connect(&url).unwrap();
            db.init().unwrap();
            db.upsert(&state(9, 12.0, true, crate::utils::now())).unwrap();
        }
        let mut db = Db::connect(&url).unwrap();
        db.init().unwrap();
        assert!(db.extraction_flag(9).unwrap());
    }
}
