// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use bingocards_core::error::ErrorReport;
use bingocards_core::error::Fallible;
use bingocards_core::settings::SettingsStore;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;

const SCHEMA: &str = "
create table if not exists settings (
    key text primary key,
    value text not null
);
";

/// SQLite-backed settings store.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(path: &str) -> Fallible<Self> {
        log::debug!("Opening settings store at {path}");
        let conn = Connection::open(path).map_err(db_error)?;
        conn.execute_batch(SCHEMA).map_err(db_error)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn in_memory() -> Fallible<Self> {
        let conn = Connection::open_in_memory().map_err(db_error)?;
        conn.execute_batch(SCHEMA).map_err(db_error)?;
        Ok(Self { conn })
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Fallible<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("select key from settings order by key")
            .map_err(db_error)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(db_error)?;
        let mut keys = Vec::new();
        for key in rows {
            keys.push(key.map_err(db_error)?);
        }
        Ok(keys)
    }
}

impl SettingsStore for Database {
    fn get(&self, key: &str) -> Fallible<Option<String>> {
        self.conn
            .query_row(
                "select value from settings where key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_error)
    }

    fn set(&self, key: &str, value: &str) -> Fallible<()> {
        self.conn
            .execute(
                "insert into settings (key, value) values (?1, ?2)
                 on conflict(key) do update set value = excluded.value",
                params![key, value],
            )
            .map_err(db_error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Fallible<()> {
        self.conn
            .execute("delete from settings where key = ?1", params![key])
            .map_err(db_error)?;
        Ok(())
    }
}

fn db_error(e: rusqlite::Error) -> ErrorReport {
    ErrorReport::new(format!("Database error: {e}"))
}

#[cfg(test)]
mod tests {
    use bingocards_core::settings::Settings;

    use super::*;
    use crate::helper::create_tmp_store;

    #[test]
    fn test_get_set_remove() -> Fallible<()> {
        let db = Database::in_memory()?;
        assert_eq!(db.get("bingo-title")?, None);
        db.set("bingo-title", "A")?;
        db.set("bingo-title", "B")?;
        assert_eq!(db.get("bingo-title")?, Some("B".to_string()));
        db.remove("bingo-title")?;
        assert_eq!(db.get("bingo-title")?, None);
        // Removing a missing key is fine.
        db.remove("bingo-title")?;
        Ok(())
    }

    #[test]
    fn test_settings_persist_across_connections() -> Fallible<()> {
        let path = create_tmp_store()?;
        let mut settings = Settings::default();
        settings.title = "Offsite".to_string();
        settings.use_free_space = false;
        {
            let db = Database::new(&path)?;
            assert!(settings.save(&db).is_empty());
        }
        let db = Database::new(&path)?;
        assert_eq!(Settings::load(&db), settings);
        Ok(())
    }

    #[test]
    fn test_keys() -> Fallible<()> {
        let db = Database::in_memory()?;
        db.set("b", "1")?;
        db.set("a", "2")?;
        assert_eq!(db.keys()?, vec!["a", "b"]);
        Ok(())
    }
}
