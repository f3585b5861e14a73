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

use bingocards_core::error::Fallible;
use bingocards_core::error::fail;
use bingocards_core::settings::FIELDS;
use bingocards_core::settings::Settings;
use bingocards_core::settings::canonical_field;
use bingocards_core::settings::remove_field;
use bingocards_core::settings::storage_key;
use bingocards_core::terms::count_terms;

use crate::db::Database;

/// Longest value `show` prints before abbreviating.
const SHOW_WIDTH: usize = 48;

pub enum ConfigAction {
    Show,
    Set { key: String, value: String },
    Unset { key: String },
    Reset,
    Export,
    Import { file: String },
}

pub fn run_config(store: &str, action: ConfigAction) -> Fallible<()> {
    let db = Database::new(store)?;
    let output = apply_action(&db, action)?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

fn apply_action(db: &Database, action: ConfigAction) -> Fallible<String> {
    match action {
        ConfigAction::Show => show(db),
        ConfigAction::Set { key, value } => {
            let mut settings = Settings::load(db);
            settings.set_field(&key, &value)?;
            persist(db, &settings)?;
            Ok(String::new())
        }
        ConfigAction::Unset { key } => {
            let Some(field) = canonical_field(&key) else {
                return fail(format!("Unknown setting: '{key}'."));
            };
            remove_field(db, field)?;
            Ok(String::new())
        }
        ConfigAction::Reset => {
            Settings::clear(db)?;
            log::info!("Settings reset to defaults.");
            Ok(String::new())
        }
        ConfigAction::Export => Settings::load(db).to_toml(),
        ConfigAction::Import { file } => {
            let text = std::fs::read_to_string(&file)?;
            let mut settings = Settings::load(db);
            settings.apply_toml(&text)?;
            persist(db, &settings)?;
            log::info!("Imported settings from {file}.");
            Ok(String::new())
        }
    }
}

fn persist(db: &Database, settings: &Settings) -> Fallible<()> {
    let skipped = settings.save(db);
    if skipped.is_empty() {
        Ok(())
    } else {
        fail(format!("Failed to store: {}.", skipped.join(", ")))
    }
}

fn show(db: &Database) -> Fallible<String> {
    let settings = Settings::load(db);
    let stored = db.keys()?;
    let mut lines = Vec::new();
    for field in FIELDS {
        let marker = if stored.contains(&storage_key(field)) {
            ""
        } else {
            " (default)"
        };
        let value = match field {
            "terms" => format!("{} terms", count_terms(&settings.terms)),
            _ => match settings.get_field(field) {
                Some(value) => abbreviate(&value),
                None => "none".to_string(),
            },
        };
        lines.push(format!("{field:<20}{value}{marker}"));
    }
    Ok(lines.join("\n"))
}

fn abbreviate(value: &str) -> String {
    if value.chars().count() <= SHOW_WIDTH {
        value.to_string()
    } else {
        let head: String = value.chars().take(SHOW_WIDTH).collect();
        format!("{head}... ({} bytes)", value.len())
    }
}
