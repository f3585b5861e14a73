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

//! WASM bindings for bingocards - designs and prints bingo cards in the browser.

use wasm_bindgen::prelude::*;
use web_sys::console;

use bingocards_core::batch::{Batch, generate_batch};
use bingocards_core::render::{Page, render_card_svg, render_preview_svg};
use bingocards_core::rng::TinyRng;
use bingocards_core::settings::{Settings, SettingsStore, canonical_field, storage_key};
use bingocards_core::terms::count_terms;

mod storage;

use storage::Storage;

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    console::log_1(&"bingocards WASM initialized".into());
}

/// The main application state managed from JavaScript.
#[wasm_bindgen]
pub struct BingoApp {
    /// Current settings, mirrored to localStorage
    settings: Settings,
    /// Storage backend
    storage: Storage,
    /// The last generated batch
    batch: Option<Batch>,
    rng: TinyRng,
}

#[wasm_bindgen]
impl BingoApp {
    /// Create a new BingoApp, restoring settings from localStorage.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        let storage = Storage::new();
        let settings = Settings::load(&storage);
        let seed = js_sys::Date::now() as u64;
        Self {
            settings,
            storage,
            batch: None,
            rng: TinyRng::from_seed(seed),
        }
    }

    /// The current settings as JSON, with kebab-case keys.
    #[wasm_bindgen]
    pub fn settings_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.settings)
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize settings: {}", e)))
    }

    /// Update one setting and persist it.
    #[wasm_bindgen]
    pub fn set_setting(&mut self, key: &str, value: &str) -> Result<(), JsValue> {
        let field = canonical_field(key)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown setting: '{}'", key)))?;
        self.settings
            .set_field(field, value)
            .map_err(|e| JsValue::from_str(e.message()))?;
        self.persist(field);
        Ok(())
    }

    /// Set the background from a `data:` URI read by a FileReader.
    #[wasm_bindgen]
    pub fn set_background(&mut self, data_uri: &str) -> Result<(), JsValue> {
        self.set_setting("background-image", data_uri)
    }

    #[wasm_bindgen]
    pub fn clear_background(&mut self) {
        self.settings.background_image = None;
        self.persist("background-image");
    }

    /// Number of non-empty lines in the term text.
    #[wasm_bindgen]
    pub fn term_count(&self) -> usize {
        count_terms(&self.settings.terms)
    }

    /// Terms a card needs with the current layout.
    #[wasm_bindgen]
    pub fn required_terms(&self) -> usize {
        self.settings.layout().required_terms()
    }

    #[wasm_bindgen]
    pub fn preview_svg(&self) -> String {
        render_preview_svg(&self.settings)
    }

    /// Generate a batch. Returns the number of cards, or throws with a
    /// message naming the required and actual term counts.
    #[wasm_bindgen]
    pub fn generate(&mut self, quantity: usize) -> Result<usize, JsValue> {
        let batch = generate_batch(
            &self.settings.term_pool(),
            self.settings.layout(),
            quantity,
            &mut self.rng,
        )
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let count = batch.len();
        self.batch = Some(batch);
        Ok(count)
    }

    #[wasm_bindgen]
    pub fn card_count(&self) -> usize {
        self.batch.as_ref().map_or(0, |b| b.len())
    }

    /// Card `index` (0-based) as a printable A4 SVG.
    #[wasm_bindgen]
    pub fn card_svg(&self, index: usize) -> Result<String, JsValue> {
        let card = self
            .batch
            .as_ref()
            .and_then(|b| b.cards().get(index))
            .ok_or_else(|| JsValue::from_str("No such card"))?;
        Ok(render_card_svg(card, &self.settings, Page::A4))
    }

    /// The last batch as JSON.
    #[wasm_bindgen]
    pub fn cards_json(&self) -> Result<String, JsValue> {
        match &self.batch {
            Some(batch) => serde_json::to_string(batch)
                .map_err(|e| JsValue::from_str(&format!("Failed to serialize cards: {}", e))),
            None => Ok("null".to_string()),
        }
    }

    /// Open the browser's print dialog.
    #[wasm_bindgen]
    pub fn print(&self) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
        window.print()
    }

    /// Write one field through to localStorage. A refused write (e.g. quota
    /// exceeded) is logged and the in-memory value kept.
    fn persist(&self, field: &str) {
        let key = storage_key(field);
        let result = match self.settings.get_field(field) {
            Some(value) => self.storage.set(&key, &value),
            None => self.storage.remove(&key),
        };
        if let Err(e) = result {
            console::warn_1(&format!("Failed to persist '{}': {}", key, e.message()).into());
        }
    }
}

impl Default for BingoApp {
    fn default() -> Self {
        Self::new()
    }
}
