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

//! bingocards-core: Core library for the bingocards generator.
//!
//! This library provides WASM-compatible types and algorithms for:
//! - Parsing the newline-delimited term list
//! - Fisher-Yates shuffling with an injectable random source
//! - Assembling 5x5 cards and generating batches of them
//! - Persisting settings through a key-value store
//! - Rendering cards to SVG and exporting them one at a time

pub mod batch;
pub mod card;
pub mod error;
pub mod export;
pub mod render;
pub mod rng;
pub mod settings;
pub mod terms;

// Re-exports for convenience
pub use batch::{Batch, MAX_QUANTITY, generate_batch};
pub use card::{Card, CardId, FREE_SPACE, LayoutConfig, assemble, preview_cells};
pub use error::{ErrorReport, Fallible, GenerateError, fail};
pub use rng::{RandomSource, TinyRng, shuffle};
pub use settings::{Settings, SettingsStore};
pub use terms::parse_terms;
