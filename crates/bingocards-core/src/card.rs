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

use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

/// Cards are always 5x5.
pub const GRID_SIZE: usize = 5;

pub const CELL_COUNT: usize = GRID_SIZE * GRID_SIZE;

/// Row 2, column 2: the centre of the grid.
pub const FREE_SPACE_INDEX: usize = 12;

pub const FREE_SPACE: &str = "FREE SPACE";

/// Filler shown in the preview while the pool is still too small.
pub const PREVIEW_PLACEHOLDER: &str = "...";

/// Per-generation layout options.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub use_free_space: bool,
}

impl LayoutConfig {
    pub fn new(use_free_space: bool) -> Self {
        Self { use_free_space }
    }

    /// How many distinct pool slots a card consumes.
    pub fn required_terms(self) -> usize {
        required_terms(self.use_free_space)
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            use_free_space: true,
        }
    }
}

pub fn required_terms(use_free_space: bool) -> usize {
    if use_free_space {
        CELL_COUNT - 1
    } else {
        CELL_COUNT
    }
}

/// Identifies a card within its batch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(u64);

impl CardId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl Display for CardId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Card {
    id: CardId,
    cells: Vec<String>,
    free_space: bool,
}

impl Card {
    /// Wrap the output of [`assemble`].
    pub fn new(id: CardId, cells: Vec<String>, free_space: bool) -> Self {
        debug_assert_eq!(cells.len(), CELL_COUNT);
        Self {
            id,
            cells,
            free_space,
        }
    }

    pub fn id(&self) -> CardId {
        self.id
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub fn has_free_space(&self) -> bool {
        self.free_space
    }

    /// Whether the cell at `index` is the free-space marker. This is
    /// positional: a user term that happens to read "FREE SPACE" elsewhere on
    /// the card is an ordinary cell.
    pub fn is_free_cell(&self, index: usize) -> bool {
        self.free_space && index == FREE_SPACE_INDEX
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        if row >= GRID_SIZE || col >= GRID_SIZE {
            return None;
        }
        self.cells.get(row * GRID_SIZE + col).map(String::as_str)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.cells.chunks(GRID_SIZE)
    }

    /// The terms drawn from the pool, i.e. every cell except the free space.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.is_free_cell(*i))
            .map(|(_, cell)| cell.as_str())
    }
}

/// Build one card's cells from an already-shuffled pool.
///
/// # Panics
///
/// Panics if `pool` holds fewer terms than the layout requires. Callers
/// validate the pool first (see [`crate::batch::generate_batch`]).
pub fn assemble(pool: &[String], use_free_space: bool) -> Vec<String> {
    let required = required_terms(use_free_space);
    assert!(
        pool.len() >= required,
        "pool has {} terms, layout needs {required}",
        pool.len()
    );
    let mut cells: Vec<String> = pool[..required].to_vec();
    if use_free_space {
        cells.insert(FREE_SPACE_INDEX, FREE_SPACE.to_string());
    }
    cells
}

/// The grid shown before any batch exists: the pool in input order, padded
/// with placeholders when there are not enough terms yet.
pub fn preview_cells(pool: &[String], use_free_space: bool) -> Vec<String> {
    let required = required_terms(use_free_space);
    let mut cells: Vec<String> = pool.iter().take(required).cloned().collect();
    cells.resize(required, PREVIEW_PLACEHOLDER.to_string());
    if use_free_space {
        cells.insert(FREE_SPACE_INDEX, FREE_SPACE.to_string());
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("term {i}")).collect()
    }

    #[test]
    fn test_required_terms() {
        assert_eq!(LayoutConfig::new(true).required_terms(), 24);
        assert_eq!(LayoutConfig::new(false).required_terms(), 25);
    }

    #[test]
    fn test_assemble_with_free_space() {
        let cells = assemble(&pool(30), true);
        assert_eq!(cells.len(), CELL_COUNT);
        assert_eq!(cells[FREE_SPACE_INDEX], FREE_SPACE);
        assert_eq!(cells[11], "term 11");
        // Everything after the centre shifts right by one.
        assert_eq!(cells[13], "term 12");
        assert_eq!(cells[24], "term 23");
        assert_eq!(cells.iter().filter(|c| *c == FREE_SPACE).count(), 1);
    }

    #[test]
    fn test_assemble_without_free_space() {
        let cells = assemble(&pool(25), false);
        assert_eq!(cells, pool(25));
        assert!(!cells.iter().any(|c| c == FREE_SPACE));
    }

    #[test]
    fn test_assemble_exact_pool_with_free_space() {
        let cells = assemble(&pool(24), true);
        assert_eq!(cells.len(), CELL_COUNT);
        assert_eq!(cells[FREE_SPACE_INDEX], FREE_SPACE);
    }

    #[test]
    #[should_panic]
    fn test_assemble_short_pool_panics() {
        assemble(&pool(24), false);
    }

    #[test]
    fn test_preview_pads_short_pool() {
        let cells = preview_cells(&pool(3), true);
        assert_eq!(cells.len(), CELL_COUNT);
        assert_eq!(&cells[..3], &pool(3)[..]);
        assert_eq!(cells[3], PREVIEW_PLACEHOLDER);
        assert_eq!(cells[FREE_SPACE_INDEX], FREE_SPACE);
        assert_eq!(cells[24], PREVIEW_PLACEHOLDER);
    }

    #[test]
    fn test_preview_truncates_long_pool() {
        let cells = preview_cells(&pool(40), false);
        assert_eq!(cells, pool(25));
    }

    #[test]
    fn test_card_accessors() {
        let card = Card::new(CardId::new(1), assemble(&pool(24), true), true);
        assert_eq!(card.cell(2, 2), Some(FREE_SPACE));
        assert_eq!(card.cell(0, 0), Some("term 0"));
        assert_eq!(card.cell(5, 0), None);
        assert_eq!(card.rows().count(), GRID_SIZE);
        assert!(card.is_free_cell(FREE_SPACE_INDEX));
        assert_eq!(card.terms().count(), 24);
    }

    #[test]
    fn test_term_named_free_space_is_not_marker() {
        let mut terms = pool(25);
        terms[0] = FREE_SPACE.to_string();
        let card = Card::new(CardId::new(1), assemble(&terms, false), false);
        assert!(!card.is_free_cell(0));
        assert!(!card.is_free_cell(FREE_SPACE_INDEX));
        assert_eq!(card.terms().count(), 25);
    }
}
