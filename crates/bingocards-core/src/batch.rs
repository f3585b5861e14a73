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

use serde::Deserialize;
use serde::Serialize;

use crate::card::Card;
use crate::card::CardId;
use crate::card::FREE_SPACE;
use crate::card::LayoutConfig;
use crate::card::assemble;
use crate::error::GenerateError;
use crate::rng::RandomSource;
use crate::rng::shuffle;

/// Upper bound on cards per generation.
pub const MAX_QUANTITY: usize = 100;

/// The cards produced by one generate action.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Batch {
    config: LayoutConfig,
    cards: Vec<Card>,
}

impl Batch {
    pub fn config(&self) -> LayoutConfig {
        self.config
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Generate `quantity` independent cards from `pool`.
///
/// Each card gets its own shuffle of the whole pool. Either every card is
/// produced or none is.
pub fn generate_batch(
    pool: &[String],
    config: LayoutConfig,
    quantity: usize,
    rng: &mut impl RandomSource,
) -> Result<Batch, GenerateError> {
    let required = config.required_terms();
    if pool.len() < required {
        return Err(GenerateError::InsufficientTerms {
            required,
            actual: pool.len(),
        });
    }
    if quantity == 0 || quantity > MAX_QUANTITY {
        return Err(GenerateError::InvalidQuantity {
            requested: quantity,
            max: MAX_QUANTITY,
        });
    }
    if pool.iter().any(|term| term == FREE_SPACE) {
        log::warn!("A term reads '{FREE_SPACE}'; it will look like the centre marker.");
    }

    let cards: Vec<Card> = (0..quantity)
        .map(|i| {
            let shuffled = shuffle(pool, rng);
            let cells = assemble(&shuffled, config.use_free_space);
            Card::new(CardId::new(i as u64 + 1), cells, config.use_free_space)
        })
        .collect();
    log::info!("Generated {} card(s) from {} terms.", cards.len(), pool.len());
    Ok(Batch { config, cards })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::card::CELL_COUNT;
    use crate::card::FREE_SPACE_INDEX;
    use crate::rng::TinyRng;

    fn pool(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("term {i}")).collect()
    }

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[test]
    fn test_free_space_scenario() -> Result<(), GenerateError> {
        let terms = pool(24);
        let mut rng = TinyRng::from_seed(1);
        let batch = generate_batch(&terms, LayoutConfig::new(true), 3, &mut rng)?;
        assert_eq!(batch.len(), 3);
        for card in batch.cards() {
            assert_eq!(card.cells().len(), CELL_COUNT);
            assert_eq!(card.cells()[FREE_SPACE_INDEX], FREE_SPACE);
            let drawn: Vec<String> = card.terms().map(str::to_string).collect();
            assert_eq!(sorted(drawn), sorted(terms.clone()));
        }
        Ok(())
    }

    #[test]
    fn test_full_grid_scenario() -> Result<(), GenerateError> {
        let terms = pool(25);
        let mut rng = TinyRng::from_seed(2);
        let batch = generate_batch(&terms, LayoutConfig::new(false), 1, &mut rng)?;
        assert_eq!(batch.len(), 1);
        let card = &batch.cards()[0];
        assert!(!card.cells().iter().any(|c| c == FREE_SPACE));
        assert_eq!(sorted(card.cells().to_vec()), sorted(terms));
        Ok(())
    }

    #[test]
    fn test_insufficient_terms_scenario() {
        let mut rng = TinyRng::from_seed(3);
        let result = generate_batch(&pool(10), LayoutConfig::new(true), 5, &mut rng);
        assert_eq!(
            result,
            Err(GenerateError::InsufficientTerms {
                required: 24,
                actual: 10
            })
        );
    }

    #[test]
    fn test_one_short_is_rejected() {
        let mut rng = TinyRng::from_seed(4);
        for use_free_space in [true, false] {
            let config = LayoutConfig::new(use_free_space);
            let short = pool(config.required_terms() - 1);
            let result = generate_batch(&short, config, 1, &mut rng);
            assert!(matches!(
                result,
                Err(GenerateError::InsufficientTerms { required, actual })
                    if required == config.required_terms() && actual == short.len()
            ));
        }
    }

    #[test]
    fn test_quantity_bounds() {
        let terms = pool(30);
        let mut rng = TinyRng::from_seed(5);
        assert_eq!(
            generate_batch(&terms, LayoutConfig::default(), 0, &mut rng),
            Err(GenerateError::InvalidQuantity {
                requested: 0,
                max: MAX_QUANTITY
            })
        );
        assert!(
            generate_batch(&terms, LayoutConfig::default(), MAX_QUANTITY + 1, &mut rng).is_err()
        );
        let batch = generate_batch(&terms, LayoutConfig::default(), MAX_QUANTITY, &mut rng);
        assert_eq!(batch.map(|b| b.len()), Ok(MAX_QUANTITY));
    }

    #[test]
    fn test_ids_unique_within_batch() -> Result<(), GenerateError> {
        let mut rng = TinyRng::from_seed(6);
        let batch = generate_batch(&pool(40), LayoutConfig::default(), 50, &mut rng)?;
        let ids: HashSet<CardId> = batch.cards().iter().map(|c| c.id()).collect();
        assert_eq!(ids.len(), 50);
        Ok(())
    }

    #[test]
    fn test_no_repeats_within_card_from_larger_pool() -> Result<(), GenerateError> {
        let terms = pool(60);
        let mut rng = TinyRng::from_seed(7);
        let batch = generate_batch(&terms, LayoutConfig::new(false), 10, &mut rng)?;
        for card in batch.cards() {
            let distinct: HashSet<&str> = card.terms().collect();
            assert_eq!(distinct.len(), CELL_COUNT);
            assert!(distinct.iter().all(|t| terms.iter().any(|p| p == t)));
        }
        Ok(())
    }

    #[test]
    fn test_cards_are_shuffled_independently() -> Result<(), GenerateError> {
        let mut rng = TinyRng::from_seed(8);
        let batch = generate_batch(&pool(40), LayoutConfig::default(), 5, &mut rng)?;
        let layouts: HashSet<Vec<String>> =
            batch.cards().iter().map(|c| c.cells().to_vec()).collect();
        assert!(layouts.len() > 1);
        Ok(())
    }

    #[test]
    fn test_same_seed_same_batch() -> Result<(), GenerateError> {
        let terms = pool(30);
        let a = generate_batch(&terms, LayoutConfig::default(), 4, &mut TinyRng::from_seed(9))?;
        let b = generate_batch(&terms, LayoutConfig::default(), 4, &mut TinyRng::from_seed(9))?;
        assert_eq!(a, b);
        Ok(())
    }
}
