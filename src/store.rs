//! The deck collection and its query, statistics and generation engine.

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::models::{Category, Deck, Flashcard, Level, Theme};
use crate::persistence::{self, PersistenceError, Serializer};
use crate::query::{DeckFilter, DeckOrder, Listing};
use crate::render;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GenerateError {
    #[error("asked for {requested} flashcards but only {available} match")]
    NotEnoughFlashcards { requested: usize, available: usize },
}

/// A generated deck plus, per flashcard id, the `(deck id, flashcard id)`
/// it was copied from.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDeck {
    pub deck: Deck,
    origins: Vec<(u32, u32)>,
}

impl GeneratedDeck {
    pub fn origin(&self, card_id: u32) -> Option<(u32, u32)> {
        self.origins.get(usize::try_from(card_id).ok()?).copied()
    }

    pub fn into_deck(self) -> Deck {
        self.deck
    }
}

/// Owns every deck and hands out deck ids.
#[derive(Debug, Default)]
pub struct DeckStore {
    decks: Vec<Deck>,
    next_deck_id: u32,
}

impl DeckStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decks(&self) -> &[Deck] {
        &self.decks
    }

    // ══════════════════════════════════════════════════════════════════════
    // CRUD
    // ══════════════════════════════════════════════════════════════════════

    /// Add a deck under the next deck id and return that id. `None` once
    /// the id space is used up.
    pub fn add_deck(&mut self, mut deck: Deck) -> Option<u32> {
        let id = self.next_deck_id;
        self.next_deck_id = id.checked_add(1)?;
        deck.id = id;
        log::info!("Added deck {} '{}'", id, deck.title);
        self.decks.push(deck);
        Some(id)
    }

    pub fn delete_deck(&mut self, id: u32) -> bool {
        let before = self.decks.len();
        self.decks.retain(|d| d.id != id);
        let removed = self.decks.len() != before;
        if removed {
            log::info!("Deleted deck {}", id);
        }
        removed
    }

    /// Replace the title, theme and level of deck `id`. Flashcards and the
    /// play date are left alone.
    pub fn update_deck(&mut self, id: u32, new: &Deck) -> bool {
        match self.find_deck_mut(id) {
            Some(found) => {
                found.title = new.title.clone();
                found.theme = new.theme;
                found.level = new.level;
                log::info!("Updated deck {}", id);
                true
            }
            None => false,
        }
    }

    pub fn find_deck(&self, id: u32) -> Option<&Deck> {
        self.decks.iter().find(|d| d.id == id)
    }

    pub fn find_deck_mut(&mut self, id: u32) -> Option<&mut Deck> {
        self.decks.iter_mut().find(|d| d.id == id)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Listing
    // ══════════════════════════════════════════════════════════════════════

    /// Decks kept by `filter`, stably sorted by `order`.
    pub fn query(&self, filter: DeckFilter, order: DeckOrder) -> Vec<&Deck> {
        let mut found: Vec<&Deck> = self.decks.iter().filter(|d| filter.matches(d)).collect();
        found.sort_by(|a, b| order.compare(a, b));
        found
    }

    /// Render a named listing, or its empty message when nothing matches.
    pub fn list(&self, listing: Listing) -> String {
        let found = self.query(listing.filter(), listing.order());
        render::format_listing(&found, listing.empty_message())
    }

    pub fn search_decks_by_title(&self, search: &str) -> String {
        let needle = search.to_lowercase();
        let found: Vec<&Deck> = self
            .decks
            .iter()
            .filter(|d| d.title.to_lowercase().contains(&needle))
            .collect();
        let empty_message = format!("No decks with the title {} were found.", search);
        render::format_listing(&found, &empty_message)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Counters
    // ══════════════════════════════════════════════════════════════════════

    fn count(&self, filter: DeckFilter) -> usize {
        self.decks.iter().filter(|d| filter.matches(d)).count()
    }

    pub fn number_of_decks(&self) -> usize {
        self.decks.len()
    }

    pub fn number_of_decks_with_flashcards(&self) -> usize {
        self.count(DeckFilter::WithFlashcards)
    }

    pub fn number_of_empty_decks(&self) -> usize {
        self.count(DeckFilter::Empty)
    }

    pub fn number_of_decks_played(&self) -> usize {
        self.count(DeckFilter::Played)
    }

    pub fn number_of_decks_never_played(&self) -> usize {
        self.count(DeckFilter::NeverPlayed)
    }

    pub fn number_of_decks_by_theme(&self, theme: Theme) -> usize {
        self.count(DeckFilter::Theme { theme, include_empty: true })
    }

    pub fn number_of_decks_by_theme_not_empty(&self, theme: Theme) -> usize {
        self.count(DeckFilter::Theme { theme, include_empty: false })
    }

    pub fn number_of_decks_by_level(&self, level: Level) -> usize {
        self.count(DeckFilter::Level { level, include_empty: true })
    }

    pub fn number_of_decks_by_level_not_empty(&self, level: Level) -> usize {
        self.count(DeckFilter::Level { level, include_empty: false })
    }

    pub fn calculate_overall_number_of_hits(&self) -> usize {
        self.decks.iter().map(Deck::number_of_hits).sum()
    }

    pub fn calculate_overall_number_of_misses(&self) -> usize {
        self.decks.iter().map(Deck::number_of_misses).sum()
    }

    pub fn calculate_overall_number_of_flashcards(&self) -> usize {
        self.decks.iter().map(Deck::number_of_flashcards).sum()
    }

    pub fn calculate_overall_number_of_favourites(&self) -> usize {
        self.decks.iter().map(Deck::number_of_favourites).sum()
    }

    /// How many flashcards generation can draw for `category`.
    pub fn pool_size(&self, category: Category) -> usize {
        match category {
            Category::Miss => self.calculate_overall_number_of_misses(),
            Category::Hit => self.calculate_overall_number_of_hits(),
            Category::Random => self.calculate_overall_number_of_flashcards(),
            Category::Favourite => self.calculate_overall_number_of_favourites(),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Generation
    // ══════════════════════════════════════════════════════════════════════

    /// Draw `count` distinct flashcards of `category` from every deck.
    ///
    /// Returns `Ok(None)` when no flashcard matches. Asking for more than
    /// [`pool_size`](Self::pool_size) is an error rather than a silent cap.
    pub fn generate_set_of_flashcards(
        &self,
        category: Category,
        count: usize,
    ) -> Result<Option<Vec<Flashcard>>, GenerateError> {
        self.generate_set_of_flashcards_with(&mut rand::thread_rng(), category, count)
    }

    pub fn generate_set_of_flashcards_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        category: Category,
        count: usize,
    ) -> Result<Option<Vec<Flashcard>>, GenerateError> {
        let drawn = self.draw(rng, category, count)?;
        Ok(drawn.map(|cards| cards.into_iter().map(|(_, card)| card.clone()).collect()))
    }

    /// Sample `count` matching flashcards, each with the id of its deck.
    fn draw<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        category: Category,
        count: usize,
    ) -> Result<Option<Vec<(u32, &Flashcard)>>, GenerateError> {
        let pool: Vec<(u32, &Flashcard)> = self
            .decks
            .iter()
            .flat_map(|d| d.matching(category).map(move |card| (d.id, card)))
            .collect();

        if pool.is_empty() {
            log::info!("No {} flashcards to generate from", category);
            return Ok(None);
        }
        if count > pool.len() {
            return Err(GenerateError::NotEnoughFlashcards {
                requested: count,
                available: pool.len(),
            });
        }

        let chosen: Vec<(u32, &Flashcard)> = pool.choose_multiple(rng, count).copied().collect();
        log::info!("Generated {} {} flashcards from a pool of {}", chosen.len(), category, pool.len());
        Ok(Some(chosen))
    }

    /// Build an unsaved deck from a generated set. The drawn flashcards are
    /// copies numbered by the new deck; each remembers the card it came from.
    pub fn generate_deck(
        &self,
        category: Category,
        count: usize,
        today: NaiveDate,
    ) -> Result<Option<GeneratedDeck>, GenerateError> {
        self.generate_deck_with(&mut rand::thread_rng(), category, count, today)
    }

    pub fn generate_deck_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        category: Category,
        count: usize,
        today: NaiveDate,
    ) -> Result<Option<GeneratedDeck>, GenerateError> {
        let Some(drawn) = self.draw(rng, category, count)? else {
            return Ok(None);
        };
        let mut deck = Deck::generated(category, today);
        let mut origins = Vec::with_capacity(drawn.len());
        for (deck_id, card) in drawn {
            origins.push((deck_id, card.id));
            deck.add_flashcard(card.clone());
        }
        Ok(Some(GeneratedDeck { deck, origins }))
    }

    /// Copy the practice results of a generated deck back onto the cards
    /// it was drawn from. Returns how many source cards changed.
    pub fn apply_generated(&mut self, generated: &GeneratedDeck) -> usize {
        let mut changed = 0;
        for card in generated.deck.flashcards() {
            let Some((deck_id, card_id)) = generated.origin(card.id) else {
                continue;
            };
            let Some(source) = self
                .find_deck_mut(deck_id)
                .and_then(|deck| deck.find_flashcard_mut(card_id))
            else {
                continue;
            };
            if source.hit_state != card.hit_state
                || source.attempts != card.attempts
                || source.favourite != card.favourite
            {
                source.hit_state = card.hit_state;
                source.attempts = card.attempts;
                source.favourite = card.favourite;
                changed += 1;
            }
        }
        log::info!("Applied generated deck results to {} flashcards", changed);
        changed
    }

    // ══════════════════════════════════════════════════════════════════════
    // Persistence
    // ══════════════════════════════════════════════════════════════════════

    /// Replace the collection with what `serializer` holds. The deck id
    /// sequencer only moves forward.
    pub fn load(&mut self, serializer: &dyn Serializer) -> persistence::Result<()> {
        let mut decks = serializer.read()?;
        let mut next_deck_id = self.next_deck_id;
        for deck in &mut decks {
            deck.restore_sequencer()
                .map_err(|id| PersistenceError::IdOverflow { kind: "flashcard", id })?;
            let next = deck.id.checked_add(1).ok_or(PersistenceError::IdOverflow {
                kind: "deck",
                id: deck.id,
            })?;
            next_deck_id = next_deck_id.max(next);
        }
        self.next_deck_id = next_deck_id;
        log::info!("Loaded {} decks", decks.len());
        self.decks = decks;
        Ok(())
    }

    pub fn store(&self, serializer: &dyn Serializer) -> persistence::Result<()> {
        serializer.write(&self.decks)?;
        log::info!("Stored {} decks", self.decks.len());
        Ok(())
    }
}
