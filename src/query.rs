//! Filters, orderings and the named deck listings built from them.

use std::cmp::Ordering;

use crate::models::{Deck, Level, Theme};

/// Which decks a listing keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckFilter {
    All,
    WithFlashcards,
    Empty,
    Theme { theme: Theme, include_empty: bool },
    Level { level: Level, include_empty: bool },
    Played,
    /// Has flashcards but no play date.
    NeverPlayed,
    PlayedWithFavourites,
}

impl DeckFilter {
    pub fn matches(&self, deck: &Deck) -> bool {
        match *self {
            Self::All => true,
            Self::WithFlashcards => !deck.is_empty(),
            Self::Empty => deck.is_empty(),
            Self::Theme { theme, include_empty } => {
                deck.theme == theme && (include_empty || !deck.is_empty())
            }
            Self::Level { level, include_empty } => {
                deck.level == level && (include_empty || !deck.is_empty())
            }
            Self::Played => deck.is_played(),
            Self::NeverPlayed => !deck.is_empty() && !deck.is_played(),
            Self::PlayedWithFavourites => {
                deck.is_played() && deck.calculate_no_of_favourite_flashcards().unwrap_or(0) > 0
            }
        }
    }
}

/// How a listing orders the decks it keeps. Sorting is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckOrder {
    Insertion,
    LastPlayedAscending,
    LastPlayedDescending,
    HitsDescending,
    /// Fewest hits first, i.e. the decks with the most misses lead.
    HitsAscending,
    AverageAttemptsDescending,
    AverageAttemptsAscending,
    FavouritesDescending,
}

impl DeckOrder {
    pub fn compare(&self, a: &Deck, b: &Deck) -> Ordering {
        match self {
            Self::Insertion => Ordering::Equal,
            Self::LastPlayedAscending => a.last_played.cmp(&b.last_played),
            Self::LastPlayedDescending => b.last_played.cmp(&a.last_played),
            Self::HitsDescending => b.number_of_hits().cmp(&a.number_of_hits()),
            Self::HitsAscending => a.number_of_hits().cmp(&b.number_of_hits()),
            Self::AverageAttemptsDescending => compare_optional(
                b.calculate_deck_average_attempt_no(),
                a.calculate_deck_average_attempt_no(),
            ),
            Self::AverageAttemptsAscending => compare_optional(
                a.calculate_deck_average_attempt_no(),
                b.calculate_deck_average_attempt_no(),
            ),
            Self::FavouritesDescending => b
                .calculate_no_of_favourite_flashcards()
                .cmp(&a.calculate_no_of_favourite_flashcards()),
        }
    }
}

// `None` sorts below every value.
fn compare_optional(a: Option<f64>, b: Option<f64>) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// The deck listings offered to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    AllDecks,
    EmptyDecks,
    DecksWithFlashcards,
    ByTheme(Theme),
    ByThemeNotEmpty(Theme),
    ByLevel(Level),
    ByLevelNotEmpty(Level),
    MostRecentlyPlayed,
    LeastRecentlyPlayed,
    NeverPlayed,
    MostHits,
    MostMisses,
    HighestAverageAttempts,
    LowestAverageAttempts,
    MostFavourites,
}

const NOT_PLAYED_YET: &str = "You have not played with any deck yet.";

impl Listing {
    pub fn filter(&self) -> DeckFilter {
        match *self {
            Self::AllDecks => DeckFilter::All,
            Self::EmptyDecks => DeckFilter::Empty,
            Self::DecksWithFlashcards => DeckFilter::WithFlashcards,
            Self::ByTheme(theme) => DeckFilter::Theme { theme, include_empty: true },
            Self::ByThemeNotEmpty(theme) => DeckFilter::Theme { theme, include_empty: false },
            Self::ByLevel(level) => DeckFilter::Level { level, include_empty: true },
            Self::ByLevelNotEmpty(level) => DeckFilter::Level { level, include_empty: false },
            Self::NeverPlayed => DeckFilter::NeverPlayed,
            Self::MostFavourites => DeckFilter::PlayedWithFavourites,
            Self::MostRecentlyPlayed
            | Self::LeastRecentlyPlayed
            | Self::MostHits
            | Self::MostMisses
            | Self::HighestAverageAttempts
            | Self::LowestAverageAttempts => DeckFilter::Played,
        }
    }

    pub fn order(&self) -> DeckOrder {
        match self {
            Self::MostRecentlyPlayed => DeckOrder::LastPlayedDescending,
            Self::LeastRecentlyPlayed => DeckOrder::LastPlayedAscending,
            Self::MostHits => DeckOrder::HitsDescending,
            Self::MostMisses => DeckOrder::HitsAscending,
            Self::HighestAverageAttempts => DeckOrder::AverageAttemptsDescending,
            Self::LowestAverageAttempts => DeckOrder::AverageAttemptsAscending,
            Self::MostFavourites => DeckOrder::FavouritesDescending,
            _ => DeckOrder::Insertion,
        }
    }

    /// Message shown when the listing keeps no decks.
    pub fn empty_message(&self) -> &'static str {
        match self {
            Self::AllDecks => "No decks stored",
            Self::EmptyDecks => "No empty decks stored",
            Self::DecksWithFlashcards => "No decks with flashcards stored",
            Self::ByTheme(_) => "No decks with this theme stored",
            Self::ByThemeNotEmpty(_) => "No decks with flashcards with this theme stored",
            Self::ByLevel(_) => "No decks with this level stored",
            Self::ByLevelNotEmpty(_) => "No decks with flashcards with this level stored",
            Self::NeverPlayed => {
                "There is either no decks with flashcards that haven't already been played or no decks with flashcards at all"
            }
            Self::MostFavourites => {
                "You have either not played with any deck or not marked a flashcard as a favourite yet."
            }
            Self::MostRecentlyPlayed
            | Self::LeastRecentlyPlayed
            | Self::MostHits
            | Self::MostMisses
            | Self::HighestAverageAttempts
            | Self::LowestAverageAttempts => NOT_PLAYED_YET,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::AllDecks => "All decks",
            Self::EmptyDecks => "Empty decks",
            Self::DecksWithFlashcards => "Decks with flashcards",
            Self::ByTheme(_) | Self::ByThemeNotEmpty(_) => "Decks by theme",
            Self::ByLevel(_) | Self::ByLevelNotEmpty(_) => "Decks by level",
            Self::MostRecentlyPlayed => "Most recently played decks",
            Self::LeastRecentlyPlayed => "Least recently played decks",
            Self::NeverPlayed => "Never played decks",
            Self::MostHits => "Decks by number of hits",
            Self::MostMisses => "Decks by number of misses",
            Self::HighestAverageAttempts => "Decks by highest average number of attempts",
            Self::LowestAverageAttempts => "Decks by lowest average number of attempts",
            Self::MostFavourites => "Decks by highest number of flashcards marked as favourite",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Flashcard, HitState, WordType};
    use chrono::NaiveDate;

    fn deck_with(hits: usize, misses: usize) -> Deck {
        let mut deck = Deck::new("d", Theme::Everyday, Level::Beginner);
        for _ in 0..hits {
            deck.add_flashcard(Flashcard {
                hit_state: HitState::Hit,
                ..Flashcard::new("w", "m", WordType::Verb)
            });
        }
        for _ in 0..misses {
            deck.add_flashcard(Flashcard {
                hit_state: HitState::Miss,
                ..Flashcard::new("w", "m", WordType::Verb)
            });
        }
        deck
    }

    #[test]
    fn test_never_played_requires_flashcards() {
        let empty = Deck::new("e", Theme::Everyday, Level::Beginner);
        assert!(!DeckFilter::NeverPlayed.matches(&empty));
        assert!(DeckFilter::NeverPlayed.matches(&deck_with(1, 0)));

        let mut played = deck_with(1, 0);
        played.mark_played(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(!DeckFilter::NeverPlayed.matches(&played));
    }

    #[test]
    fn test_theme_filter_include_empty() {
        let empty = Deck::new("e", Theme::Academic, Level::Beginner);
        let mut filled = deck_with(1, 1);
        filled.theme = Theme::Academic;
        let with = DeckFilter::Theme { theme: Theme::Academic, include_empty: true };
        let without = DeckFilter::Theme { theme: Theme::Academic, include_empty: false };
        assert!(with.matches(&empty));
        assert!(!without.matches(&empty));
        assert!(without.matches(&filled));
    }

    #[test]
    fn test_hits_orders() {
        let few = deck_with(1, 3);
        let many = deck_with(3, 1);
        assert_eq!(DeckOrder::HitsDescending.compare(&many, &few), Ordering::Less);
        assert_eq!(DeckOrder::HitsAscending.compare(&many, &few), Ordering::Greater);
        assert_eq!(DeckOrder::Insertion.compare(&many, &few), Ordering::Equal);
    }

    #[test]
    fn test_absent_average_sorts_lowest() {
        let empty = Deck::new("e", Theme::Everyday, Level::Beginner);
        let filled = deck_with(1, 0);
        assert_eq!(
            DeckOrder::AverageAttemptsAscending.compare(&empty, &filled),
            Ordering::Less
        );
    }
}
