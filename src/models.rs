//! Data models for flashcards and decks.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lowercases a user-supplied name and treats `-`, `_` and spaces alike.
fn normalize_name(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| if c == '-' || c == '_' { ' ' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// Implements `Display`, `FromStr` and serde for a closed set from its `ALL`
/// table and `name()`. Values are stored as their display names.
macro_rules! named_enum {
    ($ty:ident, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = normalize_name(s);
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| normalize_name(v.name()) == wanted)
                    .ok_or_else(|| {
                        let names: Vec<&str> = Self::ALL.iter().map(|v| v.name()).collect();
                        format!("unknown {} '{}' (expected one of: {})", $what, s, names.join(", "))
                    })
            }
        }

        impl Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.name())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let name = String::deserialize(deserializer)?;
                name.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Thematic classification of a deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Theme {
    Everyday,
    Academic,
    Professional,
    CulturalAndIdiomatic,
    EmotionsAndFeelings,
    /// Reserved for decks built by generation; never offered as a choice.
    Generated,
}

impl Theme {
    pub const ALL: [Theme; 6] = [
        Theme::Everyday,
        Theme::Academic,
        Theme::Professional,
        Theme::CulturalAndIdiomatic,
        Theme::EmotionsAndFeelings,
        Theme::Generated,
    ];

    /// Themes a user can pick for a deck.
    pub const SELECTABLE: [Theme; 5] = [
        Theme::Everyday,
        Theme::Academic,
        Theme::Professional,
        Theme::CulturalAndIdiomatic,
        Theme::EmotionsAndFeelings,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Everyday => "Everyday",
            Self::Academic => "Academic",
            Self::Professional => "Professional",
            Self::CulturalAndIdiomatic => "Cultural and Idiomatic",
            Self::EmotionsAndFeelings => "Emotions and Feelings",
            Self::Generated => "Generated",
        }
    }
}

named_enum!(Theme, "theme");

/// Difficulty level of a deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
    Proficient,
    /// Reserved for decks built by generation.
    Generated,
}

impl Level {
    pub const ALL: [Level; 5] = [
        Level::Beginner,
        Level::Intermediate,
        Level::Advanced,
        Level::Proficient,
        Level::Generated,
    ];

    pub const SELECTABLE: [Level; 4] = [
        Level::Beginner,
        Level::Intermediate,
        Level::Advanced,
        Level::Proficient,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
            Self::Proficient => "Proficient",
            Self::Generated => "Generated",
        }
    }
}

named_enum!(Level, "level");

/// Grammatical category of a flashcard's word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordType {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Expression,
}

impl WordType {
    pub const ALL: [WordType; 5] = [
        WordType::Noun,
        WordType::Verb,
        WordType::Adjective,
        WordType::Adverb,
        WordType::Expression,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Noun => "Noun",
            Self::Verb => "Verb",
            Self::Adjective => "Adjective",
            Self::Adverb => "Adverb",
            Self::Expression => "Expression",
        }
    }
}

named_enum!(WordType, "type of word");

/// Outcome of the most recent practice attempt on a flashcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HitState {
    #[default]
    NotAttempted,
    Hit,
    Miss,
}

impl HitState {
    pub const ALL: [HitState; 3] = [HitState::NotAttempted, HitState::Hit, HitState::Miss];

    pub fn name(&self) -> &'static str {
        match self {
            Self::NotAttempted => "Not Attempted",
            Self::Hit => "Hit",
            Self::Miss => "Miss",
        }
    }
}

named_enum!(HitState, "hit state");

/// Which flashcards a generated deck draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Miss,
    Hit,
    /// Every flashcard in the store.
    Random,
    Favourite,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Miss,
        Category::Hit,
        Category::Random,
        Category::Favourite,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Miss => "Miss",
            Self::Hit => "Hit",
            Self::Random => "Random",
            Self::Favourite => "Favourite",
        }
    }

    pub fn matches(&self, card: &Flashcard) -> bool {
        match self {
            Self::Miss => card.hit_state == HitState::Miss,
            Self::Hit => card.hit_state == HitState::Hit,
            Self::Random => true,
            Self::Favourite => card.favourite,
        }
    }
}

named_enum!(Category, "category");

/// A single flashcard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: u32,
    pub word: String,
    pub meaning: String,
    pub type_of_word: WordType,
    #[serde(default)]
    pub hit_state: HitState,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub favourite: bool,
}

impl Flashcard {
    pub fn new(word: impl Into<String>, meaning: impl Into<String>, type_of_word: WordType) -> Self {
        Self {
            id: 0,
            word: word.into(),
            meaning: meaning.into(),
            type_of_word,
            hit_state: HitState::NotAttempted,
            attempts: 0,
            favourite: false,
        }
    }
}

/// A collection of flashcards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: u32,
    pub title: String,
    pub theme: Theme,
    pub level: Level,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_played: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) next_flashcard_id: u32,
    #[serde(default)]
    pub(crate) flashcards: Vec<Flashcard>,
}

impl Deck {
    pub fn new(title: impl Into<String>, theme: Theme, level: Level) -> Self {
        Self {
            id: 0,
            title: title.into(),
            theme,
            level,
            last_played: None,
            next_flashcard_id: 0,
            flashcards: Vec::new(),
        }
    }

    /// An unsaved deck to hold flashcards drawn by generation.
    pub fn generated(category: Category, date: NaiveDate) -> Self {
        Self::new(
            format!(
                "Generated Deck ({}) in {}",
                category.name(),
                date.format("%d/%m/%Y")
            ),
            Theme::Generated,
            Level::Generated,
        )
    }

    /// Add a flashcard, assigning it the next id of this deck. `None` once
    /// the id space is used up.
    pub fn add_flashcard(&mut self, mut flashcard: Flashcard) -> Option<u32> {
        let id = self.next_flashcard_id;
        self.next_flashcard_id = id.checked_add(1)?;
        flashcard.id = id;
        self.flashcards.push(flashcard);
        Some(id)
    }

    /// Flashcards in id order.
    pub fn flashcards(&self) -> &[Flashcard] {
        &self.flashcards
    }

    pub fn find_flashcard(&self, id: u32) -> Option<&Flashcard> {
        self.flashcards.iter().find(|f| f.id == id)
    }

    pub fn find_flashcard_mut(&mut self, id: u32) -> Option<&mut Flashcard> {
        self.flashcards.iter_mut().find(|f| f.id == id)
    }

    pub fn delete_flashcard(&mut self, id: u32) -> bool {
        let before = self.flashcards.len();
        self.flashcards.retain(|f| f.id != id);
        self.flashcards.len() != before
    }

    /// Overwrite every mutable field of flashcard `id`; the id is kept.
    pub fn update_flashcard(&mut self, id: u32, new: &Flashcard) -> bool {
        match self.find_flashcard_mut(id) {
            Some(found) => {
                found.word = new.word.clone();
                found.meaning = new.meaning.clone();
                found.type_of_word = new.type_of_word;
                found.hit_state = new.hit_state;
                found.attempts = new.attempts;
                found.favourite = new.favourite;
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.flashcards.is_empty()
    }

    pub fn is_played(&self) -> bool {
        self.last_played.is_some()
    }

    pub fn mark_played(&mut self, date: NaiveDate) {
        self.last_played = Some(date);
    }

    pub fn number_of_flashcards(&self) -> usize {
        self.flashcards.len()
    }

    pub fn number_of_hits(&self) -> usize {
        self.get_hits().count()
    }

    pub fn number_of_misses(&self) -> usize {
        self.get_misses().count()
    }

    pub fn number_of_favourites(&self) -> usize {
        self.get_favourites().count()
    }

    pub fn get_hits(&self) -> impl Iterator<Item = &Flashcard> {
        self.matching(Category::Hit)
    }

    pub fn get_misses(&self) -> impl Iterator<Item = &Flashcard> {
        self.matching(Category::Miss)
    }

    pub fn get_favourites(&self) -> impl Iterator<Item = &Flashcard> {
        self.matching(Category::Favourite)
    }

    /// Flashcards belonging to a generation category.
    pub fn matching(&self, category: Category) -> impl Iterator<Item = &Flashcard> {
        self.flashcards.iter().filter(move |f| category.matches(f))
    }

    /// Share of hits in percent, rounded half-up to two decimals.
    pub fn calculate_hits_percentage(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let ratio = self.number_of_hits() as f64 / self.number_of_flashcards() as f64 * 100.0;
        Some((ratio * 100.0).round() / 100.0)
    }

    pub fn calculate_deck_average_attempt_no(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let total: u64 = self.flashcards.iter().map(|f| u64::from(f.attempts)).sum();
        Some(total as f64 / self.number_of_flashcards() as f64)
    }

    /// `None` for an empty deck, which has no meaningful count.
    pub fn calculate_no_of_favourite_flashcards(&self) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            Some(self.number_of_favourites())
        }
    }

    /// Bring the flashcard sequencer past every stored id, for records
    /// written without one. Fails with the offending id when no id can
    /// follow it.
    pub(crate) fn restore_sequencer(&mut self) -> Result<(), u32> {
        for card in &self.flashcards {
            let next = card.id.checked_add(1).ok_or(card.id)?;
            self.next_flashcard_id = self.next_flashcard_id.max(next);
        }
        Ok(())
    }
}
