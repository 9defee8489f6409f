//! Persistence for the deck collection.
//!
//! A [`Serializer`] writes and reads the whole collection at once; the three
//! file formats are interchangeable and hold the same records.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Deck, Flashcard, HitState, Level, Theme, WordType};

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("{kind} id {id} leaves no room for another id")]
    IdOverflow { kind: &'static str, id: u32 },
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Persists and restores the full deck collection.
pub trait Serializer {
    /// Replace whatever the backing store held with `decks`.
    fn write(&self, decks: &[Deck]) -> Result<()>;

    fn read(&self) -> Result<Vec<Deck>>;
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| PersistenceError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, content).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Wrote {} bytes to {:?}", content.len(), path);
    Ok(())
}

/// Pretty-printed JSON array of decks.
pub struct JsonSerializer {
    path: PathBuf,
}

impl JsonSerializer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Serializer for JsonSerializer {
    fn write(&self, decks: &[Deck]) -> Result<()> {
        let json = serde_json::to_string_pretty(decks)?;
        write_file(&self.path, &json)
    }

    fn read(&self) -> Result<Vec<Deck>> {
        let json = read_file(&self.path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// YAML sequence of decks.
pub struct YamlSerializer {
    path: PathBuf,
}

impl YamlSerializer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Serializer for YamlSerializer {
    fn write(&self, decks: &[Deck]) -> Result<()> {
        let yaml = serde_yaml::to_string(decks)?;
        write_file(&self.path, &yaml)
    }

    fn read(&self) -> Result<Vec<Deck>> {
        let yaml = read_file(&self.path)?;
        Ok(serde_yaml::from_str(&yaml)?)
    }
}

/// Root element of the XML document: `<decks><deck ..>..</deck>..</decks>`.
///
/// Scalar fields are attributes. Element text is trimmed on read, attribute
/// values are not.
#[derive(Serialize, Deserialize)]
#[serde(rename = "decks")]
struct DeckDocument {
    #[serde(rename = "deck", default)]
    decks: Vec<XmlDeck>,
}

#[derive(Serialize, Deserialize)]
struct XmlDeck {
    #[serde(rename = "@id")]
    id: u32,
    #[serde(rename = "@title")]
    title: String,
    #[serde(rename = "@theme")]
    theme: Theme,
    #[serde(rename = "@level")]
    level: Level,
    #[serde(rename = "@lastPlayed", default, skip_serializing_if = "Option::is_none")]
    last_played: Option<NaiveDate>,
    #[serde(rename = "@nextFlashcardId", default)]
    next_flashcard_id: u32,
    #[serde(rename = "flashcard", default)]
    flashcards: Vec<XmlFlashcard>,
}

#[derive(Serialize, Deserialize)]
struct XmlFlashcard {
    #[serde(rename = "@id")]
    id: u32,
    #[serde(rename = "@word")]
    word: String,
    #[serde(rename = "@meaning")]
    meaning: String,
    #[serde(rename = "@typeOfWord")]
    type_of_word: WordType,
    #[serde(rename = "@hitState", default)]
    hit_state: HitState,
    #[serde(rename = "@attempts", default)]
    attempts: u32,
    #[serde(rename = "@favourite", default)]
    favourite: bool,
}

impl From<&Deck> for XmlDeck {
    fn from(deck: &Deck) -> Self {
        Self {
            id: deck.id,
            title: deck.title.clone(),
            theme: deck.theme,
            level: deck.level,
            last_played: deck.last_played,
            next_flashcard_id: deck.next_flashcard_id,
            flashcards: deck.flashcards.iter().map(XmlFlashcard::from).collect(),
        }
    }
}

impl From<XmlDeck> for Deck {
    fn from(deck: XmlDeck) -> Self {
        Deck {
            id: deck.id,
            title: deck.title,
            theme: deck.theme,
            level: deck.level,
            last_played: deck.last_played,
            next_flashcard_id: deck.next_flashcard_id,
            flashcards: deck.flashcards.into_iter().map(Flashcard::from).collect(),
        }
    }
}

impl From<&Flashcard> for XmlFlashcard {
    fn from(card: &Flashcard) -> Self {
        Self {
            id: card.id,
            word: card.word.clone(),
            meaning: card.meaning.clone(),
            type_of_word: card.type_of_word,
            hit_state: card.hit_state,
            attempts: card.attempts,
            favourite: card.favourite,
        }
    }
}

impl From<XmlFlashcard> for Flashcard {
    fn from(card: XmlFlashcard) -> Self {
        Flashcard {
            id: card.id,
            word: card.word,
            meaning: card.meaning,
            type_of_word: card.type_of_word,
            hit_state: card.hit_state,
            attempts: card.attempts,
            favourite: card.favourite,
        }
    }
}

/// XML document with one `<deck>` element per deck.
pub struct XmlSerializer {
    path: PathBuf,
}

impl XmlSerializer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Serializer for XmlSerializer {
    fn write(&self, decks: &[Deck]) -> Result<()> {
        let document = DeckDocument {
            decks: decks.iter().map(XmlDeck::from).collect(),
        };
        let xml = quick_xml::se::to_string(&document)
            .map_err(|e| PersistenceError::Xml(e.to_string()))?;
        write_file(&self.path, &xml)
    }

    fn read(&self) -> Result<Vec<Deck>> {
        let xml = read_file(&self.path)?;
        let document: DeckDocument =
            quick_xml::de::from_str(&xml).map_err(|e| PersistenceError::Xml(e.to_string()))?;
        Ok(document.decks.into_iter().map(Deck::from).collect())
    }
}

/// The supported on-disk encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreFormat {
    Json,
    Yaml,
    Xml,
}

impl StoreFormat {
    /// Infer the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "xml" => Some(Self::Xml),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Xml => "xml",
        }
    }

    pub fn serializer(&self, path: impl Into<PathBuf>) -> Box<dyn Serializer> {
        match self {
            Self::Json => Box::new(JsonSerializer::new(path)),
            Self::Yaml => Box::new(YamlSerializer::new(path)),
            Self::Xml => Box::new(XmlSerializer::new(path)),
        }
    }
}

impl fmt::Display for StoreFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for StoreFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "xml" => Ok(Self::Xml),
            other => Err(format!("unknown store format '{}' (expected json, yaml or xml)", other)),
        }
    }
}

/// Default store location.
pub fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lexideck")
        .join("decks.json")
}
