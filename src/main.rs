//! Lexideck - vocabulary flashcard decks in the terminal
//!
//! Each invocation loads the deck collection, runs one command and saves the
//! collection again when the command changed it.

mod console;

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};

use lexideck::config::Config;
use lexideck::models::{Category, Deck, Flashcard, Level, Theme, WordType};
use lexideck::persistence::{PersistenceError, Serializer, StoreFormat};
use lexideck::play::{self, FavouriteOutcome, PlayError};
use lexideck::query::Listing;
use lexideck::render;
use lexideck::store::DeckStore;

use console::ConsolePrompter;

// ══════════════════════════════════════════════════════════════════════════
// CLI Arguments
// ══════════════════════════════════════════════════════════════════════════

#[derive(Parser, Debug)]
#[command(name = "lexideck")]
#[command(author, version, about = "Vocabulary flashcard decks in the terminal", long_about = None)]
struct Args {
    /// Deck collection file (default: from config, else the data directory)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Store encoding: json, yaml or xml (default: from the file extension)
    #[arg(long, global = true)]
    format: Option<StoreFormat>,

    /// Config file to use instead of the default one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create, list, change and remove decks
    #[command(subcommand)]
    Deck(DeckCommand),

    /// Add, change and remove flashcards in a deck
    #[command(subcommand)]
    Card(CardCommand),

    /// Practise a deck, or a deck generated from the whole collection
    Play {
        /// Deck to play
        #[arg(required_unless_present = "generate", conflicts_with = "generate")]
        deck: Option<u32>,
        /// Draw flashcards of this category: miss, hit, random or favourite
        #[arg(long, requires = "count")]
        generate: Option<Category>,
        /// Number of flashcards in the generated deck
        #[arg(long)]
        count: Option<usize>,
        /// Save the generated deck after playing it
        #[arg(long, requires = "generate")]
        keep: bool,
    },

    /// Mark flashcards of a deck as favourite
    Favourite {
        deck: u32,
        #[arg(required = true)]
        cards: Vec<u32>,
    },

    /// Show collection-wide counters
    Stats,

    /// Write the collection to another file (format from --format, else its extension)
    Export { path: PathBuf },

    /// Replace the collection with the contents of another file (format as for export)
    Import { path: PathBuf },
}

#[derive(Subcommand, Debug)]
enum DeckCommand {
    /// Create an empty deck
    Add {
        #[arg(value_parser = non_blank)]
        title: String,
        #[arg(long)]
        theme: Theme,
        #[arg(long)]
        level: Level,
    },

    /// List decks
    List {
        #[arg(value_enum, default_value = "all")]
        view: ListView,
        /// Only decks of this theme
        #[arg(long, conflicts_with = "level")]
        theme: Option<Theme>,
        /// Only decks of this level
        #[arg(long)]
        level: Option<Level>,
        /// With --theme or --level, leave out decks without flashcards
        #[arg(long)]
        not_empty: bool,
    },

    /// Change the title, theme or level of a deck
    Update {
        id: u32,
        #[arg(long, value_parser = non_blank)]
        title: Option<String>,
        #[arg(long)]
        theme: Option<Theme>,
        #[arg(long)]
        level: Option<Level>,
    },

    /// Remove a deck and its flashcards
    Delete { id: u32 },

    /// Find decks whose title contains the text, ignoring case
    Search { title: String },

    /// Show one deck and its flashcards
    Show { id: u32 },
}

#[derive(Subcommand, Debug)]
enum CardCommand {
    /// Add a flashcard to a deck
    Add {
        deck: u32,
        #[arg(value_parser = non_blank)]
        word: String,
        #[arg(value_parser = non_blank)]
        meaning: String,
        #[arg(long = "type")]
        type_of_word: WordType,
    },

    /// Change the word, meaning or type of a flashcard
    Update {
        deck: u32,
        id: u32,
        #[arg(long, value_parser = non_blank)]
        word: Option<String>,
        #[arg(long, value_parser = non_blank)]
        meaning: Option<String>,
        #[arg(long = "type")]
        type_of_word: Option<WordType>,
    },

    /// Remove a flashcard from a deck
    Delete { deck: u32, id: u32 },
}

/// Trimmed text, rejected when nothing is left.
fn non_blank(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err("must not be empty".to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ListView {
    All,
    Empty,
    WithFlashcards,
    Recent,
    Oldest,
    NeverPlayed,
    Hits,
    Misses,
    MostAttempts,
    FewestAttempts,
    Favourites,
}

impl ListView {
    fn listing(self) -> Listing {
        match self {
            Self::All => Listing::AllDecks,
            Self::Empty => Listing::EmptyDecks,
            Self::WithFlashcards => Listing::DecksWithFlashcards,
            Self::Recent => Listing::MostRecentlyPlayed,
            Self::Oldest => Listing::LeastRecentlyPlayed,
            Self::NeverPlayed => Listing::NeverPlayed,
            Self::Hits => Listing::MostHits,
            Self::Misses => Listing::MostMisses,
            Self::MostAttempts => Listing::HighestAverageAttempts,
            Self::FewestAttempts => Listing::LowestAverageAttempts,
            Self::Favourites => Listing::MostFavourites,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Main Entry Point
// ══════════════════════════════════════════════════════════════════════════

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|err| {
            log::warn!("Ignoring unreadable config: {:#}", err);
            Config::default()
        }),
    };

    let store_path = args.store.clone().unwrap_or_else(|| config.resolved_store_path());
    let format = args.format.unwrap_or_else(|| config.resolved_format(&store_path));
    let serializer = format.serializer(&store_path);
    let color = config.color && !args.no_color && io::stdout().is_terminal();

    let mut store = load_store(serializer.as_ref(), &store_path)?;
    let changed = run(&args.command, &mut store, &config, args.format, color)?;

    if changed {
        store
            .store(serializer.as_ref())
            .with_context(|| format!("Failed to save decks to {:?}", store_path))?;
    }
    Ok(())
}

/// A missing store file is an empty collection.
fn load_store(serializer: &dyn Serializer, path: &Path) -> Result<DeckStore> {
    let mut store = DeckStore::new();
    match store.load(serializer) {
        Ok(()) => {}
        Err(PersistenceError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            log::info!("No store at {:?} yet, starting empty", path);
        }
        Err(err) => return Err(err).with_context(|| format!("Failed to load decks from {:?}", path)),
    }
    Ok(store)
}

/// Run one command; returns whether the collection changed.
fn run(
    command: &Command,
    store: &mut DeckStore,
    config: &Config,
    format: Option<StoreFormat>,
    color: bool,
) -> Result<bool> {
    match command {
        Command::Deck(cmd) => run_deck(cmd, store),
        Command::Card(cmd) => run_card(cmd, store),
        Command::Play { deck: Some(id), .. } => play_stored(store, *id, config, color),
        Command::Play {
            generate: Some(category),
            count,
            keep,
            ..
        } => play_generated(store, *category, count.unwrap_or(0), *keep, config, color),
        Command::Play { .. } => bail!("Choose a deck id or --generate"),
        Command::Favourite { deck, cards } => {
            let deck = find_deck_mut(store, *deck)?;
            let mut changed = false;
            for id in cards {
                changed |= report_favourite(deck, *id);
            }
            Ok(changed)
        }
        Command::Stats => {
            println!("{}", render::format_stats(store));
            Ok(false)
        }
        Command::Export { path } => {
            let format = file_format(format, path);
            store
                .store(format.serializer(path).as_ref())
                .with_context(|| format!("Failed to export decks to {:?}", path))?;
            println!("✓ Exported {} decks to {:?}", store.number_of_decks(), path);
            Ok(false)
        }
        Command::Import { path } => {
            let format = file_format(format, path);
            store
                .load(format.serializer(path).as_ref())
                .with_context(|| format!("Failed to import decks from {:?}", path))?;
            println!("✓ Imported {} decks from {:?}", store.number_of_decks(), path);
            Ok(true)
        }
    }
}

/// `--format` when given, else the format named by the extension, else JSON.
fn file_format(format: Option<StoreFormat>, path: &Path) -> StoreFormat {
    format
        .or_else(|| StoreFormat::from_path(path))
        .unwrap_or(StoreFormat::Json)
}

fn find_deck_mut(store: &mut DeckStore, id: u32) -> Result<&mut Deck> {
    store
        .find_deck_mut(id)
        .with_context(|| format!("There is no deck with id {}", id))
}

// ══════════════════════════════════════════════════════════════════════════
// Decks and Flashcards
// ══════════════════════════════════════════════════════════════════════════

fn run_deck(cmd: &DeckCommand, store: &mut DeckStore) -> Result<bool> {
    match cmd {
        DeckCommand::Add { title, theme, level } => {
            let id = store
                .add_deck(Deck::new(title.clone(), *theme, *level))
                .context("No deck ids left")?;
            println!("✓ Added deck {} '{}'", id, title);
            Ok(true)
        }
        DeckCommand::List {
            view,
            theme,
            level,
            not_empty,
        } => {
            let listing = match (theme, level) {
                (Some(theme), _) if *not_empty => Listing::ByThemeNotEmpty(*theme),
                (Some(theme), _) => Listing::ByTheme(*theme),
                (_, Some(level)) if *not_empty => Listing::ByLevelNotEmpty(*level),
                (_, Some(level)) => Listing::ByLevel(*level),
                _ => view.listing(),
            };
            println!("{}:", listing.title());
            println!("{}", store.list(listing));
            Ok(false)
        }
        DeckCommand::Update {
            id,
            title,
            theme,
            level,
        } => {
            let current = store
                .find_deck(*id)
                .with_context(|| format!("There is no deck with id {}", id))?;
            let new = Deck::new(
                title.clone().unwrap_or_else(|| current.title.clone()),
                theme.unwrap_or(current.theme),
                level.unwrap_or(current.level),
            );
            store.update_deck(*id, &new);
            println!("✓ Updated deck {}", id);
            Ok(true)
        }
        DeckCommand::Delete { id } => {
            if !store.delete_deck(*id) {
                bail!("There is no deck with id {}", id);
            }
            println!("✓ Deleted deck {}", id);
            Ok(true)
        }
        DeckCommand::Search { title } => {
            println!("{}", store.search_decks_by_title(title));
            Ok(false)
        }
        DeckCommand::Show { id } => {
            let deck = store
                .find_deck(*id)
                .with_context(|| format!("There is no deck with id {}", id))?;
            println!("{}", render::format_deck(deck));
            Ok(false)
        }
    }
}

fn run_card(cmd: &CardCommand, store: &mut DeckStore) -> Result<bool> {
    match cmd {
        CardCommand::Add {
            deck,
            word,
            meaning,
            type_of_word,
        } => {
            let deck = find_deck_mut(store, *deck)?;
            let id = deck
                .add_flashcard(Flashcard::new(word.clone(), meaning.clone(), *type_of_word))
                .with_context(|| format!("No flashcard ids left in '{}'", deck.title))?;
            println!("✓ Added flashcard {} to '{}'", id, deck.title);
            Ok(true)
        }
        CardCommand::Update {
            deck,
            id,
            word,
            meaning,
            type_of_word,
        } => {
            let deck = find_deck_mut(store, *deck)?;
            let mut new = deck
                .find_flashcard(*id)
                .cloned()
                .with_context(|| format!("There is no flashcard with id {} in '{}'", id, deck.title))?;
            if let Some(word) = word {
                new.word = word.clone();
            }
            if let Some(meaning) = meaning {
                new.meaning = meaning.clone();
            }
            if let Some(type_of_word) = type_of_word {
                new.type_of_word = *type_of_word;
            }
            deck.update_flashcard(*id, &new);
            println!("✓ Updated flashcard {}", id);
            Ok(true)
        }
        CardCommand::Delete { deck, id } => {
            let deck = find_deck_mut(store, *deck)?;
            if !deck.delete_flashcard(*id) {
                bail!("There is no flashcard with id {} in '{}'", id, deck.title);
            }
            println!("✓ Deleted flashcard {}", id);
            Ok(true)
        }
    }
}

/// Print the outcome of a favourite request; returns whether it changed the deck.
fn report_favourite(deck: &mut Deck, id: u32) -> bool {
    match play::mark_favourite(deck, id) {
        FavouriteOutcome::Marked => {
            println!("Flashcard {} successfully marked as favourite.", id);
            true
        }
        FavouriteOutcome::AlreadyFavourite | FavouriteOutcome::NotFound => {
            println!(
                "Flashcard {} is either already marked as favourite or it doesn't exist in this deck.",
                id
            );
            false
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Play
// ══════════════════════════════════════════════════════════════════════════

fn play_stored(store: &mut DeckStore, id: u32, config: &Config, color: bool) -> Result<bool> {
    let deck = find_deck_mut(store, id)?;
    play_session(deck, config, color)
}

fn play_generated(
    store: &mut DeckStore,
    category: Category,
    count: usize,
    keep: bool,
    config: &Config,
    color: bool,
) -> Result<bool> {
    let today = Local::now().date_naive();
    let Some(mut generated) = store.generate_deck(category, count, today)? else {
        println!("You do not have cards marked as '{}'.", category);
        return Ok(false);
    };
    if generated.deck.is_empty() {
        bail!("Ask for at least one flashcard");
    }

    play_session(&mut generated.deck, config, color)?;
    let mut changed = store.apply_generated(&generated) > 0;
    if keep {
        let id = store
            .add_deck(generated.into_deck())
            .context("No deck ids left for the generated deck")?;
        println!("✓ Saved generated deck as {}", id);
        changed = true;
    }
    Ok(changed)
}

/// Play `deck` at the terminal, then offer to mark favourites.
/// Returns whether the deck changed.
fn play_session(deck: &mut Deck, config: &Config, color: bool) -> Result<bool> {
    let mut prompter = ConsolePrompter::new(config.think_seconds, color);
    let today = Local::now().date_naive();

    println!("{}", console::INSTRUCTIONS);
    let judged = match play::play_deck(deck, &mut prompter, &mut rand::thread_rng(), today) {
        Ok(outcome) => {
            println!();
            if outcome.cancelled {
                println!("Session stopped after {} flashcards.", outcome.judged);
            }
            println!(
                "Your percentage of hits is: {}",
                render::format_percentage(outcome.hits_percentage)
            );
            outcome.judged
        }
        Err(PlayError::EmptyDeck(id)) => {
            bail!("Deck {} has no flashcards yet. Add some before playing.", id)
        }
        // Keep what was judged; the collection is still saved.
        Err(PlayError::Io { judged, source }) if judged > 0 => {
            eprintln!("Error: session interrupted: {}", source);
            println!("Keeping the {} flashcards judged so far.", judged);
            return Ok(true);
        }
        Err(err) => return Err(err).context("Play session failed"),
    };

    let mut changed = judged > 0;
    if io::stdin().is_terminal() {
        for id in favourites_or_none(console::ask_favourites()) {
            changed |= report_favourite(deck, id);
        }
    }
    Ok(changed)
}

/// A failed favourites prompt marks nothing and leaves the session's results alone.
fn favourites_or_none(answer: io::Result<Vec<u32>>) -> Vec<u32> {
    answer.unwrap_or_else(|err| {
        log::warn!("Favourites prompt failed, marking none: {}", err);
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("lexideck").chain(args.iter().copied()))
    }

    #[test]
    fn test_blank_text_is_rejected() {
        assert!(parse(&["deck", "add", "", "--theme", "academic", "--level", "beginner"]).is_err());
        assert!(parse(&["deck", "add", "   ", "--theme", "academic", "--level", "beginner"]).is_err());
        assert!(parse(&["card", "add", "1", "", "school", "--type", "noun"]).is_err());
        assert!(parse(&["card", "add", "1", "école", " ", "--type", "noun"]).is_err());
        assert!(parse(&["card", "update", "1", "0", "--word", ""]).is_err());
        assert!(parse(&["deck", "update", "1", "--title", "\t"]).is_err());
    }

    #[test]
    fn test_text_is_trimmed() {
        let args = parse(&["card", "add", "1", "  école ", "school\n", "--type", "noun"]).unwrap();
        match args.command {
            Command::Card(CardCommand::Add { word, meaning, .. }) => {
                assert_eq!(word, "école");
                assert_eq!(meaning, "school");
            }
            other => panic!("unexpected command {:?}", other),
        }

        let args = parse(&["deck", "add", " Verbs ", "--theme", "everyday", "--level", "beginner"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Deck(DeckCommand::Add { ref title, .. }) if title == "Verbs"
        ));
    }

    #[test]
    fn test_favourites_prompt_failure_marks_none() {
        let eof = io::Error::new(io::ErrorKind::UnexpectedEof, "input closed");
        assert!(favourites_or_none(Err(eof)).is_empty());
        assert_eq!(favourites_or_none(Ok(vec![2, 0])), vec![2, 0]);
    }

    #[test]
    fn test_format_flag_wins_over_extension() {
        let path = Path::new("backup.json");
        assert_eq!(file_format(Some(StoreFormat::Yaml), path), StoreFormat::Yaml);
        assert_eq!(file_format(None, path), StoreFormat::Json);
        assert_eq!(file_format(None, Path::new("backup.xml")), StoreFormat::Xml);
        assert_eq!(file_format(None, Path::new("backup")), StoreFormat::Json);
    }
}
