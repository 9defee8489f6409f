//! Text rendering for decks, flashcards and play-mode cards.
//!
//! Entities carry no formatting of their own; everything a user reads is
//! built here from plain data.

use crossterm::style::Stylize;
use unicode_width::UnicodeWidthStr;

use crate::models::{Deck, Flashcard, Level, Theme};
use crate::play::Side;
use crate::store::DeckStore;

/// Placeholder for a deck without flashcards.
pub const NO_FLASHCARDS: &str = "\tNO FLASHCARDS ADDED";

/// Inner width of a play-mode card.
const CARD_WIDTH: usize = 44;

pub fn format_flashcard(card: &Flashcard) -> String {
    let mut line = format!(
        "#{} {} - {} ({}) | {} | attempts: {}",
        card.id, card.word, card.meaning, card.type_of_word, card.hit_state, card.attempts
    );
    if card.favourite {
        line.push_str(" | favourite");
    }
    line
}

pub fn list_flashcards(deck: &Deck) -> String {
    if deck.is_empty() {
        return NO_FLASHCARDS.to_string();
    }
    deck.flashcards
        .iter()
        .map(|card| format!("\t{}", format_flashcard(card)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_percentage(percentage: Option<f64>) -> String {
    match percentage {
        Some(p) => format!("{:.2}%", p),
        None => "n/a".to_string(),
    }
}

pub fn format_deck(deck: &Deck) -> String {
    let last_played = deck
        .last_played
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "never".to_string());
    format!(
        "[{}] {} | {} | {} | last played: {} | flashcards: {} | hits: {}\n{}",
        deck.id,
        deck.title,
        deck.theme,
        deck.level,
        last_played,
        deck.number_of_flashcards(),
        format_percentage(deck.calculate_hits_percentage()),
        list_flashcards(deck)
    )
}

pub fn format_decks(decks: &[&Deck]) -> String {
    decks
        .iter()
        .map(|deck| format_deck(deck))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The rendered decks, or `empty_message` when there are none.
pub fn format_listing(decks: &[&Deck], empty_message: &str) -> String {
    if decks.is_empty() {
        empty_message.to_string()
    } else {
        format_decks(decks)
    }
}

/// Collection-wide counters as a short report.
pub fn format_stats(store: &DeckStore) -> String {
    let mut lines = vec![
        format!("Decks:              {}", store.number_of_decks()),
        format!("  with flashcards:  {}", store.number_of_decks_with_flashcards()),
        format!("  empty:            {}", store.number_of_empty_decks()),
        format!("  played:           {}", store.number_of_decks_played()),
        format!("  never played:     {}", store.number_of_decks_never_played()),
        format!("Flashcards:         {}", store.calculate_overall_number_of_flashcards()),
        format!("  hits:             {}", store.calculate_overall_number_of_hits()),
        format!("  misses:           {}", store.calculate_overall_number_of_misses()),
        format!("  favourites:       {}", store.calculate_overall_number_of_favourites()),
        "By theme (with flashcards / all):".to_string(),
    ];
    for theme in Theme::SELECTABLE {
        lines.push(format!(
            "  {:<24}{} / {}",
            theme.name(),
            store.number_of_decks_by_theme_not_empty(theme),
            store.number_of_decks_by_theme(theme)
        ));
    }
    lines.push("By level (with flashcards / all):".to_string());
    for level in Level::SELECTABLE {
        lines.push(format!(
            "  {:<24}{} / {}",
            level.name(),
            store.number_of_decks_by_level_not_empty(level),
            store.number_of_decks_by_level(level)
        ));
    }
    lines.join("\n")
}

#[derive(Debug, Clone, Copy)]
enum Tint {
    Plain,
    Hidden,
    Revealed,
}

fn tint(text: &str, tint: Tint, color: bool) -> String {
    match (tint, color) {
        (Tint::Hidden, true) => text.red().to_string(),
        (Tint::Revealed, true) => text.green().to_string(),
        _ => text.to_string(),
    }
}

/// Push `label value` rows, wrapping the value under its label.
fn push_field(rows: &mut Vec<String>, label: &str, value: &str, value_tint: Tint, color: bool) {
    let indent = " ".repeat(label.len());
    for (i, part) in textwrap::wrap(value, CARD_WIDTH - label.len()).iter().enumerate() {
        let prefix = if i == 0 { label } else { indent.as_str() };
        let used = UnicodeWidthStr::width(prefix) + UnicodeWidthStr::width(part.as_ref());
        rows.push(format!(
            "| {}{}{} |",
            prefix,
            tint(part, value_tint, color),
            " ".repeat(CARD_WIDTH.saturating_sub(used))
        ));
    }
}

/// A play-mode card. The `hidden` side shows as `???` until `revealed`.
pub fn play_card(card: &Flashcard, hidden: Side, revealed: bool, color: bool) -> String {
    let face = |value: &str, side: Side| -> (String, Tint) {
        if side != hidden {
            (value.to_string(), Tint::Plain)
        } else if revealed {
            (value.to_string(), Tint::Revealed)
        } else {
            ("???".to_string(), Tint::Hidden)
        }
    };
    let (word, word_tint) = face(&card.word, Side::Word);
    let (meaning, meaning_tint) = face(&card.meaning, Side::Meaning);

    let rule = format!("+{}+", "-".repeat(CARD_WIDTH + 2));
    let rule = if color { rule.as_str().yellow().to_string() } else { rule };

    let mut rows = vec![rule.clone()];
    push_field(&mut rows, "ID: ", &card.id.to_string(), Tint::Plain, color);
    rows.push(rule.clone());
    push_field(&mut rows, "WORD: ", &word, word_tint, color);
    push_field(&mut rows, "TYPE: ", &format!("({})", card.type_of_word), Tint::Plain, color);
    rows.push(rule.clone());
    push_field(&mut rows, "MEANING: ", &meaning, meaning_tint, color);
    rows.push(rule);
    rows.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HitState, WordType};
    use crate::query::Listing;

    fn feelings() -> Deck {
        let mut deck = Deck::new("Mixed Feelings", Theme::EmotionsAndFeelings, Level::Intermediate);
        deck.add_flashcard(Flashcard {
            hit_state: HitState::Miss,
            favourite: true,
            ..Flashcard::new("Enthousiasme", "Enthusiasm", WordType::Noun)
        });
        deck.add_flashcard(Flashcard {
            hit_state: HitState::Hit,
            ..Flashcard::new("Déception", "Disappointment", WordType::Noun)
        });
        deck
    }

    #[test]
    fn test_list_flashcards_placeholder() {
        let deck = Deck::new("Empty", Theme::Everyday, Level::Beginner);
        assert_eq!(list_flashcards(&deck), "\tNO FLASHCARDS ADDED");
        assert!(list_flashcards(&deck).to_lowercase().contains("no flashcards added"));
    }

    #[test]
    fn test_list_flashcards_contents() {
        let listed = list_flashcards(&feelings());
        assert_eq!(listed.lines().count(), 2);
        assert!(listed.lines().all(|l| l.starts_with('\t')));
        assert!(listed.contains("#0 Enthousiasme - Enthusiasm (Noun) | Miss | attempts: 0 | favourite"));
        assert!(listed.contains("#1 Déception - Disappointment (Noun) | Hit | attempts: 0"));
    }

    #[test]
    fn test_format_deck_header() {
        let mut deck = feelings();
        deck.mark_played(chrono::NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        let first = format_deck(&deck).lines().next().unwrap().to_string();
        assert_eq!(
            first,
            "[0] Mixed Feelings | Emotions and Feelings | Intermediate | last played: 02/05/2024 | flashcards: 2 | hits: 50.00%"
        );
    }

    #[test]
    fn test_listing_joins_decks_with_newline() {
        let mut store = DeckStore::new();
        store.add_deck(Deck::new("One", Theme::Everyday, Level::Beginner));
        store.add_deck(Deck::new("Two", Theme::Everyday, Level::Beginner));
        let listed = store.list(Listing::AllDecks);
        let expected = format!(
            "{}\n{}",
            format_deck(store.find_deck(0).unwrap()),
            format_deck(store.find_deck(1).unwrap())
        );
        assert_eq!(listed, expected);
    }

    #[test]
    fn test_play_card_hides_and_reveals() {
        let deck = feelings();
        let card = deck.find_flashcard(0).unwrap();

        let hidden = play_card(card, Side::Meaning, false, false);
        assert!(hidden.contains("WORD: Enthousiasme"));
        assert!(hidden.contains("MEANING: ???"));
        assert!(!hidden.contains("Enthusiasm"));

        let revealed = play_card(card, Side::Meaning, true, false);
        assert!(revealed.contains("MEANING: Enthusiasm"));

        let word_hidden = play_card(card, Side::Word, false, false);
        assert!(word_hidden.contains("WORD: ???"));
        assert!(word_hidden.contains("TYPE: (Noun)"));
    }

    #[test]
    fn test_play_card_rows_align() {
        let card = Flashcard::new(
            "Déception",
            "A feeling of sadness when something hoped for does not happen",
            WordType::Noun,
        );
        let text = play_card(&card, Side::Word, true, false);
        let widths: Vec<usize> = text.lines().map(UnicodeWidthStr::width).collect();
        assert!(widths.iter().all(|w| *w == widths[0]));
        assert!(text.lines().count() > 8);
    }

    #[test]
    fn test_stats_report() {
        let mut store = DeckStore::new();
        store.add_deck(feelings());
        let report = format_stats(&store);
        assert!(report.contains("Decks:              1"));
        assert!(report.contains("  favourites:       1"));
    }
}
