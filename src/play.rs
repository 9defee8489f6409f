//! Play sessions: one practice pass over a deck.
//!
//! The session logic only decides what happens to each flashcard; showing
//! cards, waiting and asking for a judgement go through a [`PlayPrompter`].

use std::io;

use chrono::NaiveDate;
use rand::Rng;
use thiserror::Error;

use crate::models::{Deck, Flashcard, HitState};

/// The side of a flashcard hidden from the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Word,
    Meaning,
}

impl Side {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            Side::Meaning
        } else {
            Side::Word
        }
    }
}

/// How the think-time pause before a reveal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    Elapsed,
    /// The player asked to see the answer early.
    Skipped,
    /// The player stopped the session.
    Cancelled,
}

#[derive(Error, Debug)]
pub enum PlayError {
    #[error("deck {0} has no flashcards to play")]
    EmptyDeck(u32),

    /// The prompter failed. Flashcards judged before the failure keep
    /// their marks.
    #[error("prompt failed after {judged} judged flashcards: {source}")]
    Io {
        judged: usize,
        #[source]
        source: io::Error,
    },
}

/// The player's side of a session.
pub trait PlayPrompter {
    /// Show `card` with its `hidden` side masked unless `revealed`.
    fn present(&mut self, card: &Flashcard, hidden: Side, revealed: bool) -> io::Result<()>;

    fn pause(&mut self) -> io::Result<Pause>;

    /// Whether the player guessed the hidden side.
    fn judge(&mut self, card: &Flashcard) -> io::Result<bool>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    /// Flashcards marked hit or miss.
    pub judged: usize,
    pub cancelled: bool,
    pub hits_percentage: Option<f64>,
}

/// Run one pass over `deck` in flashcard id order.
///
/// Each judged flashcard becomes a hit or a miss and gains an attempt. A
/// cancelled pause or a prompter failure leaves that flashcard and the rest
/// untouched. The deck counts as played on `today` once any flashcard was
/// judged, whether or not the session ran to the end.
pub fn play_deck<P, R>(
    deck: &mut Deck,
    prompter: &mut P,
    rng: &mut R,
    today: NaiveDate,
) -> Result<SessionOutcome, PlayError>
where
    P: PlayPrompter + ?Sized,
    R: Rng + ?Sized,
{
    if deck.is_empty() {
        return Err(PlayError::EmptyDeck(deck.id));
    }
    log::info!("Playing deck {} '{}'", deck.id, deck.title);

    let mut judged = 0;
    let mut cancelled = false;
    let mut failure = None;
    for card in deck.flashcards.iter_mut() {
        match play_flashcard(card, prompter, rng) {
            Ok(true) => judged += 1,
            Ok(false) => {
                cancelled = true;
                break;
            }
            Err(err) => {
                failure = Some(err);
                break;
            }
        }
    }

    if judged > 0 {
        deck.mark_played(today);
    }
    if let Some(source) = failure {
        log::warn!("Session on deck {} failed after {} flashcards: {}", deck.id, judged, source);
        return Err(PlayError::Io { judged, source });
    }
    let outcome = SessionOutcome {
        judged,
        cancelled,
        hits_percentage: deck.calculate_hits_percentage(),
    };
    log::info!(
        "Session on deck {} finished: {} judged, cancelled: {}, hits: {:?}",
        deck.id,
        outcome.judged,
        outcome.cancelled,
        outcome.hits_percentage
    );
    Ok(outcome)
}

/// Show, pause, reveal and judge one flashcard. `Ok(false)` when the player
/// cancelled before the reveal.
fn play_flashcard<P, R>(card: &mut Flashcard, prompter: &mut P, rng: &mut R) -> io::Result<bool>
where
    P: PlayPrompter + ?Sized,
    R: Rng + ?Sized,
{
    let hidden = Side::random(rng);
    prompter.present(card, hidden, false)?;
    if prompter.pause()? == Pause::Cancelled {
        return Ok(false);
    }
    prompter.present(card, hidden, true)?;

    card.hit_state = if prompter.judge(card)? {
        HitState::Hit
    } else {
        HitState::Miss
    };
    card.attempts += 1;
    Ok(true)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavouriteOutcome {
    Marked,
    AlreadyFavourite,
    NotFound,
}

/// Flag flashcard `id` as a favourite. Marking twice changes nothing.
pub fn mark_favourite(deck: &mut Deck, id: u32) -> FavouriteOutcome {
    match deck.find_flashcard_mut(id) {
        None => FavouriteOutcome::NotFound,
        Some(card) if card.favourite => FavouriteOutcome::AlreadyFavourite,
        Some(card) => {
            card.favourite = true;
            log::info!("Flashcard {} in deck {} marked as favourite", id, deck.id);
            FavouriteOutcome::Marked
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Level, Theme, WordType};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::VecDeque;

    /// Answers judgements from a script and records what it was shown.
    #[derive(Default)]
    struct ScriptedPrompter {
        answers: VecDeque<bool>,
        cancel_on_pause: Option<usize>,
        pauses: usize,
        shown: Vec<(u32, Side, bool)>,
    }

    impl ScriptedPrompter {
        fn answering(answers: &[bool]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                ..Self::default()
            }
        }
    }

    impl PlayPrompter for ScriptedPrompter {
        fn present(&mut self, card: &Flashcard, hidden: Side, revealed: bool) -> io::Result<()> {
            self.shown.push((card.id, hidden, revealed));
            Ok(())
        }

        fn pause(&mut self) -> io::Result<Pause> {
            let index = self.pauses;
            self.pauses += 1;
            if self.cancel_on_pause == Some(index) {
                Ok(Pause::Cancelled)
            } else {
                Ok(Pause::Elapsed)
            }
        }

        fn judge(&mut self, _card: &Flashcard) -> io::Result<bool> {
            self.answers
                .pop_front()
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 14).unwrap()
    }

    fn deck(size: usize) -> Deck {
        let mut deck = Deck::new("School Vocabulary", Theme::Academic, Level::Intermediate);
        for i in 0..size {
            deck.add_flashcard(Flashcard::new(format!("mot {}", i), format!("word {}", i), WordType::Noun));
        }
        deck
    }

    #[test]
    fn test_session_marks_every_flashcard() {
        let mut deck = deck(4);
        let mut prompter = ScriptedPrompter::answering(&[true, true, false, false]);
        let mut rng = StdRng::seed_from_u64(3);

        let outcome = play_deck(&mut deck, &mut prompter, &mut rng, today()).unwrap();

        assert_eq!(outcome.judged, 4);
        assert!(!outcome.cancelled);
        assert_eq!(outcome.hits_percentage, Some(50.0));
        assert_eq!(deck.last_played, Some(today()));
        let states: Vec<HitState> = deck.flashcards.iter().map(|f| f.hit_state).collect();
        assert_eq!(states, vec![HitState::Hit, HitState::Hit, HitState::Miss, HitState::Miss]);
        assert!(deck.flashcards.iter().all(|f| f.attempts == 1));
    }

    #[test]
    fn test_each_card_is_hidden_then_revealed() {
        let mut deck = deck(2);
        let mut prompter = ScriptedPrompter::answering(&[true, false]);
        let mut rng = StdRng::seed_from_u64(9);
        play_deck(&mut deck, &mut prompter, &mut rng, today()).unwrap();

        assert_eq!(prompter.shown.len(), 4);
        for pair in prompter.shown.chunks(2) {
            assert_eq!(pair[0].0, pair[1].0);
            assert_eq!(pair[0].1, pair[1].1);
            assert!(!pair[0].2);
            assert!(pair[1].2);
        }
    }

    #[test]
    fn test_hidden_side_varies() {
        let mut deck = deck(20);
        let mut prompter = ScriptedPrompter::answering(&[true; 20]);
        let mut rng = StdRng::seed_from_u64(11);
        play_deck(&mut deck, &mut prompter, &mut rng, today()).unwrap();

        let sides: Vec<Side> = prompter.shown.iter().map(|s| s.1).collect();
        assert!(sides.contains(&Side::Word));
        assert!(sides.contains(&Side::Meaning));
    }

    #[test]
    fn test_attempts_accumulate_across_sessions() {
        let mut deck = deck(1);
        let mut rng = StdRng::seed_from_u64(5);
        play_deck(&mut deck, &mut ScriptedPrompter::answering(&[false]), &mut rng, today()).unwrap();
        play_deck(&mut deck, &mut ScriptedPrompter::answering(&[true]), &mut rng, today()).unwrap();

        let card = deck.find_flashcard(0).unwrap();
        assert_eq!(card.attempts, 2);
        assert_eq!(card.hit_state, HitState::Hit);
    }

    #[test]
    fn test_cancel_leaves_remaining_cards_untouched() {
        let mut deck = deck(3);
        let mut prompter = ScriptedPrompter {
            cancel_on_pause: Some(1),
            ..ScriptedPrompter::answering(&[true, true, true])
        };
        let mut rng = StdRng::seed_from_u64(1);

        let outcome = play_deck(&mut deck, &mut prompter, &mut rng, today()).unwrap();

        assert!(outcome.cancelled);
        assert_eq!(outcome.judged, 1);
        assert_eq!(deck.find_flashcard(0).unwrap().hit_state, HitState::Hit);
        for id in [1, 2] {
            let card = deck.find_flashcard(id).unwrap();
            assert_eq!(card.hit_state, HitState::NotAttempted);
            assert_eq!(card.attempts, 0);
        }
        assert_eq!(deck.last_played, Some(today()));
    }

    #[test]
    fn test_cancel_before_any_judgement_keeps_deck_unplayed() {
        let mut deck = deck(2);
        let mut prompter = ScriptedPrompter {
            cancel_on_pause: Some(0),
            ..ScriptedPrompter::default()
        };
        let mut rng = StdRng::seed_from_u64(1);

        let outcome = play_deck(&mut deck, &mut prompter, &mut rng, today()).unwrap();

        assert_eq!(outcome.judged, 0);
        assert_eq!(deck.last_played, None);
        assert_eq!(outcome.hits_percentage, Some(0.0));
    }

    #[test]
    fn test_empty_deck_cannot_be_played() {
        let mut deck = deck(0);
        let mut rng = StdRng::seed_from_u64(1);
        let result = play_deck(&mut deck, &mut ScriptedPrompter::default(), &mut rng, today());
        assert!(matches!(result, Err(PlayError::EmptyDeck(0))));
    }

    #[test]
    fn test_prompt_failure_keeps_judged_cards() {
        let mut deck = deck(3);
        let mut prompter = ScriptedPrompter::answering(&[true]);
        let mut rng = StdRng::seed_from_u64(1);
        let result = play_deck(&mut deck, &mut prompter, &mut rng, today());

        assert!(matches!(result, Err(PlayError::Io { judged: 1, .. })));
        let first = deck.find_flashcard(0).unwrap();
        assert_eq!(first.hit_state, HitState::Hit);
        assert_eq!(first.attempts, 1);
        let second = deck.find_flashcard(1).unwrap();
        assert_eq!(second.hit_state, HitState::NotAttempted);
        assert_eq!(second.attempts, 0);
        assert_eq!(deck.last_played, Some(today()));
    }

    #[test]
    fn test_prompt_failure_on_first_card_leaves_deck_unplayed() {
        let mut deck = deck(2);
        let mut rng = StdRng::seed_from_u64(1);
        let result = play_deck(&mut deck, &mut ScriptedPrompter::default(), &mut rng, today());

        assert!(matches!(result, Err(PlayError::Io { judged: 0, .. })));
        assert_eq!(deck.last_played, None);
    }

    #[test]
    fn test_mark_favourite_is_idempotent() {
        let mut deck = deck(2);
        assert_eq!(mark_favourite(&mut deck, 1), FavouriteOutcome::Marked);
        assert_eq!(mark_favourite(&mut deck, 1), FavouriteOutcome::AlreadyFavourite);
        assert_eq!(mark_favourite(&mut deck, 7), FavouriteOutcome::NotFound);
        assert_eq!(deck.number_of_favourites(), 1);
    }
}
