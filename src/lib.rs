//! Lexideck - a personal vocabulary flashcard collection.
//!
//! Decks of word/meaning flashcards, listings and counters over the
//! collection, randomly generated practice decks and play sessions that
//! record hits and misses.

pub mod config;
pub mod models;
pub mod persistence;
pub mod play;
pub mod query;
pub mod render;
pub mod store;
