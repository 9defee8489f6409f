//! Terminal side of a play session.

use std::io::{self, BufRead, IsTerminal, Write};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

use lexideck::models::Flashcard;
use lexideck::play::{Pause, PlayPrompter, Side};
use lexideck::render;

pub const INSTRUCTIONS: &str = "Either the WORD or the MEANING side of each card is hidden. \
Try to remember it before it is revealed, then say whether you guessed it.";

/// Leaves raw mode when dropped, including on early returns.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

pub struct ConsolePrompter {
    think_time: Duration,
    color: bool,
}

impl ConsolePrompter {
    pub fn new(think_seconds: u64, color: bool) -> Self {
        Self {
            think_time: Duration::from_secs(think_seconds),
            color,
        }
    }
}

impl PlayPrompter for ConsolePrompter {
    fn present(&mut self, card: &Flashcard, hidden: Side, revealed: bool) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out)?;
        writeln!(out, "{}", render::play_card(card, hidden, revealed, self.color))?;
        if !revealed {
            writeln!(out, "(Enter or Space to reveal now, Esc or q to stop)")?;
        }
        out.flush()
    }

    fn pause(&mut self) -> io::Result<Pause> {
        if !io::stdin().is_terminal() {
            thread::sleep(self.think_time);
            return Ok(Pause::Elapsed);
        }

        let _raw = RawModeGuard::enable()?;
        let deadline = Instant::now() + self.think_time;
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return Ok(Pause::Elapsed);
            }
            if event::poll(left.min(Duration::from_millis(100)))? {
                if let Event::Key(key) = event::read()? {
                    if let Some(pause) = pause_key(key) {
                        return Ok(pause);
                    }
                }
            }
        }
    }

    fn judge(&mut self, _card: &Flashcard) -> io::Result<bool> {
        let answer = ask("Did you guess it correctly? (1- YES | ANY OTHER INPUT- NO): ")?;
        Ok(matches!(answer.to_lowercase().as_str(), "1" | "y" | "yes"))
    }
}

/// How a key press during the think-time pause ends it, if at all. Raw mode
/// swallows the Ctrl-C signal, so it is handled here as a cancel.
fn pause_key(key: KeyEvent) -> Option<Pause> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Pause::Cancelled),
        KeyCode::Enter | KeyCode::Char(' ') => Some(Pause::Skipped),
        KeyCode::Esc | KeyCode::Char('q') => Some(Pause::Cancelled),
        _ => None,
    }
}

/// Print `prompt` and read one trimmed line from stdin.
pub fn ask(prompt: &str) -> io::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
    }
    Ok(line.trim().to_string())
}

/// Ask for flashcard ids to mark as favourite; blank means none.
pub fn ask_favourites() -> io::Result<Vec<u32>> {
    loop {
        let answer = ask("Flashcard ids to mark as favourite (space separated, blank to skip): ")?;
        let parsed: Result<Vec<u32>, _> = answer.split_whitespace().map(str::parse).collect();
        match parsed {
            Ok(ids) => return Ok(ids),
            Err(_) => println!("Please enter whole numbers only."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers, kind: KeyEventKind) -> KeyEvent {
        KeyEvent::new_with_kind(code, modifiers, kind)
    }

    fn press(code: KeyCode) -> KeyEvent {
        key(code, KeyModifiers::NONE, KeyEventKind::Press)
    }

    #[test]
    fn test_ctrl_c_cancels_pause() {
        let ctrl_c = key(KeyCode::Char('c'), KeyModifiers::CONTROL, KeyEventKind::Press);
        assert_eq!(pause_key(ctrl_c), Some(Pause::Cancelled));
        assert_eq!(pause_key(press(KeyCode::Char('c'))), None);
    }

    #[test]
    fn test_pause_keys() {
        assert_eq!(pause_key(press(KeyCode::Enter)), Some(Pause::Skipped));
        assert_eq!(pause_key(press(KeyCode::Char(' '))), Some(Pause::Skipped));
        assert_eq!(pause_key(press(KeyCode::Esc)), Some(Pause::Cancelled));
        assert_eq!(pause_key(press(KeyCode::Char('q'))), Some(Pause::Cancelled));
        assert_eq!(pause_key(press(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_key_release_is_ignored() {
        let release = key(KeyCode::Enter, KeyModifiers::NONE, KeyEventKind::Release);
        assert_eq!(pause_key(release), None);
    }
}
