//! Headless input: one key name or `click <x> <y>` per line.

use std::io::BufRead;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use snek_shared::protocol::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    Up,
    Down,
    Right,
    Left,
    Space,
    Z,
    Other(String),
}

impl Key {
    pub fn parse(name: &str) -> Key {
        match name.trim().to_ascii_lowercase().as_str() {
            "esc" | "escape" | "q" | "quit" => Key::Escape,
            "up" | "w" => Key::Up,
            "down" | "s" => Key::Down,
            "right" | "d" => Key::Right,
            "left" | "a" => Key::Left,
            "space" => Key::Space,
            "z" => Key::Z,
            other => Key::Other(other.to_string()),
        }
    }

    pub fn command(&self) -> Command {
        match self {
            Key::Escape => Command::Quit,
            Key::Up => Command::Up,
            Key::Down => Command::Down,
            Key::Right => Command::Right,
            Key::Left => Command::Left,
            Key::Space => Command::Primary,
            Key::Z => Command::Secondary,
            Key::Other(_) => Command::Fallback,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key(Key),
    /// Cursor position in normalized device coordinates.
    Click { x: f32, y: f32 },
}

impl InputEvent {
    /// `None` for a blank line.
    pub fn parse(line: &str) -> Option<InputEvent> {
        let mut words = line.split_whitespace();
        match words.next() {
            None => return None,
            Some("click") => {
                let coords: Vec<f32> = words.filter_map(|w| w.parse().ok()).collect();
                if let [x, y] = coords[..] {
                    return Some(InputEvent::Click { x, y });
                }
            }
            Some(_) => {}
        }
        Some(InputEvent::Key(Key::parse(line)))
    }
}

/// Read events on a background thread. The channel closes at end of input.
pub fn spawn_reader<R: BufRead + Send + 'static>(reader: R) -> Receiver<InputEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in reader.lines() {
            let Ok(line) = line else { break };
            let Some(event) = InputEvent::parse(&line) else {
                continue;
            };
            if tx.send(event).is_err() {
                break;
            }
        }
    });
    rx
}

/// Drain pending events: keys in arrival order, every click kept. Keys
/// behind a quit are dropped.
pub fn drain(rx: &Receiver<InputEvent>) -> (Vec<Key>, Vec<(f32, f32)>) {
    let mut keys = Vec::new();
    let mut clicks = Vec::new();
    while let Ok(event) = rx.try_recv() {
        match event {
            InputEvent::Key(k) => {
                if keys.last() != Some(&Key::Escape) {
                    keys.push(k);
                }
            }
            InputEvent::Click { x, y } => clicks.push((x, y)),
        }
    }
    (keys, clicks)
}
