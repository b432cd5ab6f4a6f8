//! Text corruption for System messages.

use serde::{Deserialize, Serialize};

use crate::config::GlitchConfig;
use crate::rng::GameRng;

const GLITCH_CHARS: [char; 7] = ['\u{FFFD}', '█', '▓', '▒', '░', '¿', '‽'];

const NOISE: [&str; 5] = ["\u{FFFD}\u{337}\u{FFFD}", "[DATA CORRUPTED]", "[???]", "##ERROR##", "<?\u{337}?>"];

pub const REDACTED: &str = "[REDACTED]";

/// The ways a message can be mangled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextStyle {
    CorruptChars,
    RepeatWords,
    InsertNoise,
    Redact,
    Scramble,
}

impl TextStyle {
    pub const ALL: [TextStyle; 5] = [
        TextStyle::CorruptChars,
        TextStyle::RepeatWords,
        TextStyle::InsertNoise,
        TextStyle::Redact,
        TextStyle::Scramble,
    ];
}

/// Chance, in percent, that a System message glitches at this integrity.
pub fn message_glitch_chance(integrity: i32, config: &GlitchConfig) -> u32 {
    let decay = (100 - integrity.clamp(0, 100)) / 3;
    (config.message_glitch_base + decay as u32).min(100)
}

pub fn should_glitch_message(integrity: i32, config: &GlitchConfig, rng: &mut GameRng) -> bool {
    rng.percent(message_glitch_chance(integrity, config))
}

/// Pass a message through the System: glitched with the integrity-driven
/// chance, untouched otherwise.
pub fn system_message(text: &str, integrity: i32, config: &GlitchConfig, rng: &mut GameRng) -> String {
    if should_glitch_message(integrity, config, rng) {
        let style = *rng.choose(&TextStyle::ALL).unwrap_or(&TextStyle::CorruptChars);
        corrupt_text(style, text, rng)
    } else {
        text.to_string()
    }
}

/// Mangle `text` in the given style. Texts too short for a style come back
/// unchanged.
pub fn corrupt_text(style: TextStyle, text: &str, rng: &mut GameRng) -> String {
    match style {
        TextStyle::CorruptChars => corrupt_chars(text, rng),
        TextStyle::RepeatWords => repeat_words(text, rng),
        TextStyle::InsertNoise => insert_noise(text, rng),
        TextStyle::Redact => redact(text, rng),
        TextStyle::Scramble => scramble(text, rng),
    }
}

fn corrupt_chars(text: &str, rng: &mut GameRng) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return String::new();
    }
    let count = rng.range(2, (chars.len() as i32 / 5).min(8));
    for _ in 0..count {
        let pos = rng.range(0, chars.len() as i32 - 1) as usize;
        chars[pos] = *rng.choose(&GLITCH_CHARS).unwrap_or(&'?');
    }
    chars.into_iter().collect()
}

fn repeat_words(text: &str, rng: &mut GameRng) -> String {
    let mut words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
    if words.len() < 2 {
        return text.to_string();
    }
    let pos = rng.range(0, words.len() as i32 - 1) as usize;
    let times = rng.range(2, 4) as usize;
    words[pos] = vec![words[pos].as_str(); times].join(" ");
    words.join(" ")
}

fn insert_noise(text: &str, rng: &mut GameRng) -> String {
    let mut words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= 2 {
        return text.to_string();
    }
    let pos = rng.range(1, words.len() as i32 - 1) as usize;
    let noise = *rng.choose(&NOISE).unwrap_or(&"##ERROR##");
    words.insert(pos, noise);
    words.join(" ")
}

fn redact(text: &str, rng: &mut GameRng) -> String {
    let mut words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < 3 {
        return text.to_string();
    }
    let count = rng.range(1, (words.len() as i32 / 3).max(1)) as usize;
    let mut positions: Vec<usize> = (0..words.len()).collect();
    rng.shuffle(&mut positions);
    for pos in positions.into_iter().take(count) {
        words[pos] = REDACTED;
    }
    words.join(" ")
}

fn scramble(text: &str, rng: &mut GameRng) -> String {
    let mut words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < 4 {
        return text.to_string();
    }
    let start = words.len() / 3;
    let end = 2 * words.len() / 3;
    rng.shuffle(&mut words[start..end]);
    words.join(" ")
}
