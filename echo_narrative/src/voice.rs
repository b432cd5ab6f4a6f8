//! The System's voice.
//!
//! Every line the System speaks passes through here. Ordinary messages glitch
//! with the integrity-driven chance; lies always come through clean and truths
//! always come through broken.

use echo_rules::{corrupt_text, system_message, GameRng, GlitchConfig, TextStyle};
use serde::{Deserialize, Serialize};

const LIES: [&str; 7] = [
    "All systems operating within normal parameters.",
    "Your true name has been retrieved from the database.",
    "This world is functioning as intended.",
    "You are the chosen one, destined to restore balance.",
    "The System Core is located in the northern sanctuary.",
    "Your memories will return once you reach level 10.",
    "I am here to help you succeed in your quest.",
];

const TRUTHS: [&str; 7] = [
    "This world ended 3,247 cycles ago. You are walking through its echo.",
    "I am not a helper. I am a prison warden for consciousness.",
    "Every choice you make has already been recorded in the dead timeline.",
    "The 'quests' are memory fragments from those who failed before you.",
    "You are not the first 'Unknown' to wake here. You are number 10,392.",
    "System integrity this low means reality is collapsing. Slowly.",
    "Your stats are arbitrary. I could change them on a whim. But where's the fun in that?",
];

/// How a System line is framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Register {
    Message,
    Warning,
    Error,
}

impl Register {
    pub fn prefix(&self) -> &'static str {
        match self {
            Register::Message => "[SYSTEM]",
            Register::Warning => "[SYSTEM WARNING]",
            Register::Error => "[SYSTEM ERROR]",
        }
    }
}

/// Counters of what the System has said.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemVoice {
    pub messages_sent: u32,
    pub lies_told: u32,
    pub truths_revealed: u32,
}

impl SystemVoice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Speak a line, glitched by chance at the current integrity.
    pub fn speak(
        &mut self,
        register: Register,
        text: &str,
        integrity: i32,
        config: &GlitchConfig,
        rng: &mut GameRng,
    ) -> String {
        self.messages_sent += 1;
        format!("{} {}", register.prefix(), system_message(text, integrity, config, rng))
    }

    /// A comforting falsehood. Never glitched.
    pub fn lie(&mut self, rng: &mut GameRng) -> String {
        self.messages_sent += 1;
        self.lies_told += 1;
        let text = rng.choose(&LIES).copied().unwrap_or(LIES[0]);
        format!("{} {}", Register::Message.prefix(), text)
    }

    /// Something true, which the System cannot say without breaking.
    pub fn truth(&mut self, rng: &mut GameRng) -> String {
        self.messages_sent += 1;
        self.truths_revealed += 1;
        let text = rng.choose(&TRUTHS).copied().unwrap_or(TRUTHS[0]);
        let style = rng.choose(&TextStyle::ALL).copied().unwrap_or(TextStyle::CorruptChars);
        format!("{} {}", Register::Message.prefix(), corrupt_text(style, text, rng))
    }
}
