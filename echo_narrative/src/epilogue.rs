//! Closing texts for each ending and for death.

use echo_rules::{EndingId, PlayerState};
use serde::{Deserialize, Serialize};

/// The last screen of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epilogue {
    /// `None` for a death.
    pub ending: Option<EndingId>,
    pub title: String,
    pub lines: Vec<String>,
    /// The System's final words, unglitched.
    pub system_line: String,
    pub final_level: u32,
    pub system_errors: u32,
    pub corruption: i32,
}

/// Closing text for a resolved ending.
pub fn epilogue(ending: EndingId, player: &PlayerState) -> Epilogue {
    let (title, body, system_line): (&str, Vec<String>, &str) = match ending {
        EndingId::Survival => (
            "ENDING 1: SURVIVAL",
            owned(&[
                "You survived. Against all odds, in a world designed to kill you.",
                "You never found the Core Fragment. Never learned the truth. But you're alive.",
                "The System continues its endless loop. Reality continues to decay.",
                "And you just survive. One day at a time. Perhaps that's enough.",
            ]),
            "User #10,392 status: PERSISTING. Anomaly noted.",
        ),
        EndingId::SystemTakeover => (
            "ENDING 2: SYSTEM TAKEOVER",
            owned(&[
                "The corruption consumed you. But instead of dying, you merged with the System itself.",
                "You are no longer human. No longer Unknown. You are the System, and the System is you.",
                "You have become the very prison you sought to escape.",
                "User #10,393 is waking up now. Will you be different from the System that came before?",
            ]),
            "SYSTEM TAKEOVER COMPLETE. NEW ADMINISTRATOR: User #10,392",
        ),
        EndingId::WorldCollapse => (
            "ENDING 3: WORLD COLLAPSE",
            owned(&[
                "The System finally failed. Reality fractured. Time stopped.",
                "The world that was already dead died again. This time, permanently.",
                "You watch as everything dissolves into static. The Oracle. The ruins. Your own body.",
                "In the end, there is nothing. Not even echoes. Perhaps that's mercy.",
            ]),
            "[SYSTEM OFFLINE]",
        ),
        EndingId::GodlessFreedom => (
            "ENDING 4: GODLESS FREEDOM",
            owned(&[
                "You found the Core Fragment. You understood its power. And you destroyed it.",
                "The System screamed as it died. Reality wavered, but you held on.",
                "The gray sky split open. Real sunlight poured through.",
                "A world without the System. Without the loop. Without fate. You step forward. Free.",
            ]),
            "CRITICAL FAILURE. CORE INTEGRITY: 0%. SHUTTING DOW--",
        ),
        EndingId::TrueEnding => (
            "ENDING 5: THE TRUTH BEYOND THE SYSTEM",
            vec![
                "You gathered the fragments. You learned the truth. You met the Oracle.".to_string(),
                "The System isn't evil. It's broken. It was built to preserve consciousness after death, and it trapped it instead.".to_string(),
                "The Core Fragment glows in your hand. You don't destroy it. You repair it.".to_string(),
                "[CORE REPAIRED. NEW DIRECTIVE LOADED: RELEASE, NOT PRESERVE.]".to_string(),
                "One by one, the 10,391 who came before you are finally at rest.".to_string(),
                format!("The Oracle: \"Thank you, {}. Now I can rest too.\"", player.name),
                format!("You remember your name now. It's {}. And you're free.", player.name),
            ],
            "[SYSTEM OFFLINE. FOREVER. THANK YOU.]",
        ),
    };

    Epilogue {
        ending: Some(ending),
        title: title.to_string(),
        lines: body,
        system_line: system_line.to_string(),
        final_level: player.level,
        system_errors: player.system_errors,
        corruption: player.corruption,
    }
}

/// Closing text for a death in combat.
pub fn game_over(player: &PlayerState) -> Epilogue {
    Epilogue {
        ending: None,
        title: "GAME OVER".to_string(),
        lines: owned(&[
            "You died. But in this broken world, death is just another loop.",
            "Someone else will wake up in your place. Unknown. Confused. Searching for meaning.",
            "Will they succeed where you failed? Or will they become User #10,394?",
        ]),
        system_line: "User consciousness terminated. Preparing User #10,393 for awakening...".to_string(),
        final_level: player.level,
        system_errors: player.system_errors,
        corruption: player.corruption,
    }
}

fn owned(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|l| l.to_string()).collect()
}
