//! The Oracle: the one voice in the ruins that remembers.
//!
//! Meetings run through a fixed arc. The first and the first after the Core
//! Fragment is found ask the player to choose; every other meeting is a
//! single line, recalled from the lore graph when one fits.

use echo_rules::{CorruptionChange, GameError, GameResult, GameRng, Item, PlayerState, Stat, StoryFlag, TargetKind};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info};

pub const ORACLE_NAME: &str = "The Oracle";

const RELATIONSHIP_MIN: i32 = -100;
const RELATIONSHIP_MAX: i32 = 100;

const MUSINGS: [&str; 5] = [
    "The System watches you more closely now. Be careful.",
    "Reality grows thinner with each passing moment. Can you feel it?",
    "I wonder if you'll be the one to break the cycle. Or just another iteration.",
    "The ruins hold many secrets. Not all of them are safe to know.",
    "Your corruption rises. Is it a curse? Or evolution?",
];

/// Which conversation a meeting opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OracleScene {
    FirstMeeting,
    SecondMeeting,
    PostFragment,
    Musing,
}

impl OracleScene {
    /// Answers this scene accepts. Empty when it asks nothing.
    pub fn choices(&self) -> &'static [DialogueChoice] {
        match self {
            OracleScene::FirstMeeting => &DialogueChoice::FIRST_MEETING,
            OracleScene::PostFragment => &DialogueChoice::POST_FRAGMENT,
            OracleScene::SecondMeeting | OracleScene::Musing => &[],
        }
    }
}

/// An answer the player can give.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueChoice {
    AskName,
    AskOthers,
    AskTrust,
    AskTruth,
    RemainSilent,
    RestoreSystem,
    DestroySystem,
    Undecided,
    Dismiss,
}

impl DialogueChoice {
    pub const FIRST_MEETING: [DialogueChoice; 5] = [
        DialogueChoice::AskName,
        DialogueChoice::AskOthers,
        DialogueChoice::AskTrust,
        DialogueChoice::AskTruth,
        DialogueChoice::RemainSilent,
    ];

    pub const POST_FRAGMENT: [DialogueChoice; 4] = [
        DialogueChoice::RestoreSystem,
        DialogueChoice::DestroySystem,
        DialogueChoice::Undecided,
        DialogueChoice::Dismiss,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            DialogueChoice::AskName => "ask_name",
            DialogueChoice::AskOthers => "ask_others",
            DialogueChoice::AskTrust => "ask_trust",
            DialogueChoice::AskTruth => "ask_truth",
            DialogueChoice::RemainSilent => "remain_silent",
            DialogueChoice::RestoreSystem => "restore_system",
            DialogueChoice::DestroySystem => "destroy_system",
            DialogueChoice::Undecided => "undecided",
            DialogueChoice::Dismiss => "dismiss",
        }
    }

    /// What the player says.
    pub fn label(&self) -> &'static str {
        match self {
            DialogueChoice::AskName => "'How do you know my name?'",
            DialogueChoice::AskOthers => "'What happened to the others?'",
            DialogueChoice::AskTrust => "'Why should I trust you?'",
            DialogueChoice::AskTruth => "'Tell me the truth about this world.'",
            DialogueChoice::RemainSilent => "[Remain silent]",
            DialogueChoice::RestoreSystem => "'I'll restore the System and save this world.'",
            DialogueChoice::DestroySystem => "'I'll destroy the System and end this cycle.'",
            DialogueChoice::Undecided => "'I don't know yet.'",
            DialogueChoice::Dismiss => "'None of your business.'",
        }
    }
}

impl std::fmt::Display for DialogueChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for DialogueChoice {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DialogueChoice::FIRST_MEETING
            .into_iter()
            .chain(DialogueChoice::POST_FRAGMENT)
            .find(|c| c.key() == s.trim())
            .ok_or_else(|| GameError::invalid_target(TargetKind::DialogueChoice, s))
    }
}

/// What the Oracle says when met.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialoguePrompt {
    pub scene: OracleScene,
    pub speaker: String,
    pub lines: Vec<String>,
    /// Answers the session now waits for; empty when nothing is asked.
    pub choices: Vec<DialogueChoice>,
    /// Stat changes applied by the meeting itself.
    pub stat_changes: Vec<(Stat, i32)>,
    /// Raw System interjections, to be passed through the System voice.
    pub system_notes: Vec<String>,
}

impl DialoguePrompt {
    pub fn awaits_choice(&self) -> bool {
        !self.choices.is_empty()
    }
}

/// The effect of one answer, already applied to the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueOutcome {
    pub scene: OracleScene,
    pub choice: DialogueChoice,
    pub lines: Vec<String>,
    pub stat_changes: Vec<(Stat, i32)>,
    pub corruption: Option<CorruptionChange>,
    pub flags: Vec<StoryFlag>,
    /// Relationship after the answer.
    pub relationship: i32,
    pub truth_level: u32,
    pub system_notes: Vec<String>,
}

/// Everything the Oracle remembers about the player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Oracle {
    interactions: u32,
    relationship: i32,
    truth_level: u32,
    history: Vec<DialogueChoice>,
    pending: Option<OracleScene>,
    post_fragment_done: bool,
}

impl Oracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interactions(&self) -> u32 {
        self.interactions
    }

    pub fn relationship(&self) -> i32 {
        self.relationship
    }

    pub fn truth_level(&self) -> u32 {
        self.truth_level
    }

    pub fn history(&self) -> &[DialogueChoice] {
        &self.history
    }

    /// The scene waiting for an answer, if any.
    pub fn pending(&self) -> Option<OracleScene> {
        self.pending
    }

    /// The scene the next meeting will open.
    pub fn next_scene(&self, player: &PlayerState) -> OracleScene {
        match self.interactions {
            0 => OracleScene::FirstMeeting,
            1 => OracleScene::SecondMeeting,
            _ if player.has_flag(StoryFlag::FoundCoreFragment) && !self.post_fragment_done => OracleScene::PostFragment,
            _ => OracleScene::Musing,
        }
    }

    /// Meet the Oracle. `hint` is what lore recall surfaced for a musing; without
    /// one a stock line is used. A meeting left unanswered is presented again.
    pub fn encounter(&mut self, player: &mut PlayerState, hint: Option<&str>, rng: &mut GameRng) -> DialoguePrompt {
        let scene = match self.pending {
            Some(scene) => scene,
            None => {
                let scene = self.next_scene(player);
                self.interactions += 1;
                scene
            }
        };

        let mut prompt = DialoguePrompt {
            scene,
            speaker: ORACLE_NAME.to_string(),
            lines: Vec::new(),
            choices: scene.choices().to_vec(),
            stat_changes: Vec::new(),
            system_notes: Vec::new(),
        };

        match scene {
            OracleScene::FirstMeeting => {
                let greeting = format!("\"Hello, {}.\"", player.name);
                prompt.lines = lines(&[
                    greeting.as_str(),
                    "You freeze. How do they know your name? You don't even know it yourself.",
                    "\"The System calls you 'Unknown' because it fears what you might become if you remembered.\"",
                    "\"I am the Oracle. I remember what the System forgets. I have watched 10,391 others fail.\"",
                    "\"You will be different. ...Or so I hope. Hope is all I have left.\"",
                ]);
                prompt.system_notes.push("WARNING: Unregistered entity detected. Identity: UNKNOWN.".to_string());
            }
            OracleScene::SecondMeeting => {
                prompt.lines.push("\"You're still alive. Good. The System must be getting frustrated.\"".to_string());
                if player.inventory.has(Item::SystemFragment) {
                    player.stats.shift(Stat::Intelligence, 1);
                    prompt.stat_changes.push((Stat::Intelligence, 1));
                    prompt.lines.extend(lines(&[
                        "\"Ah. You're collecting them. Each fragment binds you more to the System.\"",
                        "\"But they also grant power over reality itself. The choice, as always, is yours.\"",
                    ]));
                } else {
                    prompt.lines.extend(lines(&[
                        "\"No fragments yet. Good. Or bad. Time will tell.\"",
                        "\"They are hidden where reality is thinnest. Seek them out when you are ready.\"",
                    ]));
                }
            }
            OracleScene::PostFragment => {
                prompt.lines = lines(&[
                    "\"You found it. A Core Fragment. Can you feel the System's grip tightening?\"",
                    "\"And the power. The ability to reshape this dead world.\"",
                    "\"What will you do with it, I wonder?\"",
                ]);
            }
            OracleScene::Musing => {
                let line = match hint {
                    Some(hint) => hint,
                    None => rng.choose(&MUSINGS).copied().unwrap_or(MUSINGS[0]),
                };
                prompt.lines.push(format!("\"{line}\""));
            }
        }

        self.pending = prompt.awaits_choice().then_some(scene);
        debug!(?scene, interactions = self.interactions, "oracle encounter");
        prompt
    }

    /// Answer the pending scene. Fails without side effects when nothing is
    /// pending or the choice does not belong to the scene.
    pub fn respond(&mut self, choice: DialogueChoice, player: &mut PlayerState) -> GameResult<DialogueOutcome> {
        let scene = self
            .pending
            .ok_or_else(|| GameError::invalid_action("the Oracle is not waiting for an answer"))?;
        if !scene.choices().contains(&choice) {
            return Err(GameError::invalid_target(TargetKind::DialogueChoice, choice));
        }

        let mut outcome = DialogueOutcome {
            scene,
            choice,
            lines: Vec::new(),
            stat_changes: Vec::new(),
            corruption: None,
            flags: Vec::new(),
            relationship: self.relationship,
            truth_level: self.truth_level,
            system_notes: Vec::new(),
        };

        let (relationship, truth) = match choice {
            DialogueChoice::AskName => {
                outcome.lines = lines(&[
                    "\"I was there when you chose to forget it. I remember every cycle, every failure, every death.\"",
                    "\"Your name is a weapon against fate. You must earn the right to be Known.\"",
                ]);
                gain(player, &mut outcome, Stat::Intelligence, 2);
                (10, 1)
            }
            DialogueChoice::AskOthers => {
                outcome.lines = lines(&[
                    "\"They trusted the System. They collected the Core Fragments, thinking they could save the world.\"",
                    "\"But the System does not want to be saved. It wants to loop. They became part of it. Forever.\"",
                ]);
                gain(player, &mut outcome, Stat::Intelligence, 2);
                flag(player, &mut outcome, StoryFlag::LearnedOthersFate);
                (15, 2)
            }
            DialogueChoice::AskTrust => {
                outcome.lines = lines(&[
                    "\"You shouldn't. Trust is for those who have the luxury of time. You have only choices.\"",
                    "\"The System will lie to you. I, at least, tell you I might lie.\"",
                ]);
                gain(player, &mut outcome, Stat::Intelligence, 1);
                outcome
                    .system_notes
                    .push("WARNING: Oracle entity exhibits anomalous truth-value patterns.".to_string());
                (5, 0)
            }
            DialogueChoice::AskTruth => {
                outcome.lines = lines(&[
                    "\"This world is already dead. You are walking through its corpse.\"",
                    "\"The System is the ghost that cannot let go, and you are the antibody it cannot digest.\"",
                    "\"That is why you keep coming back. That is why you might succeed where others failed.\"",
                ]);
                gain(player, &mut outcome, Stat::Intelligence, 3);
                outcome.corruption = Some(player.modify_corruption(10));
                flag(player, &mut outcome, StoryFlag::LearnedTruth);
                outcome
                    .system_notes
                    .push("TRUTH CONTAMINATION DETECTED. QUARANTINE FAILED.".to_string());
                (20, 3)
            }
            DialogueChoice::RemainSilent => {
                outcome.lines = lines(&[
                    "You say nothing. The Oracle nods approvingly.",
                    "\"Wise. Words are traps in this place. Even mine. Especially mine.\"",
                ]);
                gain(player, &mut outcome, Stat::Luck, 2);
                (10, 0)
            }
            DialogueChoice::RestoreSystem => {
                outcome.lines = lines(&["\"The hero's path. Noble. Doomed. 10,392nd time's the charm?\""]);
                flag(player, &mut outcome, StoryFlag::PathRestoration);
                (-10, 0)
            }
            DialogueChoice::DestroySystem => {
                outcome.lines = lines(&[
                    "\"The destroyer's path. If you succeed, everything ends. Including me.\"",
                    "\"But at least it would be a true ending.\"",
                ]);
                flag(player, &mut outcome, StoryFlag::PathDestruction);
                (15, 0)
            }
            DialogueChoice::Undecided => {
                outcome.lines = lines(&["\"Uncertainty. The only honest answer in this place. Hold on to it.\""]);
                gain(player, &mut outcome, Stat::Luck, 1);
                (10, 0)
            }
            DialogueChoice::Dismiss => {
                outcome.lines = lines(&["\"Fair enough. Your choices are yours alone. I merely observe. And hope.\""]);
                (0, 0)
            }
        };

        match scene {
            OracleScene::FirstMeeting => flag(player, &mut outcome, StoryFlag::MetOracle),
            OracleScene::PostFragment => self.post_fragment_done = true,
            OracleScene::SecondMeeting | OracleScene::Musing => {}
        }

        self.relationship = (self.relationship + relationship).clamp(RELATIONSHIP_MIN, RELATIONSHIP_MAX);
        self.truth_level += truth;
        self.history.push(choice);
        self.pending = None;

        outcome.relationship = self.relationship;
        outcome.truth_level = self.truth_level;
        info!(?scene, %choice, relationship = self.relationship, "oracle answered");
        Ok(outcome)
    }
}

fn lines(text: &[&str]) -> Vec<String> {
    text.iter().map(|line| line.to_string()).collect()
}

fn gain(player: &mut PlayerState, outcome: &mut DialogueOutcome, stat: Stat, amount: i32) {
    let applied = player.stats.shift(stat, amount);
    outcome.stat_changes.push((stat, applied));
}

fn flag(player: &mut PlayerState, outcome: &mut DialogueOutcome, flag: StoryFlag) {
    if player.set_flag(flag) {
        outcome.flags.push(flag);
    }
}
