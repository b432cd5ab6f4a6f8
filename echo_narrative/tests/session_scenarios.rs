//! Whole-session scenarios driven through the public action API.

use echo_narrative::{
    CombatHandle, ExplorationEvent, GameSession, RestInterruption, SaveSlots, SessionId, SessionSnapshot,
};
use echo_rules::{CombatAction, EndingId, GameError, Item, StoryFlag};

fn fight(session: &mut GameSession, handle: CombatHandle) {
    for _ in 0..500 {
        let player = session.player();
        let action = if player.hp * 4 < player.max_hp {
            CombatAction::Flee
        } else {
            CombatAction::Attack
        };
        let turn = session.combat_action(handle, action).expect("combat turn");
        if turn.outcome.is_some() {
            return;
        }
    }
    panic!("combat never ended");
}

/// One scripted turn of play. Returns false once the run is over.
fn play_turn(session: &mut GameSession) -> bool {
    if session.is_over() {
        return false;
    }

    let player = session.player();
    if player.hp * 10 < player.max_hp * 4 {
        let rest = session.rest().expect("rest");
        if let Some(RestInterruption::Combat(start)) = rest.interruption {
            fight(session, start.handle);
        }
        return !session.is_over();
    }

    let result = session.explore().expect("explore");
    match result.event {
        ExplorationEvent::Combat(start) => fight(session, start.handle),
        ExplorationEvent::Oracle(prompt) if prompt.awaits_choice() => {
            session.respond(prompt.choices[0]).expect("respond");
        }
        _ => {}
    }
    !session.is_over()
}

fn play(session: &mut GameSession, turns: usize) {
    for _ in 0..turns {
        if !play_turn(session) {
            break;
        }
    }
}

fn comparable(session: &GameSession) -> SessionSnapshot {
    let mut snapshot = session.snapshot();
    snapshot.session_id = SessionId(uuid::Uuid::nil());
    snapshot
}

#[test]
fn test_same_seed_replays_exactly() {
    let mut a = GameSession::new_game(Some(1234));
    let mut b = GameSession::new_game(Some(1234));
    play(&mut a, 60);
    play(&mut b, 60);

    assert_eq!(comparable(&a), comparable(&b));
    assert_eq!(a.get_status(), b.get_status());
}

#[test]
fn test_invariants_hold_across_long_runs() {
    for seed in 0..20 {
        let mut session = GameSession::new_game(Some(seed));
        let mut integrity = session.player().system_integrity;

        for _ in 0..80 {
            let running = play_turn(&mut session);

            let player = session.player();
            player.check_invariants().unwrap_or_else(|e| panic!("seed {seed}: {e}"));
            assert!(
                player.system_integrity <= integrity,
                "seed {seed}: integrity rose from {integrity} to {}",
                player.system_integrity
            );
            integrity = player.system_integrity;

            for quest in session.get_quests() {
                for objective in &quest.objectives {
                    assert!(objective.progress <= objective.target, "seed {seed}: {}", quest.title);
                }
            }
            if !running {
                break;
            }
        }
    }
}

#[test]
fn test_save_and_load_continue_the_same_run() {
    let mut first = GameSession::new_game(Some(77));
    play(&mut first, 25);
    if first.is_over() {
        return;
    }

    let mut slots = SaveSlots::new();
    slots.save(1, &first.snapshot()).unwrap();
    let loaded = slots.load(1).unwrap().expect("slot 1 holds a save");
    let mut restored = GameSession::from_snapshot(loaded).unwrap();
    assert_eq!(restored.snapshot(), first.snapshot());

    play(&mut first, 25);
    play(&mut restored, 25);
    assert_eq!(restored.snapshot(), first.snapshot());
}

#[test]
fn test_forced_corruption_with_fragment_is_a_takeover() {
    let session = GameSession::new_game(Some(5));
    let mut snapshot = session.snapshot();
    snapshot.player.corruption = 85;
    snapshot.player.inventory.add(Item::CoreFragment, 1);

    let json = snapshot.to_json().unwrap();
    let mut session = GameSession::from_snapshot(SessionSnapshot::from_json(&json).unwrap()).unwrap();
    assert_eq!(session.attempt_ending().unwrap(), EndingId::SystemTakeover);
    assert_eq!(
        session.epilogue().map(|e| e.title.as_str()),
        Some("ENDING 2: SYSTEM TAKEOVER")
    );
    assert!(matches!(session.explore(), Err(GameError::InvalidAction(_))));
}

#[test]
fn test_true_ending_outranks_freedom() {
    let session = GameSession::new_game(Some(6));
    let mut snapshot = session.snapshot();
    let player = &mut snapshot.player;
    player.level = 8;
    player.corruption = 30;
    player.inventory.add(Item::CoreFragment, 1);
    player.inventory.add(Item::MemoryShard, 5);
    player.flags.insert(StoryFlag::MetOracle);
    player.flags.insert(StoryFlag::LearnedTruth);

    let mut session = GameSession::from_snapshot(snapshot).unwrap();
    assert_eq!(session.attempt_ending().unwrap(), EndingId::TrueEnding);
    let epilogue = session.epilogue().expect("epilogue after ending");
    assert!(epilogue.lines.iter().any(|l| l.contains("Unknown")));
}

#[test]
fn test_zero_integrity_collapses_the_world() {
    let session = GameSession::new_game(Some(7));
    let mut snapshot = session.snapshot();
    snapshot.player.system_integrity = 0;

    let mut session = GameSession::from_snapshot(snapshot).unwrap();
    assert_eq!(session.ending_available(), Some(EndingId::WorldCollapse));
    assert_eq!(session.attempt_ending().unwrap(), EndingId::WorldCollapse);
}

#[test]
fn test_entropy_seeded_sessions_still_play() {
    let mut session = GameSession::new_game(None);
    play(&mut session, 10);
    assert!(session.player().explorations >= 1);
}
