//! Integration tests for the protocol engine.
//!
//! These drive the engine exactly as the network layer does — one decoded
//! message at a time, with channel-backed outbound handles standing in for
//! sockets — and check every frame the server queues in response.

use tokio::sync::mpsc;
use wordduel_core::{decode_message, Message, PlayerId};
use wordduel_server::application::engine::{
    ConnectionKey, Disposition, Engine, EngineConfig, SessionState,
};
use wordduel_server::application::registry::OutboundHandle;

type Inbox = mpsc::UnboundedReceiver<Vec<u8>>;

fn test_engine() -> Engine {
    Engine::new(EngineConfig::default())
}

fn attach(engine: &mut Engine, key: ConnectionKey) -> Inbox {
    let (tx, rx) = mpsc::unbounded_channel();
    engine.connect(key, OutboundHandle::new(tx));
    rx
}

fn next_message(rx: &mut Inbox) -> Message {
    let frame = rx.try_recv().expect("expected a queued frame");
    decode_message(&frame).expect("frame must decode")
}

fn assert_empty(rx: &mut Inbox) {
    assert!(rx.try_recv().is_err(), "no further frames expected");
}

/// Runs the full handshake and returns the assigned identity.
fn authenticate(engine: &mut Engine, key: ConnectionKey, rx: &mut Inbox) -> PlayerId {
    engine.handle_message(key, Message::Init);
    assert_eq!(next_message(rx), Message::Init, "Init must be acknowledged");

    engine.handle_message(key, Message::PasswordResponse("secret".to_string()));
    match next_message(rx) {
        Message::AssignId(id) => id,
        other => panic!("expected AssignId, got {other:?}"),
    }
}

// ── Scenario A: handshake ─────────────────────────────────────────────────────

#[test]
fn test_scenario_a_first_connection_is_assigned_identity_one() {
    let mut engine = test_engine();
    let mut rx = attach(&mut engine, 10);

    let id = authenticate(&mut engine, 10, &mut rx);

    assert_eq!(id, 1);
    assert_eq!(engine.state_of(10), Some(SessionState::Idle));
}

#[test]
fn test_identities_increase_across_connections_and_survive_disconnects() {
    let mut engine = test_engine();
    let mut rx1 = attach(&mut engine, 10);
    let mut rx2 = attach(&mut engine, 20);
    assert_eq!(authenticate(&mut engine, 10, &mut rx1), 1);
    assert_eq!(authenticate(&mut engine, 20, &mut rx2), 2);

    engine.disconnect(10);

    let mut rx3 = attach(&mut engine, 30);
    assert_eq!(
        authenticate(&mut engine, 30, &mut rx3),
        3,
        "identities are never reused"
    );
}

// ── Opponents listing ─────────────────────────────────────────────────────────

#[test]
fn test_opponents_list_excludes_the_caller_in_registration_order() {
    let mut engine = test_engine();
    let mut rx1 = attach(&mut engine, 10);
    let mut rx2 = attach(&mut engine, 20);
    let mut rx3 = attach(&mut engine, 30);
    authenticate(&mut engine, 10, &mut rx1);
    authenticate(&mut engine, 20, &mut rx2);
    authenticate(&mut engine, 30, &mut rx3);

    engine.handle_message(20, Message::RequestOpponents);

    assert_eq!(next_message(&mut rx2), Message::OpponentsResponse(vec![1, 3]));
}

// ── Scenario B: match and victory ─────────────────────────────────────────────

#[test]
fn test_scenario_b_correct_guess_broadcasts_victory_and_ends_the_match() {
    let mut engine = test_engine();
    let mut rx1 = attach(&mut engine, 10);
    let mut rx2 = attach(&mut engine, 20);
    authenticate(&mut engine, 10, &mut rx1);
    authenticate(&mut engine, 20, &mut rx2);

    engine.handle_message(
        10,
        Message::RequestMatch {
            opponent: 2,
            word: "apple".to_string(),
        },
    );
    assert_eq!(next_message(&mut rx1), Message::MatchConfirm);
    assert_eq!(next_message(&mut rx2), Message::MatchConfirm);
    assert_eq!(engine.state_of(10), Some(SessionState::InMatch));
    assert_eq!(engine.state_of(20), Some(SessionState::InMatch));

    engine.handle_message(20, Message::GuessWord("apple".to_string()));

    // Victory announcement goes to every online connection, then both
    // participants get EndMatch.
    for rx in [&mut rx1, &mut rx2] {
        match next_message(rx) {
            Message::Text(text) => assert!(text.contains("WORD GUESSED")),
            other => panic!("expected victory broadcast, got {other:?}"),
        }
        assert_eq!(next_message(rx), Message::EndMatch);
        assert_empty(rx);
    }
    assert_eq!(engine.state_of(10), Some(SessionState::Idle));
    assert_eq!(engine.state_of(20), Some(SessionState::Idle));
}

#[test]
fn test_victory_broadcast_reaches_bystanders() {
    let mut engine = test_engine();
    let mut rx1 = attach(&mut engine, 10);
    let mut rx2 = attach(&mut engine, 20);
    let mut rx3 = attach(&mut engine, 30);
    authenticate(&mut engine, 10, &mut rx1);
    authenticate(&mut engine, 20, &mut rx2);
    authenticate(&mut engine, 30, &mut rx3);

    engine.handle_message(
        10,
        Message::RequestMatch {
            opponent: 2,
            word: "apple".to_string(),
        },
    );
    engine.handle_message(20, Message::GuessWord("apple".to_string()));

    match next_message(&mut rx3) {
        Message::Text(text) => assert!(text.contains("Player 2")),
        other => panic!("bystander expected the broadcast, got {other:?}"),
    }
    // But no EndMatch: player 3 was never part of the match.
    assert_empty(&mut rx3);
}

#[test]
fn test_guess_comparison_is_case_sensitive_at_the_engine_level() {
    let mut engine = test_engine();
    let mut rx1 = attach(&mut engine, 10);
    let mut rx2 = attach(&mut engine, 20);
    authenticate(&mut engine, 10, &mut rx1);
    authenticate(&mut engine, 20, &mut rx2);

    engine.handle_message(
        10,
        Message::RequestMatch {
            opponent: 2,
            word: "apple".to_string(),
        },
    );
    let _ = next_message(&mut rx1);
    let _ = next_message(&mut rx2);

    engine.handle_message(20, Message::GuessWord("Apple".to_string()));

    assert_eq!(
        next_message(&mut rx2),
        Message::ProgressUpdate {
            success: false,
            guess: "Apple".to_string()
        }
    );
}

// ── Scenario C: budget exhaustion ─────────────────────────────────────────────

#[test]
fn test_scenario_c_tenth_wrong_guess_force_ends_the_match() {
    let mut engine = test_engine();
    let mut rx1 = attach(&mut engine, 10);
    let mut rx2 = attach(&mut engine, 20);
    authenticate(&mut engine, 10, &mut rx1);
    authenticate(&mut engine, 20, &mut rx2);

    engine.handle_message(
        10,
        Message::RequestMatch {
            opponent: 2,
            word: "apple".to_string(),
        },
    );
    let _ = next_message(&mut rx1);
    let _ = next_message(&mut rx2);

    let wrong = Message::ProgressUpdate {
        success: false,
        guess: "grape".to_string(),
    };

    for _ in 0..9 {
        engine.handle_message(20, Message::GuessWord("grape".to_string()));
        assert_eq!(next_message(&mut rx1), wrong);
        assert_eq!(next_message(&mut rx2), wrong);
    }
    assert_eq!(engine.state_of(20), Some(SessionState::InMatch));

    // The tenth wrong guess: progress update, failure broadcast, EndMatch.
    engine.handle_message(20, Message::GuessWord("grape".to_string()));
    for rx in [&mut rx1, &mut rx2] {
        assert_eq!(next_message(rx), wrong);
        match next_message(rx) {
            Message::Text(text) => assert!(text.contains("failed to guess")),
            other => panic!("expected failure broadcast, got {other:?}"),
        }
        assert_eq!(next_message(rx), Message::EndMatch);
        assert_empty(rx);
    }
    assert_eq!(engine.state_of(10), Some(SessionState::Idle));
    assert_eq!(engine.state_of(20), Some(SessionState::Idle));
}

#[test]
fn test_attempt_budget_is_shared_between_participants() {
    let mut engine = test_engine();
    let mut rx1 = attach(&mut engine, 10);
    let mut rx2 = attach(&mut engine, 20);
    authenticate(&mut engine, 10, &mut rx1);
    authenticate(&mut engine, 20, &mut rx2);

    engine.handle_message(
        10,
        Message::RequestMatch {
            opponent: 2,
            word: "apple".to_string(),
        },
    );
    let _ = next_message(&mut rx1);
    let _ = next_message(&mut rx2);

    // Five misses from each side exhaust the shared budget of ten.
    for _ in 0..5 {
        engine.handle_message(10, Message::GuessWord("melon".to_string()));
        engine.handle_message(20, Message::GuessWord("grape".to_string()));
    }

    let mut saw_end_match = false;
    while let Ok(frame) = rx2.try_recv() {
        if decode_message(&frame).unwrap() == Message::EndMatch {
            saw_end_match = true;
        }
    }
    assert!(saw_end_match, "shared budget must force the match to end");
}

// ── Scenario D: unknown opponent ──────────────────────────────────────────────

#[test]
fn test_scenario_d_unknown_opponent_is_an_error_and_state_is_kept() {
    let mut engine = test_engine();
    let mut rx1 = attach(&mut engine, 10);
    authenticate(&mut engine, 10, &mut rx1);

    engine.handle_message(
        10,
        Message::RequestMatch {
            opponent: 99,
            word: "apple".to_string(),
        },
    );

    assert_eq!(
        next_message(&mut rx1),
        Message::Error("Opponent not found".to_string())
    );
    assert_eq!(engine.state_of(10), Some(SessionState::Idle));
}

#[test]
fn test_challenging_yourself_is_rejected() {
    let mut engine = test_engine();
    let mut rx1 = attach(&mut engine, 10);
    authenticate(&mut engine, 10, &mut rx1);

    engine.handle_message(
        10,
        Message::RequestMatch {
            opponent: 1,
            word: "apple".to_string(),
        },
    );

    assert_eq!(
        next_message(&mut rx1),
        Message::Error("Opponent not found".to_string())
    );
}

#[test]
fn test_re_pairing_a_busy_player_is_rejected() {
    let mut engine = test_engine();
    let mut rx1 = attach(&mut engine, 10);
    let mut rx2 = attach(&mut engine, 20);
    let mut rx3 = attach(&mut engine, 30);
    authenticate(&mut engine, 10, &mut rx1);
    authenticate(&mut engine, 20, &mut rx2);
    authenticate(&mut engine, 30, &mut rx3);

    engine.handle_message(
        10,
        Message::RequestMatch {
            opponent: 2,
            word: "apple".to_string(),
        },
    );
    let _ = next_message(&mut rx1);
    let _ = next_message(&mut rx2);

    engine.handle_message(
        30,
        Message::RequestMatch {
            opponent: 2,
            word: "pear".to_string(),
        },
    );

    assert_eq!(
        next_message(&mut rx3),
        Message::Error("Match already in progress".to_string())
    );
    assert_empty(&mut rx2);
}

// ── Guesses and hints outside a match ─────────────────────────────────────────

#[test]
fn test_guess_without_a_match_reports_no_active_match() {
    let mut engine = test_engine();
    let mut rx1 = attach(&mut engine, 10);
    authenticate(&mut engine, 10, &mut rx1);

    engine.handle_message(10, Message::GuessWord("apple".to_string()));

    assert_eq!(
        next_message(&mut rx1),
        Message::Error("No ongoing match found".to_string())
    );
}

#[test]
fn test_hint_without_a_match_reports_no_active_match() {
    let mut engine = test_engine();
    let mut rx1 = attach(&mut engine, 10);
    authenticate(&mut engine, 10, &mut rx1);

    engine.handle_message(10, Message::Hint("round and red".to_string()));

    assert_eq!(
        next_message(&mut rx1),
        Message::Error("No ongoing match found".to_string())
    );
}

#[test]
fn test_hint_is_relayed_verbatim_to_the_opponent() {
    let mut engine = test_engine();
    let mut rx1 = attach(&mut engine, 10);
    let mut rx2 = attach(&mut engine, 20);
    authenticate(&mut engine, 10, &mut rx1);
    authenticate(&mut engine, 20, &mut rx2);

    engine.handle_message(
        10,
        Message::RequestMatch {
            opponent: 2,
            word: "apple".to_string(),
        },
    );
    let _ = next_message(&mut rx1);
    let _ = next_message(&mut rx2);

    engine.handle_message(10, Message::Hint("  keeps the doctor away  ".to_string()));

    assert_eq!(
        next_message(&mut rx2),
        Message::Hint("  keeps the doctor away  ".to_string()),
        "hints are not trimmed or rewritten"
    );
    assert_empty(&mut rx1);
}

// ── Disconnect handling ───────────────────────────────────────────────────────

#[test]
fn test_disconnect_mid_match_notifies_the_opponent_and_ends_the_match() {
    let mut engine = test_engine();
    let mut rx1 = attach(&mut engine, 10);
    let mut rx2 = attach(&mut engine, 20);
    authenticate(&mut engine, 10, &mut rx1);
    authenticate(&mut engine, 20, &mut rx2);

    engine.handle_message(
        10,
        Message::RequestMatch {
            opponent: 2,
            word: "apple".to_string(),
        },
    );
    let _ = next_message(&mut rx1);
    let _ = next_message(&mut rx2);

    engine.disconnect(10);

    match next_message(&mut rx2) {
        Message::Text(text) => assert!(text.contains("Player 1")),
        other => panic!("expected departure notice, got {other:?}"),
    }
    assert_eq!(next_message(&mut rx2), Message::EndMatch);
    assert_eq!(engine.state_of(20), Some(SessionState::Idle));

    // The departed identity is gone from the opponents list.
    engine.handle_message(20, Message::RequestOpponents);
    assert_eq!(next_message(&mut rx2), Message::OpponentsResponse(vec![]));
}

#[test]
fn test_guess_after_opponent_disconnect_reports_no_active_match() {
    let mut engine = test_engine();
    let mut rx1 = attach(&mut engine, 10);
    let mut rx2 = attach(&mut engine, 20);
    authenticate(&mut engine, 10, &mut rx1);
    authenticate(&mut engine, 20, &mut rx2);

    engine.handle_message(
        10,
        Message::RequestMatch {
            opponent: 2,
            word: "apple".to_string(),
        },
    );
    let _ = next_message(&mut rx1);
    let _ = next_message(&mut rx2);

    engine.disconnect(10);
    let _ = next_message(&mut rx2); // departure notice
    let _ = next_message(&mut rx2); // EndMatch

    engine.handle_message(20, Message::GuessWord("apple".to_string()));
    assert_eq!(
        next_message(&mut rx2),
        Message::Error("No ongoing match found".to_string())
    );
}

// ── Authentication edge cases ─────────────────────────────────────────────────

#[test]
fn test_wrong_password_is_fatal_and_single_attempt() {
    let mut engine = test_engine();
    let mut rx = attach(&mut engine, 10);
    engine.handle_message(10, Message::Init);
    let _ = next_message(&mut rx);

    let disposition = engine.handle_message(10, Message::PasswordResponse("nope".to_string()));

    assert_eq!(disposition, Disposition::Close);
    assert_eq!(
        next_message(&mut rx),
        Message::Error("Invalid password".to_string())
    );
    assert_eq!(engine.online_count(), 0);
}

#[test]
fn test_custom_password_and_attempt_budget_are_honoured() {
    let mut engine = Engine::new(EngineConfig {
        password: "hunter2".to_string(),
        max_attempts: 2,
    });
    let mut rx1 = attach(&mut engine, 10);
    let mut rx2 = attach(&mut engine, 20);

    for (key, rx) in [(10, &mut rx1), (20, &mut rx2)] {
        engine.handle_message(key, Message::Init);
        let _ = next_message(rx);
        engine.handle_message(key, Message::PasswordResponse("hunter2".to_string()));
        let _ = next_message(rx);
    }

    engine.handle_message(
        10,
        Message::RequestMatch {
            opponent: 2,
            word: "apple".to_string(),
        },
    );
    let _ = next_message(&mut rx1);
    let _ = next_message(&mut rx2);

    engine.handle_message(20, Message::GuessWord("grape".to_string()));
    let _ = next_message(&mut rx2);
    engine.handle_message(20, Message::GuessWord("melon".to_string()));

    let mut saw_end_match = false;
    while let Ok(frame) = rx2.try_recv() {
        if decode_message(&frame).unwrap() == Message::EndMatch {
            saw_end_match = true;
        }
    }
    assert!(saw_end_match, "budget of two must end the match on the second miss");
}
