mod common;

use std::sync::{Arc, Mutex};

use common::*;
use waddles_core::{RoomError, RoomEvent};
use waddles_types::{
    Accessibility, GameSettings, GameState, GameStatus, PlayerField, PushEvent, RoomField,
    Verdict,
};

fn guess(room: &mut waddles_core::Room, player: &TestPlayer, word: &str) {
    room.submit_attempt(player.id, word).unwrap();
}

#[test]
fn test_start_game_resets_scores_and_starts_round_one() {
    let (mut room, players) = create_room_with_players(single_word_settings("crane"), 2);
    let admin = &players[0];

    room.start_game(admin.id).unwrap();
    assert_eq!(room.state(), &GameState::playing(1, None));

    guess(&mut room, admin, "crane");
    assert_eq!(room.player(admin.id).unwrap().score(), 1);

    room.start_game(admin.id).unwrap();
    let player = room.player(admin.id).unwrap();
    assert_eq!(player.score(), 0);
    assert_eq!(player.total_score(), 1);
    assert!(player.attempts().is_empty());
    assert_eq!(room.state().round(), 1);
    assert_eq!(room.state().status(), GameStatus::Playing);
}

#[test]
fn test_next_round_after_last_round_returns_to_waiting() {
    let settings = GameSettings {
        total_rounds: 2,
        ..single_word_settings("crane")
    };
    let (mut room, players) = create_room_with_players(settings, 2);
    let admin = players[0].id;

    room.start_game(admin).unwrap();
    room.next_round(admin).unwrap();
    assert_eq!(room.state().round(), 2);
    assert_eq!(room.state().status(), GameStatus::Playing);

    room.next_round(admin).unwrap();
    assert_eq!(room.state().status(), GameStatus::Waiting);
    assert_eq!(room.state().round(), 2);
}

#[test]
fn test_chooser_rotation_wraps_around() {
    let (mut room, players) = create_room_with_players(entered_settings(5), 3);
    let admin = players[0].id;

    room.start_game(admin).unwrap();
    let mut choosers = vec![room.state().chooser_id()];
    for _ in 0..3 {
        room.next_round(admin).unwrap();
        assert_eq!(room.state().status(), GameStatus::ChoosingWord);
        choosers.push(room.state().chooser_id());
    }

    assert_eq!(
        choosers,
        vec![
            Some(players[0].id),
            Some(players[1].id),
            Some(players[2].id),
            Some(players[0].id),
        ]
    );
    assert_eq!(room.state().round(), 4);
}

#[test]
fn test_entered_word_opens_guessing() {
    let (mut room, players) = create_room_with_players(entered_settings(3), 2);
    let chooser = &players[0];
    let guesser = &players[1];

    room.start_game(chooser.id).unwrap();
    assert_eq!(
        room.submit_attempt(guesser.id, "hello"),
        Err(RoomError::RoundNotInProgress)
    );

    assert!(matches!(
        room.set_word(chooser.id, "ab1"),
        Err(RoomError::InvalidWord(_))
    ));
    assert_eq!(room.state().status(), GameStatus::ChoosingWord);

    room.set_word(chooser.id, "  Hello ").unwrap();
    assert_eq!(room.state(), &GameState::playing(1, Some(chooser.id)));

    let scoring = room.submit_attempt(guesser.id, "HELLO").unwrap();
    assert!(scoring.iter().all(|l| l.verdict == Verdict::Matches));
    assert_eq!(room.state().winner_id(), Some(guesser.id));
}

#[test]
fn test_speed_win_scores_exactly_once() {
    let (mut room, players) = create_room_with_players(single_word_settings("crane"), 2);
    let winner = &players[0];
    let loser = &players[1];

    room.start_game(winner.id).unwrap();
    guess(&mut room, loser, "plant");
    guess(&mut room, winner, "crane");

    assert_eq!(room.state().status(), GameStatus::ShowingWinner);
    assert_eq!(room.state().winner_id(), Some(winner.id));
    assert_eq!(room.state().chooser_id(), None);

    let winner_player = room.player(winner.id).unwrap();
    assert_eq!(winner_player.score(), 1);
    assert_eq!(winner_player.total_score(), 1);
    let loser_player = room.player(loser.id).unwrap();
    assert_eq!(loser_player.score(), 0);
    assert_eq!(loser_player.total_score(), 0);

    assert_eq!(
        room.submit_attempt(loser.id, "crane"),
        Err(RoomError::RoundNotInProgress)
    );
}

#[test]
fn test_speed_draw_when_everyone_runs_out() {
    let settings = GameSettings {
        allowed_attempts: 2,
        ..single_word_settings("crane")
    };
    let (mut room, players) = create_room_with_players(settings, 2);

    room.start_game(players[0].id).unwrap();
    guess(&mut room, &players[0], "plant");
    guess(&mut room, &players[0], "storm");
    assert_eq!(room.state().status(), GameStatus::Playing);
    assert_eq!(
        room.submit_attempt(players[0].id, "crane"),
        Err(RoomError::NoAttemptsLeft)
    );

    guess(&mut room, &players[1], "plant");
    guess(&mut room, &players[1], "storm");
    assert_eq!(room.state().status(), GameStatus::ShowingWinner);
    assert_eq!(room.state().winner_id(), None);
}

#[test]
fn test_attempts_mode_tie_is_a_draw() {
    let (mut room, players) = create_room_with_players(attempts_settings("crane", 6), 2);
    room.start_game(players[0].id).unwrap();

    for player in &players {
        for word in ["plant", "storm", "quilt", "crane"] {
            guess(&mut room, player, word);
        }
        if player.id == players[0].id {
            // Still waiting on the other player
            assert_eq!(room.state().status(), GameStatus::Playing);
        }
    }

    assert_eq!(room.state().status(), GameStatus::ShowingWinner);
    assert_eq!(room.state().winner_id(), None);
    for player in &players {
        let player = room.player(player.id).unwrap();
        assert_eq!(player.score(), 0);
        assert_eq!(player.total_score(), 0);
    }
}

#[test]
fn test_attempts_mode_fewest_attempts_wins() {
    let (mut room, players) = create_room_with_players(attempts_settings("crane", 3), 2);
    room.start_game(players[0].id).unwrap();

    guess(&mut room, &players[1], "plant");
    guess(&mut room, &players[1], "crane");
    for word in ["plant", "storm", "quilt"] {
        guess(&mut room, &players[0], word);
    }

    assert_eq!(room.state().winner_id(), Some(players[1].id));
    assert_eq!(room.player(players[1].id).unwrap().score(), 1);
}

#[test]
fn test_removing_chooser_advances_round() {
    let (mut room, players) = create_room_with_players(entered_settings(3), 3);
    room.start_game(players[0].id).unwrap();
    assert_eq!(room.state().chooser_id(), Some(players[0].id));

    let removed = room.remove_player(players[0].id).unwrap();
    assert!(removed.room().is_none());

    assert_eq!(room.state().round(), 2);
    assert_eq!(room.state().status(), GameStatus::ChoosingWord);
    assert_eq!(room.state().chooser_id(), Some(players[1].id));
    assert_eq!(room.admin_id(), Some(players[1].id));
}

#[test]
fn test_removing_chooser_while_playing_on_last_round_ends_game() {
    let (mut room, players) = create_room_with_players(entered_settings(1), 2);
    room.start_game(players[0].id).unwrap();
    room.set_word(players[0].id, "crane").unwrap();

    room.remove_player(players[0].id);

    assert_eq!(room.state().status(), GameStatus::Waiting);
    assert_eq!(room.state().round(), 1);
    assert_eq!(room.state().chooser_id(), None);
}

#[test]
fn test_player_changing_rooms_starts_with_no_attempts() {
    let (mut first, players) = create_room_with_players(single_word_settings("crane"), 2);
    let mover = &players[0];
    first.start_game(mover.id).unwrap();
    guess(&mut first, mover, "crane");
    assert_eq!(first.state().winner_id(), Some(mover.id));

    let moved = first.remove_player(mover.id).unwrap();
    assert!(moved.attempts().is_empty());
    assert!(!moved.guessed_word());

    let mut second = create_room(attempts_settings("cat", 2), 3);
    let mut residents = Vec::new();
    for _ in 0..2 {
        let (player, handle) = create_test_player();
        second.add_player(player).unwrap();
        residents.push(handle);
    }
    second.start_game(residents[0].id).unwrap();
    second.add_player(moved).unwrap();

    let newcomer = second.player(mover.id).unwrap();
    assert!(newcomer.attempts().is_empty());
    assert_eq!(newcomer.score(), 0);

    // The newcomer plays the round like everyone else
    guess(&mut second, mover, "dog");
    assert_eq!(second.player(mover.id).unwrap().attempts()[0].len(), 3);
    guess(&mut second, &residents[0], "cat");
    guess(&mut second, &residents[1], "dog");
    guess(&mut second, &residents[1], "cat");
    assert_eq!(second.state().status(), GameStatus::Playing);
    guess(&mut second, mover, "dog");

    assert_eq!(second.state().status(), GameStatus::ShowingWinner);
    assert_eq!(second.state().winner_id(), Some(residents[0].id));
    assert_eq!(second.player(mover.id).unwrap().score(), 0);
}

#[test]
fn test_departure_settles_round_when_rest_are_finished() {
    let (mut room, players) = create_room_with_players(attempts_settings("crane", 6), 3);
    room.start_game(players[0].id).unwrap();

    guess(&mut room, &players[0], "crane");
    guess(&mut room, &players[1], "plant");
    guess(&mut room, &players[1], "crane");
    assert_eq!(room.state().status(), GameStatus::Playing);

    room.remove_player(players[2].id);

    assert_eq!(room.state().status(), GameStatus::ShowingWinner);
    assert_eq!(room.state().winner_id(), Some(players[0].id));
}

#[test]
fn test_only_admin_may_manage_room() {
    let (mut room, players) = create_room_with_players(single_word_settings("crane"), 2);
    let other = players[1].id;
    let before = room.snapshot();

    assert_eq!(room.start_game(other), Err(RoomError::NotAdmin));
    assert_eq!(room.next_round(other), Err(RoomError::NotAdmin));
    assert_eq!(
        room.set_settings(other, entered_settings(1)),
        Err(RoomError::NotAdmin)
    );
    assert_eq!(
        room.set_accessibility(
            other,
            Accessibility {
                private: true,
                max_player_count: 5,
            }
        ),
        Err(RoomError::NotAdmin)
    );
    assert!(matches!(
        room.kick_player(other, players[0].id, None),
        Err(RoomError::NotAdmin)
    ));

    assert_eq!(room.snapshot(), before);
}

#[test]
fn test_only_chooser_may_enter_word() {
    let (mut room, players) = create_room_with_players(entered_settings(3), 2);

    assert_eq!(
        room.set_word(players[0].id, "crane"),
        Err(RoomError::RoundNotInProgress)
    );

    room.start_game(players[0].id).unwrap();
    assert_eq!(
        room.set_word(players[1].id, "crane"),
        Err(RoomError::NotChooser)
    );
    assert_eq!(room.state().status(), GameStatus::ChoosingWord);
}

#[test]
fn test_guess_preconditions() {
    let (mut room, players) = create_room_with_players(single_word_settings("crane"), 2);
    let player = &players[0];

    assert_eq!(
        room.submit_attempt(player.id, "crane"),
        Err(RoomError::RoundNotInProgress)
    );

    room.start_game(player.id).unwrap();
    assert!(matches!(
        room.submit_attempt(player.id, "cranes"),
        Err(RoomError::InvalidWord(_))
    ));
    assert!(room.player(player.id).unwrap().attempts().is_empty());

    let stranger = uuid::Uuid::new_v4();
    assert_eq!(
        room.submit_attempt(stranger, "crane"),
        Err(RoomError::PlayerNotFound(stranger))
    );
}

#[test]
fn test_attempts_hidden_from_opponents_unless_revealed() {
    let (mut room, players) = create_room_with_players(single_word_settings("crane"), 2);
    let guesser = &players[0];
    let opponent = &players[1];
    room.start_game(guesser.id).unwrap();

    guess(&mut room, guesser, "plant");

    let opponent_view = opponent.channel.get_events().into_iter().rev().find_map(|e| match e {
        PushEvent::PlayerField {
            player_id,
            field: PlayerField::Attempts(attempts),
        } if player_id == guesser.id => Some(attempts),
        _ => None,
    });
    let opponent_view = opponent_view.unwrap();
    assert_eq!(opponent_view.len(), 1);
    assert!(opponent_view[0].iter().all(|l| l.letter.is_none()));

    let own_view = room.retrieve_player(guesser.id, guesser.id).unwrap();
    assert_eq!(own_view.attempts[0][0].letter, Some('p'));
    let other_view = room.retrieve_player(opponent.id, guesser.id).unwrap();
    assert_eq!(other_view.attempts[0][0].letter, None);

    let revealing = GameSettings {
        reveal_opponent_letters: true,
        ..single_word_settings("crane")
    };
    room.set_settings(guesser.id, revealing).unwrap();
    let other_view = room.retrieve_player(opponent.id, guesser.id).unwrap();
    assert_eq!(other_view.attempts[0][0].letter, Some('p'));
}

#[test]
fn test_full_room_hands_player_back() {
    let (mut room, _players) = create_room_with_players(single_word_settings("crane"), 2);
    let before = room.snapshot();
    let (extra, handle) = create_test_player();

    let rejected = room.add_player(extra).unwrap_err();
    assert!(matches!(rejected.reason, RoomError::RoomFull(_)));
    assert_eq!(rejected.player.id(), handle.id);
    assert_eq!(room.snapshot(), before);
    assert_eq!(handle.channel.event_count(), 0);
}

#[test]
fn test_membership_shares_and_unshares_players() {
    let (mut room, players) = create_room_with_players(single_word_settings("crane"), 3);
    let (first, second, third) = (&players[0], &players[1], &players[2]);

    assert!(room.retrieve_player(first.id, second.id).is_ok());
    assert!(first.channel.has_event(|e| matches!(
        e,
        PushEvent::PlayerAdded { player_id, .. } if *player_id == third.id
    )));

    first.channel.clear();
    third.channel.clear();
    let removed = room.remove_player(third.id).unwrap();

    assert!(removed.retrieve(first.id, true).is_err());
    assert!(!room.player(first.id).unwrap().is_visible_to(third.id));
    assert!(first.channel.has_event(|e| matches!(
        e,
        PushEvent::PlayerRemoved { player_id, .. } if *player_id == third.id
    )));
    assert_eq!(third.channel.event_count(), 0);

    // Later changes no longer reach the departed player
    room.set_settings(first.id, entered_settings(1)).unwrap();
    assert_eq!(third.channel.event_count(), 0);
    assert!(second.channel.has_event(|e| matches!(
        e,
        PushEvent::RoomField {
            field: RoomField::Settings(_),
            ..
        }
    )));
}

#[test]
fn test_kick_notifies_everyone_and_returns_player() {
    let (mut room, players) = create_room_with_players(single_word_settings("crane"), 2);
    let admin = &players[0];
    let target = &players[1];

    let kicked = room
        .kick_player(admin.id, target.id, Some("bye".to_string()))
        .unwrap();

    assert_eq!(kicked.id(), target.id);
    assert!(kicked.room().is_none());
    assert_eq!(room.player_ids(), vec![admin.id]);
    for handle in [admin, target] {
        assert!(handle.channel.has_event(|e| matches!(
            e,
            PushEvent::PlayerKicked { player_id, message, .. }
                if *player_id == target.id && message == "bye"
        )));
    }

    let stranger = uuid::Uuid::new_v4();
    assert!(matches!(
        room.kick_player(admin.id, stranger, None),
        Err(RoomError::PlayerNotFound(_))
    ));
}

#[test]
fn test_occupancy_events_follow_membership() {
    let mut room = create_room(single_word_settings("crane"), 2);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    room.on_event("test", move |event| {
        let RoomEvent::OccupancyChanged(occupancy) = event;
        sink.lock().unwrap().push(occupancy.clone());
    });

    let (first, first_handle) = create_test_player();
    let (second, _) = create_test_player();
    room.add_player(first).unwrap();
    room.add_player(second).unwrap();
    room.remove_player(first_handle.id);

    let seen = seen.lock().unwrap();
    let counts: Vec<usize> = seen.iter().map(|o| o.player_count).collect();
    assert_eq!(counts, vec![1, 2, 1]);
    assert!(seen[0].is_joinable());
    assert!(!seen[1].is_joinable());
}

#[test]
fn test_accessibility_change_is_clamped_and_reported() {
    let (mut room, players) = create_room_with_players(single_word_settings("crane"), 2);
    let seen = Arc::new(Mutex::new(0));
    let sink = seen.clone();
    room.on_event("test", move |_| *sink.lock().unwrap() += 1);

    room.set_accessibility(
        players[0].id,
        Accessibility {
            private: true,
            max_player_count: 1,
        },
    )
    .unwrap();

    assert_eq!(room.accessibility().max_player_count, 2);
    assert!(room.accessibility().private);
    assert_eq!(*seen.lock().unwrap(), 1);
}

#[test]
fn test_reading_state_pushes_nothing() {
    let (room, players) = create_room_with_players(single_word_settings("crane"), 2);
    for handle in &players {
        handle.channel.clear();
    }

    let first = room.snapshot();
    let second = room.snapshot();
    let _ = room.retrieve_player(players[0].id, players[1].id).unwrap();

    assert_eq!(first, second);
    for handle in &players {
        assert_eq!(handle.channel.event_count(), 0);
    }
}

#[test]
fn test_rename_reaches_room_members() {
    let (mut room, players) = create_room_with_players(single_word_settings("crane"), 2);
    let renamed = &players[0];

    assert_eq!(
        room.set_player_name(players[1].id, renamed.id, "Mallory"),
        Err(RoomError::NotWritable("name"))
    );
    room.set_player_name(renamed.id, renamed.id, "Alice").unwrap();

    assert_eq!(
        players[1].channel.last_event(),
        Some(PushEvent::PlayerField {
            player_id: renamed.id,
            field: PlayerField::Name("Alice".to_string()),
        })
    );
}
