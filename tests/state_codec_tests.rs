use uni_timetable_bot::bot::states::{StateRegistry, CANCEL};

fn registry() -> StateRegistry {
    StateRegistry::new().expect("state patterns must compile")
}

/// Sample token arguments, one per callback state, in the order of
/// `callback_states()`.
const SAMPLE_ARGS: [&str; 8] = [
    "5",
    "5",
    "3",
    "7",
    "12",
    "2",
    "2026-09-01",
    "2026-08-31",
];

#[test]
fn test_round_trip_every_callback_state() {
    let states = registry();
    for (state, arg) in states.callback_states().iter().zip(SAMPLE_ARGS) {
        let token = state.build(&[arg]).expect("build");
        let parsed = state.parse(&token).expect("token must parse by its own state");
        assert_eq!(parsed, vec![arg.to_string()], "{}", state.name);
    }
}

#[test]
fn test_no_token_parses_under_two_states() {
    let states = registry();
    let callback_states = states.callback_states();
    for (i, (state, arg)) in callback_states.iter().zip(SAMPLE_ARGS).enumerate() {
        let token = state.build(&[arg]).expect("build");
        for (j, other) in callback_states.iter().enumerate() {
            if i == j {
                continue;
            }
            assert!(
                other.parse(&token).is_none(),
                "token {} of {} also parsed by {}",
                token,
                state.name,
                other.name
            );
        }
    }
}

#[test]
fn test_cancel_parses_under_no_state() {
    let states = registry();
    for state in states.callback_states() {
        assert!(state.parse(CANCEL).is_none(), "{}", state.name);
    }
}

#[test]
fn test_link_wait_is_text_input_and_excluded_from_callbacks() {
    let states = registry();
    assert!(states.link_wait.text_input);
    assert!(states
        .callback_states()
        .iter()
        .all(|s| s.name != states.link_wait.name));
}

#[test]
fn test_link_command_pattern() {
    let states = registry();
    let caps = states.link_command.captures("/link@42").expect("must match");
    assert_eq!(&caps[1], "42");
    assert!(states.link_command.captures("/link@").is_none());
    assert!(states.link_command.captures("/link@42 extra").is_none());
    assert!(states.link_command.captures("link@42").is_none());
}

#[test]
fn test_timetable_tokens_carry_absolute_dates() {
    let states = registry();
    let token = states
        .timetable_week_selection
        .build(&["2026-08-31"])
        .expect("build");
    assert_eq!(token, "tt_week_selection_2026-08-31");
    // Date shape is enforced at parse time.
    assert!(states.timetable_week_selection.parse("tt_week_selection_tomorrow").is_none());
}
