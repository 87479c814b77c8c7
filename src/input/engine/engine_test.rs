use std::time::{Duration, Instant};

use crate::config::Config;
use crate::input::command::OutputCommand;
use crate::input::sample::{button, GamepadSample};

use super::channel::ChannelState;
use super::Engine;

/// One sample period at the 120 Hz sampling rate
const SAMPLE_DT: Duration = Duration::from_micros(8_333);

fn test_config() -> Config {
    let mut config = Config::default();
    config.normalize();
    config
}

fn stick(left_x: f64, left_y: f64) -> GamepadSample {
    GamepadSample {
        left_x,
        left_y,
        ..Default::default()
    }
}

fn buttons(buttons: u16) -> GamepadSample {
    GamepadSample {
        buttons,
        ..Default::default()
    }
}

/// Latches mouse mode on with a toggle press followed by a release,
/// advancing the clock one sample per edge. Returns the time of the
/// activating sample.
fn activate(engine: &mut Engine, config: &Config, t: &mut Instant) -> Instant {
    engine.step(&buttons(button::TOGGLE), config, *t);
    *t += SAMPLE_DT;
    let commands = engine.step(&buttons(0), config, *t);
    assert!(commands.is_empty());
    assert!(engine.active());
    *t
}

fn moves(commands: &[OutputCommand]) -> Vec<(i32, i32)> {
    commands
        .iter()
        .filter_map(|c| match c {
            OutputCommand::Move { dx, dy } => Some((*dx, *dy)),
            _ => None,
        })
        .collect()
}

fn count(commands: &[OutputCommand], wanted: OutputCommand) -> usize {
    commands.iter().filter(|c| **c == wanted).count()
}

fn assert_close(actual: f64, expected: f64, eps: f64) {
    assert!(
        (actual - expected).abs() < eps,
        "expected {expected} +/- {eps}, got {actual}"
    );
}

#[test]
fn toggle_release_latches_mouse_mode() {
    let config = test_config();
    let mut engine = Engine::new();
    let mut t = Instant::now();

    // Press edge alone changes nothing
    engine.step(&buttons(button::TOGGLE), &config, t);
    assert!(!engine.active());

    // Release edge flips the latch and resets the channels
    t += SAMPLE_DT;
    engine.step(&buttons(0), &config, t);
    assert!(engine.active());
    assert_eq!(engine.pointer().state().filtered, (0.0, 0.0));
    assert_eq!(engine.pointer().state().accum, (0.0, 0.0));
    assert_eq!(engine.pointer().state().last_update, Some(t));
    assert_eq!(engine.scroll().state().last_update, Some(t));

    // A second press/release latches back off
    t += SAMPLE_DT;
    engine.step(&buttons(button::TOGGLE), &config, t);
    t += SAMPLE_DT;
    engine.step(&buttons(0), &config, t);
    assert!(!engine.active());
    assert_eq!(engine.pointer().state().last_update, None);
}

#[test]
fn inactive_engine_emits_nothing() {
    let config = test_config();
    let mut engine = Engine::new();
    let mut t = Instant::now();

    for _ in 0..10 {
        t += SAMPLE_DT;
        let sample = GamepadSample {
            left_x: 1.0,
            right_y: 1.0,
            buttons: button::CLICK_LEFT | button::DPAD_UP,
            ..Default::default()
        };
        assert!(engine.step(&sample, &config, t).is_empty());
    }
}

#[test]
fn below_deadzone_emits_nothing_and_keeps_state_zero() {
    let config = test_config();
    let mut engine = Engine::new();
    let mut t = Instant::now();
    activate(&mut engine, &config, &mut t);

    for _ in 0..10 {
        t += SAMPLE_DT;
        let commands = engine.step(&stick(0.05, -0.08), &config, t);
        assert!(commands.is_empty());
        assert_eq!(engine.pointer().state().filtered, (0.0, 0.0));
        assert_eq!(engine.pointer().state().accum, (0.0, 0.0));
    }
}

#[test]
fn centered_stick_never_moves() {
    let config = test_config();
    let mut engine = Engine::new();
    let mut t = Instant::now();
    activate(&mut engine, &config, &mut t);

    let mut total = 0;
    for _ in 0..10 {
        t += SAMPLE_DT;
        let commands = engine.step(&stick(0.0, 0.0), &config, t);
        total += moves(&commands).len();
    }
    assert_eq!(total, 0);
}

#[test]
fn first_full_deflection_sample() {
    // deadzone=0.12, pointer_speed=1.0, pointer_alpha=0.35, dt=1/120s:
    // target 900 px/s, filtered 315, accumulated ~2.6 px, emitted 2,
    // remainder ~0.6 carried.
    let config = test_config();
    let mut engine = Engine::new();
    let mut t = Instant::now();
    activate(&mut engine, &config, &mut t);

    t += SAMPLE_DT;
    let commands = engine.step(&stick(1.0, 0.0), &config, t);
    assert_eq!(moves(&commands), vec![(2, 0)]);
    assert_close(engine.pointer().state().filtered.0, 315.0, 1e-9);
    assert_close(engine.pointer().state().accum.0, 0.625, 0.01);
}

#[test]
fn pointer_inverts_y_axis() {
    let config = test_config();
    let mut engine = Engine::new();
    let mut t = Instant::now();
    activate(&mut engine, &config, &mut t);

    // Stick up must move the cursor up (negative screen Y)
    for _ in 0..5 {
        t += SAMPLE_DT;
        let commands = engine.step(&stick(0.0, 1.0), &config, t);
        for (dx, dy) in moves(&commands) {
            assert_eq!(dx, 0);
            assert!(dy < 0);
        }
    }
    assert!(engine.pointer().state().filtered.1 < 0.0);
}

#[test]
fn snap_zeroes_filter_before_smoothing() {
    let mut state = ChannelState {
        filtered: (120.0, -45.0),
        accum: (0.7, -0.3),
        last_update: None,
    };

    // Opposite-signed targets snap both axes to exactly zero
    state.snap_on_reversal((-1.0, 1.0));
    assert_eq!(state.filtered, (0.0, 0.0));
    assert_eq!(state.accum, (0.0, 0.0));

    // Same-signed or zero targets leave the filter alone
    let mut state = ChannelState {
        filtered: (120.0, -45.0),
        accum: (0.7, -0.3),
        last_update: None,
    };
    state.snap_on_reversal((1.0, 0.0));
    assert_eq!(state.filtered, (120.0, -45.0));
    assert_eq!(state.accum, (0.7, -0.3));
}

#[test]
fn reversal_carries_no_stale_remainder() {
    let config = test_config();
    let mut engine = Engine::new();
    let mut t = Instant::now();
    activate(&mut engine, &config, &mut t);

    for _ in 0..20 {
        t += SAMPLE_DT;
        engine.step(&stick(1.0, 0.0), &config, t);
    }
    assert!(engine.pointer().state().filtered.0 > 0.0);

    // Instant reversal: the accumulator must restart from zero, so after
    // one sample it holds exactly this sample's integration.
    t += SAMPLE_DT;
    engine.step(&stick(-1.0, 0.0), &config, t);
    let state = engine.pointer().state();
    assert!(state.filtered.0 < 0.0);
    assert_close(state.filtered.0, -315.0, 1e-9);
    let dt = SAMPLE_DT.as_secs_f64();
    let expected = state.filtered.0 * dt - (state.filtered.0 * dt).trunc();
    assert_close(state.accum.0, expected, 1e-9);
}

#[test]
fn deadzone_reentry_drops_velocity_and_remainder() {
    let config = test_config();
    let mut engine = Engine::new();
    let mut t = Instant::now();
    activate(&mut engine, &config, &mut t);

    for _ in 0..5 {
        t += SAMPLE_DT;
        engine.step(&stick(1.0, 0.0), &config, t);
    }
    assert!(engine.pointer().state().filtered.0 > 0.0);

    t += SAMPLE_DT;
    let commands = engine.step(&stick(0.02, 0.0), &config, t);
    assert!(moves(&commands).is_empty());
    assert_eq!(engine.pointer().state().filtered, (0.0, 0.0));
    assert_eq!(engine.pointer().state().accum, (0.0, 0.0));
}

#[test]
fn stalled_loop_cannot_spike_the_pointer() {
    let config = test_config();
    let mut engine = Engine::new();
    let mut t = Instant::now();
    activate(&mut engine, &config, &mut t);

    t += SAMPLE_DT;
    engine.step(&stick(1.0, 0.0), &config, t);

    // Five seconds without a sample: dt clamps to 250 ms and the
    // accumulator clamps to the per-sample step ceiling.
    t += Duration::from_secs(5);
    let commands = engine.step(&stick(1.0, 0.0), &config, t);
    assert_eq!(moves(&commands), vec![(18, 0)]);
    assert!(engine.pointer().state().accum.0.abs() < 1.0);
}

#[test]
fn click_edges_emit_exactly_once() {
    let config = test_config();
    let mut engine = Engine::new();
    let mut t = Instant::now();
    activate(&mut engine, &config, &mut t);

    t += SAMPLE_DT;
    let commands = engine.step(&buttons(button::CLICK_LEFT), &config, t);
    assert_eq!(count(&commands, OutputCommand::LeftDown), 1);

    // Held: no repeats
    for _ in 0..5 {
        t += SAMPLE_DT;
        let commands = engine.step(&buttons(button::CLICK_LEFT), &config, t);
        assert!(commands.is_empty());
    }

    t += SAMPLE_DT;
    let commands = engine.step(&buttons(0), &config, t);
    assert_eq!(count(&commands, OutputCommand::LeftUp), 1);

    // Right button is tracked independently
    t += SAMPLE_DT;
    let commands = engine.step(&buttons(button::CLICK_RIGHT), &config, t);
    assert_eq!(count(&commands, OutputCommand::RightDown), 1);
    assert_eq!(count(&commands, OutputCommand::LeftDown), 0);
}

#[test]
fn deactivation_releases_held_clicks() {
    let config = test_config();
    let mut engine = Engine::new();
    let mut t = Instant::now();
    activate(&mut engine, &config, &mut t);

    t += SAMPLE_DT;
    engine.step(&buttons(button::CLICK_LEFT), &config, t);
    assert!(engine.clicks().left_down());

    // Latch off while the button is still physically held
    t += SAMPLE_DT;
    engine.step(&buttons(button::CLICK_LEFT | button::TOGGLE), &config, t);
    t += SAMPLE_DT;
    let commands = engine.step(&buttons(button::CLICK_LEFT), &config, t);
    assert_eq!(count(&commands, OutputCommand::LeftUp), 1);
    assert!(!engine.clicks().left_down());
    assert!(!engine.clicks().right_down());

    // Still-held button must not re-click while inactive
    t += SAMPLE_DT;
    assert!(engine
        .step(&buttons(button::CLICK_LEFT), &config, t)
        .is_empty());
}

#[test]
fn master_disable_releases_clicks_and_silences_output() {
    let config = test_config();
    let mut engine = Engine::new();
    let mut t = Instant::now();
    activate(&mut engine, &config, &mut t);

    t += SAMPLE_DT;
    let held = GamepadSample {
        left_x: 1.0,
        buttons: button::CLICK_LEFT,
        ..Default::default()
    };
    let commands = engine.step(&held, &config, t);
    assert_eq!(count(&commands, OutputCommand::LeftDown), 1);

    engine.set_master_enabled(false);

    // The disable lands on the next sample: one release, nothing else
    t += SAMPLE_DT;
    let commands = engine.step(&held, &config, t);
    assert_eq!(commands, vec![OutputCommand::LeftUp]);

    for _ in 0..10 {
        t += SAMPLE_DT;
        assert!(engine.step(&held, &config, t).is_empty());
    }

    // Re-enabling reactivates the still-set latch with fresh channels
    engine.set_master_enabled(true);
    t += SAMPLE_DT;
    engine.step(&buttons(0), &config, t);
    assert!(engine.active());
    assert_eq!(engine.pointer().state().last_update, Some(t));
}

#[test]
fn scroll_notch_accumulation_is_conservative() {
    let config = test_config();
    let mut engine = Engine::new();
    let mut t = Instant::now();
    activate(&mut engine, &config, &mut t);

    let sample = GamepadSample {
        right_x: 1.0,
        ..Default::default()
    };
    let dt = SAMPLE_DT.as_secs_f64();

    // Mirror of the channel's own smoothing so the integral is available
    // to compare against: target 16 notches/sec at full deflection.
    let mut filtered = 0.0;
    let mut integral = 0.0;
    let mut emitted = 0i64;

    for _ in 0..240 {
        t += SAMPLE_DT;
        let commands = engine.step(&sample, &config, t);
        for command in &commands {
            match command {
                OutputCommand::HScroll(n) => emitted += (*n as i64) / 120,
                OutputCommand::Scroll(_) => panic!("vertical notch from horizontal drive"),
                _ => panic!("unexpected command {command:?}"),
            }
        }
        filtered += config.scroll_alpha * (16.0 - filtered);
        integral += filtered * dt;

        let accum = engine.scroll().state().accum;
        assert!(accum.0.abs() < 1.0, "accumulator left the unit interval");
        assert!(accum.1.abs() < 1.0);
    }

    let remainder = engine.scroll().state().accum.0;
    assert_close(emitted as f64 + remainder, integral, 1e-6);
}

#[test]
fn hscroll_rate_ramps_toward_a_ceiling() {
    // scroll_speed_h=1.0, scroll_gamma=1.6, scroll_alpha=0.5: the notch
    // rate ramps asymptotically toward 16/sec and never exceeds it.
    let config = test_config();
    let mut engine = Engine::new();
    let mut t = Instant::now();
    activate(&mut engine, &config, &mut t);

    let sample = GamepadSample {
        right_x: 1.0,
        ..Default::default()
    };

    let mut first_half = 0usize;
    let mut second_half = 0usize;
    for i in 0..240 {
        t += SAMPLE_DT;
        let commands = engine.step(&sample, &config, t);
        let notches = commands
            .iter()
            .filter(|c| matches!(c, OutputCommand::HScroll(n) if *n == 120))
            .count();
        assert_eq!(notches, commands.len(), "only positive HScroll expected");
        if i < 120 {
            first_half += notches;
        } else {
            second_half += notches;
        }
    }

    assert!(first_half < second_half);
    let elapsed = 240.0 * SAMPLE_DT.as_secs_f64();
    assert!(((first_half + second_half) as f64) <= 16.0 * elapsed);
}

#[test]
fn stick_up_and_dpad_up_both_scroll_up() {
    let config = test_config();
    let mut engine = Engine::new();
    let mut t = Instant::now();
    activate(&mut engine, &config, &mut t);

    let analog_up = GamepadSample {
        right_y: 1.0,
        ..Default::default()
    };
    let mut analog_notches = 0i32;
    for _ in 0..60 {
        t += SAMPLE_DT;
        for command in engine.step(&analog_up, &config, t) {
            if let OutputCommand::Scroll(n) = command {
                analog_notches += n / 120;
            }
        }
    }
    assert!(analog_notches > 0);

    // Reset via deactivate/reactivate, then drive with the d-pad
    t += SAMPLE_DT;
    engine.step(&buttons(button::TOGGLE), &config, t);
    t += SAMPLE_DT;
    engine.step(&buttons(0), &config, t);
    t += SAMPLE_DT;
    engine.step(&buttons(button::TOGGLE), &config, t);
    t += SAMPLE_DT;
    engine.step(&buttons(0), &config, t);
    assert!(engine.active());

    let mut dpad_notches = 0i32;
    for _ in 0..60 {
        t += SAMPLE_DT;
        for command in engine.step(&buttons(button::DPAD_UP), &config, t) {
            if let OutputCommand::Scroll(n) = command {
                dpad_notches += n / 120;
            }
        }
    }
    assert!(dpad_notches > 0);
}

#[test]
fn invert_flags_flip_notch_direction() {
    let mut config = test_config();
    config.invert_scroll_v = true;
    let mut engine = Engine::new();
    let mut t = Instant::now();
    activate(&mut engine, &config, &mut t);

    let mut notches = 0i32;
    for _ in 0..60 {
        t += SAMPLE_DT;
        for command in engine.step(&buttons(button::DPAD_UP), &config, t) {
            if let OutputCommand::Scroll(n) = command {
                notches += n / 120;
            }
        }
    }
    assert!(notches < 0);
}

#[test]
fn opposed_dpad_directions_cancel() {
    let config = test_config();
    let mut engine = Engine::new();
    let mut t = Instant::now();
    activate(&mut engine, &config, &mut t);

    for _ in 0..60 {
        t += SAMPLE_DT;
        let both = buttons(button::DPAD_UP | button::DPAD_DOWN);
        let commands = engine.step(&both, &config, t);
        assert!(commands.is_empty());
    }
}

#[test]
fn scroll_idle_reset_stops_residual_drift() {
    let config = test_config();
    let mut engine = Engine::new();
    let mut t = Instant::now();
    activate(&mut engine, &config, &mut t);

    for _ in 0..30 {
        t += SAMPLE_DT;
        engine.step(
            &GamepadSample {
                right_x: 1.0,
                ..Default::default()
            },
            &config,
            t,
        );
    }
    assert!(engine.scroll().state().filtered.0 > 0.0);

    // Release everything: state zeroes immediately, nothing drips out
    t += SAMPLE_DT;
    let commands = engine.step(&buttons(0), &config, t);
    assert!(commands.is_empty());
    assert_eq!(engine.scroll().state().filtered, (0.0, 0.0));
    assert_eq!(engine.scroll().state().accum, (0.0, 0.0));
}

#[test]
fn keyboard_fires_on_release_with_refractory() {
    let config = test_config();
    let mut engine = Engine::new();
    let mut t = Instant::now();
    activate(&mut engine, &config, &mut t);

    t += SAMPLE_DT;
    assert!(engine
        .step(&buttons(button::KEYBOARD), &config, t)
        .is_empty());
    t += SAMPLE_DT;
    let commands = engine.step(&buttons(0), &config, t);
    assert_eq!(count(&commands, OutputCommand::ToggleKeyboard), 1);

    // A second release inside the refractory window is swallowed
    t += SAMPLE_DT;
    engine.step(&buttons(button::KEYBOARD), &config, t);
    t += SAMPLE_DT;
    assert!(engine.step(&buttons(0), &config, t).is_empty());

    // After the window passes it fires again
    t += Duration::from_millis(400);
    engine.step(&buttons(button::KEYBOARD), &config, t);
    t += SAMPLE_DT;
    let commands = engine.step(&buttons(0), &config, t);
    assert_eq!(count(&commands, OutputCommand::ToggleKeyboard), 1);
}

#[test]
fn keyboard_gating_follows_config() {
    // Default: the button is dead while mouse mode is off
    let config = test_config();
    let mut engine = Engine::new();
    let mut t = Instant::now();
    t += SAMPLE_DT;
    engine.step(&buttons(button::KEYBOARD), &config, t);
    t += SAMPLE_DT;
    assert!(engine.step(&buttons(0), &config, t).is_empty());

    // Opting in makes it work unconditionally
    let mut config = test_config();
    config.keyboard_while_inactive = true;
    let mut engine = Engine::new();
    t += SAMPLE_DT;
    engine.step(&buttons(button::KEYBOARD), &config, t);
    t += SAMPLE_DT;
    let commands = engine.step(&buttons(0), &config, t);
    assert_eq!(count(&commands, OutputCommand::ToggleKeyboard), 1);
}

#[test]
fn force_release_emits_ups_for_held_buttons() {
    let config = test_config();
    let mut engine = Engine::new();
    let mut t = Instant::now();
    activate(&mut engine, &config, &mut t);

    t += SAMPLE_DT;
    engine.step(
        &buttons(button::CLICK_LEFT | button::CLICK_RIGHT),
        &config,
        t,
    );

    let commands = engine.force_release();
    assert_eq!(count(&commands, OutputCommand::LeftUp), 1);
    assert_eq!(count(&commands, OutputCommand::RightUp), 1);

    // Idempotent: nothing is held anymore
    assert!(engine.force_release().is_empty());
}
