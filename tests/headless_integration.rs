use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use typeflow::clock::{Clock, ManualClock};
use typeflow::runtime::{edit_input, FixedTicker, PracticeEvent, Runner, TestEventSource};
use typeflow::session::{CompletionReason, SessionConfig, SessionPhase, TypingSession};

fn send_keys(tx: &mpsc::Sender<PracticeEvent>, codes: &[KeyCode]) {
    for &code in codes {
        tx.send(PracticeEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
            .unwrap();
    }
}

// Drives a session through Runner/TestEventSource without a TTY; every event
// advances the manual clock by 100ms.
fn drive(
    runner: &Runner<TestEventSource, FixedTicker>,
    session: &mut TypingSession,
    input: &mut String,
    clock: &ManualClock,
    max_steps: u32,
) {
    for _ in 0..max_steps {
        clock.advance(Duration::from_millis(100));
        match runner.step() {
            PracticeEvent::Tick => {
                session.on_tick(clock.now_ms());
            }
            PracticeEvent::Resize => {}
            PracticeEvent::Key(key) => {
                if edit_input(input, &key) {
                    session.on_input_change(input, clock.now_ms());
                }
            }
        }
        if session.phase() == SessionPhase::Completed {
            break;
        }
    }
}

#[test]
fn headless_typing_flow_completes() {
    let clock = ManualClock::new(0);
    let mut session = TypingSession::new("hi", SessionConfig::default());
    let mut input = String::new();

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(50)),
    );

    send_keys(&tx, &[KeyCode::Char('h'), KeyCode::Char('i')]);
    drive(&runner, &mut session, &mut input, &clock, 100);

    assert_eq!(session.phase(), SessionPhase::Completed);
    assert_eq!(session.completion(), Some(CompletionReason::Matched));
    assert_eq!(session.started_at(), Some(100));
    assert_eq!(session.completed_at(), Some(200));
    assert_eq!(session.metrics().accuracy, 100);
}

#[test]
fn headless_correction_with_backspace() {
    let clock = ManualClock::new(0);
    let mut session = TypingSession::new("ab", SessionConfig::default());
    let mut input = String::new();

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(50)),
    );

    send_keys(
        &tx,
        &[
            KeyCode::Char('a'),
            KeyCode::Char('x'),
            KeyCode::Backspace,
            KeyCode::Char('b'),
        ],
    );
    drive(&runner, &mut session, &mut input, &clock, 100);

    assert_eq!(session.phase(), SessionPhase::Completed);
    assert_eq!(session.input(), "ab");
    assert_eq!(session.metrics().accuracy, 100);
}

#[test]
fn headless_multiline_code_with_enter_and_tab() {
    let clock = ManualClock::new(0);
    let mut session = TypingSession::new("fn x() {\r\n    y\r\n}", SessionConfig::default());
    let mut input = String::new();

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(50)),
    );

    let mut codes: Vec<KeyCode> = "fn x() {".chars().map(KeyCode::Char).collect();
    codes.extend([KeyCode::Enter, KeyCode::Tab, KeyCode::Char('y'), KeyCode::Enter]);
    codes.push(KeyCode::Char('}'));
    send_keys(&tx, &codes);
    drive(&runner, &mut session, &mut input, &clock, 100);

    assert_eq!(session.phase(), SessionPhase::Completed);
    assert_eq!(session.target(), "fn x() {\n    y\n}");
    assert_eq!(session.metrics().accuracy, 100);
}

#[test]
fn headless_timed_session_expires_on_ticks() {
    let clock = ManualClock::new(0);
    let config = SessionConfig {
        time_limit: Some(Duration::from_secs(1)),
        ..SessionConfig::default()
    };
    let mut session = TypingSession::new("a much longer text", config);
    let mut input = String::new();

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(20)),
    );

    send_keys(&tx, &[KeyCode::Char('a'), KeyCode::Char(' ')]);
    drive(&runner, &mut session, &mut input, &clock, 100);

    assert_eq!(session.phase(), SessionPhase::Completed);
    assert_eq!(session.completion(), Some(CompletionReason::TimeExpired));
    // started at 100ms, first tick at or past 1100ms ends it
    assert_eq!(session.completed_at(), Some(1_100));
    assert_eq!(session.elapsed_ms(60_000), 1_000);
}

#[test]
fn headless_ticks_without_input_never_start() {
    let clock = ManualClock::new(0);
    let mut session = TypingSession::new("abc", SessionConfig::default());
    let mut input = String::new();

    let (_tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );

    drive(&runner, &mut session, &mut input, &clock, 20);

    assert_eq!(session.phase(), SessionPhase::NotStarted);
    assert_eq!(session.metrics().wpm, 0);
}

#[test]
fn headless_fast_typing_still_hits_time_limit() {
    let clock = ManualClock::new(0);
    let config = SessionConfig {
        time_limit: Some(Duration::from_secs(1)),
        ..SessionConfig::default()
    };
    let mut session = TypingSession::new("x".repeat(60), config);
    let mut input = String::new();

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(TestEventSource::new(rx), FixedTicker::default());

    // keys queued up front arrive faster than the tick interval
    send_keys(&tx, &[KeyCode::Char('x'); 40]);

    let mut ticks = 0;
    for _ in 0..40 {
        clock.advance(Duration::from_millis(90));
        match runner.step() {
            PracticeEvent::Tick => {
                ticks += 1;
                session.on_tick(clock.now_ms());
            }
            PracticeEvent::Resize => {}
            PracticeEvent::Key(key) => {
                if edit_input(&mut input, &key) {
                    session.on_input_change(&input, clock.now_ms());
                }
            }
        }
        if session.phase() == SessionPhase::Completed {
            break;
        }
    }

    assert_eq!(session.phase(), SessionPhase::Completed, "ticks seen: {ticks}");
    assert_eq!(session.completion(), Some(CompletionReason::TimeExpired));
    assert!(session.chars_typed() < 40);
    assert!(session.elapsed_ms(clock.now_ms()) < 1_100);
}
