//! Concurrency tests for the single-writer engine runner.
//!
//! Toggles arrive from several threads (display, hotkey) while ticks come
//! from the runner's own scheduler; every mutation still happens on the
//! runner task, in posting order.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::unbounded;
use rdev::Key;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use pomodoro_hotkey::config::MockConfigStore;
use pomodoro_hotkey::daemon::{
    command_channel, CommandSender, EngineCommand, EngineEvent, EngineRunner, StageEngine,
    TriggerSource,
};
use pomodoro_hotkey::hotkey::{HookMessage, HotkeyListener, KeyEvent};
use pomodoro_hotkey::types::{Settings, Stage};

// ============================================================================
// Test Helpers
// ============================================================================

fn create_runner() -> (
    EngineRunner,
    CommandSender,
    mpsc::UnboundedReceiver<EngineEvent>,
) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = command_channel();
    let engine = StageEngine::new(
        Settings::default(),
        Box::new(Arc::new(MockConfigStore::new())),
        event_tx,
    );
    (EngineRunner::new(engine, command_rx), command_tx, event_rx)
}

fn run_state_changes(events: &mut mpsc::UnboundedReceiver<EngineEvent>) -> Vec<bool> {
    std::iter::from_fn(|| events.try_recv().ok())
        .filter_map(|e| match e {
            EngineEvent::RunStateChanged { running, .. } => Some(running),
            _ => None,
        })
        .collect()
}

/// Waits for the next start/pause notification, skipping countdown events.
async fn next_run_state(events: &mut mpsc::UnboundedReceiver<EngineEvent>) -> Option<bool> {
    loop {
        match timeout(Duration::from_secs(2), events.recv()).await.ok()?? {
            EngineEvent::RunStateChanged { running, .. } => return Some(running),
            _ => continue,
        }
    }
}

fn combo_press() -> Vec<HookMessage> {
    [
        KeyEvent::Press(Key::ControlLeft),
        KeyEvent::Press(Key::ShiftLeft),
        KeyEvent::Press(Key::KeyP),
        KeyEvent::Release(Key::KeyP),
        KeyEvent::Release(Key::ShiftLeft),
        KeyEvent::Release(Key::ControlLeft),
    ]
    .into_iter()
    .map(HookMessage::Key)
    .collect()
}

// ============================================================================
// Interleaved Toggles
// ============================================================================

#[tokio::test]
async fn test_toggles_from_two_threads_are_not_lost() {
    let (runner, command_tx, mut events) = create_runner();
    let handle = tokio::spawn(runner.run());

    let senders: Vec<_> = [TriggerSource::Display, TriggerSource::Hotkey]
        .into_iter()
        .map(|source| {
            let tx = command_tx.clone();
            thread::spawn(move || {
                for _ in 0..500 {
                    tx.send(EngineCommand::Toggle(source)).unwrap();
                }
            })
        })
        .collect();

    tokio::task::spawn_blocking(move || {
        for sender in senders {
            sender.join().unwrap();
        }
    })
    .await
    .unwrap();
    command_tx.send(EngineCommand::Shutdown).unwrap();

    let engine = handle.await.unwrap();

    // Initial state is paused; an even number of flips leaves it paused.
    assert!(!engine.is_running());
    let changes = run_state_changes(&mut events);
    assert_eq!(changes.len(), 1000);
    assert!(changes
        .iter()
        .enumerate()
        .all(|(i, running)| *running == (i % 2 == 0)));
}

#[tokio::test]
async fn test_odd_number_of_toggles_leaves_running() {
    let (runner, command_tx, _events) = create_runner();
    let handle = tokio::spawn(runner.run());

    let workers: Vec<_> = [250, 251]
        .into_iter()
        .map(|count| {
            let tx = command_tx.clone();
            thread::spawn(move || {
                for _ in 0..count {
                    tx.send(EngineCommand::Toggle(TriggerSource::Display))
                        .unwrap();
                }
            })
        })
        .collect();

    tokio::task::spawn_blocking(move || {
        for worker in workers {
            worker.join().unwrap();
        }
    })
    .await
    .unwrap();
    command_tx.send(EngineCommand::Shutdown).unwrap();

    let engine = handle.await.unwrap();
    assert!(engine.is_running());
}

// ============================================================================
// Triggers Between Ticks
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_trigger_takes_effect_between_ticks() {
    let (runner, command_tx, mut events) = create_runner();
    let handle = tokio::spawn(runner.run());

    command_tx
        .send(EngineCommand::Toggle(TriggerSource::Display))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    command_tx
        .send(EngineCommand::Toggle(TriggerSource::Hotkey))
        .unwrap();
    tokio::time::sleep(Duration::from_secs(30)).await;
    command_tx
        .send(EngineCommand::Toggle(TriggerSource::Hotkey))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    command_tx.send(EngineCommand::Shutdown).unwrap();

    let engine = handle.await.unwrap();

    // Two ticks before the pause, one after the restart.
    assert_eq!(engine.seconds_remaining(), Some(1500 - 3));

    let texts: Vec<String> = std::iter::from_fn(|| events.try_recv().ok())
        .filter_map(|e| match e {
            EngineEvent::TimeUpdated { text } => Some(text),
            _ => None,
        })
        .collect();
    assert_eq!(texts, vec!["24:59", "24:58", "24:57"]);
}

// ============================================================================
// Hotkey Listener to Engine
// ============================================================================

#[tokio::test]
async fn test_hotkey_activation_reaches_engine() {
    let (runner, command_tx, mut events) = create_runner();
    let handle = tokio::spawn(runner.run());

    let (raw_tx, raw_rx) = unbounded();
    let listener = HotkeyListener::spawn_with_source(
        "ctrl+shift+p".parse().unwrap(),
        raw_rx,
        command_tx.clone(),
    )
    .unwrap();

    for message in combo_press() {
        raw_tx.send(message).unwrap();
    }
    assert_eq!(next_run_state(&mut events).await, Some(true));

    for message in combo_press() {
        raw_tx.send(message).unwrap();
    }
    assert_eq!(next_run_state(&mut events).await, Some(false));

    tokio::task::spawn_blocking(move || listener.stop())
        .await
        .unwrap();
    command_tx.send(EngineCommand::Shutdown).unwrap();

    let engine = handle.await.unwrap();
    assert!(!engine.is_running());
    assert_eq!(engine.current_stage(), Stage::Work);
}

#[tokio::test]
async fn test_stopped_listener_posts_nothing() {
    let (runner, command_tx, mut events) = create_runner();
    let handle = tokio::spawn(runner.run());

    let (raw_tx, raw_rx) = unbounded();
    let listener = HotkeyListener::spawn_with_source(
        "ctrl+shift+p".parse().unwrap(),
        raw_rx,
        command_tx.clone(),
    )
    .unwrap();
    tokio::task::spawn_blocking(move || listener.stop())
        .await
        .unwrap();

    for message in combo_press() {
        let _ = raw_tx.send(message);
    }
    tokio::time::sleep(Duration::from_millis(200)).await;
    command_tx.send(EngineCommand::Shutdown).unwrap();

    let engine = handle.await.unwrap();
    assert!(!engine.is_running());
    assert!(run_state_changes(&mut events).is_empty());
}
