//! Global hotkey listener.
//!
//! Two threads cooperate:
//!
//! - `hotkey-hook` runs the blocking OS keyboard hook (`rdev::listen`) and
//!   forwards raw key transitions over a crossbeam channel.
//! - `hotkey-listener` owns the [`ComboMatcher`] and posts a toggle command
//!   to the engine each time the combo fires.
//!
//! Neither thread touches engine state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use rdev::{Event, EventType};
use tracing::{debug, error, info, warn};

use super::combo::{ComboMatcher, HotkeyCombo, KeyEvent};
use super::error::HotkeyError;
use crate::daemon::{CommandSender, EngineCommand, TriggerSource};

/// How often the wait loop checks for a stop request.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Messages from the OS hook thread.
#[derive(Debug, Clone, PartialEq)]
pub enum HookMessage {
    Key(KeyEvent),
    /// The hook could not be installed.
    Failed(String),
}

/// Handle to a running hotkey listener.
#[derive(Debug)]
pub struct HotkeyListener {
    combo: HotkeyCombo,
    stop: Arc<AtomicBool>,
    hook_active: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl HotkeyListener {
    /// Parses `combo`, installs the global keyboard hook and starts waiting.
    ///
    /// A hook that the OS refuses is reported asynchronously: the error is
    /// logged once and the listener stops itself.
    ///
    /// # Errors
    ///
    /// Returns an error if `combo` cannot be parsed or a thread cannot be
    /// spawned.
    pub fn start(combo: &str, commands: CommandSender) -> Result<Self, HotkeyError> {
        let combo: HotkeyCombo = combo.parse()?;
        let (raw_tx, raw_rx) = unbounded();
        let hook_active = Arc::new(AtomicBool::new(true));

        spawn_hook(raw_tx, Arc::clone(&hook_active))?;
        let listener = Self::spawn(combo, raw_rx, commands, hook_active)?;
        info!("Global hotkey {} registered", listener.combo);
        Ok(listener)
    }

    /// Starts the wait loop on an arbitrary source of key transitions.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener thread cannot be spawned.
    pub fn spawn_with_source(
        combo: HotkeyCombo,
        events: Receiver<HookMessage>,
        commands: CommandSender,
    ) -> Result<Self, HotkeyError> {
        Self::spawn(combo, events, commands, Arc::new(AtomicBool::new(true)))
    }

    fn spawn(
        combo: HotkeyCombo,
        events: Receiver<HookMessage>,
        commands: CommandSender,
        hook_active: Arc<AtomicBool>,
    ) -> Result<Self, HotkeyError> {
        let stop = Arc::new(AtomicBool::new(false));
        let matcher = ComboMatcher::new(combo.clone());
        let loop_stop = Arc::clone(&stop);
        let loop_hook_active = Arc::clone(&hook_active);

        let handle = thread::Builder::new()
            .name("hotkey-listener".to_string())
            .spawn(move || {
                wait_loop(matcher, &events, &commands, &loop_stop);
                loop_hook_active.store(false, Ordering::SeqCst);
            })
            .map_err(|e| HotkeyError::Spawn(e.to_string()))?;

        Ok(Self {
            combo,
            stop,
            hook_active,
            handle: Some(handle),
        })
    }

    pub fn combo(&self) -> &HotkeyCombo {
        &self.combo
    }

    /// Returns true while the wait loop is alive.
    pub fn is_active(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops the listener and waits for the wait loop to exit.
    ///
    /// Returns within one poll interval. No command is posted after this
    /// returns.
    pub fn stop(mut self) {
        self.signal_stop();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Hotkey listener thread panicked");
            }
        }
        info!("Global hotkey {} unregistered", self.combo);
    }

    fn signal_stop(&self) {
        self.hook_active.store(false, Ordering::SeqCst);
        self.stop.store(true, Ordering::SeqCst);
    }
}

impl Drop for HotkeyListener {
    fn drop(&mut self) {
        self.signal_stop();
    }
}

/// Installs the OS hook on its own thread.
///
/// `rdev::listen` never returns on success, so the thread lives until the
/// process exits; clearing `active` makes it stop forwarding.
fn spawn_hook(raw_tx: Sender<HookMessage>, active: Arc<AtomicBool>) -> Result<(), HotkeyError> {
    thread::Builder::new()
        .name("hotkey-hook".to_string())
        .spawn(move || {
            let forward_tx = raw_tx.clone();
            let callback = move |event: Event| {
                if !active.load(Ordering::Relaxed) {
                    return;
                }
                let message = match event.event_type {
                    EventType::KeyPress(key) => HookMessage::Key(KeyEvent::Press(key)),
                    EventType::KeyRelease(key) => HookMessage::Key(KeyEvent::Release(key)),
                    _ => return,
                };
                let _ = forward_tx.send(message);
            };

            if let Err(e) = rdev::listen(callback) {
                let _ = raw_tx.send(HookMessage::Failed(format!("{:?}", e)));
            }
        })
        .map(|_| ())
        .map_err(|e| HotkeyError::Spawn(e.to_string()))
}

fn wait_loop(
    mut matcher: ComboMatcher,
    events: &Receiver<HookMessage>,
    commands: &CommandSender,
    stop: &AtomicBool,
) {
    while !stop.load(Ordering::SeqCst) {
        match events.recv_timeout(POLL_INTERVAL) {
            Ok(HookMessage::Key(event)) => {
                if !matcher.feed(event) || stop.load(Ordering::SeqCst) {
                    continue;
                }
                debug!("Hotkey {} pressed", matcher.combo());
                if commands
                    .send(EngineCommand::Toggle(TriggerSource::Hotkey))
                    .is_err()
                {
                    debug!("Engine gone, hotkey listener exiting");
                    break;
                }
            }
            Ok(HookMessage::Failed(reason)) => {
                let err = HotkeyError::Registration(reason);
                error!("{} ({})", err, err.suggestion());
                break;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                debug!("Hotkey source closed");
                break;
            }
        }
    }
}
