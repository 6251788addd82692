//! Pomodoro Hotkey Timer - a terminal Pomodoro timer with a global hotkey
//!
//! Cycles through the Pomodoro Technique stages:
//! - 25 minutes of focused work
//! - 5 minutes of short break
//! - 15 minutes of long break after every 4th work stage

use std::io;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use pomodoro_hotkey::cli::{
    spawn_input_reader, Cli, Commands, ConfigAction, Display, RunArgs, SetArgs,
};
use pomodoro_hotkey::config::{load_or_default, load_settings, ConfigStore, JsonConfigStore};
use pomodoro_hotkey::daemon::{
    command_channel, EngineCommand, EngineRunner, StageEngine, TriggerSource,
};
use pomodoro_hotkey::hotkey::HotkeyListener;
use pomodoro_hotkey::sound::try_create_player;
use pomodoro_hotkey::types::Settings;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// Logs go to stderr so the countdown on stdout stays readable.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    let store = match cli.settings {
        Some(path) => JsonConfigStore::new(path),
        None => JsonConfigStore::at_default_path(),
    };

    match cli.command {
        Some(Commands::Run(args)) => run_session(store, args).await,
        None => run_session(store, RunArgs::default()).await,
        Some(Commands::Config { action }) => execute_config(&store, action),
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
            Ok(())
        }
    }
}

// ============================================================================
// Timer Session
// ============================================================================

/// Runs the timer until `q`, Ctrl-C or end of the command channel.
async fn run_session(store: JsonConfigStore, args: RunArgs) -> Result<()> {
    let (settings, origin) = load_settings(&store);
    if !origin.may_overwrite() {
        warn!(
            "Using defaults for this session; {} is left unchanged until a manual save",
            store.path().display()
        );
    }
    let hotkey = settings.hotkey.clone();
    let display = Display::new(&settings);

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = command_channel();

    let mut engine = StageEngine::new(settings, Box::new(store), event_tx)
        .with_save_on_start(origin.may_overwrite());
    if !args.no_sound {
        if let Some(player) = try_create_player() {
            engine = engine.with_sound_player(Box::new(player));
        }
    }

    let listener = if args.no_hotkey {
        None
    } else {
        match HotkeyListener::start(&hotkey, command_tx.clone()) {
            Ok(listener) => Some(listener),
            Err(e) if e.is_invalid_combo() => {
                error!(
                    "{} ({}); change it with `config set --hotkey`",
                    e,
                    e.suggestion()
                );
                None
            }
            Err(e) => {
                error!("{} ({})", e, e.suggestion());
                None
            }
        }
    };

    display.show_welcome(listener.as_ref().map(|_| hotkey.as_str()));
    let display_task = tokio::spawn(display.run(event_rx));

    spawn_input_reader(command_tx.clone()).context("failed to start the stdin reader")?;

    let signal_tx = command_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, shutting down");
            let _ = signal_tx.send(EngineCommand::Shutdown);
        }
    });

    if args.start {
        command_tx
            .send(EngineCommand::Toggle(TriggerSource::Display))
            .context("engine runner is not accepting commands")?;
    }
    drop(command_tx);

    let engine = EngineRunner::new(engine, command_rx).run().await;

    if let Some(listener) = listener {
        if !listener.is_active() {
            debug!("Hotkey listener had already stopped");
        }
        listener.stop();
    }
    info!("Session ended after {} work stage(s)", engine.stage_count());
    // Closing the event channel ends the display task.
    drop(engine);
    display_task.await.context("display task failed")?;

    Ok(())
}

// ============================================================================
// Config Commands
// ============================================================================

fn execute_config(store: &JsonConfigStore, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let settings = load_or_default(store);
            Display::show_settings(&settings, store.path());
        }
        ConfigAction::Set(args) => {
            let settings = update_settings(store, &args)?;
            Display::show_saved(store.path());
            Display::show_settings(&settings, store.path());
        }
        ConfigAction::Reset => {
            store
                .save(&Settings::default())
                .context("failed to write default settings")?;
            Display::show_saved(store.path());
        }
        ConfigAction::Path => {
            println!("{}", store.path().display());
        }
    }
    Ok(())
}

/// Applies `args` to the stored settings and saves them.
///
/// A missing or malformed file starts from defaults; an incomplete one is
/// refused so the user's values are not silently replaced.
fn update_settings(store: &JsonConfigStore, args: &SetArgs) -> Result<Settings> {
    if args.is_empty() {
        anyhow::bail!("nothing to set; see `config set --help`");
    }

    let mut settings = match store.load() {
        Ok(settings) => settings,
        Err(e) if e.is_recoverable_with_defaults() => Settings::default(),
        Err(e) => {
            return Err(e).with_context(|| {
                format!(
                    "{} is incomplete; fix it or run `config reset`",
                    store.path().display()
                )
            })
        }
    };

    args.apply(&mut settings);
    settings.validate().context("invalid settings")?;
    store.save(&settings).context("failed to save settings")?;
    Ok(settings)
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
