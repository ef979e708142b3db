use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use tracing::info;

use soundpad::actions::LogExecutor;
use soundpad::config::{default_config_path, Config};
use soundpad::engine::Engine;
use soundpad::store::{default_db_path, BindingStore, ButtonId};
use soundpad::{codec, logging, ResultExt};

#[derive(Parser)]
#[command(name = "soundpad", about = "Soundboard hotkey engine")]
struct Cli {
    /// Button database (default: ~/.soundpad/db/soundbuttons.sqlite)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Config file (default: ~/.soundpad/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Arm all bound shortcuts and dispatch fired accelerators (default)
    Run,
    /// Print every button and its binding
    Bindings,
    /// Bind a raw key code to a button
    Bind {
        category: i64,
        index: i64,
        key_code: u32,
    },
    /// Clear a button's shortcut
    Unbind { category: i64, index: i64 },
    /// Obfuscate an audio file for storage
    Encode { input: PathBuf, output: PathBuf },
    /// Recover an obfuscated audio file
    Decode { input: PathBuf, output: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init();

    let db_path = match cli.db {
        Some(path) => path,
        None => default_db_path().context("resolving database path")?,
    };
    let config_path = cli.config.unwrap_or_else(default_config_path);

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(&db_path, config_path),
        Command::Bindings => bindings(&db_path),
        Command::Bind {
            category,
            index,
            key_code,
        } => {
            let store = BindingStore::open(&db_path)?;
            let info = soundpad::keycode::translate(key_code)
                .ok_or(soundpad::SoundpadError::UnrecognizedKey(key_code))?;
            store.bind(ButtonId::new(category, index), &info.canonical, &info.display)?;
            println!(
                "bound {}/{} to {} ({})",
                category, index, info.display, info.canonical
            );
            Ok(())
        }
        Command::Unbind { category, index } => {
            let store = BindingStore::open(&db_path)?;
            match store.unbind(ButtonId::new(category, index))? {
                Some(key) => println!("cleared shortcut {} from {}/{}", key, category, index),
                None => println!("button {}/{} had no shortcut", category, index),
            }
            Ok(())
        }
        Command::Encode { input, output } => {
            codec::encode_file(&input, &output)?;
            println!("encoded {} -> {}", input.display(), output.display());
            Ok(())
        }
        Command::Decode { input, output } => {
            let data = codec::decode_file(&input)?;
            std::fs::write(&output, data)?;
            println!("decoded {} -> {}", input.display(), output.display());
            Ok(())
        }
    }
}

/// Headless listener: arm everything the store says, then block on the OS
/// accelerator event stream.
fn run(db_path: &PathBuf, config_path: PathBuf) -> anyhow::Result<()> {
    let store = BindingStore::open(db_path)?;
    let config = Config::load(&config_path);
    let manager = GlobalHotKeyManager::new().context("creating OS accelerator manager")?;

    let mut engine = Engine::new(store, manager, config, config_path)?;
    // Best effort; the listener is still useful without the reserved button.
    engine.ensure_toggle_button().warn_on_err();
    info!(db = %db_path.display(), enabled = engine.is_enabled(), "soundpad running");

    let receiver = GlobalHotKeyEvent::receiver();
    let mut executor = LogExecutor;
    loop {
        let event = receiver.recv()?;
        if event.state != HotKeyState::Pressed {
            continue;
        }
        engine.handle_fire(event.id, &mut executor).log_err();
    }
}

fn bindings(db_path: &PathBuf) -> anyhow::Result<()> {
    let store = BindingStore::open(db_path)?;
    for record in store.all()? {
        let shortcut = record
            .shortcut_display
            .as_deref()
            .unwrap_or("-")
            .to_string();
        println!(
            "{:>3}/{:<3} {:<24} {:<12} {:<10} {}",
            record.id.category,
            record.id.index,
            record.name,
            shortcut,
            record.action.as_str(),
            record.sound_path.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
