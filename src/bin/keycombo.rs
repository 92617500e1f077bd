// Keycombo CLI
// Inspect the keymap file and try combos without a streaming session

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use keycombo_core::{
    native_to_scancode, parse_chord_string, BindingSide, ComboBridge, ComboEngine, ComboStore,
    Disposition, EngineSettings, KeyEvent, KeySpec, LoadReport, NativeKeymap, Settings,
    StoreError, ToolkitModifiers,
};

/// Companion tool for user key combos
#[derive(Parser, Debug)]
#[command(name = "keycombo")]
#[command(version)]
#[command(about = "Inspect and try user key combos", long_about = None)]
struct Args {
    /// Keymap file to use instead of the configured one
    #[arg(long, global = true, value_name = "PATH")]
    keymap: Option<PathBuf>,

    /// Settings file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the keymap file location
    Path,

    /// List the configured combos
    List {
        /// Print the editor records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load the keymap file and report problems
    Check,

    /// Print the token string for a native key press
    Capture {
        /// Native scancode as reported by the windowing layer
        native: u32,

        /// Held modifiers: shift, control, alt, meta
        #[arg(long, value_delimiter = ',')]
        mods: Vec<String>,

        /// Native numbering; defaults to the configured one
        #[arg(long = "keymap-flavour", value_name = "evdev|xkb|win32")]
        keymap_flavour: Option<NativeKeymap>,
    },

    /// Feed a chord through the engine and print what it emits
    Simulate {
        /// Chord such as KMOD_LCTRL+KMOD_LALT+SDL_SCANCODE_F1
        chord: String,
    },
}

/// Everything the subcommands share
struct Application {
    settings: Settings,
    bridge: ComboBridge,
}

impl Application {
    fn new(args: &Args) -> Result<Self> {
        let settings = match &args.settings {
            Some(path) => Settings::from_file(path)
                .with_context(|| format!("failed to read settings {}", path.display()))?,
            None => Settings::load_default().context("failed to read settings")?,
        };

        let keymap = args
            .keymap
            .clone()
            .or_else(|| settings.keymap_path().map(PathBuf::from));
        let store = match keymap {
            Some(path) => ComboStore::with_path(path),
            None => ComboStore::new(),
        };
        let bridge = ComboBridge::new(store.into_shared(), settings.native_keymap());

        Ok(Self { settings, bridge })
    }

    /// Read the keymap file, seeding the template on first use
    fn load(&self) -> std::result::Result<LoadReport, StoreError> {
        self.bridge.reload_combos()
    }

    fn path(&self) -> Result<()> {
        println!("{}", self.resolve_keymap_path()?.display());
        Ok(())
    }

    /// Keymap location, reported even when the file itself is broken
    fn resolve_keymap_path(&self) -> Result<PathBuf> {
        // Resolution happens on the first load
        if let Err(e) = self.load() {
            eprintln!("warning: {}", e);
        }
        match self.bridge.keymap_path() {
            Some(path) => Ok(path),
            None => bail!("keymap path could not be resolved"),
        }
    }

    fn list(&self, json: bool) -> Result<()> {
        self.load().context("failed to load keymap")?;
        let records = self.bridge.load_combos();

        if json {
            println!("{}", serde_json::to_string_pretty(&records)?);
            return Ok(());
        }

        if records.is_empty() {
            println!("No combos configured");
            return Ok(());
        }
        for (index, record) in records.iter().enumerate() {
            let input = KeySpec::from(record.input.clone());
            let outputs: Vec<String> = record
                .outputs
                .iter()
                .map(|out| KeySpec::from(out.clone()).to_string())
                .collect();
            let target = if outputs.is_empty() {
                "(blocked)".to_string()
            } else {
                outputs.join(", ")
            };
            if record.description.is_empty() {
                println!("  {}: {} -> {}", index, input, target);
            } else {
                println!("  {}: {} -> {}  # {}", index, input, target, record.description);
            }
        }
        Ok(())
    }

    fn check(&self) -> Result<()> {
        let report = self.load().context("keymap is invalid")?;
        if report.is_clean() {
            println!("Keymap is valid: {} combo(s)", report.loaded);
        } else {
            println!(
                "Keymap loaded with problems: {} combo(s), {} skipped",
                report.loaded, report.skipped
            );
        }
        Ok(())
    }

    fn capture(&self, native: u32, mods: &[String], flavour: Option<NativeKeymap>) -> Result<()> {
        let toolkit = parse_toolkit_modifiers(mods)?;
        let keymap = flavour.unwrap_or_else(|| self.settings.native_keymap());
        let bridge = ComboBridge::new(self.bridge.store().clone(), keymap);

        if native_to_scancode(native, keymap).is_unknown() {
            bail!("native scancode {} is not a known {} key", native, keymap);
        }
        println!("{}", bridge.key_event_to_tokens(native, toolkit.bits()));
        Ok(())
    }

    fn simulate(&self, chord: &str) -> Result<()> {
        self.load().context("failed to load keymap")?;
        let spec = parse_chord_string(chord)?;
        // Physical events carry sided bits; unqualified tokens press the left key
        let binding = spec.to_binding(BindingSide::Output);

        let mut settings = self.settings.clone();
        settings.set_combos_enabled(true);
        let engine = ComboEngine::new(
            self.bridge.store().clone(),
            EngineSettings {
                absolute_mouse_mode: true,
                ..settings.engine_settings()
            },
        );

        let press = KeyEvent::press(binding.scancode, binding.modifiers);
        let release = KeyEvent::release(binding.scancode, binding.modifiers);
        for event in [press, release] {
            let mut emitted = Vec::new();
            let disposition = engine.handle_key_event(&event, &mut emitted);
            println!("{} -> {}", event, describe(disposition));
            for out in &emitted {
                println!("    {}", out);
            }
        }
        Ok(())
    }
}

fn describe(disposition: Disposition) -> String {
    match disposition {
        Disposition::Forward => "forwarded".to_string(),
        Disposition::Swallow => "swallowed".to_string(),
        Disposition::Replaced { emitted } => format!("replaced by {} event(s)", emitted),
    }
}

fn parse_toolkit_modifiers(names: &[String]) -> Result<ToolkitModifiers> {
    let mut flags = ToolkitModifiers::empty();
    for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        let upper = name.to_ascii_uppercase();
        let flag = match upper.as_str() {
            "CTRL" => Some(ToolkitModifiers::CONTROL),
            "GUI" | "SUPER" | "WIN" => Some(ToolkitModifiers::META),
            other => ToolkitModifiers::from_name(other),
        };
        match flag {
            Some(flag) => flags |= flag,
            None => bail!("unknown modifier '{}'", name),
        }
    }
    Ok(flags)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let app = Application::new(&args)?;
    match &args.command {
        Command::Path => app.path(),
        Command::List { json } => app.list(*json),
        Command::Check => app.check(),
        Command::Capture {
            native,
            mods,
            keymap_flavour,
        } => app.capture(*native, mods, *keymap_flavour),
        Command::Simulate { chord } => app.simulate(chord),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["keycombo", "--keymap", "/tmp/keymap.xml", "list", "--json"]);

        assert_eq!(args.keymap, Some(PathBuf::from("/tmp/keymap.xml")));
        assert!(args.settings.is_none());
        assert!(!args.verbose);
        assert!(matches!(args.command, Command::List { json: true }));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::parse_from(["keycombo", "check", "-v", "--settings", "/tmp/settings.toml"]);

        assert!(args.verbose);
        assert_eq!(args.settings, Some(PathBuf::from("/tmp/settings.toml")));
        assert!(matches!(args.command, Command::Check));
    }

    #[test]
    fn test_args_capture() {
        let args = Args::parse_from([
            "keycombo",
            "capture",
            "67",
            "--mods",
            "control,alt",
            "--keymap-flavour",
            "xkb",
        ]);

        match args.command {
            Command::Capture {
                native,
                mods,
                keymap_flavour,
            } => {
                assert_eq!(native, 67);
                assert_eq!(mods, vec!["control", "alt"]);
                assert_eq!(keymap_flavour, Some(NativeKeymap::Xkb));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_args_simulate() {
        let args = Args::parse_from(["keycombo", "simulate", "KMOD_CTRL+SDL_SCANCODE_F1"]);
        assert!(matches!(args.command, Command::Simulate { ref chord } if chord == "KMOD_CTRL+SDL_SCANCODE_F1"));
    }

    #[test]
    fn test_path_reported_for_broken_keymap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keymap.xml");
        std::fs::write(&path, "").unwrap();

        let app = Application {
            settings: Settings::new(),
            bridge: ComboBridge::new(ComboStore::with_path(&path).into_shared(), NativeKeymap::Xkb),
        };
        assert!(app.load().is_err());
        assert_eq!(app.resolve_keymap_path().unwrap(), path);
    }

    #[test]
    fn test_parse_toolkit_modifiers() {
        let flags = parse_toolkit_modifiers(&["ctrl".to_string(), "Shift".to_string()]).unwrap();
        assert_eq!(flags, ToolkitModifiers::CONTROL | ToolkitModifiers::SHIFT);
        assert_eq!(
            parse_toolkit_modifiers(&["meta".to_string()]).unwrap(),
            ToolkitModifiers::META
        );
        assert!(parse_toolkit_modifiers(&["hyper".to_string()]).is_err());
        assert!(parse_toolkit_modifiers(&[]).unwrap().is_empty());
    }
}
