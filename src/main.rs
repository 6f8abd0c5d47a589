//! shortcut-kit - inspect and exercise a keymap from the command line

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use shortcut_kit::config::{self, Config};
use shortcut_kit::error::{ResultExt, ShortcutKitError};
use shortcut_kit::logging::{self, LoggingOptions};
use shortcut_kit::search::{search_actions, ParameterHint};
use shortcut_kit::shortcuts::{
    complete, indicator, normalize_key_event, params_as_f64, ConflictKind, KeyCombination,
    KeyEvent, OverrideDocument, Pattern, SequenceCompletion, SequenceStateMachine, SequenceStep,
    ShortcutRegistry, Token,
};

#[derive(Parser)]
#[command(name = "shortcut-kit")]
#[command(about = "Inspect and exercise a keyboard shortcut keymap")]
struct Cli {
    /// Keymap JSON file: action id -> pattern, list of patterns, or full record
    #[arg(long, short)]
    keymap: PathBuf,

    /// Config file (default: ~/.shortcut-kit/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override file applied on top of the keymap (default: from config)
    #[arg(long)]
    overrides: Option<PathBuf>,

    /// Ignore saved overrides
    #[arg(long)]
    no_overrides: bool,

    /// Also write JSONL logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List duplicate and prefix conflicts
    Conflicts,

    /// Search actions the way the command palette does
    Search {
        /// Query words, e.g. `down 3`
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Show what can follow the given pending keys
    Complete {
        /// Pending keys, e.g. `g` or `o 2 .`; none lists every first step
        keys: Vec<String>,
    },

    /// Feed keys through a sequence state machine
    Replay {
        /// Keys such as `g`, `ctrl+k`, `enter`; `wait:<ms>` advances the clock
        #[arg(required = true)]
        keys: Vec<String>,

        /// Milliseconds between consecutive keys
        #[arg(long, default_value = "10")]
        step_ms: u64,

        /// Run the pending timeout after the last key
        #[arg(long)]
        flush: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init(LoggingOptions {
        json_path: cli.log_file.clone(),
        default_filter: "warn".to_string(),
    });

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let config = config::load_config(&config_path);
    let registry = load_registry(&cli, &config)?;

    match cli.command {
        Commands::Conflicts => print_conflicts(&registry),
        Commands::Search { query } => print_search(&registry, &config, &query.join(" ")),
        Commands::Complete { keys } => print_completions(&registry, &config, &keys)?,
        Commands::Replay {
            keys,
            step_ms,
            flush,
        } => replay(&registry, &config, &keys, step_ms, flush)?,
    }
    Ok(())
}

fn load_registry(cli: &Cli, config: &Config) -> Result<ShortcutRegistry> {
    let mut registry = ShortcutRegistry::from_keymap_file(&cli.keymap, config.keymap_options())
        .map_err(|e| fail(e, "load keymap"))?;
    info!(path = %cli.keymap.display(), actions = registry.len(), "Loaded keymap");

    if cli.no_overrides {
        return Ok(registry);
    }
    match &cli.overrides {
        Some(path) => {
            let document = OverrideDocument::load(path).map_err(|e| fail(e, "load overrides"))?;
            registry
                .apply_overrides(&document)
                .map_err(|e| fail(e, "apply overrides"))?;
        }
        None => {
            // Saved overrides are best effort; a broken file leaves the defaults.
            let saved = OverrideDocument::load(&config.get_overrides_path()).warn_on_err();
            if let Some(document) = saved {
                registry.apply_overrides(&document).warn_on_err();
            }
        }
    }
    Ok(registry)
}

fn fail(err: impl Into<ShortcutKitError>, operation: &str) -> anyhow::Error {
    let err = err.into();
    error!(severity = ?err.severity(), operation, error = %err, "Command failed");
    let message = err.user_message();
    anyhow::Error::new(err).context(message)
}

fn print_conflicts(registry: &ShortcutRegistry) {
    let conflicts = registry.conflicts();
    if conflicts.is_empty() {
        println!("No conflicts");
        return;
    }
    for conflict in conflicts {
        let actions = conflict
            .action_ids
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        match conflict.kind {
            ConflictKind::Duplicate => {
                println!("duplicate  {:<16} {}", conflict.pattern_id, actions)
            }
            ConflictKind::Prefix => println!(
                "prefix     {:<16} {} (extended by {})",
                conflict.pattern_id,
                actions,
                conflict.extended_by.as_deref().unwrap_or("?")
            ),
        }
    }
}

fn print_search(registry: &ShortcutRegistry, config: &Config, query: &str) {
    let keymap = registry.keymap();
    let results = search_actions(query, registry.actions(), &keymap, &config.search);
    if results.is_empty() {
        println!("No matches");
        return;
    }
    for result in results {
        let parameter = match result.parameter {
            ParameterHint::NotRequired => String::new(),
            ParameterHint::Prefilled(value) => format!("  = {}", value.as_f64()),
            ParameterHint::NeedsParameter(kind) => format!("  needs {}", kind.display()),
        };
        println!(
            "{:>5}  {:<28} {:<20} [{}]{}",
            result.score,
            result.label,
            result.action_id,
            result.bound_patterns.join(", "),
            parameter
        );
    }
}

fn print_completions(registry: &ShortcutRegistry, config: &Config, keys: &[String]) -> Result<()> {
    let pending = keys
        .iter()
        .enumerate()
        .map(|(i, key)| parse_key(key, i as u64).map(|(_, combo)| combo))
        .collect::<Result<Vec<_>>>()?;
    let keymap = registry.keymap();

    let completions: Vec<SequenceCompletion> = if pending.is_empty() {
        complete(&pending, &keymap, |_| true)
    } else {
        let shown = indicator(&pending, &keymap, |_| true, config.indicator_limit);
        if shown.is_empty() {
            println!("Nothing continues {}", keys.join(" "));
            return Ok(());
        }
        println!("{}", shown.pending_display);
        if shown.hidden > 0 {
            println!("  (+{} more)", shown.hidden);
        }
        shown.completions
    };

    for completion in completions {
        println!(
            "  {:<12} {:<20} {}",
            completion.next_display,
            completion.pattern_display,
            completion.action_ids.join(", ")
        );
    }
    Ok(())
}

fn replay(
    registry: &ShortcutRegistry,
    config: &Config,
    keys: &[String],
    step_ms: u64,
    flush: bool,
) -> Result<()> {
    let mut machine = SequenceStateMachine::new(registry.shared_keymap(), config.sequence.clone())
        .with_platform(config.display_platform());
    let mut now = 0u64;

    for token in keys {
        if let Some(ms) = token.strip_prefix("wait:") {
            now += ms
                .parse::<u64>()
                .with_context(|| format!("invalid wait '{token}'"))?;
            if let Some(step) = machine.poll_timeout(now) {
                print_step(&format!("@{now}"), &step);
            }
            continue;
        }

        now += step_ms;
        let (event, combo) = parse_key(token, now)?;
        let step = machine.handle_key(&event);
        logging::log_key_event(&combo, step_label(&step));
        print_step(token, &step);
    }

    if flush {
        if let Some((_, deadline)) = machine.armed_timer() {
            if let Some(step) = machine.poll_timeout(deadline) {
                print_step(&format!("@{deadline}"), &step);
            }
        }
    }
    Ok(())
}

/// A single-step pattern string as a key event at `at`.
fn parse_key(token: &str, at: u64) -> Result<(KeyEvent, KeyCombination)> {
    let pattern = Pattern::parse(token).map_err(|e| fail(e, "parse key"))?;
    let [Token::Literal(combo)] = pattern.tokens() else {
        bail!("'{token}' is not a single key");
    };
    let event = KeyEvent::new(combo.key.clone(), at).with_modifiers(combo.modifiers);
    let Some(normalized) = normalize_key_event(&event) else {
        bail!("'{token}' is a modifier, not a key");
    };
    Ok((event, normalized))
}

fn step_label(step: &SequenceStep) -> &'static str {
    match step {
        SequenceStep::Ignored => "ignored",
        SequenceStep::Waiting => "waiting",
        SequenceStep::Progress { .. } => "progress",
        SequenceStep::Committed(_) => "committed",
        SequenceStep::Cancelled(_) => "cancelled",
    }
}

fn print_step(label: &str, step: &SequenceStep) {
    match step {
        SequenceStep::Ignored => println!("{label:<10} ignored"),
        SequenceStep::Waiting => println!("{label:<10} waiting"),
        SequenceStep::Progress { display } => println!("{label:<10} pending {display}"),
        SequenceStep::Committed(commit) => {
            let params = params_as_f64(&commit.params);
            if params.is_empty() {
                println!(
                    "{label:<10} commit {} ({}) via {:?}",
                    commit.action_id, commit.pattern_id, commit.trigger
                );
            } else {
                println!(
                    "{label:<10} commit {} ({}) params {:?} via {:?}",
                    commit.action_id,
                    commit.pattern_id,
                    params.as_slice(),
                    commit.trigger
                );
            }
        }
        SequenceStep::Cancelled(reason) => println!("{label:<10} cancel {reason:?}"),
    }
}
