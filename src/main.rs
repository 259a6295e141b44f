//! glyphscramble - terminal demo of the glyph-scramble engine
//!
//! Runs one of the scramble effects over a block of text in the terminal.
//!
//! # Quick Start
//!
//! ```text
//! glyphscramble                        # Spot pulse over the built-in banner
//! glyphscramble -e radial "HELLO"      # Radial spread over custom text
//! glyphscramble -e scan -f notes.txt   # Linear scan over a file
//! ```
//!
//! # Keybindings
//!
//! | Key | Action |
//! |-----|--------|
//! | q / Esc | Quit and restore the text |
//! | r | Reset the effect |
//! | space | Force one tick |
//! | n | Next effect variant |

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use glyphscramble::ui::Renderer;
use glyphscramble::{Config, EffectInstance, Surface, Variant};

/// Text shown when none is given
const DEFAULT_TEXT: &str = "ACCESS GRANTED :: DECRYPTING PAYLOAD :: STAND BY";

/// Input poll timeout
const POLL_TIMEOUT: Duration = Duration::from_millis(10);

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Command line options
#[derive(Default)]
struct Args {
    effect: Option<Variant>,
    text: Option<String>,
    file: Option<PathBuf>,
    seed: Option<u64>,
    config_path: Option<PathBuf>,
}

fn print_version() {
    eprintln!("glyphscramble {}", VERSION);
}

fn print_help() {
    eprintln!("glyphscramble {} - Glyph-scramble text animation", VERSION);
    eprintln!();
    eprintln!("Usage: glyphscramble [OPTIONS] [TEXT]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -e, --effect <NAME>   spot-pulse, global-fuzz, linear-scan, radial-spread");
    eprintln!("  -f, --file <PATH>     Read the text from a file");
    eprintln!("  -s, --seed <N>        Fixed random seed");
    eprintln!("  -c, --config <PATH>   Config file (default: ~/.glyphscramble/config.toml)");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Keys:");
    eprintln!("  q, Esc                Quit and restore the text");
    eprintln!("  r                     Reset the effect");
    eprintln!("  space                 Force one tick");
    eprintln!("  n                     Next effect variant");
    eprintln!();
    eprintln!("Log file: ~/.glyphscramble/glyphscramble.log (level from RUST_LOG)");
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args::default();
    let mut i = 1;

    let value = |i: usize, flag: &str| -> Result<String, String> {
        args.get(i).cloned().ok_or_else(|| format!("Missing argument for {}", flag))
    };

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-e" | "--effect" => {
                i += 1;
                let name = value(i, "--effect")?;
                parsed.effect = Some(name.parse().map_err(|e| format!("{}", e))?);
            }
            "-f" | "--file" => {
                i += 1;
                parsed.file = Some(PathBuf::from(value(i, "--file")?));
            }
            "-s" | "--seed" => {
                i += 1;
                let seed = value(i, "--seed")?;
                parsed.seed = Some(seed.parse().map_err(|_| format!("Invalid seed: {}", seed))?);
            }
            "-c" | "--config" => {
                i += 1;
                parsed.config_path = Some(PathBuf::from(value(i, "--config")?));
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
            text => {
                parsed.text = Some(match parsed.text.take() {
                    Some(prev) => format!("{} {}", prev, text),
                    None => text.to_string(),
                });
            }
        }
        i += 1;
    }

    Ok(parsed)
}

/// Log to ~/.glyphscramble/glyphscramble.log; the terminal belongs to the effect
fn init_logging() {
    let log_path = Config::config_dir()
        .map(|dir| dir.join("glyphscramble.log"))
        .unwrap_or_else(|| PathBuf::from("glyphscramble.log"));

    let log_file = fs::OpenOptions::new().create(true).append(true).open(&log_path).ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    init_logging();
    info!("glyphscramble starting...");

    let config = match &args.config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };

    let variant = match args.effect {
        Some(v) => v,
        None => config.variant().unwrap_or_else(|e| {
            warn!("{}; falling back to {}", e, Variant::SpotPulse);
            Variant::SpotPulse
        }),
    };
    let seed = args.seed.or(config.seed);

    let text = match (&args.file, args.text) {
        (Some(path), _) => fs::read_to_string(path)?,
        (None, Some(text)) => text,
        (None, None) => DEFAULT_TEXT.to_string(),
    };

    info!("Effect: {}, seed: {:?}, {} chars", variant, seed, text.chars().count());

    let mut renderer = Renderer::new();
    renderer.init()?;
    let result = run(&mut renderer, &config, variant, &text, seed);
    let _ = renderer.cleanup();

    match result {
        Ok(restored) => {
            println!("{}", restored);
            info!("glyphscramble exiting");
            Ok(())
        }
        Err(e) => {
            error!("Main loop failed: {}", e);
            Err(e)
        }
    }
}

/// Surface matching the terminal, in estimated pixels
fn surface_for(config: &Config, cols: u16, rows: u16) -> Surface {
    Surface::new(
        cols as u32 * config.grid.char_width_px.max(1),
        rows as u32 * config.grid.min_row_height_px.max(1),
    )
}

fn build_effect(
    config: &Config,
    variant: Variant,
    text: &str,
    seed: Option<u64>,
    surface: Surface,
) -> EffectInstance {
    let effect_config = config.effect_config(variant);
    match seed {
        Some(seed) => EffectInstance::with_seed(text, surface, effect_config, seed),
        None => EffectInstance::new(text, surface, effect_config),
    }
}

/// Main event loop. Returns the text to restore on exit.
fn run(
    renderer: &mut Renderer,
    config: &Config,
    mut variant: Variant,
    text: &str,
    seed: Option<u64>,
) -> anyhow::Result<String> {
    let (mut cols, rows) = Renderer::size()?;
    let mut surface = surface_for(config, cols, rows);
    let mut effect = build_effect(config, variant, text, seed, surface);
    let mut last = Instant::now();

    loop {
        let now = Instant::now();
        let frame = effect.advance(now - last);
        last = now;

        if let Some(frame) = frame {
            let visible_rows = surface.row_capacity(config.grid.min_row_height_px) as u16;
            let status = format!(
                " {} | units {}/{} | tick {} | q quit  r reset  space step  n next ",
                variant,
                effect.live_units(),
                effect.max_units(),
                effect.ticks()
            );
            renderer.render(&frame, &status, cols, visible_rows)?;
        }

        if !event::poll(POLL_TIMEOUT)? {
            continue;
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
                KeyCode::Char('r') => effect.reset(),
                KeyCode::Char(' ') => {
                    if let Some(frame) = effect.update() {
                        let visible_rows = surface.row_capacity(config.grid.min_row_height_px) as u16;
                        let status = format!(" {} | step ", variant);
                        renderer.render(&frame, &status, cols, visible_rows)?;
                    }
                }
                KeyCode::Char('n') => {
                    effect.stop();
                    variant = variant.next();
                    info!("Switching to {}", variant);
                    renderer.clear()?;
                    effect = build_effect(config, variant, text, seed, surface);
                }
                _ => {}
            },
            Event::Resize(new_cols, new_rows) => {
                info!("Terminal resized to {}x{}", new_cols, new_rows);
                effect.stop();
                cols = new_cols;
                surface = surface_for(config, new_cols, new_rows);
                renderer.clear()?;
                effect = build_effect(config, variant, text, seed, surface);
            }
            _ => {}
        }
    }

    let restored = effect.stop().map(|r| r.text).unwrap_or_else(|| text.to_string());
    Ok(restored)
}
