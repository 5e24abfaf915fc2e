//! Cable Run entry point
//!
//! Headless runner: builds a round from settings, lets the autopilot steer
//! and prints the result as a text frame (or JSON snapshot).

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use cable_run::sim::autopilot;
use cable_run::{GameEvent, GameLoop, Preset, Settings};

const USAGE: &str = "usage: cable-run [--settings PATH] [--preset calm|standard|storm] \
                     [--seed N] [--max-ticks N] [--json] [--realtime]";

/// Default tick cap so a boxed-in autopilot cannot spin forever
const DEFAULT_MAX_TICKS: u64 = 10_000;

#[derive(Debug, Default)]
struct Args {
    settings: Option<PathBuf>,
    preset: Option<Preset>,
    seed: Option<u64>,
    max_ticks: Option<u64>,
    json: bool,
    realtime: bool,
}

fn parse_args(argv: impl IntoIterator<Item = String>) -> Result<Args, String> {
    let mut args = Args::default();
    let mut iter = argv.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--settings" => {
                let path = iter.next().ok_or("--settings needs a path")?;
                args.settings = Some(PathBuf::from(path));
            }
            "--preset" => {
                let name = iter.next().ok_or("--preset needs a name")?;
                args.preset =
                    Some(Preset::from_str(&name).ok_or(format!("unknown preset '{name}'"))?);
            }
            "--seed" => {
                let value = iter.next().ok_or("--seed needs a number")?;
                args.seed = Some(value.parse().map_err(|_| format!("bad seed '{value}'"))?);
            }
            "--max-ticks" => {
                let value = iter.next().ok_or("--max-ticks needs a number")?;
                args.max_ticks =
                    Some(value.parse().map_err(|_| format!("bad tick count '{value}'"))?);
            }
            "--json" => args.json = true,
            "--realtime" => args.realtime = true,
            "-h" | "--help" => return Err(USAGE.to_string()),
            other => return Err(format!("unknown argument '{other}'\n{USAGE}")),
        }
    }
    Ok(args)
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn run() -> i32 {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}");
            return 2;
        }
    };

    let mut settings = match &args.settings {
        Some(path) => match Settings::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("error: {e}");
                return 2;
            }
        },
        None => Settings::default(),
    };
    if let Some(preset) = args.preset {
        settings.apply_preset(preset);
    }

    let seed = args.seed.unwrap_or_else(clock_seed);
    let mut game = match GameLoop::new(&settings, seed) {
        Ok(game) => game,
        Err(e) => {
            eprintln!("error: {e}");
            return 2;
        }
    };

    let max_ticks = args.max_ticks.unwrap_or(DEFAULT_MAX_TICKS);
    while !game.is_finished() && game.time_ticks() < max_ticks {
        if let Some(dir) = autopilot::suggest(&game) {
            game.steer(dir);
        }

        // Stand-ins for the win/lose audio cues
        match game.tick() {
            Some(GameEvent::Won) => log::info!("success cue"),
            Some(GameEvent::Lost { cause }) => log::info!("fail cue ({})", cause.as_str()),
            None => {}
        }

        if args.realtime {
            print!("\x1b[2J\x1b[H{}", game.snapshot().render_text());
            std::thread::sleep(settings.tick_interval());
        }
    }

    let snapshot = game.snapshot();
    if args.json {
        match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: {e}");
                return 1;
            }
        }
    } else {
        print!("{}", snapshot.render_text());
        match snapshot.loss_cause {
            Some(cause) => println!(
                "seed {seed}: {} after {} ticks, cable {}",
                snapshot.phase.as_str(),
                snapshot.tick,
                cause.as_str()
            ),
            None => println!(
                "seed {seed}: {} after {} ticks",
                snapshot.phase.as_str(),
                snapshot.tick
            ),
        }
    }
    0
}

fn main() {
    env_logger::init();
    log::info!("Cable Run (headless) starting...");
    std::process::exit(run());
}
