//! Headless driver: load the save, replay a script of inputs, let the
//! timers run for a while, then print where things stand.

use anyhow::{bail, Context, Result};
use clicker_clans::clans::save::Storage;
use clicker_clans::clans::ClansGame;
use clicker_clans::config::Settings;
use clicker_clans::input::InputEvent;
use clicker_clans::time::{ManualClock, SystemClock, WallClock};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Simulated wall time between two scripted inputs.
const STEP_MS: u64 = 100;

#[derive(Debug, Default)]
struct Args {
    seconds: u64,
    script: Vec<String>,
    save_dir: Option<String>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--seconds" => {
                let raw = it.next().context("--seconds needs a value")?;
                args.seconds = raw
                    .parse()
                    .with_context(|| format!("invalid --seconds: {raw}"))?;
            }
            "--script" => {
                let raw = it.next().context("--script needs a value")?;
                args.script
                    .extend(raw.split_whitespace().map(str::to_string));
            }
            "--save-dir" => args.save_dir = it.next(),
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(args)
}

#[cfg(not(target_arch = "wasm32"))]
fn open_storage(settings: &Settings) -> Box<dyn Storage> {
    Box::new(clicker_clans::clans::save::FileStorage::new(
        settings.save_dir.clone(),
    ))
}

#[cfg(target_arch = "wasm32")]
fn open_storage(_settings: &Settings) -> Box<dyn Storage> {
    Box::new(clicker_clans::clans::save::LocalStorage)
}

/// Move the clock forward in `STEP_MS` slices so the scheduler sees every tick.
fn run_for(game: &mut ClansGame, clock: &ManualClock, ms: u64) {
    let mut left = ms;
    while left > 0 {
        let step = left.min(STEP_MS);
        clock.advance(step);
        game.update();
        left -= step;
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = parse_args()?;
    let mut settings = Settings::from_env()?;
    if let Some(dir) = args.save_dir.clone() {
        settings.save_dir = dir.into();
    }
    info!(save_dir = %settings.save_dir.display(), seconds = args.seconds, "starting");

    let clock = ManualClock::new(SystemClock.now_ms());
    let mut game = ClansGame::new(open_storage(&settings), Box::new(clock.clone()), &settings);
    game.update();

    for token in &args.script {
        if let Some(wait) = token.strip_prefix('+') {
            let ms = wait
                .parse()
                .with_context(|| format!("invalid wait token: {token}"))?;
            run_for(&mut game, &clock, ms);
            continue;
        }
        let event = InputEvent::parse(token)
            .with_context(|| format!("invalid input token: {token}"))?;
        let consumed = game.handle_input(&event);
        debug!(?event, consumed, "input");
        run_for(&mut game, &clock, STEP_MS);
    }

    run_for(&mut game, &clock, args.seconds * 1000);
    game.stop();

    let view = game.overview();
    let state = &view.session.game;
    println!(
        "Clicker Clans | mode: {} | coins: {} | level: {} ({} to next) | tap power: {} | session: {}",
        state.mode.key(),
        state.coins,
        view.level,
        view.clicks_to_next_level,
        view.tap_power,
        view.session_time
    );
    println!(
        "Season {} | {} rank #{} (team level {}) | leader: {} {} | progress: {:.0}%{}",
        state.season_number,
        state.selected_team.name(),
        view.selected_team_rank,
        view.selected_team_level,
        view.season_leader.0.name(),
        view.season_leader.1,
        view.season_progress * 100.0,
        if view.season_complete { " | complete" } else { "" }
    );
    for (team, score) in &view.rankings {
        println!("  {:<16} {}", team.name(), score);
    }
    println!(
        "Daily: {} | chests ready: {} | trophies: {}/{}",
        if view.can_claim_daily {
            "ready".to_string()
        } else {
            format!("in {}", view.next_daily_in)
        },
        view.chest_claims_ready,
        view.trophies.iter().filter(|t| t.unlocked).count(),
        view.trophies.len()
    );
    println!("{}", view.session.last_event);
    if !view.session.notice.is_empty() {
        println!("{}", view.session.notice);
    }

    Ok(())
}
