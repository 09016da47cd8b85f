/// Entry point and game loop for the terminal harness.
///
/// Each pass of the loop is one rendered frame:
///   1. Drain keyboard + gamepad
///   2. End-screen keys (restart / exit) or quit
///   3. `frame_tick` with the merged input
///   4. Fixed-rate physics: `physics_tick`, sandbox step, contact dispatch
///   5. Outcomes from the bus, render, sleep

mod ui;

use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use crossterm::event::{
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::{execute, terminal};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use clockrunner::config::GameConfig;
use clockrunner::error::LevelError;
use clockrunner::sim::event::Outcome;
use clockrunner::sim::level::{self, LevelDef};
use clockrunner::sim::ports::{AudioSink, Sinks};
use clockrunner::sim::presentation::SceneRequest;
use clockrunner::sim::sandbox::Sandbox;
use clockrunner::sim::step;
use clockrunner::sim::world::World;
use ui::gamepad::GamepadState;
use ui::hud::{Hud, HudFeed};
use ui::input::{frame_input, InputState, KEYS_QUIT, KEYS_RESTART};
use ui::sound::SoundEngine;

/// Longest frame fed to the simulation; a stall must not teleport anything.
const MAX_FRAME: Duration = Duration::from_millis(100);

fn main() {
    init_tracing();

    let config = match GameConfig::load() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "invalid config");
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };
    let def = match level::load_configured(&config) {
        Ok(d) => d,
        Err(e) => {
            error!(error = %e, "level load failed");
            eprintln!("Level error: {e}");
            std::process::exit(1);
        }
    };

    let feed = HudFeed::new();
    let sound = SoundEngine::new();
    let mut hud = Hud::new(feed.clone());

    if let Err(e) = hud.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }
    let enhanced = terminal::supports_keyboard_enhancement().unwrap_or(false)
        && execute!(
            std::io::stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )
        .is_ok();

    let result = game_loop(&config, &def, &mut hud, &feed, sound.as_ref(), enhanced);

    if enhanced {
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = hud.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        error!(error = %e, "game loop failed");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Clock Runner!");
}

/// Log to `clockrunner.log`; stdout belongs to the renderer.
fn init_tracing() {
    let Ok(file) = File::create("clockrunner.log") else { return };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .compact()
        .init();
}

// ── Session: one run of the level ──

struct Session {
    sandbox: Sandbox,
    world: World,
    outcomes: Receiver<Outcome>,
}

fn start_session(
    config: &GameConfig,
    def: &LevelDef,
    feed: &HudFeed,
    sound: Option<&SoundEngine>,
) -> Result<Session, LevelError> {
    feed.clear();
    let sinks = Sinks {
        animation: Some(Box::new(feed.clone())),
        audio: sound.map(|s| Box::new(s.clone()) as Box<dyn AudioSink>),
        effects: Some(Box::new(feed.clone())),
        timer_display: Some(Box::new(feed.clone())),
    };
    let (sandbox, mut world) = level::build(def, config, sinks)?;
    let (tx, rx) = crossbeam_channel::unbounded();
    world.subscribe(Box::new(tx));
    Ok(Session { sandbox, world, outcomes: rx })
}

fn game_loop(
    config: &GameConfig,
    def: &LevelDef,
    hud: &mut Hud,
    feed: &HudFeed,
    sound: Option<&SoundEngine>,
    enhanced: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = enhanced;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let physics_step = Duration::from_millis(config.tick.physics_step_ms.max(1));
    let frame_sleep = Duration::from_millis(config.tick.frame_sleep_ms);

    let mut session = start_session(config, def, feed, sound)?;
    hud.start_level(&def.name);
    let mut accumulator = Duration::ZERO;
    let mut last = Instant::now();

    loop {
        kb.drain_events();
        gp.update();
        if kb.ctrl_c_pressed() {
            break;
        }

        let request = match session.world.presenter.screen() {
            Some(_) if kb.any_pressed(KEYS_RESTART) || gp.confirm_pressed() => Some(session.world.presenter.restart()),
            Some(_) if kb.any_pressed(KEYS_QUIT) || gp.cancel_pressed() => Some(session.world.presenter.exit()),
            None if kb.any_pressed(KEYS_QUIT) || gp.cancel_pressed() => break,
            _ => None,
        };
        match request {
            Some(SceneRequest::FirstLevel) => {
                info!(scene = SceneRequest::FirstLevel.index(), "restarting level");
                session = start_session(config, def, feed, sound)?;
                hud.start_level(&def.name);
                accumulator = Duration::ZERO;
                last = Instant::now();
                continue;
            }
            Some(SceneRequest::MainMenu) => {
                info!(scene = SceneRequest::MainMenu.index(), "exit to menu");
                break;
            }
            None => {}
        }

        let now = Instant::now();
        let dt = (now - last).min(MAX_FRAME);
        last = now;

        let Session { sandbox, world, outcomes } = &mut session;
        let events = step::frame_tick(world, sandbox, frame_input(&kb, &gp), dt.as_secs_f32());
        hud.note_events(&events);

        accumulator += dt;
        while accumulator >= physics_step {
            step::physics_tick(world, sandbox);
            for contact in sandbox.step(physics_step.as_secs_f32()) {
                let events = step::handle_contact(world, sandbox, contact);
                hud.note_events(&events);
            }
            accumulator -= physics_step;
        }

        for outcome in outcomes.try_iter() {
            hud.note_outcome(outcome);
        }

        feed.tick();
        hud.render(sandbox, world)?;
        std::thread::sleep(frame_sleep);
    }

    Ok(())
}
