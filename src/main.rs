use clap::Parser;
use log::{error, info};
use macroquad::prelude::*;
use tank_arena::audio::AudioManager;
use tank_arena::config::{self, ArenaConfig, WINDOW_HEIGHT, WINDOW_WIDTH};
use tank_arena::game::GameStateMachine;
use tank_arena::logging;
use tank_arena::render::Renderer;

// --- Command Line Arguments ---
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of enemy tanks.
    #[arg(long, default_value_t = config::ENEMY_COUNT)]
    enemies: usize,

    /// Number of obstacles scattered over the arena.
    #[arg(long, default_value_t = config::OBSTACLE_COUNT)]
    obstacles: usize,

    /// Side length of the square arena.
    #[arg(long, default_value_t = config::WORLD_SIZE)]
    world_size: f32,

    /// Seed for arena layout and AI patrols. Random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Debug filter to specify log topics (e.g., "ai,combat")
    /// Available topics: physics, ai, combat, tank, state
    #[arg(long)]
    debug_filter: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn arena_config(&self) -> ArenaConfig {
        ArenaConfig {
            world_size: self.world_size,
            enemy_count: self.enemies,
            obstacle_count: self.obstacles,
            seed: self.seed,
            ..ArenaConfig::default()
        }
    }
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Tank Arena".to_owned(),
        window_width: WINDOW_WIDTH,
        window_height: WINDOW_HEIGHT,
        window_resizable: false,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let args = Args::parse();

    // RUST_LOG takes over from the topic logger when set
    if std::env::var_os("RUST_LOG").is_some() {
        if let Err(e) = env_logger::try_init() {
            eprintln!("Warning: Failed to initialize logger: {}", e);
        }
    } else if let Err(e) =
        logging::init_logger(logging::parse_level(&args.log_level), args.debug_filter.clone())
    {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }

    info!("Initializing Tank Arena...");
    let config = args.arena_config();
    if let Err(e) = tank_arena::arena::validate(&config) {
        error!("Invalid arena configuration: {}", e);
        std::process::exit(2);
    }

    let mut renderer = Renderer::new();
    renderer.load_title_font().await;
    renderer.load_ui_font().await;

    let mut audio = AudioManager::new();
    audio.load_assets().await;
    info!("Assets loaded.");

    let mut game = GameStateMachine::new(config);
    game.run(&renderer, &audio).await;
}
