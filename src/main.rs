use clap::Parser;

use pyxpic::cli::{self, Args, Command};
use pyxpic::config::Config;

/// Load environment variables from .env file
fn load_env() {
    // Load .env file, don't override existing env vars
    // dotenv::dotenv() returns Err if .env doesn't exist, which is fine
    let _ = dotenv::dotenv();
}

/// Load the config file. An explicit --config path must parse; the default
/// location falls back to built-in settings with a warning.
fn load_config(args: &Args) -> Config {
    let mut cfg = match args.config.as_deref() {
        Some(path) => match Config::load(Some(path)) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => match Config::load(None) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Warning: Failed to load config file: {}", e);
                eprintln!("Using default settings.\n");
                Config::default()
            }
        },
    };

    // Backend: CLI > config
    if let Some(backend) = args.backend {
        cfg.store.backend = backend.into();
    }
    cfg
}

fn main() {
    // Load .env file before anything else
    load_env();

    let args = Args::parse();
    let cfg = load_config(&args);

    let result = match args.command {
        Command::Render {
            image,
            render,
            save,
        } => cli::run_render(cfg, image, &render, save.as_deref()),
        Command::Capture {
            image,
            owner,
            render,
        } => cli::run_capture(cfg, image, &owner, &render),
        Command::Kiosk {
            image,
            owner,
            render,
        } => cli::run_kiosk(cfg, image, owner, &render),
        Command::Get { id, show } => cli::run_get(cfg, &id, show),
        Command::List { owner, show } => cli::run_list(cfg, owner.as_deref(), show),
        Command::Delete { id } => cli::run_delete(cfg, &id),
        Command::Update { id, owner } => cli::run_update(cfg, &id, owner),
        Command::Reassign { from, to } => cli::run_reassign(cfg, &from, &to),
        Command::Config { action } => {
            let path = cli::config_path(args.config.as_deref());
            cli::handle_config_action(action, &cfg, &path)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
