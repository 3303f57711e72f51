//! Subcommand handlers.
//!
//! Every handler returns `Err(message)` for the binary to print; nothing
//! here exits the process.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::args::{ConfigAction, RenderFlags};
use crate::allocator::IdAllocator;
use crate::ascii::Renderer;
use crate::camera::{FrameSource, StillImageSource};
use crate::config::{self, Backend, Config, StoreConfig, DEFAULT_CONFIG_TEMPLATE};
use crate::session::{
    ctrlc_flag, setup_ctrlc_handler, BackgroundLineIdentity, CaptureSession, FixedIdentity,
    IdentitySource,
};
use crate::sink::{TerminalSink, TextFileSink};
use crate::store::{
    sort_records, CollectionStore, FileStore, FirestoreStore, MemoryStore, PhotoRecord,
    RecordUpdate, FIRESTORE_TOKEN_ENV,
};
use crate::writer::RecordWriter;

type DynStore = Box<dyn CollectionStore>;

/// Open the backend named by the `[store]` section.
pub fn open_store(config: &StoreConfig) -> Result<DynStore, String> {
    match config.backend {
        Backend::Memory => {
            log::warn!("Using the in-memory store, records are lost on exit");
            Ok(Box::new(MemoryStore::new()))
        }
        Backend::File => {
            let dir = config.file_dir();
            let store = FileStore::new_initialized(dir.clone()).map_err(|e| {
                format!("Failed to open record directory {}: {}", dir.display(), e)
            })?;
            Ok(Box::new(store))
        }
        Backend::Firestore => {
            let project_id = config.project_id.clone().ok_or_else(|| {
                "Firestore backend needs [store] project_id in the config file".to_string()
            })?;
            let token = std::env::var(FIRESTORE_TOKEN_ENV)
                .ok()
                .filter(|t| !t.is_empty());
            if token.is_none() {
                log::warn!(
                    "{} is not set, sending unauthenticated requests",
                    FIRESTORE_TOKEN_ENV
                );
            }
            let store = FirestoreStore::with_base_url(
                config.base_url.clone(),
                project_id,
                config.collection.clone(),
                token,
            )
            .map_err(|e| format!("Failed to create Firestore client: {}", e))?;
            Ok(Box::new(store))
        }
    }
}

fn open_writer(config: &Config) -> Result<RecordWriter<DynStore>, String> {
    let store = open_store(&config.store)?;
    Ok(RecordWriter::with_allocator(
        store,
        IdAllocator::new(config.allocator.max_attempts),
    ))
}

fn runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Runtime::new().map_err(|e| format!("Failed to create async runtime: {}", e))
}

fn input_image(image: Option<PathBuf>, config: &Config) -> Result<PathBuf, String> {
    image.or_else(|| config.capture.input.clone()).ok_or_else(|| {
        "No image given. Pass one as argument or set [capture] input in the config file"
            .to_string()
    })
}

fn capture_source(image: Option<PathBuf>, config: &Config) -> Result<StillImageSource, String> {
    let input = input_image(image, config)?;
    Ok(StillImageSource::new(config.capture.settings_for(input)))
}

fn build_session(config: &Config) -> Result<CaptureSession<DynStore>, String> {
    let renderer = Renderer::new(config.render.options());
    let mut session = CaptureSession::new(renderer, open_writer(config)?)
        .with_sink(Box::new(TerminalSink::stdout()));
    if let Some(dir) = &config.kiosk.save_dir {
        session = session.with_export(Box::new(TextFileSink::new(dir.clone())));
    }
    Ok(session)
}

/// Render an image to stdout without touching the collection.
pub fn run_render(
    mut config: Config,
    image: Option<PathBuf>,
    flags: &RenderFlags,
    save: Option<&Path>,
) -> Result<(), String> {
    flags.apply(&mut config);
    let mut source = capture_source(image, &config)?;
    let frames = source.capture().map_err(|e| e.to_string())?;
    let grid = Renderer::new(config.render.options())
        .render_frames(&frames)
        .map_err(|e| e.to_string())?;

    print!("{}", grid);
    io::stdout().flush().ok();

    if let Some(path) = save {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Error creating {}: {}", parent.display(), e))?;
        }
        std::fs::write(path, grid.to_string())
            .map_err(|e| format!("Error writing {}: {}", path.display(), e))?;
        eprintln!("Saved to {}", path.display());
    }
    Ok(())
}

/// One capture session for `owner`.
pub fn run_capture(
    mut config: Config,
    image: Option<PathBuf>,
    owner: &str,
    flags: &RenderFlags,
) -> Result<(), String> {
    flags.apply(&mut config);
    let source = capture_source(image, &config)?;
    let mut session = build_session(&config)?;

    let rt = runtime()?;
    let outcome = rt
        .block_on(session.run(source, owner))
        .map_err(|e| e.to_string())?;

    println!(
        "Stored {} for {} (#{})",
        outcome.receipt.id, outcome.owner_id, outcome.receipt.order_number
    );
    Ok(())
}

/// Capture sessions until Ctrl+C or the end of the owner list on stdin.
pub fn run_kiosk(
    mut config: Config,
    image: Option<PathBuf>,
    owner: Option<String>,
    flags: &RenderFlags,
) -> Result<(), String> {
    flags.apply(&mut config);
    let input = input_image(image, &config)?;
    let settings = config.capture.settings_for(input);
    let mut session = build_session(&config)?;

    setup_ctrlc_handler().map_err(|e| format!("Failed to set Ctrl+C handler: {}", e))?;

    let mut identity: Box<dyn IdentitySource> = match owner {
        Some(owner) => Box::new(FixedIdentity(owner)),
        None => {
            eprintln!("Reading owner identifiers from stdin, one per line");
            Box::new(BackgroundLineIdentity::spawn(
                io::BufReader::new(io::stdin()),
                ctrlc_flag(),
            ))
        }
    };

    let pause = Duration::from_secs(config.kiosk.pause_secs);
    eprintln!("Kiosk running, press Ctrl+C to stop");

    let rt = runtime()?;
    let stored = rt.block_on(session.run_kiosk(
        || StillImageSource::new(settings.clone()),
        &mut *identity,
        pause,
        ctrlc_flag(),
    ));

    println!("Stored {} capture(s)", stored);
    Ok(())
}

fn print_record(record: &PhotoRecord, show: bool) {
    println!(
        "{}  owner={}  #{}  {}",
        record.id,
        record.owner_id,
        record.order_number,
        record.created_at.to_rfc3339()
    );
    if show {
        print!("{}", record.text());
        println!();
    }
}

pub fn run_get(config: Config, id: &str, show: bool) -> Result<(), String> {
    let writer = open_writer(&config)?;
    let rt = runtime()?;
    let record = rt.block_on(writer.get(id)).map_err(|e| e.to_string())?;
    print_record(&record, show);
    Ok(())
}

/// List the collection in insertion order, optionally with every grid.
pub fn run_list(config: Config, owner: Option<&str>, show: bool) -> Result<(), String> {
    let writer = open_writer(&config)?;
    let rt = runtime()?;
    let mut records = rt
        .block_on(async {
            match owner {
                Some(owner) => writer.fetch_owner(owner).await,
                None => writer.fetch_all().await,
            }
        })
        .map_err(|e| e.to_string())?;
    sort_records(&mut records);

    if records.is_empty() {
        println!("No records found.");
        return Ok(());
    }
    for record in &records {
        print_record(record, show);
    }
    println!("{} record(s)", records.len());
    Ok(())
}

pub fn run_delete(config: Config, id: &str) -> Result<(), String> {
    let writer = open_writer(&config)?;
    let rt = runtime()?;
    rt.block_on(writer.delete(id)).map_err(|e| e.to_string())?;
    println!("Deleted {}", id);
    Ok(())
}

pub fn run_update(config: Config, id: &str, owner: Option<String>) -> Result<(), String> {
    let update = RecordUpdate {
        owner_id: owner,
        raw_image: None,
    };
    if update.is_empty() {
        return Err("Nothing to update. Pass --owner <id>".to_string());
    }

    let writer = open_writer(&config)?;
    let rt = runtime()?;
    rt.block_on(writer.update(id, &update))
        .map_err(|e| e.to_string())?;
    println!("Updated {}", id);
    Ok(())
}

pub fn run_reassign(config: Config, from: &str, to: &str) -> Result<(), String> {
    let writer = open_writer(&config)?;
    let rt = runtime()?;
    let updated = rt
        .block_on(writer.update_owner(from, &RecordUpdate::owner(to)))
        .map_err(|e| e.to_string())?;
    println!("Moved {} record(s) from {} to {}", updated, from, to);
    Ok(())
}

/// Handle config subcommand actions.
pub fn handle_config_action(
    action: ConfigAction,
    config: &Config,
    config_path: &Path,
) -> Result<(), String> {
    match action {
        ConfigAction::Show => {
            let text = config
                .to_toml()
                .map_err(|e| format!("Failed to format configuration: {}", e))?;
            println!("# Current configuration");
            println!("{}", text);
            if config_path.exists() {
                println!("# Config file: {} (exists)", config_path.display());
            } else {
                println!("# Config file: {} (not found)", config_path.display());
            }
            Ok(())
        }
        ConfigAction::Init => {
            if config_path.exists() {
                return Err(format!(
                    "Config file already exists: {}\nUse 'pyxpic config show' to view current settings.",
                    config_path.display()
                ));
            }

            // Create parent directories if needed
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("Error creating config directory: {}", e))?;
            }

            std::fs::write(config_path, DEFAULT_CONFIG_TEMPLATE)
                .map_err(|e| format!("Error writing config file: {}", e))?;

            println!("Created config file: {}", config_path.display());
            Ok(())
        }
    }
}

/// Path of the config file in use.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(config::default_path)
}
