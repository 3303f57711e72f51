//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::enums::{BackendChoice, CharacterSet, ColorChoice};
use crate::camera::{is_valid_scale, MAX_SCALE};
use crate::config::Config;

/// Photo-to-ASCII kiosk: capture, render and keep a gallery of glyph portraits
#[derive(Parser, Debug)]
#[command(name = "pyxpic")]
#[command(version, about = "Render photos as ASCII art and keep them in a shared collection", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Collection backend (overrides the config file)
    #[arg(long, global = true)]
    pub backend: Option<BackendChoice>,
}

/// Rendering options shared by the capturing subcommands.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RenderFlags {
    /// ASCII character set
    #[arg(long)]
    pub charset: Option<CharacterSet>,

    /// Color output
    #[arg(long)]
    pub color: Option<ColorChoice>,

    /// Color the cell background instead of the glyph
    #[arg(long)]
    pub background: bool,

    /// Invert brightness (for light terminals)
    #[arg(long)]
    pub invert: bool,

    /// Resize factor (x: 0.045 * scale, y: 0.025 * scale)
    #[arg(long, value_parser = parse_scale)]
    pub scale: Option<f32>,

    /// Do not mirror the image horizontally
    #[arg(long)]
    pub no_mirror: bool,
}

impl RenderFlags {
    /// Merge these flags over the loaded configuration (CLI > config file).
    pub fn apply(&self, config: &mut Config) {
        if let Some(charset) = self.charset {
            config.render.charset = charset.into();
        }
        if let Some(color) = self.color {
            config.render.color = color.into();
        }
        if self.background {
            config.render.background = true;
        }
        if self.invert {
            config.render.invert = true;
        }
        if let Some(scale) = self.scale {
            config.capture.scale = scale;
        }
        if self.no_mirror {
            config.capture.mirror = false;
        }
    }
}

/// Parse and validate the resize scale (0 < scale <= 100)
fn parse_scale(s: &str) -> Result<f32, String> {
    let scale: f32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if !is_valid_scale(scale) {
        return Err(format!("Scale must be in (0, {}], got {}", MAX_SCALE, scale));
    }
    Ok(scale)
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render an image and print it, without storing anything
    Render {
        /// Image file (default: [capture] input from the config file)
        image: Option<PathBuf>,
        #[command(flatten)]
        render: RenderFlags,
        /// Also write the grid to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Capture, render and store one portrait
    Capture {
        /// Image file (default: [capture] input from the config file)
        image: Option<PathBuf>,
        /// Owner identifier of the new record
        #[arg(long)]
        owner: String,
        #[command(flatten)]
        render: RenderFlags,
    },
    /// Repeat capture sessions until Ctrl+C
    Kiosk {
        /// Image file (default: [capture] input from the config file)
        image: Option<PathBuf>,
        /// Owner of every capture (default: one owner per line on stdin)
        #[arg(long)]
        owner: Option<String>,
        #[command(flatten)]
        render: RenderFlags,
    },
    /// Show one record
    Get {
        id: String,
        /// Print the stored grid
        #[arg(long)]
        show: bool,
    },
    /// List stored records
    List {
        /// Only records of this owner
        #[arg(long)]
        owner: Option<String>,
        /// Print every stored grid
        #[arg(long)]
        show: bool,
    },
    /// Delete one record
    Delete { id: String },
    /// Update fields of one record
    Update {
        id: String,
        /// New owner identifier
        #[arg(long)]
        owner: Option<String>,
    },
    /// Move every record of one owner to another
    Reassign { from: String, to: String },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ascii::{CharSet, ColorMode};

    #[test]
    fn test_render_defaults() {
        let args = Args::parse_from(["pyxpic", "render", "photo.jpg"]);
        assert!(args.config.is_none());
        assert!(args.backend.is_none());
        match args.command {
            Command::Render { image, render, save } => {
                assert_eq!(image, Some(PathBuf::from("photo.jpg")));
                assert!(render.charset.is_none());
                assert!(render.color.is_none());
                assert!(!render.no_mirror);
                assert!(save.is_none());
            }
            _ => panic!("Expected Render subcommand"),
        }
    }

    #[test]
    fn test_render_flags() {
        let args = Args::parse_from([
            "pyxpic",
            "render",
            "photo.jpg",
            "--charset",
            "blocks",
            "--color",
            "indexed",
            "--scale",
            "2.5",
            "--no-mirror",
            "--save",
            "/tmp/out.txt",
        ]);
        match args.command {
            Command::Render { render, save, .. } => {
                assert_eq!(render.charset, Some(CharacterSet::Blocks));
                assert_eq!(render.color, Some(ColorChoice::Indexed));
                assert_eq!(render.scale, Some(2.5));
                assert!(render.no_mirror);
                assert_eq!(save, Some(PathBuf::from("/tmp/out.txt")));
            }
            _ => panic!("Expected Render subcommand"),
        }
    }

    #[test]
    fn test_scale_rejects_non_positive() {
        assert!(Args::try_parse_from(["pyxpic", "render", "a.jpg", "--scale", "0"]).is_err());
        assert!(Args::try_parse_from(["pyxpic", "render", "a.jpg", "--scale", "abc"]).is_err());
    }

    #[test]
    fn test_capture_requires_owner() {
        assert!(Args::try_parse_from(["pyxpic", "capture", "photo.jpg"]).is_err());

        let args = Args::parse_from(["pyxpic", "capture", "photo.jpg", "--owner", "abc"]);
        match args.command {
            Command::Capture { owner, .. } => assert_eq!(owner, "abc"),
            _ => panic!("Expected Capture subcommand"),
        }
    }

    #[test]
    fn test_kiosk_owner_optional() {
        let args = Args::parse_from(["pyxpic", "kiosk"]);
        match args.command {
            Command::Kiosk { image, owner, .. } => {
                assert!(image.is_none());
                assert!(owner.is_none());
            }
            _ => panic!("Expected Kiosk subcommand"),
        }
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let args = Args::parse_from([
            "pyxpic",
            "list",
            "--owner",
            "abc",
            "--show",
            "--backend",
            "memory",
            "-c",
            "/tmp/test.toml",
        ]);
        assert_eq!(args.backend, Some(BackendChoice::Memory));
        assert_eq!(args.config, Some(PathBuf::from("/tmp/test.toml")));
        match args.command {
            Command::List { owner, show } => {
                assert_eq!(owner.as_deref(), Some("abc"));
                assert!(show);
            }
            _ => panic!("Expected List subcommand"),
        }
    }

    #[test]
    fn test_maintenance_subcommands() {
        let args = Args::parse_from(["pyxpic", "reassign", "abc", "def"]);
        assert!(matches!(args.command, Command::Reassign { ref from, ref to } if from == "abc" && to == "def"));

        let args = Args::parse_from(["pyxpic", "update", "some-id", "--owner", "def"]);
        assert!(matches!(args.command, Command::Update { owner: Some(_), .. }));

        let args = Args::parse_from(["pyxpic", "delete", "some-id"]);
        assert!(matches!(args.command, Command::Delete { .. }));

        let args = Args::parse_from(["pyxpic", "get", "some-id", "--show"]);
        assert!(matches!(args.command, Command::Get { show: true, .. }));
    }

    #[test]
    fn test_config_subcommands() {
        let args = Args::parse_from(["pyxpic", "config", "show"]);
        assert!(matches!(
            args.command,
            Command::Config {
                action: ConfigAction::Show
            }
        ));

        let args = Args::parse_from(["pyxpic", "config", "init"]);
        assert!(matches!(
            args.command,
            Command::Config {
                action: ConfigAction::Init
            }
        ));
    }

    #[test]
    fn test_render_flags_override_config() {
        let mut config = Config::default();
        let flags = RenderFlags {
            charset: Some(CharacterSet::Minimal),
            color: Some(ColorChoice::Truecolor),
            scale: Some(1.0),
            no_mirror: true,
            ..Default::default()
        };
        flags.apply(&mut config);
        assert_eq!(config.render.charset, CharSet::Minimal);
        assert_eq!(config.render.color, ColorMode::TrueColor);
        assert_eq!(config.capture.scale, 1.0);
        assert!(!config.capture.mirror);
    }

    #[test]
    fn test_empty_render_flags_keep_config() {
        let mut config = Config::default();
        config.render.color = ColorMode::Indexed;
        RenderFlags::default().apply(&mut config);
        assert_eq!(config.render.color, ColorMode::Indexed);
        assert!(config.capture.mirror);
    }
}
