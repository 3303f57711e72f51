//! Destinations for rendered grids.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::ascii::GlyphGrid;

/// Consumes a rendered grid for display or export.
pub trait RenderSink {
    fn present(&mut self, owner_id: &str, grid: &GlyphGrid) -> io::Result<()>;
}

/// Prints grids to a writer, stdout by default.
pub struct TerminalSink<W: Write> {
    out: W,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RenderSink for TerminalSink<W> {
    fn present(&mut self, _owner_id: &str, grid: &GlyphGrid) -> io::Result<()> {
        write!(self.out, "{}", grid)?;
        self.out.flush()
    }
}

/// Saves each grid as `<dir>/<owner>.txt`, overwriting the previous one.
#[derive(Debug, Clone)]
pub struct TextFileSink {
    dir: PathBuf,
}

impl TextFileSink {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File the grid of `owner_id` is written to.
    ///
    /// Characters that cannot appear in a file name are replaced by `_`.
    pub fn path_for(&self, owner_id: &str) -> PathBuf {
        let name: String = owner_id
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let name = if name.is_empty() || name.chars().all(|c| c == '.') {
            "capture".to_string()
        } else {
            name
        };
        self.dir.join(format!("{}.txt", name))
    }
}

impl RenderSink for TextFileSink {
    fn present(&mut self, owner_id: &str, grid: &GlyphGrid) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(owner_id);
        std::fs::write(&path, grid.to_string())?;
        log::info!("Saved grid to {}", path.display());
        Ok(())
    }
}
