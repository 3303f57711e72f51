//! One capture session: capture, render, present, store.

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::ascii::{GlyphGrid, Renderer};
use crate::camera::{CaptureError, FrameSource};
use crate::error::Error;
use crate::sink::RenderSink;
use crate::store::CollectionStore;
use crate::writer::{RecordWriter, WriteReceipt};

/// Global flag for Ctrl+C handling.
static CTRLC_RECEIVED: AtomicBool = AtomicBool::new(false);

/// How often waits re-check the stop flag.
const STOP_POLL: Duration = Duration::from_millis(100);

/// Set up the Ctrl+C handler.
///
/// This should be called once at program startup.
pub fn setup_ctrlc_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        CTRLC_RECEIVED.store(true, Ordering::SeqCst);
        eprintln!("\nReceived Ctrl+C, finishing current session...");
    })
}

/// Errors that end a session. Nothing is persisted when one occurs.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Core(#[from] Error),

    #[error("Failed to present grid: {0}")]
    Sink(#[source] io::Error),

    #[error("Failed to read owner identifier: {0}")]
    Io(#[source] io::Error),

    #[error("No owner identifier available")]
    NoIdentity,

    #[error("Stopped")]
    Stopped,
}

/// Supplies the owner identifier of the next capture.
pub trait IdentitySource {
    fn next_owner(&mut self) -> Result<String, SessionError>;
}

/// Always the same owner.
#[derive(Debug, Clone)]
pub struct FixedIdentity(pub String);

impl IdentitySource for FixedIdentity {
    fn next_owner(&mut self) -> Result<String, SessionError> {
        if self.0.trim().is_empty() {
            return Err(SessionError::NoIdentity);
        }
        Ok(self.0.clone())
    }
}

/// Read the next non-blank line from `reader`, trimmed.
///
/// Lines that are not valid UTF-8 are skipped with a warning. Returns
/// `Ok(None)` at end of input.
fn read_owner<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(None);
        }
        let text = match std::str::from_utf8(&line) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Skipping owner line that is not valid UTF-8: {}", e);
                continue;
            }
        };
        let owner = text.trim();
        if !owner.is_empty() {
            return Ok(Some(owner.to_string()));
        }
    }
}

/// One owner identifier per input line.
///
/// Handheld code scanners type the decoded code followed by Enter, so a
/// scanner attached to stdin works as an identity source. Blank lines are
/// skipped; end of input yields `NoIdentity`.
pub struct LineIdentity<R: BufRead> {
    reader: R,
}

impl<R: BufRead> LineIdentity<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> IdentitySource for LineIdentity<R> {
    fn next_owner(&mut self) -> Result<String, SessionError> {
        read_owner(&mut self.reader)
            .map_err(SessionError::Io)?
            .ok_or(SessionError::NoIdentity)
    }
}

/// Like [`LineIdentity`], but lines are read on a background thread so
/// waiting for the next owner ends as soon as `stop` is set.
///
/// The reader thread is detached; it exits at end of input or on the first
/// read error.
pub struct BackgroundLineIdentity<'a> {
    lines: Receiver<io::Result<String>>,
    stop: &'a AtomicBool,
}

impl<'a> BackgroundLineIdentity<'a> {
    pub fn spawn<R: BufRead + Send + 'static>(mut reader: R, stop: &'a AtomicBool) -> Self {
        let (tx, lines) = mpsc::channel();
        thread::spawn(move || loop {
            let next = match read_owner(&mut reader) {
                Ok(Some(owner)) => Ok(owner),
                Ok(None) => break,
                Err(e) => Err(e),
            };
            let failed = next.is_err();
            if tx.send(next).is_err() || failed {
                break;
            }
        });
        Self { lines, stop }
    }
}

impl IdentitySource for BackgroundLineIdentity<'_> {
    fn next_owner(&mut self) -> Result<String, SessionError> {
        loop {
            if self.stop.load(Ordering::SeqCst) {
                return Err(SessionError::Stopped);
            }
            match self.lines.recv_timeout(STOP_POLL) {
                Ok(line) => return line.map_err(SessionError::Io),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Err(SessionError::NoIdentity),
            }
        }
    }
}

/// What a successful session produced.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub owner_id: String,
    pub receipt: WriteReceipt,
    pub grid: GlyphGrid,
}

/// Runs capture sessions against one collection.
pub struct CaptureSession<S> {
    renderer: Renderer,
    writer: RecordWriter<S>,
    sinks: Vec<Box<dyn RenderSink>>,
    exports: Vec<Box<dyn RenderSink>>,
}

impl<S: CollectionStore> CaptureSession<S> {
    pub fn new(renderer: Renderer, writer: RecordWriter<S>) -> Self {
        Self {
            renderer,
            writer,
            sinks: Vec::new(),
            exports: Vec::new(),
        }
    }

    /// Also hand every rendered grid to `sink` before it is stored.
    ///
    /// A failing sink rejects the capture.
    pub fn with_sink(mut self, sink: Box<dyn RenderSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Hand every grid to `sink` once its record is committed.
    ///
    /// Export failures are logged; the record stays stored.
    pub fn with_export(mut self, sink: Box<dyn RenderSink>) -> Self {
        self.exports.push(sink);
        self
    }

    pub fn writer(&self) -> &RecordWriter<S> {
        &self.writer
    }

    /// Capture one frame pair from `source`, render it, present it and store it.
    ///
    /// The source is consumed and dropped before this returns, on success
    /// and on every error path.
    pub async fn run<F: FrameSource>(
        &mut self,
        mut source: F,
        owner_id: &str,
    ) -> Result<SessionOutcome, SessionError> {
        let frames = source.capture()?;
        drop(source);

        let grid = self.renderer.render_frames(&frames)?;
        log::debug!(
            "Rendered {}x{} grid for owner {}",
            grid.width(),
            grid.height(),
            owner_id
        );

        for sink in &mut self.sinks {
            sink.present(owner_id, &grid).map_err(SessionError::Sink)?;
        }

        let receipt = self.writer.write_tokens(owner_id, grid.to_tokens()).await?;

        for export in &mut self.exports {
            if let Err(e) = export.present(owner_id, &grid) {
                log::error!("Failed to export grid of record {}: {}", receipt.id, e);
            }
        }

        Ok(SessionOutcome {
            owner_id: owner_id.to_string(),
            receipt,
            grid,
        })
    }

    /// Run sessions until `stop` is set or identities run out.
    ///
    /// A failed session is logged and the loop moves on to the next one.
    /// Returns the number of records stored.
    pub async fn run_kiosk<F, O, I>(
        &mut self,
        mut open_source: O,
        identity: &mut I,
        pause: Duration,
        stop: &AtomicBool,
    ) -> usize
    where
        F: FrameSource,
        O: FnMut() -> F,
        I: IdentitySource + ?Sized,
    {
        let mut stored = 0;

        while !stop.load(Ordering::SeqCst) {
            let owner_id = match identity.next_owner() {
                Ok(owner_id) => owner_id,
                Err(e) => {
                    log::info!("Kiosk stopping: {}", e);
                    break;
                }
            };

            match self.run(open_source(), &owner_id).await {
                Ok(outcome) => {
                    stored += 1;
                    log::info!(
                        "Session for {} stored as {}",
                        outcome.owner_id,
                        outcome.receipt.id
                    );
                }
                Err(e) => log::error!("Capture rejected for {}: {}", owner_id, e),
            }

            pause_unless_stopped(pause, stop).await;
        }

        stored
    }
}

/// Sleep for `pause`, waking early once `stop` is set.
async fn pause_unless_stopped(pause: Duration, stop: &AtomicBool) {
    let mut waited = Duration::ZERO;
    while waited < pause && !stop.load(Ordering::SeqCst) {
        let step = STOP_POLL.min(pause - waited);
        tokio::time::sleep(step).await;
        waited += step;
    }
}

/// The process-wide Ctrl+C flag, for [`CaptureSession::run_kiosk`].
pub fn ctrlc_flag() -> &'static AtomicBool {
    &CTRLC_RECEIVED
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ascii::RenderOptions;
    use crate::camera::{LumaFrame, StaticFrameSource};
    use crate::store::{MemoryStore, PhotoRecord, RecordUpdate};
    use crate::sink::TextFileSink;
    use async_trait::async_trait;
    use std::io::{BufReader, Cursor, Read};

    fn session() -> CaptureSession<MemoryStore> {
        CaptureSession::new(
            Renderer::new(RenderOptions::default()),
            RecordWriter::new(MemoryStore::new()),
        )
    }

    fn source(value: u8) -> StaticFrameSource {
        StaticFrameSource::from_luma(LumaFrame::new(2, 1, vec![value, value]).unwrap()).unwrap()
    }

    struct FailingSource;

    impl FrameSource for FailingSource {
        fn capture(&mut self) -> Result<crate::camera::CapturedFrames, CaptureError> {
            Err(CaptureError::Exhausted)
        }
    }

    struct FailingSink;

    impl RenderSink for FailingSink {
        fn present(&mut self, _owner_id: &str, _grid: &GlyphGrid) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }
    }

    /// Empty collection that refuses every write.
    struct DownStore;

    #[async_trait]
    impl CollectionStore for DownStore {
        async fn get(&self, _id: &str) -> crate::Result<Option<PhotoRecord>> {
            Ok(None)
        }
        async fn create(&self, _record: &PhotoRecord) -> crate::Result<()> {
            Err(Error::unavailable("down"))
        }
        async fn set(&self, _record: &PhotoRecord) -> crate::Result<()> {
            Err(Error::unavailable("down"))
        }
        async fn update(&self, _id: &str, _update: &RecordUpdate) -> crate::Result<()> {
            Err(Error::unavailable("down"))
        }
        async fn delete(&self, _id: &str) -> crate::Result<()> {
            Err(Error::unavailable("down"))
        }
        async fn count(&self) -> crate::Result<u64> {
            Ok(0)
        }
        async fn list_all(&self) -> crate::Result<Vec<PhotoRecord>> {
            Ok(Vec::new())
        }
        async fn list_by_owner(&self, _owner_id: &str) -> crate::Result<Vec<PhotoRecord>> {
            Ok(Vec::new())
        }
    }

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "scanner unplugged"))
        }
    }

    /// Blocks until the paired sender is dropped, then reports end of input.
    struct WaitingReader(mpsc::Receiver<()>);

    impl Read for WaitingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_run_stores_rendered_grid() {
        let mut session = session();
        let outcome = session.run(source(255), "abc").await.unwrap();
        assert_eq!(outcome.grid.to_string(), "@@\n");
        assert_eq!(outcome.receipt.order_number, 0);

        let stored = session.writer().get(&outcome.receipt.id).await.unwrap();
        assert_eq!(stored.raw_image, vec![vec!["@", "@"]]);
    }

    #[tokio::test]
    async fn test_capture_failure_persists_nothing() {
        let mut session = session();
        let result = session.run(FailingSource, "abc").await;
        assert!(matches!(result, Err(SessionError::Capture(_))));
        assert_eq!(session.writer().store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sink_failure_persists_nothing() {
        let mut session = session().with_sink(Box::new(FailingSink));
        let result = session.run(source(0), "abc").await;
        assert!(matches!(result, Err(SessionError::Sink(_))));
        assert_eq!(session.writer().store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_previous_export() {
        let dir = tempfile::tempdir().unwrap();
        let saved = dir.path().join("abc.txt");
        std::fs::write(&saved, "previous portrait\n").unwrap();

        let mut session = CaptureSession::new(
            Renderer::new(RenderOptions::default()),
            RecordWriter::new(DownStore),
        )
        .with_export(Box::new(TextFileSink::new(dir.path().to_path_buf())));

        let result = session.run(source(255), "abc").await;
        assert!(matches!(
            result,
            Err(SessionError::Core(Error::StoreUnavailable { .. }))
        ));
        assert_eq!(
            std::fs::read_to_string(&saved).unwrap(),
            "previous portrait\n"
        );
    }

    #[tokio::test]
    async fn test_export_runs_after_commit() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session()
            .with_export(Box::new(FailingSink))
            .with_export(Box::new(TextFileSink::new(dir.path().to_path_buf())));

        let outcome = session.run(source(255), "abc").await.unwrap();
        assert_eq!(session.writer().store().count().await.unwrap(), 1);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("abc.txt")).unwrap(),
            outcome.grid.to_string()
        );
    }

    #[test]
    fn test_line_identity_skips_invalid_utf8() {
        let mut identity = LineIdentity::new(Cursor::new(b"\xff\xfe\n\nabc\n".to_vec()));
        assert_eq!(identity.next_owner().unwrap(), "abc");
        assert!(matches!(
            identity.next_owner(),
            Err(SessionError::NoIdentity)
        ));
    }

    #[test]
    fn test_line_identity_reports_read_errors() {
        let mut identity = LineIdentity::new(BufReader::new(BrokenReader));
        assert!(matches!(identity.next_owner(), Err(SessionError::Io(_))));
    }

    #[test]
    fn test_background_identity_reads_lines() {
        let stop = AtomicBool::new(false);
        let mut identity =
            BackgroundLineIdentity::spawn(Cursor::new("abc\n\n xyz \n".to_string()), &stop);
        assert_eq!(identity.next_owner().unwrap(), "abc");
        assert_eq!(identity.next_owner().unwrap(), "xyz");
        assert!(matches!(
            identity.next_owner(),
            Err(SessionError::NoIdentity)
        ));
    }

    #[test]
    fn test_background_identity_reports_read_errors() {
        let stop = AtomicBool::new(false);
        let mut identity = BackgroundLineIdentity::spawn(BufReader::new(BrokenReader), &stop);
        assert!(matches!(identity.next_owner(), Err(SessionError::Io(_))));
    }

    #[test]
    fn test_background_identity_stops_while_waiting_for_input() {
        let (_hold, rx) = mpsc::channel();
        let stop = AtomicBool::new(false);
        let mut identity = BackgroundLineIdentity::spawn(BufReader::new(WaitingReader(rx)), &stop);

        thread::scope(|scope| {
            scope.spawn(|| {
                thread::sleep(Duration::from_millis(50));
                stop.store(true, Ordering::SeqCst);
            });
            assert!(matches!(identity.next_owner(), Err(SessionError::Stopped)));
        });
    }

    #[tokio::test]
    async fn test_kiosk_runs_one_session_per_identity() {
        let mut session = session();
        let mut identity = LineIdentity::new(Cursor::new("abc\n\nxyz\n"));
        let stop = AtomicBool::new(false);

        let stored = session
            .run_kiosk(|| source(128), &mut identity, Duration::ZERO, &stop)
            .await;
        assert_eq!(stored, 2);
        assert_eq!(session.writer().fetch_owner("xyz").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_kiosk_stops_when_flag_set() {
        let mut session = session();
        let mut identity = FixedIdentity("abc".to_string());
        let stop = AtomicBool::new(true);

        let stored = session
            .run_kiosk(|| source(128), &mut identity, Duration::ZERO, &stop)
            .await;
        assert_eq!(stored, 0);
    }

    #[test]
    fn test_fixed_identity_rejects_blank() {
        let mut identity = FixedIdentity("  ".to_string());
        assert!(matches!(
            identity.next_owner(),
            Err(SessionError::NoIdentity)
        ));
    }
}
