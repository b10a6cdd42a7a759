//! The log writer: a single task owning all mutable writer state.
//!
//! Public operations never touch the destination on the caller's stack. They
//! enqueue messages onto an unbounded channel drained by one spawned task,
//! which resolves the destination, splits chunks into lines, and writes one
//! unit at a time. That single consumer is what guarantees at most one write
//! in flight, strict FIFO line ordering, and an exactly-once close sequence,
//! with no mutex involved.
//!
//! Observable lifecycle and I/O progress are published as [`WriterEvent`]s on
//! a broadcast channel; subscribe before issuing writes to observe the events
//! those writes produce.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::sleep;

use crate::buffer::{HIGH_WATER_MARK, LineBuffer};
use crate::error::WriterError;
use crate::sink::RecordSink;
use crate::target::LogTarget;

/// Delay before retrying the same unit after an EAGAIN/EBUSY-class failure.
const BUSY_RETRY_DELAY: Duration = Duration::from_millis(100);

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// POSIX "bad file descriptor"; a sync that fails this way has nothing left
/// to flush and counts as success.
const EBADF: i32 = 9;

/// Notifications published by a [`LogWriter`].
#[derive(Debug, Clone)]
pub enum WriterEvent {
    /// The destination resolved and is usable.
    Ready,
    /// One write completed, carrying the number of bytes accepted.
    Write(usize),
    /// All queued complete lines have been written.
    Drain,
    /// A fatal error; the writer is shutting down. Emitted at most once.
    Error(WriterError),
    /// A graceful `end` completed with no writer error.
    Finish,
    /// Terminal. Emitted always, exactly once.
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Opening,
    Ready,
    Closed,
}

enum Command {
    Write(Vec<u8>),
    Flush(oneshot::Sender<Result<(), WriterError>>),
    End(Option<Vec<u8>>),
    Destroy,
}

/// Shared between the handle and the writer task so `write` can answer the
/// backpressure question synchronously and `destroy` can cut off retry loops.
#[derive(Debug, Default)]
struct Shared {
    buffered: AtomicUsize,
    destroyed: AtomicBool,
    ending: AtomicBool,
}

/// Line-buffered asynchronous log writer.
///
/// Appends newline-delimited records to a file or descriptor with strict line
/// atomicity: only complete, newline-terminated lines are ever written, in
/// the exact order they were enqueued. A trailing fragment not yet terminated
/// by a newline stays buffered and is discarded on [`end`](Self::end) or
/// [`destroy`](Self::destroy), never written.
///
/// Dropping the writer destroys it, discarding buffered data; call
/// [`end`](Self::end) first for a graceful drain.
#[derive(Debug)]
pub struct LogWriter {
    tx: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<WriterEvent>,
    shared: Arc<Shared>,
    phase: watch::Receiver<Phase>,
    path: Option<PathBuf>,
}

impl LogWriter {
    /// Spawn a writer for the given target. Destination resolution begins
    /// immediately; operations issued before the destination is ready queue
    /// rather than fail.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(target: LogTarget) -> Self {
        let path = target.as_path().map(Path::to_path_buf);
        Self::spawn(Init::Target(target), path)
    }

    /// Spawn a writer over an already-open sink. Intended for tests and
    /// embedders capturing output in memory.
    pub fn with_sink(sink: Box<dyn RecordSink>) -> Self {
        Self::spawn(Init::Sink(sink), None)
    }

    fn spawn(init: Init, path: Option<PathBuf>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (phase_tx, phase_rx) = watch::channel(Phase::Opening);
        let shared = Arc::new(Shared::default());

        let task = WriterTask {
            rx,
            events: events.clone(),
            shared: shared.clone(),
            buffer: LineBuffer::default(),
            ending: false,
            phase: phase_tx,
        };
        tokio::spawn(task.run(init));

        Self {
            tx,
            events,
            shared,
            phase: phase_rx,
            path,
        }
    }

    /// Enqueue `data` for writing. Returns the backpressure signal: `false`
    /// when buffered-but-unwritten bytes reach the high-water mark after this
    /// call (the caller should pause), or when the writer is destroyed and
    /// the data was dropped.
    ///
    /// The return is synchronous; the write itself happens asynchronously and
    /// any failure surfaces through [`subscribe`](Self::subscribe), not here.
    pub fn write(&self, data: impl AsRef<[u8]>) -> bool {
        let chunk = data.as_ref();
        if self.shared.destroyed.load(Ordering::Acquire) {
            return false;
        }
        let total = self.shared.buffered.fetch_add(chunk.len(), Ordering::AcqRel) + chunk.len();
        if self.tx.send(Command::Write(chunk.to_vec())).is_err() {
            return false;
        }
        total < HIGH_WATER_MARK
    }

    /// Durably sync all complete lines enqueued strictly before this call.
    ///
    /// The trailing partial fragment is not covered. A destroyed writer
    /// resolves `Ok` immediately; a sync failure because the descriptor was
    /// already closed elsewhere counts as success.
    pub async fn flush(&self) -> Result<(), WriterError> {
        if self.shared.destroyed.load(Ordering::Acquire) {
            return Ok(());
        }
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Command::Flush(reply)).is_err() {
            return Ok(());
        }
        match rx.await {
            Ok(result) => result,
            // Writer terminated before the flush was processed.
            Err(_) => Ok(()),
        }
    }

    /// Gracefully terminate: drain all complete queued lines, discard the
    /// trailing fragment, sync, and close. Resolves once `Close` has been
    /// emitted. Idempotent.
    pub async fn end(&self) {
        self.finish(None).await;
    }

    /// Like [`end`](Self::end), but writes `data` first.
    pub async fn end_with(&self, data: impl AsRef<[u8]>) {
        self.finish(Some(data.as_ref().to_vec())).await;
    }

    async fn finish(&self, data: Option<Vec<u8>>) {
        if !self.shared.destroyed.load(Ordering::Acquire)
            && !self.shared.ending.swap(true, Ordering::AcqRel)
        {
            if let Some(chunk) = &data {
                self.shared.buffered.fetch_add(chunk.len(), Ordering::AcqRel);
            }
            let _ = self.tx.send(Command::End(data));
        }
        self.closed().await;
    }

    /// Close immediately, without draining: the line currently in flight is
    /// allowed to finish; queued lines and the trailing fragment are
    /// discarded. Cuts off any transient-error retry in progress.
    /// Idempotent. Also invoked on drop.
    pub fn destroy(&self) {
        if !self.shared.destroyed.swap(true, Ordering::AcqRel) {
            let _ = self.tx.send(Command::Destroy);
        }
    }

    /// Subscribe to writer notifications.
    ///
    /// Events triggered by operations issued after this call are always
    /// observed; `Ready` may already have fired (await
    /// [`ready`](Self::ready) for that).
    pub fn subscribe(&self) -> broadcast::Receiver<WriterEvent> {
        self.events.subscribe()
    }

    /// Wait for the destination to become usable. Returns `false` if the
    /// writer terminated instead (for example, the log file could not be
    /// opened).
    pub async fn ready(&self) -> bool {
        let mut phase = self.phase.clone();
        match phase.wait_for(|p| *p != Phase::Opening).await {
            Ok(p) => *p == Phase::Ready,
            Err(_) => false,
        }
    }

    /// Wait until the writer has fully closed.
    pub async fn closed(&self) {
        let mut phase = self.phase.clone();
        let _ = phase.wait_for(|p| *p == Phase::Closed).await;
    }

    /// Whether the writer still accepts productive writes.
    pub fn writable(&self) -> bool {
        !self.shared.destroyed.load(Ordering::Acquire)
            && !self.shared.ending.load(Ordering::Acquire)
    }

    /// Bytes ingested but not yet acknowledged as written.
    pub fn buffered(&self) -> usize {
        self.shared.buffered.load(Ordering::Acquire)
    }

    /// The file path this writer appends to, for path-based targets.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        self.destroy();
    }
}

enum Init {
    Target(LogTarget),
    Sink(Box<dyn RecordSink>),
}

struct WriterTask {
    rx: mpsc::UnboundedReceiver<Command>,
    events: broadcast::Sender<WriterEvent>,
    shared: Arc<Shared>,
    buffer: LineBuffer,
    ending: bool,
    phase: watch::Sender<Phase>,
}

impl WriterTask {
    async fn run(mut self, init: Init) {
        let mut sink = match init {
            Init::Sink(sink) => sink,
            Init::Target(target) => match target.resolve().await {
                Ok(sink) => sink,
                Err(error) => {
                    // Terminal: the destination never became usable.
                    self.emit(WriterEvent::Error(error));
                    self.finalize();
                    return;
                }
            },
        };
        let _ = self.phase.send(Phase::Ready);
        self.emit(WriterEvent::Ready);

        while let Some(command) = self.rx.recv().await {
            match command {
                Command::Write(chunk) => {
                    // Chunks sent before a racing destroy() still count as
                    // queued; the Destroy command decides their fate.
                    self.buffer.ingest(&chunk);
                    if self.destroyed() {
                        continue;
                    }
                    if let Err(error) = self.pump(&mut sink).await {
                        self.fail(sink, error).await;
                        return;
                    }
                }
                Command::Flush(reply) => {
                    if self.destroyed() {
                        let _ = reply.send(Ok(()));
                        continue;
                    }
                    match self.pump(&mut sink).await {
                        Ok(()) => {
                            let _ = reply.send(Self::sync_for_flush(&mut sink).await);
                        }
                        Err(error) => {
                            let _ = reply.send(Err(error.clone()));
                            self.fail(sink, error).await;
                            return;
                        }
                    }
                }
                Command::End(data) => {
                    if self.destroyed() {
                        continue;
                    }
                    self.ending = true;
                    if let Some(chunk) = data {
                        self.buffer.ingest(&chunk);
                    }
                    if let Err(error) = self.pump(&mut sink).await {
                        self.fail(sink, error).await;
                        return;
                    }
                    let graceful = !self.destroyed();
                    self.close(sink, graceful).await;
                    return;
                }
                Command::Destroy => {
                    // The oldest queued line is the unit that would already
                    // be in flight; let it finish, abandon everything else.
                    if let Some(line) = self.buffer.pop_line() {
                        let _ = self.write_unit(&mut sink, &line).await;
                    }
                    self.close(sink, false).await;
                    return;
                }
            }
        }

        // Every handle dropped; Drop sends Destroy, but close here as well in
        // case the command queue was torn down first.
        self.close(sink, false).await;
    }

    /// Drain all complete queued lines into the sink, one unit at a time.
    /// The trailing fragment is never eligible.
    async fn pump(&mut self, sink: &mut Box<dyn RecordSink>) -> Result<(), WriterError> {
        let mut wrote = false;
        while let Some(line) = self.buffer.pop_line() {
            self.write_unit(sink, &line).await?;
            wrote = true;
            if self.destroyed() {
                // destroy() raced in: abandon whatever is still queued.
                self.buffer.clear();
                return Ok(());
            }
        }
        if wrote && !self.ending {
            self.emit(WriterEvent::Drain);
        }
        Ok(())
    }

    /// Issue writes for one unit until it is fully accepted. Short writes
    /// continue immediately with the remainder; transient failures retry the
    /// same remainder after a fixed delay, indefinitely, unless destroy()
    /// cuts them off.
    async fn write_unit(
        &mut self,
        sink: &mut Box<dyn RecordSink>,
        unit: &[u8],
    ) -> Result<(), WriterError> {
        let mut offset = 0;
        while offset < unit.len() {
            match sink.write(&unit[offset..]).await {
                Ok(0) => {
                    return Err(WriterError::write(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "destination accepted no bytes",
                    )));
                }
                Ok(written) => {
                    offset += written;
                    self.shared.buffered.fetch_sub(written, Ordering::AcqRel);
                    self.emit(WriterEvent::Write(written));
                }
                Err(error) if is_transient(&error) => {
                    if self.destroyed() {
                        return Ok(());
                    }
                    sleep(BUSY_RETRY_DELAY).await;
                }
                Err(error) => return Err(WriterError::write(error)),
            }
        }
        Ok(())
    }

    async fn sync_for_flush(sink: &mut Box<dyn RecordSink>) -> Result<(), WriterError> {
        match sink.sync().await {
            Err(error) if error.raw_os_error() == Some(EBADF) => Ok(()),
            result => result.map_err(WriterError::sync),
        }
    }

    async fn fail(&mut self, sink: Box<dyn RecordSink>, error: WriterError) {
        self.emit(WriterEvent::Error(error));
        self.close(sink, false).await;
    }

    /// Shared close sequence: discard the buffer, best-effort sync, release
    /// the sink (closing our descriptor; shared targets only ever hold a
    /// duplicate), then signal termination.
    async fn close(&mut self, mut sink: Box<dyn RecordSink>, graceful: bool) {
        self.buffer.clear();
        let _ = sink.sync().await;
        drop(sink);
        if graceful {
            self.emit(WriterEvent::Finish);
        }
        self.finalize();
    }

    fn finalize(&mut self) {
        self.shared.destroyed.store(true, Ordering::Release);
        self.emit(WriterEvent::Close);
        let _ = self.phase.send(Phase::Closed);
    }

    fn destroyed(&self) -> bool {
        self.shared.destroyed.load(Ordering::Acquire)
    }

    fn emit(&self, event: WriterEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }
}

fn is_transient(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::ResourceBusy
    )
}
