//! Background status reporting for a running batch.
//!
//! The worker publishes [`ProgressEvent`]s without blocking; a dedicated
//! thread turns the latest one into a [`ProgressSnapshot`] immediately on
//! start and then once per interval, until it is stopped.

use crate::defaults::REPORTER_STOP_LATENCY_MS;
use crate::error::Result;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, select, tick};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// What the worker knows about batch progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub processed: usize,
    pub total: usize,
    pub in_progress: bool,
}

/// Reporting view of progress; the three counts always add up to the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub processed_count: usize,
    pub pending_count: usize,
    pub in_progress: usize,
}

impl ProgressSnapshot {
    pub fn total(&self) -> usize {
        self.processed_count + self.pending_count + self.in_progress
    }
}

impl From<ProgressEvent> for ProgressSnapshot {
    fn from(event: ProgressEvent) -> Self {
        let processed_count = event.processed.min(event.total);
        let in_progress = usize::from(event.in_progress && processed_count < event.total);
        Self {
            processed_count,
            pending_count: event.total - processed_count - in_progress,
            in_progress,
        }
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "status: in progress {}, processed {}, pending {}",
            self.in_progress, self.processed_count, self.pending_count
        )
    }
}

/// Pluggable destination for status lines.
pub trait ProgressSink: Send + 'static {
    fn emit(&mut self, snapshot: &ProgressSnapshot) -> Result<()>;

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "sink"
    }
}

/// Writes status lines through `tracing`.
#[derive(Debug, Default)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn emit(&mut self, snapshot: &ProgressSnapshot) -> Result<()> {
        tracing::info!(
            processed = snapshot.processed_count,
            pending = snapshot.pending_count,
            in_progress = snapshot.in_progress,
            "{}",
            snapshot
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Collects snapshots in memory; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct CollectorSink {
    snapshots: Arc<Mutex<Vec<ProgressSnapshot>>>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<ProgressSnapshot> {
        self.snapshots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl ProgressSink for CollectorSink {
    fn emit(&mut self, snapshot: &ProgressSnapshot) -> Result<()> {
        self.snapshots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(*snapshot);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}

/// Non-blocking single-slot hand-off from the worker to the reporter thread.
///
/// The slot always holds the newest event: publishing into a full slot
/// evicts the stale event first.
#[derive(Debug, Clone)]
struct ProgressSender {
    tx: Sender<ProgressEvent>,
    slot: Receiver<ProgressEvent>,
}

impl ProgressSender {
    fn publish(&self, mut event: ProgressEvent) {
        loop {
            match self.tx.try_send(event) {
                Ok(()) | Err(TrySendError::Disconnected(_)) => return,
                Err(TrySendError::Full(rejected)) => {
                    event = rejected;
                    if let Ok(stale) = self.slot.try_recv() {
                        tracing::trace!(processed = stale.processed, "replacing unread progress event");
                    }
                }
            }
        }
    }
}

/// Reporter lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterState {
    Idle,
    Running,
    Stopping,
}

struct RunningReporter {
    events: ProgressSender,
    stop_tx: Sender<()>,
    thread: JoinHandle<()>,
}

/// Periodic status emitter running on its own thread.
pub struct StatusReporter {
    interval: Duration,
    state: ReporterState,
    running: Option<RunningReporter>,
}

impl StatusReporter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: ReporterState::Idle,
            running: None,
        }
    }

    pub fn state(&self) -> ReporterState {
        self.state
    }

    /// Spawn the reporter thread; emits `initial` right away.
    ///
    /// Starting a running reporter is a no-op.
    pub fn start(&mut self, sink: Box<dyn ProgressSink>, initial: ProgressEvent) -> Result<()> {
        if self.running.is_some() {
            tracing::debug!("status reporter already running");
            return Ok(());
        }

        let (events_tx, events_rx) = bounded(1);
        let (stop_tx, stop_rx) = bounded(1);
        let interval = self.interval;

        let thread = std::thread::Builder::new()
            .name("status-reporter".to_string())
            .spawn({
                let events_rx = events_rx.clone();
                move || report_loop(sink, interval, initial, events_rx, stop_rx)
            })?;

        self.running = Some(RunningReporter {
            events: ProgressSender {
                tx: events_tx,
                slot: events_rx.clone(),
            },
            stop_tx,
            thread,
        });
        self.state = ReporterState::Running;
        Ok(())
    }

    /// Hand the newest progress to the reporter thread without blocking.
    pub fn publish(&self, event: ProgressEvent) {
        if let Some(running) = &self.running {
            running.events.publish(event);
        }
    }

    /// Signal the thread and wait for it, bounded by the stop latency.
    ///
    /// After the deadline the thread is detached.
    pub fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        self.state = ReporterState::Stopping;

        // A full slot means a stop is already pending.
        if let Err(TrySendError::Disconnected(())) = running.stop_tx.try_send(()) {
            tracing::debug!("status reporter already exited");
        }

        let deadline = Instant::now() + Duration::from_millis(REPORTER_STOP_LATENCY_MS);
        let poll_interval = Duration::from_millis(5);
        while !running.thread.is_finished() && Instant::now() < deadline {
            std::thread::sleep(poll_interval);
        }

        if running.thread.is_finished() {
            if let Err(panic_info) = running.thread.join() {
                let msg = panic_info
                    .downcast_ref::<&str>()
                    .copied()
                    .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
                    .unwrap_or("unknown panic");
                tracing::error!("status reporter thread panicked: {msg}");
            }
        } else {
            tracing::warn!("status reporter did not stop in time, detaching");
        }

        self.state = ReporterState::Idle;
    }
}

impl Drop for StatusReporter {
    fn drop(&mut self) {
        self.stop();
    }
}

fn report_loop(
    mut sink: Box<dyn ProgressSink>,
    interval: Duration,
    initial: ProgressEvent,
    events: Receiver<ProgressEvent>,
    stop: Receiver<()>,
) {
    let ticker = tick(interval);
    let mut latest = initial;
    emit(sink.as_mut(), latest);

    loop {
        select! {
            recv(stop) -> _ => break,
            recv(events) -> msg => match msg {
                Ok(event) => latest = event,
                Err(_) => break,
            },
            recv(ticker) -> _ => emit(sink.as_mut(), latest),
        }
    }

    tracing::debug!(sink = sink.name(), "status reporter stopped");
}

fn emit(sink: &mut dyn ProgressSink, event: ProgressEvent) {
    let snapshot = ProgressSnapshot::from(event);
    if let Err(e) = sink.emit(&snapshot) {
        tracing::warn!(sink = sink.name(), "failed to emit status: {}", e);
    }
}
