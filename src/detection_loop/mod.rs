//! DetectionLoop - Frame Processing Loop
//!
//! ## Responsibilities
//!
//! - Pull frames from the camera, skip frames per platform profile
//! - Run the tracker behind the motion gate, feed the ledger
//! - Hand deltas to the push adapter on the batch interval
//! - Publish live status (FPS, frame count, inventory)
//!
//! ## Cycle
//!
//! capture -> skip? -> gate -> track -> filter -> ledger -> frame sink
//! -> delta check -> status
//!
//! Deliveries run off the loop so a slow backend never stalls capture, but
//! one at a time: each delivery task waits for the previous one, so the
//! backend always receives deltas in emission order and its last snapshot
//! is the newest. On stop the in-flight cycle completes, the delivery chain
//! is awaited and any pending delta is flushed once.
//!
//! FPS is the rolling rate of processed cycles (capture through status).
//! Skipped frames are not counted.

use crate::config::Settings;
use crate::inventory::InventoryService;
use crate::models::TrackedObservation;
use crate::ports::{DeltaSink, FrameSink, FrameSource, MotionGate, ObjectTracker, StatusSink};
use crate::status_board::{ServiceState, ServiceStatus};
use chrono::{DateTime, Utc};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Processed cycles in the rolling FPS window
const FPS_WINDOW: usize = 30;

/// Loop tuning
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Run detection on every Nth captured frame
    pub process_every_n_frames: u32,
    /// Minimum time between delta checks
    pub batch_interval: Duration,
    /// Classes passed to the ledger (empty = all)
    pub allowed_classes: HashSet<String>,
    /// Sleep when the camera has no frame
    pub idle_backoff: Duration,
    /// Pause between cycles
    pub frame_pause: Duration,
}

impl LoopConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            process_every_n_frames: settings.process_every_n_frames,
            batch_interval: settings.batch_interval(),
            allowed_classes: settings.allowed_classes.iter().cloned().collect(),
            ..Self::default()
        }
    }

    fn is_allowed(&self, class_name: &str) -> bool {
        self.allowed_classes.is_empty() || self.allowed_classes.contains(class_name)
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            process_every_n_frames: 1,
            batch_interval: Duration::from_secs(1),
            allowed_classes: HashSet::new(),
            idle_backoff: Duration::from_millis(100),
            frame_pause: Duration::from_millis(10),
        }
    }
}

/// What one cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// No frame available
    Idle,
    /// Frame captured but not run through the tracker
    Skipped,
    /// Frame run through gate, tracker and ledger
    Processed,
}

/// Output ports of the loop
#[derive(Clone)]
pub struct LoopSinks {
    pub frames: Arc<dyn FrameSink>,
    pub status: Arc<dyn StatusSink>,
    pub deltas: Arc<dyn DeltaSink>,
}

/// DetectionLoop instance
pub struct DetectionLoop {
    config: LoopConfig,
    source: Box<dyn FrameSource>,
    tracker: Box<dyn ObjectTracker>,
    gate: Box<dyn MotionGate>,
    inventory: Arc<InventoryService>,
    sinks: LoopSinks,

    frame_count: u64,
    last_detections: Vec<TrackedObservation>,
    last_detection_time: Option<DateTime<Utc>>,
    last_delta_check: Instant,
    cycle_times: VecDeque<Duration>,
    /// Tail of the delivery chain
    delivery: Option<JoinHandle<()>>,
}

impl DetectionLoop {
    pub fn new(
        config: LoopConfig,
        source: Box<dyn FrameSource>,
        tracker: Box<dyn ObjectTracker>,
        gate: Box<dyn MotionGate>,
        inventory: Arc<InventoryService>,
        sinks: LoopSinks,
    ) -> Self {
        Self {
            config: LoopConfig {
                process_every_n_frames: config.process_every_n_frames.max(1),
                ..config
            },
            source,
            tracker,
            gate,
            inventory,
            sinks,
            frame_count: 0,
            last_detections: Vec::new(),
            last_detection_time: None,
            last_delta_check: Instant::now(),
            cycle_times: VecDeque::with_capacity(FPS_WINDOW),
            delivery: None,
        }
    }

    /// Frames captured so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Run one cycle
    pub async fn step(&mut self) -> StepOutcome {
        let cycle_start = Instant::now();

        let frame = match self.source.next_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::trace!("No frame available");
                tokio::time::sleep(self.config.idle_backoff).await;
                return StepOutcome::Idle;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Frame capture failed");
                tokio::time::sleep(self.config.idle_backoff).await;
                return StepOutcome::Idle;
            }
        };

        self.frame_count += 1;

        if self.frame_count % u64::from(self.config.process_every_n_frames) != 0 {
            self.sinks.frames.on_frame(&frame, &self.last_detections).await;
            return StepOutcome::Skipped;
        }

        if self.gate.should_detect(&frame) {
            let detections = match self.tracker.detect_and_track(&frame).await {
                Ok(detections) => detections,
                Err(e) => {
                    tracing::error!(
                        frame = frame.sequence,
                        error = %e,
                        "Tracker failed, treating frame as empty"
                    );
                    Vec::new()
                }
            };

            let detections: Vec<TrackedObservation> = detections
                .into_iter()
                .filter(|d| self.config.is_allowed(&d.class_name))
                .collect();

            let events = self.inventory.update(&detections).await;
            if !events.is_empty() {
                tracing::debug!(
                    frame = frame.sequence,
                    events = events.len(),
                    "Ledger emitted events"
                );
            }

            self.last_detections = detections;
            self.last_detection_time = Some(Utc::now());
        }

        self.sinks.frames.on_frame(&frame, &self.last_detections).await;

        if self.last_delta_check.elapsed() >= self.config.batch_interval {
            self.last_delta_check = Instant::now();
            self.dispatch_delta().await;
        }

        self.record_cycle_time(cycle_start.elapsed());
        let status = self.current_status(ServiceState::Running).await;
        self.sinks.status.on_status(status).await;

        StepOutcome::Processed
    }

    /// Run until `running` turns false, then shut down cleanly
    pub async fn run(mut self, running: Arc<RwLock<bool>>) {
        tracing::info!(
            every_n = self.config.process_every_n_frames,
            batch_ms = self.config.batch_interval.as_millis() as u64,
            "Starting detection loop"
        );

        loop {
            {
                let is_running = running.read().await;
                if !*is_running {
                    break;
                }
            }

            if self.step().await != StepOutcome::Idle {
                tokio::time::sleep(self.config.frame_pause).await;
            }
        }

        self.shutdown().await;
    }

    /// Spawn the loop on the runtime
    pub fn spawn(self) -> LoopHandle {
        let running = Arc::new(RwLock::new(true));
        let task = tokio::spawn(self.run(running.clone()));
        LoopHandle { running, task }
    }

    async fn shutdown(&mut self) {
        let status = self.current_status(ServiceState::Stopped).await;
        self.sinks.status.on_status(status).await;

        if let Some(handle) = self.delivery.take() {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Delta delivery task failed");
            }
        }

        if let Some(delta) = self.inventory.get_delta().await {
            tracing::info!(events = delta.events.len(), "Flushing final delta");
            self.sinks.deltas.deliver(delta).await;
        }

        tracing::info!(frames = self.frame_count, "Detection loop stopped");
    }

    /// Queue the pending delta behind any delivery still in flight
    async fn dispatch_delta(&mut self) {
        let Some(delta) = self.inventory.get_delta().await else {
            return;
        };

        let sink = self.sinks.deltas.clone();
        let previous = self.delivery.take();
        self.delivery = Some(tokio::spawn(async move {
            if let Some(previous) = previous {
                if let Err(e) = previous.await {
                    tracing::error!(error = %e, "Delta delivery task failed");
                }
            }
            sink.deliver(delta).await;
        }));
    }

    fn record_cycle_time(&mut self, elapsed: Duration) {
        if self.cycle_times.len() == FPS_WINDOW {
            self.cycle_times.pop_front();
        }
        self.cycle_times.push_back(elapsed);
    }

    fn fps(&self) -> f64 {
        let total: Duration = self.cycle_times.iter().sum();
        if total.is_zero() {
            return 0.0;
        }
        let fps = self.cycle_times.len() as f64 / total.as_secs_f64();
        (fps * 10.0).round() / 10.0
    }

    async fn current_status(&mut self, state: ServiceState) -> ServiceStatus {
        ServiceStatus {
            status: state,
            fps: self.fps(),
            frame_count: self.frame_count,
            last_detection_time: self.last_detection_time,
            motion_active: self.gate.is_active(),
            inventory: self.inventory.current_inventory().await,
        }
    }
}

/// Handle to a spawned detection loop
pub struct LoopHandle {
    running: Arc<RwLock<bool>>,
    task: JoinHandle<()>,
}

impl LoopHandle {
    /// Ask the loop to stop after the current cycle
    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Wait for the loop to finish its shutdown
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Detection loop task failed");
        }
    }
}
