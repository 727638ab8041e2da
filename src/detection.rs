//! # Detection Controller
//!
//! Owns the detection lifecycle and the polling loop that turns camera frames
//! into emotion events.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized -> LoadingModel -> AcquiringSensor -> Live
//!                                        |              |
//!                                        v              v  (detector failure / no face)
//!                                  SensorDenied(reason) <-
//! any state -> Stopped -> (activate) -> Uninitialized -> ...
//! ```
//!
//! A failed model load does not block camera acquisition; the failure shows up
//! on the first live tick instead. Camera denial and detector failure both move
//! the session to the synthetic generator for the rest of the session.
//!
//! ## Threading
//!
//! The loop runs on a dedicated worker thread that owns the camera and the
//! detector while active and hands them back when it exits. Results reach
//! subscribers over `mpsc` channels. An event is published only when the
//! dominant emotion differs from the previously published one.
//!
//! ## Cancellation
//!
//! [`DetectionController::deactivate`] signals the worker and joins it. The
//! signal is observed at the next tick boundary; a tick already in flight runs
//! to completion and its result is discarded. Once `deactivate` returns, no
//! further ticks are scheduled and the camera has been released.

use crate::algorithm::aggregate;
use crate::emotion::{EmotionLabel, EmotionResult};
use crate::error::{PipelineError, Result};
use crate::sensor::{Camera, EmotionDetector, NullDetector, SensorLease, UnavailableCamera};
use crate::synthetic::SyntheticEmotionGenerator;
use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Lifecycle of the detection controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DetectionState {
    Uninitialized,
    LoadingModel,
    AcquiringSensor,
    Live,
    /// Degraded mode driven by the synthetic generator.
    SensorDenied(String),
    Stopped,
}

impl DetectionState {
    /// Whether the camera is held in this state.
    #[must_use]
    pub fn holds_sensor(&self) -> bool {
        matches!(self, DetectionState::Live)
    }
}

/// Where an emitted emotion came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionSource {
    Live,
    Synthetic,
}

impl EmotionSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EmotionSource::Live => "live",
            EmotionSource::Synthetic => "synthetic",
        }
    }
}

/// Events published to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionEvent {
    /// The lifecycle moved. `SensorDenied` doubles as the one-time
    /// permission notice shown next to the synthetic-mode indicator.
    StateChanged(DetectionState),
    /// The dominant emotion changed.
    Emotion {
        result: EmotionResult,
        source: EmotionSource,
    },
}

/// Polling cadence.
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// Delay between live ticks.
    pub live_interval: Duration,
    /// Delay between synthetic ticks.
    pub synthetic_interval: Duration,
    /// Seed for reproducible synthetic confidences.
    pub synthetic_seed: Option<u64>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            live_interval: Duration::from_millis(1000),
            synthetic_interval: Duration::from_millis(3000),
            synthetic_seed: None,
        }
    }
}

struct Sensors {
    camera: Box<dyn Camera>,
    detector: Box<dyn EmotionDetector>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State visible to both the controller and its worker. Single writer at a
/// time: the worker while running, the controller otherwise.
struct Shared {
    state: Mutex<DetectionState>,
    latest: Mutex<Option<EmotionResult>>,
    subscribers: Mutex<Vec<Sender<DetectionEvent>>>,
}

impl Shared {
    fn transition(&self, next: DetectionState) {
        {
            let mut state = lock(&self.state);
            if *state == next {
                return;
            }
            info!("Detection state: {:?} -> {next:?}", *state);
            *state = next.clone();
        }
        self.publish(DetectionEvent::StateChanged(next));
    }

    fn publish(&self, event: DetectionEvent) {
        lock(&self.subscribers).retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// Applies re-emission suppression and publishes results.
struct Emitter {
    shared: Arc<Shared>,
    last_dominant: Option<EmotionLabel>,
}

impl Emitter {
    fn emit(&mut self, result: EmotionResult, source: EmotionSource) {
        *lock(&self.shared.latest) = Some(result.clone());

        if self.last_dominant == Some(result.dominant) {
            debug!(
                "Dominant emotion unchanged ({}, {:.2}), not re-emitting",
                result.dominant, result.confidence
            );
            return;
        }

        info!(
            "Mood changed to {} ({:.0}% confidence, {} source)",
            result.dominant,
            result.confidence * 100.0,
            source.as_str()
        );
        self.last_dominant = Some(result.dominant);
        self.shared.publish(DetectionEvent::Emotion { result, source });
    }
}

enum LiveExit {
    Stopped,
    Degraded(String),
}

struct DetectionWorker {
    config: DetectionConfig,
    shared: Arc<Shared>,
    sensors: Sensors,
    stop_rx: Receiver<()>,
    emitter: Emitter,
}

/// Block until the next tick is due. `false` once a stop was requested.
fn await_tick(stop_rx: &Receiver<()>, interval: Duration) -> bool {
    matches!(stop_rx.recv_timeout(interval), Err(RecvTimeoutError::Timeout))
}

/// Non-blocking stop check, used after an in-flight tick completes.
fn stop_requested(stop_rx: &Receiver<()>) -> bool {
    !matches!(stop_rx.try_recv(), Err(TryRecvError::Empty))
}

impl DetectionWorker {
    fn run(mut self) -> Sensors {
        self.shared.transition(DetectionState::LoadingModel);
        match self.sensors.detector.load_model() {
            Ok(()) => info!("Emotion model loaded"),
            Err(e) => warn!("Emotion model unavailable, continuing to camera: {e}"),
        }
        if stop_requested(&self.stop_rx) {
            return self.sensors;
        }

        self.shared.transition(DetectionState::AcquiringSensor);
        let reason = match self.run_live() {
            LiveExit::Stopped => return self.sensors,
            LiveExit::Degraded(reason) => reason,
        };
        if stop_requested(&self.stop_rx) {
            debug!("Discarding sensor failure reported after stop request: {reason}");
            return self.sensors;
        }

        warn!("Falling back to synthetic emotions: {reason}");
        self.shared.transition(DetectionState::SensorDenied(reason));
        self.run_synthetic();
        self.sensors
    }

    fn run_live(&mut self) -> LiveExit {
        let mut lease = match SensorLease::acquire(self.sensors.camera.as_mut()) {
            Ok(lease) => lease,
            Err(e) => return LiveExit::Degraded(e.to_string()),
        };
        if stop_requested(&self.stop_rx) {
            return LiveExit::Stopped;
        }
        self.shared.transition(DetectionState::Live);

        loop {
            if !await_tick(&self.stop_rx, self.config.live_interval) {
                return LiveExit::Stopped;
            }

            let detector = &mut self.sensors.detector;
            let outcome = lease.capture().and_then(|frame| {
                debug!("Live tick on frame {}", frame.sequence);
                detector.detect(&frame)
            });

            match outcome {
                Ok(Some(scores)) => {
                    let result = aggregate(&scores);
                    if stop_requested(&self.stop_rx) {
                        debug!("Discarding tick completed after stop request");
                        return LiveExit::Stopped;
                    }
                    self.emitter.emit(result, EmotionSource::Live);
                }
                Ok(None) => return LiveExit::Degraded("no face detected".to_string()),
                Err(e) => return LiveExit::Degraded(e.to_string()),
            }
        }
    }

    fn run_synthetic(&mut self) {
        let mut generator = match self.config.synthetic_seed {
            Some(seed) => SyntheticEmotionGenerator::with_seed(seed),
            None => SyntheticEmotionGenerator::new(),
        };

        while await_tick(&self.stop_rx, self.config.synthetic_interval) {
            let result = generator.next_result();
            if stop_requested(&self.stop_rx) {
                return;
            }
            self.emitter.emit(result, EmotionSource::Synthetic);
        }
    }
}

struct RunningWorker {
    stop_tx: Sender<()>,
    handle: JoinHandle<Sensors>,
}

/// Drives emotion detection and publishes mood changes.
///
/// # Examples
///
/// ```no_run
/// use moodtune::detection::{DetectionConfig, DetectionController, DetectionEvent};
/// use moodtune::sensor::{NullDetector, UnavailableCamera};
///
/// let mut controller =
///     DetectionController::new(UnavailableCamera, NullDetector, DetectionConfig::default());
/// let events = controller.subscribe();
/// controller.activate()?;
///
/// for event in events.iter().take(3) {
///     if let DetectionEvent::Emotion { result, .. } = event {
///         println!("now feeling {}", result.dominant);
///     }
/// }
/// controller.deactivate();
/// # Ok::<(), moodtune::error::PipelineError>(())
/// ```
pub struct DetectionController {
    config: DetectionConfig,
    shared: Arc<Shared>,
    sensors: Option<Sensors>,
    worker: Option<RunningWorker>,
}

impl DetectionController {
    pub fn new(
        camera: impl Camera + 'static,
        detector: impl EmotionDetector + 'static,
        config: DetectionConfig,
    ) -> Self {
        Self {
            config,
            shared: Arc::new(Shared {
                state: Mutex::new(DetectionState::Uninitialized),
                latest: Mutex::new(None),
                subscribers: Mutex::new(Vec::new()),
            }),
            sensors: Some(Sensors {
                camera: Box::new(camera),
                detector: Box::new(detector),
            }),
            worker: None,
        }
    }

    /// Register a new listener. Dropped receivers are pruned on the next event.
    pub fn subscribe(&self) -> Receiver<DetectionEvent> {
        let (tx, rx) = mpsc::channel();
        lock(&self.shared.subscribers).push(tx);
        rx
    }

    #[must_use]
    pub fn state(&self) -> DetectionState {
        lock(&self.shared.state).clone()
    }

    /// Most recent tick result, including ones not re-emitted.
    #[must_use]
    pub fn latest(&self) -> Option<EmotionResult> {
        lock(&self.shared.latest).clone()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Start the lifecycle. From `Stopped` it restarts at `Uninitialized`.
    ///
    /// # Errors
    ///
    /// [`PipelineError::ControllerBusy`] if the loop is already running.
    pub fn activate(&mut self) -> Result<()> {
        if self.worker.is_some() {
            return Err(PipelineError::ControllerBusy);
        }

        self.shared.transition(DetectionState::Uninitialized);

        let sensors = self.sensors.take().unwrap_or_else(|| {
            warn!("Sensors lost by a crashed worker, continuing without camera");
            Sensors {
                camera: Box::new(UnavailableCamera),
                detector: Box::new(NullDetector),
            }
        });
        let (stop_tx, stop_rx) = mpsc::channel();
        let worker = DetectionWorker {
            config: self.config.clone(),
            shared: Arc::clone(&self.shared),
            sensors,
            stop_rx,
            emitter: Emitter {
                shared: Arc::clone(&self.shared),
                last_dominant: None,
            },
        };

        let handle = thread::Builder::new()
            .name("moodtune-detection".to_string())
            .spawn(move || worker.run())
            .map_err(|e| PipelineError::SensorUnavailable(format!("cannot spawn detection loop: {e}")))?;

        self.worker = Some(RunningWorker { stop_tx, handle });
        Ok(())
    }

    /// Stop the loop, release the camera and move to `Stopped`.
    ///
    /// Blocks until an in-flight tick finishes; its result is discarded.
    pub fn deactivate(&mut self) {
        if let Some(RunningWorker { stop_tx, handle }) = self.worker.take() {
            let held_camera = self.state().holds_sensor();
            // the worker may already be gone, a closed channel also means stop
            let _ = stop_tx.send(());
            match handle.join() {
                Ok(sensors) => {
                    if held_camera {
                        info!("Camera released");
                    }
                    self.sensors = Some(sensors);
                }
                Err(_) => error!("Detection worker panicked, camera state unknown"),
            }
        }

        *lock(&self.shared.latest) = None;
        self.shared.transition(DetectionState::Stopped);
    }
}

impl Drop for DetectionController {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.deactivate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::ScoreMap;
    use crate::sensor::{Frame, FrameStream};
    use crate::synthetic::SYNTHETIC_CYCLE;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    const WAIT: Duration = Duration::from_secs(3);

    #[derive(Default)]
    struct CameraLog {
        acquired: AtomicUsize,
        released: AtomicUsize,
    }

    struct FakeCamera {
        grant: bool,
        log: Arc<CameraLog>,
    }

    struct CountingStream(u64);

    impl FrameStream for CountingStream {
        fn capture(&mut self) -> Result<Frame> {
            self.0 += 1;
            Ok(Frame {
                sequence: self.0,
                data: Vec::new(),
            })
        }
    }

    impl Camera for FakeCamera {
        fn acquire(&mut self) -> Result<Box<dyn FrameStream>> {
            if !self.grant {
                return Err(PipelineError::SensorUnavailable("permission denied".to_string()));
            }
            self.log.acquired.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CountingStream(0)))
        }

        fn release(&mut self, _stream: Box<dyn FrameStream>) {
            self.log.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Plays back scripted outcomes, repeating the last one forever.
    struct ScriptedDetector {
        model_loads: bool,
        script: VecDeque<Option<ScoreMap>>,
        fail_when_done: bool,
    }

    impl EmotionDetector for ScriptedDetector {
        fn load_model(&mut self) -> Result<()> {
            if self.model_loads {
                Ok(())
            } else {
                Err(PipelineError::DetectionFailure("weights missing".to_string()))
            }
        }

        fn detect(&mut self, _frame: &Frame) -> Result<Option<ScoreMap>> {
            if self.script.len() > 1 {
                return Ok(self.script.pop_front().flatten());
            }
            if self.fail_when_done {
                return Err(PipelineError::DetectionFailure("inference crashed".to_string()));
            }
            Ok(self.script.front().cloned().flatten())
        }
    }

    fn scores(label: EmotionLabel, confidence: f64) -> Option<ScoreMap> {
        Some([(label, confidence)].into_iter().collect())
    }

    fn fast_config() -> DetectionConfig {
        DetectionConfig {
            live_interval: Duration::from_millis(5),
            synthetic_interval: Duration::from_millis(10),
            synthetic_seed: Some(42),
        }
    }

    fn next_emotion(rx: &Receiver<DetectionEvent>) -> (EmotionResult, EmotionSource) {
        let deadline = Instant::now() + WAIT;
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(left).expect("emotion event in time") {
                DetectionEvent::Emotion { result, source } => return (result, source),
                DetectionEvent::StateChanged(_) => continue,
            }
        }
    }

    fn wait_for_state(rx: &Receiver<DetectionEvent>, wanted: impl Fn(&DetectionState) -> bool) {
        let deadline = Instant::now() + WAIT;
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            if let DetectionEvent::StateChanged(state) = rx.recv_timeout(left).expect("state change in time") {
                if wanted(&state) {
                    return;
                }
            }
        }
    }

    #[test]
    fn test_starts_uninitialized() {
        let controller = DetectionController::new(UnavailableCamera, NullDetector, fast_config());
        assert_eq!(controller.state(), DetectionState::Uninitialized);
        assert!(!controller.is_running());
        assert!(controller.latest().is_none());
    }

    #[test]
    fn test_camera_denied_runs_synthetic_cycle() {
        let log = Arc::new(CameraLog::default());
        let camera = FakeCamera { grant: false, log: Arc::clone(&log) };
        let mut controller = DetectionController::new(camera, NullDetector, fast_config());
        let rx = controller.subscribe();
        controller.activate().expect("activates");

        wait_for_state(&rx, |s| matches!(s, DetectionState::SensorDenied(_)));
        let (first, source) = next_emotion(&rx);
        assert_eq!(first.dominant, EmotionLabel::Happy);
        assert_eq!(source, EmotionSource::Synthetic);

        for expected in &SYNTHETIC_CYCLE[1..] {
            assert_eq!(next_emotion(&rx).0.dominant, *expected);
        }

        controller.deactivate();
        assert_eq!(controller.state(), DetectionState::Stopped);
        assert_eq!(log.acquired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_lifecycle_order_through_live() {
        let log = Arc::new(CameraLog::default());
        let camera = FakeCamera { grant: true, log: Arc::clone(&log) };
        let detector = ScriptedDetector {
            model_loads: true,
            script: VecDeque::from([scores(EmotionLabel::Angry, 0.9)]),
            fail_when_done: false,
        };
        let mut controller = DetectionController::new(camera, detector, fast_config());
        let rx = controller.subscribe();
        controller.activate().expect("activates");

        let (result, source) = next_emotion(&rx);
        assert_eq!(result.dominant, EmotionLabel::Angry);
        assert_eq!(source, EmotionSource::Live);
        assert_eq!(controller.state(), DetectionState::Live);
        controller.deactivate();

        let states: Vec<_> = rx
            .try_iter()
            .filter_map(|e| match e {
                DetectionEvent::StateChanged(s) => Some(s),
                DetectionEvent::Emotion { .. } => None,
            })
            .collect();
        assert_eq!(states.last(), Some(&DetectionState::Stopped));
        assert_eq!(log.acquired.load(Ordering::SeqCst), 1);
        assert_eq!(log.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_model_failure_still_acquires_camera() {
        let log = Arc::new(CameraLog::default());
        let camera = FakeCamera { grant: true, log: Arc::clone(&log) };
        let detector = ScriptedDetector {
            model_loads: false,
            script: VecDeque::from([scores(EmotionLabel::Sad, 0.7)]),
            fail_when_done: false,
        };
        let mut controller = DetectionController::new(camera, detector, fast_config());
        let rx = controller.subscribe();
        controller.activate().expect("activates");

        wait_for_state(&rx, |s| *s == DetectionState::Live);
        assert_eq!(log.acquired.load(Ordering::SeqCst), 1);
        controller.deactivate();
    }

    #[test]
    fn test_unchanged_dominant_is_not_re_emitted() {
        let camera = FakeCamera { grant: true, log: Arc::default() };
        let detector = ScriptedDetector {
            model_loads: true,
            script: VecDeque::from([
                scores(EmotionLabel::Happy, 0.9),
                scores(EmotionLabel::Happy, 0.55),
                scores(EmotionLabel::Sad, 0.8),
            ]),
            fail_when_done: false,
        };
        let mut controller = DetectionController::new(camera, detector, fast_config());
        let rx = controller.subscribe();
        controller.activate().expect("activates");

        assert_eq!(next_emotion(&rx).0.dominant, EmotionLabel::Happy);
        assert_eq!(next_emotion(&rx).0.dominant, EmotionLabel::Sad);

        // the detector keeps answering `sad`; give it plenty of ticks
        thread::sleep(Duration::from_millis(60));
        controller.deactivate();
        let extra = rx
            .try_iter()
            .filter(|e| matches!(e, DetectionEvent::Emotion { .. }))
            .count();
        assert_eq!(extra, 0);
    }

    #[test]
    fn test_detector_failure_falls_back_permanently() {
        let log = Arc::new(CameraLog::default());
        let camera = FakeCamera { grant: true, log: Arc::clone(&log) };
        let detector = ScriptedDetector {
            model_loads: true,
            script: VecDeque::from([scores(EmotionLabel::Sad, 0.8)]),
            fail_when_done: true,
        };
        let mut controller = DetectionController::new(camera, detector, fast_config());
        let rx = controller.subscribe();
        controller.activate().expect("activates");

        wait_for_state(&rx, |s| matches!(s, DetectionState::SensorDenied(_)));
        assert_eq!(log.released.load(Ordering::SeqCst), 1, "camera released before fallback");

        let (result, source) = next_emotion(&rx);
        assert_eq!(source, EmotionSource::Synthetic);
        assert_eq!(result.dominant, EmotionLabel::Happy);
        controller.deactivate();
        assert_eq!(log.acquired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_no_face_falls_back_to_synthetic() {
        let camera = FakeCamera { grant: true, log: Arc::default() };
        let detector = ScriptedDetector {
            model_loads: true,
            script: VecDeque::from([None]),
            fail_when_done: false,
        };
        let mut controller = DetectionController::new(camera, detector, fast_config());
        let rx = controller.subscribe();
        controller.activate().expect("activates");

        wait_for_state(&rx, |s| *s == DetectionState::SensorDenied("no face detected".to_string()));
        assert_eq!(next_emotion(&rx).1, EmotionSource::Synthetic);
        controller.deactivate();
    }

    #[test]
    fn test_no_events_after_deactivate() {
        let mut controller = DetectionController::new(UnavailableCamera, NullDetector, fast_config());
        let rx = controller.subscribe();
        controller.activate().expect("activates");
        next_emotion(&rx);
        controller.deactivate();

        // drain everything published up to and including `Stopped`
        let drained: Vec<_> = rx.try_iter().collect();
        assert_eq!(drained.last(), Some(&DetectionEvent::StateChanged(DetectionState::Stopped)));
        assert!(controller.latest().is_none());

        thread::sleep(Duration::from_millis(40));
        assert!(rx.try_recv().is_err());
    }

    /// Answers `happy` once, then holds every later `detect` call for `hold`.
    struct BlockingDetector {
        calls: usize,
        entered: Sender<()>,
        hold: Duration,
        then: Option<ScoreMap>,
    }

    impl EmotionDetector for BlockingDetector {
        fn load_model(&mut self) -> Result<()> {
            Ok(())
        }

        fn detect(&mut self, _frame: &Frame) -> Result<Option<ScoreMap>> {
            self.calls += 1;
            if self.calls == 1 {
                return Ok(scores(EmotionLabel::Happy, 0.9));
            }
            let _ = self.entered.send(());
            thread::sleep(self.hold);
            match &self.then {
                Some(scores) => Ok(Some(scores.clone())),
                None => Err(PipelineError::DetectionFailure("inference crashed".to_string())),
            }
        }
    }

    /// Deactivate while the second tick is inside the detector and return
    /// every event published after the first emotion.
    fn deactivate_mid_tick(then: Option<ScoreMap>) -> Vec<DetectionEvent> {
        let (entered_tx, entered_rx) = mpsc::channel();
        let camera = FakeCamera { grant: true, log: Arc::default() };
        let detector = BlockingDetector {
            calls: 0,
            entered: entered_tx,
            hold: Duration::from_millis(150),
            then,
        };
        let mut controller = DetectionController::new(camera, detector, fast_config());
        let rx = controller.subscribe();
        controller.activate().expect("activates");

        assert_eq!(next_emotion(&rx).0.dominant, EmotionLabel::Happy);
        entered_rx.recv_timeout(WAIT).expect("second tick started");
        controller.deactivate();
        rx.try_iter().collect()
    }

    #[test]
    fn test_in_flight_result_is_discarded_on_deactivate() {
        let after = deactivate_mid_tick(scores(EmotionLabel::Sad, 0.9));
        assert_eq!(after, vec![DetectionEvent::StateChanged(DetectionState::Stopped)]);
    }

    #[test]
    fn test_in_flight_failure_does_not_degrade_after_deactivate() {
        let after = deactivate_mid_tick(None);
        assert_eq!(after, vec![DetectionEvent::StateChanged(DetectionState::Stopped)]);
    }

    #[test]
    fn test_activate_twice_is_busy() {
        let mut controller = DetectionController::new(UnavailableCamera, NullDetector, fast_config());
        controller.activate().expect("first activation");
        assert!(matches!(controller.activate(), Err(PipelineError::ControllerBusy)));
        controller.deactivate();
    }

    #[test]
    fn test_reactivation_restarts_lifecycle_and_cycle() {
        let log = Arc::new(CameraLog::default());
        let camera = FakeCamera { grant: false, log: Arc::clone(&log) };
        let mut controller = DetectionController::new(camera, NullDetector, fast_config());
        let rx = controller.subscribe();

        controller.activate().expect("activates");
        assert_eq!(next_emotion(&rx).0.dominant, EmotionLabel::Happy);
        assert_eq!(next_emotion(&rx).0.dominant, EmotionLabel::Sad);
        controller.deactivate();
        rx.try_iter().for_each(drop);

        controller.activate().expect("reactivates");
        assert_eq!(
            rx.recv_timeout(WAIT).expect("restart event"),
            DetectionEvent::StateChanged(DetectionState::Uninitialized)
        );
        assert_eq!(next_emotion(&rx).0.dominant, EmotionLabel::Happy);
        controller.deactivate();
    }

    #[test]
    fn test_deactivate_without_activation() {
        let mut controller = DetectionController::new(UnavailableCamera, NullDetector, fast_config());
        controller.deactivate();
        assert_eq!(controller.state(), DetectionState::Stopped);
    }

    #[test]
    fn test_only_live_holds_sensor() {
        assert!(DetectionState::Live.holds_sensor());
        assert!(!DetectionState::AcquiringSensor.holds_sensor());
        assert!(!DetectionState::SensorDenied("x".to_string()).holds_sensor());
    }
}
