//! Frame clock
//!
//! [`GameClock`] drives two callback lists. Variable callbacks run once per
//! frame with the measured delta; fixed callbacks run with a constant step
//! as many times as the accumulated time allows. All times are in
//! milliseconds.
//!
//! The host's "next frame" primitive is modelled as a pending-frame flag:
//! [`GameClock::start`] schedules a frame, [`GameClock::tick`] consumes it
//! and schedules the next one while the clock is running, and
//! [`GameClock::stop`] cancels whatever is scheduled.

use std::fmt;

use crate::config::{ClockConfig, ConfigError};
use crate::foundation::time::{MonotonicTime, TimeSource};

/// Result of a clock callback; `Err` is logged and counted
pub type CallbackResult = Result<(), Box<dyn std::error::Error>>;

/// Callback receiving the clock context and a delta in milliseconds
pub type ClockCallback<C> = Box<dyn FnMut(&mut C, f64) -> CallbackResult>;

/// Handle returned when registering a callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(u64);

/// What one frame did
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameReport {
    /// Measured time since the previous frame
    pub delta: f64,
    /// Fixed steps run during this frame
    pub fixed_steps: u32,
    /// Callbacks that returned an error
    pub failures: usize,
}

/// Variable and fixed timestep clock
pub struct GameClock<C> {
    time: Box<dyn TimeSource>,
    variable: Vec<(CallbackId, ClockCallback<C>)>,
    fixed: Vec<(CallbackId, ClockCallback<C>)>,
    fixed_time_step: f64,
    max_fixed_steps: Option<u32>,
    accumulator: f64,
    last_time: f64,
    running: bool,
    frame_pending: bool,
    frame_count: u64,
    next_id: u64,
}

impl<C> GameClock<C> {
    /// Create a stopped clock reading the monotonic wall clock
    pub fn new(config: &ClockConfig) -> Self {
        Self::with_time_source(config, Box::new(MonotonicTime::new()))
    }

    /// Create a stopped clock reading the given time source
    pub fn with_time_source(config: &ClockConfig, time: Box<dyn TimeSource>) -> Self {
        Self {
            time,
            variable: Vec::new(),
            fixed: Vec::new(),
            fixed_time_step: config.fixed_time_step(),
            max_fixed_steps: config.max_fixed_steps_per_tick,
            accumulator: 0.0,
            last_time: 0.0,
            running: false,
            frame_pending: false,
            frame_count: 0,
            next_id: 0,
        }
    }

    /// Replace the time source; takes effect on the next `start`
    pub fn set_time_source(&mut self, time: Box<dyn TimeSource>) {
        self.time = time;
    }

    fn next_id(&mut self) -> CallbackId {
        self.next_id += 1;
        CallbackId(self.next_id)
    }

    /// Register a variable-timestep callback
    pub fn add<F>(&mut self, callback: F) -> CallbackId
    where
        F: FnMut(&mut C, f64) -> CallbackResult + 'static,
    {
        let id = self.next_id();
        self.variable.push((id, Box::new(callback)));
        id
    }

    /// Unregister a variable-timestep callback
    pub fn remove(&mut self, id: CallbackId) -> bool {
        remove_callback(&mut self.variable, id)
    }

    /// Register a fixed-timestep callback
    pub fn add_fixed<F>(&mut self, callback: F) -> CallbackId
    where
        F: FnMut(&mut C, f64) -> CallbackResult + 'static,
    {
        let id = self.next_id();
        self.fixed.push((id, Box::new(callback)));
        id
    }

    /// Unregister a fixed-timestep callback
    pub fn remove_fixed(&mut self, id: CallbackId) -> bool {
        remove_callback(&mut self.fixed, id)
    }

    /// Start the clock and schedule the first frame; no-op while running
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.last_time = self.time.now_ms();
        self.frame_pending = true;
        log::debug!("Clock started, fixed step {:.3}ms", self.fixed_time_step);
    }

    /// Stop the clock and cancel the scheduled frame
    pub fn stop(&mut self) {
        if self.running {
            log::debug!("Clock stopped after {} frames", self.frame_count);
        }
        self.running = false;
        self.frame_pending = false;
    }

    /// Drop every callback and reset the accumulator
    pub fn clear(&mut self) {
        self.variable.clear();
        self.fixed.clear();
        self.accumulator = 0.0;
    }

    /// Whether the clock is running
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Whether a frame is scheduled
    pub const fn frame_pending(&self) -> bool {
        self.frame_pending
    }

    /// Frames run since creation
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Time carried over toward the next fixed step
    pub const fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Length of one fixed step
    pub const fn fixed_time_step(&self) -> f64 {
        self.fixed_time_step
    }

    /// Number of registered variable and fixed callbacks
    pub fn callback_count(&self) -> (usize, usize) {
        (self.variable.len(), self.fixed.len())
    }

    /// Change the fixed update rate
    pub fn set_fixed_fps(&mut self, fps: f64) -> Result<(), ConfigError> {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(ConfigError::Invalid(format!("fixed fps must be positive, got {fps}")));
        }
        self.fixed_time_step = 1000.0 / fps;
        Ok(())
    }

    /// Run the scheduled frame, if there is one
    ///
    /// Returns `None` when no frame was pending. While the clock keeps
    /// running, the next frame is scheduled afterwards.
    pub fn tick(&mut self, ctx: &mut C) -> Option<FrameReport> {
        if !self.frame_pending {
            return None;
        }
        self.frame_pending = false;

        let now = self.time.now_ms();
        let delta = now - self.last_time;
        self.last_time = now;
        let report = self.run_frame(ctx, delta);

        if self.running {
            self.frame_pending = true;
        }
        Some(report)
    }

    fn run_frame(&mut self, ctx: &mut C, delta: f64) -> FrameReport {
        self.frame_count += 1;
        let mut failures = run_callbacks(&mut self.variable, ctx, delta, "frame");

        // A negative delta simply fails the comparison below.
        self.accumulator += delta;
        let step = self.fixed_time_step;
        let mut fixed_steps = 0;
        while self.accumulator >= step {
            if self.max_fixed_steps.is_some_and(|max| fixed_steps >= max) {
                let dropped = self.accumulator - self.accumulator % step;
                log::warn!(
                    "Frame {} fell behind: dropping {:.1}ms after {} fixed steps",
                    self.frame_count,
                    dropped,
                    fixed_steps
                );
                self.accumulator %= step;
                break;
            }
            failures += run_callbacks(&mut self.fixed, ctx, step, "fixed step");
            self.accumulator -= step;
            fixed_steps += 1;
        }

        FrameReport {
            delta,
            fixed_steps,
            failures,
        }
    }
}

fn remove_callback<C>(list: &mut Vec<(CallbackId, ClockCallback<C>)>, id: CallbackId) -> bool {
    let before = list.len();
    list.retain(|(existing, _)| *existing != id);
    list.len() != before
}

fn run_callbacks<C>(list: &mut [(CallbackId, ClockCallback<C>)], ctx: &mut C, dt: f64, phase: &str) -> usize {
    let mut failures = 0;
    for (id, callback) in list.iter_mut() {
        if let Err(e) = callback(ctx, dt) {
            log::error!("Clock {} callback {:?} failed: {}", phase, id, e);
            failures += 1;
        }
    }
    failures
}

impl<C> fmt::Debug for GameClock<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameClock")
            .field("running", &self.running)
            .field("frame_pending", &self.frame_pending)
            .field("frame_count", &self.frame_count)
            .field("fixed_time_step", &self.fixed_time_step)
            .field("accumulator", &self.accumulator)
            .field("variable", &self.variable.len())
            .field("fixed", &self.fixed.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::time::ManualTime;
    use approx::assert_relative_eq;

    #[derive(Default)]
    struct Counts {
        variable: Vec<f64>,
        fixed: Vec<f64>,
    }

    fn counting_clock(config: &ClockConfig) -> (GameClock<Counts>, ManualTime) {
        let time = ManualTime::new(1000.0);
        let mut clock = GameClock::with_time_source(config, Box::new(time.clone()));
        clock.add(|counts: &mut Counts, dt| {
            counts.variable.push(dt);
            Ok(())
        });
        clock.add_fixed(|counts: &mut Counts, dt| {
            counts.fixed.push(dt);
            Ok(())
        });
        (clock, time)
    }

    fn unbounded() -> ClockConfig {
        ClockConfig {
            fixed_fps: 60.0,
            max_fixed_steps_per_tick: None,
        }
    }

    #[test]
    fn test_fifty_ms_runs_two_fixed_steps() {
        let (mut clock, time) = counting_clock(&unbounded());
        let mut counts = Counts::default();
        clock.start();

        time.advance(50.0);
        let report = clock.tick(&mut counts).unwrap();

        assert_eq!(report.fixed_steps, 2);
        assert_eq!(counts.fixed.len(), 2);
        assert_relative_eq!(counts.fixed[0], 1000.0 / 60.0);
        assert_relative_eq!(counts.variable[0], 50.0);
        assert_relative_eq!(clock.accumulator(), 16.666_666_666_666_664, epsilon = 1e-9);
    }

    #[test]
    fn test_short_frame_runs_no_fixed_step() {
        let (mut clock, time) = counting_clock(&unbounded());
        let mut counts = Counts::default();
        clock.start();

        time.advance(10.0);
        let report = clock.tick(&mut counts).unwrap();
        assert_eq!(report.fixed_steps, 0);
        assert!(counts.fixed.is_empty());
        assert_eq!(counts.variable.len(), 1);

        // The remainder carries over.
        time.advance(10.0);
        assert_eq!(clock.tick(&mut counts).unwrap().fixed_steps, 1);
        assert_relative_eq!(clock.accumulator(), 20.0 - 1000.0 / 60.0, epsilon = 1e-9);
    }

    #[test]
    fn test_catch_up_is_capped() {
        let config = ClockConfig {
            fixed_fps: 100.0,
            max_fixed_steps_per_tick: Some(3),
        };
        let (mut clock, time) = counting_clock(&config);
        let mut counts = Counts::default();
        clock.start();

        time.advance(105.0);
        let report = clock.tick(&mut counts).unwrap();

        assert_eq!(report.fixed_steps, 3);
        assert_relative_eq!(clock.accumulator(), 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_negative_delta_passes_through() {
        let (mut clock, time) = counting_clock(&unbounded());
        let mut counts = Counts::default();
        clock.start();

        time.advance(-5.0);
        let report = clock.tick(&mut counts).unwrap();

        assert_relative_eq!(report.delta, -5.0);
        assert_relative_eq!(counts.variable[0], -5.0);
        assert_eq!(report.fixed_steps, 0);
        assert_relative_eq!(clock.accumulator(), -5.0);
    }

    #[test]
    fn test_failing_callback_is_isolated() {
        let time = ManualTime::new(0.0);
        let mut clock: GameClock<Vec<&str>> = GameClock::with_time_source(&unbounded(), Box::new(time.clone()));
        clock.add(|_, _| Err("broken".into()));
        clock.add(|log, _| {
            log.push("second");
            Ok(())
        });
        let mut log = Vec::new();
        clock.start();
        time.advance(1.0);

        let report = clock.tick(&mut log).unwrap();
        assert_eq!(report.failures, 1);
        assert_eq!(log, vec!["second"]);
    }

    #[test]
    fn test_stop_cancels_pending_frame() {
        let (mut clock, time) = counting_clock(&unbounded());
        let mut counts = Counts::default();
        assert!(clock.tick(&mut counts).is_none());

        clock.start();
        clock.start();
        assert!(clock.is_running());
        time.advance(1.0);
        assert!(clock.tick(&mut counts).is_some());
        assert!(clock.frame_pending());

        clock.stop();
        assert!(!clock.frame_pending());
        assert!(clock.tick(&mut counts).is_none());
        assert_eq!(clock.frame_count(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let (mut clock, time) = counting_clock(&unbounded());
        let extra = clock.add_fixed(|_, _| Ok(()));
        assert_eq!(clock.callback_count(), (1, 2));
        assert!(clock.remove_fixed(extra));
        assert!(!clock.remove_fixed(extra));

        let mut counts = Counts::default();
        clock.start();
        time.advance(30.0);
        clock.tick(&mut counts);
        clock.clear();

        assert_eq!(clock.callback_count(), (0, 0));
        assert_relative_eq!(clock.accumulator(), 0.0);
    }

    #[test]
    fn test_set_fixed_fps() {
        let (mut clock, _) = counting_clock(&unbounded());
        clock.set_fixed_fps(30.0).unwrap();
        assert_relative_eq!(clock.fixed_time_step(), 1000.0 / 30.0);
        assert!(clock.set_fixed_fps(0.0).is_err());
    }
}
