//! Simulation thread that runs independently from the consumer.
//!
//! The consumer controls the thread through a [`SimulationHandle`]: speed,
//! pause, single steps and inspect requests are written to shared atomics and
//! a one-slot mailbox, and read by the simulation loop once per frame. State
//! flows the other way through the [`StateBuffer`].

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::core::config::RunnerConfig;
use crate::core::error::{Result, SimError};
use crate::simulation::simulator::Simulator;
use crate::simulation::snapshot::{SimulationState, StateBuffer};

/// Upper bound accepted by [`SimulationHandle::set_updates_per_second`]
pub const MAX_UPDATES_PER_SECOND: u32 = 10_000;

/// Converts elapsed wall-clock time into a number of ticks to run
#[derive(Debug, Clone)]
pub struct RateLimiter {
    accumulated: f64,
    max_ticks_per_frame: u32,
}

impl RateLimiter {
    pub fn new(max_ticks_per_frame: u32) -> Self {
        Self {
            accumulated: 0.0,
            max_ticks_per_frame: max_ticks_per_frame.max(1),
        }
    }

    /// Add `elapsed` and return how many ticks are due at `updates_per_second`
    ///
    /// Ticks beyond `max_ticks_per_frame` are dropped, not deferred.
    pub fn advance(&mut self, elapsed: Duration, updates_per_second: u32) -> u32 {
        if updates_per_second == 0 {
            self.accumulated = 0.0;
            return 0;
        }
        let interval = 1.0 / f64::from(updates_per_second);
        self.accumulated += elapsed.as_secs_f64();

        let due = (self.accumulated / interval).floor();
        let ticks = due.min(f64::from(self.max_ticks_per_frame));
        if due > ticks {
            tracing::warn!(
                "Simulation behind schedule, dropping {} ticks",
                (due - ticks) as u64
            );
            self.accumulated -= due * interval;
        } else {
            self.accumulated -= ticks * interval;
        }
        self.accumulated = self.accumulated.max(0.0);
        ticks as u32
    }

    pub fn reset(&mut self) {
        self.accumulated = 0.0;
    }
}

/// State shared between the handle and the simulation thread
#[derive(Debug)]
struct Control {
    running: AtomicBool,
    paused: AtomicBool,
    updates_per_second: AtomicU32,
    pending_steps: AtomicU32,
    inspect: Mutex<Option<(i32, i32)>>,
}

impl Control {
    fn take_inspect(&self) -> Option<(i32, i32)> {
        self.inspect
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Handle for controlling the simulation thread
pub struct SimulationHandle {
    thread: Option<JoinHandle<Simulator>>,
    control: Arc<Control>,
    buffer: Arc<StateBuffer>,
}

impl SimulationHandle {
    /// Move `sim` onto a new simulation thread
    pub fn spawn(sim: Simulator, config: RunnerConfig) -> Result<Self> {
        config.validate()?;

        let control = Arc::new(Control {
            running: AtomicBool::new(true),
            paused: AtomicBool::new(config.start_paused),
            updates_per_second: AtomicU32::new(config.updates_per_second.min(MAX_UPDATES_PER_SECOND)),
            pending_steps: AtomicU32::new(0),
            inspect: Mutex::new(None),
        });
        let buffer = Arc::new(StateBuffer::new());

        let thread = {
            let control = Arc::clone(&control);
            let buffer = Arc::clone(&buffer);
            thread::Builder::new()
                .name("simulation".into())
                .spawn(move || run_simulation(sim, config, &control, &buffer))
                .map_err(|e| SimError::ThreadSpawn(e.to_string()))?
        };

        Ok(Self {
            thread: Some(thread),
            control,
            buffer,
        })
    }

    pub fn set_updates_per_second(&self, updates_per_second: u32) {
        self.control
            .updates_per_second
            .store(updates_per_second.min(MAX_UPDATES_PER_SECOND), Ordering::Relaxed);
    }

    pub fn updates_per_second(&self) -> u32 {
        self.control.updates_per_second.load(Ordering::Relaxed)
    }

    pub fn pause(&self) {
        self.control.paused.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.control.paused.store(false, Ordering::Release);
    }

    pub fn toggle_pause(&self) {
        self.control.paused.fetch_xor(true, Ordering::AcqRel);
    }

    pub fn is_paused(&self) -> bool {
        self.control.paused.load(Ordering::Acquire)
    }

    /// Run exactly one tick on the next frame. Ignored while running.
    pub fn step(&self) {
        self.control.pending_steps.fetch_add(1, Ordering::AcqRel);
    }

    /// Ask the simulation thread to inspect tile (x, y)
    ///
    /// Replaces any request the thread has not picked up yet.
    pub fn request_inspect(&self, x: i32, y: i32) {
        *self
            .control
            .inspect
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some((x, y));
    }

    /// Copy the latest published state into `state`
    pub fn read_state(&self, state: &mut SimulationState) {
        self.buffer.read_into(state);
    }

    pub fn latest_state(&self) -> SimulationState {
        self.buffer.latest()
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stop the thread and hand the simulator back
    pub fn shutdown(mut self) -> Option<Simulator> {
        self.stop_and_join()
    }

    fn stop_and_join(&mut self) -> Option<Simulator> {
        self.control.running.store(false, Ordering::Release);
        let thread = self.thread.take()?;
        match thread.join() {
            Ok(sim) => Some(sim),
            Err(_) => {
                tracing::error!("Simulation thread panicked");
                None
            }
        }
    }
}

impl Drop for SimulationHandle {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

/// Main simulation loop running in separate thread
fn run_simulation(
    mut sim: Simulator,
    config: RunnerConfig,
    control: &Control,
    buffer: &StateBuffer,
) -> Simulator {
    tracing::info!(
        "Simulation thread started ({} ups, {} cells)",
        control.updates_per_second.load(Ordering::Relaxed),
        sim.active_cell_count()
    );

    let frame = Duration::from_millis(config.frame_interval_ms);
    let mut limiter = RateLimiter::new(config.max_ticks_per_frame);
    let mut back = SimulationState::default();
    let mut selected: Option<(i32, i32)> = None;
    let mut last_frame = Instant::now();

    while control.running.load(Ordering::Acquire) {
        let frame_start = Instant::now();
        let elapsed = frame_start - last_frame;
        last_frame = frame_start;

        if let Some(request) = control.take_inspect() {
            selected = Some(request);
        }

        let paused = control.paused.load(Ordering::Acquire);
        let updates_per_second = control.updates_per_second.load(Ordering::Relaxed);
        let steps = control.pending_steps.swap(0, Ordering::AcqRel);

        let ticks = if paused {
            limiter.reset();
            steps
        } else {
            limiter.advance(elapsed, updates_per_second)
        };

        for _ in 0..ticks {
            let report = sim.update();
            if config.stats_log_interval > 0 && report.tick % config.stats_log_interval == 0 {
                let stats = sim.stats();
                tracing::debug!(
                    tick = stats.tick,
                    population = stats.population,
                    mean_energy = stats.mean_energy,
                    dominant = stats.dominant_gene().unwrap_or("-"),
                    "population stats"
                );
            }
        }

        back.capture(&sim, selected);
        back.paused = paused;
        back.updates_per_second = updates_per_second;
        buffer.publish(&mut back);

        if let Some(remaining) = frame.checked_sub(frame_start.elapsed()) {
            thread::sleep(remaining);
        }
    }

    tracing::info!("Simulation thread stopped at tick {}", sim.current_tick());
    sim
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_mailbox_survives_poisoned_lock() {
        let control = Arc::new(Control {
            running: AtomicBool::new(true),
            paused: AtomicBool::new(false),
            updates_per_second: AtomicU32::new(30),
            pending_steps: AtomicU32::new(0),
            inspect: Mutex::new(Some((1, 1))),
        });
        let poisoner = Arc::clone(&control);
        let result = thread::spawn(move || {
            let _guard = poisoner.inspect.lock().unwrap();
            panic!("panicked while holding the inspect lock");
        })
        .join();
        assert!(result.is_err());
        assert!(control.inspect.is_poisoned());

        assert_eq!(control.take_inspect(), Some((1, 1)));
        assert_eq!(control.take_inspect(), None);
    }

    #[test]
    fn test_rate_limiter_counts_ticks() {
        let mut limiter = RateLimiter::new(100);
        assert_eq!(limiter.advance(Duration::from_millis(1050), 10), 10);
        // 50ms carried over, 60ms more makes one more tick
        assert_eq!(limiter.advance(Duration::from_millis(60), 10), 1);
    }

    #[test]
    fn test_rate_limiter_accumulates_partial_frames() {
        let mut limiter = RateLimiter::new(8);
        assert_eq!(limiter.advance(Duration::from_millis(60), 10), 0);
        assert_eq!(limiter.advance(Duration::from_millis(60), 10), 1);
    }

    #[test]
    fn test_rate_limiter_caps_and_drops() {
        let mut limiter = RateLimiter::new(8);
        assert_eq!(limiter.advance(Duration::from_secs(10), 10), 8);
        // the backlog was dropped, not deferred
        assert_eq!(limiter.advance(Duration::from_millis(10), 10), 0);
    }

    #[test]
    fn test_rate_limiter_zero_rate() {
        let mut limiter = RateLimiter::new(8);
        assert_eq!(limiter.advance(Duration::from_secs(5), 0), 0);
        assert_eq!(limiter.advance(Duration::from_millis(50), 10), 0);
    }
}
