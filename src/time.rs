//! Fixed-timestep game clock using an accumulator pattern.
//!
//! The host calls `update()` with a wall-clock timestamp whenever it gets a
//! chance (an animation frame, a timer, a loop iteration). GameTime converts
//! that into a whole number of discrete ticks, so every scheduled task in the
//! game is expressed in ticks and tests can drive it without a real clock.

/// Milliseconds of wall time fed in per call are clamped to this.
const MAX_FRAME_MS: f64 = 500.0;

pub struct GameTime {
    /// Milliseconds per tick (e.g. 100ms = 10 ticks/sec)
    ms_per_tick: f64,
    /// Accumulated milliseconds not yet consumed as ticks
    accumulator: f64,
    /// Total elapsed ticks since creation
    pub total_ticks: u64,
    /// Timestamp of the last update (ms), None if first frame
    last_timestamp: Option<f64>,
}

impl GameTime {
    /// Create a new GameTime with the given tick rate.
    /// `ticks_per_sec`: how many game ticks per real-time second (e.g. 10).
    pub fn new(ticks_per_sec: u32) -> Self {
        Self {
            ms_per_tick: 1000.0 / ticks_per_sec.max(1) as f64,
            accumulator: 0.0,
            total_ticks: 0,
            last_timestamp: None,
        }
    }

    pub fn ticks_per_sec(&self) -> u32 {
        (1000.0 / self.ms_per_tick).round() as u32
    }

    /// Convert a duration to whole ticks, rounding to nearest, at least 1.
    pub fn ticks_for_ms(&self, ms: u64) -> u32 {
        ((ms as f64 / self.ms_per_tick).round() as u32).max(1)
    }

    /// Feed a wall-clock timestamp in milliseconds.
    /// Returns the number of discrete ticks to process this frame.
    pub fn update(&mut self, now_ms: f64) -> u32 {
        let delta = match self.last_timestamp {
            Some(prev) => {
                let d = now_ms - prev;
                // Clamp to avoid spiral-of-death after a long suspend
                d.clamp(0.0, MAX_FRAME_MS)
            }
            None => 0.0, // First frame: no delta
        };
        self.last_timestamp = Some(now_ms);

        self.accumulator += delta;
        let ticks = (self.accumulator / self.ms_per_tick) as u32;
        self.accumulator -= ticks as f64 * self.ms_per_tick;
        self.total_ticks += ticks as u64;
        ticks
    }

    /// Directly add ticks, bypassing wall time.
    pub fn add_ticks(&mut self, ticks: u32) {
        self.total_ticks += ticks as u64;
    }
}

/// Source of epoch milliseconds.
pub trait WallClock {
    fn now_ms(&self) -> u64;
}

/// The real clock: `SystemTime` natively, `Date.now()` in the browser.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    #[cfg(not(target_arch = "wasm32"))]
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64)
    }

    #[cfg(target_arch = "wasm32")]
    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: std::rc::Rc<std::cell::Cell<u64>>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: std::rc::Rc::new(std::cell::Cell::new(start_ms)),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl WallClock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}
