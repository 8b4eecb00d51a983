//! Named periodic tasks for the Clicker Clans simulation.
//!
//! The scheduler never touches game state. It only counts ticks and reports
//! which tasks fired, in order; the store applies each one as a single
//! transition.

use crate::time::GameTime;

/// Session timer period.
pub const ELAPSED_PERIOD_MS: u64 = 1_000;
/// Auto Tapper period.
pub const AUTO_TAP_PERIOD_MS: u64 = 1_000;
/// Passive leaderboard growth period.
pub const TEAM_GROWTH_PERIOD_MS: u64 = 2_500;
/// How long a fair-play / season notice stays up.
pub const NOTICE_LIFETIME_MS: u64 = 1_200;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Task {
    Elapsed,
    AutoTap,
    TeamGrowth,
    NoticeExpiry,
}

#[derive(Clone, Debug)]
struct Slot {
    task: Task,
    period: u32,
    /// Ticks until the next firing; `None` while disarmed.
    remaining: Option<u32>,
    repeating: bool,
}

impl Slot {
    fn new(task: Task, period: u32, repeating: bool, armed: bool) -> Self {
        Self {
            task,
            period,
            remaining: armed.then_some(period),
            repeating,
        }
    }
}

pub struct Scheduler {
    time: GameTime,
    slots: Vec<Slot>,
}

impl Scheduler {
    pub fn new(ticks_per_sec: u32) -> Self {
        let time = GameTime::new(ticks_per_sec);
        let slots = vec![
            Slot::new(Task::Elapsed, time.ticks_for_ms(ELAPSED_PERIOD_MS), true, true),
            Slot::new(Task::AutoTap, time.ticks_for_ms(AUTO_TAP_PERIOD_MS), true, false),
            Slot::new(Task::TeamGrowth, time.ticks_for_ms(TEAM_GROWTH_PERIOD_MS), true, true),
            Slot::new(Task::NoticeExpiry, time.ticks_for_ms(NOTICE_LIFETIME_MS), false, false),
        ];
        Self { time, slots }
    }

    pub fn ticks_per_sec(&self) -> u32 {
        self.time.ticks_per_sec()
    }

    pub fn total_ticks(&self) -> u64 {
        self.time.total_ticks
    }

    fn slot_mut(&mut self, task: Task) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|s| s.task == task)
    }

    pub fn is_armed(&self, task: Task) -> bool {
        self.slots
            .iter()
            .any(|s| s.task == task && s.remaining.is_some())
    }

    /// Start (or restart) a task's countdown from a full period.
    pub fn arm(&mut self, task: Task) {
        if let Some(slot) = self.slot_mut(task) {
            slot.remaining = Some(slot.period);
        }
    }

    pub fn disarm(&mut self, task: Task) {
        if let Some(slot) = self.slot_mut(task) {
            slot.remaining = None;
        }
    }

    /// Arm when `wanted` and currently idle, disarm when not wanted.
    /// A running countdown is left alone.
    pub fn keep_armed(&mut self, task: Task, wanted: bool) {
        match (wanted, self.is_armed(task)) {
            (true, false) => self.arm(task),
            (false, true) => self.disarm(task),
            _ => {}
        }
    }

    /// Stop everything.
    pub fn cancel_all(&mut self) {
        for slot in &mut self.slots {
            slot.remaining = None;
        }
    }

    /// Feed wall time; returns the tasks that fired.
    pub fn update(&mut self, now_ms: f64) -> Vec<Task> {
        let ticks = self.time.update(now_ms);
        self.run_ticks(ticks)
    }

    /// Advance by `ticks` without wall time.
    pub fn advance(&mut self, ticks: u32) -> Vec<Task> {
        self.time.add_ticks(ticks);
        self.run_ticks(ticks)
    }

    fn run_ticks(&mut self, ticks: u32) -> Vec<Task> {
        let mut fired = Vec::new();
        for _ in 0..ticks {
            for slot in &mut self.slots {
                let Some(remaining) = slot.remaining else {
                    continue;
                };
                if remaining > 1 {
                    slot.remaining = Some(remaining - 1);
                    continue;
                }
                fired.push(slot.task);
                slot.remaining = slot.repeating.then_some(slot.period);
            }
        }
        fired
    }
}
