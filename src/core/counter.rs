//! Animated counters for the tally board.
//!
//! Each [`AnimatedCounter`] is a small state machine:
//!
//! * `Idle` - waiting to be seen, displaying 0
//! * `Animating` - visible, stepping toward the target
//! * `Settled` - displaying exactly the target
//!
//! A counter starts animating the first time enough of it is visible, and plays once per
//! target. Retargeting resets it to `Idle` at 0, which also cancels an animation that is
//! still running; the next visibility report starts it over toward the new target. A zero
//! target never leaves `Idle` since there is nothing to count up to.
//!
//! [`BoardPlayer`] drives the three counters of a [`Board`] on a Tokio interval.

use crate::config::settings::CounterSettings;
use crate::core::totals::Totals;
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Shortest time between two frames
pub const MIN_FRAME_INTERVAL: Duration = Duration::from_millis(1);

/// Animation phase of a counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterPhase {
    /// Not yet animated for the current target
    Idle,
    /// Stepping toward the target
    Animating,
    /// Showing the exact target
    Settled,
}

/// Timing shared by every counter of a board
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterTiming {
    /// Total animation time
    pub duration: Duration,
    /// Number of discrete frames
    pub steps: u32,
    /// Visible fraction needed to start
    pub threshold: f64,
}

impl CounterTiming {
    /// Timing from the `[counter]` settings section
    #[must_use]
    pub const fn from_settings(settings: &CounterSettings) -> Self {
        Self {
            duration: settings.duration(),
            steps: settings.steps,
            threshold: settings.visibility_threshold,
        }
    }

    /// Time between two frames, never shorter than [`MIN_FRAME_INTERVAL`]
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        (self.duration / self.steps.max(1)).max(MIN_FRAME_INTERVAL)
    }
}

/// One animated number on the board.
#[derive(Debug, Clone)]
pub struct AnimatedCounter {
    target: u64,
    displayed: u64,
    phase: CounterPhase,
    step: u32,
    has_animated: bool,
    timing: CounterTiming,
}

impl AnimatedCounter {
    /// Creates an idle counter showing 0.
    #[must_use]
    pub const fn new(target: u64, timing: CounterTiming) -> Self {
        Self {
            target,
            displayed: 0,
            phase: CounterPhase::Idle,
            step: 0,
            has_animated: false,
            timing,
        }
    }

    /// Value the counter is heading to
    #[must_use]
    pub const fn target(&self) -> u64 {
        self.target
    }

    /// Value currently shown
    #[must_use]
    pub const fn displayed(&self) -> u64 {
        self.displayed
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> CounterPhase {
        self.phase
    }

    /// Timing this counter animates with
    #[must_use]
    pub const fn timing(&self) -> CounterTiming {
        self.timing
    }

    /// Changes the target. A different value re-arms the counter at 0.
    pub const fn set_target(&mut self, target: u64) {
        if target == self.target {
            return;
        }
        self.target = target;
        self.displayed = 0;
        self.phase = CounterPhase::Idle;
        self.step = 0;
        self.has_animated = false;
    }

    /// Reports how much of the counter is visible. Returns true if this started an animation.
    pub fn observe_intersection(&mut self, ratio: f64) -> bool {
        if ratio < self.timing.threshold || self.has_animated || self.target == 0 {
            return false;
        }
        self.has_animated = true;
        self.phase = CounterPhase::Animating;
        self.step = 0;
        true
    }

    /// Advances one frame. Returns the new displayed value, or `None` when not animating.
    pub fn tick(&mut self) -> Option<u64> {
        if self.phase != CounterPhase::Animating {
            return None;
        }
        let steps = self.timing.steps.max(1);
        self.step += 1;
        if self.step >= steps {
            self.displayed = self.target;
            self.phase = CounterPhase::Settled;
        } else {
            self.displayed = interpolate(self.target, self.step, steps);
        }
        Some(self.displayed)
    }
}

/// `floor(target * step / steps)` without overflow.
fn interpolate(target: u64, step: u32, steps: u32) -> u64 {
    let value = u128::from(target) * u128::from(step) / u128::from(steps);
    u64::try_from(value).unwrap_or(target)
}

/// Values shown by a board at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardFrame {
    /// Displayed donation total
    pub total_amount: u64,
    /// Displayed donor count
    pub donor_count: u64,
    /// Displayed goal
    pub goal: u64,
}

/// The three counters of the tally board.
#[derive(Debug, Clone)]
pub struct Board {
    total_amount: AnimatedCounter,
    donor_count: AnimatedCounter,
    goal: AnimatedCounter,
}

impl Board {
    /// Idle board targeting `totals`
    #[must_use]
    pub fn new(totals: &Totals, timing: CounterTiming) -> Self {
        Self {
            total_amount: AnimatedCounter::new(totals.total_amount, timing),
            donor_count: AnimatedCounter::new(count_target(totals), timing),
            goal: AnimatedCounter::new(totals.goal, timing),
        }
    }

    /// Points every counter at fresh totals. Unchanged counters keep their state.
    pub fn retarget(&mut self, totals: &Totals) {
        self.total_amount.set_target(totals.total_amount);
        self.donor_count.set_target(count_target(totals));
        self.goal.set_target(totals.goal);
    }

    /// Reports the board's visible fraction to every counter. True if any started.
    pub fn observe_intersection(&mut self, ratio: f64) -> bool {
        let mut started = false;
        for counter in self.counters_mut() {
            started |= counter.observe_intersection(ratio);
        }
        started
    }

    /// Advances every animating counter. True while any is still animating.
    pub fn tick(&mut self) -> bool {
        for counter in self.counters_mut() {
            counter.tick();
        }
        self.is_animating()
    }

    /// True while any counter is animating
    #[must_use]
    pub fn is_animating(&self) -> bool {
        [&self.total_amount, &self.donor_count, &self.goal]
            .iter()
            .any(|counter| counter.phase() == CounterPhase::Animating)
    }

    /// Currently displayed values
    #[must_use]
    pub const fn frame(&self) -> BoardFrame {
        BoardFrame {
            total_amount: self.total_amount.displayed(),
            donor_count: self.donor_count.displayed(),
            goal: self.goal.displayed(),
        }
    }

    /// Frame interval of the board's counters
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        self.total_amount.timing().frame_interval()
    }

    /// Counter for the donation total
    #[must_use]
    pub const fn total_amount(&self) -> &AnimatedCounter {
        &self.total_amount
    }

    /// Counter for the donor count
    #[must_use]
    pub const fn donor_count(&self) -> &AnimatedCounter {
        &self.donor_count
    }

    /// Counter for the goal
    #[must_use]
    pub const fn goal(&self) -> &AnimatedCounter {
        &self.goal
    }

    fn counters_mut(&mut self) -> [&mut AnimatedCounter; 3] {
        [&mut self.total_amount, &mut self.donor_count, &mut self.goal]
    }
}

/// One frame produced by a [`BoardPlayer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayedFrame {
    /// Frame number since the player was created, starting at 1
    pub index: u32,
    /// Values shown after this frame
    pub frame: BoardFrame,
    /// True when this frame settled the last animating counter
    pub settled: bool,
}

impl PlayedFrame {
    /// Whether a renderer pushing every `stride`-th frame should show this one.
    ///
    /// The settling frame is always shown so the final values are exact.
    #[must_use]
    pub const fn is_published(&self, stride: u32) -> bool {
        self.settled || stride <= 1 || self.index % stride == 0
    }
}

/// Drives a [`Board`] in real time, one frame per [`CounterTiming::frame_interval`].
///
/// The player owns the board, so a renderer retargets through it between frames. A
/// retarget that changes a counter mid-animation discards the running interpolation and
/// the counter starts over from 0 on the next frame.
#[derive(Debug)]
pub struct BoardPlayer {
    board: Board,
    interval: Interval,
    visible_ratio: f64,
    frame_index: u32,
}

impl BoardPlayer {
    /// Player for `board`, which reports `visible_ratio` on every frame.
    #[must_use]
    pub fn new(board: Board, visible_ratio: f64) -> Self {
        let period = board.frame_interval();
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            board,
            interval,
            visible_ratio,
            frame_index: 0,
        }
    }

    /// The board being played
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Points the board at fresh totals.
    pub fn retarget(&mut self, totals: &Totals) {
        self.board.retarget(totals);
    }

    /// Waits for and plays the next frame.
    ///
    /// Returns `None` without waiting when nothing is left to animate. Starting a new
    /// animation after an idle period schedules its first frame one interval from now.
    pub async fn next_frame(&mut self) -> Option<PlayedFrame> {
        let was_animating = self.board.is_animating();
        self.board.observe_intersection(self.visible_ratio);
        if !self.board.is_animating() {
            return None;
        }
        if !was_animating {
            self.interval.reset();
        }

        self.interval.tick().await;
        let animating = self.board.tick();
        self.frame_index = self.frame_index.wrapping_add(1);
        Some(PlayedFrame {
            index: self.frame_index,
            frame: self.board.frame(),
            settled: !animating,
        })
    }
}

fn count_target(totals: &Totals) -> u64 {
    u64::try_from(totals.donor_count).unwrap_or(u64::MAX)
}
