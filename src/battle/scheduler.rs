//! Battle scheduling
//!
//! Two timers drive battles:
//! - a steady-state timer that fires on the next local wall-clock hour
//!   boundary and then every `interval`
//! - a one-shot startup timer (`startup_delay` after boot) armed only when a
//!   battle is owed: inputs exist and either no battle has ever happened or
//!   the last one is at least `interval` old
//!
//! The scheduler only decides *when*. Whether a fire actually produces a
//! battle is up to the caller's guard and preconditions.

use chrono::{DateTime, Duration, FixedOffset, Utc};

use crate::core::calendar::{local_offset, next_hour_boundary};
use crate::core::config::ExhibitConfig;

/// Why a timer fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerFire {
    /// Startup / catch-up one-shot
    Startup,
    /// Steady-state hourly timer
    Hourly,
}

/// Observable scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    /// No one-shot pending; only the steady timer is waiting
    Idle,
    /// A startup / catch-up battle is pending
    Armed,
    /// A fire is being handled right now; visible to `fire_due` handlers
    Running,
}

#[derive(Debug, Clone)]
pub struct BattleScheduler {
    interval: Duration,
    startup_at: Option<DateTime<Utc>>,
    next_hourly: DateTime<Utc>,
    running: bool,
}

impl BattleScheduler {
    /// Set up both timers as of `now`, with hours counted at `offset`
    pub fn start(
        now: DateTime<Utc>,
        offset: FixedOffset,
        total_input_count: u32,
        last_battle_time: Option<DateTime<Utc>>,
        interval: Duration,
        startup_delay: Duration,
    ) -> Self {
        let owed = match (total_input_count, last_battle_time) {
            (0, _) => false,
            (_, None) => true,
            (_, Some(last)) => now - last >= interval,
        };
        let startup_at = owed.then(|| now + startup_delay);

        if let Some(at) = startup_at {
            tracing::info!(%at, "Startup battle armed");
        }

        Self {
            interval,
            startup_at,
            next_hourly: next_hour_boundary(now, offset),
            running: false,
        }
    }

    /// Scheduler on the machine's local clock
    pub fn from_config(
        config: &ExhibitConfig,
        now: DateTime<Utc>,
        total_input_count: u32,
        last_battle_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self::with_offset(
            config,
            now,
            local_offset(now),
            total_input_count,
            last_battle_time,
        )
    }

    pub fn with_offset(
        config: &ExhibitConfig,
        now: DateTime<Utc>,
        offset: FixedOffset,
        total_input_count: u32,
        last_battle_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self::start(
            now,
            offset,
            total_input_count,
            last_battle_time,
            config.battle_interval(),
            config.battle_startup_delay(),
        )
    }

    pub fn phase(&self) -> SchedulerPhase {
        if self.running {
            SchedulerPhase::Running
        } else if self.startup_at.is_some() {
            SchedulerPhase::Armed
        } else {
            SchedulerPhase::Idle
        }
    }

    /// Earliest instant at which something will fire
    pub fn next_deadline(&self) -> DateTime<Utc> {
        match self.startup_at {
            Some(at) => at.min(self.next_hourly),
            None => self.next_hourly,
        }
    }

    pub fn next_hourly(&self) -> DateTime<Utc> {
        self.next_hourly
    }

    pub fn startup_at(&self) -> Option<DateTime<Utc>> {
        self.startup_at
    }

    /// Timers due at `now`, in firing order; advances their deadlines
    ///
    /// A steady timer that fell several intervals behind fires once and
    /// resumes on the next future slot.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<TimerFire> {
        let mut due = Vec::new();

        let startup_due = self.startup_at.filter(|at| *at <= now);
        let hourly_due = self.next_hourly <= now;

        match startup_due {
            Some(at) if hourly_due && self.next_hourly < at => {
                due.push(TimerFire::Hourly);
                due.push(TimerFire::Startup);
            }
            Some(_) => {
                due.push(TimerFire::Startup);
                if hourly_due {
                    due.push(TimerFire::Hourly);
                }
            }
            None if hourly_due => due.push(TimerFire::Hourly),
            None => {}
        }

        if startup_due.is_some() {
            self.startup_at = None;
        }
        if hourly_due {
            while self.next_hourly <= now {
                self.next_hourly += self.interval;
            }
        }
        due
    }

    /// Run `handler` for every timer due at `now`; returns how many fired
    ///
    /// The handler sees the scheduler in the `Running` phase with both
    /// deadlines already advanced.
    pub fn fire_due<F>(&mut self, now: DateTime<Utc>, mut handler: F) -> usize
    where
        F: FnMut(TimerFire, &BattleScheduler),
    {
        let due = self.take_due(now);
        self.running = true;
        for fire in &due {
            tracing::debug!(?fire, "Battle timer fired");
            handler(*fire, self);
        }
        self.running = false;
        due.len()
    }

    /// Time left until the next hourly battle
    pub fn time_until_next(&self, now: DateTime<Utc>) -> Duration {
        self.next_hourly - now
    }
}
