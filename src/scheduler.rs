/// Debounced single-flight scheduling of recompute passes
use std::cell::Cell;

/// Quiet period after the last trigger before a pass runs.
pub const DEBOUNCE_MS: u32 = 400;

/// How long the mutation guard stays up after tabs were moved or regrouped, so the events the
/// browser emits for our own mutations do not start another arrange.
pub const MUTATION_COOLDOWN_MS: f64 = 250.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Scheduled,
    Running,
    /// A trigger arrived while a pass was running; one more pass follows it.
    PendingRerun,
}

/// Identifies one trigger; only the newest ticket may start a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// What the holder of a ticket should do once its debounce delay has elapsed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Begin {
    /// Run the pass now.
    Run,
    /// A newer trigger (or the running pass) owns the next run; drop this ticket.
    Stale,
    /// A mutation is cooling down; retry after this many milliseconds.
    Wait(f64),
}

/// "Mutation in progress" flag with a trailing cooldown
#[derive(Debug, Default)]
pub struct MutationGuard {
    mutating: Cell<bool>,
    cooldown_until: Cell<f64>,
}

impl MutationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self, now: f64) -> bool {
        self.mutating.get() || now < self.cooldown_until.get()
    }

    /// Milliseconds until the guard clears, zero when it is free.
    pub fn remaining(&self, now: f64) -> f64 {
        if self.mutating.get() {
            MUTATION_COOLDOWN_MS
        } else {
            (self.cooldown_until.get() - now).max(0.0)
        }
    }

    /// Take the guard; false when a mutation is in flight or cooling down.
    pub fn try_acquire(&self, now: f64) -> bool {
        if self.is_busy(now) {
            return false;
        }
        self.mutating.set(true);
        true
    }

    /// Drop the guard; it stays busy for the cooldown period.
    pub fn release(&self, now: f64) {
        self.mutating.set(false);
        self.cooldown_until.set(now + MUTATION_COOLDOWN_MS);
    }
}

/// Idle → Scheduled → Running → Idle, or → PendingRerun → Scheduled
#[derive(Debug)]
pub struct Scheduler {
    state: Cell<SchedulerState>,
    generation: Cell<u64>,
    guard: MutationGuard,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler {
            state: Cell::new(SchedulerState::Idle),
            generation: Cell::new(0),
            guard: MutationGuard::new(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state.get()
    }

    pub fn guard(&self) -> &MutationGuard {
        &self.guard
    }

    /// Register a trigger. Restarts the debounce window: older tickets become stale.
    pub fn request(&self) -> Ticket {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);

        match self.state.get() {
            SchedulerState::Running | SchedulerState::PendingRerun => {
                self.state.set(SchedulerState::PendingRerun)
            }
            SchedulerState::Idle | SchedulerState::Scheduled => {
                self.state.set(SchedulerState::Scheduled)
            }
        }
        Ticket(generation)
    }

    /// Called once a ticket's debounce delay has elapsed.
    pub fn begin(&self, ticket: Ticket, now: f64) -> Begin {
        if ticket.0 != self.generation.get() {
            return Begin::Stale;
        }
        match self.state.get() {
            // The running pass picks the trigger up through PendingRerun
            SchedulerState::Running | SchedulerState::PendingRerun => Begin::Stale,
            SchedulerState::Idle | SchedulerState::Scheduled => {
                if self.guard.is_busy(now) {
                    return Begin::Wait(self.guard.remaining(now));
                }
                self.state.set(SchedulerState::Running);
                Begin::Run
            }
        }
    }

    /// Ask for one more pass after the current one.
    pub fn mark_pending(&self) {
        if self.state.get() == SchedulerState::Running {
            self.state.set(SchedulerState::PendingRerun);
        }
    }

    /// End the running pass. Returns a fresh ticket when another pass was requested meanwhile.
    pub fn finish(&self) -> Option<Ticket> {
        match self.state.get() {
            SchedulerState::PendingRerun => {
                self.state.set(SchedulerState::Idle);
                Some(self.request())
            }
            _ => {
                self.state.set(SchedulerState::Idle);
                None
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
