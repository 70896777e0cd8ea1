use std::collections::HashMap;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Named timer slots owned by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerSlot {
    /// Candidate inactivity window before the next AI turn
    Idle,
    /// Periodic liveness signal for the transcription connection
    KeepAlive,
}

struct TimerEntry {
    generation: u64,
    handle: JoinHandle<()>,
}

/// At most one live timer per slot; starting a slot cancels its predecessor.
///
/// Timer tasks never touch session state. They call the supplied notifier
/// with `(slot, generation)`, and the owner checks `is_current` before acting
/// so a firing that raced a cancellation is ignored.
#[derive(Default)]
pub struct TimerRegistry {
    slots: HashMap<TimerSlot, TimerEntry>,
    next_generation: u64,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a one-shot timer in `slot`, cancelling whatever ran there
    pub fn start_once<F>(&mut self, slot: TimerSlot, delay: Duration, on_fire: F) -> u64
    where
        F: FnOnce(TimerSlot, u64) + Send + 'static,
    {
        self.cancel(slot);
        let generation = self.bump();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire(slot, generation);
        });

        debug!("Timer {:?} started (gen={}, delay={:?})", slot, generation, delay);
        self.slots.insert(slot, TimerEntry { generation, handle });
        generation
    }

    /// Start a repeating timer whose first tick is one `period` from now
    pub fn start_interval<F>(&mut self, slot: TimerSlot, period: Duration, on_tick: F) -> u64
    where
        F: Fn(TimerSlot, u64) + Send + 'static,
    {
        self.cancel(slot);
        let generation = self.bump();

        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            loop {
                interval.tick().await;
                on_tick(slot, generation);
            }
        });

        debug!("Interval {:?} started (gen={}, period={:?})", slot, generation, period);
        self.slots.insert(slot, TimerEntry { generation, handle });
        generation
    }

    /// Cancel the timer in `slot`; returns whether one was running
    pub fn cancel(&mut self, slot: TimerSlot) -> bool {
        match self.slots.remove(&slot) {
            Some(entry) => {
                entry.handle.abort();
                debug!("Timer {:?} cancelled (gen={})", slot, entry.generation);
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (slot, entry) in self.slots.drain() {
            entry.handle.abort();
            debug!("Timer {:?} cancelled (gen={})", slot, entry.generation);
        }
    }

    /// Whether `generation` is still the live timer in `slot`
    pub fn is_current(&self, slot: TimerSlot, generation: u64) -> bool {
        self.slots
            .get(&slot)
            .is_some_and(|entry| entry.generation == generation)
    }

    /// Retire a one-shot timer that fired; false if it was stale
    pub fn complete(&mut self, slot: TimerSlot, generation: u64) -> bool {
        if self.is_current(slot, generation) {
            self.slots.remove(&slot);
            true
        } else {
            false
        }
    }

    pub fn is_armed(&self, slot: TimerSlot) -> bool {
        self.slots.contains_key(&slot)
    }

    /// Number of timers still registered
    pub fn active_count(&self) -> usize {
        self.slots.len()
    }

    fn bump(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}

impl Drop for TimerRegistry {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
