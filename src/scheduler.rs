//! Single-threaded cooperative timer wheel.
//!
//! A fixed-capacity table of job slots, each identified by a stable [`Handle`]. [`Scheduler::tick`]
//! (the `pf_scheduler_handle_periodic` equivalent) fires every job whose due-time has passed, in
//! due-time order, and lets its callback reschedule itself without the caller needing to track
//! liveness externally — `generation` disambiguates a handle from whatever gets allocated into its
//! slot after it fires or is removed.

use crate::error::FullError;
use crate::MAX_SCHEDULER_JOBS;
use heapless::String as HString;

const NAME_CAP: usize = 32;

/// A stable reference to a scheduler slot. Holds onto the slot's `generation` so that firing (or
/// removing) the job it once named, then scheduling something new into the same slot, can never
/// be confused with the original job by a caller still holding the old handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Handle {
    slot: Option<usize>,
    generation: u32,
}

impl Handle {
    /// A handle that names no job.
    pub const fn empty() -> Self {
        Self { slot: None, generation: 0 }
    }
}

struct Job<Arg> {
    name: HString<NAME_CAP>,
    running: bool,
    generation: u32,
    due_us: u32,
    callback: Option<fn(&mut Arg, u32)>,
}

impl<Arg> Default for Job<Arg> {
    fn default() -> Self {
        Self {
            name: HString::new(),
            running: false,
            generation: 0,
            due_us: 0,
            callback: None,
        }
    }
}

/// Fixed-capacity timer wheel. `Arg` is the user context type threaded through to every
/// callback, mirroring the `(net, arg, current_time)` triple of the original scheduler API.
pub struct Scheduler<Arg> {
    jobs: heapless::Vec<Job<Arg>, MAX_SCHEDULER_JOBS>,
}

impl<Arg> Default for Scheduler<Arg> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Arg> Scheduler<Arg> {
    pub fn new() -> Self {
        let mut jobs = heapless::Vec::new();
        for _ in 0..MAX_SCHEDULER_JOBS {
            let _ = jobs.push(Job::default());
        }
        Self { jobs }
    }

    /// Reset `handle` to the empty, not-running state. The name is only meaningful once a job is
    /// actually scheduled via [`Scheduler::add`], which is where it gets stored.
    pub fn init_handle(&self, handle: &mut Handle) {
        *handle = Handle::empty();
    }

    /// Schedule `callback` to fire `delay_us` from now. Returns [`FullError::Scheduler`] if the
    /// job table has no free slot.
    pub fn add(&mut self, now_us: u32, delay_us: u32, name: &str, callback: fn(&mut Arg, u32), handle: &mut Handle) -> Result<(), FullError> {
        let slot = self.jobs.iter().position(|j| !j.running).ok_or(FullError::Scheduler)?;
        let job = &mut self.jobs[slot];
        job.name = HString::try_from(name).unwrap_or_default();
        job.running = true;
        job.generation = job.generation.wrapping_add(1);
        job.due_us = now_us.wrapping_add(delay_us);
        job.callback = Some(callback);
        *handle = Handle { slot: Some(slot), generation: job.generation };
        Ok(())
    }

    /// Add a new job for `handle`, or reschedule it in place if it is already running.
    pub fn restart(&mut self, now_us: u32, delay_us: u32, name: &str, callback: fn(&mut Arg, u32), handle: &mut Handle) -> Result<(), FullError> {
        if let Some(slot) = self.running_slot(*handle) {
            self.jobs[slot].due_us = now_us.wrapping_add(delay_us);
            self.jobs[slot].callback = Some(callback);
            return Ok(());
        }
        self.add(now_us, delay_us, name, callback, handle)
    }

    fn running_slot(&self, handle: Handle) -> Option<usize> {
        let slot = handle.slot?;
        let job = self.jobs.get(slot)?;
        (job.running && job.generation == handle.generation).then_some(slot)
    }

    /// Cancel `handle`'s job. Logs (rather than panicking) if it was not running.
    pub fn remove(&mut self, handle: &mut Handle) {
        match self.running_slot(*handle) {
            Some(slot) => self.jobs[slot].running = false,
            None => crate::log::debug!("scheduler: remove() on a handle that is not running"),
        }
        *handle = Handle::empty();
    }

    /// Silent no-op variant of [`Scheduler::remove`] for call sites that can't tell in advance
    /// whether the handle is live.
    pub fn remove_if_running(&mut self, handle: &mut Handle) {
        if let Some(slot) = self.running_slot(*handle) {
            self.jobs[slot].running = false;
        }
        *handle = Handle::empty();
    }

    /// Clear `handle` to the empty state without touching the job table. Callbacks call this on
    /// themselves before re-`add`ing, since by the time they run their slot is already free.
    pub fn reset_handle(&self, handle: &mut Handle) {
        *handle = Handle::empty();
    }

    pub fn is_running(&self, handle: Handle) -> bool {
        self.running_slot(handle).is_some()
    }

    pub fn get_name(&self, handle: Handle) -> &str {
        match handle.slot.and_then(|s| self.jobs.get(s)) {
            Some(job) => job.name.as_str(),
            None => "",
        }
    }

    /// Implementation-detail introspection value: the 1-based slot index while running, or
    /// `u32::MAX` otherwise.
    pub fn get_value(&self, handle: Handle) -> u32 {
        match self.running_slot(handle) {
            Some(slot) => slot as u32 + 1,
            None => u32::MAX,
        }
    }

    /// Fire every job whose due-time has passed, in due-time order. A callback may call
    /// [`Scheduler::reset_handle`]/[`Scheduler::add`] on its own handle from within itself.
    pub fn tick(&mut self, now_us: u32, arg: &mut Arg) {
        loop {
            let due = self
                .jobs
                .iter()
                .enumerate()
                .filter(|(_, j)| j.running && j.due_us <= now_us)
                .min_by_key(|(_, j)| j.due_us)
                .map(|(slot, j)| (slot, j.callback));

            let Some((slot, callback)) = due else {
                break;
            };

            self.jobs[slot].running = false;
            if let Some(cb) = callback {
                cb(arg, now_us);
            }
        }
    }

    /// Clamp `delay_us` to the nearest multiple of `cycle_len_us` (ties rounding down), optionally
    /// offsetting by half a cycle so a callback lands mid-cycle rather than on the boundary. Zero
    /// or unrealistically large delays (> 65535 cycles) round to half/one cycle respectively.
    pub fn sanitize_delay(delay_us: u32, cycle_len_us: u32, schedule_half_tick: bool) -> u32 {
        if cycle_len_us == 0 {
            return 0;
        }
        let max_delay = 65535u64.saturating_mul(cycle_len_us as u64);
        let delay = if delay_us as u64 > max_delay || delay_us == 0 {
            cycle_len_us as u64
        } else {
            let cycles = (delay_us as u64 + cycle_len_us as u64 / 2) / cycle_len_us as u64;
            cycles.max(1) * cycle_len_us as u64
        };
        if schedule_half_tick {
            (delay - cycle_len_us as u64 / 2) as u32
        } else {
            delay as u32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counters {
        a: u32,
        b: u32,
    }

    fn bump_a(c: &mut Counters, _now: u32) {
        c.a += 1;
    }

    fn bump_b(c: &mut Counters, _now: u32) {
        c.b += 1;
    }

    #[test]
    fn fresh_handle_is_not_running() {
        let sched: Scheduler<Counters> = Scheduler::new();
        let h = Handle::empty();
        assert!(!sched.is_running(h));
        assert_eq!(sched.get_value(h), u32::MAX);
    }

    #[test]
    fn add_then_tick_fires_in_due_order() {
        let mut sched: Scheduler<Counters> = Scheduler::new();
        let mut counters = Counters::default();
        let mut ha = Handle::empty();
        let mut hb = Handle::empty();

        sched.add(0, 1000, "a", bump_a, &mut ha).unwrap();
        sched.add(0, 5000, "b", bump_b, &mut hb).unwrap();
        assert_eq!(sched.get_value(ha), 1);

        sched.tick(500, &mut counters);
        assert_eq!(counters.a, 0);
        assert!(sched.is_running(ha));

        sched.tick(1500, &mut counters);
        assert_eq!(counters.a, 1);
        assert!(!sched.is_running(ha));
        assert_eq!(counters.b, 0);

        sched.tick(6000, &mut counters);
        assert_eq!(counters.b, 1);
    }

    #[test]
    fn remove_if_running_on_idle_handle_is_noop() {
        let mut sched: Scheduler<Counters> = Scheduler::new();
        let mut h = Handle::empty();
        sched.remove_if_running(&mut h);
        assert!(!sched.is_running(h));
    }

    #[test]
    fn full_table_rejects_add() {
        let mut sched: Scheduler<Counters> = Scheduler::new();
        let mut handles = Vec::new();
        for _ in 0..MAX_SCHEDULER_JOBS {
            let mut h = Handle::empty();
            sched.add(0, 1000, "x", bump_a, &mut h).unwrap();
            handles.push(h);
        }
        let mut overflow = Handle::empty();
        assert_eq!(sched.add(0, 1000, "y", bump_a, &mut overflow), Err(FullError::Scheduler));
    }

    #[test]
    fn sanitize_delay_matches_reference_table() {
        let cycle = 1000u32;
        assert!((Scheduler::<()>::sanitize_delay(0, cycle, true) as i64 - 500).abs() <= 10);
        assert!((Scheduler::<()>::sanitize_delay(0, cycle, false) as i64 - 1000).abs() <= 10);
        assert!((Scheduler::<()>::sanitize_delay(1400, cycle, true) as i64 - 500).abs() <= 10);
        assert!((Scheduler::<()>::sanitize_delay(1600, cycle, true) as i64 - 1500).abs() <= 10);
        assert!((Scheduler::<()>::sanitize_delay(1_000_000_000, cycle, true) as i64 - 500).abs() <= 10);
        assert!((Scheduler::<()>::sanitize_delay((-4i32) as u32, cycle, false) as i64 - 1000).abs() <= 10);
    }
}
