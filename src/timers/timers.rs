use std::collections::HashMap;
use std::io::Write;
use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct InnerTimer {
    start: Option<Instant>,
    elapsed: Duration,
    calls: usize,
    subtimers: SubTimersMap,
}

impl InnerTimer {
    fn reset(&mut self) {
        self.start = None;
        self.elapsed = Duration::ZERO;
        self.calls = 0;
        self.subtimers.clear();
    }

    fn start(&mut self) {
        self.start = Some(Instant::now());
        self.calls += 1;
    }

    fn stop(&mut self) {
        if let Some(instant) = self.start.take() {
            self.elapsed += instant.elapsed();
        }
    }
}

#[derive(Debug, Default)]
struct SubTimersMap(HashMap<&'static str, InnerTimer>);

impl Deref for SubTimersMap {
    type Target = HashMap<&'static str, InnerTimer>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl DerefMut for SubTimersMap {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl SubTimersMap {
    fn start_subtimer(&mut self, key: &'static str) {
        self.entry(key).or_default().start();
    }

    fn total_time(&self) -> Duration {
        self.values().fold(Duration::ZERO, |acc, t| acc + t.elapsed)
    }

    fn find(&self, path: &[&'static str]) -> Option<&InnerTimer> {
        let (first, rest) = path.split_first()?;
        let mut timer = self.get(first)?;
        for key in rest {
            timer = timer.subtimers.get(key)?;
        }
        Some(timer)
    }

    // keys are written in sorted order so that output
    // is reproducible between runs
    fn write(&self, out: &mut dyn Write, depth: usize) -> std::io::Result<()> {
        let mut keys: Vec<_> = self.keys().copied().collect();
        keys.sort_unstable();
        for key in keys {
            let t = &self[key];
            let tabs = format!("{: <1$}", "", 4 * depth);
            writeln!(out, "{}{:} : {:?} ({} calls)", tabs, key, t.elapsed, t.calls)?;
            t.subtimers.write(out, depth + 1)?;
        }
        Ok(())
    }
}

/// Nested timers keyed by static names.
///
/// Timers started while another timer is running become children of
/// the running timer.  Use the [`timeit!`](crate::timers::timeit) macro
/// to time a block of statements.
#[derive(Default, Debug)]
pub struct Timers {
    stack: Vec<&'static str>,
    subtimers: SubTimersMap,
}

impl Timers {
    fn mut_active_timer(&mut self) -> Option<&mut InnerTimer> {
        let (first, rest) = self.stack.split_first()?;
        let mut active = self.subtimers.get_mut(first)?;
        for key in rest {
            active = active.subtimers.get_mut(key)?;
        }
        Some(active)
    }

    /// Clear the timer `key` at the root level
    pub fn reset_timer(&mut self, key: &'static str) {
        self.subtimers.entry(key).or_default().reset();
    }

    /// Start the timer `key` as a child of the current timer
    pub fn start_as_current(&mut self, key: &'static str) {
        match self.mut_active_timer() {
            Some(active) => active.subtimers.start_subtimer(key),
            None => self.subtimers.start_subtimer(key),
        }
        self.stack.push(key);
    }

    /// Stop the current timer
    pub fn stop_current(&mut self) {
        if let Some(active) = self.mut_active_timer() {
            active.stop();
        }
        self.stack.pop();
    }

    /// Sum of all root level timers
    pub fn total_time(&self) -> Duration {
        self.subtimers.total_time()
    }

    /// Accumulated time of the timer at `path`, e.g. `&["factor"]`
    pub fn elapsed(&self, path: &[&'static str]) -> Option<Duration> {
        self.subtimers.find(path).map(|t| t.elapsed)
    }

    /// Number of times the timer at `path` was started
    pub fn calls(&self, path: &[&'static str]) -> usize {
        self.subtimers.find(path).map_or(0, |t| t.calls)
    }

    /// Write the timer tree to `out`
    pub fn write(&self, out: &mut dyn Write) -> std::io::Result<()> {
        self.subtimers.write(out, 0)
    }
}

macro_rules! timeit {
    ($timer:expr => $key:literal; $($tt:tt)+) => {

        $timer.start_as_current($key);
        $(
            $tt
        )+
        $timer.stop_current();
    }
}
pub(crate) use timeit;
