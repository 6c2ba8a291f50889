//! Instrumented item type for verifying how containers construct, clone and drop their items.
//!
//! Counters are thread-local, so tests running in parallel do not observe each other.

use std::cell::Cell;

thread_local! {
    static STATE: Cell<State> = const { Cell::new(State::new()) };
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct Counters {
    /// Successful constructions via `new()`, `try_new()` or `default()`. Clones not included.
    pub(crate) constructions: usize,
    pub(crate) clones: usize,
    pub(crate) drops: usize,

    /// Instances currently alive. Signed so that a double drop shows up as a negative value.
    pub(crate) live: isize,
}

#[derive(Clone, Copy, Debug)]
struct State {
    counters: Counters,

    /// 1-based countdown to the construction attempt that fails.
    fail_on_construction: Option<usize>,

    /// 1-based countdown to the clone attempt that fails.
    fail_on_clone: Option<usize>,
}

impl State {
    const fn new() -> Self {
        Self {
            counters: Counters {
                constructions: 0,
                clones: 0,
                drops: 0,
                live: 0,
            },
            fail_on_construction: None,
            fail_on_clone: None,
        }
    }
}

fn update(f: impl FnOnce(&mut State)) {
    STATE.with(|state| {
        let mut current = state.get();
        f(&mut current);
        state.set(current);
    });
}

/// Clears all counters and pending failures for the current thread.
pub(crate) fn reset() {
    STATE.with(|state| state.set(State::new()));
}

pub(crate) fn counters() -> Counters {
    STATE.with(|state| state.get().counters)
}

/// The `nth` construction attempt from now on fails (1-based).
pub(crate) fn fail_on_construction(nth: usize) {
    update(|state| state.fail_on_construction = Some(nth));
}

/// The `nth` clone attempt from now on fails (1-based).
pub(crate) fn fail_on_clone(nth: usize) {
    update(|state| state.fail_on_clone = Some(nth));
}

/// Advances a failure countdown, returning whether this attempt is the one that fails.
fn tick(countdown: &mut Option<usize>) -> bool {
    match *countdown {
        Some(1) => {
            *countdown = None;
            true
        }
        Some(remaining) => {
            *countdown = Some(remaining - 1);
            false
        }
        None => false,
    }
}

pub(crate) fn values(items: &[Probe]) -> Vec<u32> {
    items.iter().map(Probe::value).collect()
}

#[derive(Debug, Eq, PartialEq)]
pub(crate) struct ProbeError;

#[derive(Debug, Eq, PartialEq)]
pub(crate) struct Probe {
    value: u32,
}

impl Probe {
    /// # Panics
    ///
    /// Panics if this is the construction attempt scheduled to fail.
    pub(crate) fn new(value: u32) -> Self {
        Self::try_new(value).expect("probe construction scheduled to fail")
    }

    pub(crate) fn try_new(value: u32) -> Result<Self, ProbeError> {
        let mut failed = false;

        update(|state| {
            failed = tick(&mut state.fail_on_construction);

            if !failed {
                state.counters.constructions += 1;
                state.counters.live += 1;
            }
        });

        if failed {
            Err(ProbeError)
        } else {
            Ok(Self { value })
        }
    }

    pub(crate) fn value(&self) -> u32 {
        self.value
    }
}

impl Default for Probe {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clone for Probe {
    fn clone(&self) -> Self {
        let mut failed = false;

        update(|state| {
            failed = tick(&mut state.fail_on_clone);

            if !failed {
                state.counters.clones += 1;
                state.counters.live += 1;
            }
        });

        assert!(!failed, "probe clone scheduled to fail");

        Self { value: self.value }
    }
}

impl Drop for Probe {
    fn drop(&mut self) {
        update(|state| {
            state.counters.drops += 1;
            state.counters.live -= 1;
        });
    }
}
