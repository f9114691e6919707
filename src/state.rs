//! Process-wide validation and tracing toggles
//!
//! Two toggles gate the execution pipeline:
//! - validation: when disabled, guarded calls skip hooks, checks, and
//!   tracing entirely and run the raw body
//! - tracing: when enabled, guarded calls emit debug trace lines
//!
//! Each toggle is a process-wide default plus a per-thread stack of scoped
//! overrides. Reads consult the innermost override first, then the default.
//! Overrides are installed through RAII guards, so the previous value is
//! restored on every exit path, including unwinding. Overrides installed by
//! one thread are never visible to another.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide default: validation on unless explicitly disabled.
static VALIDATION_DEFAULT: AtomicBool = AtomicBool::new(true);

/// Process-wide default: tracing off unless explicitly enabled.
static TRACING_DEFAULT: AtomicBool = AtomicBool::new(false);

thread_local! {
    static VALIDATION_OVERRIDES: RefCell<Vec<bool>> = RefCell::new(Vec::new());
    static TRACING_OVERRIDES: RefCell<Vec<bool>> = RefCell::new(Vec::new());
}

/// The two pipeline toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Toggle {
    Validation,
    Tracing,
}

impl Toggle {
    fn default_flag(self) -> &'static AtomicBool {
        match self {
            Toggle::Validation => &VALIDATION_DEFAULT,
            Toggle::Tracing => &TRACING_DEFAULT,
        }
    }

    fn with_overrides<R>(self, f: impl FnOnce(&RefCell<Vec<bool>>) -> R) -> R {
        match self {
            Toggle::Validation => VALIDATION_OVERRIDES.with(f),
            Toggle::Tracing => TRACING_OVERRIDES.with(f),
        }
    }

    fn current(self) -> bool {
        let scoped = self.with_overrides(|stack| stack.borrow().last().copied());
        scoped.unwrap_or_else(|| self.default_flag().load(Ordering::Relaxed))
    }
}

/// Returns whether validation is currently enabled for this thread.
pub fn validation_enabled() -> bool {
    Toggle::Validation.current()
}

/// Returns whether debug tracing is currently enabled for this thread.
pub fn tracing_enabled() -> bool {
    Toggle::Tracing.current()
}

/// Sets the process-wide validation default.
///
/// Scoped overrides, where present, still win.
pub fn set_validation_enabled(enabled: bool) {
    VALIDATION_DEFAULT.store(enabled, Ordering::Relaxed);
}

/// Sets the process-wide tracing default.
pub fn set_tracing_enabled(enabled: bool) {
    TRACING_DEFAULT.store(enabled, Ordering::Relaxed);
}

/// RAII guard for a scoped toggle override.
///
/// Pushes the override on construction and pops it on drop, so the
/// surrounding value is restored on normal return and on unwind alike.
/// The guard is tied to the creating thread.
#[derive(Debug)]
pub struct ScopedToggle {
    toggle: Toggle,
    // Keeps the guard on the thread that owns the override stack.
    _not_send: PhantomData<*const ()>,
}

impl ScopedToggle {
    fn push(toggle: Toggle, value: bool) -> Self {
        toggle.with_overrides(|stack| stack.borrow_mut().push(value));
        Self {
            toggle,
            _not_send: PhantomData,
        }
    }
}

impl Drop for ScopedToggle {
    fn drop(&mut self) {
        self.toggle.with_overrides(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Forces validation on or off until the returned guard is dropped.
pub fn scoped_validation(enabled: bool) -> ScopedToggle {
    ScopedToggle::push(Toggle::Validation, enabled)
}

/// Forces debug tracing on or off until the returned guard is dropped.
pub fn scoped_tracing(enabled: bool) -> ScopedToggle {
    ScopedToggle::push(Toggle::Tracing, enabled)
}

/// Runs `f` with validation forced on or off.
pub fn with_validation<R>(enabled: bool, f: impl FnOnce() -> R) -> R {
    let _scope = scoped_validation(enabled);
    f()
}

/// Runs `f` with debug tracing forced on or off.
pub fn with_tracing<R>(enabled: bool, f: impl FnOnce() -> R) -> R {
    let _scope = scoped_tracing(enabled);
    f()
}
