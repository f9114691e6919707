//! Debug trace output
//!
//! Line-oriented text tagged with a fixed marker:
//! - one line per event
//! - synchronous, no buffering
//! - call entry carries the arguments, exit the result, failures the
//!   explanation
//!
//! The format beyond "contains the marker and the relevant value" is not a
//! contract. Output goes to stderr; tests install a per-thread capture
//! buffer instead. Callers decide when tracing is active; the emitters here
//! are unconditional.

use std::cell::RefCell;
use std::io::{self, Write};

use serde_json::Value;
use uuid::Uuid;

use crate::engine::Explanation;

/// Fixed marker present on every trace line.
pub const MARKER: &str = "[FNGUARD]";

thread_local! {
    static CAPTURE: RefCell<Option<String>> = RefCell::new(None);
}

fn emit(line: String) {
    let captured = CAPTURE.with(|slot| {
        let mut slot = slot.borrow_mut();
        match slot.as_mut() {
            Some(buffer) => {
                buffer.push_str(&line);
                buffer.push('\n');
                true
            }
            None => false,
        }
    });
    if !captured {
        let mut stderr = io::stderr();
        let _ = writeln!(stderr, "{}", line);
        let _ = stderr.flush();
    }
}

/// Runs `f` with trace output redirected into a buffer, returning the
/// closure's result and everything emitted on this thread while it ran.
pub fn with_capture<R>(f: impl FnOnce() -> R) -> (R, String) {
    struct Restore;
    impl Drop for Restore {
        fn drop(&mut self) {
            CAPTURE.with(|slot| slot.borrow_mut().take());
        }
    }

    CAPTURE.with(|slot| *slot.borrow_mut() = Some(String::new()));
    let restore = Restore;
    let result = f();
    let captured = CAPTURE.with(|slot| slot.borrow_mut().take()).unwrap_or_default();
    std::mem::forget(restore);
    (result, captured)
}

/// Call entry: the raw argument tuple.
pub fn call_entry(name: &str, call_id: Uuid, args: &[Value]) {
    let args = Value::Array(args.to_vec());
    emit(format!(
        "{} enter fn={} call={} args={}",
        MARKER, name, call_id, args
    ));
}

/// Successful completion: the returned value.
pub fn call_exit(name: &str, call_id: Uuid, result: &Value) {
    emit(format!(
        "{} exit fn={} call={} result={}",
        MARKER, name, call_id, result
    ));
}

/// A failure exit: which stage failed and why.
pub fn call_failure(name: &str, call_id: Uuid, stage: &str, detail: &str) {
    emit(format!(
        "{} fail fn={} call={} stage={} detail={}",
        MARKER, name, call_id, stage, detail
    ));
}

/// An isolated hook failure. The call proceeds; this line is the only
/// record of the failure.
pub fn hook_failure(name: &str, call_id: Uuid, hook: &str, detail: &str) {
    emit(format!(
        "{} hook_fail fn={} call={} hook={} detail={}",
        MARKER, name, call_id, hook, detail
    ));
}

/// A violation reported by the engine's native instrumentation overlay.
pub fn instrument_violation(name: &str, explanation: &Explanation) {
    emit(format!(
        "{} instrument fn={} violation={}",
        MARKER,
        name,
        explanation.message()
    ));
}
