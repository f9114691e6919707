//! Stage Composition Tests
//!
//! Pins the order in which the coercion, key-stripping, and transform
//! stages meet the argument tuple, and the additive nature of the
//! instrumentation overlay.

use std::sync::{Arc, Mutex};

use fnguard::guard::{define, BodyFn, FailureKind};
use fnguard::spec::FunctionSpec;
use fnguard::{state, trace};
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

/// A body that records the first argument it receives and echoes it back.
fn recording_body(slot: Arc<Mutex<Value>>) -> BodyFn {
    Arc::new(move |args: &[Value]| {
        let first = args.first().cloned().unwrap_or(Value::Null);
        *slot.lock().unwrap() = first.clone();
        Ok(first)
    })
}

fn person_schema() -> Value {
    json!({"args": ["tuple", ["map", {
        "name": "string",
        "age": "int",
        "role": ["optional", "string"]
    }]]})
}

// =============================================================================
// Key Stripping
// =============================================================================

/// Undeclared keys are removed before the body sees the argument.
#[test]
fn test_strip_extra_keys_cleans_the_argument() {
    let seen = Arc::new(Mutex::new(Value::Null));
    let guarded = define(
        FunctionSpec::new("register", recording_body(Arc::clone(&seen)))
            .with_schema(json!({"args": ["tuple", ["map", {"name": "string", "age": "int"}]]}))
            .with_metadata(json!({"strip_extra_keys": true}))
            .unwrap(),
    )
    .unwrap();

    let result = guarded.call(&[json!({"name": "Alice", "age": 30, "extra": "x"})]);
    assert!(result.is_ok());
    assert_eq!(*seen.lock().unwrap(), json!({"name": "Alice", "age": 30}));
}

/// Without stripping, the same call fails the closed-map check.
#[test]
fn test_extra_keys_rejected_without_stripping() {
    let seen = Arc::new(Mutex::new(Value::Null));
    let guarded = define(
        FunctionSpec::new("register", recording_body(seen))
            .with_schema(json!({"args": ["tuple", ["map", {"name": "string", "age": "int"}]]})),
    )
    .unwrap();

    let err = guarded
        .call(&[json!({"name": "Alice", "age": 30, "extra": "x"})])
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Args);
}

// =============================================================================
// Full Composition Order (coerce, then strip, then transform)
// =============================================================================

/// With all three stages configured, a map argument is coerced, stripped,
/// and transformed, in that order, before validation.
#[test]
fn test_all_three_stages_compose() {
    let seen = Arc::new(Mutex::new(Value::Null));
    let guarded = define(
        FunctionSpec::new("register", recording_body(Arc::clone(&seen)))
            .with_schema(person_schema())
            .with_metadata(json!({
                "coerce_args": true,
                "strip_extra_keys": true,
                "transform": {"defaults": {"role": "guest"}}
            }))
            .unwrap(),
    )
    .unwrap();

    // age arrives as text (coercion), extra is undeclared (stripping), role
    // is absent (transform default).
    let result = guarded.call(&[json!({"name": "Alice", "age": "30", "extra": "x"})]);
    assert!(result.is_ok(), "{:?}", result);
    assert_eq!(
        *seen.lock().unwrap(),
        json!({"name": "Alice", "age": 30, "role": "guest"})
    );
}

/// Stripping runs before the transform: a rename whose source key is
/// undeclared finds nothing to rename.
#[test]
fn test_strip_runs_before_transform() {
    let seen = Arc::new(Mutex::new(Value::Null));
    let guarded = define(
        FunctionSpec::new("register", recording_body(seen))
            .with_schema(json!({"args": ["tuple", ["map", {"name": "string"}]]}))
            .with_metadata(json!({
                "strip_extra_keys": true,
                "transform": {"rename": {"nick": "name"}}
            }))
            .unwrap(),
    )
    .unwrap();

    // "nick" is stripped first, so the rename never produces "name".
    let err = guarded.call(&[json!({"nick": "Bob"})]).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Args);
}

/// The same rename works when stripping is off, pinning the order.
#[test]
fn test_transform_rename_without_strip() {
    let seen = Arc::new(Mutex::new(Value::Null));
    let guarded = define(
        FunctionSpec::new("register", recording_body(Arc::clone(&seen)))
            .with_schema(json!({"args": ["tuple", ["map", {"name": "string"}]]}))
            .with_metadata(json!({"transform": {"rename": {"nick": "name"}}}))
            .unwrap(),
    )
    .unwrap();

    assert!(guarded.call(&[json!({"nick": "Bob"})]).is_ok());
    assert_eq!(*seen.lock().unwrap(), json!({"name": "Bob"}));
}

// =============================================================================
// Coercion
// =============================================================================

/// Argument coercion converts text toward the declared member types.
#[test]
fn test_coerce_args_converts_text() {
    let body: BodyFn = Arc::new(|args: &[Value]| {
        Ok(json!(args[0].as_i64().unwrap() + args[1].as_i64().unwrap()))
    });
    let add = define(
        FunctionSpec::new("add", body)
            .with_schema(json!({"args": ["tuple", "int", "int"]}))
            .with_metadata(json!({"coerce_args": true}))
            .unwrap(),
    )
    .unwrap();
    assert_eq!(add.call(&[json!("2"), json!(3)]).unwrap(), json!(5));
}

/// A failed coercion falls back to the raw value and reports through the
/// ordinary validation failure.
#[test]
fn test_failed_coercion_reports_as_args_failure() {
    let body: BodyFn = Arc::new(|_args| Ok(json!(0)));
    let add = define(
        FunctionSpec::new("add", body)
            .with_schema(json!({"args": ["tuple", "int"]}))
            .with_metadata(json!({"coerce_args": true}))
            .unwrap(),
    )
    .unwrap();
    let err = add.call(&[json!("not-a-number")]).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Args);
}

/// Return coercion applies after the return check, on the way out.
#[test]
fn test_coerce_ret_applies_outbound() {
    let body: BodyFn = Arc::new(|_args| Ok(json!(7)));
    let guarded = define(
        FunctionSpec::new("score", body)
            .with_schema(json!({"args": ["tuple", "int"], "ret": "float"}))
            .with_metadata(json!({"coerce_ret": true}))
            .unwrap(),
    )
    .unwrap();
    assert_eq!(guarded.call(&[json!(1)]).unwrap(), json!(7.0));
}

/// The return check validates the body's raw result, not the coerced one.
#[test]
fn test_ret_check_sees_raw_result() {
    let body: BodyFn = Arc::new(|_args| Ok(json!("7")));
    let guarded = define(
        FunctionSpec::new("score", body)
            .with_schema(json!({"args": ["tuple", "int"], "ret": "int"}))
            .with_metadata(json!({"coerce_ret": true}))
            .unwrap(),
    )
    .unwrap();
    // "7" fails the int ret schema even though it would coerce.
    let err = guarded.call(&[json!(1)]).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Ret);
}

// =============================================================================
// Instrumentation Overlay
// =============================================================================

/// The overlay reports its own violation line and delegates inward, so the
/// same violation appears twice: once from the overlay, once from the
/// pipeline. Expected, not a defect.
#[test]
fn test_instrumentation_double_reports() {
    let body: BodyFn = Arc::new(|_args| Ok(json!(0)));
    let guarded = define(
        FunctionSpec::new("probe", body)
            .with_schema(json!({"args": ["tuple", "int"]}))
            .with_metadata(json!({"instrument": true}))
            .unwrap(),
    )
    .unwrap();

    let (result, captured) = trace::with_capture(|| {
        state::with_tracing(true, || guarded.call(&[json!("x")]))
    });
    assert!(result.is_err());
    assert_eq!(captured.matches("instrument fn=probe").count(), 1);
    assert_eq!(captured.matches("stage=args").count(), 1);
}

/// Instrumentation does not change outcomes for valid calls.
#[test]
fn test_instrumentation_is_additive_only() {
    let body: BodyFn = Arc::new(|args: &[Value]| Ok(args[0].clone()));
    let guarded = define(
        FunctionSpec::new("probe", body)
            .with_schema(json!({"args": ["tuple", "int"]}))
            .with_metadata(json!({"instrument": true}))
            .unwrap(),
    )
    .unwrap();
    assert_eq!(guarded.call(&[json!(9)]).unwrap(), json!(9));
}
