//! Validator Cache Equivalence Tests
//!
//! The compiled path and the generic validate-per-call path must agree on
//! accept/reject for every schema and value, including schemas the engine
//! cannot interpret at all (degraded mode).

use std::sync::Arc;

use fnguard::engine::{JsonEngine, SchemaEngine};
use fnguard::guard::{define, BodyFn, FailureKind, Guarded};
use fnguard::spec::FunctionSpec;
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn identity_body() -> BodyFn {
    Arc::new(|args: &[Value]| Ok(args.first().cloned().unwrap_or(Value::Null)))
}

fn uuid_guard(cache: bool) -> Guarded {
    define(
        FunctionSpec::new("lookup", identity_body())
            .with_schema(json!({"args": ["tuple", ["map", {
                "id": ["string", {"format": "uuid"}],
                "hint": ["optional", "string"]
            }]]}))
            .with_metadata(json!({"cache": cache}))
            .unwrap(),
    )
    .unwrap()
}

// =============================================================================
// Compiled vs Generic Agreement
// =============================================================================

/// For a grid of schemas and values, the compiled predicate and the generic
/// validate operation agree.
#[test]
fn test_compiled_validator_matches_generic_validate() {
    let engine = JsonEngine::new();
    let schemas = [
        json!("int"),
        json!("pos_int"),
        json!("float"),
        json!("bool"),
        json!(["string", {"pattern": "^[a-z]+$"}]),
        json!(["tuple", "int", "string"]),
        json!(["array", "int"]),
        json!(["map", {"name": "string", "age": ["optional", "int"]}]),
        json!(["=>", ["tuple", "int"], "int"]),
    ];
    let values = [
        json!(0),
        json!(1),
        json!(-7),
        json!(2.5),
        json!(true),
        json!("abc"),
        json!("ABC"),
        json!([1, "a"]),
        json!([1, 2, 3]),
        json!({"name": "Alice"}),
        json!({"name": "Alice", "age": 30, "extra": 1}),
        json!(null),
    ];

    for schema in &schemas {
        let compiled = engine.compile(schema).unwrap();
        for value in &values {
            assert_eq!(
                compiled(value),
                engine.validate(schema, value),
                "disagreement for schema {} on value {}",
                schema,
                value
            );
        }
    }
}

/// Both cache settings accept a valid uuid and reject an invalid one.
#[test]
fn test_cached_and_uncached_guards_agree() {
    let valid = json!({"id": "550e8400-e29b-41d4-a716-446655440000", "hint": "primary"});
    let invalid = json!({"id": "not-a-uuid", "hint": "primary"});

    for cache in [false, true] {
        let guarded = uuid_guard(cache);
        assert!(
            guarded.call(&[valid.clone()]).is_ok(),
            "cache={} rejected a valid uuid",
            cache
        );
        let err = guarded.call(&[invalid.clone()]).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Args, "cache={}", cache);
    }
}

// =============================================================================
// Degraded Mode (compilation failure)
// =============================================================================

/// A schema the engine cannot compile still defines; every call then fails
/// args validation with the compilation error in the explanation.
#[test]
fn test_uncompilable_schema_degrades_instead_of_failing_definition() {
    let guarded = define(
        FunctionSpec::new("probe", identity_body())
            .with_schema(json!(["bogus_head", "int"]))
            .with_metadata(json!({"cache": true}))
            .unwrap(),
    )
    .unwrap();

    let err = guarded.call(&[json!(1)]).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Args);
    assert!(err.explanation().message().contains("bogus_head"));
}

/// The generic path rejects the same uninterpretable schema, so both cache
/// settings agree even for malformed schemas.
#[test]
fn test_degraded_agreement_between_cache_settings() {
    for cache in [false, true] {
        let guarded = define(
            FunctionSpec::new("probe", identity_body())
                .with_schema(json!(["bogus_head", "int"]))
                .with_metadata(json!({"cache": cache}))
                .unwrap(),
        )
        .unwrap();
        assert!(guarded.call(&[json!(1)]).is_err(), "cache={}", cache);
    }
}

// =============================================================================
// Determinism
// =============================================================================

/// The compiled predicate answers the same way on every call.
#[test]
fn test_compiled_validator_is_deterministic() {
    let engine = JsonEngine::new();
    let compiled = engine
        .compile(&json!(["map", {"name": "string"}]))
        .unwrap();
    let doc = json!({"name": "Alice"});
    for _ in 0..100 {
        assert!(compiled(&doc));
    }
}
