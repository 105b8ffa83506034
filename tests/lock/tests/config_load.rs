//! Generator configuration lock tests.
//!
//! - CONFIG-FILE: a JSON file on disk selects mode, encoding and capacity.
//! - CONFIG-STRICT: unknown keys and bad values are rejected, never ignored.
//! - CONFIG-DIGEST: the digest depends on content, not on key order.

use std::fs;

use lock_tests::fixtures::robot_rooms;
use lodestar_kernel::carrier::state::StateEncodingV1;
use lodestar_search::config::ConfigError;
use lodestar_search::{GeneratorConfigV1, GeneratorModeV1, GroundedMatchV1, SuccessorGenerator};

// --- CONFIG-FILE ---

#[test]
fn config_file_drives_generator_construction() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("generator.json");
    fs::write(
        &path,
        br#"{
            "schema_version": "generator_config.v1",
            "mode": "grounded",
            "encoding": "sparse_sorted",
            "grounded_match": "naive_scan",
            "max_facts": 128
        }"#,
    )
    .unwrap();

    let config = GeneratorConfigV1::load(&path).unwrap();
    assert_eq!(config.mode, GeneratorModeV1::Grounded);
    assert_eq!(config.grounded_match, GroundedMatchV1::NaiveScan);

    let generator = SuccessorGenerator::from_task(robot_rooms(3), &config).unwrap();
    assert_eq!(generator.generator().mode(), GeneratorModeV1::Grounded);
    assert_eq!(generator.repository().encoding(), StateEncodingV1::SparseSorted);
    assert_eq!(generator.repository().capacity(), 128);
    assert!(!generator.expand(generator.initial_state()).unwrap().is_empty());
}

#[test]
fn missing_keys_take_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.json");
    fs::write(&path, b"{}").unwrap();
    assert_eq!(
        GeneratorConfigV1::load(&path).unwrap(),
        GeneratorConfigV1::default()
    );
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = GeneratorConfigV1::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

// --- CONFIG-STRICT ---

#[test]
fn unknown_keys_and_bad_values_are_rejected() {
    assert!(matches!(
        GeneratorConfigV1::from_json_bytes(br#"{"mood":"lifted"}"#),
        Err(ConfigError::UnknownKey { .. })
    ));
    assert!(matches!(
        GeneratorConfigV1::from_json_bytes(br#"{"mode":"hybrid"}"#),
        Err(ConfigError::InvalidValue { .. })
    ));
    assert!(matches!(
        GeneratorConfigV1::from_json_bytes(br#"{"max_facts":0}"#),
        Err(ConfigError::InvalidValue { .. })
    ));
    assert!(matches!(
        GeneratorConfigV1::from_json_bytes(br#"{"schema_version":"generator_config.v0"}"#),
        Err(ConfigError::InvalidValue { .. })
    ));
    assert!(matches!(
        GeneratorConfigV1::from_json_bytes(b"[1, 2]"),
        Err(ConfigError::Parse { .. })
    ));
}

// --- CONFIG-DIGEST ---

#[test]
fn digest_ignores_key_order() {
    let a = GeneratorConfigV1::from_json_bytes(br#"{"mode":"grounded","max_facts":64}"#).unwrap();
    let b = GeneratorConfigV1::from_json_bytes(br#"{"max_facts":64,"mode":"grounded"}"#).unwrap();
    assert_eq!(a.digest().unwrap(), b.digest().unwrap());
    assert_ne!(
        a.digest().unwrap(),
        GeneratorConfigV1::default().digest().unwrap()
    );

    let bytes = a.canonical_bytes().unwrap();
    assert_eq!(GeneratorConfigV1::from_json_bytes(&bytes).unwrap(), a);
}
