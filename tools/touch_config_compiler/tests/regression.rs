use std::path::PathBuf;

use touch_config_compiler::{
    generate_from_path, parse_touch_config_file, render_generated_config, validate_config,
    ConfigCompilerError,
};

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("missing tools dir")
        .parent()
        .expect("missing repo root")
        .to_path_buf()
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn repository_config_compiles() {
    let config = repo_root().join("config/touch.toml");
    let generated = generate_from_path(&config).expect("default config should compile");
    assert!(generated.contains("pub const TOUCH_EVENT_QUEUE_CAPACITY: usize = 10;"));
    assert!(generated.contains("samples_per_read: 8,"));
    assert!(generated.contains("debounce_ms: 10,"));
}

#[test]
fn generation_is_deterministic_for_same_input() {
    let config = fixture("valid_default.toml");
    let first = generate_from_path(&config).expect("first generation failed");
    let second = generate_from_path(&config).expect("second generation failed");
    assert_eq!(first, second);
}

#[test]
fn generated_source_names_every_config_block() {
    let config = parse_touch_config_file(&fixture("valid_default.toml")).expect("should parse");
    validate_config(&config).expect("should validate");
    let rendered = render_generated_config(&config);

    for needle in [
        "pub(crate) const TOUCH_CONFIG: TouchConfig = TouchConfig {",
        "sampling: SamplingConfig {",
        "debounce: DebounceConfig {",
        "raw_limits: AdcWindow {",
        "map_limits: AdcWindow {",
        "calibration: CalibrationConfig {",
        "pressure_threshold: 300,",
        "xmax: 4095,",
    ] {
        assert!(
            rendered.contains(needle),
            "rendered output missing `{needle}`"
        );
    }
}

#[test]
fn min_confidence_defaults_to_min_run() {
    let config = parse_touch_config_file(&fixture("valid_without_calibration.toml"))
        .expect("fixture should parse");
    assert_eq!(config.calibration.min_confidence, None);
    validate_config(&config).expect("fixture should validate");
    let rendered = render_generated_config(&config);
    assert!(rendered.contains("min_confidence: 4,"));
}

#[test]
fn semantic_validation_rejects_invalid_ranges() {
    let cases = [
        (
            "invalid/min_run_gt_samples.toml",
            "sampling.min_run must be in 1..=sampling.samples_per_read",
        ),
        ("invalid/zero_tick.toml", "debounce.tick_ms must be > 0"),
        (
            "invalid/zero_queue.toml",
            "debounce.queue_capacity must be in 1..=64",
        ),
        (
            "invalid/empty_map_window.toml",
            "limits.map must span a non-empty range on both axes",
        ),
    ];

    for (fixture_name, expected_msg) in cases {
        let path = fixture(fixture_name);
        let err = generate_from_path(&path).expect_err("fixture should fail validation");
        match err {
            ConfigCompilerError::Validation(msg) => {
                assert!(
                    msg.contains(expected_msg),
                    "expected validation message containing `{expected_msg}`, got `{msg}`"
                );
            }
            other => panic!("expected validation error, got {other}"),
        }
    }
}

#[test]
fn parse_errors_are_reported_for_schema_mismatches() {
    let path = fixture("invalid/missing_debounce.toml");
    let err = generate_from_path(&path).expect_err("fixture should fail parsing");

    match err {
        ConfigCompilerError::Parse(msg) => {
            assert!(
                msg.contains("debounce"),
                "expected parse error mentioning debounce, got `{msg}`"
            );
        }
        other => panic!("expected parse error, got {other}"),
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let err = generate_from_path(&fixture("does_not_exist.toml")).expect_err("should fail");
    assert!(matches!(err, ConfigCompilerError::Io(_)));
}
