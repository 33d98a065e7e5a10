//! Unit tests for `AppError` display format.

use research_outreach::AppError;

#[test]
fn display_is_prefixed_by_domain() {
    let cases = [
        (AppError::Config("x".into()), "config: x"),
        (AppError::Source("x".into()), "source: x"),
        (AppError::Generator("x".into()), "generator: x"),
        (AppError::Dispatch("x".into()), "dispatch: x"),
        (AppError::Checkpoint("x".into()), "checkpoint: x"),
        (AppError::Io("x".into()), "io: x"),
    ];
    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn toml_errors_become_config_errors() {
    let err: AppError = toml::from_str::<toml::Value>("= broken")
        .expect_err("invalid toml")
        .into();
    assert!(err.to_string().starts_with("config: invalid config:"));
}

#[test]
fn json_errors_become_io_errors() {
    let err: AppError = serde_json::from_str::<serde_json::Value>("{")
        .expect_err("invalid json")
        .into();
    assert!(matches!(err, AppError::Io(_)));
}

#[test]
fn implements_std_error() {
    fn assert_error<E: std::error::Error>(_: &E) {}
    let err = AppError::Dispatch("smtp send failed".into());
    assert_error(&err);
    assert!(format!("{err:?}").contains("Dispatch"));
}
