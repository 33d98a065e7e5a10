//! Unit tests for service-account key parsing and assertion signing.

use chrono::{TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use research_outreach::sources::google_auth::{ServiceAccountKey, SHEETS_READONLY_SCOPE};
use research_outreach::AppError;
use serde::Deserialize;

const PRIVATE_KEY: &str = include_str!("../fixtures/test_service_account_key.pem");
const PUBLIC_KEY: &str = include_str!("../fixtures/test_service_account_pub.pem");

#[derive(Debug, Deserialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

fn key_json(private_key: &str, token_uri: Option<&str>) -> String {
    let mut value = serde_json::json!({
        "type": "service_account",
        "project_id": "outreach-test",
        "client_email": "reader@outreach-test.iam.gserviceaccount.com",
        "private_key": private_key,
    });
    if let Some(uri) = token_uri {
        value["token_uri"] = serde_json::json!(uri);
    }
    value.to_string()
}

#[test]
fn parses_key_and_defaults_token_uri() {
    let key = ServiceAccountKey::from_json_str(&key_json(PRIVATE_KEY, None)).expect("parses");
    assert_eq!(key.client_email, "reader@outreach-test.iam.gserviceaccount.com");
    assert_eq!(key.token_uri, "https://oauth2.googleapis.com/token");
}

#[test]
fn rejects_key_without_client_email() {
    let err = ServiceAccountKey::from_json_str(r#"{"private_key": "x"}"#).expect_err("must fail");
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn missing_key_file_is_config_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let err = ServiceAccountKey::load(&temp.path().join("service_account.json"))
        .expect_err("must fail");
    assert!(err.to_string().starts_with("config: failed to read service account key"));
}

#[test]
fn signed_assertion_verifies_with_public_key() {
    let key = ServiceAccountKey::from_json_str(&key_json(
        PRIVATE_KEY,
        Some("https://oauth2.example.test/token"),
    ))
    .expect("parses");
    let now = Utc::now();

    let token = key
        .signed_assertion(SHEETS_READONLY_SCOPE, now)
        .expect("signs");

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&["https://oauth2.example.test/token"]);
    let decoded = decode::<Claims>(
        &token,
        &DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).expect("public key"),
        &validation,
    )
    .expect("signature verifies");

    assert_eq!(decoded.claims.iss, key.client_email);
    assert_eq!(decoded.claims.scope, SHEETS_READONLY_SCOPE);
    assert_eq!(decoded.claims.aud, "https://oauth2.example.test/token");
    assert_eq!(decoded.claims.iat, now.timestamp());
    assert_eq!(decoded.claims.exp - decoded.claims.iat, 3600);
}

#[test]
fn assertion_is_form_safe() {
    let key = ServiceAccountKey::from_json_str(&key_json(PRIVATE_KEY, None)).expect("parses");
    let issued = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

    let token = key
        .signed_assertion(SHEETS_READONLY_SCOPE, issued)
        .expect("signs");

    assert_eq!(token.matches('.').count(), 2);
    assert!(token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')));
}

#[test]
fn invalid_private_key_is_config_error() {
    let key = ServiceAccountKey::from_json_str(&key_json("not a pem", None)).expect("parses");
    let err = key
        .signed_assertion(SHEETS_READONLY_SCOPE, Utc::now())
        .expect_err("must fail");
    assert!(matches!(err, AppError::Config(_)));
}
