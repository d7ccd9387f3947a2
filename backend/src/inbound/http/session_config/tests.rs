//! Unit tests for session configuration parsing.

use super::*;
use std::collections::HashMap;
use std::io::Write as _;

use mockable::MockEnv;
use rstest::{fixture, rstest};
use tempfile::NamedTempFile;

fn key_file(len: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temporary key file");
    file.write_all(&vec![b'k'; len]).expect("write key bytes");
    file
}

#[fixture]
fn long_key() -> NamedTempFile {
    key_file(SESSION_KEY_MIN_LEN)
}

fn mock_env(vars: HashMap<&'static str, String>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

fn release_vars(key: &NamedTempFile) -> HashMap<&'static str, String> {
    HashMap::from([
        (KEY_FILE_ENV, key.path().to_string_lossy().into_owned()),
        (COOKIE_SECURE_ENV, "1".to_owned()),
        (SAMESITE_ENV, "Strict".to_owned()),
        (ALLOW_EPHEMERAL_ENV, "0".to_owned()),
    ])
}

fn release_error(vars: HashMap<&'static str, String>) -> SessionConfigError {
    match session_settings_from_env(&mock_env(vars), BuildMode::Release) {
        Ok(_) => panic!("release configuration should be rejected"),
        Err(error) => error,
    }
}

#[rstest]
#[case(COOKIE_SECURE_ENV)]
#[case(SAMESITE_ENV)]
#[case(ALLOW_EPHEMERAL_ENV)]
fn release_requires_every_toggle(long_key: NamedTempFile, #[case] missing: &'static str) {
    let mut vars = release_vars(&long_key);
    vars.remove(missing);

    let err = release_error(vars);

    assert!(matches!(err, SessionConfigError::MissingEnv { name } if name == missing));
}

#[rstest]
#[case(COOKIE_SECURE_ENV, "maybe")]
#[case(COOKIE_SECURE_ENV, "")]
#[case(SAMESITE_ENV, "sometimes")]
#[case(TTL_HOURS_ENV, "0")]
#[case(TTL_HOURS_ENV, "twelve")]
#[case(TTL_HOURS_ENV, "100000")]
fn release_rejects_invalid_values(
    long_key: NamedTempFile,
    #[case] name: &'static str,
    #[case] value: &str,
) {
    let mut vars = release_vars(&long_key);
    vars.insert(name, value.to_owned());

    let err = release_error(vars);

    assert!(matches!(err, SessionConfigError::InvalidEnv { name: got, .. } if got == name));
}

#[rstest]
fn release_rejects_ephemeral_keys(long_key: NamedTempFile) {
    let mut vars = release_vars(&long_key);
    vars.insert(ALLOW_EPHEMERAL_ENV, "yes".to_owned());

    assert!(matches!(
        release_error(vars),
        SessionConfigError::EphemeralNotAllowed
    ));
}

#[rstest]
fn release_requires_readable_key_file(long_key: NamedTempFile) {
    let mut vars = release_vars(&long_key);
    vars.insert(KEY_FILE_ENV, "/nonexistent/medrep/session_key".to_owned());

    assert!(matches!(release_error(vars), SessionConfigError::KeyRead { .. }));
}

#[rstest]
fn release_rejects_short_key() {
    let short = key_file(32);

    let err = release_error(release_vars(&short));

    assert!(matches!(
        err,
        SessionConfigError::KeyTooShort { length: 32, .. }
    ));
}

#[rstest]
fn release_rejects_same_site_none_without_secure(long_key: NamedTempFile) {
    let mut vars = release_vars(&long_key);
    vars.insert(COOKIE_SECURE_ENV, "0".to_owned());
    vars.insert(SAMESITE_ENV, "None".to_owned());

    assert!(matches!(
        release_error(vars),
        SessionConfigError::InsecureSameSiteNone
    ));
}

#[rstest]
fn release_accepts_explicit_settings(long_key: NamedTempFile) {
    let mut vars = release_vars(&long_key);
    vars.insert(TTL_HOURS_ENV, " 48 ".to_owned());

    let settings = session_settings_from_env(&mock_env(vars), BuildMode::Release)
        .expect("valid release settings");

    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Strict);
    assert_eq!(settings.ttl, Duration::hours(48));
}

#[rstest]
fn release_defaults_ttl_when_unset(long_key: NamedTempFile) {
    let settings = session_settings_from_env(&mock_env(release_vars(&long_key)), BuildMode::Release)
        .expect("valid release settings");

    assert_eq!(settings.ttl, Duration::hours(DEFAULT_SESSION_TTL_HOURS));
}

#[rstest]
fn debug_tolerates_empty_environment() {
    let settings = session_settings_from_env(&mock_env(HashMap::new()), BuildMode::Debug)
        .expect("debug defaults");

    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
    assert_eq!(settings.ttl, Duration::hours(DEFAULT_SESSION_TTL_HOURS));
}

#[rstest]
#[case(SAMESITE_ENV, "unexpected")]
#[case(COOKIE_SECURE_ENV, "perhaps")]
#[case(TTL_HOURS_ENV, "-3")]
fn debug_falls_back_on_invalid_values(
    long_key: NamedTempFile,
    #[case] name: &'static str,
    #[case] value: &str,
) {
    let mut vars = release_vars(&long_key);
    vars.insert(name, value.to_owned());

    let settings =
        session_settings_from_env(&mock_env(vars), BuildMode::Debug).expect("debug fallback");

    assert!(settings.cookie_secure);
    assert_eq!(settings.ttl, Duration::hours(DEFAULT_SESSION_TTL_HOURS));
}

#[rstest]
fn debug_allows_insecure_cookie_for_local_http(long_key: NamedTempFile) {
    let mut vars = release_vars(&long_key);
    vars.insert(COOKIE_SECURE_ENV, "0".to_owned());
    vars.insert(SAMESITE_ENV, "lax".to_owned());

    let settings =
        session_settings_from_env(&mock_env(vars), BuildMode::Debug).expect("debug settings");

    assert!(!settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
}
