use genwatch_client::{ClientSettings, ConfigError, DEFAULT_API_URL};
use pretty_assertions::assert_eq;

fn push_url(api: &str) -> String {
    ClientSettings::with_api_url(api)
        .unwrap()
        .push_url()
        .unwrap()
        .to_string()
}

#[test]
fn push_url_strips_api_version_and_maps_scheme() {
    assert_eq!(push_url(DEFAULT_API_URL), "ws://localhost:5000/");
    assert_eq!(
        push_url("https://gen.example.com/api/v2/"),
        "wss://gen.example.com/"
    );
    assert_eq!(
        push_url("https://gen.example.com/backend/api/v1"),
        "wss://gen.example.com/backend"
    );
}

#[test]
fn push_url_keeps_paths_without_version_suffix() {
    assert_eq!(
        push_url("http://localhost:5000/api/latest"),
        "ws://localhost:5000/api/latest"
    );
    assert_eq!(push_url("http://localhost:5000"), "ws://localhost:5000/");
}

#[test]
fn api_url_must_be_http() {
    assert!(matches!(
        ClientSettings::with_api_url("ftp://files.example.com/api/v1"),
        Err(ConfigError::UnsupportedScheme(scheme)) if scheme == "ftp"
    ));
    assert!(matches!(
        ClientSettings::with_api_url("not a url"),
        Err(ConfigError::InvalidUrl { .. })
    ));
}

#[test]
fn defaults_match_polling_cadence() {
    let settings = ClientSettings::default();
    assert_eq!(settings.active_poll_interval.as_secs(), 5);
    assert_eq!(settings.job_poll_interval.as_secs(), 2);
    assert_eq!(settings.request_timeout.as_secs(), 900);
    assert_eq!(settings.indicator.dwell.as_millis(), 4_500);
}
