//! Tests for settings loading, compilation and validation.

use super::*;
use crate::error::ConfigError;
use crate::notify::RetryPolicy;
use serial_test::serial;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn fixture_path(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

fn compile_yaml(yaml: &str) -> Result<HandlerConfig, Vec<ConfigError>> {
    HandlerSettings::from_str_section(yaml, "slack")
        .map_err(|e| vec![e])?
        .compile("slack", Path::new("/etc/sensu/conf.d"))
}

// ============================================================
// Loading
// ============================================================

#[test]
fn load_json_settings_section() {
    let settings = HandlerSettings::load(&fixture_path("settings_single.json"), "slack").unwrap();

    assert_eq!(
        settings.webhook_url.as_deref(),
        Some("https://hooks.slack.com/services/T000/B000/XXXX")
    );
    assert_eq!(settings.channel.as_deref(), Some("#monitoring"));
    assert_eq!(settings.webhook_retries, Some(3));
    assert_eq!(settings.webhook_timeout, Some(DurationSetting::Seconds(5)));
    assert_eq!(
        settings.webhook_retry_sleep.map(DurationSetting::as_duration),
        Some(Duration::from_millis(500))
    );
    assert_eq!(settings.proxy_port, Some(3128));
}

#[test]
fn load_section_nested_under_handlers() {
    let settings =
        HandlerSettings::load(&fixture_path("settings_multichannel.yaml"), "slack-multi").unwrap();
    let urls = settings.webhook_urls.unwrap();
    assert_eq!(urls.len(), 3);
    assert!(urls.contains_key("#db-team"));
}

#[test]
fn load_missing_section_is_reported_by_name() {
    let err = HandlerSettings::load(&fixture_path("settings_single.json"), "hipchat").unwrap_err();
    match err {
        ConfigError::MissingSection { name } => assert_eq!(name, "hipchat"),
        e => panic!("Expected MissingSection, got {:?}", e),
    }
}

#[test]
fn load_nonexistent_file_returns_load_error() {
    let err = HandlerSettings::load(Path::new("/nonexistent/slack.json"), "slack").unwrap_err();
    match err {
        ConfigError::LoadError(msg) => assert!(msg.contains("/nonexistent/slack.json")),
        e => panic!("Expected LoadError, got {:?}", e),
    }
}

#[test]
fn load_invalid_yaml_returns_validation_error() {
    let err = HandlerSettings::load(&fixture_path("settings_invalid_yaml.yaml"), "slack")
        .unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
}

#[test]
fn wrongly_typed_setting_is_validation_error() {
    let err = HandlerSettings::from_str_section("slack:\n  webhook_retries: lots\n", "slack")
        .unwrap_err();
    match err {
        ConfigError::ValidationError(msg) => assert!(msg.contains("section 'slack'")),
        e => panic!("Expected ValidationError, got {:?}", e),
    }
}

#[test]
fn null_section_counts_as_missing() {
    let err = HandlerSettings::from_str_section("slack: ~\n", "slack").unwrap_err();
    assert!(matches!(err, ConfigError::MissingSection { .. }));
}

// ============================================================
// Compilation
// ============================================================

#[test]
fn compile_applies_defaults() {
    let config = compile_yaml(
        r#"
slack:
  webhook_url: https://hooks.slack.com/services/T0/B0/x
"#,
    )
    .unwrap();

    assert_eq!(config.name, "slack");
    assert_eq!(config.retry, RetryPolicy::default());
    assert_eq!(config.retry.retries, 5);
    assert_eq!(config.retry.timeout, Duration::from_secs(10));
    assert_eq!(config.retry.retry_sleep, Duration::from_secs(5));
    assert!(config.payload.markdown_enabled);
    assert_eq!(config.payload.icon_url, DEFAULT_ICON_URL);
    assert!(config.payload.fields.is_empty());
    assert!(config.channels.default.is_empty());
    assert!(config.channels.compulsory.is_empty());
    assert!(config.proxy.is_none());
    assert!(config.notice.template.is_none());
}

#[test]
fn compile_full_json_fixture() {
    let settings = HandlerSettings::load(&fixture_path("settings_single.json"), "slack").unwrap();
    let config = settings.compile("slack", &fixtures_dir()).unwrap();

    assert_eq!(config.channels.default, vec!["#monitoring"]);
    assert_eq!(
        config.notice.template,
        Some(fixtures_dir().join("templates/notice.j2"))
    );
    assert_eq!(config.notice.surround.as_deref(), Some("`"));
    assert_eq!(config.payload.fields, vec!["environment", "owner"]);
    assert_eq!(config.payload.bot_name.as_deref(), Some("sensu"));
    assert_eq!(config.payload.link_names, Some(LinkNames::Flag(true)));
    assert_eq!(
        config.retry,
        RetryPolicy {
            retries: 3,
            timeout: Duration::from_secs(5),
            retry_sleep: Duration::from_millis(500),
        }
    );

    let proxy = config.proxy.unwrap();
    assert_eq!(proxy.url, "http://proxy.internal:3128");
    let (user, password) = proxy.credentials.unwrap();
    assert_eq!(user, "svc-monitor");
    assert_eq!(password.expose(), "hunter2");
}

#[test]
fn compile_multichannel_fixture() {
    let settings =
        HandlerSettings::load(&fixture_path("settings_multichannel.yaml"), "slack-multi").unwrap();
    let config = settings.compile("slack-multi", &fixtures_dir()).unwrap();

    assert_eq!(config.channels.default, vec!["#ops"]);
    assert_eq!(config.channels.compulsory, vec!["#all-alerts"]);
    assert!(!config.payload.markdown_enabled);
    assert!(config.payload.template.is_some());

    assert!(matches!(config.endpoints, Endpoints::PerChannel(_)));
    assert_eq!(
        config.endpoints.for_channel("#db-team").map(SecretString::expose),
        Some("https://hooks.slack.com/services/T000/B002/db")
    );
    assert!(config.endpoints.for_channel("#unmapped").is_none());
}

#[test]
fn channels_default_wins_over_single_channel() {
    let config = compile_yaml(
        r##"
slack:
  webhook_url: https://hooks.slack.com/services/T0/B0/x
  channel: "#single"
  channels:
    default: ["#a", "#b"]
"##,
    )
    .unwrap();
    assert_eq!(config.channels.default, vec!["#a", "#b"]);
}

#[test]
fn custom_field_alias_accepts_single_name() {
    let config = compile_yaml(
        r#"
slack:
  webhook_url: https://hooks.slack.com/services/T0/B0/x
  custom_field: environment
"#,
    )
    .unwrap();
    assert_eq!(config.payload.fields, vec!["environment"]);
}

#[test]
fn proxy_addr_alias_and_scheme_preserved() {
    let config = compile_yaml(
        r#"
slack:
  webhook_url: https://hooks.slack.com/services/T0/B0/x
  proxy_addr: https://proxy.example.com
"#,
    )
    .unwrap();
    let proxy = config.proxy.unwrap();
    assert_eq!(proxy.url, "https://proxy.example.com");
    assert!(proxy.credentials.is_none());
}

#[test]
fn proxy_port_replaces_port_in_address() {
    let config = compile_yaml(
        r#"
slack:
  webhook_url: https://hooks.slack.com/services/T0/B0/x
  proxy_address: proxy.internal:8080
  proxy_port: 3128
"#,
    )
    .unwrap();
    assert_eq!(config.proxy.unwrap().url, "http://proxy.internal:3128");

    let config = compile_yaml(
        r#"
slack:
  webhook_url: https://hooks.slack.com/services/T0/B0/x
  proxy_address: http://proxy.internal:8080/
"#,
    )
    .unwrap();
    assert_eq!(config.proxy.unwrap().url, "http://proxy.internal:8080");
}

#[test]
fn numeric_link_names_is_accepted() {
    let config = compile_yaml(
        r#"
slack:
  webhook_url: https://hooks.slack.com/services/T0/B0/x
  link_names: 1
"#,
    )
    .unwrap();
    assert_eq!(config.payload.link_names, Some(LinkNames::Number(1)));
}

#[test]
fn single_endpoint_serves_every_channel() {
    let config = compile_yaml(
        r#"
slack:
  webhook_url: https://hooks.slack.com/services/T0/B0/x
"#,
    )
    .unwrap();
    assert!(config.endpoints.for_channel("#anything").is_some());
}

// ============================================================
// Validation
// ============================================================

#[test]
fn compile_collects_all_errors() {
    let settings =
        HandlerSettings::load(&fixture_path("settings_missing_webhook.yaml"), "slack").unwrap();
    let errors = settings.compile("slack", &fixtures_dir()).unwrap_err();

    assert_eq!(errors.len(), 3, "errors: {:?}", errors);
    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    assert!(messages.iter().any(|m| m.contains("webhook_url or webhook_urls")));
    assert!(messages.iter().any(|m| m.contains("webhook_retries")));
    assert!(messages.iter().any(|m| m.contains("proxy_address")));
}

#[test]
fn invalid_webhook_url_is_rejected() {
    let errors = compile_yaml(
        r#"
slack:
  webhook_url: not a url
"#,
    )
    .unwrap_err();
    assert!(matches!(
        &errors[0],
        ConfigError::InvalidSetting { key, .. } if key == "webhook_url"
    ));
}

#[test]
fn invalid_per_channel_url_names_the_channel() {
    let errors = compile_yaml(
        r##"
slack:
  webhook_urls:
    "#ok": https://hooks.slack.com/services/T0/B0/x
    "#bad": nope
"##,
    )
    .unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("webhook_urls.#bad"));
}

#[test]
fn proxy_username_requires_password() {
    let errors = compile_yaml(
        r#"
slack:
  webhook_url: https://hooks.slack.com/services/T0/B0/x
  proxy_address: proxy.internal
  proxy_username: bob
"#,
    )
    .unwrap_err();
    assert!(errors[0].to_string().contains("proxy_password"));
}

#[test]
fn zero_timeout_is_rejected() {
    let errors = compile_yaml(
        r#"
slack:
  webhook_url: https://hooks.slack.com/services/T0/B0/x
  webhook_timeout: 0
"#,
    )
    .unwrap_err();
    assert!(errors[0].to_string().contains("webhook_timeout"));
}

#[test]
#[serial]
fn webhook_url_env_var_is_resolved() {
    temp_env::with_var(
        "TEST_SLACK_HOOK",
        Some("https://hooks.slack.com/services/T9/B9/env"),
        || {
            let config = compile_yaml(
                r#"
slack:
  webhook_url: ${TEST_SLACK_HOOK}
"#,
            )
            .unwrap();
            assert_eq!(
                config.endpoints.for_channel("#x").map(SecretString::expose),
                Some("https://hooks.slack.com/services/T9/B9/env")
            );
        },
    );
}

#[test]
#[serial]
fn undefined_env_var_in_webhook_fails() {
    temp_env::with_var("UNDEFINED_SLACK_HOOK", None::<&str>, || {
        let errors = compile_yaml(
            r#"
slack:
  webhook_url: ${UNDEFINED_SLACK_HOOK}
"#,
        )
        .unwrap_err();
        assert!(errors[0].to_string().contains("UNDEFINED_SLACK_HOOK"));
    });
}

#[test]
fn check_templates_reports_broken_and_missing_files() {
    let config = compile_yaml(
        r#"
slack:
  webhook_url: https://hooks.slack.com/services/T0/B0/x
  template: /nonexistent/notice.j2
"#,
    )
    .unwrap();
    let errors = config.check_templates();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("invalid setting 'template'"));

    let mut config = config;
    config.notice.template = Some(fixture_path("templates/broken.j2"));
    config.payload.template = Some(fixture_path("templates/payload.json.j2"));
    let errors = config.check_templates();
    assert_eq!(errors.len(), 1);
}

#[test]
fn debug_output_does_not_expose_secrets() {
    let settings = HandlerSettings::load(&fixture_path("settings_single.json"), "slack").unwrap();
    let config = settings.compile("slack", &fixtures_dir()).unwrap();
    let debug = format!("{:?}", config);

    assert!(!debug.contains("XXXX"));
    assert!(!debug.contains("hunter2"));
    assert!(debug.contains("[REDACTED]"));
}

#[test]
fn default_paths_and_section() {
    assert_eq!(DEFAULT_CONFIG_PATH, "/etc/sensu/conf.d/slack.json");
    assert_eq!(DEFAULT_SECTION, "slack");
}
