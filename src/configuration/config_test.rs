use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;

use super::load_user_context;
use super::parse_assistant_config;
use super::Config;
use super::ConfigKey;
use crate::application::cli;
use crate::domain::models::Language;
use crate::domain::models::VoiceMode;
use crate::domain::models::VoiceSettings;

fn getter(overrides: &[(ConfigKey, &str)]) -> impl Fn(ConfigKey) -> String {
    let values = overrides
        .iter()
        .map(|(key, val)| return (key.to_string(), val.to_string()))
        .collect::<HashMap<String, String>>();

    return move |key: ConfigKey| {
        if let Some(val) = values.get(&key.to_string()) {
            return val.to_string();
        }
        return Config::default(key);
    };
}

#[test]
fn it_serializes_to_valid_toml() {
    let res = Config::serialize_default(cli::build());
    let doc = res.parse::<toml_edit::Document>().unwrap();

    assert_eq!(
        doc["backend-url"].as_str(),
        Some("http://localhost:8000/api")
    );
    assert_eq!(doc["backend-health-check-timeout"].as_integer(), Some(1000));
    assert_eq!(doc["language"].as_str(), Some("en"));
    assert_eq!(doc["voice-mode"].as_str(), Some("push-to-talk"));
    assert_eq!(doc["voice-rate"].as_float(), Some(1.0));
    assert_eq!(doc["user-id"].as_str(), Some("guest_user"));
    assert!(doc.get("session-id").is_none());
    assert!(doc.get("config-file").is_none());
    assert!(doc.get("capture-command").is_none());
    assert!(res.contains("# capture-command = \"\""));
    assert!(res.contains("[possible values: off, push-to-talk, continuous]"));
}

#[tokio::test]
async fn it_loads_config_from_file() -> Result<()> {
    let matches =
        cli::build().try_get_matches_from(vec!["mitron", "chat", "-c", "./config.example.toml"])?;
    let (_, subcmd_matches) = matches.subcommand().unwrap();
    Config::load(cli::build(), vec![&matches, subcmd_matches]).await?;
    return Ok(());
}

#[tokio::test]
async fn it_fails_to_loads_config_from_file() -> Result<()> {
    let matches =
        cli::build().try_get_matches_from(vec!["mitron", "-c", "./test/bad-config.toml"])?;
    let res = Config::load(cli::build(), vec![&matches]).await;
    assert!(res.is_err());
    insta::assert_snapshot!(res.unwrap_err().to_string(), @r###"
    config.toml has an invalid value for key 'voice-mode': always-on
    Possible values are: off, push-to-talk, continuous
    "###);
    return Ok(());
}

#[test]
fn it_builds_assistant_config_from_defaults() -> Result<()> {
    let res = parse_assistant_config(getter(&[]), None)?;

    assert_eq!(res.language, Language::En);
    assert_eq!(res.user_id, "guest_user");
    assert_eq!(res.voice_mode, VoiceMode::PushToTalk);
    assert_eq!(res.voice_settings, VoiceSettings::default());
    assert_eq!(res.restart_delay, Duration::from_millis(500));
    assert!(res.user_context.is_none());
    return Ok(());
}

#[test]
fn it_clamps_voice_settings() -> Result<()> {
    let res = parse_assistant_config(
        getter(&[
            (ConfigKey::Language, "TA"),
            (ConfigKey::VoiceMode, "continuous"),
            (ConfigKey::VoiceRate, "3.5"),
            (ConfigKey::VoicePitch, "-1"),
            (ConfigKey::VoiceVolume, "0.4"),
            (ConfigKey::VoiceIndex, "2"),
            (ConfigKey::UserId, "  "),
        ]),
        None,
    )?;

    assert_eq!(res.language, Language::Ta);
    assert_eq!(res.voice_mode, VoiceMode::Continuous);
    assert_eq!(res.voice_settings, VoiceSettings::new(2.0, 0.0, 0.4, 2));
    assert_eq!(res.user_id, "guest_user");
    return Ok(());
}

#[test]
fn it_rejects_unknown_language() {
    let res = parse_assistant_config(getter(&[(ConfigKey::Language, "fr")]), None);
    insta::assert_snapshot!(res.unwrap_err().to_string(), @"Unsupported language 'fr'");
}

#[test]
fn it_rejects_bad_numbers() {
    let res = parse_assistant_config(getter(&[(ConfigKey::VoiceRate, "fast")]), None);
    insta::assert_snapshot!(res.unwrap_err().to_string(), @"Invalid value for 'voice-rate': fast is not a number");
}

#[tokio::test]
async fn it_loads_user_context() -> Result<()> {
    assert!(load_user_context("").await?.is_none());

    let res = load_user_context("./test/user-context.json").await?.unwrap();
    assert_eq!(res["location"], "Thanjavur");
    assert_eq!(res["crops"][0], "rice");
    return Ok(());
}

#[tokio::test]
async fn it_fails_on_missing_user_context() {
    let res = load_user_context("./test/missing.json").await;
    assert!(res.is_err());
}
