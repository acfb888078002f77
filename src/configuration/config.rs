#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::env;
use std::path;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

use crate::domain::models::Language;
use crate::domain::models::VoiceMode;
use crate::domain::models::VoiceSettings;
use crate::domain::services::AssistantConfig;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    BackendUrl,
    BackendHealthCheckTimeout,
    CaptureCommand,
    ConfigFile,
    Language,
    PlayerCommand,
    SessionID,
    SynthesisCommand,
    UserContextFile,
    UserId,
    VoiceIndex,
    VoiceMode,
    VoicePitch,
    VoiceRate,
    VoiceVolume,
}

pub struct Config {}

fn parse_number<T: std::str::FromStr>(get: &impl Fn(ConfigKey) -> String, key: ConfigKey) -> Result<T> {
    let val = get(key);
    match val.trim().parse::<T>() {
        Ok(res) => return Ok(res),
        Err(_) => bail!(format!("Invalid value for '{key}': {val} is not a number")),
    }
}

/// Builds the assistant settings from config values, reading each key with
/// `get`.
pub fn parse_assistant_config(
    get: impl Fn(ConfigKey) -> String,
    user_context: Option<serde_json::Value>,
) -> Result<AssistantConfig> {
    let language_code = get(ConfigKey::Language);
    let Some(language) = Language::parse(&language_code) else {
        bail!(format!("Unsupported language '{language_code}'"));
    };

    let mode = get(ConfigKey::VoiceMode);
    let Some(voice_mode) = VoiceMode::parse(&mode) else {
        bail!(format!("Unsupported voice mode '{mode}'"));
    };

    let voice_settings = VoiceSettings::new(
        parse_number(&get, ConfigKey::VoiceRate)?,
        parse_number(&get, ConfigKey::VoicePitch)?,
        parse_number(&get, ConfigKey::VoiceVolume)?,
        parse_number(&get, ConfigKey::VoiceIndex)?,
    );

    let mut user_id = get(ConfigKey::UserId).trim().to_string();
    if user_id.is_empty() {
        user_id = Config::default(ConfigKey::UserId);
    }

    return Ok(AssistantConfig {
        language,
        user_id,
        voice_mode,
        voice_settings,
        user_context,
        restart_delay: Duration::from_millis(500),
    });
}

/// Reads the farmer profile and sensor snapshot forwarded with every chat
/// turn. An empty path means no context.
pub async fn load_user_context(file: &str) -> Result<Option<serde_json::Value>> {
    if file.trim().is_empty() {
        return Ok(None);
    }

    let json_str = fs::read_to_string(file).await?;
    let value = serde_json::from_str::<serde_json::Value>(&json_str)?;
    tracing::debug!(file, "Loaded user context");

    return Ok(Some(value));
}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    pub fn default(key: ConfigKey) -> String {
        #[cfg(not(target_os = "macos"))]
        let config_dir = dirs::config_dir().unwrap_or_else(env::temp_dir);
        #[cfg(target_os = "macos")]
        let config_dir = dirs::home_dir()
            .unwrap_or_else(env::temp_dir)
            .join(".config");
        let config_path = config_dir.join("mitron/config.toml");

        let res = match key {
            ConfigKey::BackendUrl => "http://localhost:8000/api",
            ConfigKey::BackendHealthCheckTimeout => "1000",
            ConfigKey::CaptureCommand => "",
            ConfigKey::Language => "en",
            ConfigKey::PlayerCommand => "",
            ConfigKey::SynthesisCommand => "",
            ConfigKey::UserContextFile => "",
            ConfigKey::UserId => "guest_user",
            ConfigKey::VoiceIndex => "0",
            ConfigKey::VoiceMode => "push-to-talk",
            ConfigKey::VoicePitch => "1.0",
            ConfigKey::VoiceRate => "1.0",
            ConfigKey::VoiceVolume => "1.0",

            // Special
            ConfigKey::ConfigFile => return config_path.to_string_lossy().to_string(),
            ConfigKey::SessionID => "",
        };

        return res.to_string();
    }

    pub async fn load(cmd: Command, clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for key in ConfigKey::iter() {
                let Some(val) = doc.get(&key.to_string()) else {
                    continue;
                };

                // Use clap value parsers to do validation.
                let key_str = key.to_string();
                let possible_values = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key_str.as_str()))
                    .map(|arg| {
                        return arg
                            .get_possible_values()
                            .iter()
                            .map(|e| return e.get_name().to_string())
                            .collect::<Vec<String>>();
                    })
                    .unwrap_or_default();

                if let Some(val_int) = val.as_integer() {
                    Config::set(key, &val_int.to_string());
                } else if let Some(val_float) = val.as_float() {
                    Config::set(key, &val_float.to_string());
                } else if let Some(val_str) = val.as_str() {
                    if val_str.is_empty() {
                        continue;
                    }
                    if !possible_values.is_empty()
                        && !possible_values.contains(&val_str.to_string())
                    {
                        bail!(format!("config.toml has an invalid value for key '{key}': {val_str}\nPossible values are: {}", possible_values.join(", ")));
                    }
                    Config::set(key, val_str);
                }
            }
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    Config::set(key, val)
                }
            }
        }

        tracing::debug!(
            backend_url = Config::get(ConfigKey::BackendUrl),
            language = Config::get(ConfigKey::Language),
            user_id = Config::get(ConfigKey::UserId),
            voice_mode = Config::get(ConfigKey::VoiceMode),
            capture_command = Config::get(ConfigKey::CaptureCommand),
            player_command = Config::get(ConfigKey::PlayerCommand),
            synthesis_command = Config::get(ConfigKey::SynthesisCommand),
            "config"
        );

        return Ok(());
    }

    /// Settings for the assistant from the loaded config.
    pub async fn assistant_config() -> Result<AssistantConfig> {
        let user_context = load_user_context(&Config::get(ConfigKey::UserContextFile)).await?;
        return parse_assistant_config(Config::get, user_context);
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::SessionID || key == ConfigKey::ConfigFile {
                    return None;
                }

                let key_str = key.to_string();
                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key_str.as_str()))?;

                let mut description = arg
                    .get_help()
                    .map(|e| return e.to_string())
                    .unwrap_or_default();

                description = description
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                if !arg.get_possible_values().is_empty() {
                    let possible_values = arg
                        .get_possible_values()
                        .iter()
                        .map(|e| return e.get_name().to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    description = format!("{description} [possible values: {}]", possible_values);
                }

                let mut val = Config::default(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<i64>().is_ok() || val.parse::<f64>().is_ok() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{val}\"");
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
