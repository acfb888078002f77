#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use owo_colors::OwoColorize;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::shell::help_text;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Language;
use crate::domain::models::Session;
use crate::domain::models::VoiceMode;
use crate::domain::services::Sessions;
use crate::infrastructure::backends::BackendManager;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

async fn list_sessions(user_id: &str) -> Vec<Session> {
    let language = Language::parse(&Config::get(ConfigKey::Language)).unwrap_or_default();
    return Sessions::new(language)
        .list(&BackendManager::get(), user_id)
        .await;
}

async fn print_sessions_list(user_id: &str) -> Result<()> {
    let sessions = list_sessions(user_id)
        .await
        .iter()
        .map(|session| {
            return format!("- {}", session.format());
        })
        .collect::<Vec<String>>();

    if sessions.is_empty() {
        println!("There are no sessions available. You should start your first one!");
    } else {
        println!("{}", sessions.join("\n"));
    }

    return Ok(());
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(config_file_path.clone()).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

/// Asks which stored session to reopen. Returns false when there is nothing
/// to pick or the prompt was dismissed.
async fn select_session_interactive() -> Result<bool> {
    let sessions = list_sessions(&Config::get(ConfigKey::UserId)).await;

    if sessions.is_empty() {
        println!("There are no sessions available. You should start your first one!");
        return Ok(false);
    }

    let session_options = sessions
        .iter()
        .map(|session| {
            return session.format();
        })
        .collect::<Vec<String>>();

    let idx = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Which session would you like to load?")
        .default(0)
        .items(&session_options)
        .interact_opt()?;

    let Some(idx) = idx else {
        return Ok(false);
    };

    Config::set(ConfigKey::SessionID, &sessions[idx].id);
    return Ok(true);
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn arg_backend_url() -> Arg {
    return Arg::new(ConfigKey::BackendUrl.to_string())
        .short('u')
        .long(ConfigKey::BackendUrl.to_string())
        .env("MITRON_BACKEND_URL")
        .num_args(1)
        .help(format!(
            "Base URL of the farm assistant server. [default: {}]",
            Config::default(ConfigKey::BackendUrl)
        ));
}

fn arg_backend_health_check_timeout() -> Arg {
    return Arg::new(ConfigKey::BackendHealthCheckTimeout.to_string())
        .long(ConfigKey::BackendHealthCheckTimeout.to_string())
        .env("MITRON_BACKEND_HEALTH_CHECK_TIMEOUT")
        .num_args(1)
        .help(
            format!("Time to wait in milliseconds before timing out when doing a healthcheck for the server. [default: {}]", Config::default(ConfigKey::BackendHealthCheckTimeout)),
        );
}

fn arg_language() -> Arg {
    return Arg::new(ConfigKey::Language.to_string())
        .short('l')
        .long(ConfigKey::Language.to_string())
        .env("MITRON_LANGUAGE")
        .num_args(1)
        .help(format!(
            "Language for replies, speech capture and playback. [default: {}]",
            Config::default(ConfigKey::Language)
        ))
        .value_parser(PossibleValuesParser::new(Language::VARIANTS));
}

fn arg_voice_mode() -> Arg {
    return Arg::new(ConfigKey::VoiceMode.to_string())
        .short('v')
        .long(ConfigKey::VoiceMode.to_string())
        .env("MITRON_VOICE_MODE")
        .num_args(1)
        .help(format!(
            "How the microphone is driven. [default: {}]",
            Config::default(ConfigKey::VoiceMode)
        ))
        .value_parser(PossibleValuesParser::new(VoiceMode::VARIANTS));
}

fn subcommand_chat() -> Command {
    return Command::new("chat")
        .about("Start talking to the farm assistant.")
        .arg(arg_backend_url())
        .arg(arg_backend_health_check_timeout())
        .arg(arg_language())
        .arg(arg_voice_mode());
}

fn subcommand_sessions() -> Command {
    return Command::new("sessions")
        .about("Browse past conversations stored on the server.")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("list")
                .about("List previous sessions with their ids, titles and last message.")
                .arg(
                    clap::Arg::new("user")
                        .long("user")
                        .help("User whose sessions to list. Defaults to the configured user-id.")
                        .num_args(1),
                ),
        )
        .subcommand(
            Command::new("open")
                .about("Open a previous session by ID. Omit passing any session ID to load an interactive selection.")
                .arg(
                    clap::Arg::new(ConfigKey::SessionID.to_string())
                        .short('i')
                        .long("id")
                        .help("Session ID")
                        .required(false),
                ),
        );
}

fn global_arg(key: ConfigKey, env: &'static str, help: &str) -> Arg {
    return Arg::new(key.to_string())
        .long(key.to_string())
        .env(env)
        .num_args(1)
        .help(help.to_string())
        .global(true);
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") || line.starts_with("VOICE:") {
                return format!("SHELL {line}").underline().bold().to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("mitron")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(subcommand_chat())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(Command::new("manpages").about("Generates manpages and outputs to stdout."))
        .subcommand(subcommand_sessions())
        .arg(arg_backend_url())
        .arg(arg_backend_health_check_timeout())
        .arg(arg_language())
        .arg(arg_voice_mode())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("MITRON_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(global_arg(
            ConfigKey::UserId,
            "MITRON_USER_ID",
            &format!("Identity sent with every chat turn and used to list history. [default: {}]", Config::default(ConfigKey::UserId)),
        ))
        .arg(global_arg(
            ConfigKey::UserContextFile,
            "MITRON_USER_CONTEXT_FILE",
            "JSON file with the farmer profile and sensor readings forwarded with every chat turn.",
        ))
        .arg(global_arg(
            ConfigKey::CaptureCommand,
            "MITRON_CAPTURE_COMMAND",
            "Speech recognizer command. Receives {locale} and {lang}, prints transcripts on stdout. Voice input is disabled when unset.",
        ))
        .arg(global_arg(
            ConfigKey::PlayerCommand,
            "MITRON_PLAYER_COMMAND",
            "Audio player for server speech. Receives the clip as {file}. Server speech is skipped when unset.",
        ))
        .arg(global_arg(
            ConfigKey::SynthesisCommand,
            "MITRON_SYNTHESIS_COMMAND",
            "Local text to speech fallback. Receives {text}, {locale}, {lang}, {rate}, {pitch}, {volume} and {voice}.",
        ))
        .arg(global_arg(
            ConfigKey::VoiceRate,
            "MITRON_VOICE_RATE",
            &format!("Local speech rate, 0.5 to 2.0. [default: {}]", Config::default(ConfigKey::VoiceRate)),
        ))
        .arg(global_arg(
            ConfigKey::VoicePitch,
            "MITRON_VOICE_PITCH",
            &format!("Local speech pitch, 0.0 to 2.0. [default: {}]", Config::default(ConfigKey::VoicePitch)),
        ))
        .arg(global_arg(
            ConfigKey::VoiceVolume,
            "MITRON_VOICE_VOLUME",
            &format!("Local speech volume, 0.0 to 1.0. [default: {}]", Config::default(ConfigKey::VoiceVolume)),
        ))
        .arg(global_arg(
            ConfigKey::VoiceIndex,
            "MITRON_VOICE_INDEX",
            &format!("Local voice to use, passed as {{voice}}. [default: {}]", Config::default(ConfigKey::VoiceIndex)),
        ));
}

/// Parses the command line. Returns true when the interactive shell should
/// start.
pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("chat", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        Some(("manpages", _)) => {
            clap_mangen::Man::new(build()).render(&mut io::stdout())?;
            return Ok(false);
        }
        Some(("sessions", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("list", list_matches)) => {
                Config::load(build(), vec![&matches, subcmd_matches, list_matches]).await?;
                let user_id = list_matches
                    .get_one::<String>("user")
                    .cloned()
                    .unwrap_or_else(|| return Config::get(ConfigKey::UserId));
                print_sessions_list(&user_id).await?;
                return Ok(false);
            }
            Some(("open", open_matches)) => {
                Config::load(build(), vec![&matches, subcmd_matches, open_matches]).await?;
                if Config::get(ConfigKey::SessionID).is_empty() {
                    return select_session_interactive().await;
                }
            }
            _ => {
                subcommand_sessions().print_long_help()?;
                return Ok(false);
            }
        },
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(true);
}
