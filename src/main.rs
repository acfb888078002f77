#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;

use anyhow::Error;
use anyhow::Result;
use owo_colors::OwoColorize;
use tokio::sync::mpsc;
use tokio::task;

use crate::application::cli;
use crate::application::shell;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::services::Assistant;
use crate::infrastructure::backends::BackendManager;
use crate::infrastructure::hosts::HostManager;

fn handle_error(err: Error) {
    eprintln!(
        "{}",
        format!(
            "Oh no! Mitron has failed with the following app version and error.\n\nVersion: {}\nError: {}",
            env!("CARGO_PKG_VERSION"),
            err
        )
        .red()
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

async fn start() -> Result<()> {
    let assistant_config = Config::assistant_config().await?;

    let (action_tx, action_rx) = mpsc::unbounded_channel::<Action>();
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    let assistant = Assistant::new(
        BackendManager::get(),
        HostManager::detect(),
        assistant_config,
        event_tx,
    );

    let session_id = Config::get(ConfigKey::SessionID);
    if !session_id.is_empty() {
        action_tx.send(Action::LoadSession(session_id))?;
    }

    let mut background_futures = task::JoinSet::new();
    background_futures.spawn(async move {
        return assistant.run(action_rx).await;
    });

    let shell_future = shell::start(action_tx, event_rx);

    let res = tokio::select!(
        res = background_futures.join_next() => match res {
            Some(Ok(res)) => res,
            Some(Err(err)) => Err(err.into()),
            None => Ok(()),
        },
        res = shell_future => res,
    );

    return res;
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let debug_log_dir = env::var("MITRON_LOG_DIR").unwrap_or_else(|_| {
        return dirs::cache_dir()
            .unwrap_or_else(env::temp_dir)
            .join("mitron")
            .to_string_lossy()
            .to_string();
    });

    let file_appender = tracing_appender::rolling::never(debug_log_dir, "debug.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("mitron")
    {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(writer)
            .init();
    }

    match cli::parse().await {
        Ok(true) => {}
        Ok(false) => process::exit(0),
        Err(err) => {
            handle_error(err);
            return;
        }
    }

    if let Err(err) = start().await {
        handle_error(err);
    }

    process::exit(0);
}
