#[cfg(test)]
#[path = "shell_test.rs"]
mod tests;

use anyhow::Result;
use owo_colors::OwoColorize;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::mpsc;

use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::models::InteractionStatus;
use crate::domain::models::Language;
use crate::domain::models::Message;
use crate::domain::models::MessageType;
use crate::domain::models::Session;
use crate::domain::models::SlashCommand;
use crate::domain::models::VoiceMode;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /listen (/l) - Start listening on the microphone.
- /stop (/s) - Stop listening. In continuous mode this also stops the automatic restart.
- /send - Submit the transcript heard in push-to-talk mode.
- /mode [off,push-to-talk,continuous] - Change how the microphone is driven.
- /language (/lang) [en,hi,ta,te,kn,ml,bn,gu,mr,ur] - Change the reply, capture and speech language.
- /say [TEXT] - Speak the text aloud without sending it.
- /mute - Stop speaking.
- /history - List previous sessions.
- /load [SESSION_ID,SESSION_INDEX] - Load a previous session. You can pass either the session ID, or the index from /history
- /new - Start a new conversation.
- /online /offline - Override the connectivity state.
- /quit /exit (/q) - Exit Mitron.
- /help (/h) - Provides this help menu.

VOICE:
Anything that isn't a command is sent to the assistant as a question. In push-to-talk mode the recognized speech is shown first and sent with /send. In continuous mode every finished sentence is sent straight away and the microphone reopens once the reply has been spoken.
        "#;

    return text.trim().to_string();
}

/// What a line typed into the shell asks for.
#[derive(Debug, PartialEq)]
pub enum Input {
    Action(Action),
    Help,
    Quit,
    Usage(String),
}

/// Maps a typed line to an input. `listed` holds the sessions from the last
/// history listing so `/load` accepts their index.
pub fn parse_input(line: &str, listed: &[Session]) -> Option<Input> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let Some(command) = SlashCommand::parse(line) else {
        return Some(Input::Action(Action::Submit(line.to_string())));
    };

    if command.is_quit() {
        return Some(Input::Quit);
    }
    if command.is_help() {
        return Some(Input::Help);
    }
    if command.is_listen() {
        return Some(Input::Action(Action::CaptureStart()));
    }
    if command.is_stop() {
        return Some(Input::Action(Action::CaptureStop()));
    }
    if command.is_send() {
        return Some(Input::Action(Action::SubmitPending()));
    }
    if command.is_mute() {
        return Some(Input::Action(Action::StopSpeaking()));
    }
    if command.is_history() {
        return Some(Input::Action(Action::ListSessions()));
    }
    if command.is_new() {
        return Some(Input::Action(Action::NewSession()));
    }
    if command.is_online() {
        return Some(Input::Action(Action::SetOnline(true)));
    }
    if command.is_offline() {
        return Some(Input::Action(Action::SetOnline(false)));
    }
    if command.is_say() {
        return Some(Input::Action(Action::Speak(command.rest())));
    }

    if command.is_mode() {
        if let Some(mode) = VoiceMode::parse(&command.rest()) {
            return Some(Input::Action(Action::SetVoiceMode(mode)));
        }
        return Some(Input::Usage(
            "Usage: /mode [off,push-to-talk,continuous]".to_string(),
        ));
    }

    if command.is_language() {
        if let Some(language) = Language::parse(&command.rest()) {
            return Some(Input::Action(Action::SetLanguage(language)));
        }
        return Some(Input::Usage(
            "Usage: /language [en,hi,ta,te,kn,ml,bn,gu,mr,ur]".to_string(),
        ));
    }

    if command.is_load() {
        let target = command.rest();
        if let Ok(idx) = target.parse::<usize>() {
            if idx == 0 || idx > listed.len() {
                return Some(Input::Usage(format!(
                    "Session index {idx} does not exist. Run /history first."
                )));
            }
            return Some(Input::Action(Action::LoadSession(
                listed[idx - 1].id.to_string(),
            )));
        }
        return Some(Input::Action(Action::LoadSession(target)));
    }

    return Some(Input::Usage(
        "Usage: /say [TEXT] or /load [SESSION_ID,SESSION_INDEX]".to_string(),
    ));
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    User,
    Assistant,
    Error,
    Muted,
    Notice,
}

/// Single printable line for the terminal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    pub tone: Tone,
    pub text: String,
}

impl Line {
    fn new(tone: Tone, text: &str) -> Line {
        return Line {
            tone,
            text: text.to_string(),
        };
    }

    fn paint(&self) -> String {
        match self.tone {
            Tone::User => return self.text.cyan().to_string(),
            Tone::Assistant => return self.text.green().to_string(),
            Tone::Error => return self.text.red().to_string(),
            Tone::Muted => return self.text.dimmed().to_string(),
            Tone::Notice => return self.text.yellow().to_string(),
        }
    }
}

fn message_line(message: &Message) -> Line {
    if message.message_type() == MessageType::Error {
        return Line::new(Tone::Error, &format!("Mitron: {}", message.text()));
    }
    if message.is_user() {
        return Line::new(Tone::User, &format!("You: {}", message.text()));
    }
    return Line::new(Tone::Assistant, &format!("Mitron: {}", message.text()));
}

/// Turns an assistant event into the lines the shell prints.
pub fn describe(event: &Event) -> Vec<Line> {
    match event {
        Event::MessageAdded(message) => return vec![message_line(message)],
        Event::MessagesReplaced(messages) => {
            let mut lines = vec![Line::new(Tone::Muted, "----")];
            lines.extend(messages.iter().map(message_line));
            return lines;
        }
        Event::StatusChanged(status) => {
            let text = match status {
                InteractionStatus::Idle => "Ready",
                InteractionStatus::Listening => "Listening...",
                InteractionStatus::Processing => "Thinking...",
                InteractionStatus::Speaking => "Speaking... (/mute to stop)",
            };
            return vec![Line::new(Tone::Muted, &format!("[{text}]"))];
        }
        Event::InterimTranscript(text) => {
            if text.is_empty() {
                return vec![];
            }
            return vec![Line::new(Tone::Muted, &format!("... {text}"))];
        }
        Event::PendingInput(text) => {
            if text.is_empty() {
                return vec![];
            }
            return vec![Line::new(
                Tone::Notice,
                &format!("Heard: {text} (/send to ask, or keep typing)"),
            )];
        }
        Event::SessionsListed(sessions) => {
            if sessions.is_empty() {
                return vec![Line::new(Tone::Muted, "No previous sessions.")];
            }
            return sessions
                .iter()
                .enumerate()
                .map(|(idx, session)| {
                    return Line::new(Tone::Muted, &format!("{}. {}", idx + 1, session.format()));
                })
                .collect();
        }
        Event::VoiceError(err) => return vec![Line::new(Tone::Error, &err.to_string())],
        Event::ConnectivityChanged(online) => {
            if *online {
                return vec![Line::new(Tone::Notice, "Online")];
            }
            return vec![Line::new(
                Tone::Notice,
                "Offline. Questions will not be sent until the server is reachable.",
            )];
        }
        Event::LanguageChanged(language) => {
            return vec![Line::new(
                Tone::Notice,
                &format!("Language: {} ({language})", language.native_name()),
            )];
        }
        Event::VoiceModeChanged(mode) => {
            return vec![Line::new(Tone::Notice, &format!("Voice mode: {mode}"))];
        }
        Event::SessionChanged(_) => return vec![],
    }
}

fn print_lines(lines: Vec<Line>) {
    for line in lines {
        println!("{}", line.paint());
    }
}

/// Runs the line based shell until the user quits, stdin closes or the
/// assistant goes away.
pub async fn start(
    tx: mpsc::UnboundedSender<Action>,
    mut rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut listed: Vec<Session> = vec![];

    loop {
        tokio::select! {
            line = stdin.next_line() => {
                let Some(line) = line? else {
                    break;
                };

                match parse_input(&line, &listed) {
                    Some(Input::Action(action)) => {
                        tracing::debug!(?action, "Shell action");
                        if tx.send(action).is_err() {
                            break;
                        }
                    }
                    Some(Input::Help) => println!("{}", help_text()),
                    Some(Input::Usage(text)) => println!("{}", text.yellow()),
                    Some(Input::Quit) => break,
                    None => {}
                }
            }
            event = rx.recv() => {
                let Some(event) = event else {
                    break;
                };

                if let Event::SessionsListed(sessions) = &event {
                    listed = sessions.clone();
                }
                print_lines(describe(&event));
            }
        }
    }

    return Ok(());
}
