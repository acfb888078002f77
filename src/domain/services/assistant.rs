#[cfg(test)]
#[path = "assistant_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use super::translate;
use super::Begin;
use super::CaptureOutcome;
use super::DispatchResult;
use super::Dispatcher;
use super::Interaction;
use super::Phrase;
use super::PlaybackOutcome;
use super::Sessions;
use super::SpeechOutput;
use super::StatusEvent;
use super::VoiceInput;
use crate::domain::models::resolve_locale;
use crate::domain::models::Action;
use crate::domain::models::BackendBox;
use crate::domain::models::Capability;
use crate::domain::models::CaptureBox;
use crate::domain::models::CaptureEvent;
use crate::domain::models::CaptureState;
use crate::domain::models::Event;
use crate::domain::models::InteractionStatus;
use crate::domain::models::Language;
use crate::domain::models::Message;
use crate::domain::models::PlaybackEvent;
use crate::domain::models::PlayerBox;
use crate::domain::models::Session;
use crate::domain::models::SynthesisBox;
use crate::domain::models::VoiceError;
use crate::domain::models::VoiceMode;
use crate::domain::models::VoiceSettings;

/// Host primitives detected at startup.
#[derive(Default)]
pub struct Hosts {
    pub capture: Capability<CaptureBox>,
    pub player: Capability<PlayerBox>,
    pub synthesis: Capability<SynthesisBox>,
}

#[derive(Clone, Debug)]
pub struct AssistantConfig {
    pub language: Language,
    pub user_id: String,
    pub voice_mode: VoiceMode,
    pub voice_settings: VoiceSettings,
    pub user_context: Option<serde_json::Value>,
    /// Cooldown before continuous mode reopens the microphone.
    pub restart_delay: Duration,
}

impl Default for AssistantConfig {
    fn default() -> AssistantConfig {
        return AssistantConfig {
            language: Language::default(),
            user_id: "guest_user".to_string(),
            voice_mode: VoiceMode::default(),
            voice_settings: VoiceSettings::default(),
            user_context: None,
            restart_delay: Duration::from_millis(500),
        };
    }
}

/// Results of background work, reported back to the assistant loop.
#[derive(Debug)]
enum Work {
    HealthChecked(Result<()>),
    Replied(DispatchResult),
    SessionLoaded(String, Result<Vec<Message>>),
    SessionsListed(Result<Vec<Session>>),
    RestartCapture,
}

enum Signal {
    Action(Action),
    Capture(CaptureEvent),
    Playback(PlaybackEvent),
    Work(Work),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Restart {
    None,
    /// Waiting for the current turn to finish.
    Deferred,
    Scheduled,
}

/// The voice interaction engine. Owns every controller and is the only
/// thing that mutates them; all I/O reports back through its channels.
pub struct Assistant {
    backend: BackendBox,
    tx: mpsc::UnboundedSender<Event>,
    language: Language,
    user_id: String,
    restart_delay: Duration,
    restart: Restart,
    interaction: Interaction,
    voice: VoiceInput,
    speech: SpeechOutput,
    sessions: Sessions,
    dispatcher: Dispatcher,
    capture_rx: mpsc::UnboundedReceiver<CaptureEvent>,
    playback_rx: mpsc::UnboundedReceiver<PlaybackEvent>,
    work_tx: mpsc::UnboundedSender<Work>,
    work_rx: mpsc::UnboundedReceiver<Work>,
}

impl Assistant {
    pub fn new(
        backend: BackendBox,
        hosts: Hosts,
        config: AssistantConfig,
        tx: mpsc::UnboundedSender<Event>,
    ) -> Assistant {
        let (capture_tx, capture_rx) = mpsc::unbounded_channel::<CaptureEvent>();
        let (playback_tx, playback_rx) = mpsc::unbounded_channel::<PlaybackEvent>();
        let (work_tx, work_rx) = mpsc::unbounded_channel::<Work>();

        return Assistant {
            backend: backend.clone(),
            tx,
            language: config.language,
            user_id: config.user_id.to_string(),
            restart_delay: config.restart_delay,
            restart: Restart::None,
            interaction: Interaction::default(),
            voice: VoiceInput::new(hosts.capture, config.voice_mode, capture_tx),
            speech: SpeechOutput::new(
                backend,
                hosts.player,
                hosts.synthesis,
                config.voice_settings,
                config.language,
                playback_tx,
            ),
            sessions: Sessions::new(config.language),
            dispatcher: Dispatcher::new(&config.user_id, config.user_context),
            capture_rx,
            playback_rx,
            work_tx,
            work_rx,
        };
    }

    pub fn status(&self) -> InteractionStatus {
        return self.interaction.status();
    }

    pub fn sessions(&self) -> &Sessions {
        return &self.sessions;
    }

    pub fn voice_mode(&self) -> VoiceMode {
        return self.voice.mode();
    }

    pub fn is_capture_supported(&self) -> bool {
        return self.voice.is_supported();
    }

    fn emit(&self, event: Event) {
        if let Err(err) = self.tx.send(event) {
            tracing::debug!(error = ?err, "Event listener is gone");
        }
    }

    fn emit_since(&self, len: usize) {
        for message in self.sessions.messages().iter().skip(len) {
            self.emit(Event::MessageAdded(message.clone()));
        }
    }

    fn spawn_work<F>(&self, fut: F)
    where
        F: std::future::Future<Output = Work> + Send + 'static,
    {
        let tx = self.work_tx.clone();
        tokio::spawn(async move {
            let work = fut.await;
            if tx.send(work).is_err() {
                tracing::debug!("Assistant stopped before work completed");
            }
        });
    }

    fn set_status(&mut self, event: StatusEvent) {
        let Some(status) = self.interaction.apply(event) else {
            return;
        };

        self.emit(Event::StatusChanged(status));
        if status == InteractionStatus::Idle && self.restart == Restart::Deferred {
            self.schedule_restart();
        }
    }

    fn is_busy(&self) -> bool {
        return self.dispatcher.in_flight() > 0 || self.speech.is_speaking();
    }

    fn schedule_restart(&mut self) {
        if self.is_busy() {
            tracing::debug!("Deferring capture restart until the turn is over");
            self.restart = Restart::Deferred;
            return;
        }

        self.restart = Restart::Scheduled;
        let delay = self.restart_delay;
        self.spawn_work(async move {
            tokio::time::sleep(delay).await;
            return Work::RestartCapture;
        });
    }

    /// Voices `text`. A speak that cannot start has still cancelled the
    /// previous utterance, so the status is settled here.
    fn speak(&mut self, text: &str) -> bool {
        let started = self.speech.speak(text, None);
        if !started && !self.speech.is_speaking() {
            self.finish_playback();
        }
        return started;
    }

    /// Leaves speaking. Goes back to processing while chat turns are still in
    /// flight.
    fn finish_playback(&mut self) {
        if self.interaction.status() == InteractionStatus::Speaking
            && self.dispatcher.in_flight() > 0
        {
            self.set_status(StatusEvent::DispatchStarted);
            return;
        }
        self.set_status(StatusEvent::PlaybackFinished);
    }

    async fn start_capture(&mut self) {
        let locale = resolve_locale(&self.language.to_string());
        if let Err(err) = self.voice.start(locale).await {
            self.emit(Event::VoiceError(err));
        }
    }

    /// Shows the welcome log and probes the backend in the background.
    pub fn start(&self) {
        self.emit(Event::MessagesReplaced(self.sessions.messages().to_vec()));
        self.emit(Event::VoiceModeChanged(self.voice.mode()));

        let backend = self.backend.clone();
        self.spawn_work(async move {
            return Work::HealthChecked(backend.health_check().await);
        });
    }

    fn submit(&mut self, text: &str) {
        let len = self.sessions.messages().len();
        let begin = self
            .dispatcher
            .begin(text, self.language, &mut self.sessions);
        self.emit_since(len);

        let Begin::Request(pending) = begin else {
            return;
        };

        self.set_status(StatusEvent::DispatchStarted);
        let backend = self.backend.clone();
        self.spawn_work(async move {
            return Work::Replied(Dispatcher::send(backend, pending).await);
        });
    }

    pub async fn handle_action(&mut self, action: Action) {
        match action {
            Action::CaptureStart() => {
                self.restart = Restart::None;
                self.start_capture().await;
            }
            Action::CaptureStop() => {
                self.restart = Restart::None;
                self.voice.stop().await;
            }
            Action::ListSessions() => {
                let backend = self.backend.clone();
                let user_id = self.user_id.to_string();
                self.spawn_work(async move {
                    return Work::SessionsListed(backend.list_sessions(&user_id).await);
                });
            }
            Action::LoadSession(session_id) => {
                let backend = self.backend.clone();
                self.spawn_work(async move {
                    let res = Sessions::fetch(&backend, &session_id).await;
                    return Work::SessionLoaded(session_id, res);
                });
            }
            Action::NewSession() => {
                self.sessions.start_new(self.language);
                self.emit(Event::MessagesReplaced(self.sessions.messages().to_vec()));
                self.emit(Event::SessionChanged(None));
            }
            Action::SetLanguage(language) => {
                self.language = language;
                self.speech.set_language(language);
                self.emit(Event::LanguageChanged(language));
            }
            Action::SetOnline(online) => {
                self.dispatcher.set_online(online);
                self.speech.set_online(online);
                self.emit(Event::ConnectivityChanged(online));
            }
            Action::SetVoiceMode(mode) => {
                self.restart = Restart::None;
                self.voice.set_mode(mode).await;
                self.emit(Event::VoiceModeChanged(mode));
            }
            Action::Speak(text) => {
                if self.speak(&text) {
                    self.set_status(StatusEvent::SpeakInvoked);
                }
            }
            Action::StopSpeaking() => {
                if self.speech.stop().is_some() {
                    self.finish_playback();
                }
            }
            Action::Submit(text) => {
                self.submit(&text);
            }
            Action::SubmitPending() => {
                let text = self.voice.take_pending();
                self.emit(Event::PendingInput("".to_string()));
                self.submit(&text);
            }
        }
    }

    fn handle_capture(&mut self, event: CaptureEvent) {
        let Some(outcome) = self.voice.handle(event) else {
            return;
        };

        match outcome {
            CaptureOutcome::Started => {
                self.set_status(StatusEvent::CaptureStarted);
            }
            CaptureOutcome::Interim(text) => {
                self.emit(Event::InterimTranscript(text));
            }
            CaptureOutcome::Final(text) => {
                self.emit(Event::InterimTranscript("".to_string()));
                if self.voice.mode() == VoiceMode::Continuous {
                    self.submit(&text);
                } else {
                    self.emit(Event::PendingInput(self.voice.pending().to_string()));
                }
            }
            CaptureOutcome::Failed(kind) => {
                self.emit(Event::VoiceError(VoiceError::Capture(kind)));
                self.set_status(StatusEvent::CaptureEnded);
            }
            CaptureOutcome::Ended { restart } => {
                self.set_status(StatusEvent::CaptureEnded);
                if restart {
                    self.schedule_restart();
                }
            }
        }
    }

    fn handle_playback(&mut self, event: PlaybackEvent) {
        if let Some(PlaybackOutcome::Finished) = self.speech.handle(event) {
            self.finish_playback();
        }
    }

    async fn handle_work(&mut self, work: Work) {
        match work {
            Work::HealthChecked(res) => {
                if let Err(err) = res {
                    tracing::warn!(error = ?err, "Backend health check failed");
                    let len = self.sessions.messages().len();
                    self.sessions.push(Message::assistant(translate(
                        self.language,
                        Phrase::BackendUnreachable,
                    )));
                    self.emit_since(len);
                }
            }
            Work::Replied(result) => {
                let len = self.sessions.messages().len();
                let session_id = self.sessions.active_id().map(|e| return e.to_string());

                let reply = self
                    .dispatcher
                    .complete(result, self.language, &mut self.sessions);
                self.emit_since(len);

                if self.sessions.active_id() != session_id.as_deref() {
                    self.emit(Event::SessionChanged(
                        self.sessions.active_id().map(|e| return e.to_string()),
                    ));
                }

                if let Some(text) = reply {
                    if self.voice.mode() != VoiceMode::Off {
                        self.speak(&text);
                    }
                }

                if self.dispatcher.in_flight() == 0 {
                    let speaking = self.speech.is_speaking();
                    self.set_status(StatusEvent::DispatchFinished { speaking });
                }
            }
            Work::SessionLoaded(session_id, res) => match res {
                Ok(messages) => {
                    self.sessions.replace(&session_id, messages);
                    self.emit(Event::MessagesReplaced(self.sessions.messages().to_vec()));
                    self.emit(Event::SessionChanged(Some(session_id)));
                }
                Err(err) => {
                    tracing::warn!(error = ?err, session_id, "Failed to load session");
                    self.emit(Event::VoiceError(VoiceError::History(err.to_string())));
                }
            },
            Work::SessionsListed(res) => {
                let sessions = self.sessions.apply_history(res).to_vec();
                self.emit(Event::SessionsListed(sessions));
            }
            Work::RestartCapture => {
                if self.restart != Restart::Scheduled {
                    return;
                }
                self.restart = Restart::None;

                if self.voice.mode() != VoiceMode::Continuous
                    || self.voice.state() != CaptureState::Idle
                {
                    return;
                }
                if self.is_busy() {
                    self.restart = Restart::Deferred;
                    return;
                }

                tracing::debug!("Restarting continuous capture");
                self.start_capture().await;
            }
        }
    }

    async fn handle_signal(&mut self, signal: Signal) {
        match signal {
            Signal::Action(action) => self.handle_action(action).await,
            Signal::Capture(event) => self.handle_capture(event),
            Signal::Playback(event) => self.handle_playback(event),
            Signal::Work(work) => self.handle_work(work).await,
        }
    }

    /// Waits for and processes one capture, playback or background signal.
    pub async fn tick(&mut self) {
        let signal = tokio::select! {
            Some(event) = self.capture_rx.recv() => Signal::Capture(event),
            Some(event) = self.playback_rx.recv() => Signal::Playback(event),
            Some(work) = self.work_rx.recv() => Signal::Work(work),
        };

        self.handle_signal(signal).await;
    }

    /// Drives the assistant until the UI hangs up.
    pub async fn run(mut self, mut actions: mpsc::UnboundedReceiver<Action>) -> Result<()> {
        self.start();

        loop {
            let signal = tokio::select! {
                action = actions.recv() => action.map(Signal::Action),
                Some(event) = self.capture_rx.recv() => Some(Signal::Capture(event)),
                Some(event) = self.playback_rx.recv() => Some(Signal::Playback(event)),
                Some(work) = self.work_rx.recv() => Some(Signal::Work(work)),
            };

            let Some(signal) = signal else {
                break;
            };
            self.handle_signal(signal).await;
        }

        self.speech.stop();
        self.voice.stop().await;
        return Ok(());
    }
}
