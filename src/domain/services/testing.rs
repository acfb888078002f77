use std::collections::VecDeque;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::domain::models::AudioPlayer;
use crate::domain::models::Backend;
use crate::domain::models::CaptureEvent;
use crate::domain::models::ChatReply;
use crate::domain::models::ChatRequest;
use crate::domain::models::Language;
use crate::domain::models::Session;
use crate::domain::models::SessionTranscript;
use crate::domain::models::SpeechCapture;
use crate::domain::models::SpeechSynthesis;
use crate::domain::models::VoiceSettings;

/// Scripted reply backend. Replies are served in order, falling back to an
/// echo. Holding `gate` keeps chat turns in flight.
#[derive(Default)]
pub struct FakeBackend {
    pub replies: Mutex<VecDeque<Result<ChatReply, String>>>,
    pub requests: Mutex<Vec<ChatRequest>>,
    pub speech: Mutex<Option<Result<Vec<u8>, String>>>,
    pub synthesized: Mutex<Vec<(String, Language)>>,
    pub sessions: Mutex<Option<Result<Vec<Session>, String>>>,
    pub transcripts: Mutex<Vec<(String, SessionTranscript)>>,
    pub healthy: Mutex<bool>,
    pub gate: Arc<tokio::sync::Mutex<()>>,
}

impl FakeBackend {
    pub fn with_replies(replies: Vec<Result<ChatReply, String>>) -> FakeBackend {
        let backend = FakeBackend::default();
        *backend.replies.lock().unwrap() = replies.into_iter().collect();
        *backend.healthy.lock().unwrap() = true;
        return backend;
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        return self.requests.lock().unwrap().clone();
    }
}

pub fn reply(text: &str, session_id: Option<&str>) -> Result<ChatReply, String> {
    return Ok(ChatReply {
        reply: Some(text.to_string()),
        session_id: session_id.map(|e| return e.to_string()),
    });
}

#[async_trait]
impl Backend for FakeBackend {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if *self.healthy.lock().unwrap() {
            return Ok(());
        }
        bail!("Backend is not reachable");
    }

    #[allow(clippy::implicit_return)]
    async fn send_message(&self, request: &ChatRequest) -> Result<ChatReply> {
        self.requests.lock().unwrap().push(request.clone());
        let _gate = self.gate.lock().await;

        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(reply)) => return Ok(reply),
            Some(Err(err)) => return Err(anyhow!(err)),
            None => {
                return Ok(ChatReply {
                    reply: Some(format!("echo: {}", request.message)),
                    session_id: None,
                })
            }
        }
    }

    #[allow(clippy::implicit_return)]
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>> {
        self.synthesized
            .lock()
            .unwrap()
            .push((text.to_string(), language));

        let speech = self.speech.lock().unwrap().clone();
        match speech {
            Some(Ok(audio)) => return Ok(audio),
            Some(Err(err)) => return Err(anyhow!(err)),
            None => return Ok(text.as_bytes().to_vec()),
        }
    }

    #[allow(clippy::implicit_return)]
    async fn list_sessions(&self, _user_id: &str) -> Result<Vec<Session>> {
        let sessions = self.sessions.lock().unwrap().clone();
        match sessions {
            Some(Ok(sessions)) => return Ok(sessions),
            Some(Err(err)) => return Err(anyhow!(err)),
            None => return Ok(vec![]),
        }
    }

    #[allow(clippy::implicit_return)]
    async fn load_session(&self, session_id: &str) -> Result<SessionTranscript> {
        let transcripts = self.transcripts.lock().unwrap();
        if let Some((_, transcript)) = transcripts.iter().find(|(id, _)| return id == session_id)
        {
            return Ok(transcript.clone());
        }

        bail!("No session {session_id}");
    }
}

/// Recognizer that records calls and lets the test push events.
#[derive(Clone, Default)]
pub struct FakeCapture {
    pub starts: Arc<AtomicUsize>,
    pub stops: Arc<AtomicUsize>,
    pub locales: Arc<Mutex<Vec<String>>>,
    pub fail_start: bool,
    tx: Arc<Mutex<Option<mpsc::UnboundedSender<CaptureEvent>>>>,
}

impl FakeCapture {
    /// A recognizer whose host refuses to start.
    pub fn failing() -> FakeCapture {
        return FakeCapture {
            fail_start: true,
            ..FakeCapture::default()
        };
    }

    pub fn emit(&self, event: CaptureEvent) {
        if let Some(tx) = self.tx.lock().unwrap().as_ref() {
            tx.send(event).unwrap();
        }
    }

    pub fn start_count(&self) -> usize {
        return self.starts.load(Ordering::SeqCst);
    }

    pub fn stop_count(&self) -> usize {
        return self.stops.load(Ordering::SeqCst);
    }
}

#[async_trait]
impl SpeechCapture for FakeCapture {
    #[allow(clippy::implicit_return)]
    async fn start(&self, locale: &str, tx: mpsc::UnboundedSender<CaptureEvent>) -> Result<()> {
        if self.fail_start {
            bail!("microphone busy");
        }

        self.starts.fetch_add(1, Ordering::SeqCst);
        self.locales.lock().unwrap().push(locale.to_string());
        *self.tx.lock().unwrap() = Some(tx);
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn stop(&self) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        return Ok(());
    }
}

/// Shared call log so tests can assert ordering across player and synthesis.
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Audio player that either fails, finishes at once, or holds until
/// cancelled.
#[derive(Clone, Default)]
pub struct FakePlayer {
    pub log: CallLog,
    pub fail: bool,
    pub hold: bool,
}

#[async_trait]
impl AudioPlayer for FakePlayer {
    #[allow(clippy::implicit_return)]
    async fn play(&self, audio: Vec<u8>, cancel: CancellationToken) -> Result<()> {
        let clip = String::from_utf8_lossy(&audio).to_string();
        self.log.lock().unwrap().push(format!("play {clip}"));
        if self.fail {
            bail!("decoder error");
        }
        if self.hold {
            cancel.cancelled().await;
            self.log.lock().unwrap().push(format!("cancel {clip}"));
        }
        return Ok(());
    }
}

#[derive(Clone, Default)]
pub struct FakeSynthesis {
    pub log: CallLog,
    pub fail: bool,
}

#[async_trait]
impl SpeechSynthesis for FakeSynthesis {
    #[allow(clippy::implicit_return)]
    async fn speak(
        &self,
        text: &str,
        locale: &str,
        _settings: &VoiceSettings,
        _cancel: CancellationToken,
    ) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("synth {locale} {text}"));
        if self.fail {
            bail!("no voices installed");
        }
        return Ok(());
    }
}
