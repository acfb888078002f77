use anyhow::Result;
use tokio::sync::mpsc;

use super::CaptureOutcome;
use super::VoiceInput;
use crate::domain::models::Capability;
use crate::domain::models::CaptureErrorKind;
use crate::domain::models::CaptureEvent;
use crate::domain::models::CaptureState;
use crate::domain::models::VoiceError;
use crate::domain::models::VoiceMode;
use crate::domain::services::testing::FakeCapture;

fn voice_input(mode: VoiceMode) -> (VoiceInput, FakeCapture, mpsc::UnboundedReceiver<CaptureEvent>) {
    let capture = FakeCapture::default();
    let (tx, rx) = mpsc::unbounded_channel::<CaptureEvent>();
    let input = VoiceInput::new(Capability::Available(Box::new(capture.clone())), mode, tx);
    return (input, capture, rx);
}

#[tokio::test]
async fn it_fails_without_a_capture_primitive() {
    let (tx, _rx) = mpsc::unbounded_channel::<CaptureEvent>();
    let mut input = VoiceInput::new(Capability::Unavailable, VoiceMode::PushToTalk, tx);

    let res = input.start("en-IN").await;
    assert_eq!(res, Err(VoiceError::CaptureUnsupported));
    assert_eq!(input.state(), CaptureState::Idle);
    assert!(!input.is_supported());
}

#[tokio::test]
async fn it_never_starts_when_off() -> Result<()> {
    let (mut input, capture, _rx) = voice_input(VoiceMode::Off);
    input.start("en-IN").await?;

    assert_eq!(capture.start_count(), 0);
    assert_eq!(input.state(), CaptureState::Idle);
    return Ok(());
}

#[tokio::test]
async fn it_starts_once() -> Result<()> {
    let (mut input, capture, _rx) = voice_input(VoiceMode::PushToTalk);
    input.start("ta-IN").await?;
    assert_eq!(input.state(), CaptureState::Starting);

    assert_eq!(input.handle(CaptureEvent::Started), Some(CaptureOutcome::Started));
    assert_eq!(input.state(), CaptureState::Listening);

    input.start("ta-IN").await?;
    assert_eq!(capture.start_count(), 1);
    assert_eq!(*capture.locales.lock().unwrap(), vec!["ta-IN".to_string()]);
    return Ok(());
}

#[tokio::test]
async fn it_reports_host_start_failures() {
    let capture = FakeCapture::failing();
    let (tx, _rx) = mpsc::unbounded_channel::<CaptureEvent>();
    let mut input = VoiceInput::new(
        Capability::Available(Box::new(capture)),
        VoiceMode::PushToTalk,
        tx,
    );

    let res = input.start("en-IN").await;
    assert_eq!(
        res,
        Err(VoiceError::Capture(CaptureErrorKind::Other(
            "microphone busy".to_string()
        )))
    );
    assert_eq!(input.state(), CaptureState::Idle);
}

#[tokio::test]
async fn it_stops_idempotently() -> Result<()> {
    let (mut input, capture, _rx) = voice_input(VoiceMode::PushToTalk);
    input.stop().await;
    assert_eq!(capture.stop_count(), 0);
    assert_eq!(input.state(), CaptureState::Idle);

    input.start("en-IN").await?;
    input.handle(CaptureEvent::Started);
    input.stop().await;
    input.stop().await;

    assert_eq!(capture.stop_count(), 1);
    assert_eq!(input.state(), CaptureState::Stopping);

    input.handle(CaptureEvent::Ended);
    input.stop().await;
    assert_eq!(capture.stop_count(), 1);
    assert_eq!(input.state(), CaptureState::Idle);
    return Ok(());
}

#[tokio::test]
async fn it_keeps_interim_until_final() -> Result<()> {
    let (mut input, _capture, _rx) = voice_input(VoiceMode::PushToTalk);
    input.start("en-IN").await?;
    input.handle(CaptureEvent::Started);

    input.handle(CaptureEvent::Interim("when to".to_string()));
    input.handle(CaptureEvent::Interim("when to sow".to_string()));
    assert_eq!(input.interim(), "when to sow");

    let res = input.handle(CaptureEvent::Final("when to sow maize".to_string()));
    assert_eq!(res, Some(CaptureOutcome::Final("when to sow maize".to_string())));
    assert_eq!(input.interim(), "");
    return Ok(());
}

#[tokio::test]
async fn it_clears_interim_on_error() -> Result<()> {
    let (mut input, _capture, _rx) = voice_input(VoiceMode::PushToTalk);
    input.start("en-IN").await?;
    input.handle(CaptureEvent::Started);
    input.handle(CaptureEvent::Interim("when".to_string()));

    let res = input.handle(CaptureEvent::Error(CaptureErrorKind::NoSpeech));
    assert_eq!(res, Some(CaptureOutcome::Failed(CaptureErrorKind::NoSpeech)));
    assert_eq!(input.interim(), "");
    assert_eq!(input.state(), CaptureState::Idle);
    return Ok(());
}

#[tokio::test]
async fn it_appends_one_final_per_push_to_talk_press() -> Result<()> {
    let (mut input, _capture, _rx) = voice_input(VoiceMode::PushToTalk);

    input.start("en-IN").await?;
    input.handle(CaptureEvent::Started);
    input.handle(CaptureEvent::Final("my cotton leaves".to_string()));
    assert_eq!(input.handle(CaptureEvent::Final("ignored".to_string())), None);
    input.handle(CaptureEvent::Ended);

    input.start("en-IN").await?;
    input.handle(CaptureEvent::Started);
    input.handle(CaptureEvent::Final("are turning red".to_string()));
    input.handle(CaptureEvent::Ended);

    assert_eq!(input.pending(), "my cotton leaves are turning red");
    assert_eq!(input.take_pending(), "my cotton leaves are turning red");
    assert_eq!(input.pending(), "");
    return Ok(());
}

#[tokio::test]
async fn it_does_not_buffer_continuous_finals() -> Result<()> {
    let (mut input, _capture, _rx) = voice_input(VoiceMode::Continuous);
    input.start("en-IN").await?;
    input.handle(CaptureEvent::Started);

    let res = input.handle(CaptureEvent::Final(" price of onion ".to_string()));
    assert_eq!(res, Some(CaptureOutcome::Final("price of onion".to_string())));
    assert_eq!(input.pending(), "");
    return Ok(());
}

#[tokio::test]
async fn it_asks_for_restart_in_continuous_mode() -> Result<()> {
    let (mut input, _capture, _rx) = voice_input(VoiceMode::Continuous);
    input.start("en-IN").await?;
    input.handle(CaptureEvent::Started);

    let res = input.handle(CaptureEvent::Ended);
    assert_eq!(res, Some(CaptureOutcome::Ended { restart: true }));
    return Ok(());
}

#[tokio::test]
async fn it_does_not_restart_after_manual_stop() -> Result<()> {
    let (mut input, _capture, _rx) = voice_input(VoiceMode::Continuous);
    input.start("en-IN").await?;
    input.handle(CaptureEvent::Started);
    input.stop().await;

    let res = input.handle(CaptureEvent::Ended);
    assert_eq!(res, Some(CaptureOutcome::Ended { restart: false }));
    assert!(input.was_stopped());
    return Ok(());
}

#[tokio::test]
async fn it_does_not_restart_after_permission_errors() -> Result<()> {
    let (mut input, _capture, _rx) = voice_input(VoiceMode::Continuous);
    input.start("en-IN").await?;
    input.handle(CaptureEvent::Started);
    input.handle(CaptureEvent::Error(CaptureErrorKind::PermissionDenied));

    let res = input.handle(CaptureEvent::Ended);
    assert_eq!(res, Some(CaptureOutcome::Ended { restart: false }));
    return Ok(());
}

#[tokio::test]
async fn it_stops_when_turned_off() -> Result<()> {
    let (mut input, capture, _rx) = voice_input(VoiceMode::Continuous);
    input.start("en-IN").await?;
    input.handle(CaptureEvent::Started);

    input.set_mode(VoiceMode::Off).await;
    assert_eq!(capture.stop_count(), 1);
    assert_eq!(input.mode(), VoiceMode::Off);
    return Ok(());
}
