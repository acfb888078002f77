use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use super::parse_line;
use super::ProcessCapture;
use crate::domain::models::CaptureErrorKind;
use crate::domain::models::CaptureEvent;
use crate::domain::models::SpeechCapture;
use crate::infrastructure::hosts::CommandTemplate;

async fn collect(rx: &mut mpsc::UnboundedReceiver<CaptureEvent>) -> Vec<CaptureEvent> {
    let mut events = vec![];
    while let Ok(Some(event)) = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
        let ended = event == CaptureEvent::Ended;
        events.push(event);
        if ended {
            break;
        }
    }
    return events;
}

#[test]
fn it_parses_json_lines() {
    assert_eq!(
        parse_line(r#"{"type": "interim", "text": "when to"}"#),
        Some(CaptureEvent::Interim("when to".to_string()))
    );
    assert_eq!(
        parse_line(r#"{"type": "final", "text": "when to sow"}"#),
        Some(CaptureEvent::Final("when to sow".to_string()))
    );
    assert_eq!(
        parse_line(r#"{"type": "error", "error": "no-speech"}"#),
        Some(CaptureEvent::Error(CaptureErrorKind::NoSpeech))
    );
    assert_eq!(
        parse_line(r#"{"type": "error", "error": "not-allowed"}"#),
        Some(CaptureEvent::Error(CaptureErrorKind::PermissionDenied))
    );
}

#[test]
fn it_parses_plain_lines_as_final() {
    assert_eq!(
        parse_line("  water the paddy  \n"),
        Some(CaptureEvent::Final("water the paddy".to_string()))
    );
}

#[test]
fn it_skips_noise() {
    assert_eq!(parse_line(""), None);
    assert_eq!(parse_line(r#"{"type": "started"}"#), None);
    assert_eq!(parse_line(r#"{"type": "ended"}"#), None);
    assert_eq!(parse_line(r#"{"type": "volume", "level": 3}"#), None);
    assert_eq!(parse_line("{not json"), None);
}

#[cfg(unix)]
#[tokio::test]
async fn it_streams_recognizer_output() -> Result<()> {
    let capture = ProcessCapture::new(CommandTemplate::parse("echo {locale}").unwrap());
    let (tx, mut rx) = mpsc::unbounded_channel::<CaptureEvent>();

    capture.start("ta-IN", tx).await?;
    let events = collect(&mut rx).await;

    assert_eq!(
        events,
        vec![
            CaptureEvent::Started,
            CaptureEvent::Final("ta-IN".to_string()),
            CaptureEvent::Ended
        ]
    );
    return Ok(());
}

#[cfg(unix)]
#[tokio::test]
async fn it_stops_recognizers() -> Result<()> {
    let capture = ProcessCapture::new(CommandTemplate::parse("cat").unwrap());
    let (tx, mut rx) = mpsc::unbounded_channel::<CaptureEvent>();

    capture.start("en-IN", tx).await?;
    capture.stop().await?;
    capture.stop().await?;
    let events = collect(&mut rx).await;

    assert_eq!(events, vec![CaptureEvent::Started, CaptureEvent::Ended]);
    return Ok(());
}

#[tokio::test]
async fn it_fails_to_start_missing_recognizers() {
    let capture = ProcessCapture::new(CommandTemplate::parse("mitron-no-such-recognizer").unwrap());
    let (tx, _rx) = mpsc::unbounded_channel::<CaptureEvent>();

    assert!(capture.start("en-IN", tx).await.is_err());
}

#[cfg(unix)]
#[tokio::test]
async fn it_refuses_to_start_while_the_previous_session_drains() -> Result<()> {
    let capture = ProcessCapture::new(CommandTemplate::parse("cat").unwrap());
    let (tx, mut rx) = mpsc::unbounded_channel::<CaptureEvent>();

    capture.start("en-IN", tx.clone()).await?;
    let err = capture.start("en-IN", tx.clone()).await.unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"Recognizer is still finishing the previous session");

    let events = collect(&mut rx).await;
    assert_eq!(events, vec![CaptureEvent::Started, CaptureEvent::Ended]);

    capture.start("en-IN", tx).await?;
    assert_eq!(next_event(&mut rx).await, Some(CaptureEvent::Started));
    capture.stop().await?;
    return Ok(());
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<CaptureEvent>) -> Option<CaptureEvent> {
    return tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .ok()
        .flatten();
}
