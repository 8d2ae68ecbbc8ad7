// Integration tests for the transport session against an in-process
// WebSocket server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use verbum_live::transport::messages::{ResultStatus, SpeechResult};
use verbum_live::{
    Config, ConnectionState, ResultHandler, ServerConfig, SessionState, TransportSession,
    WireFrame,
};

#[derive(Default)]
struct RecordingHandler {
    results: Mutex<Vec<SpeechResult>>,
    unknown: Mutex<Vec<String>>,
}

impl RecordingHandler {
    fn results(&self) -> Vec<SpeechResult> {
        self.results.lock().expect("results lock").clone()
    }

    fn unknown(&self) -> Vec<String> {
        self.unknown.lock().expect("unknown lock").clone()
    }
}

impl ResultHandler for RecordingHandler {
    fn on_speech_result(&self, result: &SpeechResult) {
        self.results.lock().expect("results lock").push(result.clone());
    }

    fn on_unknown_event(&self, event: &str) {
        self.unknown.lock().expect("unknown lock").push(event.to_string());
    }
}

fn test_config(port: u16) -> Config {
    Config {
        server: ServerConfig {
            url: format!("ws://127.0.0.1:{port}"),
            api_key: "secret-key".to_string(),
        },
        stt: Default::default(),
        streaming: Default::default(),
    }
}

async fn bind_server() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    (listener, port)
}

/// Polls `condition` for up to two seconds.
async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

// Scenario: the ordered message log a server sees over a full session is
// auth first, then the audio frames, then one streamEnd, then close.
#[tokio::test]
async fn session_emits_auth_audio_stream_end_close_in_order() {
    let (listener, port) = bind_server().await;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(stream).await.expect("ws accept");

        let mut log: Vec<String> = Vec::new();
        while let Some(msg) = ws.next().await {
            match msg.expect("server read") {
                Message::Text(text) => log.push(format!("text:{text}")),
                Message::Binary(bytes) => log.push(format!("binary:{}", bytes.len())),
                Message::Close(_) => {
                    log.push("close".to_string());
                    break;
                }
                _ => {}
            }
        }
        log
    });

    let state = Arc::new(SessionState::new());
    let handler = Arc::new(RecordingHandler::default());
    let session = TransportSession::connect(&test_config(port), state.clone(), handler)
        .await
        .expect("connect");
    assert_eq!(state.connection(), ConnectionState::Connected);

    let sender = session.frame_sender();
    for _ in 0..3 {
        assert!(sender.send(WireFrame { bytes: vec![0u8; 186] }));
    }

    session.shutdown().await;
    assert_eq!(state.connection(), ConnectionState::Disconnected);

    let log = server.await.expect("server task");
    assert_eq!(log[0], "text:{\"token\":\"secret-key\"}");
    assert_eq!(&log[1..4], ["binary:186", "binary:186", "binary:186"]);
    assert_eq!(log[4], "text:{\"event\":\"streamEnd\"}");
    assert_eq!(log[5], "close");

    // The session is gone; further frames are dropped, not queued.
    assert!(!sender.send(WireFrame { bytes: vec![0u8; 2] }));
}

#[tokio::test]
async fn inbound_events_reach_the_handler() {
    let (listener, port) = bind_server().await;

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(stream).await.expect("ws accept");

        // consume the auth message first
        let _ = ws.next().await;

        let events = [
            r#"{"event":"speechRecognized","data":{"status":"recognizing","text":"hola mun"}}"#,
            r#"{"event":"speechRecognized","data":{"status":"recognized","messageId":"m-7","text":"hola mundo","confidence":0.91,"duration":1530}}"#,
            r#"{"event":"serverDiagnostics","data":{"load":0.2}}"#,
            "this is not json",
        ];
        for event in events {
            ws.send(Message::Text(event.to_string())).await.expect("server send");
        }

        // hold the connection open until the client closes
        while let Some(msg) = ws.next().await {
            if matches!(msg, Ok(Message::Close(_)) | Err(_)) {
                break;
            }
        }
    });

    let state = Arc::new(SessionState::new());
    let handler = Arc::new(RecordingHandler::default());
    let session = TransportSession::connect(&test_config(port), state.clone(), handler.clone())
        .await
        .expect("connect");

    assert!(
        wait_until(|| handler.results().len() == 2 && handler.unknown().len() == 1).await,
        "expected 2 results and 1 unknown event, got {} and {}",
        handler.results().len(),
        handler.unknown().len()
    );

    let results = handler.results();
    assert_eq!(results[0].status, ResultStatus::Recognizing);
    assert_eq!(results[0].text, "hola mun");
    assert_eq!(results[1].status, ResultStatus::Recognized);
    assert_eq!(results[1].message_id.as_deref(), Some("m-7"));
    assert_eq!(results[1].confidence, Some(0.91));
    assert_eq!(results[1].duration, Some(1530));
    assert_eq!(handler.unknown(), vec!["serverDiagnostics".to_string()]);

    // the malformed message must not have killed the connection
    assert_eq!(state.connection(), ConnectionState::Connected);

    session.shutdown().await;
}

#[tokio::test]
async fn server_close_transitions_to_disconnected() {
    let (listener, port) = bind_server().await;

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(stream).await.expect("ws accept");
        let _ = ws.next().await; // auth
        ws.close(None).await.expect("server close");
    });

    let state = Arc::new(SessionState::new());
    let handler = Arc::new(RecordingHandler::default());
    let session = TransportSession::connect(&test_config(port), state.clone(), handler)
        .await
        .expect("connect");

    assert!(
        wait_until(|| state.connection() == ConnectionState::Disconnected).await,
        "expected disconnect after server close"
    );

    // shutdown after a disconnect stays quiet: no streamEnd, no panic
    session.shutdown().await;
}

#[tokio::test]
async fn connect_failure_is_fatal_and_leaves_disconnected() {
    // nothing is listening on this port
    let (listener, port) = bind_server().await;
    drop(listener);

    let state = Arc::new(SessionState::new());
    let handler = Arc::new(RecordingHandler::default());
    let result = TransportSession::connect(&test_config(port), state.clone(), handler).await;

    assert!(result.is_err());
    assert_eq!(state.connection(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn connection_url_carries_options_but_not_the_key() {
    let (listener, port) = bind_server().await;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let uri = Arc::new(Mutex::new(String::new()));
        let seen = uri.clone();
        let mut ws = tokio_tungstenite::accept_hdr_async(
            stream,
            move |req: &tokio_tungstenite::tungstenite::handshake::server::Request, resp| {
                *seen.lock().expect("uri lock") = req.uri().to_string();
                Ok(resp)
            },
        )
        .await
        .expect("ws accept");
        while let Some(msg) = ws.next().await {
            if matches!(msg, Ok(Message::Close(_)) | Err(_)) {
                break;
            }
        }
        Arc::try_unwrap(uri).expect("sole owner").into_inner().expect("uri lock")
    });

    let state = Arc::new(SessionState::new());
    let handler = Arc::new(RecordingHandler::default());
    let mut config = test_config(port);
    config.stt.language = "es-MX".to_string();
    config.stt.translate_to = vec!["en-US".to_string(), "fr-FR".to_string()];

    let session = TransportSession::connect(&config, state, handler).await.expect("connect");
    session.shutdown().await;

    let uri = server.await.expect("server task");
    assert!(uri.starts_with("/listen?"));
    assert!(uri.contains("language=es-MX"));
    assert!(uri.contains("sampleRate=8000"));
    // comma is percent-encoded inside the joined array value
    assert!(uri.contains("translateTo=en-US%2Cfr-FR"));
    assert!(!uri.contains("secret-key"));
}
