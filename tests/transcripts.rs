use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use curation::transcript::{TranscriptFetcher, TranscriptSource};

/// Serve one HTTP response on a local port and return its URL.
async fn serve_once(status: &str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let status = status.to_string();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
    });
    format!("http://{addr}/transcripts/vid-1-en.sjson")
}

const SJSON: &str = r#"{"start": [0, 1500], "end": [1500, 3000], "text": ["Hello", "world"]}"#;

#[tokio::test]
async fn plain_transcript_joins_segments() {
    let url = serve_once("200 OK", SJSON).await;
    let fetcher = TranscriptFetcher::new(Duration::from_secs(5)).unwrap();
    assert_eq!(fetcher.fetch_transcript(&url, false).await.unwrap(), "Hello world");
}

#[tokio::test]
async fn time_marked_transcript_is_returned_raw() {
    let url = serve_once("200 OK", SJSON).await;
    let fetcher = TranscriptFetcher::new(Duration::from_secs(5)).unwrap();
    assert_eq!(fetcher.fetch_transcript(&url, true).await.unwrap(), SJSON);
}

#[tokio::test]
async fn error_status_is_an_error() {
    let url = serve_once("404 Not Found", "{}").await;
    let fetcher = TranscriptFetcher::new(Duration::from_secs(5)).unwrap();
    assert!(fetcher.fetch_transcript(&url, false).await.is_err());
}
