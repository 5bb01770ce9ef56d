//! Fetch client for the leaderboard snapshot and the activity log

use std::fmt;
use std::path::PathBuf;

use serde_json::Value;

use crate::config::SourcesConfig;
use crate::error::{Error, Result};
use crate::ingest::{parse_events, parse_snapshot, ParsedEvents};
use crate::types::UserAggregate;

/// Where one input lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// `http://` or `https://` URL
    Url(String),
    /// Local file
    Path(PathBuf),
}

impl Source {
    /// Classify a location string: http(s) URLs are fetched, anything else is a path.
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();
        let lowered = trimmed.to_lowercase();
        if lowered.starts_with("http://") || lowered.starts_with("https://") {
            Source::Url(trimmed.to_string())
        } else {
            Source::Path(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Url(url) => f.write_str(url),
            Source::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Reads both inputs and parses them.
///
/// Requests are plain GETs with no retries; a failure is reported to the
/// caller and the next scheduled fetch is the retry.
#[derive(Debug, Clone)]
pub struct DataClient {
    http_client: reqwest::Client,
    leaderboard: Source,
    events: Source,
}

impl DataClient {
    /// Create a client from the `[sources]` configuration
    pub fn new(config: &SourcesConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            leaderboard: Source::parse(&config.leaderboard),
            events: Source::parse(&config.events),
        })
    }

    pub fn leaderboard_source(&self) -> &Source {
        &self.leaderboard
    }

    pub fn events_source(&self) -> &Source {
        &self.events
    }

    /// Fetch and parse the activity log.
    pub async fn fetch_events(&self) -> Result<ParsedEvents> {
        let payload = self.fetch_json(&self.events).await?;
        let parsed = parse_events(&payload);

        tracing::debug!(
            source = %self.events,
            events = parsed.events.len(),
            skipped = parsed.warnings.len(),
            "Fetched activity log"
        );
        Ok(parsed)
    }

    /// Fetch and parse the leaderboard snapshot.
    pub async fn fetch_snapshot(&self) -> Result<Vec<UserAggregate>> {
        let payload = self.fetch_json(&self.leaderboard).await?;
        let rows = parse_snapshot(&payload);

        tracing::debug!(source = %self.leaderboard, rows = rows.len(), "Fetched leaderboard snapshot");
        Ok(rows)
    }

    async fn fetch_json(&self, source: &Source) -> Result<Value> {
        let body = match source {
            Source::Url(url) => self.get_text(url).await?,
            Source::Path(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| Error::Fetch {
                        location: source.to_string(),
                        message: e.to_string(),
                    })?
            }
        };

        serde_json::from_str(&body).map_err(|e| Error::Fetch {
            location: source.to_string(),
            message: format!("invalid JSON: {}", e),
        })
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Fetch {
                location: url.to_string(),
                message: format!("HTTP request failed: {}", e),
            })?;

        let status = response.status();

        if status.is_success() {
            Ok(response.text().await?)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::Fetch {
                location: url.to_string(),
                message: format!("HTTP error ({}): {}", status, error_text),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve `body` with `status` to every connection; returns the base URL.
    async fn serve(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = socket.read(&mut buf).await;
                    let response = format!(
                        "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        format!("http://{}", addr)
    }

    fn sources(leaderboard: &str, events: &str) -> SourcesConfig {
        SourcesConfig {
            leaderboard: leaderboard.to_string(),
            events: events.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_source_parse() {
        assert_eq!(
            Source::parse(" https://example.org/a.json "),
            Source::Url("https://example.org/a.json".to_string())
        );
        assert_eq!(
            Source::parse("HTTP://example.org/a.json"),
            Source::Url("HTTP://example.org/a.json".to_string())
        );
        assert_eq!(
            Source::parse("data/all_tweets.json"),
            Source::Path(PathBuf::from("data/all_tweets.json"))
        );
    }

    #[tokio::test]
    async fn test_fetch_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let events_path = dir.path().join("all_tweets.json");
        let board_path = dir.path().join("leaderboard.json");
        std::fs::write(
            &events_path,
            r#"{"tweets": [{"user": {"screen_name": "Alice"}, "favorite_count": 3}, {"text": "orphan"}]}"#,
        )
        .unwrap();
        std::fs::write(&board_path, r#"{"bob": {"posts": 2}}"#).unwrap();

        let client = DataClient::new(&sources(
            board_path.to_str().unwrap(),
            events_path.to_str().unwrap(),
        ))
        .unwrap();

        let parsed = client.fetch_events().await.unwrap();
        assert_eq!(parsed.events.len(), 1);
        assert_eq!(parsed.events[0].username, "alice");
        assert_eq!(parsed.warnings.len(), 1);

        let rows = client.fetch_snapshot().await.unwrap();
        assert_eq!(rows[0].username, "bob");
        assert_eq!(rows[0].posts, 2);
    }

    #[tokio::test]
    async fn test_missing_file_is_fetch_error() {
        let client = DataClient::new(&sources("/nonexistent/a.json", "/nonexistent/b.json")).unwrap();
        let err = client.fetch_events().await.unwrap_err();
        assert!(matches!(err, Error::Fetch { ref location, .. } if location == "/nonexistent/b.json"));
    }

    #[tokio::test]
    async fn test_fetch_over_http() {
        let base = serve("200 OK", r#"[{"username": "carol", "likes": 4, "views": 9}]"#).await;
        let url = format!("{}/all_tweets.json", base);
        let client = DataClient::new(&sources(&url, &url)).unwrap();

        let parsed = client.fetch_events().await.unwrap();
        assert_eq!(parsed.events.len(), 1);
        assert_eq!(parsed.events[0].likes, 4);
        assert_eq!(parsed.events[0].views, 9);
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let base = serve("503 Service Unavailable", "busy").await;
        let url = format!("{}/leaderboard.json", base);
        let client = DataClient::new(&sources(&url, &url)).unwrap();

        match client.fetch_snapshot().await {
            Err(Error::Fetch { message, .. }) => {
                assert!(message.contains("503"));
                assert!(message.contains("busy"));
            }
            other => panic!("expected fetch error, got {:?}", other.map(|r| r.len())),
        }
    }

    #[tokio::test]
    async fn test_invalid_json_is_fetch_error() {
        let base = serve("200 OK", "<html>").await;
        let client = DataClient::new(&sources(&base, &base)).unwrap();
        assert!(matches!(client.fetch_events().await, Err(Error::Fetch { .. })));
    }
}
