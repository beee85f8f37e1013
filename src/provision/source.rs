use std::error::Error;
use std::fmt;
use std::io::{self, Read, Write};
use std::time::Duration;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;

/// Size of the chunks the response body is copied in
pub const CHUNK_SIZE: usize = 8192;

/// Errors raised by an artifact source while streaming a body
#[derive(Debug)]
pub enum FetchError {
    /// Connection, TLS or body read failure
    Transport(String),
    /// The server answered with a non-success status
    Status(u16, String),
    /// The local writer refused the bytes
    Write(io::Error),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FetchError::Transport(msg) => write!(f, "transport error: {}", msg),
            FetchError::Status(code, reason) => write!(f, "HTTP {}: {}", code, reason),
            FetchError::Write(e) => write!(f, "write error: {}", e),
        }
    }
}

impl Error for FetchError {}

/// Something that can stream the bytes behind a URL into a writer.
pub trait ArtifactSource: Send + Sync {
    /// Streams the body at `url` into `sink`.
    ///
    /// # Returns
    ///
    /// The number of bytes written
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError>;
}

/// HTTP(S) source backed by a blocking reqwest client.
pub struct HttpSource {
    client: Client,
    show_progress: bool,
}

impl HttpSource {
    /// Creates a source with no overall request timeout; model files are large.
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            show_progress: true,
        })
    }

    /// Enables or disables the terminal progress bar.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn progress_bar(&self, total: Option<u64>) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        match total {
            Some(total) => {
                let pb = ProgressBar::new(total);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("#>-"),
                );
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner} {bytes} downloaded ({bytes_per_sec})")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                pb.enable_steady_tick(Duration::from_millis(120));
                pb
            }
        }
    }
}

impl ArtifactSource for HttpSource {
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(
                status.as_u16(),
                status.canonical_reason().unwrap_or("").to_string(),
            ));
        }

        let pb = self.progress_bar(response.content_length());
        let mut buffer = [0u8; CHUNK_SIZE];
        let mut written: u64 = 0;

        loop {
            let read = match response.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    pb.abandon();
                    return Err(FetchError::Transport(e.to_string()));
                }
            };
            if let Err(e) = sink.write_all(&buffer[..read]) {
                pb.abandon();
                return Err(FetchError::Write(e));
            }
            written += read as u64;
            pb.inc(read as u64);
        }

        sink.flush().map_err(FetchError::Write)?;
        pb.finish_and_clear();
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        assert_eq!(
            FetchError::Status(404, "Not Found".to_string()).to_string(),
            "HTTP 404: Not Found"
        );
        assert!(FetchError::Transport("reset".to_string()).to_string().contains("reset"));
    }

    #[test]
    fn test_refused_connection_is_transport_error() {
        // Bind an ephemeral port and release it so nothing is listening there
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let source = HttpSource::new().unwrap().with_progress(false);
        let mut sink = Vec::new();

        let err = source
            .fetch(&format!("http://127.0.0.1:{}/model.gguf", port), &mut sink)
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
        assert!(sink.is_empty());
    }
}
