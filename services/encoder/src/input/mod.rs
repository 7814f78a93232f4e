//! Queue boundary: where track events come from
//!
//! A [`TrackSource`] hands out [`Delivery`] values one at a time and is told
//! when each has been dealt with. The broker itself lives outside this
//! process; deliveries arrive as newline-delimited JSON over stdin, a Unix
//! socket or a TCP connection.

mod line_source;

pub use line_source::LineSource;

use crate::error::SourceError;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tokio::io::BufReader;
use tracing::info;

/// One queue message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Source-assigned tag, used for acknowledgement
    pub tag: u64,
    pub body: Vec<u8>,
}

/// A stream of deliveries
#[async_trait]
pub trait TrackSource: Send {
    /// Next delivery, or `None` once the source is exhausted
    async fn next_delivery(&mut self) -> Option<Result<Delivery, SourceError>>;

    /// Mark a delivery as handled
    async fn ack(&mut self, tag: u64) -> Result<(), SourceError>;

    /// Name for logging
    fn name(&self) -> &str;
}

/// Where to read deliveries from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEndpoint {
    Stdin,
    Unix(PathBuf),
    Tcp(String),
}

impl FromStr for SourceEndpoint {
    type Err = SourceError;

    fn from_str(endpoint: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| SourceError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        };

        if endpoint == "stdin" || endpoint == "-" {
            return Ok(SourceEndpoint::Stdin);
        }

        if let Some(path) = endpoint.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(invalid("missing socket path"));
            }
            return Ok(SourceEndpoint::Unix(PathBuf::from(path)));
        }

        if let Some(address) = endpoint.strip_prefix("tcp://") {
            match address.rsplit_once(':') {
                Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
                    return Ok(SourceEndpoint::Tcp(address.to_string()));
                }
                _ => return Err(invalid("expected tcp://host:port")),
            }
        }

        Err(invalid("expected `stdin`, `unix:///path` or `tcp://host:port`"))
    }
}

impl fmt::Display for SourceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceEndpoint::Stdin => f.write_str("stdin"),
            SourceEndpoint::Unix(path) => write!(f, "unix://{}", path.display()),
            SourceEndpoint::Tcp(address) => write!(f, "tcp://{}", address),
        }
    }
}

impl SourceEndpoint {
    /// Open the endpoint as a line source
    pub async fn open(&self) -> Result<Box<dyn TrackSource>, SourceError> {
        let name = self.to_string();
        let connect_error = |source| SourceError::Connect {
            endpoint: name.clone(),
            source,
        };

        let source: Box<dyn TrackSource> = match self {
            SourceEndpoint::Stdin => {
                Box::new(LineSource::new(BufReader::new(tokio::io::stdin()), &name))
            }
            #[cfg(unix)]
            SourceEndpoint::Unix(path) => {
                let stream = tokio::net::UnixStream::connect(path)
                    .await
                    .map_err(connect_error)?;
                Box::new(LineSource::new(BufReader::new(stream), &name))
            }
            #[cfg(not(unix))]
            SourceEndpoint::Unix(_) => {
                return Err(SourceError::InvalidEndpoint {
                    endpoint: name.clone(),
                    reason: "unix sockets are not supported on this platform".to_string(),
                })
            }
            SourceEndpoint::Tcp(address) => {
                let stream = tokio::net::TcpStream::connect(address.as_str())
                    .await
                    .map_err(connect_error)?;
                Box::new(LineSource::new(BufReader::new(stream), &name))
            }
        };

        info!(source = %name, "Opened track source");
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoints() {
        assert_eq!("stdin".parse::<SourceEndpoint>().unwrap(), SourceEndpoint::Stdin);
        assert_eq!(
            "unix:///tmp/rds/tracks.sock".parse::<SourceEndpoint>().unwrap(),
            SourceEndpoint::Unix(PathBuf::from("/tmp/rds/tracks.sock"))
        );
        assert_eq!(
            "tcp://127.0.0.1:7000".parse::<SourceEndpoint>().unwrap(),
            SourceEndpoint::Tcp("127.0.0.1:7000".to_string())
        );
    }

    #[test]
    fn test_reject_bad_endpoints() {
        for endpoint in ["amqp://broker", "unix://", "tcp://nohost", "tcp://:80", "tcp://h:99999"] {
            assert!(
                endpoint.parse::<SourceEndpoint>().is_err(),
                "{} should not parse",
                endpoint
            );
        }
    }

    #[test]
    fn test_display_round_trips() {
        let endpoint: SourceEndpoint = "tcp://encoder-feed:7000".parse().unwrap();
        assert_eq!(endpoint.to_string(), "tcp://encoder-feed:7000");
    }

    #[tokio::test]
    async fn test_open_tcp_reads_lines() {
        use tokio::io::AsyncWriteExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            stream
                .write_all(b"{\"artist\":\"A\",\"song\":\"B\"}\n")
                .await
                .unwrap();
        });

        let endpoint: SourceEndpoint = format!("tcp://127.0.0.1:{}", port).parse().unwrap();
        let mut source = endpoint.open().await.unwrap();
        let delivery = source.next_delivery().await.unwrap().unwrap();
        assert_eq!(delivery.body, br#"{"artist":"A","song":"B"}"#.to_vec());
        assert!(source.next_delivery().await.is_none());
    }

    #[tokio::test]
    async fn test_open_refused_tcp_fails() {
        let port = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let endpoint = SourceEndpoint::Tcp(format!("127.0.0.1:{}", port));
        assert!(matches!(
            endpoint.open().await,
            Err(SourceError::Connect { .. })
        ));
    }
}
