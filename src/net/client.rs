//! Status query client
//!
//! Performs the raw exchange with a game server: connect, write the status
//! probe, then read until the server closes the connection. The reply has no
//! framing, so end-of-stream is the only message boundary.
//!
//! The whole read loop runs under a deadline so a peer that never closes
//! cannot hang the caller.

use std::io::ErrorKind;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, trace};

use crate::config::StatusConfig;
use crate::error::NetworkError;
use crate::net::Target;
use crate::protocol::STATUS_PROBE;

/// Bytes reserved ahead of each socket read
const READ_CHUNK_SIZE: usize = 4096;

/// One-shot status client
#[derive(Debug, Clone)]
pub struct StatusClient {
    connect_timeout: Duration,
    read_timeout: Duration,
    max_response_bytes: usize,
}

impl Default for StatusClient {
    fn default() -> Self {
        Self::from_config(&StatusConfig::default())
    }
}

impl StatusClient {
    pub fn new(connect_timeout: Duration, read_timeout: Duration, max_response_bytes: usize) -> Self {
        Self {
            connect_timeout,
            read_timeout,
            max_response_bytes,
        }
    }

    pub fn from_config(config: &StatusConfig) -> Self {
        Self::new(
            config.connect_timeout(),
            config.read_timeout(),
            config.max_response_bytes,
        )
    }

    /// Query a server and return the raw reply
    ///
    /// Fails with [`NetworkError::EmptyResponse`] if the server accepted the
    /// connection but closed it without sending anything.
    pub async fn fetch(&self, target: &Target) -> Result<Bytes, NetworkError> {
        let mut stream = self.connect(target).await?;
        debug!(server = %target, "Connected, sending status probe");

        let reply = self.exchange(&mut stream).await?;
        debug!(server = %target, len = reply.len(), "Received status reply");
        Ok(reply)
    }

    async fn connect(&self, target: &Target) -> Result<TcpStream, NetworkError> {
        match timeout(self.connect_timeout, TcpStream::connect(target.connect_addr())).await {
            Ok(Ok(stream)) => {
                // The probe is tiny; don't let Nagle hold it back
                let _ = stream.set_nodelay(true);
                Ok(stream)
            }
            Ok(Err(e)) => Err(NetworkError::ConnectFailure {
                target: target.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(NetworkError::ConnectTimeout(target.to_string())),
        }
    }

    /// Write the probe on an established stream and read the reply until the
    /// peer closes its side
    pub async fn exchange<S>(&self, stream: &mut S) -> Result<Bytes, NetworkError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        stream
            .write_all(&STATUS_PROBE)
            .await
            .map_err(|e| NetworkError::WriteError(e.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|e| NetworkError::WriteError(e.to_string()))?;

        let deadline = Instant::now() + self.read_timeout;
        let mut buffer = BytesMut::with_capacity(READ_CHUNK_SIZE);

        loop {
            buffer.reserve(READ_CHUNK_SIZE);
            let read = match timeout_at(deadline, stream.read_buf(&mut buffer)).await {
                Ok(read) => read,
                Err(_) => {
                    return Err(NetworkError::ReadTimeout {
                        received: buffer.len(),
                    })
                }
            };

            match read {
                Ok(0) => break,
                Ok(n) => {
                    trace!(n, total = buffer.len(), "Read status reply chunk");
                    if buffer.len() > self.max_response_bytes {
                        return Err(NetworkError::ResponseTooLarge {
                            size: buffer.len(),
                            max: self.max_response_bytes,
                        });
                    }
                }
                // Some servers reset instead of closing once the reply is out
                Err(e) if e.kind() == ErrorKind::ConnectionReset && !buffer.is_empty() => {
                    trace!(total = buffer.len(), "Connection reset after reply, treating as end of stream");
                    break;
                }
                Err(e) => return Err(NetworkError::ReadError(e.to_string())),
            }
        }

        if buffer.is_empty() {
            return Err(NetworkError::EmptyResponse);
        }
        Ok(buffer.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;
    use tokio::net::TcpListener;

    const REPLY: &[u8] = br#"<status><players online="3"/></status>"#;

    fn client() -> StatusClient {
        StatusClient::new(Duration::from_secs(2), Duration::from_millis(500), 1024)
    }

    #[tokio::test]
    async fn test_exchange_reads_until_close() {
        let (mut ours, mut theirs) = duplex(64);

        let server = tokio::spawn(async move {
            let mut probe = [0u8; 8];
            theirs.read_exact(&mut probe).await.unwrap();
            // Reply in pieces to exercise accumulation
            for chunk in REPLY.chunks(7) {
                theirs.write_all(chunk).await.unwrap();
            }
            probe
        });

        let reply = client().exchange(&mut ours).await.unwrap();
        assert_eq!(&reply[..], REPLY);
        assert_eq!(server.await.unwrap(), STATUS_PROBE);
    }

    #[tokio::test]
    async fn test_exchange_empty_reply() {
        let (mut ours, mut theirs) = duplex(64);

        tokio::spawn(async move {
            let mut probe = [0u8; 8];
            theirs.read_exact(&mut probe).await.unwrap();
        });

        let result = client().exchange(&mut ours).await;
        assert!(matches!(result, Err(NetworkError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_exchange_response_too_large() {
        let (mut ours, mut theirs) = duplex(4096);
        let client = StatusClient::new(Duration::from_secs(2), Duration::from_secs(2), 16);

        tokio::spawn(async move {
            let mut probe = [0u8; 8];
            theirs.read_exact(&mut probe).await.unwrap();
            let _ = theirs.write_all(&[b'x'; 64]).await;
        });

        let result = client.exchange(&mut ours).await;
        assert!(matches!(
            result,
            Err(NetworkError::ResponseTooLarge { max: 16, .. })
        ));
    }

    #[tokio::test]
    async fn test_exchange_read_deadline() {
        let (mut ours, mut theirs) = duplex(64);
        let client = StatusClient::new(Duration::from_secs(2), Duration::from_millis(100), 1024);

        let server = tokio::spawn(async move {
            let mut probe = [0u8; 8];
            theirs.read_exact(&mut probe).await.unwrap();
            theirs.write_all(b"<status>").await.unwrap();
            // Hold the connection open past the deadline
            tokio::time::sleep(Duration::from_secs(1)).await;
            drop(theirs);
        });

        let result = client.exchange(&mut ours).await;
        assert!(matches!(
            result,
            Err(NetworkError::ReadTimeout { received: 8 })
        ));
        server.abort();
    }

    #[tokio::test]
    async fn test_fetch_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut probe = [0u8; 8];
            socket.read_exact(&mut probe).await.unwrap();
            assert_eq!(probe, STATUS_PROBE);
            socket.write_all(REPLY).await.unwrap();
        });

        let reply = client()
            .fetch(&Target::with_port("127.0.0.1", port))
            .await
            .unwrap();
        assert_eq!(&reply[..], REPLY);
    }

    #[tokio::test]
    async fn test_fetch_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = client()
            .fetch(&Target::with_port("127.0.0.1", port))
            .await
            .unwrap_err();
        assert!(err.is_unreachable(), "unexpected error: {err}");
    }
}
