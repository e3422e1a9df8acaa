//! Stream accessor trait for transport layer

use crate::error::{MeterError, MeterResult};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::Instant;

/// Pull-style access to the byte stream coming from the meter
#[async_trait]
pub trait StreamAccessor: Send {
    /// Current read timeout. `None` means reads may block forever.
    fn timeout(&self) -> Option<Duration>;

    /// Set the read timeout
    async fn set_timeout(&mut self, timeout: Option<Duration>) -> MeterResult<()>;

    /// Read whatever is available, waiting for at least one byte
    ///
    /// # Returns
    ///
    /// Number of bytes read, or 0 at end of stream
    async fn read(&mut self, buf: &mut [u8]) -> MeterResult<usize>;

    /// Read up to `buf.len()` bytes
    ///
    /// Keeps reading until the buffer is full, the stream ends, or the read
    /// timeout elapses. The timeout bounds the whole call, not each chunk.
    ///
    /// # Returns
    ///
    /// Number of bytes placed at the start of `buf`; 0 if nothing arrived
    async fn read_up_to(&mut self, buf: &mut [u8]) -> MeterResult<usize> {
        let deadline = self.timeout().map(|timeout| Instant::now() + timeout);
        let mut filled = 0;

        while filled < buf.len() {
            let n = match deadline {
                Some(deadline) => {
                    match tokio::time::timeout_at(deadline, self.read(&mut buf[filled..])).await {
                        Ok(result) => result?,
                        Err(_) => break,
                    }
                }
                None => self.read(&mut buf[filled..]).await?,
            };
            if n == 0 {
                break;
            }
            filled += n;
        }

        Ok(filled)
    }

    /// Check if the stream is closed
    fn is_closed(&self) -> bool;

    /// Close the stream
    async fn close(&mut self) -> MeterResult<()>;
}

/// Transport layer trait that extends StreamAccessor
#[async_trait]
pub trait TransportLayer: StreamAccessor {
    /// Open the physical layer connection
    async fn open(&mut self) -> MeterResult<()>;
}

/// StreamAccessor over any async reader, e.g. a pipe or a recorded capture
#[derive(Debug)]
pub struct IoStream<S> {
    inner: Option<S>,
    timeout: Option<Duration>,
}

impl<S> IoStream<S>
where
    S: AsyncRead + Unpin + Send,
{
    /// Wrap an already open reader
    pub fn new(inner: S, timeout: Option<Duration>) -> Self {
        Self {
            inner: Some(inner),
            timeout,
        }
    }
}

#[async_trait]
impl<S> StreamAccessor for IoStream<S>
where
    S: AsyncRead + Unpin + Send,
{
    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn set_timeout(&mut self, timeout: Option<Duration>) -> MeterResult<()> {
        self.timeout = timeout;
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> MeterResult<usize> {
        let inner = self.inner.as_mut().ok_or_else(|| {
            MeterError::Io(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "Stream already closed",
            ))
        })?;
        Ok(inner.read(buf).await?)
    }

    fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    async fn close(&mut self) -> MeterResult<()> {
        self.inner = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_read_up_to_accumulates_chunks() {
        let mock = Builder::new().read(&[0x68, 0xFA]).read(&[0xFA, 0x68]).build();
        let mut stream = IoStream::new(mock, Some(Duration::from_secs(1)));

        let mut buf = [0u8; 4];
        assert_eq!(stream.read_up_to(&mut buf).await.unwrap(), 4);
        assert_eq!(buf, [0x68, 0xFA, 0xFA, 0x68]);
    }

    #[tokio::test]
    async fn test_read_up_to_stops_at_end_of_stream() {
        let mock = Builder::new().read(&[0x01, 0x02]).build();
        let mut stream = IoStream::new(mock, None);

        let mut buf = [0u8; 8];
        assert_eq!(stream.read_up_to(&mut buf).await.unwrap(), 2);
        assert_eq!(stream.read_up_to(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_read_up_to_returns_partial_on_timeout() {
        let mock = Builder::new()
            .read(&[0x68, 0x10])
            .wait(Duration::from_millis(250))
            .read(&[0x10])
            .build();
        let mut stream = IoStream::new(mock, Some(Duration::from_millis(50)));

        let mut buf = [0u8; 4];
        assert_eq!(stream.read_up_to(&mut buf).await.unwrap(), 2);

        stream.set_timeout(Some(Duration::from_secs(2))).await.unwrap();
        assert_eq!(stream.read_up_to(&mut buf).await.unwrap(), 1);
        assert_eq!(buf[0], 0x10);
    }

    #[tokio::test]
    async fn test_read_after_close_fails() {
        let mock = Builder::new().build();
        let mut stream = IoStream::new(mock, None);
        stream.close().await.unwrap();

        assert!(stream.is_closed());
        let mut buf = [0u8; 1];
        assert!(matches!(stream.read(&mut buf).await, Err(MeterError::Io(_))));
    }
}
