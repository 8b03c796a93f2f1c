use futures::{FutureExt, SinkExt, StreamExt};
use std::{pin::Pin, time::Duration};
use tokio_serial::SerialPortBuilderExt;
use tokio_util::codec::Decoder;
use tracing::debug;

use super::Result;
use super::{codec::ProtocolCodec, command::Command, ProtoError};
use crate::bus::{Address, GpibBus, DEFAULT_READ_TIMEOUT};

/// Slack on top of the requested read timeout, covering USB latency and the
/// controller's own timeout handling.
pub const HOST_TIMEOUT_MARGIN: Duration = Duration::from_millis(500);

trait AsyncReadWrite<S>: futures::Sink<S> + futures::Stream {}

impl<T, S> AsyncReadWrite<S> for T where T: futures::Sink<S> + futures::Stream {}

/// Prologix GPIB-USB controller.
#[allow(clippy::type_complexity)]
pub struct Prologix {
    stream: Pin<
        Box<
            dyn AsyncReadWrite<
                Command,
                Error = std::io::Error,
                Item = std::result::Result<String, std::io::Error>,
            >,
        >,
    >,
    address: Option<Address>,
}

impl Prologix {
    pub fn new(com: impl AsRef<str>, baudrate: u32) -> Result<Self> {
        #[allow(unused_mut)]
        let mut port = tokio_serial::new(com.as_ref(), baudrate).open_native_async()?;

        #[cfg(unix)]
        port.set_exclusive(false)?;

        let stream = ProtocolCodec.framed(port);

        Ok(Self {
            stream: Box::pin(stream),
            address: None,
        })
    }

    #[cfg(test)]
    pub(crate) fn new_faked<T>(io: T) -> Self
    where
        T: tokio::io::AsyncRead + tokio::io::AsyncWrite + 'static,
    {
        Self {
            stream: Box::pin(ProtocolCodec.framed(io)),
            address: None,
        }
    }

    /// Put the adapter in controller mode and disable automatic read-after-write.
    pub async fn init(&mut self) -> Result<()> {
        self.send(Command::ControllerMode).await?;
        self.send(Command::Auto(false)).await
    }

    /// Adapter firmware identification.
    pub async fn version(&mut self) -> Result<String> {
        self.discard_stale();
        self.send(Command::Version).await?;
        self.next_line(DEFAULT_READ_TIMEOUT).await
    }

    /// A reply that missed its timeout may show up later. Whatever is already
    /// received when a new request goes out belongs to an older one.
    fn discard_stale(&mut self) {
        while let Some(item) = self.stream.next().now_or_never() {
            match item {
                Some(Ok(line)) => debug!("<- {} (stale, discarded)", line),
                Some(Err(err)) => debug!("stale read error discarded: {}", err),
                None => break,
            }
        }
    }

    async fn send(&mut self, command: Command) -> Result<()> {
        debug!("-> {}", command);
        self.stream.send(command).await?;
        Ok(())
    }

    async fn next_line(&mut self, timeout: Duration) -> Result<String> {
        match tokio::time::timeout(timeout + HOST_TIMEOUT_MARGIN, self.stream.next()).await {
            Ok(Some(Ok(line))) => {
                debug!("<- {}", line);
                Ok(line)
            }
            Ok(Some(Err(ioerr))) => Err(ioerr.into()),
            Ok(None) => Err(ProtoError::Abort),
            Err(_) => Err(ProtoError::Timeout(timeout)),
        }
    }
}

impl GpibBus for Prologix {
    fn address(&self) -> Option<Address> {
        self.address
    }

    async fn set_address(&mut self, address: Address) -> Result<()> {
        self.send(Command::Addr(address)).await?;
        self.address = Some(address);
        Ok(())
    }

    async fn write(&mut self, command: &str) -> Result<()> {
        self.send(Command::from(command)).await
    }

    async fn read(&mut self, timeout: Duration) -> Result<String> {
        self.discard_stale();
        self.send(Command::Read).await?;
        self.next_line(timeout).await
    }

    async fn local(&mut self) -> Result<()> {
        self.send(Command::Local).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::fake::FakeBuffer;
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_init() {
        let buffer = FakeBuffer::new("");
        let written = buffer.written();
        let mut bus = Prologix::new_faked(buffer);
        assert!(bus.init().await.is_ok());
        assert_eq!(written.text(), "++mode 1\n++auto 0\n");
    }

    #[tokio::test]
    async fn test_set_address() {
        let mut bus = Prologix::new_faked(FakeBuffer::new(""));
        assert_eq!(bus.address(), None);
        let address = Address::try_from(7).expect("address");
        bus.set_address(address).await.expect("set address");
        assert_eq!(bus.address(), Some(address));
    }

    #[tokio::test]
    async fn test_query() {
        let buffer = FakeBuffer::new("HP5384A\r\n");
        let written = buffer.written();
        let mut bus = Prologix::new_faked(buffer);
        let id = bus.identity("ID").await.expect("identity");
        assert_eq!(id, "HP5384A");
        assert_eq!(written.text(), "ID\n++read eoi\n");
    }

    #[tokio::test]
    async fn test_version() {
        let mut bus = Prologix::new_faked(FakeBuffer::new(
            "Prologix GPIB-USB Controller version 6.107\r\n",
        ));
        assert!(bus.version().await.expect("version").starts_with("Prologix"));
    }

    #[tokio::test]
    async fn test_read_without_response() {
        let mut bus = Prologix::new_faked(FakeBuffer::new(""));
        assert!(matches!(
            bus.read(Duration::from_millis(100)).await,
            Err(ProtoError::Abort)
        ));
    }

    #[tokio::test]
    async fn test_local() {
        let buffer = FakeBuffer::new("");
        let written = buffer.written();
        let mut bus = Prologix::new_faked(buffer);
        bus.local().await.expect("local");
        assert_eq!(written.text(), "++loc\n");
    }

    #[tokio::test]
    async fn test_reply_needs_request() {
        let mut bus = Prologix::new_faked(FakeBuffer::new("+1.0F\r\n+2.0F\r\n"));
        let timeout = Duration::from_millis(100);
        assert_eq!(bus.read(timeout).await.expect("read"), "+1.0F");
        assert_eq!(bus.read(timeout).await.expect("read"), "+2.0F");
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_reply_is_discarded() {
        let (host, mut controller) = tokio::io::duplex(256);
        let mut bus = Prologix::new_faked(host);
        let timeout = Duration::from_millis(100);

        assert!(matches!(
            bus.read(timeout).await,
            Err(ProtoError::Timeout(_))
        ));

        // The first reply arrives after the host gave up on it.
        controller
            .write_all(b"+00000111.0F\r\n")
            .await
            .expect("late reply");

        let answer = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            controller
                .write_all(b"+00000222.0F\r\n")
                .await
                .expect("reply");
            controller
        };
        let (line, mut controller) = tokio::join!(bus.read(timeout), answer);
        assert_eq!(line.expect("read"), "+00000222.0F");

        drop(bus);
        let mut sent = String::new();
        controller
            .read_to_string(&mut sent)
            .await
            .expect("requests");
        assert_eq!(sent, "++read eoi\n++read eoi\n");
    }
}
