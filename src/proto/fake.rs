use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use super::{ProtoError, Result};
use crate::bus::{Address, GpibBus};

/// Serial port stand-in: keeps everything written to it and, like a
/// controller with `++auto 0`, hands out one canned reply line per read
/// request (`++read`, `++ver`).
pub(crate) struct FakeBuffer {
    pending: VecDeque<Vec<u8>>,
    readable: Vec<u8>,
    waker: Option<Waker>,
    written: Written,
}

/// Handle on the bytes written to a [`FakeBuffer`].
#[derive(Clone, Default)]
pub(crate) struct Written(Arc<Mutex<Vec<u8>>>);

impl Written {
    pub(crate) fn text(&self) -> String {
        let bytes = self.0.lock().expect("written buffer poisoned");
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

fn count(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

impl FakeBuffer {
    pub(crate) fn new(response_buf: impl Into<Vec<u8>>) -> Self {
        let response_buf = response_buf.into();
        let pending = response_buf
            .split_inclusive(|b| *b == b'\n')
            .map(|line| line.to_vec())
            .collect();
        Self {
            pending,
            readable: Vec::new(),
            waker: None,
            written: Written::default(),
        }
    }

    pub(crate) fn written(&self) -> Written {
        self.written.clone()
    }
}

impl tokio::io::AsyncRead for FakeBuffer {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        if !self.readable.is_empty() {
            let c = buf.remaining().min(self.readable.len());
            buf.put_slice(&self.readable[0..c]);
            self.readable.drain(0..c);
            Poll::Ready(Ok(()))
        } else if self.pending.is_empty() {
            // Nothing left to answer with: end of stream.
            Poll::Ready(Ok(()))
        } else {
            self.waker = Some(cx.waker().clone());
            Poll::Pending
        }
    }
}

impl tokio::io::AsyncWrite for FakeBuffer {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::result::Result<usize, std::io::Error>> {
        self.written
            .0
            .lock()
            .expect("written buffer poisoned")
            .extend_from_slice(buf);
        let requests = count(buf, b"++read") + count(buf, b"++ver");
        for _ in 0..requests {
            if let Some(line) = self.pending.pop_front() {
                self.readable.extend_from_slice(&line);
            }
        }
        if requests > 0 {
            if let Some(waker) = self.waker.take() {
                waker.wake();
            }
        }
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<std::result::Result<(), std::io::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<std::result::Result<(), std::io::Error>> {
        Poll::Ready(Ok(()))
    }
}

/// What a driver asked of a [`FakeBus`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    SetAddress(u8),
    Write(String),
    Read(Duration),
    Local,
}

/// Bus recording every operation, answering reads from a queue.
/// An empty queue behaves like a read timeout.
#[derive(Default)]
pub(crate) struct FakeBus {
    pub(crate) address: Option<Address>,
    pub(crate) events: Vec<Event>,
    pub(crate) responses: VecDeque<Result<String>>,
    pub(crate) fail_writes: bool,
}

impl FakeBus {
    pub(crate) fn respond(&mut self, line: &str) {
        self.responses.push_back(Ok(line.to_string()));
    }

    pub(crate) fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

impl GpibBus for FakeBus {
    fn address(&self) -> Option<Address> {
        self.address
    }

    async fn set_address(&mut self, address: Address) -> Result<()> {
        self.events.push(Event::SetAddress(address.get()));
        self.address = Some(address);
        Ok(())
    }

    async fn write(&mut self, command: &str) -> Result<()> {
        if self.fail_writes {
            return Err(ProtoError::Abort);
        }
        self.events.push(Event::Write(command.to_string()));
        Ok(())
    }

    async fn read(&mut self, timeout: Duration) -> Result<String> {
        self.events.push(Event::Read(timeout));
        self.responses
            .pop_front()
            .unwrap_or(Err(ProtoError::Timeout(timeout)))
    }

    async fn local(&mut self) -> Result<()> {
        self.events.push(Event::Local);
        Ok(())
    }
}
