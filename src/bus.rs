use std::{fmt, sync::Arc, time::Duration};

use tokio::sync::Mutex;

use crate::proto::{ProtoError, Result};

/// Read timeout used until a gate time is selected, and for identity queries.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(1200);

/// Highest GPIB primary address.
pub const MAX_ADDRESS: u8 = 30;

/// A bus shared between all drivers of instruments connected to it.
pub type SharedBus<B> = Arc<Mutex<B>>;

/// GPIB primary address (0..=30).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(u8);

impl Address {
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Address {
    type Error = ProtoError;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        if value <= MAX_ADDRESS {
            Ok(Self(value))
        } else {
            Err(ProtoError::InvalidAddress(value))
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operations a GPIB controller offers to instrument drivers.
///
/// The bus has a single target at a time. That target is global state of the
/// bus, shared by every driver holding the same [`SharedBus`].
#[allow(async_fn_in_trait)]
pub trait GpibBus {
    /// Currently targeted device, `None` until the first `set_address`.
    fn address(&self) -> Option<Address>;

    async fn set_address(&mut self, address: Address) -> Result<()>;

    /// Send a line, no response expected.
    async fn write(&mut self, command: &str) -> Result<()>;

    /// Ask the addressed device to talk and wait for one response line.
    async fn read(&mut self, timeout: Duration) -> Result<String>;

    async fn query(&mut self, command: &str, timeout: Duration) -> Result<String> {
        self.write(command).await?;
        self.read(timeout).await
    }

    async fn identity(&mut self, query: &str) -> Result<String> {
        Ok(self
            .query(query, DEFAULT_READ_TIMEOUT)
            .await?
            .trim()
            .to_string())
    }

    /// Return the addressed device to front panel control.
    async fn local(&mut self) -> Result<()>;
}
