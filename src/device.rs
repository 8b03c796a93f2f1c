use std::{fmt, time::Duration};
use tokio::sync::MutexGuard;
use tracing::{debug, warn};

use crate::bus::{Address, GpibBus, SharedBus, DEFAULT_READ_TIMEOUT};
use crate::command::{Command, DigitMode, Function, GateTime, DISPLAY_WIDTH};
use crate::measurement::parse_reading;
use crate::proto::command::{Command as Directive, EndOfRecord};
use crate::proto::{ProtoError, Result};

/// HP 5384A frequency counter on a shared GPIB bus.
pub struct Hp5384a<B: GpibBus> {
    bus: SharedBus<B>,
    address: Address,
    addressed: bool,
    read_timeout: Duration,
}

impl<B: GpibBus> Hp5384a<B> {
    /// Bind a counter to `bus`. Addresses it unconditionally.
    pub async fn new(bus: SharedBus<B>, address: Address) -> Result<Self> {
        let mut device = Self {
            bus,
            address,
            addressed: false,
            read_timeout: DEFAULT_READ_TIMEOUT,
        };
        {
            let mut bus = device.bus.lock().await;
            bus.write(&Directive::ReadTimeout(DEFAULT_READ_TIMEOUT).to_string())
                .await?;
            Self::select(&mut bus, address, &mut device.addressed).await?;
        }
        Ok(device)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// The controller forgets the record framing when it switches target,
    /// so it is sent again with every switch.
    async fn select(bus: &mut B, address: Address, addressed: &mut bool) -> Result<()> {
        if bus.address() != Some(address) || !*addressed {
            debug!("Addressing HP 5384A at {}", address);
            // Stays false until the framing is confirmed sent.
            *addressed = false;
            bus.set_address(address).await?;
            bus.write(&Directive::EndOfRecord(EndOfRecord::Lf).to_string())
                .await?;
            *addressed = true;
        }
        Ok(())
    }

    async fn lock(&mut self) -> Result<MutexGuard<'_, B>> {
        let mut bus = self.bus.lock().await;
        Self::select(&mut bus, self.address, &mut self.addressed).await?;
        Ok(bus)
    }

    async fn send(&mut self, command: Command) -> Result<()> {
        let mut bus = self.lock().await?;
        bus.write(&command.to_string()).await
    }

    pub async fn identity(&mut self) -> Result<String> {
        let mut bus = self.lock().await?;
        bus.identity(&Command::Identify.to_string()).await
    }

    pub async fn reset(&mut self) -> Result<()> {
        self.send(Command::Reset).await
    }

    pub async fn enable_filter(&mut self, on: bool) -> Result<()> {
        self.send(Command::Filter(on)).await
    }

    pub async fn enable_attenuator(&mut self, on: bool) -> Result<()> {
        self.send(Command::Attenuator(on)).await
    }

    pub async fn set_manual_level(&mut self, on: bool) -> Result<()> {
        self.send(Command::ManualLevel(on)).await
    }

    /// Select the gate time. The read timeout follows, a measurement takes
    /// at least one gate period.
    pub async fn set_gate_time(&mut self, gate: GateTime) -> Result<()> {
        let timeout = gate.read_timeout();
        {
            let mut bus = self.lock().await?;
            bus.write(&Command::Gate(gate).to_string()).await?;
            bus.write(&Directive::ReadTimeout(timeout).to_string())
                .await?;
        }
        self.read_timeout = timeout;
        Ok(())
    }

    /// Select `function` and read one value.
    ///
    /// `Ok(None)` means no reading: the read failed or timed out, or the
    /// response was not a number. The two cases are not told apart.
    ///
    /// Only the read and parse are folded into `None`. Errors from addressing
    /// the counter or writing the function select (`FU`) propagate as `Err`.
    pub async fn measure(&mut self, function: Function) -> Result<Option<f64>> {
        let address = self.address;
        let timeout = self.read_timeout;
        let mut bus = self.lock().await?;
        bus.write(&Command::Function(function).to_string()).await?;
        match bus.read(timeout).await {
            Ok(response) => {
                let value = parse_reading(&response);
                if value.is_none() {
                    warn!(
                        "Invalid reading from HP 5384A at {}: {:?}",
                        address, response
                    );
                }
                Ok(value)
            }
            Err(err) => {
                warn!("No reading from HP 5384A at {}: {}", address, err);
                Ok(None)
            }
        }
    }

    pub async fn set_digit_mode(&mut self, mode: DigitMode) -> Result<()> {
        self.send(Command::Digit(mode)).await
    }

    pub async fn set_display_on(&mut self, on: bool) -> Result<()> {
        if on {
            self.send(Command::DisplayNormal).await
        } else {
            self.send(Command::blank_display()).await
        }
    }

    /// Show the measured value again after `set_display_text`.
    pub async fn set_display_normal(&mut self) -> Result<()> {
        self.send(Command::DisplayNormal).await
    }

    pub async fn set_display_text(&mut self, text: impl AsRef<str>) -> Result<()> {
        let text = text.as_ref();
        if text.chars().count() > DISPLAY_WIDTH
            || !text.chars().all(|c| c.is_ascii() && !c.is_ascii_control())
        {
            return Err(ProtoError::DisplayText(text.to_string()));
        }
        self.send(Command::DisplayText(text.to_string())).await
    }

    /// Return the counter to front panel control.
    pub async fn go_local(&mut self) -> Result<()> {
        let mut bus = self.lock().await?;
        bus.local().await
    }
}

impl<B: GpibBus> fmt::Display for Hp5384a<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HP 5384A address: {}", self.address)
    }
}
