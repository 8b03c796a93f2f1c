//!
//! This library controls a HP 5384A 225 MHz frequency counter over a GPIB bus.
//!
//! <br>
//!
//! # Details
//!
//! - The bus is driven through a Prologix GPIB-USB controller.
//!
//! - Several instruments may share one bus. Every driver checks the bus target
//!   before each operation and re-addresses it when another driver used it.
//!
//! - Basic setup and connection
//!
//!   ```no_run
//!   use std::sync::Arc;
//!   use tokio::sync::Mutex;
//!   use hp5384actrl::{command::Function, proto::prologix::Prologix, Address, Hp5384a};
//!   use hp5384actrl::{DEFAULT_ADDRESS, DEFAULT_BAUDRATE};
//!
//!   #[tokio::main]
//!   async fn main() -> hp5384actrl::Result<()> {
//!       let mut bus = Prologix::new("/dev/ttyUSB0", DEFAULT_BAUDRATE)?;
//!       bus.init().await?;
//!       let bus = Arc::new(Mutex::new(bus));
//!       let mut counter = Hp5384a::new(bus, Address::try_from(DEFAULT_ADDRESS)?).await?;
//!       eprintln!("Connected to: {}\n", counter.identity().await?);
//!       println!("{:?}", counter.measure(Function::FrequencyA).await?);
//!       Ok(())
//!   }
//!   ```
//!
//! # Supported devices
//!
//!  * HP 5384A
//!  * HP 5385A / 5386A (same command subset, untested)
//!

pub mod bus;
pub mod command;
pub mod device;
pub mod measurement;
pub mod proto;

pub use bus::{Address, GpibBus, SharedBus};
pub use device::Hp5384a;
pub use proto::Result;

#[cfg(unix)]
pub const DEFAULT_TTY: &str = "/dev/ttyUSB0";
#[cfg(windows)]
pub const DEFAULT_TTY: &str = "COM1";

/// Default Baudrate for the Prologix GPIB-USB controller.
pub const DEFAULT_BAUDRATE: u32 = 115200;

/// Factory GPIB address of the HP 5384A.
pub const DEFAULT_ADDRESS: u8 = 3;
