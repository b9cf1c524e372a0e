//! Six-digit stopwatch core.
//!
//! Time accumulation, button handling and display multiplexing, written
//! against small hardware capabilities so the same code runs on the board
//! and under host tests.

#![cfg_attr(not(test), no_std)]

pub mod clock;
pub mod config;
pub mod control;
pub mod display;
pub mod gpio;
pub mod signal;
pub mod stopwatch;
pub mod tick;
pub mod timing;

#[cfg(feature = "rp2040")]
pub mod board;

pub use clock::{ClockError, ElapsedTime, SharedClock};
pub use control::{ControlEvent, ControlHandler, Edge, EdgeInterrupt, LineConfig};
pub use display::{DigitFrame, DigitPosition, DisplayBus, Multiplexer, SegmentDisplay};
pub use gpio::{Gpio, GpioError, PortBank, RegisterFile};
pub use signal::TickFlag;
pub use stopwatch::{LoopState, MainLoop};
pub use tick::{CompareTimer, PeriodicDeadline, Prescaler, TickSource};
pub use timing::{Hold, Timing, TimingError};
