//! Board configuration.

use fugit::{HertzU32, MillisDurationU32, SecsDurationU32};

use crate::control::{ControlEvent, Edge, LineConfig};
use crate::display::BusLayout;
use crate::gpio::{PinId, PortId};
use crate::tick::Prescaler;
use crate::timing::Timing;

pub const TIMING: Timing = Timing {
    tick_period: SecsDurationU32::secs(1),
    digit_dwell: MillisDurationU32::millis(4),
    debounce: MillisDurationU32::millis(30),
};

const _: () = assert!(TIMING.check().is_ok(), "stopwatch timing out of budget");

/// Base clock feeding the compare-match tick timer.
pub const TIMER_CLOCK: HertzU32 = HertzU32::from_raw(1_000_000);
pub const TIMER_PRESCALER: Prescaler = Prescaler::Div1024;

/// Selectors on port A bits 0..=5, BCD digit on the low nibble of port C.
pub const DISPLAY_LAYOUT: BusLayout = BusLayout {
    select_port: PortId::A,
    select_mask: 0x3F,
    digit_port: PortId::C,
    digit_mask: 0x0F,
};

pub const RESET_LINE: LineConfig = LineConfig {
    event: ControlEvent::Reset,
    port: PortId::D,
    pin: PinId::P2,
    edge: Edge::Falling,
    pull_up: true,
};

/// Pause is wired active-high with an external pull-down.
pub const PAUSE_LINE: LineConfig = LineConfig {
    event: ControlEvent::Pause,
    port: PortId::D,
    pin: PinId::P3,
    edge: Edge::Rising,
    pull_up: false,
};

pub const RESUME_LINE: LineConfig = LineConfig {
    event: ControlEvent::Resume,
    port: PortId::B,
    pin: PinId::P2,
    edge: Edge::Falling,
    pull_up: true,
};

pub const BUTTON_LINES: [LineConfig; 3] = [RESET_LINE, PAUSE_LINE, RESUME_LINE];
