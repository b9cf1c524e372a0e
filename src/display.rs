//! Six-digit multiplexed display.
//!
//! One selector line per digit unit, one shared four-bit BCD bus feeding a
//! seven-segment decoder. Only one unit is lit at a time; sweeping through
//! all six fast enough makes them look continuously lit.

use fugit::MillisDurationU32;

use crate::clock::ElapsedTime;
use crate::gpio::{Gpio, GpioError, PortBank, PortId};
use crate::timing::Hold;

pub const DIGIT_COUNT: usize = 6;

/// Digit positions in sweep order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DigitPosition {
    SecondsOnes,
    SecondsTens,
    MinutesOnes,
    MinutesTens,
    HoursOnes,
    HoursTens,
}

impl DigitPosition {
    pub const ALL: [DigitPosition; DIGIT_COUNT] = [
        DigitPosition::SecondsOnes,
        DigitPosition::SecondsTens,
        DigitPosition::MinutesOnes,
        DigitPosition::MinutesTens,
        DigitPosition::HoursOnes,
        DigitPosition::HoursTens,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Selector bit for this unit, the only one set while it is lit.
    pub fn selector(self) -> u8 {
        1 << self.index()
    }
}

/// The six decimal digits of one render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DigitFrame([u8; DIGIT_COUNT]);

impl DigitFrame {
    pub fn digit(&self, position: DigitPosition) -> u8 {
        self.0[position.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (DigitPosition, u8)> + '_ {
        DigitPosition::ALL.iter().map(move |&p| (p, self.digit(p)))
    }
}

impl From<ElapsedTime> for DigitFrame {
    fn from(time: ElapsedTime) -> Self {
        let (s, m, h) = (time.seconds(), time.minutes(), time.hours());
        Self([s % 10, s / 10, m % 10, m / 10, h % 10, h / 10])
    }
}

/// Output side of the display: selector lines plus the digit bus.
pub trait DisplayBus {
    /// Lights `position` alone and puts `digit` on the bus.
    fn show(&mut self, position: DigitPosition, digit: u8);
    /// Deselects every unit and clears the digit bus.
    fn blank(&mut self);
}

/// Where the selector lines and the digit bus sit on the ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusLayout {
    pub select_port: PortId,
    pub select_mask: u8,
    pub digit_port: PortId,
    pub digit_mask: u8,
}

/// [`DisplayBus`] driven through GPIO ports.
#[derive(Debug)]
pub struct SegmentDisplay<B> {
    gpio: Gpio<B>,
    layout: BusLayout,
}

impl<B: PortBank> SegmentDisplay<B> {
    /// Configures the selector and digit bits as outputs.
    pub fn new(mut gpio: Gpio<B>, layout: BusLayout) -> Result<Self, GpioError> {
        gpio.set_port_direction(layout.select_port.index() as u8, layout.select_mask)?;
        gpio.set_port_direction(layout.digit_port.index() as u8, layout.digit_mask)?;
        Ok(Self { gpio, layout })
    }

    pub fn gpio(&self) -> &Gpio<B> {
        &self.gpio
    }

    pub fn gpio_mut(&mut self) -> &mut Gpio<B> {
        &mut self.gpio
    }

    /// Currently lit selector bits.
    pub fn selected(&self) -> u8 {
        self.gpio.bank().output(self.layout.select_port) & self.layout.select_mask
    }

    /// Value on the digit bus.
    pub fn bus(&self) -> u8 {
        self.gpio.bank().output(self.layout.digit_port) & self.layout.digit_mask
    }
}

impl<B: PortBank> DisplayBus for SegmentDisplay<B> {
    fn show(&mut self, position: DigitPosition, digit: u8) {
        let l = self.layout;
        // Deselect first so the new digit never shows on the old unit.
        self.gpio.write_field(l.select_port, l.select_mask, 0);
        self.gpio.write_field(l.digit_port, l.digit_mask, digit);
        self.gpio.write_field(l.select_port, l.select_mask, position.selector());
    }

    fn blank(&mut self) {
        let l = self.layout;
        self.gpio.write_field(l.select_port, l.select_mask, 0);
        self.gpio.write_field(l.digit_port, l.digit_mask, 0);
    }
}

/// Sweeps a [`DigitFrame`] across the display units.
#[derive(Debug, Clone, Copy)]
pub struct Multiplexer {
    dwell: MillisDurationU32,
}

impl Multiplexer {
    pub fn new(dwell: MillisDurationU32) -> Self {
        Self { dwell }
    }

    pub fn dwell(&self) -> MillisDurationU32 {
        self.dwell
    }

    /// Shows every position once, holding each for the dwell time.
    pub fn render_cycle<D: DisplayBus, H: Hold>(&self, display: &mut D, hold: &mut H, time: ElapsedTime) {
        let frame = DigitFrame::from(time);
        for (position, digit) in frame.iter() {
            display.show(position, digit);
            hold.hold(self.dwell);
        }
    }
}
