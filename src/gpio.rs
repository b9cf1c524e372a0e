//! Port/pin capability.
//!
//! Boards expose their I/O as a [`PortBank`]: a handful of eight-bit ports,
//! each with a direction register, an output latch and an input register.
//! [`Gpio`] layers the pin-level API on top and validates raw identifiers, so
//! a bad port or pin never reaches a register.

use thiserror::Error;

pub const NUM_PORTS: u8 = 4;
pub const PINS_PER_PORT: u8 = 8;

/// Raw read result for an invalid identifier.
pub const INVALID: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioError {
    #[error("invalid port identifier {0}")]
    InvalidPort(u8),
    #[error("invalid pin identifier {0}")]
    InvalidPin(u8),
    #[error("invalid pin direction {0}")]
    InvalidDirection(u8),
    #[error("invalid resistor mode {0}")]
    InvalidResistor(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortId(u8);

impl PortId {
    pub const A: Self = Self(0);
    pub const B: Self = Self(1);
    pub const C: Self = Self(2);
    pub const D: Self = Self(3);

    pub fn new(raw: u8) -> Result<Self, GpioError> {
        if raw < NUM_PORTS {
            Ok(Self(raw))
        } else {
            Err(GpioError::InvalidPort(raw))
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinId(u8);

impl PinId {
    pub const P0: Self = Self(0);
    pub const P1: Self = Self(1);
    pub const P2: Self = Self(2);
    pub const P3: Self = Self(3);
    pub const P4: Self = Self(4);
    pub const P5: Self = Self(5);
    pub const P6: Self = Self(6);
    pub const P7: Self = Self(7);

    pub fn new(raw: u8) -> Result<Self, GpioError> {
        if raw < PINS_PER_PORT {
            Ok(Self(raw))
        } else {
            Err(GpioError::InvalidPin(raw))
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn mask(self) -> u8 {
        1 << self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Input,
    Output,
}

impl TryFrom<u8> for Direction {
    type Error = GpioError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Direction::Input),
            1 => Ok(Direction::Output),
            other => Err(GpioError::InvalidDirection(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Internal resistor selection for an input pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resistor {
    None,
    PullUp,
}

impl TryFrom<u8> for Resistor {
    type Error = GpioError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Resistor::None),
            1 => Ok(Resistor::PullUp),
            other => Err(GpioError::InvalidResistor(other)),
        }
    }
}

/// Register-level access to a bank of eight-bit ports.
///
/// Identifiers are already validated; implementations only move bits.
pub trait PortBank {
    /// Direction register, a set bit is an output.
    fn direction(&self, port: PortId) -> u8;
    fn set_direction(&mut self, port: PortId, bits: u8);
    /// Output latch.
    fn output(&self, port: PortId) -> u8;
    fn set_output(&mut self, port: PortId, bits: u8);
    /// Sampled pin levels.
    fn input(&self, port: PortId) -> u8;

    /// Defaults to the AVR convention: a set output bit on an input pin
    /// enables its pull-up.
    fn set_pull_up(&mut self, port: PortId, pin: PinId, enabled: bool) {
        let out = self.output(port);
        let bits = if enabled { out | pin.mask() } else { out & !pin.mask() };
        self.set_output(port, bits);
    }
}

/// Pin and port operations over a [`PortBank`].
#[derive(Debug)]
pub struct Gpio<B> {
    bank: B,
}

impl<B: PortBank> Gpio<B> {
    pub fn new(bank: B) -> Self {
        Self { bank }
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }

    /// Marks every pin set in `outputs` as an output. Pins already configured
    /// as outputs stay outputs.
    pub fn set_port_direction(&mut self, port: u8, outputs: u8) -> Result<(), GpioError> {
        let port = PortId::new(port)?;
        let ddr = self.bank.direction(port);
        self.bank.set_direction(port, ddr | outputs);
        Ok(())
    }

    pub fn set_pin_direction(
        &mut self,
        port: u8,
        pin: u8,
        direction: Direction,
    ) -> Result<(), GpioError> {
        let (port, pin) = Self::locate(port, pin)?;
        let ddr = self.bank.direction(port);
        let ddr = match direction {
            Direction::Output => ddr | pin.mask(),
            Direction::Input => ddr & !pin.mask(),
        };
        self.bank.set_direction(port, ddr);
        Ok(())
    }

    pub fn read_pin(&self, port: u8, pin: u8) -> Result<Level, GpioError> {
        let (port, pin) = Self::locate(port, pin)?;
        Ok(Level::from(self.bank.input(port) & pin.mask() != 0))
    }

    /// `0` or `1`, or [`INVALID`] for a bad identifier.
    pub fn read_pin_raw(&self, port: u8, pin: u8) -> u8 {
        match self.read_pin(port, pin) {
            Ok(level) => level.is_high() as u8,
            Err(_) => INVALID,
        }
    }

    pub fn write_pin(&mut self, port: u8, pin: u8, level: Level) -> Result<(), GpioError> {
        let (port, pin) = Self::locate(port, pin)?;
        let out = self.bank.output(port);
        let out = if level.is_high() {
            out | pin.mask()
        } else {
            out & !pin.mask()
        };
        self.bank.set_output(port, out);
        Ok(())
    }

    pub fn enable_pull_up(&mut self, port: u8, pin: u8) -> Result<(), GpioError> {
        self.set_resistor(port, pin, Resistor::PullUp)
    }

    pub fn set_resistor(&mut self, port: u8, pin: u8, resistor: Resistor) -> Result<(), GpioError> {
        let (port, pin) = Self::locate(port, pin)?;
        if resistor == Resistor::PullUp {
            self.bank.set_pull_up(port, pin, true);
        }
        Ok(())
    }

    pub fn write_port(&mut self, port: u8, value: u8) -> Result<(), GpioError> {
        let port = PortId::new(port)?;
        self.bank.set_output(port, value);
        Ok(())
    }

    pub fn set_bits(&mut self, port: u8, bits: u8) -> Result<(), GpioError> {
        let port = PortId::new(port)?;
        let out = self.bank.output(port);
        self.bank.set_output(port, out | bits);
        Ok(())
    }

    pub fn clear_bits(&mut self, port: u8, bits: u8) -> Result<(), GpioError> {
        let port = PortId::new(port)?;
        let out = self.bank.output(port);
        self.bank.set_output(port, out & !bits);
        Ok(())
    }

    pub fn read_port(&self, port: u8) -> Result<u8, GpioError> {
        let port = PortId::new(port)?;
        Ok(self.bank.input(port))
    }

    /// Port input, or [`INVALID`] for a bad identifier.
    pub fn read_port_raw(&self, port: u8) -> u8 {
        self.read_port(port).unwrap_or(INVALID)
    }

    /// Replaces only the bits under `mask`, leaving the rest of the latch as is.
    pub fn write_masked(&mut self, port: u8, mask: u8, value: u8) -> Result<(), GpioError> {
        let port = PortId::new(port)?;
        self.write_field(port, mask, value);
        Ok(())
    }

    /// [`Gpio::write_masked`] for a port that is already a [`PortId`], so it
    /// cannot fail. The display drives its bus through this.
    pub fn write_field(&mut self, port: PortId, mask: u8, value: u8) {
        let out = self.bank.output(port);
        self.bank.set_output(port, (out & !mask) | (value & mask));
    }

    fn locate(port: u8, pin: u8) -> Result<(PortId, PinId), GpioError> {
        Ok((PortId::new(port)?, PinId::new(pin)?))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct PortRegisters {
    ddr: u8,
    port: u8,
    /// Pins driven from outside the chip.
    driven: u8,
    /// Levels of the externally driven pins.
    external: u8,
}

/// In-memory DDR/PORT/PIN model of four eight-bit ports.
///
/// Output pins read back their latch. Input pins read the level driven from
/// outside, or their pull-up level when nothing drives them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RegisterFile {
    ports: [PortRegisters; NUM_PORTS as usize],
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drives an input pin from outside, as a button would.
    pub fn drive(&mut self, port: PortId, pin: PinId, level: Level) {
        let regs = &mut self.ports[port.index()];
        regs.driven |= pin.mask();
        if level.is_high() {
            regs.external |= pin.mask();
        } else {
            regs.external &= !pin.mask();
        }
    }

    pub fn release(&mut self, port: PortId, pin: PinId) {
        self.ports[port.index()].driven &= !pin.mask();
    }
}

impl PortBank for RegisterFile {
    fn direction(&self, port: PortId) -> u8 {
        self.ports[port.index()].ddr
    }

    fn set_direction(&mut self, port: PortId, bits: u8) {
        self.ports[port.index()].ddr = bits;
    }

    fn output(&self, port: PortId) -> u8 {
        self.ports[port.index()].port
    }

    fn set_output(&mut self, port: PortId, bits: u8) {
        self.ports[port.index()].port = bits;
    }

    fn input(&self, port: PortId) -> u8 {
        let r = &self.ports[port.index()];
        let inputs = !r.ddr;
        let floating = inputs & !r.driven;
        (r.ddr & r.port) | (inputs & r.driven & r.external) | (floating & r.port)
    }
}
