//! RP2040 implementations of the port, tick and interrupt-line capabilities.
//!
//! Port `n` maps onto GPIO `8n..8n+8` of bank 0. GPIO30 and GPIO31 do not
//! exist, so the top two bits of port D always read low.

use fugit::{MicrosDurationU32, SecsDurationU32};
use rp_pico::hal::gpio::{DynPinId, FunctionSioInput, Interrupt, Pin, PullNone};
use rp_pico::hal::pac;
use rp_pico::hal::timer::{Alarm, Alarm0, Instant, Timer};
use rtic::Mutex;

use crate::clock::{ElapsedTime, SharedClock};
use crate::control::{ControlEvent, Edge, EdgeInterrupt};
use crate::display::{DigitPosition, DisplayBus};
use crate::gpio::{PinId, PortBank, PortId};
use crate::tick::{period_micros, PeriodicDeadline, TickSource};
use crate::timing::TimingError;

const BANK0_PINS: u32 = 0x3FFF_FFFF;

fn sio() -> &'static pac::sio::RegisterBlock {
    // SAFETY: only the atomic SET/CLR/XOR aliases are written, and only for
    // pins handed to `SioPorts`.
    unsafe { &*pac::SIO::ptr() }
}

fn span(port: PortId) -> (u32, u32) {
    let shift = port.index() as u32 * 8;
    (shift, (0xFF << shift) & BANK0_PINS)
}

/// Bank 0 GPIO seen as four eight-bit ports through the SIO block.
pub struct SioPorts {
    _private: (),
}

impl SioPorts {
    /// # Safety
    ///
    /// Every pin accessed through the returned ports must already be switched
    /// to the SIO function and must not be driven through a HAL pin object.
    pub unsafe fn steal() -> Self {
        Self { _private: () }
    }
}

impl PortBank for SioPorts {
    fn direction(&self, port: PortId) -> u8 {
        let (shift, mask) = span(port);
        ((sio().gpio_oe().read().bits() & mask) >> shift) as u8
    }

    fn set_direction(&mut self, port: PortId, bits: u8) {
        let (shift, mask) = span(port);
        let current = sio().gpio_oe().read().bits();
        let flip = (current ^ ((bits as u32) << shift)) & mask;
        sio().gpio_oe_xor().write(|w| unsafe { w.bits(flip) });
    }

    fn output(&self, port: PortId) -> u8 {
        let (shift, mask) = span(port);
        ((sio().gpio_out().read().bits() & mask) >> shift) as u8
    }

    fn set_output(&mut self, port: PortId, bits: u8) {
        let (shift, mask) = span(port);
        let current = sio().gpio_out().read().bits();
        let flip = (current ^ ((bits as u32) << shift)) & mask;
        sio().gpio_out_xor().write(|w| unsafe { w.bits(flip) });
    }

    fn input(&self, port: PortId) -> u8 {
        let (shift, mask) = span(port);
        ((sio().gpio_in().read().bits() & mask) >> shift) as u8
    }

    /// Pulls live in the pad control block, not in the output latch.
    fn set_pull_up(&mut self, port: PortId, pin: PinId, enabled: bool) {
        let n = port.index() * 8 + pin.number() as usize;
        if BANK0_PINS & (1 << n) == 0 {
            return;
        }
        // SAFETY: single read-modify-write of the pad owned by this pin.
        let pads = unsafe { &*pac::PADS_BANK0::ptr() };
        pads.gpio(n).modify(|_, w| w.pue().bit(enabled).pde().clear_bit());
    }
}

/// One-second tick from timer alarm 0.
///
/// The alarm is one-shot, so each interrupt re-arms it while running. The
/// next deadline counts from the previous one, not from when the interrupt
/// got serviced, so latency and a debounce in progress do not drift the
/// tick. Resuming starts a fresh period.
pub struct AlarmTicker {
    alarm: Alarm0,
    timer: Timer,
    period: MicrosDurationU32,
    deadline: PeriodicDeadline,
    enabled: bool,
}

impl AlarmTicker {
    pub fn new(alarm: Alarm0, timer: Timer) -> Self {
        let period = MicrosDurationU32::secs(1);
        Self {
            alarm,
            timer,
            period,
            deadline: PeriodicDeadline::start(0, period.ticks() as u64),
            enabled: false,
        }
    }

    /// Acknowledges the alarm interrupt and schedules the next deadline.
    pub fn rearm(&mut self) {
        self.alarm.clear_interrupt();
        if self.enabled {
            let now = self.timer.get_counter().ticks();
            let next = self.deadline.advance(now);
            self.schedule(next);
        }
    }

    fn schedule(&mut self, deadline: u64) {
        if self.alarm.schedule_at(Instant::from_ticks(deadline)).is_err() {
            self.alarm.schedule(self.period).ok();
        }
    }
}

impl TickSource for AlarmTicker {
    fn configure_periodic(&mut self, period: SecsDurationU32) -> Result<(), TimingError> {
        self.period = MicrosDurationU32::micros(period_micros(period)?);
        Ok(())
    }

    fn enable(&mut self) {
        self.enabled = true;
        let now = self.timer.get_counter().ticks();
        self.deadline = PeriodicDeadline::start(now, self.period.ticks() as u64);
        self.alarm.clear_interrupt();
        self.schedule(self.deadline.deadline());
        self.alarm.enable_interrupt();
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.alarm.disable_interrupt();
        self.alarm.cancel().ok();
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

pub type ButtonPin = Pin<DynPinId, FunctionSioInput, PullNone>;

/// A button on a bank 0 edge interrupt.
///
/// The pull-up is set through [`SioPorts`] when the line is armed, so the
/// HAL pin stays `PullNone`.
pub struct ButtonLine {
    pin: ButtonPin,
    trigger: Interrupt,
    event: ControlEvent,
}

impl ButtonLine {
    pub fn new(pin: ButtonPin, event: ControlEvent) -> Self {
        Self {
            pin,
            trigger: Interrupt::EdgeLow,
            event,
        }
    }

    /// Acknowledges a latched edge and reports which button it was.
    pub fn take_event(&mut self) -> Option<ControlEvent> {
        if !self.pin.interrupt_status(self.trigger) {
            return None;
        }
        self.pin.clear_interrupt(self.trigger);
        Some(self.event)
    }
}

impl EdgeInterrupt for ButtonLine {
    fn configure(&mut self, edge: Edge, _pull_up: bool) {
        self.pin.set_interrupt_enabled(self.trigger, false);
        self.trigger = match edge {
            Edge::Rising => Interrupt::EdgeHigh,
            Edge::Falling => Interrupt::EdgeLow,
        };
        self.pin.clear_interrupt(self.trigger);
    }

    fn enable(&mut self) {
        self.pin.set_interrupt_enabled(self.trigger, true);
    }
}

/// Adapts an RTIC shared resource so every access takes its own short lock.
///
/// The main loop uses this for the clock and the display: the lock covers a
/// single snapshot or bus write, never a dwell.
pub struct Locked<M>(pub M);

impl<M> SharedClock for Locked<M>
where
    M: Mutex<T = ElapsedTime>,
{
    fn snapshot(&mut self) -> ElapsedTime {
        self.0.lock(|clock| *clock)
    }

    fn advance(&mut self) {
        self.0.lock(|clock| clock.advance())
    }

    fn reset(&mut self) {
        self.0.lock(|clock| clock.reset())
    }
}

impl<M> DisplayBus for Locked<M>
where
    M: Mutex,
    M::T: DisplayBus,
{
    fn show(&mut self, position: DigitPosition, digit: u8) {
        self.0.lock(|display| display.show(position, digit))
    }

    fn blank(&mut self) {
        self.0.lock(|display| display.blank())
    }
}
