//! Button handling: reset, pause and resume.
//!
//! Each button is an edge-triggered interrupt line. The handlers run in
//! interrupt context and are all short; only reset holds, for the debounce.

use fugit::MillisDurationU32;

use crate::clock::SharedClock;
use crate::display::DisplayBus;
use crate::gpio::{Direction, Gpio, GpioError, PinId, PortBank, PortId};
use crate::tick::TickSource;
use crate::timing::Hold;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlEvent {
    Reset,
    Pause,
    Resume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Rising,
    Falling,
}

/// An edge-triggered interrupt input.
pub trait EdgeInterrupt {
    fn configure(&mut self, edge: Edge, pull_up: bool);
    fn enable(&mut self);
}

/// Pin and trigger of one button line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineConfig {
    pub event: ControlEvent,
    pub port: PortId,
    pub pin: PinId,
    pub edge: Edge,
    pub pull_up: bool,
}

impl LineConfig {
    /// Makes the pin an input (with its pull-up when configured), then sets
    /// up and enables the interrupt line.
    pub fn arm<B: PortBank, L: EdgeInterrupt>(
        &self,
        gpio: &mut Gpio<B>,
        line: &mut L,
    ) -> Result<(), GpioError> {
        let (port, pin) = (self.port.index() as u8, self.pin.number());
        gpio.set_pin_direction(port, pin, Direction::Input)?;
        if self.pull_up {
            gpio.enable_pull_up(port, pin)?;
        }
        line.configure(self.edge, self.pull_up);
        line.enable();
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ControlHandler {
    debounce: MillisDurationU32,
}

impl ControlHandler {
    pub fn new(debounce: MillisDurationU32) -> Self {
        Self { debounce }
    }

    /// Zeroes the counters and blanks the display, then waits out contact
    /// bounce. Run state is left alone.
    pub fn on_reset<C, D, H>(&self, clock: &mut C, display: &mut D, hold: &mut H)
    where
        C: SharedClock,
        D: DisplayBus,
        H: Hold,
    {
        clock.reset();
        display.blank();
        hold.hold(self.debounce);
    }

    pub fn on_pause<T: TickSource>(&self, tick: &mut T) {
        tick.disable();
    }

    pub fn on_resume<T: TickSource>(&self, tick: &mut T) {
        if !tick.is_enabled() {
            tick.enable();
        }
    }

    pub fn dispatch<C, D, T, H>(
        &self,
        event: ControlEvent,
        clock: &mut C,
        display: &mut D,
        tick: &mut T,
        hold: &mut H,
    ) where
        C: SharedClock,
        D: DisplayBus,
        T: TickSource,
        H: Hold,
    {
        match event {
            ControlEvent::Reset => self.on_reset(clock, display, hold),
            ControlEvent::Pause => self.on_pause(tick),
            ControlEvent::Resume => self.on_resume(tick),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ElapsedTime;
    use crate::display::DigitPosition;
    use crate::gpio::{Level, RegisterFile};
    use crate::timing::TimingError;
    use embedded_hal::blocking::delay::DelayMs;
    use fugit::SecsDurationU32;

    #[derive(Default)]
    struct Tick {
        enabled: bool,
        enables: u32,
    }

    impl TickSource for Tick {
        fn configure_periodic(&mut self, _: SecsDurationU32) -> Result<(), TimingError> {
            Ok(())
        }

        fn enable(&mut self) {
            self.enabled = true;
            self.enables += 1;
        }

        fn disable(&mut self) {
            self.enabled = false;
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }
    }

    #[derive(Default)]
    struct Screen {
        blanked: bool,
    }

    impl DisplayBus for Screen {
        fn show(&mut self, _: DigitPosition, _: u8) {
            self.blanked = false;
        }

        fn blank(&mut self) {
            self.blanked = true;
        }
    }

    #[derive(Default)]
    struct Delay(u32);

    impl DelayMs<u32> for Delay {
        fn delay_ms(&mut self, ms: u32) {
            self.0 += ms;
        }
    }

    #[derive(Default)]
    struct Line {
        config: Option<(Edge, bool)>,
        enabled: bool,
    }

    impl EdgeInterrupt for Line {
        fn configure(&mut self, edge: Edge, pull_up: bool) {
            self.config = Some((edge, pull_up));
        }

        fn enable(&mut self) {
            self.enabled = true;
        }
    }

    fn handler() -> ControlHandler {
        ControlHandler::new(MillisDurationU32::millis(30))
    }

    #[test]
    fn reset_zeroes_blanks_and_debounces() {
        let mut clock = ElapsedTime::new(3, 2, 1).unwrap();
        let mut screen = Screen::default();
        let mut delay = Delay::default();
        let mut tick = Tick { enabled: true, enables: 0 };

        handler().dispatch(ControlEvent::Reset, &mut clock, &mut screen, &mut tick, &mut delay);

        assert_eq!(clock, ElapsedTime::ZERO);
        assert!(screen.blanked);
        assert_eq!(delay.0, 30);
        assert!(tick.enabled);
    }

    #[test]
    fn reset_keeps_paused_clock_paused() {
        let mut clock = ElapsedTime::new(0, 0, 9).unwrap();
        let mut tick = Tick::default();
        handler().dispatch(
            ControlEvent::Reset,
            &mut clock,
            &mut Screen::default(),
            &mut tick,
            &mut Delay::default(),
        );
        assert!(!tick.enabled);
    }

    #[test]
    fn pause_and_resume_are_idempotent() {
        let h = handler();
        let mut tick = Tick { enabled: true, enables: 0 };

        h.on_pause(&mut tick);
        h.on_pause(&mut tick);
        assert!(!tick.is_enabled());

        h.on_resume(&mut tick);
        h.on_resume(&mut tick);
        assert!(tick.is_enabled());
        assert_eq!(tick.enables, 1);
    }

    #[test]
    fn arm_configures_pin_and_line() {
        let mut gpio = Gpio::new(RegisterFile::new());
        let mut line = Line::default();
        let config = LineConfig {
            event: ControlEvent::Reset,
            port: PortId::D,
            pin: PinId::P2,
            edge: Edge::Falling,
            pull_up: true,
        };

        config.arm(&mut gpio, &mut line).unwrap();

        assert_eq!(line.config, Some((Edge::Falling, true)));
        assert!(line.enabled);
        assert_eq!(gpio.bank().direction(PortId::D) & PinId::P2.mask(), 0);
        assert_eq!(gpio.read_pin(3, 2), Ok(Level::High));
    }

    #[test]
    fn arm_without_pull_up_leaves_pin_floating() {
        let mut gpio = Gpio::new(RegisterFile::new());
        let mut line = Line::default();
        let config = LineConfig {
            event: ControlEvent::Pause,
            port: PortId::D,
            pin: PinId::P3,
            edge: Edge::Rising,
            pull_up: false,
        };

        config.arm(&mut gpio, &mut line).unwrap();

        assert_eq!(line.config, Some((Edge::Rising, false)));
        assert_eq!(gpio.read_pin(3, 3), Ok(Level::Low));
    }
}
