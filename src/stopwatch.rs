use crate::clock::SharedClock;
use crate::display::{DisplayBus, Multiplexer};
use crate::signal::TickFlag;
use crate::timing::Hold;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoopState {
    IdleRendering,
    TickProcessing,
}

/// Foreground loop: render, then consume at most one pending tick.
#[derive(Debug)]
pub struct MainLoop {
    multiplexer: Multiplexer,
}

impl MainLoop {
    pub fn new(multiplexer: Multiplexer) -> Self {
        Self { multiplexer }
    }

    /// One iteration starting from `IdleRendering`. Returns `TickProcessing`
    /// when a pending tick was consumed and the clock advanced, otherwise
    /// `IdleRendering`. Either way the loop is back to rendering afterwards.
    ///
    /// Several ticks raised during one iteration collapse into one advance;
    /// the timing check in the board configuration rules that out.
    pub fn step<C, D, H>(
        &mut self,
        pending: &TickFlag,
        clock: &mut C,
        display: &mut D,
        hold: &mut H,
    ) -> LoopState
    where
        C: SharedClock,
        D: DisplayBus,
        H: Hold,
    {
        let snapshot = clock.snapshot();
        self.multiplexer.render_cycle(display, hold, snapshot);

        if !pending.take() {
            return LoopState::IdleRendering;
        }
        clock.advance();
        LoopState::TickProcessing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ElapsedTime;
    use crate::display::DigitPosition;
    use embedded_hal::blocking::delay::DelayMs;
    use fugit::MillisDurationU32;

    struct Count(u32);

    impl DisplayBus for Count {
        fn show(&mut self, _: DigitPosition, _: u8) {
            self.0 += 1;
        }

        fn blank(&mut self) {}
    }

    struct NoDelay;

    impl DelayMs<u32> for NoDelay {
        fn delay_ms(&mut self, _: u32) {}
    }

    fn main_loop() -> MainLoop {
        MainLoop::new(Multiplexer::new(MillisDurationU32::millis(4)))
    }

    #[test]
    fn renders_without_advancing_when_idle() {
        let flag = TickFlag::new();
        let mut clock = ElapsedTime::ZERO;
        let mut shown = Count(0);

        assert_eq!(
            main_loop().step(&flag, &mut clock, &mut shown, &mut NoDelay),
            LoopState::IdleRendering
        );
        assert_eq!(clock, ElapsedTime::ZERO);
        assert_eq!(shown.0, 6);
    }

    #[test]
    fn consumes_pending_tick_once() {
        let flag = TickFlag::new();
        let mut clock = ElapsedTime::ZERO;
        let mut ml = main_loop();

        flag.raise();
        assert_eq!(
            ml.step(&flag, &mut clock, &mut Count(0), &mut NoDelay),
            LoopState::TickProcessing
        );
        assert_eq!(
            ml.step(&flag, &mut clock, &mut Count(0), &mut NoDelay),
            LoopState::IdleRendering
        );
        assert_eq!(clock.seconds(), 1);
    }

    #[test]
    fn ticks_in_one_iteration_coalesce() {
        let flag = TickFlag::new();
        let mut clock = ElapsedTime::ZERO;
        flag.raise();
        flag.raise();
        main_loop().step(&flag, &mut clock, &mut Count(0), &mut NoDelay);
        assert_eq!(clock.seconds(), 1);
    }
}
