//! Timing constants and the blocking hold primitive.

use embedded_hal::blocking::delay::DelayMs;
use fugit::{MillisDurationU32, SecsDurationU32};
use thiserror::Error;

use crate::display::DIGIT_COUNT;

/// Longest full display sweep before the digits visibly flicker.
pub const FLICKER_LIMIT: MillisDurationU32 = MillisDurationU32::millis(25);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimingError {
    #[error("digit dwell must be non-zero")]
    ZeroDwell,
    #[error("display sweep of {sweep_ms} ms exceeds the flicker limit")]
    Flicker { sweep_ms: u32 },
    #[error("sweep plus debounce ({busy_ms} ms) leaves no margin inside one tick")]
    TickCoalescing { busy_ms: u32 },
    #[error("compare value {0} does not fit the 16-bit compare register")]
    CompareOverflow(u32),
    #[error("tick period is shorter than one prescaled count")]
    CompareZero,
    #[error("tick period of {0} s does not fit a 32-bit microsecond count")]
    PeriodOverflow(u32),
}

/// Tuned hardware timing for the tick, the display dwell and the reset debounce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub tick_period: SecsDurationU32,
    pub digit_dwell: MillisDurationU32,
    pub debounce: MillisDurationU32,
}

impl Timing {
    /// One full pass over every display position, saturating at `u32::MAX` ms.
    pub const fn sweep(&self) -> MillisDurationU32 {
        MillisDurationU32::millis(self.digit_dwell.to_millis().saturating_mul(DIGIT_COUNT as u32))
    }

    /// Rejects timings that flicker or that could let two ticks land inside a
    /// single main loop iteration, where they would coalesce into one advance.
    ///
    /// Sums are taken in `u64`, so out-of-range inputs come back as errors.
    pub const fn check(&self) -> Result<(), TimingError> {
        let dwell_ms = self.digit_dwell.to_millis() as u64;
        if dwell_ms == 0 {
            return Err(TimingError::ZeroDwell);
        }
        let sweep_ms = dwell_ms * DIGIT_COUNT as u64;
        if sweep_ms > FLICKER_LIMIT.to_millis() as u64 {
            return Err(TimingError::Flicker {
                sweep_ms: saturate(sweep_ms),
            });
        }
        let busy_ms = sweep_ms + self.debounce.to_millis() as u64;
        let tick_ms = self.tick_period.to_secs() as u64 * 1000;
        if busy_ms * 2 >= tick_ms {
            return Err(TimingError::TickCoalescing {
                busy_ms: saturate(busy_ms),
            });
        }
        Ok(())
    }
}

const fn saturate(ms: u64) -> u32 {
    if ms > u32::MAX as u64 {
        u32::MAX
    } else {
        ms as u32
    }
}

/// Busy-waits for a fixed duration.
///
/// Used for the display dwell and the reset debounce. Nothing else runs on
/// the calling context while it holds.
pub trait Hold {
    fn hold(&mut self, duration: MillisDurationU32);
}

impl<D: DelayMs<u32>> Hold for D {
    fn hold(&mut self, duration: MillisDurationU32) {
        self.delay_ms(duration.to_millis());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(dwell: u32, debounce: u32) -> Timing {
        Timing {
            tick_period: SecsDurationU32::secs(1),
            digit_dwell: MillisDurationU32::millis(dwell),
            debounce: MillisDurationU32::millis(debounce),
        }
    }

    #[test]
    fn stock_timing_passes() {
        assert_eq!(timing(4, 30).check(), Ok(()));
        assert_eq!(timing(4, 30).sweep(), MillisDurationU32::millis(24));
    }

    #[test]
    fn long_dwell_flickers() {
        assert_eq!(timing(5, 30).check(), Err(TimingError::Flicker { sweep_ms: 30 }));
    }

    #[test]
    fn zero_dwell_rejected() {
        assert_eq!(timing(0, 30).check(), Err(TimingError::ZeroDwell));
    }

    #[test]
    fn long_debounce_risks_coalescing() {
        assert_eq!(
            timing(4, 476).check(),
            Err(TimingError::TickCoalescing { busy_ms: 500 })
        );
        assert_eq!(timing(4, 475).check(), Ok(()));
    }

    #[test]
    fn huge_dwell_is_rejected_not_overflowed() {
        assert_eq!(
            timing(800_000_000, 30).check(),
            Err(TimingError::Flicker { sweep_ms: u32::MAX })
        );
        assert_eq!(timing(800_000_000, 30).sweep().to_millis(), u32::MAX);
    }

    #[test]
    fn huge_debounce_is_rejected_not_overflowed() {
        assert_eq!(
            timing(4, 3_000_000_000).check(),
            Err(TimingError::TickCoalescing { busy_ms: 3_000_000_024 })
        );
        assert_eq!(
            timing(4, u32::MAX).check(),
            Err(TimingError::TickCoalescing { busy_ms: u32::MAX })
        );
    }

    struct Recorder(u32);

    impl DelayMs<u32> for Recorder {
        fn delay_ms(&mut self, ms: u32) {
            self.0 += ms;
        }
    }

    #[test]
    fn hold_goes_through_delay() {
        let mut delay = Recorder(0);
        delay.hold(MillisDurationU32::millis(30));
        delay.hold(MillisDurationU32::millis(4));
        assert_eq!(delay.0, 34);
    }
}
