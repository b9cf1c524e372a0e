//! Periodic tick source.

use fugit::{HertzU32, SecsDurationU32};

use crate::timing::TimingError;

/// A periodic timer whose interrupt signals one elapsed tick.
///
/// Enabled means running; a disabled source generates no ticks. Run/pause
/// state is not stored anywhere else.
pub trait TickSource {
    fn configure_periodic(&mut self, period: SecsDurationU32) -> Result<(), TimingError>;
    fn enable(&mut self);
    fn disable(&mut self);
    fn is_enabled(&self) -> bool;
}

pub const CS10: u8 = 1 << 0;
pub const CS11: u8 = 1 << 1;
pub const CS12: u8 = 1 << 2;
pub const CS_MASK: u8 = CS10 | CS11 | CS12;

/// Clock division applied before the timer counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Prescaler {
    Div1,
    Div8,
    Div64,
    Div256,
    Div1024,
}

impl Prescaler {
    pub const fn divisor(self) -> u32 {
        match self {
            Prescaler::Div1 => 1,
            Prescaler::Div8 => 8,
            Prescaler::Div64 => 64,
            Prescaler::Div256 => 256,
            Prescaler::Div1024 => 1024,
        }
    }

    /// Clock-select bits that start the counter with this division.
    pub const fn clock_select(self) -> u8 {
        match self {
            Prescaler::Div1 => CS10,
            Prescaler::Div8 => CS11,
            Prescaler::Div64 => CS11 | CS10,
            Prescaler::Div256 => CS12,
            Prescaler::Div1024 => CS12 | CS10,
        }
    }
}

/// Counts between compare matches for `period`, rounded to nearest.
///
/// 1 MHz through ÷1024 for one second gives 977.
pub const fn compare_value(
    base: HertzU32,
    prescaler: Prescaler,
    period: SecsDurationU32,
) -> Result<u16, TimingError> {
    let div = prescaler.divisor() as u64;
    let cycles = base.raw() as u64 * period.to_secs() as u64;
    let counts = (cycles + div / 2) / div;
    if counts == 0 {
        Err(TimingError::CompareZero)
    } else if counts > u16::MAX as u64 {
        Err(TimingError::CompareOverflow(if counts > u32::MAX as u64 {
            u32::MAX
        } else {
            counts as u32
        }))
    } else {
        Ok(counts as u16)
    }
}

/// `period` in microseconds, for alarms that count a 1 MHz timebase.
pub const fn period_micros(period: SecsDurationU32) -> Result<u32, TimingError> {
    let secs = period.to_secs();
    match secs.checked_mul(1_000_000) {
        Some(0) => Err(TimingError::CompareZero),
        Some(micros) => Ok(micros),
        None => Err(TimingError::PeriodOverflow(secs)),
    }
}

/// Fixed-rate deadlines on a free-running counter.
///
/// Each deadline is the previous one plus the period, so handler latency
/// never accumulates. If the handler ran so late that whole periods have
/// already passed, those are skipped and the phase is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicDeadline {
    period: u64,
    next: u64,
}

impl PeriodicDeadline {
    /// First deadline one period after `now`. A zero period counts as one.
    pub fn start(now: u64, period: u64) -> Self {
        let period = period.max(1);
        Self {
            period,
            next: now + period,
        }
    }

    pub fn deadline(&self) -> u64 {
        self.next
    }

    /// Moves to the deadline after the one that just fired.
    pub fn advance(&mut self, now: u64) -> u64 {
        self.next += self.period;
        if self.next <= now {
            let behind = now - self.next;
            self.next += (behind / self.period + 1) * self.period;
        }
        self.next
    }
}

/// Clear-on-compare timer with a prescaler and clock-select control bits.
///
/// Clearing the clock-select bits stops the counter but keeps its count, so a
/// resumed timer finishes the interrupted period instead of starting over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareTimer {
    base: HertzU32,
    prescaler: Prescaler,
    control: u8,
    compare: u16,
    counter: u16,
    residue: u32,
}

impl CompareTimer {
    /// A stopped timer; call [`TickSource::configure_periodic`] before enabling.
    pub fn new(base: HertzU32, prescaler: Prescaler) -> Self {
        Self {
            base,
            prescaler,
            control: 0,
            compare: u16::MAX,
            counter: 0,
            residue: 0,
        }
    }

    pub fn control(&self) -> u8 {
        self.control
    }

    /// Sets raw control bits, as other configuration code may.
    pub fn set_control(&mut self, bits: u8) {
        self.control = bits;
    }

    pub fn compare(&self) -> u16 {
        self.compare
    }

    pub fn counter(&self) -> u16 {
        self.counter
    }

    /// Feeds `cycles` base-clock cycles through the prescaler and returns how
    /// many compare matches fired. A stopped timer ignores them.
    pub fn clock(&mut self, cycles: u32) -> u32 {
        if !self.is_enabled() {
            return 0;
        }
        let div = self.prescaler.divisor() as u64;
        let total = self.residue as u64 + cycles as u64;
        let counts = total / div;
        self.residue = (total % div) as u32;

        let compare = self.compare as u64;
        let reached = self.counter as u64 + counts;
        self.counter = (reached % compare) as u16;
        (reached / compare) as u32
    }
}

impl TickSource for CompareTimer {
    fn configure_periodic(&mut self, period: SecsDurationU32) -> Result<(), TimingError> {
        self.compare = compare_value(self.base, self.prescaler, period)?;
        self.counter = 0;
        self.residue = 0;
        Ok(())
    }

    /// Sets each clock-select bit of the prescaler individually, only when it
    /// is still clear.
    fn enable(&mut self) {
        let wanted = self.prescaler.clock_select();
        for bit in [CS10, CS11, CS12] {
            if wanted & bit != 0 && self.control & bit == 0 {
                self.control |= bit;
            }
        }
    }

    fn disable(&mut self) {
        self.control &= !CS_MASK;
    }

    fn is_enabled(&self) -> bool {
        self.control & CS_MASK != 0
    }
}
