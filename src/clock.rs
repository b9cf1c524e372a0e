use core::fmt;

use thiserror::Error;

/// Raised when a counter is constructed outside its range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockError {
    #[error("seconds out of range: {0}")]
    Seconds(u8),
    #[error("minutes out of range: {0}")]
    Minutes(u8),
    #[error("hours out of range: {0}")]
    Hours(u8),
}

/// Elapsed stopwatch time. Every field stays inside its range after any update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ElapsedTime {
    hours: u8,
    mins: u8,
    secs: u8,
}

impl ElapsedTime {
    pub const ZERO: Self = Self { hours: 0, mins: 0, secs: 0 };

    pub fn new(hours: u8, mins: u8, secs: u8) -> Result<Self, ClockError> {
        if secs > 59 {
            return Err(ClockError::Seconds(secs));
        }
        if mins > 59 {
            return Err(ClockError::Minutes(mins));
        }
        if hours > 23 {
            return Err(ClockError::Hours(hours));
        }
        Ok(Self { hours, mins, secs })
    }

    pub fn hours(&self) -> u8 {
        self.hours
    }

    pub fn minutes(&self) -> u8 {
        self.mins
    }

    pub fn seconds(&self) -> u8 {
        self.secs
    }

    pub fn total_seconds(&self) -> u32 {
        self.hours as u32 * 3600 + self.mins as u32 * 60 + self.secs as u32
    }

    /// Advances by one second.
    ///
    /// The minute and hour checks run after the increment, in order, so an
    /// hour rollover is only seen after a minute carry in the same call.
    pub fn advance(&mut self) {
        self.secs += 1;
        if self.secs >= 60 {
            self.secs = 0;
            self.mins += 1;
        }
        if self.mins > 59 {
            self.mins = 0;
            self.hours += 1;
        }
        // A full day wraps to zero, same as a reset.
        if self.hours > 23 {
            self.hours = 0;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::ZERO;
    }
}

impl fmt::Display for ElapsedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.mins, self.secs)
    }
}

/// Access to the counters from whichever context currently owns them.
///
/// On target the counters sit behind an RTIC resource lock; on the host they
/// are borrowed directly.
pub trait SharedClock {
    /// Copies the counters out so a render pass never sees a half-applied
    /// update.
    fn snapshot(&mut self) -> ElapsedTime;
    fn advance(&mut self);
    fn reset(&mut self);
}

impl SharedClock for ElapsedTime {
    fn snapshot(&mut self) -> ElapsedTime {
        *self
    }

    fn advance(&mut self) {
        ElapsedTime::advance(self)
    }

    fn reset(&mut self) {
        ElapsedTime::reset(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(h: u8, m: u8, s: u8) -> ElapsedTime {
        ElapsedTime::new(h, m, s).unwrap()
    }

    #[test]
    fn seconds_carry_into_minutes() {
        let mut t = at(0, 4, 59);
        t.advance();
        assert_eq!(t, at(0, 5, 0));
    }

    #[test]
    fn minutes_carry_into_hours() {
        let mut t = at(7, 59, 59);
        t.advance();
        assert_eq!(t, at(8, 0, 0));
    }

    #[test]
    fn full_day_wraps_to_zero() {
        let mut t = at(23, 59, 59);
        t.advance();
        assert_eq!(t, ElapsedTime::ZERO);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut t = at(12, 34, 56);
        t.reset();
        assert_eq!(t, ElapsedTime::ZERO);
        t.reset();
        assert_eq!(t, ElapsedTime::ZERO);
    }

    #[test]
    fn rejects_out_of_range_fields() {
        assert_eq!(ElapsedTime::new(0, 0, 60), Err(ClockError::Seconds(60)));
        assert_eq!(ElapsedTime::new(0, 60, 0), Err(ClockError::Minutes(60)));
        assert_eq!(ElapsedTime::new(24, 0, 0), Err(ClockError::Hours(24)));
    }

    #[test]
    fn displays_as_hh_mm_ss() {
        assert_eq!(at(1, 2, 3).to_string(), "01:02:03");
        assert_eq!(at(1, 1, 1).total_seconds(), 3661);
    }

    proptest! {
        #[test]
        fn advance_below_59_only_touches_seconds(h in 0u8..24, m in 0u8..60, s in 0u8..59) {
            let mut t = at(h, m, s);
            t.advance();
            prop_assert_eq!(t.seconds(), s + 1);
            prop_assert_eq!(t.minutes(), m);
            prop_assert_eq!(t.hours(), h);
        }

        #[test]
        fn advance_matches_total_seconds_mod_day(h in 0u8..24, m in 0u8..60, s in 0u8..60) {
            let mut t = at(h, m, s);
            let before = t.total_seconds();
            t.advance();
            prop_assert_eq!(t.total_seconds(), (before + 1) % 86_400);
        }

        #[test]
        fn reset_from_any_state(h in 0u8..24, m in 0u8..60, s in 0u8..60) {
            let mut t = at(h, m, s);
            SharedClock::reset(&mut t);
            prop_assert_eq!(t, ElapsedTime::ZERO);
        }
    }
}
