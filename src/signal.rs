use core::cell::Cell;

use critical_section::Mutex;

/// Sticky one-bit flag raised by the tick interrupt and consumed by the main
/// loop.
///
/// Raising and consuming each happen inside one critical section, so a tick
/// that arrives while the main loop is busy is kept until the next check.
pub struct TickFlag {
    pending: Mutex<Cell<bool>>,
}

impl TickFlag {
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(Cell::new(false)),
        }
    }

    /// Called from interrupt context.
    pub fn raise(&self) {
        critical_section::with(|cs| self.pending.borrow(cs).set(true));
    }

    /// Reads and clears the flag in one step.
    pub fn take(&self) -> bool {
        critical_section::with(|cs| self.pending.borrow(cs).replace(false))
    }

    pub fn is_raised(&self) -> bool {
        critical_section::with(|cs| self.pending.borrow(cs).get())
    }
}

impl Default for TickFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_clears() {
        let flag = TickFlag::new();
        assert!(!flag.take());
        flag.raise();
        assert!(flag.is_raised());
        assert!(flag.take());
        assert!(!flag.is_raised());
        assert!(!flag.take());
    }

    #[test]
    fn repeated_raises_coalesce() {
        let flag = TickFlag::new();
        flag.raise();
        flag.raise();
        assert!(flag.take());
        assert!(!flag.take());
    }

    #[test]
    fn static_flag_across_threads() {
        static FLAG: TickFlag = TickFlag::new();
        std::thread::spawn(|| FLAG.raise()).join().unwrap();
        assert!(FLAG.take());
    }
}
