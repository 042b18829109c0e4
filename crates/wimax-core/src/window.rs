use std::fmt;

/// Sequence-number space for ARQ block sequence numbers. BSNs are 11 bits on
/// the wire; the window size must be strictly smaller than this so that
/// wrap-around is unambiguous.
pub const BSN_MODULUS: u16 = 2048;

/// Block sequence number, always held reduced modulo `BSN_MODULUS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bsn(pub u16);

impl Bsn {
    pub fn new(v: u16) -> Self {
        Bsn(v % BSN_MODULUS)
    }

    /// Advance by `n` modulo the sequence space.
    pub fn wrapping_add(self, n: u16) -> Bsn {
        Bsn((self.0 + n % BSN_MODULUS) % BSN_MODULUS)
    }

    pub fn next(self) -> Bsn {
        self.wrapping_add(1)
    }

    /// Normalized forward distance from `other` to self, in [0, BSN_MODULUS).
    pub fn wrapping_sub(self, other: Bsn) -> u16 {
        (self.0 + BSN_MODULUS - other.0) % BSN_MODULUS
    }
}

impl fmt::Display for Bsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bsn:{}", self.0)
    }
}

/// True iff `bsn` falls inside `[window_start, window_start + window_size)`
/// under modulo arithmetic. This is the single most safety-critical predicate
/// in the ARQ engine; a naive unsigned comparison misorders BSNs near the
/// wrap point.
pub fn is_bsn_in_window(bsn: Bsn, window_start: Bsn, window_size: u16) -> bool {
    debug_assert!(window_size < BSN_MODULUS);
    bsn.wrapping_sub(window_start) < window_size
}
