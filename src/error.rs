//! Driver error types

use core::fmt;

/// Result type for controller operations
pub type Result<T> = core::result::Result<T, PwmError>;

/// Controller errors
///
/// Duty-cycle clamping is not an error: out-of-range duty values are silently
/// limited to the period bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PwmError {
    /// PLL did not report lock within the bounded wait
    PllLockTimeout {
        /// Number of `is_ready()` polls performed
        polls: u32,
    },
    /// Raw clock source selector is not one of the known codes
    UnknownClockSource(u8),
    /// Channel index outside 0..=2
    InvalidChannel(usize),
    /// Period bound applied before any dead time was set
    DeadTimeUnset,
    /// `counter_max + dead_time` must lie in 1..=0xFFFF so that neither the
    /// top nor any falling edge compare wraps
    PeriodOutOfRange { counter_max: u16, dead_time: u8 },
}

impl fmt::Display for PwmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PwmError::PllLockTimeout { polls } => {
                write!(f, "PLL not locked after {} polls", polls)
            }
            PwmError::UnknownClockSource(code) => write!(f, "Unknown clock source: {}", code),
            PwmError::InvalidChannel(id) => write!(f, "Invalid PWM channel: {}", id),
            PwmError::DeadTimeUnset => write!(f, "Dead time must be set before period bound"),
            PwmError::PeriodOutOfRange {
                counter_max,
                dead_time,
            } => write!(
                f,
                "Period bound {} with dead time {} does not fit the compare registers",
                counter_max, dead_time
            ),
        }
    }
}
