use core::convert::TryFrom;

use crate::error::PwmError;
use crate::support::pll::PllFrequency;
use crate::support::register_bank::bits;

pub type MicrosDurationU32 = fugit_timer::Duration<u32, 1, 1_000_000>;

/// PSC input clock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    CoreClock = 0,
    Pll32MHz = 1,
    Pll64MHz = 2,
}

impl ClockSource {
    /// PLL frequency, `None` for the core clock
    pub fn pll_frequency(&self) -> Option<PllFrequency> {
        match self {
            ClockSource::CoreClock => None,
            ClockSource::Pll32MHz => Some(PllFrequency::F32MHz),
            ClockSource::Pll64MHz => Some(PllFrequency::F64MHz),
        }
    }
}

impl TryFrom<u8> for ClockSource {
    type Error = PwmError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ClockSource::CoreClock),
            1 => Ok(ClockSource::Pll32MHz),
            2 => Ok(ClockSource::Pll64MHz),
            _ => Err(PwmError::UnknownClockSource(code)),
        }
    }
}

/// PCTL PPRE1:0 divisions, values already in register position
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Prescaler {
    Div1 = 0,
    Div4 = 1 << bits::PPRE0,
    Div32 = 1 << bits::PPRE1,
    Div256 = (1 << bits::PPRE1) | (1 << bits::PPRE0),
}

impl Prescaler {
    /// Decode the prescaler bits of a raw PCTL value
    pub fn from_bits(pctl: u8) -> Self {
        match pctl & bits::PCTL_PRESCALER_MASK {
            0x00 => Prescaler::Div1,
            0x40 => Prescaler::Div4,
            0x80 => Prescaler::Div32,
            _ => Prescaler::Div256,
        }
    }

    pub fn division(&self) -> u32 {
        match self {
            Prescaler::Div1 => 1,
            Prescaler::Div4 => 4,
            Prescaler::Div32 => 32,
            Prescaler::Div256 => 256,
        }
    }
}

impl From<Prescaler> for u8 {
    fn from(p: Prescaler) -> Self {
        p as u8
    }
}

/// How long to wait for the PLL to lock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockWait {
    /// Poll until locked, forever if need be
    Blocking,
    /// Poll at most `polls` times, `interval` apart
    Bounded {
        polls: u32,
        interval: MicrosDurationU32,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for LockWait {
    fn format(&self, f: defmt::Formatter) {
        match self {
            LockWait::Blocking => defmt::write!(f, "Blocking"),
            LockWait::Bounded { polls, interval } => defmt::write!(
                f,
                "Bounded({} x {}us)",
                polls,
                interval.ticks()
            ),
        }
    }
}
