use core::convert::TryFrom;

use crate::error::PwmError;
use crate::support::register_bank::{bits, CompareReg};

/// One complementary output pair of the PSC
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    Ch0 = 0,
    Ch1 = 1,
    Ch2 = 2,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Ch0, Channel::Ch1, Channel::Ch2];

    pub fn id(&self) -> usize {
        *self as usize
    }

    /// Rising edge compare register
    pub fn compare_a(&self) -> CompareReg {
        match self {
            Channel::Ch0 => CompareReg::Pocr0Sa,
            Channel::Ch1 => CompareReg::Pocr1Sa,
            Channel::Ch2 => CompareReg::Pocr2Sa,
        }
    }

    /// Falling edge compare register
    pub fn compare_b(&self) -> CompareReg {
        match self {
            Channel::Ch0 => CompareReg::Pocr0Sb,
            Channel::Ch1 => CompareReg::Pocr1Sb,
            Channel::Ch2 => CompareReg::Pocr2Sb,
        }
    }
}

impl TryFrom<usize> for Channel {
    type Error = PwmError;

    fn try_from(id: usize) -> Result<Self, Self::Error> {
        Channel::ALL
            .get(id)
            .copied()
            .ok_or(PwmError::InvalidChannel(id))
    }
}

/// Image of the POC register: which outputs the PSC drives.
/// Outputs left out act as standard ports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutputConfig(u8);

impl OutputConfig {
    pub const DISABLE_ALL: OutputConfig = OutputConfig(0);
    pub const ENABLE_ALL: OutputConfig = OutputConfig(
        1 << bits::POEN0A
            | 1 << bits::POEN0B
            | 1 << bits::POEN1A
            | 1 << bits::POEN1B
            | 1 << bits::POEN2A
            | 1 << bits::POEN2B,
    );

    /// Both outputs of `channel`
    pub const fn pair(channel: Channel) -> Self {
        OutputConfig(0b11 << (2 * channel as u8))
    }

    pub const fn with_pair(self, channel: Channel) -> Self {
        OutputConfig(self.0 | Self::pair(channel).0)
    }

    pub const fn from_bits(bits: u8) -> Self {
        OutputConfig(bits & Self::ENABLE_ALL.0)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub fn is_enabled(&self, channel: Channel) -> bool {
        self.0 & Self::pair(channel).0 != 0
    }
}
