use fugit_timer::HertzU32;

/// PLL output frequencies the PSC can be clocked from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllFrequency {
    F32MHz,
    F64MHz,
}

impl PllFrequency {
    pub fn hertz(&self) -> HertzU32 {
        match self {
            PllFrequency::F32MHz => crate::config::PLL_FREQUENCY_32MHZ,
            PllFrequency::F64MHz => crate::config::PLL_FREQUENCY_64MHZ,
        }
    }
}

/// Phase locked loop clock generator
pub trait Pll {
    fn set_frequency(&mut self, freq: PllFrequency);
    fn start(&mut self);
    /// Must be harmless when already stopped
    fn stop(&mut self);
    /// PLL output is locked and usable
    fn is_ready(&self) -> bool;
}
