/// 8-bit PSC control registers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlReg {
    /// Prescaler, clock select, complete cycle, run
    Pctl,
    /// Update lock, mode, output polarity
    Pcnf,
    /// Output enables
    Poc,
    /// Module 0 input control, overlap enable
    Pmic0,
    Pmic1,
    Pmic2,
    /// ADC synchronisation selection
    Psync,
}

/// 16-bit PSC compare registers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CompareReg {
    Pocr0Sa,
    Pocr0Ra,
    Pocr0Sb,
    Pocr1Sa,
    Pocr1Ra,
    Pocr1Sb,
    Pocr2Sa,
    Pocr2Ra,
    Pocr2Sb,
    /// Counter top, shared by all modules
    PocrRb,
}

/// Bit positions
pub mod bits {
    // PCTL
    pub const PPRE1: u8 = 7;
    pub const PPRE0: u8 = 6;
    pub const PCLKSEL: u8 = 5;
    pub const PCCYC: u8 = 1;
    pub const PRUN: u8 = 0;

    /// PCTL bits not owned by the prescaler
    pub const PCTL_LOW_MASK: u8 = 0b0011_1111;
    pub const PCTL_PRESCALER_MASK: u8 = !PCTL_LOW_MASK;

    // PCNF
    pub const PULOCK: u8 = 5;
    pub const PMODE: u8 = 4;
    pub const POPB: u8 = 3;
    pub const POPA: u8 = 2;

    // POC
    pub const POEN2B: u8 = 5;
    pub const POEN2A: u8 = 4;
    pub const POEN1B: u8 = 3;
    pub const POEN1A: u8 = 2;
    pub const POEN0B: u8 = 1;
    pub const POEN0A: u8 = 0;

    // PMICn
    pub const POVEN: u8 = 7;
}

/// Access to the PSC register file
///
/// Implemented by the memory mapped block in `support::mmio` and by the
/// simulated bank in `support::sim`.
pub trait RegisterBank {
    fn read(&self, reg: ControlReg) -> u8;
    fn write(&mut self, reg: ControlReg, value: u8);

    fn read_compare(&self, reg: CompareReg) -> u16;
    fn write_compare(&mut self, reg: CompareReg, value: u16);

    fn modify<F>(&mut self, reg: ControlReg, f: F)
    where
        F: FnOnce(u8) -> u8,
    {
        let value = f(self.read(reg));
        self.write(reg, value);
    }

    fn set_bits(&mut self, reg: ControlReg, mask: u8) {
        self.modify(reg, |r| r | mask);
    }

    fn clear_bits(&mut self, reg: ControlReg, mask: u8) {
        self.modify(reg, |r| r & !mask);
    }

    fn is_set(&self, reg: ControlReg, bit: u8) -> bool {
        self.read(reg) & (1 << bit) != 0
    }
}
