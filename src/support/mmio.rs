use vcell::VolatileCell;

use super::pll::{Pll, PllFrequency};
use super::register_bank::{CompareReg, ControlReg, RegisterBank};

/// 16-bit PSC register, accessed through the AVR TEMP latch
#[repr(C)]
pub struct Reg16 {
    low: VolatileCell<u8>,
    high: VolatileCell<u8>,
}

impl Reg16 {
    fn get(&self) -> u16 {
        // low byte first, it latches the high byte into TEMP
        let low = self.low.get();
        u16::from_le_bytes([low, self.high.get()])
    }

    fn set(&self, value: u16) {
        // high byte first, the low byte write commits both
        let [low, high] = value.to_le_bytes();
        self.high.set(high);
        self.low.set(low);
    }
}

/// PSC register block, data space 0xA0..=0xBA
#[repr(C)]
pub struct RegisterBlock {
    pub pocr0sa: Reg16,
    pub pocr0ra: Reg16,
    pub pocr0sb: Reg16,
    pub pocr1sa: Reg16,
    pub pocr1ra: Reg16,
    pub pocr1sb: Reg16,
    pub pocr2sa: Reg16,
    pub pocr2ra: Reg16,
    pub pocr2sb: Reg16,
    pub pocr_rb: Reg16,
    pub psync: VolatileCell<u8>,
    pub pcnf: VolatileCell<u8>,
    pub poc: VolatileCell<u8>,
    pub pctl: VolatileCell<u8>,
    pub pmic0: VolatileCell<u8>,
    pub pmic1: VolatileCell<u8>,
    pub pmic2: VolatileCell<u8>,
}

/// Owned handle to the on-chip PSC
pub struct PscRegisters {
    regs: &'static RegisterBlock,
}

impl PscRegisters {
    /// # Safety
    /// Only one handle may exist, and the PSC must be present at
    /// `config::PSC_BASE_ADDR`.
    pub unsafe fn steal() -> Self {
        Self {
            regs: &*(crate::config::PSC_BASE_ADDR as *const RegisterBlock),
        }
    }

    fn control(&self, reg: ControlReg) -> &VolatileCell<u8> {
        match reg {
            ControlReg::Pctl => &self.regs.pctl,
            ControlReg::Pcnf => &self.regs.pcnf,
            ControlReg::Poc => &self.regs.poc,
            ControlReg::Pmic0 => &self.regs.pmic0,
            ControlReg::Pmic1 => &self.regs.pmic1,
            ControlReg::Pmic2 => &self.regs.pmic2,
            ControlReg::Psync => &self.regs.psync,
        }
    }

    fn compare(&self, reg: CompareReg) -> &Reg16 {
        match reg {
            CompareReg::Pocr0Sa => &self.regs.pocr0sa,
            CompareReg::Pocr0Ra => &self.regs.pocr0ra,
            CompareReg::Pocr0Sb => &self.regs.pocr0sb,
            CompareReg::Pocr1Sa => &self.regs.pocr1sa,
            CompareReg::Pocr1Ra => &self.regs.pocr1ra,
            CompareReg::Pocr1Sb => &self.regs.pocr1sb,
            CompareReg::Pocr2Sa => &self.regs.pocr2sa,
            CompareReg::Pocr2Ra => &self.regs.pocr2ra,
            CompareReg::Pocr2Sb => &self.regs.pocr2sb,
            CompareReg::PocrRb => &self.regs.pocr_rb,
        }
    }
}

impl RegisterBank for PscRegisters {
    fn read(&self, reg: ControlReg) -> u8 {
        self.control(reg).get()
    }

    fn write(&mut self, reg: ControlReg, value: u8) {
        self.control(reg).set(value)
    }

    fn read_compare(&self, reg: CompareReg) -> u16 {
        self.compare(reg).get()
    }

    fn write_compare(&mut self, reg: CompareReg, value: u16) {
        self.compare(reg).set(value)
    }
}

//-----------------------------------------------------------------------------

const PLLF: u8 = 2;
const PLLE: u8 = 1;
const PLOCK: u8 = 0;

/// On-chip PLL, driven through PLLCSR
pub struct PllCsr {
    pllcsr: &'static VolatileCell<u8>,
}

impl PllCsr {
    /// # Safety
    /// Only one handle may exist, PLLCSR must be at `config::PLLCSR_ADDR`.
    pub unsafe fn steal() -> Self {
        Self {
            pllcsr: &*(crate::config::PLLCSR_ADDR as *const VolatileCell<u8>),
        }
    }

    fn modify(&mut self, f: impl FnOnce(u8) -> u8) {
        self.pllcsr.set(f(self.pllcsr.get()));
    }
}

impl Pll for PllCsr {
    fn set_frequency(&mut self, freq: PllFrequency) {
        match freq {
            PllFrequency::F32MHz => self.modify(|r| r & !(1 << PLLF)),
            PllFrequency::F64MHz => self.modify(|r| r | (1 << PLLF)),
        }
    }

    fn start(&mut self) {
        self.modify(|r| r | (1 << PLLE));
    }

    fn stop(&mut self) {
        self.modify(|r| r & !(1 << PLLE));
    }

    fn is_ready(&self) -> bool {
        self.pllcsr.get() & (1 << PLOCK) != 0
    }
}
