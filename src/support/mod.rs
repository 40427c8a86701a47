pub mod mmio;
pub mod pll;
pub mod register_bank;

#[cfg(feature = "sim")]
pub mod sim;

pub use pll::{Pll, PllFrequency};
pub use register_bank::{CompareReg, ControlReg, RegisterBank};
