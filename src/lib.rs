#![cfg_attr(not(test), no_std)]

#[macro_use]
mod logging;

pub mod config;
pub mod error;
pub mod pwm;
pub mod support;

pub use config::PwmConfig;
pub use error::{PwmError, Result};
pub use pwm::{Channel, ClockSource, LockWait, OutputConfig, Prescaler, PwmController};
