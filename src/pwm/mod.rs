mod clock_source;
mod controller;
pub mod pwm_calc;
mod pwm_channel;

pub use clock_source::{ClockSource, LockWait, MicrosDurationU32, Prescaler};
pub use controller::PwmController;
pub use pwm_channel::{Channel, OutputConfig};
