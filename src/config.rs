use fugit_timer::HertzU32;

use crate::pwm::{ClockSource, LockWait, MicrosDurationU32, Prescaler};

pub const PLL_FREQUENCY_32MHZ: HertzU32 = HertzU32::MHz(32);
pub const PLL_FREQUENCY_64MHZ: HertzU32 = HertzU32::MHz(64);

//-----------------------------------------------------------------------------

/// ADC synchronisation point, written to POCR0RA
pub const ADC_SYNC_TRIGGER: u16 = 1;

//-----------------------------------------------------------------------------

pub const PLL_LOCK_POLLS: u32 = 1_000;
pub const PLL_LOCK_POLL_INTERVAL: MicrosDurationU32 = MicrosDurationU32::from_ticks(10);

//-----------------------------------------------------------------------------

pub const PSC_BASE_ADDR: usize = 0xA0;
pub const PLLCSR_ADDR: usize = 0x49;

//-----------------------------------------------------------------------------

pub const DEFAULT_DEAD_TIME: u8 = 8;
pub const DEFAULT_COUNTER_MAX: u16 = (1 << 10) - 1;

/// Full set of `init` parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmConfig {
    /// Raw PCTL prescaler bits (7:6)
    pub prescaler: u8,
    pub source_clock: ClockSource,
    pub dead_time: u8,
    pub counter_max: u16,
    pub lock_wait: LockWait,
}

impl PwmConfig {
    pub const fn new(
        prescaler: u8,
        source_clock: ClockSource,
        dead_time: u8,
        counter_max: u16,
    ) -> Self {
        Self {
            prescaler,
            source_clock,
            dead_time,
            counter_max,
            lock_wait: LockWait::Bounded {
                polls: PLL_LOCK_POLLS,
                interval: PLL_LOCK_POLL_INTERVAL,
            },
        }
    }

    pub const fn with_lock_wait(mut self, lock_wait: LockWait) -> Self {
        self.lock_wait = lock_wait;
        self
    }
}

impl Default for PwmConfig {
    fn default() -> Self {
        Self::new(
            Prescaler::Div1 as u8,
            ClockSource::CoreClock,
            DEFAULT_DEAD_TIME,
            DEFAULT_COUNTER_MAX,
        )
    }
}
