use core::convert::TryFrom;

use embedded_hal::blocking::delay::DelayUs;

use super::{pwm_calc, Channel, ClockSource, LockWait, OutputConfig, Prescaler};
use crate::config::{PwmConfig, ADC_SYNC_TRIGGER, PLL_LOCK_POLLS, PLL_LOCK_POLL_INTERVAL};
use crate::error::{PwmError, Result};
use crate::support::pll::Pll;
use crate::support::register_bank::{bits, CompareReg, ControlReg, RegisterBank};

const OVERLAP_REGS: [ControlReg; 3] = [ControlReg::Pmic0, ControlReg::Pmic1, ControlReg::Pmic2];

/// Center aligned, complementary three channel PWM on the PSC
///
/// Owns the register file, the PLL and a delay used while waiting for PLL
/// lock. Not reentrant: callers sharing it with an interrupt handler must
/// provide their own mutual exclusion.
pub struct PwmController<R, P, D> {
    regs: R,
    pll: P,
    delay: D,
    lock_wait: LockWait,
    source_clock: ClockSource,
    counter_max: u16,
    dead_time: Option<u8>,
    top_applied: bool,
}

impl<R, P, D> PwmController<R, P, D>
where
    R: RegisterBank,
    P: Pll,
    D: DelayUs<u32>,
{
    pub fn new(regs: R, pll: P, delay: D) -> Self {
        Self {
            regs,
            pll,
            delay,
            lock_wait: LockWait::Bounded {
                polls: PLL_LOCK_POLLS,
                interval: PLL_LOCK_POLL_INTERVAL,
            },
            source_clock: ClockSource::CoreClock,
            counter_max: 0,
            dead_time: None,
            top_applied: false,
        }
    }

    /// One-time PSC bring-up. Outputs are released and overlap protection is
    /// armed before any clock or prescaler write.
    ///
    /// The counter is stopped before the clock is touched, so on PLL lock
    /// timeout the PSC is left stopped with outputs disabled, also when
    /// re-initialising a running PSC. A period that does not fit the 16-bit
    /// compare registers is rejected before any register write.
    /// No duty values are written.
    pub fn init(&mut self, config: &PwmConfig) -> Result<()> {
        log_debug!("PSC init: {:?}", config);

        pwm_calc::checked_top(config.counter_max, config.dead_time).ok_or(
            PwmError::PeriodOutOfRange {
                counter_max: config.counter_max,
                dead_time: config.dead_time,
            },
        )?;

        self.disable_outputs();

        for reg in OVERLAP_REGS {
            self.regs.clear_bits(reg, 1 << bits::POVEN);
        }

        self.stop();

        self.lock_wait = config.lock_wait;
        self.set_prescaler(config.prescaler);
        self.set_source_clock(config.source_clock)?;

        self.dead_time = Some(config.dead_time);
        self.set_counter_max(config.counter_max)?;

        self.regs.write_compare(CompareReg::Pocr0Ra, ADC_SYNC_TRIGGER);

        self.regs.write(
            ControlReg::Pcnf,
            (1 << bits::PULOCK) | (1 << bits::PMODE) | (1 << bits::POPB) | (1 << bits::POPA),
        );

        self.regs.clear_bits(ControlReg::Pctl, 1 << bits::PCCYC);
        self.start();

        log_info!(
            "PSC running: top={}, dead time={}",
            self.regs.read_compare(CompareReg::PocrRb),
            config.dead_time
        );
        Ok(())
    }

    /// Replace the prescaler bits, PCTL 5:0 are kept as is
    pub fn set_prescaler(&mut self, prescaler: u8) {
        self.regs.modify(ControlReg::Pctl, |r| {
            (prescaler & bits::PCTL_PRESCALER_MASK) | (r & bits::PCTL_LOW_MASK)
        });
    }

    pub fn prescaler(&self) -> Prescaler {
        Prescaler::from_bits(self.regs.read(ControlReg::Pctl))
    }

    /// Switch the PSC input clock.
    ///
    /// For a PLL source the clock select bit is only set once the PLL
    /// reports lock. A lock timeout leaves the PSC on the core clock with the
    /// PLL stopped.
    pub fn set_source_clock(&mut self, source: ClockSource) -> Result<()> {
        log_debug!("PSC clock source: {:?}", source);

        match source.pll_frequency() {
            None => {
                self.pll.stop();
                self.regs.clear_bits(ControlReg::Pctl, 1 << bits::PCLKSEL);
            }
            Some(freq) => {
                // never keep clocking the PSC from a PLL being reprogrammed
                if self.regs.is_set(ControlReg::Pctl, bits::PCLKSEL) {
                    self.regs.clear_bits(ControlReg::Pctl, 1 << bits::PCLKSEL);
                }

                self.pll.set_frequency(freq);
                self.pll.start();

                if let Err(e) = self.wait_pll_lock() {
                    log_error!("PLL lock failed: {}", e);
                    self.pll.stop();
                    self.source_clock = ClockSource::CoreClock;
                    return Err(e);
                }

                self.regs.set_bits(ControlReg::Pctl, 1 << bits::PCLKSEL);
            }
        }

        self.source_clock = source;
        Ok(())
    }

    /// Raw selector variant: 0 core clock, 1 PLL 32 MHz, 2 PLL 64 MHz.
    /// Unknown codes are rejected without touching the hardware.
    pub fn set_source_clock_raw(&mut self, code: u8) -> Result<()> {
        let source = ClockSource::try_from(code).map_err(|e| {
            log_warn!("Ignoring clock source code {}", code);
            e
        })?;
        self.set_source_clock(source)
    }

    /// PLL lock wait used by later `set_source_clock` calls
    pub fn set_lock_wait(&mut self, lock_wait: LockWait) {
        self.lock_wait = lock_wait;
    }

    pub fn lock_wait(&self) -> LockWait {
        self.lock_wait
    }

    pub fn source_clock(&self) -> ClockSource {
        self.source_clock
    }

    fn wait_pll_lock(&mut self) -> Result<()> {
        match self.lock_wait {
            LockWait::Blocking => {
                while !self.pll.is_ready() {
                    core::hint::spin_loop();
                }
                Ok(())
            }
            LockWait::Bounded { polls, interval } => {
                let polls = polls.max(1);
                for poll in 1..=polls {
                    if self.pll.is_ready() {
                        log_trace!("PLL locked after {} polls", poll);
                        return Ok(());
                    }
                    if poll < polls {
                        self.delay.delay_us(interval.ticks());
                    }
                }
                Err(PwmError::PllLockTimeout { polls })
            }
        }
    }

    /// Dead time used by later period and duty updates.
    /// Re-applies the top compare if a period bound is already set.
    pub fn set_dead_time(&mut self, cycles: u8) -> Result<()> {
        if self.top_applied {
            let top = Self::top_for(self.counter_max, cycles)?;
            self.write_top(top);
        }
        self.dead_time = Some(cycles);
        Ok(())
    }

    pub fn dead_time(&self) -> Option<u8> {
        self.dead_time
    }

    /// Store the period bound and write POCR_RB = `counter_max + dead_time - 1`.
    /// `counter_max + dead_time` must lie in 1..=0xFFFF.
    pub fn set_counter_max(&mut self, counter_max: u16) -> Result<()> {
        let dead_time = self.dead_time.ok_or(PwmError::DeadTimeUnset)?;
        let top = Self::top_for(counter_max, dead_time)?;

        self.counter_max = counter_max;
        self.write_top(top);
        Ok(())
    }

    pub fn counter_max(&self) -> u16 {
        self.counter_max
    }

    fn top_for(counter_max: u16, dead_time: u8) -> Result<u16> {
        pwm_calc::checked_top(counter_max, dead_time).ok_or(PwmError::PeriodOutOfRange {
            counter_max,
            dead_time,
        })
    }

    fn write_top(&mut self, top: u16) {
        log_trace!("PSC top: {}", top);

        self.regs.write_compare(CompareReg::PocrRb, top);
        self.top_applied = true;
    }

    /// Duty is clamped to the period bound, never rejected.
    /// A then B are written; there is no cross-channel synchronisation.
    pub fn set_duty_cycle(&mut self, channel: Channel, duty: u16) {
        let (a, b) =
            pwm_calc::duty_compare(duty, self.counter_max, self.dead_time.unwrap_or_default());

        self.regs.write_compare(channel.compare_a(), a);
        self.regs.write_compare(channel.compare_b(), b);
    }

    pub fn set_duty_cycle0(&mut self, duty: u16) {
        self.set_duty_cycle(Channel::Ch0, duty)
    }

    pub fn set_duty_cycle1(&mut self, duty: u16) {
        self.set_duty_cycle(Channel::Ch1, duty)
    }

    pub fn set_duty_cycle2(&mut self, duty: u16) {
        self.set_duty_cycle(Channel::Ch2, duty)
    }

    /// Channel 0, 1, 2 in order
    pub fn set_duty_cycles(&mut self, duties: [u16; 3]) {
        Channel::ALL
            .iter()
            .zip(duties)
            .for_each(|(ch, duty)| self.set_duty_cycle(*ch, duty));
    }

    /// Current (A, B) compare pair of `channel`
    pub fn duty_compare(&self, channel: Channel) -> (u16, u16) {
        (
            self.regs.read_compare(channel.compare_a()),
            self.regs.read_compare(channel.compare_b()),
        )
    }

    pub fn set_output_configuration(&mut self, config: OutputConfig) {
        log_debug!("PSC outputs: {:x}", config.bits());
        self.regs.write(ControlReg::Poc, config.bits());
    }

    pub fn output_configuration(&self) -> OutputConfig {
        OutputConfig::from_bits(self.regs.read(ControlReg::Poc))
    }

    /// All six outputs back to standard ports
    pub fn disable_outputs(&mut self) {
        self.set_output_configuration(OutputConfig::DISABLE_ALL);
    }

    pub fn start(&mut self) {
        self.regs.set_bits(ControlReg::Pctl, 1 << bits::PRUN);
    }

    pub fn stop(&mut self) {
        self.regs.clear_bits(ControlReg::Pctl, 1 << bits::PRUN);
    }

    pub fn is_running(&self) -> bool {
        self.regs.is_set(ControlReg::Pctl, bits::PRUN)
    }

    pub fn registers(&self) -> &R {
        &self.regs
    }

    pub fn pll(&self) -> &P {
        &self.pll
    }

    pub fn release(self) -> (R, P, D) {
        (self.regs, self.pll, self.delay)
    }
}
