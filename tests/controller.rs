use psc_motor_pwm::config::PwmConfig;
use psc_motor_pwm::pwm::MicrosDurationU32;
use psc_motor_pwm::support::register_bank::bits;
use psc_motor_pwm::support::sim::{Event, SimDelay, SimPll, SimRegisterBank, Trace};
use psc_motor_pwm::support::{CompareReg, ControlReg, PllFrequency, RegisterBank};
use psc_motor_pwm::{Channel, ClockSource, LockWait, OutputConfig, PwmController, PwmError};

type SimController<'a> = PwmController<SimRegisterBank<'a>, SimPll<'a>, SimDelay>;

fn controller(trace: &Trace, polls_until_ready: Option<u32>) -> SimController<'_> {
    PwmController::new(
        SimRegisterBank::new(trace),
        SimPll::new(trace, polls_until_ready),
        SimDelay::default(),
    )
}

fn pctl_write_with(bit: u8) -> impl Fn(&Event) -> bool {
    move |e| matches!(e, Event::Write(ControlReg::Pctl, v) if v & (1 << bit) != 0)
}

fn is_pll_event(e: &Event) -> bool {
    matches!(
        e,
        Event::PllSetFrequency(_) | Event::PllStart | Event::PllStop | Event::PllPoll(_)
    )
}

fn bounded(polls: u32) -> LockWait {
    LockWait::Bounded {
        polls,
        interval: MicrosDurationU32::from_ticks(10),
    }
}

#[test]
fn test_init_pll32_scenario() {
    let trace = Trace::new();
    let mut pwm = controller(&trace, Some(3));

    pwm.init(&PwmConfig::new(0x40, ClockSource::Pll32MHz, 10, 1000))
        .unwrap();

    let set_freq = trace
        .position(|e| *e == Event::PllSetFrequency(PllFrequency::F32MHz))
        .unwrap();
    let start = trace.position(|e| *e == Event::PllStart).unwrap();
    let locked = trace.position(|e| *e == Event::PllPoll(true)).unwrap();
    let clksel = trace.position(pctl_write_with(bits::PCLKSEL)).unwrap();
    let run = trace.position(pctl_write_with(bits::PRUN)).unwrap();

    assert!(set_freq < start);
    assert!(start < locked);
    assert!(locked < clksel);
    assert_eq!(run, trace.len() - 1);
    assert!(!trace.overflowed());

    let regs = pwm.registers();
    assert_eq!(regs.read_compare(CompareReg::PocrRb), 1009);
    assert_eq!(regs.read_compare(CompareReg::Pocr0Ra), 1);
    assert_eq!(regs.read(ControlReg::Pctl), 0x40 | (1 << bits::PCLKSEL) | 1);
    assert_eq!(
        regs.read(ControlReg::Pcnf),
        (1 << bits::PULOCK) | (1 << bits::PMODE) | (1 << bits::POPB) | (1 << bits::POPA)
    );
    assert!(pwm.is_running());
    assert_eq!(pwm.source_clock(), ClockSource::Pll32MHz);
    assert_eq!(pwm.pll().polls(), 4);

    let (_, _, delay) = pwm.release();
    assert_eq!(delay.calls, 3);
    assert_eq!(delay.total_us, 30);
}

#[test]
fn test_init_protects_outputs_before_clock_changes() {
    let trace = Trace::new();
    let mut pwm = controller(&trace, Some(0));

    pwm.init(&PwmConfig::new(0x80, ClockSource::Pll64MHz, 4, 500))
        .unwrap();

    let events = trace.events();
    assert_eq!(events[0], Event::Write(ControlReg::Poc, 0));
    assert_eq!(events[1], Event::Write(ControlReg::Pmic0, 0));
    assert_eq!(events[2], Event::Write(ControlReg::Pmic1, 0));
    assert_eq!(events[3], Event::Write(ControlReg::Pmic2, 0));

    let first_pctl = trace
        .position(|e| matches!(e, Event::Write(ControlReg::Pctl, _)))
        .unwrap();
    let first_pll = trace.position(is_pll_event).unwrap();
    assert_eq!(first_pctl, 4);
    assert!(first_pll > 3);
}

#[test]
fn test_init_clears_overlap_enable_and_complete_cycle() {
    let trace = Trace::new();
    let mut regs = SimRegisterBank::new(&trace);
    regs.preset(ControlReg::Poc, 0x3F);
    regs.preset(ControlReg::Pmic0, 0x80 | 0x05);
    regs.preset(ControlReg::Pmic1, 0x80);
    regs.preset(ControlReg::Pmic2, 0x80);
    regs.preset(ControlReg::Pctl, 1 << bits::PCCYC);

    let mut pwm = PwmController::new(regs, SimPll::new(&trace, None), SimDelay::default());
    pwm.init(&PwmConfig::new(0x00, ClockSource::CoreClock, 8, 1023))
        .unwrap();

    let regs = pwm.registers();
    assert_eq!(regs.read(ControlReg::Poc), 0);
    assert_eq!(regs.read(ControlReg::Pmic0), 0x05);
    assert_eq!(regs.read(ControlReg::Pmic1), 0);
    assert_eq!(regs.read(ControlReg::Pmic2), 0);
    assert_eq!(regs.read(ControlReg::Pctl), 1 << bits::PRUN);
}

#[test]
fn test_init_writes_no_duty() {
    let trace = Trace::new();
    let mut pwm = controller(&trace, None);

    pwm.init(&PwmConfig::default()).unwrap();

    for ch in Channel::ALL {
        let (a, b) = (ch.compare_a(), ch.compare_b());
        assert_eq!(
            trace.position(|e| matches!(e, Event::WriteCompare(r, _) if *r == a || *r == b)),
            None
        );
    }
}

#[test]
fn test_duty_cycle_scenarios() {
    let trace = Trace::new();
    let mut pwm = controller(&trace, Some(0));
    pwm.init(&PwmConfig::new(0x40, ClockSource::Pll32MHz, 10, 1000))
        .unwrap();

    pwm.set_duty_cycle0(1500);
    assert_eq!(pwm.duty_compare(Channel::Ch0), (1000, 1010));

    pwm.set_duty_cycle1(300);
    assert_eq!(pwm.duty_compare(Channel::Ch1), (300, 310));

    pwm.set_duty_cycle2(0);
    assert_eq!(pwm.duty_compare(Channel::Ch2), (0, 10));
}

#[test]
fn test_duty_cycle_writes_a_then_b() {
    let trace = Trace::new();
    let mut pwm = controller(&trace, None);
    pwm.init(&PwmConfig::new(0, ClockSource::CoreClock, 5, 200))
        .unwrap();
    trace.clear();

    pwm.set_duty_cycle(Channel::Ch2, 100);

    assert_eq!(
        &trace.events()[..],
        &[
            Event::WriteCompare(CompareReg::Pocr2Sa, 100),
            Event::WriteCompare(CompareReg::Pocr2Sb, 105),
        ]
    );
}

#[test]
fn test_duty_cycle_property_all_channels() {
    for &(counter_max, dead_time) in &[(1000u16, 10u8), (255, 0), (1, 255), (4000, 32)] {
        let trace = Trace::new();
        let mut pwm = controller(&trace, None);
        pwm.init(&PwmConfig::new(0, ClockSource::CoreClock, dead_time, counter_max))
            .unwrap();

        for duty in (0..=u16::MAX).step_by(97).chain([counter_max, u16::MAX]) {
            for ch in Channel::ALL {
                pwm.set_duty_cycle(ch, duty);

                let clamped = duty.min(counter_max);
                assert_eq!(
                    pwm.duty_compare(ch),
                    (clamped, clamped + dead_time as u16)
                );
            }
        }
    }
}

#[test]
fn test_set_duty_cycles_in_channel_order() {
    let trace = Trace::new();
    let mut pwm = controller(&trace, None);
    pwm.init(&PwmConfig::new(0, ClockSource::CoreClock, 2, 100))
        .unwrap();
    trace.clear();

    pwm.set_duty_cycles([10, 200, 50]);

    assert_eq!(pwm.duty_compare(Channel::Ch0), (10, 12));
    assert_eq!(pwm.duty_compare(Channel::Ch1), (100, 102));
    assert_eq!(pwm.duty_compare(Channel::Ch2), (50, 52));
    assert_eq!(trace.events()[0], Event::WriteCompare(CompareReg::Pocr0Sa, 10));
    assert_eq!(trace.events()[5], Event::WriteCompare(CompareReg::Pocr2Sb, 52));
}

#[test]
fn test_counter_max_property() {
    for &dead_time in &[0u8, 1, 10, 255] {
        for &counter_max in &[1u16, 2, 100, 1000, 4095, 60000] {
            let trace = Trace::new();
            let mut pwm = controller(&trace, None);

            pwm.set_dead_time(dead_time).unwrap();
            pwm.set_counter_max(counter_max).unwrap();

            assert_eq!(
                pwm.registers().read_compare(CompareReg::PocrRb),
                counter_max + dead_time as u16 - 1
            );
            assert_eq!(pwm.counter_max(), counter_max);
        }
    }
}

#[test]
fn test_counter_max_requires_dead_time() {
    let trace = Trace::new();
    let mut pwm = controller(&trace, None);

    assert_eq!(pwm.set_counter_max(1000), Err(PwmError::DeadTimeUnset));
    assert!(trace.is_empty());
    assert_eq!(pwm.counter_max(), 0);
}

#[test]
fn test_dead_time_change_reapplies_top() {
    let trace = Trace::new();
    let mut pwm = controller(&trace, None);
    pwm.init(&PwmConfig::new(0, ClockSource::CoreClock, 10, 1000))
        .unwrap();

    pwm.set_dead_time(20).unwrap();

    assert_eq!(pwm.registers().read_compare(CompareReg::PocrRb), 1019);
    pwm.set_duty_cycle0(1000);
    assert_eq!(pwm.duty_compare(Channel::Ch0), (1000, 1020));
}

#[test]
fn test_prescaler_preserves_low_bits() {
    let trace = Trace::new();

    for prior in 0..=u8::MAX {
        for &prescaler in &[0x00u8, 0x40, 0x80, 0xC0, 0xFF, 0x3F] {
            let mut regs = SimRegisterBank::new(&trace);
            regs.preset(ControlReg::Pctl, prior);
            let mut pwm = PwmController::new(regs, SimPll::new(&trace, None), SimDelay::default());

            pwm.set_prescaler(prescaler);

            let pctl = pwm.registers().read(ControlReg::Pctl);
            assert_eq!(pctl & 0x3F, prior & 0x3F);
            assert_eq!(pctl & 0xC0, prescaler & 0xC0);
        }
        trace.clear();
    }
}

#[test]
fn test_core_clock_after_pll_source() {
    let trace = Trace::new();
    let mut pwm = controller(&trace, Some(1));
    pwm.init(&PwmConfig::new(0, ClockSource::Pll64MHz, 4, 500))
        .unwrap();
    assert!(pwm.registers().is_set(ControlReg::Pctl, bits::PCLKSEL));
    trace.clear();

    pwm.set_source_clock(ClockSource::CoreClock).unwrap();

    assert_eq!(trace.events()[0], Event::PllStop);
    assert!(!pwm.registers().is_set(ControlReg::Pctl, bits::PCLKSEL));
    assert!(!pwm.pll().is_running());
    assert_eq!(pwm.source_clock(), ClockSource::CoreClock);

    // stopping an already stopped PLL is harmless
    pwm.set_source_clock(ClockSource::CoreClock).unwrap();
    assert!(!pwm.registers().is_set(ControlReg::Pctl, bits::PCLKSEL));
}

#[test]
fn test_switch_between_pll_frequencies() {
    let trace = Trace::new();
    let mut pwm = controller(&trace, Some(2));
    pwm.set_source_clock(ClockSource::Pll32MHz).unwrap();
    trace.clear();

    pwm.set_source_clock(ClockSource::Pll64MHz).unwrap();

    let deselect = trace
        .position(|e| matches!(e, Event::Write(ControlReg::Pctl, v) if v & (1 << bits::PCLKSEL) == 0))
        .unwrap();
    let set_freq = trace
        .position(|e| *e == Event::PllSetFrequency(PllFrequency::F64MHz))
        .unwrap();
    let locked = trace.position(|e| *e == Event::PllPoll(true)).unwrap();
    let select = trace.rposition(pctl_write_with(bits::PCLKSEL)).unwrap();

    assert!(deselect < set_freq);
    assert!(locked < select);
    assert_eq!(pwm.pll().frequency(), Some(PllFrequency::F64MHz));
}

#[test]
fn test_pll_lock_timeout_keeps_psc_stopped() {
    let trace = Trace::new();
    let mut pwm = controller(&trace, None);

    let result = pwm.init(
        &PwmConfig::new(0x40, ClockSource::Pll32MHz, 10, 1000).with_lock_wait(bounded(5)),
    );

    assert_eq!(result, Err(PwmError::PllLockTimeout { polls: 5 }));
    assert!(!pwm.is_running());
    assert_eq!(pwm.output_configuration(), OutputConfig::DISABLE_ALL);
    assert!(!pwm.registers().is_set(ControlReg::Pctl, bits::PCLKSEL));
    assert!(!pwm.pll().is_running());
    assert_eq!(pwm.source_clock(), ClockSource::CoreClock);
    assert_eq!(trace.position(pctl_write_with(bits::PCLKSEL)), None);
    assert_eq!(
        trace.position(|e| matches!(e, Event::WriteCompare(CompareReg::PocrRb, _))),
        None
    );

    let (_, _, delay) = pwm.release();
    assert_eq!(delay.calls, 4);
}

#[test]
fn test_reinit_timeout_stops_running_psc() {
    let trace = Trace::new();
    let mut pwm = controller(&trace, None);
    pwm.init(&PwmConfig::default()).unwrap();
    assert!(pwm.is_running());
    trace.clear();

    let result = pwm.init(
        &PwmConfig::new(0x40, ClockSource::Pll32MHz, 10, 1000).with_lock_wait(bounded(3)),
    );

    assert_eq!(result, Err(PwmError::PllLockTimeout { polls: 3 }));
    assert!(!pwm.is_running());
    assert_eq!(pwm.output_configuration(), OutputConfig::DISABLE_ALL);

    let stop = trace
        .position(|e| matches!(e, Event::Write(ControlReg::Pctl, _)))
        .unwrap();
    assert_eq!(stop, 4);
    assert_eq!(trace.events()[stop], Event::Write(ControlReg::Pctl, 0));
    assert!(stop < trace.position(is_pll_event).unwrap());
}

#[test]
fn test_lock_wait_without_init() {
    let trace = Trace::new();
    let mut pwm = controller(&trace, Some(20));

    pwm.set_lock_wait(LockWait::Blocking);
    assert_eq!(pwm.lock_wait(), LockWait::Blocking);
    pwm.set_source_clock(ClockSource::Pll32MHz).unwrap();
    assert_eq!(pwm.pll().polls(), 21);

    pwm.set_lock_wait(bounded(3));
    assert_eq!(
        pwm.set_source_clock(ClockSource::Pll64MHz),
        Err(PwmError::PllLockTimeout { polls: 3 })
    );

    let (_, _, delay) = pwm.release();
    assert_eq!(delay.calls, 2);
}

#[test]
fn test_period_must_fit_compare_registers() {
    let trace = Trace::new();
    let mut pwm = controller(&trace, None);

    assert_eq!(
        pwm.init(&PwmConfig::new(0, ClockSource::CoreClock, 10, 65530)),
        Err(PwmError::PeriodOutOfRange {
            counter_max: 65530,
            dead_time: 10
        })
    );
    assert_eq!(
        pwm.init(&PwmConfig::new(0, ClockSource::CoreClock, 0, 0)),
        Err(PwmError::PeriodOutOfRange {
            counter_max: 0,
            dead_time: 0
        })
    );
    assert!(trace.is_empty());

    pwm.set_dead_time(10).unwrap();
    assert!(pwm.set_counter_max(65526).is_err());
    assert_eq!(pwm.counter_max(), 0);
    assert!(trace.is_empty());

    pwm.set_counter_max(65525).unwrap();
    assert_eq!(pwm.registers().read_compare(CompareReg::PocrRb), 65534);

    assert_eq!(
        pwm.set_dead_time(11),
        Err(PwmError::PeriodOutOfRange {
            counter_max: 65525,
            dead_time: 11
        })
    );
    assert_eq!(pwm.dead_time(), Some(10));
    assert_eq!(pwm.registers().read_compare(CompareReg::PocrRb), 65534);

    pwm.set_duty_cycle0(u16::MAX);
    assert_eq!(pwm.duty_compare(Channel::Ch0), (65525, 65535));
}

#[test]
fn test_blocking_lock_wait() {
    let trace = Trace::new();
    let mut pwm = controller(&trace, Some(50));

    pwm.init(&PwmConfig::new(0, ClockSource::Pll64MHz, 1, 100).with_lock_wait(LockWait::Blocking))
        .unwrap();

    assert_eq!(pwm.pll().polls(), 51);
    assert!(pwm.is_running());

    let (_, _, delay) = pwm.release();
    assert_eq!(delay.calls, 0);
}

#[test]
fn test_raw_clock_source() {
    let trace = Trace::new();
    let mut pwm = controller(&trace, Some(0));

    assert_eq!(
        pwm.set_source_clock_raw(3),
        Err(PwmError::UnknownClockSource(3))
    );
    assert!(trace.is_empty());

    pwm.set_source_clock_raw(2).unwrap();
    assert_eq!(pwm.source_clock(), ClockSource::Pll64MHz);
    assert!(pwm.registers().is_set(ControlReg::Pctl, bits::PCLKSEL));
}

#[test]
fn test_output_configuration_and_disable() {
    let trace = Trace::new();
    let mut pwm = controller(&trace, None);

    pwm.set_output_configuration(OutputConfig::pair(Channel::Ch1));
    assert_eq!(pwm.registers().read(ControlReg::Poc), 0b00_1100);
    assert!(pwm.output_configuration().is_enabled(Channel::Ch1));

    pwm.set_output_configuration(OutputConfig::ENABLE_ALL);
    assert_eq!(pwm.registers().read(ControlReg::Poc), 0x3F);

    pwm.disable_outputs();
    assert_eq!(pwm.registers().read(ControlReg::Poc), 0);
}

#[test]
fn test_start_stop() {
    let trace = Trace::new();
    let mut pwm = controller(&trace, None);
    pwm.init(&PwmConfig::default()).unwrap();
    assert!(pwm.is_running());

    pwm.stop();
    assert!(!pwm.is_running());
    assert_eq!(pwm.prescaler(), psc_motor_pwm::Prescaler::Div1);

    pwm.start();
    assert!(pwm.is_running());
}
