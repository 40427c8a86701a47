use fugit_timer::HertzU32;

use super::Prescaler;

/// POCR_RB value for a period bound: `counter_max + dead_time - 1`.
/// Wraps at 16 bits like the register itself.
pub fn compare_top(counter_max: u16, dead_time: u8) -> u16 {
    counter_max.wrapping_add(dead_time as u16).wrapping_sub(1)
}

/// Top for a period bound whose top and falling edges all fit in 16 bits,
/// i.e. `1 <= counter_max + dead_time <= 0xFFFF`
pub fn checked_top(counter_max: u16, dead_time: u8) -> Option<u16> {
    let sum = counter_max as u32 + dead_time as u32;
    if sum == 0 || sum > u16::MAX as u32 {
        None
    } else {
        Some((sum - 1) as u16)
    }
}

/// Rising (A) and falling (B) compare values for a requested duty
pub fn duty_compare(duty: u16, counter_max: u16, dead_time: u8) -> (u16, u16) {
    let clamped = num::traits::clamp(duty, 0, counter_max);
    (clamped, clamped.wrapping_add(dead_time as u16))
}

/// Center aligned: the counter runs up to the top and back,
/// one period is `2 * (top + 1)` prescaled ticks.
fn period_ticks(top: u16) -> u32 {
    2 * (top as u32 + 1)
}

/// Output frequency of the running PSC
pub fn pwm_frequency(
    clock: HertzU32,
    prescaler: Prescaler,
    counter_max: u16,
    dead_time: u8,
) -> HertzU32 {
    let ticks = period_ticks(compare_top(counter_max, dead_time));
    HertzU32::from_raw(clock.to_Hz() / prescaler.division() / ticks)
}

/// Period bound giving the frequency closest to `target`,
/// `None` if it is not reachable with this clock and prescaler
pub fn counter_max_for(
    clock: HertzU32,
    prescaler: Prescaler,
    dead_time: u8,
    target: HertzU32,
) -> Option<u16> {
    let target = target.to_Hz() as u64;
    if target == 0 {
        return None;
    }

    let tick_rate = (clock.to_Hz() / prescaler.division()) as u64;
    // rounded half period in ticks == top + 1
    let half_period = (tick_rate + target) / (2 * target);

    let counter_max = half_period.checked_sub(dead_time as u64)?;
    if counter_max == 0 || counter_max > u16::MAX as u64 {
        return None;
    }

    let counter_max = counter_max as u16;
    checked_top(counter_max, dead_time).map(|_| counter_max)
}
