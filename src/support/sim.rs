//! Simulated PSC register file and PLL
//!
//! Both collaborators log into one shared [`Trace`], so the relative order of
//! register writes and PLL commands can be checked after the fact.
//!
//! ```
//! use psc_motor_pwm::support::sim::{SimPll, SimRegisterBank, Trace};
//!
//! let trace = Trace::new();
//! let regs = SimRegisterBank::new(&trace);
//! let pll = SimPll::new(&trace, Some(2));
//! # let _ = (regs, pll);
//! ```

use core::cell::{Cell, RefCell};

use embedded_hal::blocking::delay::DelayUs;

use super::pll::{Pll, PllFrequency};
use super::register_bank::{CompareReg, ControlReg, RegisterBank};

pub const TRACE_CAPACITY: usize = 128;

const CONTROL_COUNT: usize = 7;
const COMPARE_COUNT: usize = 10;

/// One observable collaborator access
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Write(ControlReg, u8),
    WriteCompare(CompareReg, u16),
    PllSetFrequency(PllFrequency),
    PllStart,
    PllStop,
    PllPoll(bool),
}

pub type Events = heapless::Vec<Event, TRACE_CAPACITY>;

/// Shared, bounded event log
#[derive(Default)]
pub struct Trace {
    events: RefCell<Events>,
    overflowed: Cell<bool>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, event: Event) {
        if self.events.borrow_mut().push(event).is_err() {
            self.overflowed.set(true);
        }
    }

    pub fn events(&self) -> Events {
        self.events.borrow().clone()
    }

    /// Index of the first event matching `f`
    pub fn position(&self, f: impl Fn(&Event) -> bool) -> Option<usize> {
        self.events.borrow().iter().position(f)
    }

    /// Index of the last event matching `f`
    pub fn rposition(&self, f: impl Fn(&Event) -> bool) -> Option<usize> {
        self.events.borrow().iter().rposition(f)
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    pub fn overflowed(&self) -> bool {
        self.overflowed.get()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
        self.overflowed.set(false);
    }
}

//-----------------------------------------------------------------------------

/// In-memory PSC register file; reads are not traced
pub struct SimRegisterBank<'a> {
    control: [u8; CONTROL_COUNT],
    compare: [u16; COMPARE_COUNT],
    trace: &'a Trace,
}

impl<'a> SimRegisterBank<'a> {
    /// All registers start at zero, like the PSC after reset
    pub fn new(trace: &'a Trace) -> Self {
        Self {
            control: [0; CONTROL_COUNT],
            compare: [0; COMPARE_COUNT],
            trace,
        }
    }

    /// Seed a register without tracing the access
    pub fn preset(&mut self, reg: ControlReg, value: u8) {
        self.control[reg as usize] = value;
    }

    pub fn preset_compare(&mut self, reg: CompareReg, value: u16) {
        self.compare[reg as usize] = value;
    }
}

impl RegisterBank for SimRegisterBank<'_> {
    fn read(&self, reg: ControlReg) -> u8 {
        self.control[reg as usize]
    }

    fn write(&mut self, reg: ControlReg, value: u8) {
        self.trace.record(Event::Write(reg, value));
        self.control[reg as usize] = value;
    }

    fn read_compare(&self, reg: CompareReg) -> u16 {
        self.compare[reg as usize]
    }

    fn write_compare(&mut self, reg: CompareReg, value: u16) {
        self.trace.record(Event::WriteCompare(reg, value));
        self.compare[reg as usize] = value;
    }
}

//-----------------------------------------------------------------------------

/// PLL model that locks after a fixed number of not-ready polls
pub struct SimPll<'a> {
    /// `None`: never locks
    polls_until_ready: Option<u32>,
    frequency: Option<PllFrequency>,
    running: bool,
    polls: Cell<u32>,
    trace: &'a Trace,
}

impl<'a> SimPll<'a> {
    pub fn new(trace: &'a Trace, polls_until_ready: Option<u32>) -> Self {
        Self {
            polls_until_ready,
            frequency: None,
            running: false,
            polls: Cell::new(0),
            trace,
        }
    }

    pub fn frequency(&self) -> Option<PllFrequency> {
        self.frequency
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// `is_ready()` calls since the last `start()`
    pub fn polls(&self) -> u32 {
        self.polls.get()
    }
}

impl Pll for SimPll<'_> {
    fn set_frequency(&mut self, freq: PllFrequency) {
        self.trace.record(Event::PllSetFrequency(freq));
        self.frequency = Some(freq);
    }

    fn start(&mut self) {
        self.trace.record(Event::PllStart);
        self.running = true;
        self.polls.set(0);
    }

    fn stop(&mut self) {
        self.trace.record(Event::PllStop);
        self.running = false;
    }

    fn is_ready(&self) -> bool {
        let polled = self.polls.get();
        self.polls.set(polled + 1);

        let ready = self.running
            && match self.polls_until_ready {
                Some(n) => polled >= n,
                None => false,
            };
        self.trace.record(Event::PllPoll(ready));
        ready
    }
}

//-----------------------------------------------------------------------------

/// Delay that only accounts for the requested time
#[derive(Debug, Default)]
pub struct SimDelay {
    pub calls: u32,
    pub total_us: u64,
}

impl DelayUs<u32> for SimDelay {
    fn delay_us(&mut self, us: u32) {
        self.calls += 1;
        self.total_us += us as u64;
    }
}
