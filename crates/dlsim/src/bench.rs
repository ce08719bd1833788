//! Helpers for driving circuits from test code.
//!
//! [`TestBench`] owns a [`Simulator`] and turns every failure into a panic that
//! names the pin, so a test reads as a flat list of stimuli and expectations:
//!
//! ```
//! use dlsim::TestBench;
//!
//! let src = "module Inc (a: input logic<8>, y: output logic<8>) { assign y = a + 1; }";
//! TestBench::new(src, "Inc")
//!     .set_unsigned("a", 255)
//!     .run()
//!     .expect_unsigned("y", 0);
//! ```
//!
//! [`bridge`] keeps one circuit per thread behind free functions.

use crate::{Simulator, SimulatorError};

pub struct TestBench {
    sim: Simulator,
}

impl TestBench {
    /// Builds `top` from `source`, panicking with the rendered diagnostic on failure.
    #[track_caller]
    pub fn new(source: &str, top: &str) -> Self {
        match Simulator::builder(source, top).build() {
            Ok(sim) => Self { sim },
            Err(err) => panic!("failed to build `{}`: {:?}", top, miette::Report::new(err)),
        }
    }

    pub fn from_simulator(sim: Simulator) -> Self {
        Self { sim }
    }

    pub fn simulator(&self) -> &Simulator {
        &self.sim
    }

    pub fn simulator_mut(&mut self) -> &mut Simulator {
        &mut self.sim
    }

    pub fn into_simulator(self) -> Simulator {
        self.sim
    }

    #[track_caller]
    pub fn set_unsigned(&mut self, pin: &str, value: u64) -> &mut Self {
        check(self.sim.set_pin_unsigned(pin, value));
        self
    }

    #[track_caller]
    pub fn set_signed(&mut self, pin: &str, value: i64) -> &mut Self {
        check(self.sim.set_pin_signed(pin, value));
        self
    }

    #[track_caller]
    pub fn set_bool(&mut self, pin: &str, value: bool) -> &mut Self {
        check(self.sim.set_pin_unsigned(pin, u64::from(value)));
        self
    }

    #[track_caller]
    pub fn run(&mut self) -> &mut Self {
        check(self.sim.run());
        self
    }

    #[track_caller]
    pub fn read_unsigned(&self, pin: &str) -> u64 {
        check(self.sim.read_pin_unsigned(pin))
    }

    #[track_caller]
    pub fn read_signed(&self, pin: &str) -> i64 {
        check(self.sim.read_pin_signed(pin))
    }

    #[track_caller]
    pub fn read_bool(&self, pin: &str) -> bool {
        check(self.sim.read_pin(pin))
    }

    #[track_caller]
    pub fn expect_unsigned(&mut self, pin: &str, expected: u64) -> &mut Self {
        let actual = self.read_unsigned(pin);
        assert_eq!(actual, expected, "pin `{}`: expected {}, got {}", pin, expected, actual);
        self
    }

    #[track_caller]
    pub fn expect_signed(&mut self, pin: &str, expected: i64) -> &mut Self {
        let actual = self.read_signed(pin);
        assert_eq!(actual, expected, "pin `{}`: expected {}, got {}", pin, expected, actual);
        self
    }

    #[track_caller]
    pub fn expect_bool(&mut self, pin: &str, expected: bool) -> &mut Self {
        let actual = self.read_bool(pin);
        assert_eq!(actual, expected, "pin `{}`: expected {}, got {}", pin, expected, actual);
        self
    }
}

#[track_caller]
fn check<T>(res: Result<T, SimulatorError>) -> T {
    match res {
        Ok(value) => value,
        Err(err) => panic!("{}", err),
    }
}

/// One circuit per thread, driven through free functions.
///
/// ```
/// use dlsim::bridge::*;
///
/// load("module Not (a: input logic, y: output logic) { assign y = ~a; }", "Not");
/// set_pin_unsigned("a", 0);
/// run();
/// assert!(read_pin("y"));
/// unload();
/// ```
pub mod bridge {
    use std::cell::RefCell;

    use super::check;
    use crate::{Simulator, SimulatorError};

    thread_local! {
        static CURRENT: RefCell<Option<Simulator>> = const { RefCell::new(None) };
    }

    #[track_caller]
    fn with<T>(f: impl FnOnce(&mut Simulator) -> Result<T, SimulatorError>) -> T {
        CURRENT.with_borrow_mut(|current| match current.as_mut() {
            Some(sim) => check(f(sim)),
            None => panic!("no circuit loaded on this thread; call `bridge::load` first"),
        })
    }

    /// Builds `top` and makes it this thread's current circuit.
    #[track_caller]
    pub fn load(source: &str, top: &str) {
        let sim = match Simulator::builder(source, top).build() {
            Ok(sim) => sim,
            Err(err) => panic!("failed to build `{}`: {:?}", top, miette::Report::new(err)),
        };
        install(sim);
    }

    /// Makes an already built simulator this thread's current circuit.
    pub fn install(sim: Simulator) {
        CURRENT.with_borrow_mut(|current| *current = Some(sim));
    }

    /// Removes and returns this thread's current circuit.
    pub fn unload() -> Option<Simulator> {
        CURRENT.with_borrow_mut(Option::take)
    }

    #[track_caller]
    pub fn set_pin_unsigned(pin: &str, value: u64) {
        with(|sim| sim.set_pin_unsigned(pin, value))
    }

    #[track_caller]
    pub fn set_pin_signed(pin: &str, value: i64) {
        with(|sim| sim.set_pin_signed(pin, value))
    }

    #[track_caller]
    pub fn run() {
        with(Simulator::run)
    }

    #[track_caller]
    pub fn read_pin_unsigned(pin: &str) -> u64 {
        with(|sim| sim.read_pin_unsigned(pin))
    }

    #[track_caller]
    pub fn read_pin_signed(pin: &str) -> i64 {
        with(|sim| sim.read_pin_signed(pin))
    }

    #[track_caller]
    pub fn read_pin(pin: &str) -> bool {
        with(|sim| sim.read_pin(pin))
    }
}
