//! Test harness for bridge tests
//!
//! Provides state construction, expression assertions and a host type that
//! counts its live instances.

use std::cell::Cell;

use glue_core::Any;
use glue_lua::{State, StateOptions};

thread_local! {
    static LIVE: Cell<i32> = const { Cell::new(0) };
}

/// Host object counting live instances on the current thread
pub struct Tracked {
    pub id: i32,
}

impl Tracked {
    pub fn new(id: i32) -> Self {
        LIVE.with(|live| live.set(live.get() + 1));
        Tracked { id }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        LIVE.with(|live| live.set(live.get() - 1));
    }
}

/// Number of `Tracked` values alive on this thread
pub fn live_tracked() -> i32 {
    LIVE.with(|live| live.get())
}

/// State with the standard library opened
pub fn new_state() -> State {
    State::with_options(StateOptions::new().with_std_libs()).unwrap()
}

/// Evaluate `expression` and return the host value
pub fn eval(state: &State, expression: &str) -> Any {
    match state.get(expression) {
        Ok(value) => value,
        Err(e) => panic!("evaluating `{}` failed: {}", expression, e),
    }
}

pub fn expect_int(state: &State, expression: &str, expected: i64) {
    let value = eval(state, expression);
    assert_eq!(
        value.get::<i64>().unwrap_or_else(|e| panic!("`{}`: {}", expression, e)),
        expected,
        "`{}`",
        expression
    );
}

pub fn expect_f64(state: &State, expression: &str, expected: f64) {
    let value = eval(state, expression);
    let actual = value.get::<f64>().unwrap();
    assert!(
        (actual - expected).abs() < 1e-9,
        "`{}`: expected {}, got {}",
        expression,
        expected,
        actual
    );
}

pub fn expect_bool(state: &State, expression: &str, expected: bool) {
    let value = eval(state, expression);
    assert_eq!(value, Any::Bool(expected), "`{}`", expression);
}

pub fn expect_string(state: &State, expression: &str, expected: &str) {
    let value = eval(state, expression);
    assert_eq!(value.as_str(), Some(expected), "`{}`", expression);
}
