//! Integration tests for the Lua bridge
//!
//! These tests drive a real Lua runtime through the `State` facade and check
//! values, callbacks, classes and lifetimes across the boundary.

mod harness;
mod modules;
mod state;
