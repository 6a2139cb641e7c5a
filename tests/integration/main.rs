//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters and the in-memory server.  All tests run on the
//! host with no real hardware or network required.

mod exchange_tests;
mod hardware_stack_tests;
mod harness;
mod mock_hw;
mod safety_tests;
