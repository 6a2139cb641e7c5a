//! PetFeeder control core.
//!
//! Cooperative scheduling, actuator safety, and server synchronization
//! for a pump-and-dispenser pet feeder.  Everything is driven by polling
//! from a single loop; nothing blocks.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod safety;
pub mod scheduler;
pub mod sensors;
pub mod sync;
