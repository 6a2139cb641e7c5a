//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules for the PetFeeder device:
//! server-mode coordination, edge-triggered actuator commands, and the
//! per-pass orchestration in [`service::AppService`].  All interaction
//! with hardware and the network happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without peripherals.

pub mod commands;
pub mod coordinator;
pub mod events;
pub mod indicator;
pub mod ports;
pub mod service;
