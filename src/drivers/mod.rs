//! Actuator drivers over `embedded-hal` traits.

pub mod pump;
pub mod servo;
