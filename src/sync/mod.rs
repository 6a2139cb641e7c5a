//! Server synchronization.
//!
//! | Module      | Role                                               |
//! |-------------|----------------------------------------------------|
//! | `transport` | `Connector` / `Connection` traits                  |
//! | `codec`     | `\r`-terminated frame decoder                      |
//! | `message`   | envelope types and inbound validation gates        |
//! | `session`   | `DeviceSyncSession` state machine                  |

pub mod codec;
pub mod message;
pub mod session;
pub mod transport;
