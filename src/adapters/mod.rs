//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements         | Connects to                 |
//! |-----------------|--------------------|-----------------------------|
//! | `hardware`      | SensorPort         | sensor drivers              |
//! |                 | ActuatorPort       | pump relay, servo PWM       |
//! | `log_sink`      | EventSink          | `log` facade                |
//! | `sim`           | embedded-hal pins  | in-memory peripherals       |
//! |                 | Connector          | in-memory scripted server   |
//! | `time`          | Clock              | monotonic `Instant`         |
//! | `ws_transport`  | Connector          | WebSocket server over TCP   |

pub mod hardware;
pub mod log_sink;
pub mod sim;
pub mod time;
pub mod ws_transport;
