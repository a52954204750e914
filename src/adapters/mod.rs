//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements     | Connects to                   |
//! |-------------|----------------|-------------------------------|
//! | `command`   | CommandRunner  | `std::process` with deadline  |
//! | `device_id` | (helper)       | MAC → AP SSID derivation      |
//! | `log_sink`  | EventSink      | `log` facade                  |
//! | `matrix`    | DisplayPort    | In-memory buffer + viewer feed|
//! | `panel`     | DisplayPort    | External panel driver sink    |

pub mod command;
pub mod device_id;
pub mod log_sink;
pub mod matrix;
pub mod panel;
