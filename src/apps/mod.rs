//! Built-in apps.
//!
//! | App       | Registered as | Shown                        |
//! |-----------|---------------|------------------------------|
//! | clock     | `clock`       | normal operation (default)   |
//! | weather   | `weather`     | normal operation             |
//! | setup     | `setup`       | only while provisioning      |

pub mod clock;
pub mod setup;
pub mod weather;

pub use clock::ClockApp;
pub use setup::SetupApp;
pub use weather::WeatherApp;
