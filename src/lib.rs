pub mod meter_settings;
pub mod rtlamr;
pub mod settings;
pub mod units;

pub use meter_settings::*;
pub use settings::{ConfigError, ConfigErrorKind, Field};
pub use units::*;
