pub mod dependencies;
pub mod settings;

pub use dependencies::{connect_store, Dependencies};
pub use settings::{ConfigError, LogFormat, LogSettings, MigrationConfig, StoreSettings};
