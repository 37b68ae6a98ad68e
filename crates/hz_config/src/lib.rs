pub mod config_io;

pub use config_io::{load_config, load_or_default, save_config, ConfigIoError, DEFAULT_CONFIG_PATH};
