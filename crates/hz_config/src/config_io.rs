use bevy::log::{info, warn};
use hz_core::TerrainConfig;
use std::fs;
use std::path::Path;

/// Config file read by the app at startup.
pub const DEFAULT_CONFIG_PATH: &str = "assets/terrain.ron";

/// Error type for terrain config I/O.
#[derive(Debug)]
pub enum ConfigIoError {
    Io(std::io::Error),
    Ron(ron::Error),
    RonSpanned(ron::error::SpannedError),
}

impl From<std::io::Error> for ConfigIoError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ron::Error> for ConfigIoError {
    fn from(err: ron::Error) -> Self {
        Self::Ron(err)
    }
}

impl From<ron::error::SpannedError> for ConfigIoError {
    fn from(err: ron::error::SpannedError) -> Self {
        Self::RonSpanned(err)
    }
}

impl std::fmt::Display for ConfigIoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Ron(e) => write!(f, "RON serialization error: {}", e),
            Self::RonSpanned(e) => write!(f, "RON parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigIoError {}

/// Save a terrain config as pretty RON, creating parent directories.
pub fn save_config(path: &Path, config: &TerrainConfig) -> Result<(), ConfigIoError> {
    let pretty_config = ron::ser::PrettyConfig::new()
        .depth_limit(3)
        .separate_tuple_members(true);

    let ron_string = ron::ser::to_string_pretty(config, pretty_config)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, ron_string)?;
    Ok(())
}

/// Load a terrain config. Missing fields take their defaults and
/// out-of-range values are clamped.
pub fn load_config(path: &Path) -> Result<TerrainConfig, ConfigIoError> {
    let contents = fs::read_to_string(path)?;
    let config: TerrainConfig = ron::from_str(&contents)?;
    Ok(config.validated())
}

/// Load `path`, falling back to the default config when it is missing or
/// unreadable.
pub fn load_or_default(path: &Path) -> TerrainConfig {
    if !path.exists() {
        info!("No terrain config at {}, using defaults", path.display());
        return TerrainConfig::default();
    }

    match load_config(path) {
        Ok(config) => {
            info!("Loaded terrain config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Failed to load terrain config {}: {}", path.display(), e);
            TerrainConfig::default()
        }
    }
}
