use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid grid dimensions: {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("Failed to allocate cell pool of {0} slots")]
    PoolAllocation(usize),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Failed to spawn simulation thread: {0}")]
    ThreadSpawn(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
