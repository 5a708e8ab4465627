use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot allocate a {width}x{height} atlas canvas")]
    CanvasAllocation { width: u32, height: u32 },
    #[error("Encoding error: {0}")]
    Encode(String),
    #[error("Invalid cell dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, AtlasError>;
