// Error types
// Failures that callers degrade from instead of aborting

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing the settings file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write config file {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize config")]
    Serialize(#[from] toml::ser::Error),
}

/// Errors raised while turning an image file into a texture
#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("failed to read image file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode image {}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
