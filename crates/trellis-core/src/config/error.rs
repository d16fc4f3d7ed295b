use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown or unsupported config format for path: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("Failed to parse {format} config: {message}")]
    Parse { format: &'static str, message: String },

    #[error("Failed to serialize config to {format}: {message}")]
    Serialize { format: &'static str, message: String },
}
