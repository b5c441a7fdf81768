use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The container is missing, unreadable or not a point cloud file.
    #[error("cannot read point cloud {}: {reason}", path.display())]
    Format { path: PathBuf, reason: String },

    /// The container was read but holds no usable points.
    #[error("point cloud {} contains no points", path.display())]
    EmptyBuffer { path: PathBuf },

    /// Window or graphics device could not be created.
    #[error("failed to initialise display: {message}\nhint: {hint}")]
    ResourceInit { message: String, hint: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    /// A frame could not be submitted or presented.
    #[error("render error: {0}")]
    Render(String),
}

impl Error {
    pub fn format(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::Format {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub fn render(msg: impl ToString) -> Self {
        Error::Render(msg.to_string())
    }

    pub fn resource_init(message: impl ToString) -> Self {
        Error::ResourceInit {
            message: message.to_string(),
            hint: "make sure a Vulkan capable driver is installed and up to date, \
                   or use the `snapshot` binary to render without a window"
                .to_string(),
        }
    }
}
