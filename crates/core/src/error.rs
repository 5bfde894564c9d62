/// Result alias that carries the custom [`FieldError`] type.
pub type Result<T> = std::result::Result<T, FieldError>;

/// Common error type for the engine crate.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    /// The drawing context behind a surface could not be acquired. Nothing is
    /// scheduled when this is returned from [`crate::FrameLoop::start`].
    #[error("drawing surface `{surface}` has no context available")]
    SurfaceUnavailable { surface: String },
    /// Host supplied a value the engine refuses to work with.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl FieldError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn surface_unavailable(surface: impl Into<String>) -> Self {
        Self::SurfaceUnavailable {
            surface: surface.into(),
        }
    }
}

impl From<&str> for FieldError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for FieldError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
