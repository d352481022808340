/// Convenience result type used across orrb.
pub type OrrbResult<T> = Result<T, OrrbError>;

/// Top-level error taxonomy used by the service, capture and scene APIs.
#[derive(thiserror::Error, Debug)]
pub enum OrrbError {
    /// Invalid request or configuration data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A request referenced a camera the scene does not have.
    #[error("camera not found: {0}")]
    CameraNotFound(String),

    /// A scene component failed to build, update or run.
    #[error("component error: {0}")]
    Component(String),

    /// The renderer failed to initialize, render or read back a surface.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when loading, serializing or deserializing configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The server is shutting down or the simulation thread is gone.
    #[error("service shut down: {0}")]
    Shutdown(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OrrbError {
    /// Build a [`OrrbError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`OrrbError::CameraNotFound`] value.
    pub fn camera_not_found(name: impl Into<String>) -> Self {
        Self::CameraNotFound(name.into())
    }

    /// Build a [`OrrbError::Component`] value.
    pub fn component(msg: impl Into<String>) -> Self {
        Self::Component(msg.into())
    }

    /// Build a [`OrrbError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`OrrbError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`OrrbError::Shutdown`] value.
    pub fn shutdown(msg: impl Into<String>) -> Self {
        Self::Shutdown(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
