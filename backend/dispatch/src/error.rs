use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// No handler is registered for the requested path.
    #[error("no handler registered for {path}")]
    NotFound { path: String },
}
