//! Concurrent chunk upload engine.
//!
//! A caller repeatedly hands the [`Uploader`] byte buffers (segments of a
//! growing media stream) and it transmits each one as an HTTP multipart
//! POST through a [`Transport`] collaborator, reporting throughput and
//! completion back to the caller.
//!
//! One background worker per uploader drains a single-slot
//! [`TransferBuffer`]: a submission claims the slot, wakes the worker, and
//! the slot is released only once the transfer finishes. A second
//! submission while one is in flight is rejected, never queued.

mod buffer;
mod coordinator;
mod settings;
mod stats;
mod transport;
mod uploader;

pub use buffer::{BufferError, TransferBuffer};
pub use coordinator::UploadCoordinator;
pub use settings::UploadSettings;
pub use stats::UploadStats;
pub use transport::{
    CHUNK_CONTENT_TYPE, CHUNK_FIELD_NAME, HookAction, TransferError, TransferHooks, Transport,
};
pub use uploader::Uploader;

/// Errors produced by the upload engine.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("transport init failed: {0}")]
    TransportInit(String),

    #[error("invalid target URL: {0}")]
    UrlConfig(String),

    #[error("invalid header: {0}")]
    HeaderConfig(String),

    #[error("an upload is already in progress")]
    UploadInProgress,

    #[error("transfer failed: {0}")]
    TransferFailed(String),

    #[error("uploader is stopping")]
    Stopping,
}
