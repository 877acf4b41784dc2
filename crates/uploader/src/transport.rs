//! Transport seam between the upload engine and the wire.
//!
//! The engine drives the transport through [`Transport::perform`]; the
//! transport reports back through [`TransferHooks`] while the request is
//! in flight. Transport implementations live outside this crate (see
//! `webmup-transport` for the HTTP one); tests use scripted stubs.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;

/// Multipart field name carrying the chunk bytes.
pub const CHUNK_FIELD_NAME: &str = "webm_file";

/// Content type declared for the chunk field.
pub const CHUNK_CONTENT_TYPE: &str = "video/webm";

/// Decision returned by a transfer hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookAction {
    /// Keep the transfer going.
    Continue,
    /// Terminate the transfer as soon as possible.
    Abort,
}

/// Callbacks invoked by the transport while a transfer is in flight.
///
/// Both hooks double as cooperative cancellation points: once stop has
/// been requested they return [`HookAction::Abort`], and the transport is
/// expected to fail the transfer with [`TransferError::Aborted`].
pub trait TransferHooks: Send + Sync {
    /// Called periodically with the cumulative number of request body
    /// bytes handed to the wire. Values are non-decreasing within one
    /// transfer.
    fn on_progress(&self, bytes_sent: u64) -> HookAction;

    /// Called as response body bytes arrive. The engine does not persist
    /// response content.
    fn on_response_data(&self, data: &[u8]) -> HookAction;
}

/// Error from a single [`Transport::perform`] call.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// A hook returned [`HookAction::Abort`] and the transport honored it.
    #[error("transfer aborted by stop request")]
    Aborted,

    #[error("transfer failed: {0}")]
    Failed(String),
}

/// Abstract wire transport for one chunk upload.
///
/// `perform` sends the chunk as a single POST and resolves to the HTTP
/// status code. The hooks are shared so the transport can invoke them
/// from the streamed request body.
pub trait Transport: Send + Sync {
    fn perform(
        &self,
        chunk: Bytes,
        hooks: Arc<dyn TransferHooks>,
    ) -> Pin<Box<dyn Future<Output = Result<u16, TransferError>> + Send + '_>>;
}
