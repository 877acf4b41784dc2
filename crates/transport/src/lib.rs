//! HTTP multipart transport for the webmup upload engine.
//!
//! [`HttpTransport`] implements `webmup_uploader::Transport`: one
//! multipart/form-data POST per chunk, with the configured form fields
//! first and the chunk as the single `webm_file` part. The request body
//! is streamed so the engine's progress hook fires as bytes are handed
//! to the wire, and a stop request aborts the body mid-stream.

mod http;
mod multipart;

pub use http::HttpTransport;
pub use multipart::MultipartBody;
