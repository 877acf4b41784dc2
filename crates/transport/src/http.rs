use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use futures_util::Stream;
use reqwest::header::{CONTENT_TYPE, EXPECT, HeaderMap, HeaderName, HeaderValue};
use tracing::debug;
use webmup_uploader::{
    HookAction, TransferError, TransferHooks, Transport, UploadError, UploadSettings,
};

use crate::multipart::{self, MultipartBody};

/// Size of the request body pieces handed to the wire. Each piece is
/// preceded by a progress hook invocation.
const BODY_CHUNK_SIZE: usize = 16 * 1024;

/// HTTP multipart transport backed by reqwest.
///
/// Built once per session from the caller's [`UploadSettings`]; the
/// custom headers become client defaults so every `perform` carries
/// them, along with an always-empty `Expect` header to disable
/// 100-continue handshakes.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: reqwest::Url,
    form_fields: BTreeMap<String, String>,
    file_name: String,
}

impl HttpTransport {
    /// Validates the settings and builds the HTTP client.
    pub fn new(settings: &UploadSettings) -> Result<Self, UploadError> {
        let url = reqwest::Url::parse(&settings.target_url)
            .map_err(|e| UploadError::UrlConfig(format!("{}: {e}", settings.target_url)))?;

        let mut headers = HeaderMap::new();
        // An empty Expect header disables HTTP 100-continue handshakes,
        // regardless of caller input.
        headers.insert(EXPECT, HeaderValue::from_static(""));
        for (name, value) in &settings.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| UploadError::HeaderConfig(format!("{name}: {e}")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| UploadError::HeaderConfig(format!("{name}: {e}")))?;
            headers.insert(header_name, header_value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| UploadError::TransportInit(e.to_string()))?;

        Ok(Self {
            client,
            url,
            form_fields: settings.form_fields.clone(),
            file_name: settings.file_name.clone(),
        })
    }
}

impl Transport for HttpTransport {
    fn perform(
        &self,
        chunk: Bytes,
        hooks: Arc<dyn TransferHooks>,
    ) -> Pin<Box<dyn Future<Output = Result<u16, TransferError>> + Send + '_>> {
        Box::pin(async move {
            let MultipartBody {
                content_type,
                bytes: body,
            } = multipart::encode_form(&self.form_fields, &self.file_name, &chunk);
            debug!(
                chunk_bytes = chunk.len(),
                body_bytes = body.len(),
                url = %self.url,
                "posting chunk"
            );

            let aborted = Arc::new(AtomicBool::new(false));
            let stream = progress_stream(body, Arc::clone(&hooks), Arc::clone(&aborted));

            let response = self
                .client
                .post(self.url.clone())
                .header(CONTENT_TYPE, content_type.as_str())
                .body(reqwest::Body::wrap_stream(stream))
                .send()
                .await;

            let mut response = match response {
                Ok(r) => r,
                Err(_) if aborted.load(Ordering::Acquire) => return Err(TransferError::Aborted),
                Err(e) => return Err(TransferError::Failed(e.to_string())),
            };

            let status = response.status().as_u16();
            loop {
                match response.chunk().await {
                    Ok(Some(data)) => {
                        if hooks.on_response_data(&data) == HookAction::Abort {
                            return Err(TransferError::Aborted);
                        }
                    }
                    Ok(None) => break,
                    Err(e) => return Err(TransferError::Failed(e.to_string())),
                }
            }

            debug!(status, "server response status");
            Ok(status)
        })
    }
}

struct StreamState {
    body: Bytes,
    offset: usize,
    hooks: Arc<dyn TransferHooks>,
    aborted: Arc<AtomicBool>,
    failed: bool,
}

/// Streams `body` in [`BODY_CHUNK_SIZE`] pieces, invoking the progress
/// hook with cumulative bytes before each piece and once more at
/// end-of-body. An abort from the hook fails the stream, which fails the
/// request.
fn progress_stream(
    body: Bytes,
    hooks: Arc<dyn TransferHooks>,
    aborted: Arc<AtomicBool>,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    let state = StreamState {
        body,
        offset: 0,
        hooks,
        aborted,
        failed: false,
    };
    futures_util::stream::unfold(state, |mut s| async move {
        if s.failed {
            return None;
        }
        if s.hooks.on_progress(s.offset as u64) == HookAction::Abort {
            s.aborted.store(true, Ordering::Release);
            s.failed = true;
            return Some((
                Err(std::io::Error::other("upload aborted by stop request")),
                s,
            ));
        }
        if s.offset >= s.body.len() {
            return None;
        }
        let end = (s.offset + BODY_CHUNK_SIZE).min(s.body.len());
        let piece = s.body.slice(s.offset..end);
        s.offset = end;
        Some((Ok(piece), s))
    })
}
