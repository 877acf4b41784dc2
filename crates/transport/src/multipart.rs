use std::collections::BTreeMap;

use bytes::{BufMut, Bytes, BytesMut};
use rand::Rng;
use webmup_uploader::{CHUNK_CONTENT_TYPE, CHUNK_FIELD_NAME};

/// Boundary entropy in bytes (produces 32 hex characters).
const BOUNDARY_BYTES: usize = 16;

/// A fully encoded multipart/form-data request body.
pub struct MultipartBody {
    /// `multipart/form-data; boundary=...` header value.
    pub content_type: String,
    pub bytes: Bytes,
}

/// Generates a random 32-character lowercase hex boundary.
fn generate_boundary() -> String {
    let mut bytes = [0u8; BOUNDARY_BYTES];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Encodes one chunk upload as multipart/form-data.
///
/// Part order is contractual: every form field in map order, then exactly
/// one file part named `webm_file` with content type `video/webm`,
/// carrying `chunk` verbatim and `file_name` as the declared filename.
pub fn encode_form(
    form_fields: &BTreeMap<String, String>,
    file_name: &str,
    chunk: &[u8],
) -> MultipartBody {
    let boundary = generate_boundary();
    let mut body = BytesMut::with_capacity(chunk.len() + 512);

    for (name, value) in form_fields {
        body.put_slice(format!("--{boundary}\r\n").as_bytes());
        body.put_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.put_slice(value.as_bytes());
        body.put_slice(b"\r\n");
    }

    body.put_slice(format!("--{boundary}\r\n").as_bytes());
    body.put_slice(
        format!(
            "Content-Disposition: form-data; name=\"{CHUNK_FIELD_NAME}\"; \
             filename=\"{file_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.put_slice(format!("Content-Type: {CHUNK_CONTENT_TYPE}\r\n\r\n").as_bytes());
    body.put_slice(chunk);
    body.put_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    MultipartBody {
        content_type: format!("multipart/form-data; boundary={boundary}"),
        bytes: body.freeze(),
    }
}
