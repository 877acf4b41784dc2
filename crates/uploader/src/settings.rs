use std::collections::BTreeMap;

use crate::UploadError;

/// Immutable-per-session upload configuration.
///
/// Copied into the coordinator by `init`; the caller keeps no live
/// reference afterward. Maps are ordered so headers and form fields are
/// emitted deterministically.
#[derive(Debug, Clone, Default)]
pub struct UploadSettings {
    /// Destination URL for the multipart POST. Required, non-empty.
    pub target_url: String,
    /// Extra HTTP headers, each emitted literally on every request.
    pub headers: BTreeMap<String, String>,
    /// Additional multipart form fields, emitted before the chunk field.
    pub form_fields: BTreeMap<String, String>,
    /// Display name declared as the chunk's filename in the form data.
    /// The file itself is never read by the engine.
    pub file_name: String,
}

impl UploadSettings {
    /// Creates settings for `target_url` with no extra headers or fields.
    pub fn new(target_url: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            file_name: file_name.into(),
            ..Self::default()
        }
    }

    /// Checks the fields the engine itself depends on.
    ///
    /// Header and URL syntax are validated by the transport constructor.
    pub fn validate(&self) -> Result<(), UploadError> {
        if self.target_url.is_empty() {
            return Err(UploadError::InvalidArgument("empty target URL".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_settings_pass() {
        let settings = UploadSettings::new("http://example.test/up", "live.webm");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn empty_url_rejected() {
        let settings = UploadSettings::default();
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, UploadError::InvalidArgument(_)));
    }

    #[test]
    fn maps_keep_insertion_independent_order() {
        let mut settings = UploadSettings::new("http://example.test/up", "live.webm");
        settings.form_fields.insert("z_last".into(), "1".into());
        settings.form_fields.insert("a_first".into(), "2".into());
        let keys: Vec<_> = settings.form_fields.keys().cloned().collect();
        assert_eq!(keys, vec!["a_first".to_string(), "z_last".to_string()]);
    }
}
