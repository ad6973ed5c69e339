use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use crate::common::errors::BackendError;

/// A decoded `data:` URL, as produced by a browser file reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    pub fn parse(input: &str) -> Result<DataUrl, BackendError> {
        let rest = input
            .strip_prefix("data:")
            .ok_or_else(|| BackendError::InvalidDataUrl("missing data: prefix".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| BackendError::InvalidDataUrl("missing payload".to_string()))?;

        let mut params = header.split(';');
        let content_type = match params.next() {
            Some(mime) if !mime.is_empty() => mime.to_ascii_lowercase(),
            _ => "text/plain".to_string(),
        };
        let is_base64 = params.any(|p| p.eq_ignore_ascii_case("base64"));

        let bytes = if is_base64 {
            STANDARD
                .decode(payload.trim())
                .map_err(|e| BackendError::InvalidDataUrl(e.to_string()))?
        } else {
            urlencoding::decode_binary(payload.as_bytes()).into_owned()
        };

        Ok(DataUrl { content_type, bytes })
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}
