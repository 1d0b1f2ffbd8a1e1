use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// A decoded `data:image/...;base64,` payload as sent by the capture widgets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Raster formats the capture widgets produce. Scriptable types such as SVG are refused.
const ACCEPTED_TYPES: &[&str] = &["image/png", "image/jpeg", "image/jpg", "image/webp", "image/gif"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataUriError {
    #[error("expected a data: URI")]
    NotDataUri,
    #[error("only base64-encoded image data is accepted")]
    UnsupportedEncoding,
    #[error("media type {0} is not an accepted image type")]
    NotAnImage(String),
    #[error("payload is not valid base64")]
    InvalidBase64,
    #[error("image payload is empty")]
    Empty,
}

impl DataUri {
    pub fn parse(input: &str) -> Result<Self, DataUriError> {
        let rest = input
            .trim()
            .strip_prefix("data:")
            .ok_or(DataUriError::NotDataUri)?;
        let (header, payload) = rest.split_once(',').ok_or(DataUriError::NotDataUri)?;

        let mut parts = header.split(';');
        let mime = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
        if !parts.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
            return Err(DataUriError::UnsupportedEncoding);
        }
        if !ACCEPTED_TYPES.contains(&mime.as_str()) {
            return Err(DataUriError::NotAnImage(mime));
        }

        // Some canvases wrap long payloads
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD
            .decode(compact.as_bytes())
            .map_err(|_| DataUriError::InvalidBase64)?;
        if bytes.is_empty() {
            return Err(DataUriError::Empty);
        }

        Ok(Self { mime, bytes })
    }

    /// File extension matching the media type.
    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "jpg",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_png_signature() {
        let uri = format!("data:image/png;base64,{}", STANDARD.encode(b"\x89PNG"));
        let parsed = DataUri::parse(&uri).unwrap();
        assert_eq!(parsed.mime, "image/png");
        assert_eq!(parsed.bytes, b"\x89PNG");
        assert_eq!(parsed.extension(), "png");
    }

    #[test]
    fn jpeg_maps_to_jpg_extension() {
        let uri = format!("data:image/jpeg;base64,{}", STANDARD.encode([0xFF, 0xD8]));
        assert_eq!(DataUri::parse(&uri).unwrap().extension(), "jpg");
    }

    #[test]
    fn rejects_non_image_and_plain_payloads() {
        assert_eq!(
            DataUri::parse("hello").unwrap_err(),
            DataUriError::NotDataUri
        );
        assert_eq!(
            DataUri::parse("data:image/png,abc").unwrap_err(),
            DataUriError::UnsupportedEncoding
        );
        assert!(matches!(
            DataUri::parse("data:text/html;base64,PGgxPg==").unwrap_err(),
            DataUriError::NotAnImage(_)
        ));
        assert_eq!(
            DataUri::parse("data:image/png;base64,@@@").unwrap_err(),
            DataUriError::InvalidBase64
        );
        assert_eq!(
            DataUri::parse("data:image/png;base64,").unwrap_err(),
            DataUriError::Empty
        );
    }

    #[test]
    fn rejects_svg_payloads() {
        let uri = format!(
            "data:image/svg+xml;base64,{}",
            STANDARD.encode("<svg onload=\"alert(1)\"/>")
        );
        assert_eq!(
            DataUri::parse(&uri).unwrap_err(),
            DataUriError::NotAnImage("image/svg+xml".to_string())
        );
    }
}
