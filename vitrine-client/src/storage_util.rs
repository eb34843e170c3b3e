//! Upload helpers: content sniffing and base64 payload decoding

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};

/// Infer a file extension from the content signature bytes.
pub fn sniff_extension(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some("png")
    } else if bytes.starts_with(b"GIF8") {
        Some("gif")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

/// Decode a base64 upload payload.
///
/// Accepts either a bare base64 string or a `data:<mime>;base64,<data>`
/// URL; returns the bytes and the declared mime type, if any.
pub fn decode_base64_payload(data: &str) -> ClientResult<(Vec<u8>, Option<String>)> {
    let (mime, encoded) = match data.strip_prefix("data:") {
        Some(rest) => {
            let (header, body) = rest.split_once(',').ok_or_else(|| {
                ClientError::InvalidResponse("malformed data URL in base64 payload".into())
            })?;
            let mime = header.strip_suffix(";base64").unwrap_or(header);
            let mime = (!mime.is_empty()).then(|| mime.to_string());
            (mime, body)
        }
        None => (None, data),
    };

    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| ClientError::InvalidResponse(format!("invalid base64 payload: {e}")))?;
    Ok((bytes, mime))
}

/// Build a collision-free object name, keeping the hint's stem when given.
pub fn unique_object_name(hint: Option<&str>, extension: &str) -> String {
    let stem = hint
        .and_then(|h| h.rsplit('/').next())
        .and_then(|h| h.split('.').next())
        .filter(|s| !s.is_empty())
        .unwrap_or("upload");
    format!("{stem}-{}.{extension}", Uuid::new_v4())
}

/// Content type for a file name, falling back to octet-stream.
pub fn content_type_for(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Extension of a file name, if it has one.
pub fn extension_of(file_name: &str) -> Option<&str> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    (!stem.is_empty() && !ext.is_empty() && !ext.contains('/')).then_some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_common_image_signatures() {
        assert_eq!(sniff_extension(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("jpg"));
        assert_eq!(sniff_extension(b"\x89PNG\r\n\x1a\n"), Some("png"));
        assert_eq!(sniff_extension(b"GIF89a"), Some("gif"));
        assert_eq!(sniff_extension(b"RIFF\x00\x00\x00\x00WEBPVP8 "), Some("webp"));
        assert_eq!(sniff_extension(b"plain text"), None);
    }

    #[test]
    fn decodes_data_url_and_bare_base64() {
        let (bytes, mime) = decode_base64_payload("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(bytes, b"hello");
        assert_eq!(mime.as_deref(), Some("image/png"));

        let (bytes, mime) = decode_base64_payload("aGVsbG8=").unwrap();
        assert_eq!(bytes, b"hello");
        assert!(mime.is_none());
    }

    #[test]
    fn rejects_garbage_base64() {
        assert!(decode_base64_payload("not//valid!!").is_err());
    }

    #[test]
    fn object_names_keep_the_hint_stem() {
        let name = unique_object_name(Some("photos/banner.png"), "png");
        assert!(name.starts_with("banner-"));
        assert!(name.ends_with(".png"));
        assert!(unique_object_name(None, "jpg").starts_with("upload-"));
    }

    #[test]
    fn extension_and_content_type() {
        assert_eq!(extension_of("a.jpg"), Some("jpg"));
        assert_eq!(extension_of("noext"), None);
        assert_eq!(content_type_for("x.png"), "image/png");
    }
}
