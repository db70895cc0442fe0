//! Image bytes to `data:` URL.

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// MIME type from leading magic bytes. Unknown content is
/// `application/octet-stream`.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'%', b'P', b'D', b'F', b'-', ..] => "application/pdf",
        [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "application/octet-stream",
    }
}

/// `data:{mime};base64,{payload}`.
pub fn data_url(bytes: &[u8]) -> String {
    format!("data:{};base64,{}", sniff_mime(bytes), STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_known_formats() {
        assert_eq!(sniff_mime(b"\x89PNG\r\n\x1a\n\0\0"), "image/png");
        assert_eq!(sniff_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
        assert_eq!(sniff_mime(b"%PDF-1.7\n"), "application/pdf");
        assert_eq!(sniff_mime(b"GIF89a...."), "image/gif");
        assert_eq!(sniff_mime(b"RIFF\x10\0\0\0WEBPVP8 "), "image/webp");
    }

    #[test]
    fn unknown_and_short_input_fall_back() {
        assert_eq!(sniff_mime(b""), "application/octet-stream");
        assert_eq!(sniff_mime(b"\xFF"), "application/octet-stream");
        assert_eq!(sniff_mime(b"hello world"), "application/octet-stream");
    }

    #[test]
    fn data_url_carries_mime_and_payload() {
        let url = data_url(&[0xFF, 0xD8, 0xFF, 0xDB]);
        assert_eq!(url, "data:image/jpeg;base64,/9j/2w==");
    }
}
