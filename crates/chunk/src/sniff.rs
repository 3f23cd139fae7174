//! Content-type sniffing from a file's leading bytes.

/// Number of leading bytes inspected when sniffing a content type.
pub const SNIFF_LEN: usize = 512;

/// Guesses a MIME content type from the first bytes of a file.
///
/// Matches a small set of magic numbers; anything unrecognized falls back to
/// `text/plain; charset=utf-8` when the prefix contains no binary bytes and
/// `application/octet-stream` otherwise.
pub fn detect_content_type(prefix: &[u8]) -> &'static str {
    if prefix.starts_with(b"\x89PNG\r\n\x1a\n") {
        return "image/png";
    }
    if prefix.starts_with(b"\xff\xd8\xff") {
        return "image/jpeg";
    }
    if prefix.starts_with(b"GIF87a") || prefix.starts_with(b"GIF89a") {
        return "image/gif";
    }
    if prefix.len() >= 12 && &prefix[..4] == b"RIFF" && &prefix[8..12] == b"WEBP" {
        return "image/webp";
    }
    if prefix.starts_with(b"%PDF-") {
        return "application/pdf";
    }
    if prefix.starts_with(b"PK\x03\x04") {
        return "application/zip";
    }
    if prefix.starts_with(b"\x1f\x8b") {
        return "application/gzip";
    }
    if !prefix.is_empty() && !prefix.iter().copied().any(is_binary_byte) {
        return "text/plain; charset=utf-8";
    }
    "application/octet-stream"
}

// Control bytes that never appear in plain text (tab, LF, FF, CR and ESC
// are tolerated).
fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0b | 0x0e..=0x1a | 0x1c..=0x1f)
}
