//! Content-type sniffing for input validation.
//!
//! File names lie: `report.pdf` may be a text export, `logo.png` may be a
//! JPEG. Validation therefore asks a [`ContentTypeDetector`] what a file
//! *contains*. The default [`MagicBytesDetector`] inspects the first KiB;
//! tests and embedders can substitute their own implementation through
//! [`crate::config::StampConfigBuilder::detector`].

use image::ImageFormat;
use std::io::Read;
use std::path::Path;

/// Media type the source document must have.
pub const PDF_MIME: &str = "application/pdf";

/// Media types accepted for the overlay image.
pub const SUPPORTED_OVERLAY_TYPES: [&str; 7] = [
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/bmp",
    "image/vnd.microsoft.icon",
    "image/tiff",
    "image/svg+xml",
];

/// How many leading bytes the default detector reads.
const SNIFF_LEN: u64 = 1024;

const SVG_MIME: &str = "image/svg+xml";

/// Sizes of the known BMP info headers (core, V1 through V5, OS/2 v2).
const BMP_DIB_HEADER_SIZES: [u32; 7] = [12, 40, 52, 56, 64, 108, 124];

/// Determines a file's media type from its contents.
pub trait ContentTypeDetector: Send + Sync {
    /// Return the MIME type of the file at `path`.
    fn detect(&self, path: &Path) -> std::io::Result<String>;
}

/// True if `mime` is an accepted overlay type.
pub fn is_supported_overlay(mime: &str) -> bool {
    SUPPORTED_OVERLAY_TYPES.contains(&mime)
}

/// Magic-byte detector covering PDF, the common raster formats, SVG and
/// plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagicBytesDetector;

impl ContentTypeDetector for MagicBytesDetector {
    fn detect(&self, path: &Path) -> std::io::Result<String> {
        let mut head = Vec::with_capacity(SNIFF_LEN as usize);
        std::fs::File::open(path)?
            .take(SNIFF_LEN)
            .read_to_end(&mut head)?;
        Ok(sniff(&head).to_string())
    }
}

/// Classify a buffer holding the start of a file.
pub fn sniff(head: &[u8]) -> &'static str {
    if head.is_empty() {
        return "application/x-empty";
    }
    if head.starts_with(b"%PDF") {
        return PDF_MIME;
    }
    if let Ok(format) = image::guess_format(head) {
        // `BM` alone is too weak a signature; plenty of text starts with it.
        if format != ImageFormat::Bmp || is_plausible_bmp(head) {
            return image_mime(format);
        }
    }
    if let Some(mime) = sniff_markup(head) {
        return mime;
    }
    if looks_like_text(head) {
        return "text/plain";
    }
    "application/octet-stream"
}

fn image_mime(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Ico => "image/vnd.microsoft.icon",
        ImageFormat::Tiff => "image/tiff",
        other => other.to_mime_type(),
    }
}

/// A `BM` file header followed by a DIB header of a known size.
fn is_plausible_bmp(head: &[u8]) -> bool {
    match head.get(14..18) {
        Some(size) => {
            let size = u32::from_le_bytes([size[0], size[1], size[2], size[3]]);
            BMP_DIB_HEADER_SIZES.contains(&size)
        }
        None => false,
    }
}

/// SVG documents, optionally behind an XML prolog, comments or doctype.
///
/// The first element must be `<svg`; an HTML page with inline SVG is not
/// an SVG image.
fn sniff_markup(head: &[u8]) -> Option<&'static str> {
    let head = head.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(head);
    let text = String::from_utf8_lossy(head).to_ascii_lowercase();
    let mut rest = text.trim_start();
    let is_xml = rest.starts_with("<?xml");

    loop {
        if rest.starts_with("<svg") {
            return Some(SVG_MIME);
        }
        let end_marker = if rest.starts_with("<?") {
            "?>"
        } else if rest.starts_with("<!--") {
            "-->"
        } else if let Some(doctype) = rest.strip_prefix("<!doctype") {
            if doctype.trim_start().starts_with("svg") {
                return Some(SVG_MIME);
            }
            ">"
        } else {
            break;
        };
        match rest.find(end_marker) {
            Some(i) => rest = rest[i + end_marker.len()..].trim_start(),
            None => break,
        }
    }

    is_xml.then_some("text/xml")
}

fn looks_like_text(head: &[u8]) -> bool {
    if head.contains(&0) {
        return false;
    }
    match std::str::from_utf8(head) {
        Ok(_) => true,
        // A multi-byte character cut off by the sniff window is still text.
        Err(e) => e.error_len().is_none(),
    }
}
