//! File inspection for the `image` and `mimes` rules.
//!
//! MIME types are sniffed from file content (never from the client-supplied
//! name) and mapped back to extensions through a configurable [`MimeMap`].

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use image::{ImageFormat, ImageReader};

/// Bytes read from the head of a file for sniffing.
pub const SNIFF_LEN: u64 = 8192;

/// Sizes of the known BMP info headers (core, v1 to v5 and the two
/// Adobe variants).
const BMP_INFO_HEADER_SIZES: &[u32] = &[12, 40, 52, 56, 108, 124];

/// MIME types accepted by the `image` rule.
pub const RASTER_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/bmp",
    "image/webp",
];

/// What the engine learned about an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFacts {
    pub mime: &'static str,
    /// The file sniffs as a raster image and its header decodes.
    pub is_image: bool,
}

/// Inspect a file off the async runtime.
pub async fn inspect(path: &Path) -> io::Result<FileFacts> {
    let path: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || inspect_blocking(&path))
        .await
        .map_err(io::Error::other)?
}

fn inspect_blocking(path: &Path) -> io::Result<FileFacts> {
    let mut head = Vec::new();
    File::open(path)?.take(SNIFF_LEN).read_to_end(&mut head)?;

    let mime = sniff_mime(&head);
    let is_image = RASTER_MIME_TYPES.contains(&mime) && decodes_header(path);
    Ok(FileFacts { mime, is_image })
}

fn decodes_header(path: &Path) -> bool {
    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map(|reader| reader.into_dimensions().is_ok())
        .unwrap_or(false)
}

/// Sniff a MIME type from the first bytes of a file.
pub fn sniff_mime(head: &[u8]) -> &'static str {
    if head.is_empty() {
        return "application/x-empty";
    }

    // PNM magic ("P1".."P7") is plain text and would misfire on text files.
    match image::guess_format(head) {
        Ok(ImageFormat::Pnm) | Err(_) => {}
        Ok(ImageFormat::Bmp) if !is_bmp_header(head) => {}
        Ok(format) => return format.to_mime_type(),
    }

    if head.starts_with(b"%PDF-") {
        return "application/pdf";
    }
    if head.starts_with(b"PK\x03\x04") {
        return "application/zip";
    }
    if head.starts_with(&[0x1f, 0x8b]) {
        return "application/gzip";
    }

    match text_prefix(head) {
        Some(text) => sniff_text(text),
        None => "application/octet-stream",
    }
}

/// `BM` alone is two printable bytes, so the info-header size that follows
/// the 14-byte file header must also be one BMP defines.
fn is_bmp_header(head: &[u8]) -> bool {
    head.get(14..18)
        .and_then(|bytes| <[u8; 4]>::try_from(bytes).ok())
        .is_some_and(|bytes| BMP_INFO_HEADER_SIZES.contains(&u32::from_le_bytes(bytes)))
}

/// The head decoded as UTF-8, tolerating a character cut off by the read
/// window. `None` for binary content.
fn text_prefix(head: &[u8]) -> Option<&str> {
    if head.contains(&0) {
        return None;
    }
    match std::str::from_utf8(head) {
        Ok(text) => Some(text),
        Err(err) if err.error_len().is_none() => std::str::from_utf8(&head[..err.valid_up_to()]).ok(),
        Err(_) => None,
    }
}

fn sniff_text(text: &str) -> &'static str {
    let text = text.trim_start_matches('\u{feff}').trim_start();
    let lower: String = text.chars().take(16).collect::<String>().to_ascii_lowercase();

    if lower.starts_with("<?php") {
        "text/x-php"
    } else if lower.starts_with("<?xml") {
        "application/xml"
    } else if lower.starts_with("<!doctype html") || lower.starts_with("<html") {
        "text/html"
    } else {
        "text/plain"
    }
}

/// Extension to accepted MIME types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeMap {
    by_extension: HashMap<String, Vec<String>>,
}

impl MimeMap {
    pub fn empty() -> Self {
        Self {
            by_extension: HashMap::new(),
        }
    }

    /// Add (or replace) the MIME types accepted for an extension.
    pub fn insert<I, S>(&mut self, extension: &str, mime_types: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.by_extension.insert(
            extension.to_ascii_lowercase(),
            mime_types.into_iter().map(Into::into).collect(),
        );
    }

    pub fn mime_types(&self, extension: &str) -> &[String] {
        self.by_extension
            .get(&extension.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether `mime` belongs to any of `extensions`.
    pub fn accepts(&self, extensions: &[String], mime: &str) -> bool {
        extensions
            .iter()
            .any(|ext| self.mime_types(ext).iter().any(|m| m == mime))
    }
}

impl Default for MimeMap {
    fn default() -> Self {
        let mut map = Self::empty();
        map.insert("txt", ["text/plain"]);
        map.insert(
            "php",
            [
                "application/x-httpd-php",
                "application/php",
                "application/x-php",
                "text/php",
                "text/x-php",
                "application/x-httpd-php-source",
            ],
        );
        map.insert(
            "csv",
            ["text/csv", "text/x-comma-separated-values", "text/plain"],
        );
        map.insert("json", ["application/json", "text/plain"]);
        map.insert("html", ["text/html"]);
        map.insert("htm", ["text/html"]);
        map.insert("xml", ["application/xml", "text/xml"]);
        map.insert("pdf", ["application/pdf", "application/x-download"]);
        map.insert(
            "zip",
            [
                "application/zip",
                "application/x-zip",
                "application/x-zip-compressed",
            ],
        );
        map.insert("gz", ["application/gzip", "application/x-gzip"]);
        map.insert("gzip", ["application/gzip", "application/x-gzip"]);
        for ext in ["jpg", "jpeg", "jpe"] {
            map.insert(ext, ["image/jpeg", "image/pjpeg"]);
        }
        map.insert("png", ["image/png", "image/x-png"]);
        map.insert("gif", ["image/gif"]);
        map.insert("bmp", ["image/bmp", "image/x-ms-bmp"]);
        map.insert("webp", ["image/webp"]);
        map
    }
}
