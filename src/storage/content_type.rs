use std::collections::HashMap;

use once_cell::sync::Lazy;

pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

static CONTENT_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("png", "image/png"),
        ("gif", "image/gif"),
        ("webp", "image/webp"),
        ("pdf", "application/pdf"),
        ("mp4", "video/mp4"),
        ("mp3", "audio/mpeg"),
        ("ogg", "audio/ogg"),
        ("webm", "video/webm"),
        ("oga", "audio/ogg"),
        ("opus", "audio/opus"),
    ])
});

/// MIME type from the key's extension, case-insensitive
pub fn content_type_for(key: &str) -> &'static str {
    let file_name = key.rsplit('/').next().unwrap_or(key);
    file_name
        .rsplit_once('.')
        .and_then(|(_, ext)| CONTENT_TYPES.get(ext.to_ascii_lowercase().as_str()).copied())
        .unwrap_or(FALLBACK_CONTENT_TYPE)
}
