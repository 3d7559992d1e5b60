//! Media types eligible for metadata extraction

/// MIME types ffprobe can extract metadata from
pub const SUPPORTED_MIME_TYPES: &[&str] = &[
    "audio/aac",
    "audio/au",
    "audio/mp3",
    "audio/mp4",
    "audio/ogg",
    "audio/wav",
    "audio/x-aiff",
    "audio/x-mpegurl",
    "audio/x-ms-wma",
    "audio/x-pn-realaudio-plugin",
    "audio/x-matroska",
    "video/mp4",
    "video/mpeg",
    "video/ogg",
    "video/quicktime",
    "video/webm",
    "video/x-dv",
    "video/x-flv",
    "video/x-ms-asf",
    "video/x-ms-wm",
    "video/x-ms-wmv",
    "video/x-matroska",
    "video/x-matroska-3d",
    "video/MP2T",
    "video/x-sgi-movie",
];

/// Output shape for [`supported_mime_types`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeListFormat {
    /// The list as-is
    List,
    /// Single-quoted, comma-joined: `'audio/aac','audio/au',...`
    Quoted,
}

/// Supported MIME types in the requested format
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MimeTypes {
    List(Vec<&'static str>),
    Quoted(String),
}

pub fn supported_mime_types(format: MimeListFormat) -> MimeTypes {
    match format {
        MimeListFormat::List => MimeTypes::List(SUPPORTED_MIME_TYPES.to_vec()),
        MimeListFormat::Quoted => MimeTypes::Quoted(
            SUPPORTED_MIME_TYPES
                .iter()
                .map(|m| format!("'{}'", m))
                .collect::<Vec<_>>()
                .join(","),
        ),
    }
}
