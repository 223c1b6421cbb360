//! Magic-number content classification.

/// Bytes sampled from the front of an upload for classification.
pub const SNIFF_LEN: usize = 2048;

/// Reported for content no signature matches. Never a valid table key.
pub const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// Determine the media type of a stream from its leading bytes.
///
/// Only the bytes are consulted. A prefix shorter than [`SNIFF_LEN`] still
/// gets a best-effort answer; unrecognised or empty input yields
/// [`UNKNOWN_MEDIA_TYPE`].
pub fn classify(prefix: &[u8]) -> &'static str {
    infer::get(prefix)
        .map(|kind| kind.mime_type())
        .unwrap_or(UNKNOWN_MEDIA_TYPE)
}
