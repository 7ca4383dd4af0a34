use url::Url;

use crate::error::DownloadError;

/// Used when the URL path has no final segment.
pub const FALLBACK_FILENAME: &str = "data_packet.bin";

pub fn get_filename_from_url(url_str: &str) -> Result<String, DownloadError> {
    let url = Url::parse(url_str)?;

    if let Some(segments) = url.path_segments() {
        if let Some(filename) = segments.last() {
            if !filename.is_empty() {
                return Ok(sanitize_filename(filename));
            }
        }
    }

    Ok(FALLBACK_FILENAME.to_string())
}

pub fn sanitize_filename(filename: &str) -> String {
    filename.replace(|c: char| !c.is_alphanumeric() && c != '.' && c != '-' && c != '_', "_")
}
