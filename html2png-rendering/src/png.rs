use crate::errors::{HtmlRenderingError, Result};

const VALID_PNG_HEADER: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Checks whether `data` starts with the PNG file signature.
#[must_use]
pub fn is_png_data(data: &[u8]) -> bool {
    data.get(0..VALID_PNG_HEADER.len())
        .is_some_and(|header| header == VALID_PNG_HEADER)
}

pub(crate) fn ensure_png_data(data: Vec<u8>) -> Result<Vec<u8>> {
    if is_png_data(&data) {
        Ok(data)
    } else {
        Err(HtmlRenderingError::InvalidPngOutput(data.len()))
    }
}
