use std::io::Read;

use flate2::read::DeflateDecoder;

use crate::ArchiveError;

pub(crate) const METHOD_STORED: u16 = 0;
pub(crate) const METHOD_DEFLATED: u16 = 8;

/// Inflates one entry's data. ZIP stores raw deflate streams (no zlib header),
/// hence [`DeflateDecoder`] and not `ZlibDecoder`.
pub(crate) fn decompress(method: u16, compressed: &[u8], expected_size: usize) -> Result<Vec<u8>, ArchiveError> {
    match method {
        METHOD_STORED => Ok(compressed.to_vec()),
        METHOD_DEFLATED => {
            let mut data = Vec::with_capacity(expected_size);
            DeflateDecoder::new(compressed).read_to_end(&mut data)?;
            Ok(data)
        }
        method => Err(ArchiveError::UnsupportedMethod { method }),
    }
}
