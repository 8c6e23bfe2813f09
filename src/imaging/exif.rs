//! EXIF extraction and re-embedding.
//!
//! Re-encoding a JPEG through the `image` crate drops every application
//! segment, so the EXIF block is lifted out of the source before decoding and
//! written back into the freshly encoded stream afterwards.
//!
//! An EXIF block lives in an APP1 segment whose body starts with the 6-byte
//! identifier `Exif\0\0`, followed by a TIFF structure. [`ExifPayload`] holds
//! the bytes *after* that identifier; [`embed`] puts the identifier back in
//! front. The payload itself is never inspected or modified.

use super::segments::{APP1, JpegSegments, Segment, SegmentError};

/// Identifier at the start of every EXIF APP1 segment body.
pub const EXIF_PREFIX: &[u8; 6] = b"Exif\0\0";

/// Raw EXIF payload (the TIFF structure after `Exif\0\0`). Read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExifPayload(Vec<u8>);

impl ExifPayload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Size of the APP1 segment [`embed`] will add for this payload.
    pub fn segment_len(&self) -> u64 {
        Segment::new(APP1, Vec::new()).encoded_len() as u64
            + EXIF_PREFIX.len() as u64
            + self.0.len() as u64
    }
}

/// Extract the EXIF payload from a JPEG byte stream.
///
/// Returns `None` when there is no EXIF APP1 segment, and also when the
/// stream's segment structure cannot be parsed: a corrupt header is treated
/// the same as a missing one. APP1 segments with other identifiers (XMP) are
/// skipped.
pub fn extract(data: &[u8]) -> Option<ExifPayload> {
    let jpeg = match JpegSegments::parse(data) {
        Ok(jpeg) => jpeg,
        Err(e) => {
            tracing::debug!("segment parse failed, treating as no EXIF: {e}");
            return None;
        }
    };

    jpeg.find_all(APP1)
        .find(|s| s.payload.starts_with(EXIF_PREFIX))
        .map(|s| ExifPayload::new(s.payload[EXIF_PREFIX.len()..].to_vec()))
}

/// Write an EXIF payload into a freshly encoded JPEG.
///
/// With no payload the encoded bytes come back unchanged. Otherwise the
/// stream is re-parsed and a new APP1 segment (`Exif\0\0` + payload) is
/// placed right after SOI/JFIF. A parse failure here means the encoder
/// produced an invalid stream and is returned as an error.
pub fn embed(encoded: Vec<u8>, exif: Option<&ExifPayload>) -> Result<Vec<u8>, SegmentError> {
    let Some(exif) = exif else {
        return Ok(encoded);
    };

    let mut jpeg = JpegSegments::parse(&encoded)?;
    let mut body = Vec::with_capacity(EXIF_PREFIX.len() + exif.len());
    body.extend_from_slice(EXIF_PREFIX);
    body.extend_from_slice(exif.as_bytes());
    jpeg.insert_after_header(Segment::new(APP1, body));
    jpeg.to_bytes()
}
