//! Minimal JPEG marker-segment parser and serializer.
//!
//! Splits a JPEG byte stream into its header segments and the entropy-coded
//! remainder:
//!
//! ```text
//! FF D8                         SOI
//! FF E0 <len> <payload>         APP0 (JFIF)       ┐
//! FF E1 <len> <payload>         APP1 (EXIF)       │ segments
//! FF DB <len> <payload>         DQT, SOF, DHT...  │
//! FF DA <len> <payload>         SOS               ┘
//! <entropy-coded data ... FF D9>                  tail (kept verbatim)
//! ```
//!
//! Each segment is a marker byte plus its payload; the two length bytes are
//! recomputed on write. Everything after the first SOS header is opaque here:
//! progressive files keep their later scans inside the tail untouched.
//!
//! Serializing an unmodified parse reproduces the input exactly, so the only
//! bytes that ever change are the segments a caller adds.

use thiserror::Error;

pub const SOI: u8 = 0xD8;
pub const EOI: u8 = 0xD9;
pub const SOS: u8 = 0xDA;
pub const APP0: u8 = 0xE0;
pub const APP1: u8 = 0xE1;
const TEM: u8 = 0x01;

/// Largest payload a length-prefixed segment can carry (u16 length includes itself).
pub const MAX_PAYLOAD: usize = u16::MAX as usize - 2;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SegmentError {
    #[error("Not a JPEG stream (missing SOI marker)")]
    NotJpeg,
    #[error("JPEG stream truncated at offset {0}")]
    Truncated(usize),
    #[error("Invalid length {length} for marker 0x{marker:02X} at offset {offset}")]
    InvalidLength {
        marker: u8,
        length: usize,
        offset: usize,
    },
    #[error("Expected a marker at offset {0}")]
    ExpectedMarker(usize),
    #[error("JPEG stream has no image scan (no SOS marker)")]
    MissingScan,
    #[error("Segment payload of {0} bytes exceeds the 65533-byte limit")]
    PayloadTooLarge(usize),
}

/// One header segment: marker id and the payload after its length field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub marker: u8,
    pub payload: Vec<u8>,
}

impl Segment {
    pub fn new(marker: u8, payload: Vec<u8>) -> Self {
        Self { marker, payload }
    }

    /// Bytes this segment occupies on disk, marker and length included.
    pub fn encoded_len(&self) -> usize {
        if is_standalone(self.marker) {
            2
        } else {
            4 + self.payload.len()
        }
    }
}

/// Markers that stand alone, without a length field.
fn is_standalone(marker: u8) -> bool {
    marker == TEM || (0xD0..=0xD7).contains(&marker)
}

/// A parsed JPEG: ordered header segments (SOS last) plus the verbatim tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegSegments {
    segments: Vec<Segment>,
    tail: Vec<u8>,
}

impl JpegSegments {
    /// Parse a JPEG byte stream into segments.
    pub fn parse(data: &[u8]) -> Result<Self, SegmentError> {
        if data.len() < 2 || data[0] != 0xFF || data[1] != SOI {
            return Err(SegmentError::NotJpeg);
        }

        let mut segments = Vec::new();
        let mut pos = 2;

        loop {
            if pos >= data.len() {
                return Err(SegmentError::MissingScan);
            }
            if data[pos] != 0xFF {
                return Err(SegmentError::ExpectedMarker(pos));
            }
            // Any number of 0xFF fill bytes may precede a marker
            while pos < data.len() && data[pos] == 0xFF {
                pos += 1;
            }
            let Some(&marker) = data.get(pos) else {
                return Err(SegmentError::Truncated(pos));
            };
            let marker_offset = pos - 1;
            pos += 1;

            if marker == EOI {
                return Err(SegmentError::MissingScan);
            }
            if is_standalone(marker) {
                segments.push(Segment::new(marker, Vec::new()));
                continue;
            }

            if pos + 2 > data.len() {
                return Err(SegmentError::Truncated(pos));
            }
            let length = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;
            if length < 2 || pos + length > data.len() {
                return Err(SegmentError::InvalidLength {
                    marker,
                    length,
                    offset: marker_offset,
                });
            }
            let payload = data[pos + 2..pos + length].to_vec();
            pos += length;
            segments.push(Segment::new(marker, payload));

            if marker == SOS {
                return Ok(Self {
                    segments,
                    tail: data[pos..].to_vec(),
                });
            }
        }
    }

    /// All header segments in file order.
    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    /// First segment with the given marker.
    pub fn find(&self, marker: u8) -> Option<&Segment> {
        self.segments.iter().find(|s| s.marker == marker)
    }

    /// Every segment with the given marker, in file order.
    pub fn find_all(&self, marker: u8) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(move |s| s.marker == marker)
    }

    /// Insert a segment at the front of the header, after any JFIF APP0 segments.
    pub fn insert_after_header(&mut self, segment: Segment) {
        let index = self
            .segments
            .iter()
            .position(|s| s.marker != APP0)
            .unwrap_or(self.segments.len());
        self.segments.insert(index, segment);
    }

    /// Serialize back to a JPEG byte stream.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SegmentError> {
        let header_len: usize = self.segments.iter().map(Segment::encoded_len).sum();
        let mut out = Vec::with_capacity(2 + header_len + self.tail.len());
        out.extend_from_slice(&[0xFF, SOI]);

        for segment in &self.segments {
            out.extend_from_slice(&[0xFF, segment.marker]);
            if is_standalone(segment.marker) {
                continue;
            }
            if segment.payload.len() > MAX_PAYLOAD {
                return Err(SegmentError::PayloadTooLarge(segment.payload.len()));
            }
            let length = (segment.payload.len() + 2) as u16;
            out.extend_from_slice(&length.to_be_bytes());
            out.extend_from_slice(&segment.payload);
        }

        out.extend_from_slice(&self.tail);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hand-built JPEG skeleton: SOI, APP0, DQT, SOS, two scan bytes, EOI.
    fn skeleton() -> Vec<u8> {
        let mut data = vec![0xFF, SOI];
        data.extend_from_slice(&[0xFF, APP0, 0x00, 0x07]);
        data.extend_from_slice(b"JFIF\0");
        data.extend_from_slice(&[0xFF, 0xDB, 0x00, 0x04, 0x01, 0x02]);
        data.extend_from_slice(&[0xFF, SOS, 0x00, 0x03, 0x09]);
        data.extend_from_slice(&[0x12, 0x34, 0xFF, 0x00, 0xFF, EOI]);
        data
    }

    #[test]
    fn parses_segments_in_order() {
        let jpeg = JpegSegments::parse(&skeleton()).unwrap();
        let markers: Vec<u8> = jpeg.iter().map(|s| s.marker).collect();
        assert_eq!(markers, vec![APP0, 0xDB, SOS]);
        assert_eq!(jpeg.find(APP0).unwrap().payload, b"JFIF\0");
        assert_eq!(jpeg.find(0xDB).unwrap().payload, vec![0x01, 0x02]);
        assert!(jpeg.find(APP1).is_none());
    }

    #[test]
    fn unmodified_parse_round_trips_exactly() {
        let data = skeleton();
        let jpeg = JpegSegments::parse(&data).unwrap();
        assert_eq!(jpeg.to_bytes().unwrap(), data);
    }

    #[test]
    fn tail_is_kept_verbatim() {
        let jpeg = JpegSegments::parse(&skeleton()).unwrap();
        assert_eq!(jpeg.tail, vec![0x12, 0x34, 0xFF, 0x00, 0xFF, EOI]);
    }

    #[test]
    fn fill_bytes_before_marker_are_skipped() {
        let mut data = vec![0xFF, SOI, 0xFF, 0xFF, 0xFF];
        data.extend_from_slice(&[0xDB, 0x00, 0x03, 0x07]);
        data.extend_from_slice(&[0xFF, SOS, 0x00, 0x02, 0xFF, EOI]);
        let jpeg = JpegSegments::parse(&data).unwrap();
        assert_eq!(jpeg.find(0xDB).unwrap().payload, vec![0x07]);
    }

    #[test]
    fn find_all_returns_every_match() {
        let mut data = vec![0xFF, SOI];
        data.extend_from_slice(&[0xFF, APP1, 0x00, 0x03, b'a']);
        data.extend_from_slice(&[0xFF, APP1, 0x00, 0x03, b'b']);
        data.extend_from_slice(&[0xFF, SOS, 0x00, 0x02, 0xFF, EOI]);
        let jpeg = JpegSegments::parse(&data).unwrap();
        let payloads: Vec<&[u8]> = jpeg.find_all(APP1).map(|s| s.payload.as_slice()).collect();
        assert_eq!(payloads, vec![b"a".as_slice(), b"b".as_slice()]);
    }

    #[test]
    fn insert_after_header_follows_app0() {
        let mut jpeg = JpegSegments::parse(&skeleton()).unwrap();
        jpeg.insert_after_header(Segment::new(APP1, b"hello".to_vec()));
        let markers: Vec<u8> = jpeg.iter().map(|s| s.marker).collect();
        assert_eq!(markers, vec![APP0, APP1, 0xDB, SOS]);

        let bytes = jpeg.to_bytes().unwrap();
        let reparsed = JpegSegments::parse(&bytes).unwrap();
        assert_eq!(reparsed.find(APP1).unwrap().payload, b"hello");
    }

    #[test]
    fn insert_after_header_without_app0_goes_first() {
        let mut data = vec![0xFF, SOI];
        data.extend_from_slice(&[0xFF, 0xDB, 0x00, 0x03, 0x01]);
        data.extend_from_slice(&[0xFF, SOS, 0x00, 0x02, 0xFF, EOI]);
        let mut jpeg = JpegSegments::parse(&data).unwrap();
        jpeg.insert_after_header(Segment::new(APP1, vec![1]));
        assert_eq!(jpeg.iter().next().unwrap().marker, APP1);
    }

    #[test]
    fn standalone_markers_have_no_length() {
        let mut data = vec![0xFF, SOI, 0xFF, 0xD0];
        data.extend_from_slice(&[0xFF, SOS, 0x00, 0x02, 0xFF, EOI]);
        let jpeg = JpegSegments::parse(&data).unwrap();
        assert_eq!(jpeg.iter().next().unwrap().encoded_len(), 2);
        assert_eq!(jpeg.to_bytes().unwrap(), data);
    }

    #[test]
    fn rejects_non_jpeg() {
        assert_eq!(
            JpegSegments::parse(b"\x89PNG\r\n"),
            Err(SegmentError::NotJpeg)
        );
        assert_eq!(JpegSegments::parse(&[]), Err(SegmentError::NotJpeg));
    }

    #[test]
    fn rejects_truncated_segment() {
        let mut data = skeleton();
        data.truncate(8);
        assert!(matches!(
            JpegSegments::parse(&data),
            Err(SegmentError::InvalidLength { marker: APP0, .. })
        ));
    }

    #[test]
    fn rejects_length_below_two() {
        let data = [0xFF, SOI, 0xFF, 0xDB, 0x00, 0x01, 0x00];
        assert!(matches!(
            JpegSegments::parse(&data),
            Err(SegmentError::InvalidLength { length: 1, .. })
        ));
    }

    #[test]
    fn rejects_stream_without_scan() {
        let data = [0xFF, SOI, 0xFF, 0xDB, 0x00, 0x03, 0x01, 0xFF, EOI];
        assert_eq!(JpegSegments::parse(&data), Err(SegmentError::MissingScan));
        assert_eq!(
            JpegSegments::parse(&[0xFF, SOI]),
            Err(SegmentError::MissingScan)
        );
    }

    #[test]
    fn rejects_garbage_between_segments() {
        let data = [0xFF, SOI, 0x00, 0x11];
        assert_eq!(
            JpegSegments::parse(&data),
            Err(SegmentError::ExpectedMarker(2))
        );
    }

    #[test]
    fn oversized_payload_fails_to_serialize() {
        let mut jpeg = JpegSegments::parse(&skeleton()).unwrap();
        jpeg.insert_after_header(Segment::new(APP1, vec![0; MAX_PAYLOAD + 1]));
        assert_eq!(
            jpeg.to_bytes(),
            Err(SegmentError::PayloadTooLarge(MAX_PAYLOAD + 1))
        );
    }

    #[test]
    fn parses_image_crate_output() {
        let img = image::RgbImage::from_pixel(16, 16, image::Rgb([200, 10, 10]));
        let mut buf = Vec::new();
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, 80)
            .encode_image(&img)
            .unwrap();

        let jpeg = JpegSegments::parse(&buf).unwrap();
        assert!(jpeg.find(SOS).is_some());
        assert_eq!(jpeg.to_bytes().unwrap(), buf);
    }
}
