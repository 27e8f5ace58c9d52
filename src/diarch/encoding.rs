//! # Embedded file encoding
//!
//! Records carry their file inline as a `data:` URL
//! (`data:application/pdf;base64,JVBERi0x...`). The payload is self-describing:
//! the media type travels with the bytes, so a record can be viewed or
//! downloaded without consulting anything else.
//!
//! Encoding reads the source in chunks and reports the fraction read after
//! each one, which is what drives the upload progress line in the CLI.
//! Base64 works on 3-byte groups, so every chunk is encoded up to the last
//! whole group and the remainder carried into the next read; the concatenated
//! output is identical to encoding the whole file at once.

use crate::error::{DiarchError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::io::{ErrorKind, Read};

const CHUNK_SIZE: usize = 64 * 1024;
const BASE64_MARKER: &str = ";base64,";

/// Reads `reader` to the end and returns it as a base64 `data:` URL.
///
/// `expected_len` is the size recorded when the file was selected; reading a
/// different number of bytes is a [`DiarchError::ReadError`], as is any I/O
/// failure. `on_progress` receives fractions in `[0, 1]`, ending with `1.0`.
pub fn encode_data_url<R: Read>(
    mut reader: R,
    media_type: &str,
    expected_len: u64,
    on_progress: &mut dyn FnMut(f64),
) -> Result<String> {
    let mut out = String::with_capacity(
        "data:".len() + media_type.len() + BASE64_MARKER.len() + encoded_len(expected_len),
    );
    out.push_str("data:");
    out.push_str(media_type);
    out.push_str(BASE64_MARKER);

    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut pending: Vec<u8> = Vec::with_capacity(CHUNK_SIZE + 2);
    let mut read_total: u64 = 0;

    on_progress(0.0);
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(DiarchError::ReadError(e.to_string())),
        };
        read_total += n as u64;
        if read_total > expected_len {
            return Err(DiarchError::ReadError(format!(
                "file grew while reading (expected {} bytes)",
                expected_len
            )));
        }

        pending.extend_from_slice(&buf[..n]);
        let whole = pending.len() - pending.len() % 3;
        STANDARD.encode_string(&pending[..whole], &mut out);
        pending.drain(..whole);

        on_progress(fraction(read_total, expected_len));
    }

    if !pending.is_empty() {
        STANDARD.encode_string(&pending, &mut out);
    }

    if read_total != expected_len {
        return Err(DiarchError::ReadError(format!(
            "expected {} bytes, read {}",
            expected_len, read_total
        )));
    }

    on_progress(1.0);
    Ok(out)
}

fn fraction(done: u64, total: u64) -> f64 {
    if total == 0 {
        1.0
    } else {
        (done as f64 / total as f64).min(1.0)
    }
}

fn encoded_len(raw_len: u64) -> usize {
    (raw_len.div_ceil(3) * 4) as usize
}

/// A parsed base64 `data:` URL, borrowing from the stored payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataUrl<'a> {
    media_type: &'a str,
    data: &'a str,
}

impl<'a> DataUrl<'a> {
    pub fn parse(raw: &'a str) -> Result<Self> {
        let rest = raw.strip_prefix("data:").ok_or_else(|| {
            DiarchError::InvalidPayload("payload is not an embedded data URL".to_string())
        })?;
        let marker = rest.find(BASE64_MARKER).ok_or_else(|| {
            DiarchError::InvalidPayload("data URL is not base64 encoded".to_string())
        })?;
        Ok(Self {
            media_type: &rest[..marker],
            data: &rest[marker + BASE64_MARKER.len()..],
        })
    }

    pub fn media_type(&self) -> &'a str {
        self.media_type
    }

    /// Size of the decoded content, computed from the encoded length alone.
    pub fn decoded_len(&self) -> Option<u64> {
        let len = self.data.len();
        if len % 4 != 0 {
            return None;
        }
        let padding = self.data.bytes().rev().take(2).filter(|b| *b == b'=').count();
        Some((len / 4 * 3 - padding) as u64)
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.data)
            .map_err(|e| DiarchError::InvalidPayload(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    /// Hands out at most `step` bytes per read to exercise chunk boundaries.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("disk on fire"))
        }
    }

    #[test]
    fn test_chunked_encoding_matches_one_shot() {
        let bytes: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
        let mut seen = Vec::new();
        let url = encode_data_url(
            Trickle {
                data: &bytes,
                step: 7,
            },
            "application/pdf",
            bytes.len() as u64,
            &mut |p| seen.push(p),
        )
        .unwrap();

        assert_eq!(
            url,
            format!("data:application/pdf;base64,{}", STANDARD.encode(&bytes))
        );
        assert_eq!(seen.first(), Some(&0.0));
        assert_eq!(seen.last(), Some(&1.0));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_short_read_is_a_read_error() {
        let result = encode_data_url(Cursor::new(vec![1u8; 10]), "application/pdf", 20, &mut |_| {});
        assert!(matches!(result, Err(DiarchError::ReadError(_))));
    }

    #[test]
    fn test_growing_file_is_a_read_error() {
        let result = encode_data_url(Cursor::new(vec![1u8; 30]), "application/pdf", 20, &mut |_| {});
        assert!(matches!(result, Err(DiarchError::ReadError(_))));
    }

    #[test]
    fn test_io_failure_is_a_read_error() {
        let result = encode_data_url(Broken, "application/pdf", 5, &mut |_| {});
        assert!(matches!(result, Err(DiarchError::ReadError(msg)) if msg.contains("disk on fire")));
    }

    #[test]
    fn test_empty_file_reports_complete() {
        let mut seen = Vec::new();
        let url =
            encode_data_url(Cursor::new(Vec::new()), "application/pdf", 0, &mut |p| seen.push(p))
                .unwrap();
        assert_eq!(url, "data:application/pdf;base64,");
        assert_eq!(seen.last(), Some(&1.0));
    }

    #[test]
    fn test_data_url_decodes_and_measures() {
        let bytes = b"%PDF-1.4 hello";
        let raw = format!("data:application/pdf;base64,{}", STANDARD.encode(bytes));
        let url = DataUrl::parse(&raw).unwrap();

        assert_eq!(url.media_type(), "application/pdf");
        assert_eq!(url.decoded_len(), Some(bytes.len() as u64));
        assert_eq!(url.decode().unwrap(), bytes);
    }

    #[test]
    fn test_blob_urls_are_not_embedded_payloads() {
        assert!(DataUrl::parse("blob:http://localhost/1234").is_err());
        assert!(DataUrl::parse("data:application/pdf,plain").is_err());
    }
}
