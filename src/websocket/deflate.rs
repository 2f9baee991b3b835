//! permessage-deflate payload transform (RFC 7692, §4.6 "Deflate path").
//!
//! Wraps `flate2`'s raw (no zlib header) `Compress`/`Decompress` engines
//! and the strip/append of the trailing empty-block marker RFC 7692
//! requires on the wire.

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress};

use super::error::Error;

/// The four bytes RFC 7692 strips from an outgoing compressed payload and
/// expects appended back before inflating an incoming one.
const EMPTY_BLOCK: [u8; 4] = [0x00, 0x00, 0xFF, 0xFF];

pub struct Deflater {
    compress: Compress,
    no_context_takeover: bool,
}

impl Deflater {
    pub fn new(no_context_takeover: bool) -> Deflater {
        Deflater { compress: Compress::new(Compression::default(), false), no_context_takeover }
    }

    /// Compress `data`, returning the RFC 7692 wire payload (the trailing
    /// empty block stripped). Resets the window afterward if
    /// no-context-takeover was negotiated.
    pub fn compress(&mut self, data: &[u8]) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        self.compress
            .compress_vec(data, &mut out, FlushCompress::Sync)
            .map_err(|_| Error::ExtensionNegotiationFailed("deflate compression failed"))?;
        if out.ends_with(&EMPTY_BLOCK) {
            out.truncate(out.len() - EMPTY_BLOCK.len());
        }
        if self.no_context_takeover {
            self.compress.reset();
        }
        Ok(out)
    }
}

pub struct Inflater {
    decompress: Decompress,
    no_context_takeover: bool,
}

impl Inflater {
    pub fn new(no_context_takeover: bool) -> Inflater {
        Inflater { decompress: Decompress::new(false), no_context_takeover }
    }

    /// Inflate an RFC 7692 wire payload: append the empty-block marker
    /// back, then run raw inflate over the whole input.
    pub fn decompress(&mut self, data: &[u8]) -> Result<Vec<u8>, Error> {
        let mut input = data.to_vec();
        input.extend_from_slice(&EMPTY_BLOCK);

        let mut out = Vec::new();
        self.decompress
            .decompress_vec(&input, &mut out, FlushDecompress::Sync)
            .map_err(|_| Error::ExtensionNegotiationFailed("deflate decompression failed"))?;
        if self.no_context_takeover {
            self.decompress.reset(false);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_through_deflate_and_inflate() {
        let mut deflater = Deflater::new(false);
        let mut inflater = Inflater::new(false);
        let payload = b"the quick brown fox jumps over the lazy dog, repeated, repeated, repeated";

        let compressed = deflater.compress(payload).unwrap();
        let restored = inflater.decompress(&compressed).unwrap();
        assert_eq!(restored, payload);
    }

    #[test]
    fn no_context_takeover_resets_between_messages() {
        let mut deflater = Deflater::new(true);
        let first = deflater.compress(b"hello world hello world").unwrap();
        let second = deflater.compress(b"hello world hello world").unwrap();
        assert_eq!(first, second);
    }
}
