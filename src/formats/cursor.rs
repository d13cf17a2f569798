//! Structured reader over a raw network blob.
//!
//! Every accessor returns a typed `Result`: truncation and signature
//! mismatches surface as [`NetworkFormatError`] instead of silent
//! out-of-bounds reads.

use crate::error::NetworkFormatError;

pub struct BlobCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BlobCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current read offset, for error reporting.
    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], NetworkFormatError> {
        if self.remaining() < n {
            return Err(NetworkFormatError::Truncated {
                offset: self.pos,
                needed: n - self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, NetworkFormatError> {
        Ok(self.take(1)?[0])
    }

    /// Reads one byte and requires it to equal `expected`.
    pub fn expect(&mut self, expected: u8, what: &'static str) -> Result<(), NetworkFormatError> {
        let offset = self.pos;
        let found = self.read_u8()?;
        if found != expected {
            return Err(NetworkFormatError::BadSignature {
                what,
                found,
                offset,
            });
        }
        Ok(())
    }

    pub fn read_u16(&mut self) -> Result<u16, NetworkFormatError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, NetworkFormatError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i32(&mut self) -> Result<i32, NetworkFormatError> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i64(&mut self) -> Result<i64, NetworkFormatError> {
        let b = self.take(8)?;
        Ok(i64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub fn read_f64(&mut self) -> Result<f64, NetworkFormatError> {
        let b = self.take(8)?;
        Ok(f64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], NetworkFormatError> {
        self.take(n)
    }

    /// Reads a u16-length-prefixed UTF-8 string.
    pub fn read_string(&mut self, what: &'static str) -> Result<String, NetworkFormatError> {
        let len = self.read_u16()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| NetworkFormatError::InvalidText { what })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_scalars_in_order() {
        let mut buf = Vec::new();
        buf.push(0x42u8);
        buf.extend_from_slice(&7u16.to_le_bytes());
        buf.extend_from_slice(&0xdead_beefu32.to_le_bytes());
        buf.extend_from_slice(&(-5i64).to_le_bytes());
        buf.extend_from_slice(&1.5f64.to_le_bytes());

        let mut cur = BlobCursor::new(&buf);
        assert_eq!(cur.read_u8().unwrap(), 0x42);
        assert_eq!(cur.read_u16().unwrap(), 7);
        assert_eq!(cur.read_u32().unwrap(), 0xdead_beef);
        assert_eq!(cur.read_i64().unwrap(), -5);
        assert_eq!(cur.read_f64().unwrap(), 1.5);
        assert_eq!(cur.remaining(), 0);
    }

    #[test]
    fn truncation_is_an_error_not_a_panic() {
        let buf = [0x01u8, 0x02];
        let mut cur = BlobCursor::new(&buf);
        cur.read_u8().unwrap();
        let err = cur.read_u32().unwrap_err();
        match err {
            NetworkFormatError::Truncated { offset, needed } => {
                assert_eq!(offset, 1);
                assert_eq!(needed, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn expect_reports_offset_and_found_byte() {
        let buf = [0xaau8];
        let mut cur = BlobCursor::new(&buf);
        let err = cur.expect(0xbb, "node").unwrap_err();
        match err {
            NetworkFormatError::BadSignature {
                what,
                found,
                offset,
            } => {
                assert_eq!(what, "node");
                assert_eq!(found, 0xaa);
                assert_eq!(offset, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
