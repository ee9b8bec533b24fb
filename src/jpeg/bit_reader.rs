use crate::error::{PdfResult, RenderError};

/// Entropy-coded-segment bit reader.
///
/// Buffers up to 64 bits over a raw byte slice, consuming `FF 00` byte
/// stuffing transparently. A marker byte encountered while filling stops
/// the fill; subsequent reads are padded with zero bits, which lets a
/// truncated entropy segment decode to zero-filled blocks instead of
/// erroring mid-band
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    cursor: usize,
    bit_buffer: u64,
    bit_count: u32,
    /// Set when the fill loop runs out of real bits (marker or end of data)
    exhausted: bool,
}

/// Captured reader position, used to resume decoding between bands
#[derive(Debug, Clone, Copy)]
pub struct BitReaderState {
    cursor: usize,
    bit_buffer: u64,
    bit_count: u32,
    exhausted: bool,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            cursor: 0,
            bit_buffer: 0,
            bit_count: 0,
            exhausted: false,
        }
    }

    pub fn capture(&self) -> BitReaderState {
        BitReaderState {
            cursor: self.cursor,
            bit_buffer: self.bit_buffer,
            bit_count: self.bit_count,
            exhausted: self.exhausted,
        }
    }

    pub fn resume(&mut self, state: BitReaderState) {
        self.cursor = state.cursor;
        self.bit_buffer = state.bit_buffer;
        self.bit_count = state.bit_count;
        self.exhausted = state.exhausted;
    }

    /// Whether the underlying segment ran out before satisfying a read
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// True when no buffered bits remain and the underlying data holds
    /// nothing but an end-of-image marker (or nothing at all). Restart
    /// markers do not end the data; they are consumed by
    /// [Self::try_read_marker]
    pub fn at_end_of_data(&self) -> bool {
        if self.bit_count > 0 {
            return false;
        }

        match self.data.get(self.cursor) {
            None => true,
            Some(&0xFF) => {
                let mut cursor = self.cursor;
                while self.data.get(cursor) == Some(&0xFF) {
                    cursor += 1;
                }

                matches!(self.data.get(cursor), None | Some(&0xD9))
            }
            Some(..) => false,
        }
    }

    fn fill(&mut self) {
        while self.bit_count <= 56 {
            let byte = match self.data.get(self.cursor) {
                Some(&b) => b,
                None => {
                    self.exhausted = true;
                    return;
                }
            };

            if byte == 0xFF {
                match self.data.get(self.cursor + 1) {
                    // stuffed 0xFF data byte
                    Some(0x00) => {
                        self.cursor += 2;
                    }
                    // a real marker terminates the entropy segment
                    Some(..) | None => {
                        self.exhausted = true;
                        return;
                    }
                }
            } else {
                self.cursor += 1;
            }

            self.bit_buffer |= u64::from(byte) << (56 - self.bit_count);
            self.bit_count += 8;
        }
    }

    pub fn peek8(&mut self) -> u8 {
        self.fill();
        (self.bit_buffer >> 56) as u8
    }

    pub fn peek16(&mut self) -> u16 {
        self.fill();
        (self.bit_buffer >> 48) as u16
    }

    pub fn consume(&mut self, n: u32) {
        let n = n.min(self.bit_count);
        self.bit_buffer <<= n;
        self.bit_count -= n;
    }

    /// Read `n` bits MSB-first. Bits past the end of the segment read as 0
    pub fn read(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }

        debug_assert!(n <= 32);

        self.fill();

        let value = (self.bit_buffer >> (64 - n)) as u32;
        self.consume(n);
        value
    }

    pub fn read_bit(&mut self) -> u32 {
        self.read(1)
    }

    /// Read an `n`-bit magnitude and sign-extend it per the JPEG `Extend`
    /// procedure: values below 2^(n-1) map to the negative range
    pub fn read_signed(&mut self, n: u32) -> i32 {
        if n == 0 {
            return 0;
        }

        let value = self.read(n) as i32;

        if value < (1 << (n - 1)) {
            value - (1 << n) + 1
        } else {
            value
        }
    }

    /// Discard buffered bits so the reader points at a byte boundary in the
    /// underlying data
    pub fn byte_align(&mut self) {
        // everything in the buffer came from whole bytes, so dropping the
        // partial byte realigns the buffer; the cursor is already aligned
        let partial = self.bit_count % 8;
        self.consume(partial);

        // rewind the cursor over whole buffered bytes, accounting for byte
        // stuffing is unnecessary here: buffered whole bytes are simply
        // dropped and re-read
        let buffered_bytes = (self.bit_count / 8) as usize;
        self.bit_buffer = 0;
        self.bit_count = 0;
        self.cursor = self.rewind_over(buffered_bytes);
    }

    /// Walk the cursor backwards over `count` entropy bytes, skipping the
    /// 0x00 halves of stuffed pairs
    fn rewind_over(&self, mut count: usize) -> usize {
        let mut cursor = self.cursor;

        while count > 0 && cursor > 0 {
            cursor -= 1;

            // the 0x00 of a stuffed FF 00 pair is not an entropy byte
            if self.data[cursor] == 0x00 && cursor > 0 && self.data[cursor - 1] == 0xFF {
                cursor -= 1;
            }

            count -= 1;
        }

        cursor
    }

    /// After alignment, consume and return a marker code (`FF xx`). Returns
    /// `None` when the next bytes are not a marker
    pub fn try_read_marker(&mut self) -> Option<u8> {
        debug_assert_eq!(self.bit_count, 0);

        // fill bytes: markers may be preceded by any number of FF bytes
        let mut cursor = self.cursor;

        if self.data.get(cursor) != Some(&0xFF) {
            return None;
        }

        while self.data.get(cursor) == Some(&0xFF) {
            cursor += 1;
        }

        match self.data.get(cursor) {
            Some(&code) if code != 0x00 => {
                self.cursor = cursor + 1;
                self.exhausted = false;
                Some(code)
            }
            _ => None,
        }
    }

    pub fn expect_marker(&mut self) -> PdfResult<u8> {
        self.try_read_marker().ok_or_else(|| {
            anyhow::anyhow!(RenderError::CorruptEntropyStream(
                "expected marker".to_owned(),
            ))
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reads_msb_first() {
        let mut reader = BitReader::new(&[0b1011_0001, 0b1000_0000]);

        assert_eq!(reader.read(1), 1);
        assert_eq!(reader.read(3), 0b011);
        assert_eq!(reader.read(5), 0b0001_1);
    }

    #[test]
    fn unstuffs_ff00() {
        let mut reader = BitReader::new(&[0xFF, 0x00, 0xAB]);

        assert_eq!(reader.read(8), 0xFF);
        assert_eq!(reader.read(8), 0xAB);
    }

    #[test]
    fn marker_stops_fill_and_pads_with_zeros() {
        let mut reader = BitReader::new(&[0x80, 0xFF, 0xD9]);

        assert_eq!(reader.read(8), 0x80);
        assert_eq!(reader.read(8), 0x00);
        assert!(reader.is_exhausted());
    }

    #[test]
    fn byte_align_then_marker() {
        let mut reader = BitReader::new(&[0b1010_0000, 0xFF, 0xD0, 0x55]);

        assert_eq!(reader.read(3), 0b101);
        reader.byte_align();
        assert_eq!(reader.try_read_marker(), Some(0xD0));
        assert_eq!(reader.read(8), 0x55);
    }

    #[test]
    fn read_signed_extends_negative_range() {
        // 2-bit magnitude 01 is -2, 11 is 3
        let mut reader = BitReader::new(&[0b0111_0000]);

        assert_eq!(reader.read_signed(2), -2);
        assert_eq!(reader.read_signed(2), 3);
    }

    #[test]
    fn capture_resume_round_trips() {
        let mut reader = BitReader::new(&[0xDE, 0xAD, 0xBE, 0xEF]);

        assert_eq!(reader.read(4), 0xD);
        let state = reader.capture();
        assert_eq!(reader.read(8), 0xEA);

        reader.resume(state);
        assert_eq!(reader.read(8), 0xEA);
        assert_eq!(reader.read(4), 0xD);
    }
}
