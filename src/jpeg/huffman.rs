use crate::error::{PdfResult, RenderError};

use super::bit_reader::BitReader;

/// The class of a Huffman table: DC tables code coefficient categories,
/// AC tables code (run, size) pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableClass {
    Dc,
    Ac,
}

impl TableClass {
    pub fn from_id(id: u8) -> PdfResult<Self> {
        match id {
            0 => Ok(TableClass::Dc),
            1 => Ok(TableClass::Ac),
            _ => anyhow::bail!(RenderError::CorruptEntropyStream(format!(
                "invalid huffman table class {}",
                id
            ))),
        }
    }
}

/// A canonical Huffman decoder built from the 16 code-length counts and the
/// value list of a DHT segment
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    class: TableClass,
    /// Smallest code of each length, index 0 is length 1
    min_code: [i32; 16],
    /// Largest code of each length, -1 when the length is unused
    max_code: [i32; 16],
    /// Index into `values` of the first code of each length
    value_offset: [usize; 16],
    values: Vec<u8>,
}

impl HuffmanTable {
    pub fn new(class: TableClass, counts: &[u8; 16], values: Vec<u8>) -> PdfResult<Self> {
        let total: usize = counts.iter().map(|&c| c as usize).sum();

        if total != values.len() {
            anyhow::bail!(RenderError::CorruptEntropyStream(
                "huffman value count does not match code-length counts".to_owned(),
            ));
        }

        let mut min_code = [0i32; 16];
        let mut max_code = [-1i32; 16];
        let mut value_offset = [0usize; 16];

        let mut code = 0i32;
        let mut offset = 0usize;

        for length in 0..16 {
            let count = counts[length] as i32;

            if count > 0 {
                min_code[length] = code;
                max_code[length] = code + count - 1;
                value_offset[length] = offset;

                code += count;
                offset += count as usize;
            }

            code <<= 1;
        }

        Ok(Self {
            class,
            min_code,
            max_code,
            value_offset,
            values,
        })
    }

    pub fn class(&self) -> TableClass {
        self.class
    }

    /// Decode the next symbol from the reader
    pub fn decode(&self, reader: &mut BitReader) -> PdfResult<u8> {
        let mut code = 0i32;

        for length in 0..16 {
            code = (code << 1) | reader.read_bit() as i32;

            if self.max_code[length] >= code && code >= self.min_code[length] {
                let idx = self.value_offset[length] + (code - self.min_code[length]) as usize;
                return Ok(self.values[idx]);
            }
        }

        // an all-zero pad at the end of a truncated segment decodes as an
        // out-of-table code; the caller maps this to zero-filled blocks
        if reader.is_exhausted() {
            return Ok(0);
        }

        anyhow::bail!(RenderError::CorruptEntropyStream(
            "invalid huffman code".to_owned(),
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decodes_canonical_codes() {
        // codes: a = 0, b = 10, c = 110
        let mut counts = [0u8; 16];
        counts[0] = 1;
        counts[1] = 1;
        counts[2] = 1;

        let table =
            HuffmanTable::new(TableClass::Dc, &counts, vec![b'a', b'b', b'c']).unwrap();

        let mut reader = BitReader::new(&[0b0_10_110_00]);

        assert_eq!(table.decode(&mut reader).unwrap(), b'a');
        assert_eq!(table.decode(&mut reader).unwrap(), b'b');
        assert_eq!(table.decode(&mut reader).unwrap(), b'c');
    }

    #[test]
    fn mismatched_value_count_is_rejected() {
        let mut counts = [0u8; 16];
        counts[0] = 2;

        assert!(HuffmanTable::new(TableClass::Ac, &counts, vec![1]).is_err());
    }
}
