use std::{borrow::Cow, io::Read};

use flate2::read::ZlibDecoder;

use crate::error::PdfResult;

/// <https://www.adobe.com/content/dam/acom/en/devnet/postscript/pdfs/TN5603.Filters.pdf>
#[derive(Debug, FromObj)]
pub struct FlateDecoderParams {
    /// The default value is 1 (Predictor::Unused)
    #[field("Predictor", default = Predictor::Unused)]
    pub predictor: Predictor,

    /// Specifies the number of samples in the sampled row.
    ///
    /// The value of this key only has an effect on the filter if
    /// the value of `predictor` is greater than 1.
    ///
    /// The default value is 1
    #[field("Columns", default = 1)]
    pub columns: u32,

    /// Specifies the number of interleaved color components in a sample.
    ///
    /// The value of this key only has an effect on the filter if
    /// the value of `predictor` is greater than 1
    ///
    /// The default value is 1
    #[field("Colors", default = 1)]
    pub colors: u32,

    /// The number of bits used to represent each component.
    ///
    /// The possible values are 1, 2, 4, 8, and 16
    ///
    /// The default value is 8
    #[field("BitsPerComponent", default = BitsPerComponent::Eight)]
    pub bits_per_component: BitsPerComponent,
}

impl FlateDecoderParams {
    const fn bits_per_pixel(&self) -> u32 {
        self.colors * self.bits_per_component as u32
    }

    /// Bytes spanned by one pixel, rounded up to at least one whole byte.
    /// This is the lookback distance of the horizontal filters
    pub const fn bytes_per_pixel(&self) -> usize {
        let bytes = (self.bits_per_pixel() + 7) / 8;
        if bytes == 0 {
            1
        } else {
            bytes as usize
        }
    }

    pub const fn bytes_per_row(&self) -> usize {
        ((self.bits_per_pixel() * self.columns + 7) / 8) as usize
    }
}

#[pdf_enum(Integer)]
pub enum Predictor {
    /// No prediction is applied *and* no tag byte precedes each row
    Unused = 1,

    /// Horizontal differencing on samples, with no tag byte
    Tiff = 2,

    /// No filter is applied
    None = 10,

    /// The pixel is subtracted by the pixel to the left of it
    Sub = 11,

    /// The pixel is subtracted by the pixel above it
    Up = 12,

    /// The pixel is subtracted by the average of the pixel to the left and above
    Average = 13,

    /// The pixel is subtracted by the pixel that comes out of a prediction algorithm
    Paeth = 14,

    /// A hybrid of all 4
    Optimum = 15,
}

impl Predictor {
    pub fn is_png(self) -> bool {
        matches!(
            self,
            Predictor::None
                | Predictor::Sub
                | Predictor::Up
                | Predictor::Average
                | Predictor::Paeth
                | Predictor::Optimum
        )
    }
}

#[pdf_enum(Integer)]
pub enum BitsPerComponent {
    One = 1,
    Two = 2,
    Four = 4,
    Eight = 8,
    Sixteen = 16,
}

#[derive(Debug)]
pub struct FlateDecoder {
    params: FlateDecoderParams,
    buffer: Vec<u8>,
}

impl FlateDecoder {
    pub fn new(buffer: Cow<[u8]>, params: FlateDecoderParams) -> PdfResult<Self> {
        let mut decoder = ZlibDecoder::new(&*buffer);
        let mut buffer = Vec::new();
        decoder.read_to_end(&mut buffer)?;

        Ok(Self { buffer, params })
    }

    pub fn decode(self) -> PdfResult<Vec<u8>> {
        reverse_predictor(self.buffer, &self.params)
    }
}

pub(crate) fn reverse_predictor(buffer: Vec<u8>, params: &FlateDecoderParams) -> PdfResult<Vec<u8>> {
    match params.predictor {
        Predictor::Unused => Ok(buffer),
        Predictor::Tiff => Ok(reverse_tiff(buffer, params)),
        _ => {
            let mut reader = PngPredictorReader::new(&buffer, params);
            let mut out = Vec::with_capacity(buffer.len());

            while let Some(row) = reader.next_row()? {
                out.extend_from_slice(row);
            }

            Ok(out)
        }
    }
}

/// Streaming PNG filter reversal.
///
/// Each encoded row is one filter-tag byte followed by `bytes_per_row`
/// bytes. Current and previous rows carry a zeroed left margin of
/// `bytes_per_pixel` bytes so the horizontal filters never branch on the
/// first pixel
pub(crate) struct PngPredictorReader<'a> {
    data: &'a [u8],
    cursor: usize,
    bytes_per_row: usize,
    bytes_per_pixel: usize,
    row: Vec<u8>,
    prev_row: Vec<u8>,
}

impl<'a> PngPredictorReader<'a> {
    pub fn new(data: &'a [u8], params: &FlateDecoderParams) -> Self {
        let bytes_per_row = params.bytes_per_row();
        let bytes_per_pixel = params.bytes_per_pixel();

        Self {
            data,
            cursor: 0,
            bytes_per_row,
            bytes_per_pixel,
            row: vec![0; bytes_per_pixel + bytes_per_row],
            prev_row: vec![0; bytes_per_pixel + bytes_per_row],
        }
    }

    pub fn next_row(&mut self) -> PdfResult<Option<&[u8]>> {
        if self.cursor >= self.data.len() {
            return Ok(None);
        }

        let filter = PngFilter::from_tag(self.data[self.cursor])?;
        self.cursor += 1;

        let available = (self.data.len() - self.cursor).min(self.bytes_per_row);
        let margin = self.bytes_per_pixel;

        std::mem::swap(&mut self.row, &mut self.prev_row);

        self.row[margin..margin + available]
            .copy_from_slice(&self.data[self.cursor..self.cursor + available]);
        // a short final row is padded with zeros
        self.row[margin + available..].fill(0);
        self.cursor += available;

        let bpp = self.bytes_per_pixel;

        for i in margin..margin + self.bytes_per_row {
            let x = self.row[i];
            let a = self.row[i - bpp];
            let b = self.prev_row[i];
            let c = self.prev_row[i - bpp];

            self.row[i] = match filter {
                PngFilter::None => x,
                PngFilter::Sub => x.wrapping_add(a),
                PngFilter::Up => x.wrapping_add(b),
                PngFilter::Average => {
                    x.wrapping_add(((u16::from(a) + u16::from(b)) / 2) as u8)
                }
                PngFilter::Paeth => x.wrapping_add(paeth_predictor(a, b, c)),
            };
        }

        Ok(Some(&self.row[margin..]))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PngFilter {
    None,
    Sub,
    Up,
    Average,
    Paeth,
}

impl PngFilter {
    fn from_tag(tag: u8) -> PdfResult<Self> {
        Ok(match tag {
            0 => PngFilter::None,
            1 => PngFilter::Sub,
            2 => PngFilter::Up,
            3 => PngFilter::Average,
            4 => PngFilter::Paeth,
            _ => anyhow::bail!("invalid png filter tag: {}", tag),
        })
    }
}

fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    let p = i16::from(a) + i16::from(b) - i16::from(c);
    let pa = (p - i16::from(a)).abs();
    let pb = (p - i16::from(b)).abs();
    let pc = (p - i16::from(c)).abs();

    // order here for ties is important
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// TIFF predictor 2: horizontal differencing on samples.
///
/// 8-bit samples difference bytewise with a stride of `colors`; 16-bit
/// samples difference with a 2-byte stride; sub-byte packings are reversed
/// in packed form, accumulating modulo 2^bits
fn reverse_tiff(mut buffer: Vec<u8>, params: &FlateDecoderParams) -> Vec<u8> {
    let bytes_per_row = params.bytes_per_row();
    let colors = params.colors as usize;

    if bytes_per_row == 0 {
        return buffer;
    }

    match params.bits_per_component {
        BitsPerComponent::Eight => {
            for row in buffer.chunks_mut(bytes_per_row) {
                for i in colors..row.len() {
                    row[i] = row[i].wrapping_add(row[i - colors]);
                }
            }
        }
        BitsPerComponent::Sixteen => {
            for row in buffer.chunks_mut(bytes_per_row) {
                let stride = colors * 2;
                let mut i = stride;
                while i + 1 < row.len() {
                    let prev = u16::from_be_bytes([row[i - stride], row[i - stride + 1]]);
                    let cur = u16::from_be_bytes([row[i], row[i + 1]]);
                    let sum = cur.wrapping_add(prev);
                    row[i] = (sum >> 8) as u8;
                    row[i + 1] = sum as u8;
                    i += 2;
                }
            }
        }
        bits => {
            let bits = bits as u32;
            let mask = (1u16 << bits) - 1;
            let samples_per_row = (params.columns as usize) * colors;

            for row in buffer.chunks_mut(bytes_per_row) {
                // running window of the previous `colors` samples
                let mut prev = vec![0u16; colors];

                for sample_idx in 0..samples_per_row {
                    let bit_pos = sample_idx * bits as usize;
                    let byte_idx = bit_pos / 8;
                    let shift = 8 - bits as usize - (bit_pos % 8);

                    if byte_idx >= row.len() {
                        break;
                    }

                    let raw = (u16::from(row[byte_idx]) >> shift) & mask;
                    let channel = sample_idx % colors;
                    let value = (raw + prev[channel]) & mask;
                    prev[channel] = value;

                    row[byte_idx] &= !((mask as u8) << shift);
                    row[byte_idx] |= (value as u8) << shift;
                }
            }
        }
    }

    buffer
}

#[cfg(test)]
mod test {
    use super::*;

    fn params(predictor: Predictor, columns: u32, colors: u32, bits: BitsPerComponent) -> FlateDecoderParams {
        FlateDecoderParams {
            predictor,
            columns,
            colors,
            bits_per_component: bits,
        }
    }

    /// The forward direction of the PNG filters, used to check the
    /// undo-applied-filter round trip
    fn apply_png_filter(
        filter: PngFilter,
        row: &[u8],
        prev_row: &[u8],
        bpp: usize,
    ) -> Vec<u8> {
        let at = |buf: &[u8], i: isize| -> u8 {
            if i < 0 {
                0
            } else {
                buf[i as usize]
            }
        };

        row.iter()
            .enumerate()
            .map(|(i, &x)| {
                let a = at(row, i as isize - bpp as isize);
                let b = prev_row[i];
                let c = at(prev_row, i as isize - bpp as isize);

                match filter {
                    PngFilter::None => x,
                    PngFilter::Sub => x.wrapping_sub(a),
                    PngFilter::Up => x.wrapping_sub(b),
                    PngFilter::Average => {
                        x.wrapping_sub(((u16::from(a) + u16::from(b)) / 2) as u8)
                    }
                    PngFilter::Paeth => x.wrapping_sub(paeth_predictor(a, b, c)),
                }
            })
            .collect()
    }

    #[test]
    fn png_filters_round_trip() {
        let rows: [&[u8]; 3] = [
            &[10, 20, 30, 40, 50, 60],
            &[15, 25, 35, 45, 55, 65],
            &[0, 255, 128, 7, 255, 0],
        ];
        let bpp = 3;

        for (tag, filter) in [
            (0, PngFilter::None),
            (1, PngFilter::Sub),
            (2, PngFilter::Up),
            (3, PngFilter::Average),
            (4, PngFilter::Paeth),
        ] {
            let mut encoded = Vec::new();
            let mut prev: Vec<u8> = vec![0; rows[0].len()];

            for row in rows {
                encoded.push(tag);
                encoded.extend(apply_png_filter(filter, row, &prev, bpp));
                prev = row.to_vec();
            }

            let decoded = reverse_predictor(
                encoded,
                &params(Predictor::Optimum, 2, 3, BitsPerComponent::Eight),
            )
            .unwrap();

            let expected: Vec<u8> = rows.iter().flat_map(|r| r.iter().copied()).collect();
            assert_eq!(decoded, expected, "filter {:?}", filter);
        }
    }

    #[test]
    fn tiff_differencing_8_bit() {
        // rgb pixels (10, 20, 30), (11, 22, 33) differenced to
        // (10, 20, 30), (1, 2, 3)
        let encoded = vec![10, 20, 30, 1, 2, 3];
        let decoded = reverse_predictor(
            encoded,
            &params(Predictor::Tiff, 2, 3, BitsPerComponent::Eight),
        )
        .unwrap();

        assert_eq!(decoded, vec![10, 20, 30, 11, 22, 33]);
    }

    #[test]
    fn tiff_differencing_16_bit() {
        // gray samples 0x0102, 0x0304 differenced to 0x0102, 0x0202
        let encoded = vec![0x01, 0x02, 0x02, 0x02];
        let decoded = reverse_predictor(
            encoded,
            &params(Predictor::Tiff, 2, 1, BitsPerComponent::Sixteen),
        )
        .unwrap();

        assert_eq!(decoded, vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn tiff_differencing_packed_4_bit() {
        // gray samples 3, 5, 2, 1 differenced to 3, 2, 13, 15 (mod 16),
        // packed two to a byte
        let encoded = vec![0x32, 0xDF];
        let decoded = reverse_predictor(
            encoded,
            &params(Predictor::Tiff, 4, 1, BitsPerComponent::Four),
        )
        .unwrap();

        assert_eq!(decoded, vec![0x35, 0x21]);
    }

    #[test]
    fn short_final_row_is_zero_padded() {
        // two columns of rgb8 but the final row is truncated mid-pixel
        let encoded = vec![0, 1, 2, 3, 4, 5, 6, 0, 9];
        let decoded = reverse_predictor(
            encoded,
            &params(Predictor::None, 2, 3, BitsPerComponent::Eight),
        )
        .unwrap();

        assert_eq!(decoded, vec![1, 2, 3, 4, 5, 6, 9, 0, 0, 0, 0, 0]);
    }
}
