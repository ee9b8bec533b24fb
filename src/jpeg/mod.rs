/*!

Streaming baseline JPEG decoder.

Decoding is band-by-band: one band is one MCU row, produced lazily as rows
are pulled. Only the current band's component planes are resident; large
images never materialize whole.

The decoder handles baseline DCT frames (SOF0) only. Progressive,
lossless, and arithmetic frames are rejected up front with
[UnsupportedFrame] so the caller can fail fast or route to a host decoder.

*/

use crate::error::{PdfResult, RenderError};

pub use bit_reader::{BitReader, BitReaderState};
pub use huffman::{HuffmanTable, TableClass};

mod bit_reader;
mod huffman;
mod idct;

mod marker {
    pub const SOI: u8 = 0xD8;
    pub const EOI: u8 = 0xD9;
    pub const SOS: u8 = 0xDA;
    pub const DQT: u8 = 0xDB;
    pub const DHT: u8 = 0xC4;
    pub const DRI: u8 = 0xDD;
    pub const SOF0: u8 = 0xC0;
    pub const APP0: u8 = 0xE0;
    pub const APP14: u8 = 0xEE;
    pub const APP15: u8 = 0xEF;
    pub const COM: u8 = 0xFE;
    pub const RST0: u8 = 0xD0;
    pub const RST7: u8 = 0xD7;
}

/// Zigzag scan position -> natural (row-major) position
const ZIGZAG: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27,
    20, 13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58,
    59, 52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

/// A frame type this decoder does not implement (progressive, lossless,
/// arithmetic, hierarchical). Callers may route these to a host decoder
#[derive(Debug)]
pub struct UnsupportedFrame(pub u8);

impl std::fmt::Display for UnsupportedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unsupported jpeg frame type (SOF{})", self.0 & 0x0F)
    }
}

impl std::error::Error for UnsupportedFrame {}

#[derive(Debug, Clone, Copy)]
struct Component {
    id: u8,
    h: u8,
    v: u8,
    quant_id: u8,
    dc_table: u8,
    ac_table: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorModel {
    Gray,
    Rgb,
    YCbCr,
    /// Raw 4-channel CMYK, no transform
    Cmyk,
    /// YCbCr-transformed CMY plus black; converted back to CMYK here, with
    /// CMYK to RGB left to the color pipeline
    Ycck,
}

/// A fully decoded image, as produced by [JpegDecoder::decode_to_vec].
/// `data` holds rows at a stride of `width * components`
#[derive(Debug, Clone)]
pub struct DecodedJpeg {
    pub width: u32,
    pub height: u32,
    pub components: usize,
    pub data: Vec<u8>,
}

#[derive(Debug)]
pub struct JpegDecoder<'a> {
    width: u32,
    height: u32,
    components: Vec<Component>,
    quant_tables: [Option<Box<[u16; 64]>>; 4],
    dc_tables: [Option<HuffmanTable>; 4],
    ac_tables: [Option<HuffmanTable>; 4],
    restart_interval: u32,
    color: ColorModel,

    reader: BitReader<'a>,

    h_max: u8,
    v_max: u8,
    mcus_per_row: usize,
    mcu_rows: usize,

    /// One plane per component at component resolution, holding the current
    /// band. Plane width is `mcus_per_row * 8 * h`; height is `8 * v`
    planes: Vec<Vec<u8>>,
    plane_widths: Vec<usize>,

    dc_predictors: [i32; 4],
    mcus_decoded: usize,
    expected_rst: Option<u8>,
    entropy_done: bool,

    next_band: usize,
    row_in_band: usize,
    rows_emitted: u32,
}

impl<'a> JpegDecoder<'a> {
    pub fn new(data: &'a [u8]) -> PdfResult<Self> {
        HeaderParser::new(data).parse()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Bytes per output row
    pub fn row_stride(&self) -> usize {
        self.width as usize * self.components.len()
    }

    /// Decode the next output row into `out`, which must hold
    /// [Self::row_stride] bytes. Returns `false` when no more rows are
    /// available
    pub fn read_row(&mut self, out: &mut [u8]) -> PdfResult<bool> {
        if self.rows_emitted >= self.height {
            return Ok(false);
        }

        let band_height = 8 * self.v_max as usize;

        if self.next_band == 0 || self.row_in_band >= band_height {
            if self.next_band >= self.mcu_rows {
                return Ok(false);
            }

            self.decode_band()?;
            self.next_band += 1;
            self.row_in_band = 0;
        }

        self.emit_row(self.row_in_band, out);
        self.row_in_band += 1;
        self.rows_emitted += 1;

        Ok(true)
    }

    /// Run the band loop to completion
    pub fn decode_to_vec(mut self) -> PdfResult<DecodedJpeg> {
        let stride = self.row_stride();
        let mut data = vec![0; stride * self.height as usize];

        for row in data.chunks_exact_mut(stride) {
            if !self.read_row(row)? {
                break;
            }
        }

        Ok(DecodedJpeg {
            width: self.width,
            height: self.height,
            components: self.components.len(),
            data,
        })
    }

    fn decode_band(&mut self) -> PdfResult<()> {
        for mcu in 0..self.mcus_per_row {
            if self.restart_interval > 0
                && self.mcus_decoded > 0
                && self.mcus_decoded % self.restart_interval as usize == 0
            {
                self.handle_restart()?;
            }

            if self.entropy_done || self.reader.at_end_of_data() {
                // a short entropy segment zero-fills the remaining rows
                self.zero_fill_from(mcu);
                self.entropy_done = true;
                return Ok(());
            }

            self.decode_mcu(mcu)?;
            self.mcus_decoded += 1;
        }

        Ok(())
    }

    fn zero_fill_from(&mut self, mcu: usize) {
        for (ci, plane) in self.planes.iter_mut().enumerate() {
            let comp = self.components[ci];
            let x0 = mcu * 8 * comp.h as usize;
            let width = self.plane_widths[ci];

            for row in plane.chunks_exact_mut(width) {
                row[x0..].fill(0);
            }
        }
    }

    fn decode_mcu(&mut self, mcu: usize) -> PdfResult<()> {
        for ci in 0..self.components.len() {
            let comp = self.components[ci];

            for by in 0..comp.v as usize {
                for bx in 0..comp.h as usize {
                    let mut block = [0i32; 64];
                    self.decode_block(ci, &mut block)?;

                    let mut samples = [0u8; 64];
                    idct::inverse_dct(&block, &mut samples);

                    let x0 = (mcu * comp.h as usize + bx) * 8;
                    let y0 = by * 8;
                    let width = self.plane_widths[ci];

                    for y in 0..8 {
                        let dst = (y0 + y) * width + x0;
                        self.planes[ci][dst..dst + 8]
                            .copy_from_slice(&samples[y * 8..y * 8 + 8]);
                    }
                }
            }
        }

        Ok(())
    }

    /// Decode one block's DC delta and run-length-coded AC coefficients,
    /// dequantize, and store in natural order
    fn decode_block(&mut self, ci: usize, block: &mut [i32; 64]) -> PdfResult<()> {
        let comp = self.components[ci];

        let dc_table = self.dc_tables[comp.dc_table as usize]
            .as_ref()
            .ok_or_else(|| corrupt("missing dc huffman table"))?;
        let ac_table = self.ac_tables[comp.ac_table as usize]
            .as_ref()
            .ok_or_else(|| corrupt("missing ac huffman table"))?;
        let quant = self.quant_tables[comp.quant_id as usize]
            .as_ref()
            .ok_or_else(|| corrupt("missing quantization table"))?;

        let category = dc_table.decode(&mut self.reader)?;
        let diff = self.reader.read_signed(category as u32);

        self.dc_predictors[ci] += diff;
        block[0] = self.dc_predictors[ci] * quant[0] as i32;

        let mut k = 1;

        while k < 64 {
            let run_size = ac_table.decode(&mut self.reader)?;
            let run = (run_size >> 4) as usize;
            let size = (run_size & 0x0F) as u32;

            if size == 0 {
                if run == 15 {
                    // ZRL: sixteen zero coefficients
                    k += 16;
                    continue;
                }

                // EOB
                break;
            }

            k += run;

            if k >= 64 {
                anyhow::bail!(corrupt("ac coefficient run past end of block"));
            }

            let value = self.reader.read_signed(size);
            block[ZIGZAG[k]] = value * quant[k] as i32;
            k += 1;
        }

        Ok(())
    }

    fn handle_restart(&mut self) -> PdfResult<()> {
        self.reader.byte_align();

        let found = self
            .reader
            .try_read_marker()
            .ok_or_else(|| corrupt("missing restart marker"))?;

        if !(marker::RST0..=marker::RST7).contains(&found) {
            anyhow::bail!(corrupt(&format!(
                "expected restart marker, found {:#04x}",
                found
            )));
        }

        match self.expected_rst {
            // the first marker seen sets the cycle
            None => {}
            Some(expected) if expected == found => {}
            Some(expected) => anyhow::bail!(corrupt(&format!(
                "restart marker out of sequence: expected {:#04x}, found {:#04x}",
                expected, found
            ))),
        }

        self.expected_rst = Some(marker::RST0 + ((found - marker::RST0 + 1) % 8));
        self.dc_predictors = [0; 4];

        Ok(())
    }

    /// Write one output row from the current band's planes, upsampling
    /// subsampled components by nearest neighbor and applying the color
    /// model
    fn emit_row(&self, y_in_band: usize, out: &mut [u8]) {
        let ncomp = self.components.len();
        let width = self.width as usize;

        let mut samples = [0u8; 4];

        for x in 0..width {
            for ci in 0..ncomp {
                let comp = self.components[ci];
                let y_c = y_in_band * comp.v as usize / self.v_max as usize;
                let x_c = x * comp.h as usize / self.h_max as usize;
                samples[ci] = self.planes[ci][y_c * self.plane_widths[ci] + x_c];
            }

            let dst = &mut out[x * ncomp..x * ncomp + ncomp];

            match self.color {
                ColorModel::Gray | ColorModel::Rgb | ColorModel::Cmyk => {
                    dst.copy_from_slice(&samples[..ncomp]);
                }
                ColorModel::YCbCr => {
                    let [r, g, b] = ycbcr_to_rgb(samples[0], samples[1], samples[2]);
                    dst.copy_from_slice(&[r, g, b]);
                }
                ColorModel::Ycck => {
                    let [r, g, b] = ycbcr_to_rgb(samples[0], samples[1], samples[2]);
                    dst.copy_from_slice(&[255 - r, 255 - g, 255 - b, samples[3]]);
                }
            }
        }
    }
}

fn corrupt(why: &str) -> anyhow::Error {
    anyhow::anyhow!(RenderError::CorruptEntropyStream(why.to_owned()))
}

fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> [u8; 3] {
    let y = y as f32;
    let cb = cb as f32 - 128.0;
    let cr = cr as f32 - 128.0;

    let r = y + 1.402 * cr;
    let g = y - 0.344136 * cb - 0.714136 * cr;
    let b = y + 1.772 * cb;

    [
        (r + 0.5).clamp(0.0, 255.0) as u8,
        (g + 0.5).clamp(0.0, 255.0) as u8,
        (b + 0.5).clamp(0.0, 255.0) as u8,
    ]
}

fn gcd(a: u8, b: u8) -> u8 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

struct HeaderParser<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> HeaderParser<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, cursor: 0 }
    }

    fn next(&mut self) -> PdfResult<u8> {
        let byte = *self
            .data
            .get(self.cursor)
            .ok_or_else(|| corrupt("unexpected end of jpeg header"))?;
        self.cursor += 1;
        Ok(byte)
    }

    fn next_u16(&mut self) -> PdfResult<u16> {
        let hi = self.next()?;
        let lo = self.next()?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    /// Read a segment length and return the payload size. The length field
    /// includes its own two bytes
    fn payload_len(&mut self) -> PdfResult<usize> {
        let len = self.next_u16()? as usize;

        if len < 2 {
            anyhow::bail!(corrupt("segment length shorter than its own field"));
        }

        Ok(len - 2)
    }

    fn next_marker(&mut self) -> PdfResult<u8> {
        loop {
            let byte = self.next()?;
            if byte != 0xFF {
                continue;
            }

            let code = self.next()?;
            if code != 0x00 && code != 0xFF {
                return Ok(code);
            }
        }
    }

    fn parse(mut self) -> PdfResult<JpegDecoder<'a>> {
        if self.next_marker()? != marker::SOI {
            anyhow::bail!(corrupt("missing SOI marker"));
        }

        let mut frame: Option<(u32, u32, Vec<Component>)> = None;
        let mut quant_tables: [Option<Box<[u16; 64]>>; 4] = [None, None, None, None];
        let mut dc_tables: [Option<HuffmanTable>; 4] = [None, None, None, None];
        let mut ac_tables: [Option<HuffmanTable>; 4] = [None, None, None, None];
        let mut restart_interval = 0u32;
        let mut adobe_transform: Option<u8> = None;

        loop {
            let code = self.next_marker()?;

            match code {
                marker::SOF0 => {
                    let _len = self.next_u16()?;
                    let precision = self.next()?;

                    if precision != 8 {
                        anyhow::bail!(UnsupportedFrame(code));
                    }

                    let height = self.next_u16()? as u32;
                    let width = self.next_u16()? as u32;
                    let ncomp = self.next()? as usize;

                    if ncomp == 0 || ncomp > 4 || width == 0 || height == 0 {
                        anyhow::bail!(corrupt("invalid frame header"));
                    }

                    let mut components = Vec::with_capacity(ncomp);
                    for _ in 0..ncomp {
                        let id = self.next()?;
                        let hv = self.next()?;
                        let quant_id = self.next()?;

                        components.push(Component {
                            id,
                            h: hv >> 4,
                            v: hv & 0x0F,
                            quant_id,
                            dc_table: 0,
                            ac_table: 0,
                        });
                    }

                    frame = Some((width, height, components));
                }
                // all non-baseline frame types fail fast
                0xC1..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF => {
                    anyhow::bail!(UnsupportedFrame(code));
                }
                marker::DQT => {
                    let end = self.cursor + 2 + self.payload_len()?;

                    while self.cursor < end {
                        let pq_tq = self.next()?;
                        let precision = pq_tq >> 4;
                        let id = (pq_tq & 0x0F) as usize;

                        if id >= 4 {
                            anyhow::bail!(corrupt("invalid quantization table id"));
                        }

                        let mut table = Box::new([0u16; 64]);
                        for value in table.iter_mut() {
                            *value = if precision == 0 {
                                self.next()? as u16
                            } else {
                                self.next_u16()?
                            };
                        }

                        quant_tables[id] = Some(table);
                    }
                }
                marker::DHT => {
                    let end = self.cursor + 2 + self.payload_len()?;

                    while self.cursor < end {
                        let tc_th = self.next()?;
                        let class = TableClass::from_id(tc_th >> 4)?;
                        let id = (tc_th & 0x0F) as usize;

                        if id >= 4 {
                            anyhow::bail!(corrupt("invalid huffman table id"));
                        }

                        let mut counts = [0u8; 16];
                        for count in counts.iter_mut() {
                            *count = self.next()?;
                        }

                        let total: usize = counts.iter().map(|&c| c as usize).sum();
                        let mut values = Vec::with_capacity(total);
                        for _ in 0..total {
                            values.push(self.next()?);
                        }

                        let table = HuffmanTable::new(class, &counts, values)?;

                        match class {
                            TableClass::Dc => dc_tables[id] = Some(table),
                            TableClass::Ac => ac_tables[id] = Some(table),
                        }
                    }
                }
                marker::DRI => {
                    let _len = self.next_u16()?;
                    restart_interval = self.next_u16()? as u32;
                }
                marker::APP14 => {
                    let len = self.payload_len()?;
                    let end = self.cursor + len;

                    if len >= 12 && self.data[self.cursor..].starts_with(b"Adobe") {
                        adobe_transform = Some(self.data[self.cursor + 11]);
                    }

                    self.cursor = end;
                }
                marker::APP0..=marker::APP15 | marker::COM => {
                    let len = self.payload_len()?;
                    self.cursor += len;
                }
                marker::SOS => {
                    let (width, height, mut components) =
                        frame.ok_or_else(|| corrupt("SOS before SOF"))?;

                    let _len = self.next_u16()?;
                    let ncomp = self.next()? as usize;

                    if ncomp != components.len() {
                        anyhow::bail!(corrupt("scan component count mismatch"));
                    }

                    for _ in 0..ncomp {
                        let id = self.next()?;
                        let tables = self.next()?;

                        let comp = components
                            .iter_mut()
                            .find(|c| c.id == id)
                            .ok_or_else(|| corrupt("scan references unknown component"))?;

                        comp.dc_table = tables >> 4;
                        comp.ac_table = tables & 0x0F;
                    }

                    // spectral selection and successive approximation, fixed
                    // for baseline
                    let _ss = self.next()?;
                    let _se = self.next()?;
                    let _ah_al = self.next()?;

                    return self.finish(
                        width,
                        height,
                        components,
                        quant_tables,
                        dc_tables,
                        ac_tables,
                        restart_interval,
                        adobe_transform,
                    );
                }
                marker::EOI => anyhow::bail!(corrupt("EOI before scan data")),
                _ => {
                    let len = self.payload_len()?;
                    self.cursor += len;
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        self,
        width: u32,
        height: u32,
        mut components: Vec<Component>,
        quant_tables: [Option<Box<[u16; 64]>>; 4],
        dc_tables: [Option<HuffmanTable>; 4],
        ac_tables: [Option<HuffmanTable>; 4],
        restart_interval: u32,
        adobe_transform: Option<u8>,
    ) -> PdfResult<JpegDecoder<'a>> {
        for comp in &components {
            if comp.h == 0 || comp.v == 0 || comp.h > 4 || comp.v > 4 {
                anyhow::bail!(corrupt("invalid sampling factors"));
            }
        }

        // when every component shares a common factor, normalize to (1, 1):
        // each 8x8 block is then its own MCU, which changes how much
        // upsampling work the band loop performs
        let common_h = components.iter().map(|c| c.h).fold(0, gcd);
        let common_v = components.iter().map(|c| c.v).fold(0, gcd);

        if common_h > 1 || common_v > 1 {
            for comp in &mut components {
                comp.h /= common_h.max(1);
                comp.v /= common_v.max(1);
            }
        }

        let h_max = components.iter().map(|c| c.h).max().unwrap();
        let v_max = components.iter().map(|c| c.v).max().unwrap();

        let mcus_per_row = (width as usize).div_ceil(8 * h_max as usize);
        let mcu_rows = (height as usize).div_ceil(8 * v_max as usize);

        let mut planes = Vec::with_capacity(components.len());
        let mut plane_widths = Vec::with_capacity(components.len());

        for comp in &components {
            let plane_width = mcus_per_row * 8 * comp.h as usize;
            plane_widths.push(plane_width);
            planes.push(vec![0; plane_width * 8 * comp.v as usize]);
        }

        let color = match (components.len(), adobe_transform) {
            (1, _) => ColorModel::Gray,
            (3, Some(0)) => ColorModel::Rgb,
            (3, _) => ColorModel::YCbCr,
            (4, Some(2)) => ColorModel::Ycck,
            (4, _) => ColorModel::Cmyk,
            (n, _) => anyhow::bail!(corrupt(&format!("unsupported component count {}", n))),
        };

        Ok(JpegDecoder {
            width,
            height,
            components,
            quant_tables,
            dc_tables,
            ac_tables,
            restart_interval,
            color,
            reader: BitReader::new(&self.data[self.cursor..]),
            h_max,
            v_max,
            mcus_per_row,
            mcu_rows,
            planes,
            plane_widths,
            dc_predictors: [0; 4],
            mcus_decoded: 0,
            expected_rst: None,
            entropy_done: false,
            next_band: 0,
            row_in_band: 0,
            rows_emitted: 0,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// A DQT segment with all-ones 8-bit table 0
    fn dqt() -> Vec<u8> {
        let mut out = vec![0xFF, 0xDB, 0x00, 0x43, 0x00];
        out.extend(std::iter::repeat(1).take(64));
        out
    }

    /// A DHT segment defining a single length-1 code `0` for `symbol`
    fn dht(class: u8, symbol: u8) -> Vec<u8> {
        let mut out = vec![0xFF, 0xC4, 0x00, 0x14, class << 4];
        out.push(1);
        out.extend(std::iter::repeat(0).take(15));
        out.push(symbol);
        out
    }

    fn sof0(width: u16, height: u16) -> Vec<u8> {
        let mut out = vec![0xFF, 0xC0, 0x00, 0x0B, 0x08];
        out.extend(height.to_be_bytes());
        out.extend(width.to_be_bytes());
        out.extend([0x01, 0x01, 0x11, 0x00]);
        out
    }

    fn sos() -> Vec<u8> {
        vec![0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x3F, 0x00]
    }

    #[test]
    fn flat_gray_block() {
        let mut jpeg = vec![0xFF, 0xD8];
        jpeg.extend(dqt());
        jpeg.extend(sof0(8, 8));
        jpeg.extend(dht(0, 0x00));
        jpeg.extend(dht(1, 0x00));
        jpeg.extend(sos());
        // DC category 0, AC EOB, padded with 1s
        jpeg.push(0x3F);
        jpeg.extend([0xFF, 0xD9]);

        let decoded = JpegDecoder::new(&jpeg).unwrap().decode_to_vec().unwrap();

        assert_eq!(decoded.width, 8);
        assert_eq!(decoded.height, 8);
        assert_eq!(decoded.components, 1);
        assert!(decoded.data.iter().all(|&s| s == 128));
    }

    #[test]
    fn dc_coefficient_sets_level() {
        let mut jpeg = vec![0xFF, 0xD8];
        jpeg.extend(dqt());
        jpeg.extend(sof0(8, 8));
        // DC table codes category 6; magnitude bits follow
        jpeg.extend(dht(0, 0x06));
        jpeg.extend(dht(1, 0x00));
        jpeg.extend(sos());
        // code `0`, +32 as 6 bits (100000), AC EOB `0` = 0b01000000
        jpeg.push(0x40);
        jpeg.extend([0xFF, 0xD9]);

        let decoded = JpegDecoder::new(&jpeg).unwrap().decode_to_vec().unwrap();

        // dc of 32 raises the level to 128 + 32/8
        assert!(decoded.data.iter().all(|&s| s == 132));
    }

    #[test]
    fn restart_markers_cycle() {
        let mut jpeg = vec![0xFF, 0xD8];
        jpeg.extend(dqt());
        jpeg.extend(sof0(24, 8));
        jpeg.extend(dht(0, 0x00));
        jpeg.extend(dht(1, 0x00));
        // restart interval of one MCU
        jpeg.extend([0xFF, 0xDD, 0x00, 0x04, 0x00, 0x01]);
        jpeg.extend(sos());
        jpeg.push(0x3F);
        jpeg.extend([0xFF, 0xD0]);
        jpeg.push(0x3F);
        jpeg.extend([0xFF, 0xD1]);
        jpeg.push(0x3F);
        jpeg.extend([0xFF, 0xD9]);

        let decoded = JpegDecoder::new(&jpeg).unwrap().decode_to_vec().unwrap();

        assert_eq!(decoded.data.len(), 24 * 8);
        assert!(decoded.data.iter().all(|&s| s == 128));
    }

    #[test]
    fn out_of_sequence_restart_marker_is_fatal() {
        let mut jpeg = vec![0xFF, 0xD8];
        jpeg.extend(dqt());
        jpeg.extend(sof0(24, 8));
        jpeg.extend(dht(0, 0x00));
        jpeg.extend(dht(1, 0x00));
        jpeg.extend([0xFF, 0xDD, 0x00, 0x04, 0x00, 0x01]);
        jpeg.extend(sos());
        jpeg.push(0x3F);
        jpeg.extend([0xFF, 0xD0]);
        jpeg.push(0x3F);
        // RST2 where RST1 is required
        jpeg.extend([0xFF, 0xD2]);
        jpeg.push(0x3F);
        jpeg.extend([0xFF, 0xD9]);

        let err = JpegDecoder::new(&jpeg)
            .unwrap()
            .decode_to_vec()
            .unwrap_err();

        assert!(err.to_string().contains("restart marker"));
    }

    #[test]
    fn progressive_frames_are_rejected() {
        let mut jpeg = vec![0xFF, 0xD8];
        jpeg.extend(dqt());
        // SOF2: progressive
        let mut sof = sof0(8, 8);
        sof[1] = 0xC2;
        jpeg.extend(sof);

        let err = JpegDecoder::new(&jpeg).unwrap_err();

        assert!(err.downcast_ref::<UnsupportedFrame>().is_some());
    }

    #[test]
    fn truncated_entropy_zero_fills() {
        let mut jpeg = vec![0xFF, 0xD8];
        jpeg.extend(dqt());
        jpeg.extend(sof0(24, 8));
        jpeg.extend(dht(0, 0x00));
        jpeg.extend(dht(1, 0x00));
        jpeg.extend(sos());
        // entropy data ends after the first MCU with no EOI
        jpeg.push(0x3F);

        let decoded = JpegDecoder::new(&jpeg).unwrap().decode_to_vec().unwrap();

        assert_eq!(decoded.data.len(), 24 * 8);
        // the first block decoded, the rest zero-filled
        assert_eq!(decoded.data[0], 128);
        assert_eq!(decoded.data[23], 0);
    }
}
