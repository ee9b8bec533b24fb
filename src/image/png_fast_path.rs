//! The PNG fast path: a flate-compressed image with a PNG predictor is
//! already, byte for byte, the payload of a PNG IDAT chunk. Instead of
//! inflating and reversing the predictor in-process, the original zlib
//! stream is wrapped in a fabricated PNG container and handed to the host
//! PNG decoder.

use std::io::Write;

use flate2::{write::ZlibEncoder, Compression};
use once_cell::sync::Lazy;

use crate::error::{PdfResult, RenderError};

static CRC_TABLE: Lazy<[u32; 256]> = Lazy::new(|| {
    let mut table = [0u32; 256];

    for (n, entry) in table.iter_mut().enumerate() {
        let mut c = n as u32;
        for _ in 0..8 {
            c = if c & 1 != 0 {
                0xEDB8_8320 ^ (c >> 1)
            } else {
                c >> 1
            };
        }
        *entry = c;
    }

    table
});

pub(crate) fn crc32(bytes: &[u8]) -> u32 {
    let mut c = 0xFFFF_FFFFu32;

    for &byte in bytes {
        c = CRC_TABLE[((c ^ u32::from(byte)) & 0xFF) as usize] ^ (c >> 8);
    }

    c ^ 0xFFFF_FFFF
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PngColorType {
    Grayscale,
    Rgb,
    /// Requires a PLTE chunk of RGB triples
    Indexed,
}

impl PngColorType {
    fn code(self) -> u8 {
        match self {
            PngColorType::Grayscale => 0,
            PngColorType::Rgb => 2,
            PngColorType::Indexed => 3,
        }
    }
}

/// The zlib stream is only checked for header legality: deflate
/// compression method, a valid check value, and no preset dictionary.
/// Anything else is the host decoder's problem
pub(crate) fn check_zlib_header(zlib: &[u8]) -> PdfResult<()> {
    let (cmf, flg) = match (zlib.first(), zlib.get(1)) {
        (Some(&cmf), Some(&flg)) => (cmf, flg),
        _ => anyhow::bail!(RenderError::InvalidZlibHeader),
    };

    let method = cmf & 0x0F;
    let has_dict = flg & 0x20 != 0;
    let check = (u16::from(cmf) << 8) | u16::from(flg);

    if method != 8 || has_dict || check % 31 != 0 {
        anyhow::bail!(RenderError::InvalidZlibHeader);
    }

    Ok(())
}

fn push_chunk(out: &mut Vec<u8>, tag: &[u8; 4], body: &[u8]) {
    out.extend((body.len() as u32).to_be_bytes());

    let crc_start = out.len();
    out.extend(tag);
    out.extend(body);

    let crc = crc32(&out[crc_start..]);
    out.extend(crc.to_be_bytes());
}

/// Fabricate a complete PNG container around an existing zlib stream
pub(crate) fn fabricate_png(
    zlib: &[u8],
    width: u32,
    height: u32,
    bit_depth: u8,
    color_type: PngColorType,
    palette: Option<&[u8]>,
    icc_profile: Option<&[u8]>,
) -> PdfResult<Vec<u8>> {
    check_zlib_header(zlib)?;

    let mut out = Vec::with_capacity(zlib.len() + 128);

    out.extend([0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n']);

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend(width.to_be_bytes());
    ihdr.extend(height.to_be_bytes());
    ihdr.push(bit_depth);
    ihdr.push(color_type.code());
    ihdr.push(0); // compression: deflate
    ihdr.push(0); // filter method 0
    ihdr.push(0); // no interlace
    push_chunk(&mut out, b"IHDR", &ihdr);

    if let Some(profile) = icc_profile {
        let mut iccp = Vec::with_capacity(profile.len() / 2 + 16);
        iccp.extend(b"ICC Profile");
        iccp.push(0); // name terminator
        iccp.push(0); // compression: deflate

        let mut encoder = ZlibEncoder::new(iccp, Compression::default());
        encoder.write_all(profile)?;
        let iccp = encoder.finish()?;

        push_chunk(&mut out, b"iCCP", &iccp);
    }

    if let Some(palette) = palette {
        push_chunk(&mut out, b"PLTE", palette);
    }

    push_chunk(&mut out, b"IDAT", zlib);
    push_chunk(&mut out, b"IEND", &[]);

    Ok(out)
}

/// Decode a fabricated container with the host PNG decoder, expanding to
/// RGBA8
pub(crate) fn decode_fabricated(png_bytes: &[u8]) -> PdfResult<super::RasterImage> {
    let mut decoder = png::Decoder::new(std::io::Cursor::new(png_bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);

    let mut reader = decoder.read_info()?;

    let mut buffer = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buffer)?;
    buffer.truncate(info.buffer_size());

    let width = info.width as usize;
    let height = info.height as usize;

    let mut data = vec![0u8; width * height * 4];

    match info.color_type {
        png::ColorType::Grayscale => {
            for (i, &gray) in buffer.iter().enumerate() {
                data[i * 4..i * 4 + 4].copy_from_slice(&[gray, gray, gray, 0xFF]);
            }
        }
        png::ColorType::Rgb => {
            for (i, rgb) in buffer.chunks_exact(3).enumerate() {
                data[i * 4..i * 4 + 4].copy_from_slice(&[rgb[0], rgb[1], rgb[2], 0xFF]);
            }
        }
        png::ColorType::Rgba => {
            data.copy_from_slice(&buffer);
        }
        png::ColorType::GrayscaleAlpha => {
            for (i, ga) in buffer.chunks_exact(2).enumerate() {
                data[i * 4..i * 4 + 4].copy_from_slice(&[ga[0], ga[0], ga[0], ga[1]]);
            }
        }
        png::ColorType::Indexed => {
            // EXPAND converts indexed to rgb; reaching here means the
            // decoder disagreed with its own transformations
            anyhow::bail!("png decoder produced unexpanded indexed pixels");
        }
    }

    Ok(super::RasterImage {
        width: info.width,
        height: info.height,
        data,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn crc32_reference_value() {
        // well-known check value for "123456789"
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn zlib_header_legality() {
        // 0x78 0x9C is the common deflate header
        assert!(check_zlib_header(&[0x78, 0x9C]).is_ok());
        // bad check value
        assert!(check_zlib_header(&[0x78, 0x9D]).is_err());
        // preset dictionary flag
        assert!(check_zlib_header(&[0x78, 0xBB]).is_err());
        // not deflate
        assert!(check_zlib_header(&[0x79, 0x9C]).is_err());
        assert!(check_zlib_header(&[]).is_err());
    }

    #[test]
    fn fabricated_png_round_trips_gray_rows() {
        // two 2x1 gray rows filtered with Up (2): row 1 [10, 20],
        // row 2 stores deltas [5, 5]
        let raw: &[u8] = &[2, 10, 20, 2, 5, 5];

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(raw).unwrap();
        let zlib = encoder.finish().unwrap();

        let png_bytes =
            fabricate_png(&zlib, 2, 2, 8, PngColorType::Grayscale, None, None).unwrap();
        let image = decode_fabricated(&png_bytes).unwrap();

        assert_eq!(image.width, 2);
        assert_eq!(image.height, 2);
        assert_eq!(&image.data[..4], &[10, 10, 10, 255]);
        assert_eq!(&image.data[4..8], &[20, 20, 20, 255]);
        assert_eq!(&image.data[8..12], &[15, 15, 15, 255]);
        assert_eq!(&image.data[12..16], &[25, 25, 25, 255]);
    }

    #[test]
    fn fabricated_png_with_palette() {
        // one 2x1 indexed row, filter None, indices 0 and 1
        let raw: &[u8] = &[0, 0, 1];

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(raw).unwrap();
        let zlib = encoder.finish().unwrap();

        let palette = [255, 0, 0, 0, 0, 255];
        let png_bytes = fabricate_png(
            &zlib,
            2,
            1,
            8,
            PngColorType::Indexed,
            Some(&palette),
            None,
        )
        .unwrap();

        let image = decode_fabricated(&png_bytes).unwrap();

        assert_eq!(&image.data[..4], &[255, 0, 0, 255]);
        assert_eq!(&image.data[4..8], &[0, 0, 255, 255]);
    }
}
