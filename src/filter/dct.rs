use std::{
    borrow::Cow,
    io::{BufReader, Cursor},
};

use crate::{
    error::PdfResult,
    jpeg::{DecodedJpeg, JpegDecoder, UnsupportedFrame},
};

/// The DCTDecode slot.
///
/// Baseline frames are decoded by the in-crate streaming decoder; frames it
/// rejects up front (progressive, lossless, arithmetic) fail fast into the
/// host `jpeg-decoder` crate rather than silently degrading
pub struct DctDecoder<'a> {
    buffer: Cow<'a, [u8]>,
}

impl<'a> DctDecoder<'a> {
    pub fn new(buffer: Cow<'a, [u8]>) -> Self {
        Self { buffer }
    }

    pub fn decode(self) -> PdfResult<DecodedJpeg> {
        match JpegDecoder::new(&self.buffer) {
            Ok(decoder) => decoder.decode_to_vec(),
            Err(err) if err.downcast_ref::<UnsupportedFrame>().is_some() => {
                log::debug!("routing to host jpeg decoder: {}", err);
                self.decode_host()
            }
            Err(err) => Err(err),
        }
    }

    fn decode_host(self) -> PdfResult<DecodedJpeg> {
        let mut decoder = jpeg_decoder::Decoder::new(BufReader::new(Cursor::new(&*self.buffer)));

        let data = decoder.decode()?;
        let info = decoder
            .info()
            .ok_or_else(|| anyhow::anyhow!("host jpeg decoder produced no image info"))?;

        let components = match info.pixel_format {
            jpeg_decoder::PixelFormat::L8 => 1,
            jpeg_decoder::PixelFormat::RGB24 => 3,
            jpeg_decoder::PixelFormat::CMYK32 => 4,
        };

        Ok(DecodedJpeg {
            width: u32::from(info.width),
            height: u32::from(info.height),
            components,
            data,
        })
    }
}
