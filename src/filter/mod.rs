use std::borrow::Cow;

use crate::{
    error::{PdfResult, RenderError},
    objects::{Dictionary, Object},
    stream::StreamDict,
    FromObj, Resolve,
};

use flate::{FlateDecoder, FlateDecoderParams};

pub mod ascii;
pub mod dct;
pub mod flate;
pub mod run_length;

pub(crate) fn decode_stream<'b>(
    stream: &'b [u8],
    stream_dict: &StreamDict,
    resolver: &mut dyn Resolve,
) -> PdfResult<Cow<'b, [u8]>> {
    if let Some(filters) = &stream_dict.filter {
        if filters.is_empty() {
            return Ok(Cow::Borrowed(stream));
        }

        let mut stream = stream.to_vec();

        let decode_parms = stream_dict.decode_parms.as_ref();

        for (idx, filter) in filters.iter().enumerate() {
            let decode_parms = decode_parms
                .and_then(|params| params.get(idx).cloned())
                .unwrap_or_else(Dictionary::empty);

            match filter {
                FilterKind::AsciiHex => {
                    stream = ascii::decode_ascii_hex(&stream);
                }
                FilterKind::Ascii85 => {
                    stream = ascii::decode_ascii_85(&stream);
                }
                FilterKind::Flate => {
                    let decoder_params =
                        FlateDecoderParams::from_obj(Object::Dictionary(decode_parms), resolver)?;

                    stream = FlateDecoder::new(Cow::Owned(stream), decoder_params)?.decode()?;
                }
                FilterKind::RunLength => {
                    stream = run_length::decode_run_length(&stream);
                }
                FilterKind::Dct => {
                    stream = dct::DctDecoder::new(Cow::Owned(stream)).decode()?.data;
                }
                FilterKind::Lzw => anyhow::bail!(RenderError::UnsupportedFilter("LZWDecode")),
                FilterKind::CcittFax => {
                    anyhow::bail!(RenderError::UnsupportedFilter("CCITTFaxDecode"))
                }
                FilterKind::Jbig2 => anyhow::bail!(RenderError::UnsupportedFilter("JBIG2Decode")),
                FilterKind::Jpx => anyhow::bail!(RenderError::UnsupportedFilter("JPXDecode")),
                FilterKind::Crypt => anyhow::bail!(RenderError::UnsupportedFilter("Crypt")),
            }
        }

        return Ok(Cow::Owned(stream));
    }

    Ok(Cow::Borrowed(stream))
}

#[pdf_enum]
pub enum FilterKind {
    /// Decodes data encoded in an ASCII hexadecimal representation, reproducing
    /// the original binary data
    AsciiHex = "ASCIIHexDecode",

    /// Decodes data encoded in an ASCII base-85 representation, reproducing the
    /// original binary data
    Ascii85 = "ASCII85Decode",

    /// Decompresses data encoded using the LZW (Lempel-ZivWelch) adaptive compression
    /// method, reproducing the original text or binary data
    Lzw = "LZWDecode",

    /// Decompresses data encoded using the zlib/deflate compression method,
    /// reproducing the original text or binary data
    Flate = "FlateDecode",

    /// Decompresses data encoded using a byte-oriented run-length encoding algorithm,
    /// reproducing the original text or binary data (typically monochrome image data,
    /// or any data that contains frequent long runs of a single byte value)
    RunLength = "RunLengthDecode",

    /// Decompresses data encoded using the CCITT facsimile standard, reproducing
    /// the original data (typically monochrome image data at 1 bit per pixel)
    CcittFax = "CCITTFaxDecode",

    /// Decompresses data encoded using the JBIG2 standard, reproducing the original
    /// monochrome (1 bit per pixel) image data (or an approximation of that data)
    Jbig2 = "JBIG2Decode",

    /// Decompresses data encoded using a DCT (discrete cosine transform) technique
    /// based on the JPEG standard, reproducing image sample data that approximates
    /// the original data
    Dct = "DCTDecode",

    /// Decompresses data encoded using the waveletbased JPEG2000 standard, reproducing
    /// the original image data
    Jpx = "JPXDecode",

    /// Decrypts data encrypted by a security handler, reproducing the data as it
    /// was before encryption
    Crypt = "Crypt",
}

impl FilterKind {
    /// Inline images abbreviate filter names
    pub fn from_abbreviated(name: &str) -> PdfResult<Self> {
        Ok(match name {
            "AHx" => FilterKind::AsciiHex,
            "A85" => FilterKind::Ascii85,
            "LZW" => FilterKind::Lzw,
            "Fl" => FilterKind::Flate,
            "RL" => FilterKind::RunLength,
            "CCF" => FilterKind::CcittFax,
            "DCT" => FilterKind::Dct,
            _ => FilterKind::from_str(name)?,
        })
    }
}
