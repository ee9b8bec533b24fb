use crate::{
    color::ColorSpace,
    error::PdfResult,
    filter::{dct::DctDecoder, decode_stream, flate::FlateDecoderParams, FilterKind},
    function::TransferFunction,
    objects::{Dictionary, Object},
    resources::graphics_state_parameters::RenderingIntent,
    stream::StreamDict,
    xobject::ImageXObject,
    FromObj, Resolve,
};

pub use png_fast_path::PngColorType;

pub mod png_fast_path;
pub mod raw;

/// A decoded image: tightly packed RGBA8 rows
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RasterImage {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * 4;

        self.data
            .get(idx..idx + 4)
            .map(|px| [px[0], px[1], px[2], px[3]])
            .unwrap_or([0; 4])
    }
}

/// Decode an image XObject (or inline image) to RGBA.
///
/// `stencil_rgba` is the current nonstroking paint, used when the image is
/// a stencil mask; `intent` is the graphics state's rendering intent,
/// overridden by the image's own Intent entry
pub fn decode_image(
    image: &ImageXObject,
    stencil_rgba: [f32; 4],
    intent: RenderingIntent,
    transfer: &TransferFunction,
    resolver: &mut dyn Resolve,
) -> PdfResult<RasterImage> {
    let intent = image.intent.unwrap_or(intent);

    let mut raster = if image.image_mask {
        decode_stencil(image, stencil_rgba, resolver)?
    } else if let Some(raster) = try_dct_path(image, intent, transfer, resolver)? {
        raster
    } else if let Some(raster) = try_png_fast_path(image, intent, resolver)? {
        raster
    } else {
        decode_general(image, intent, transfer, resolver)?
    };

    if let Some(s_mask) = &image.s_mask {
        apply_soft_mask_image(&mut raster, s_mask, intent, resolver)?;
    }

    Ok(raster)
}

fn bits_per_component(image: &ImageXObject) -> u32 {
    if image.image_mask {
        1
    } else {
        image.bits_per_component.unwrap_or(8)
    }
}

fn color_space_or_fallback(image: &ImageXObject, components: usize) -> ColorSpace {
    image
        .color_space
        .clone()
        .unwrap_or_else(|| ColorSpace::device_fallback(components))
}

/// The default Decode array maps samples onto the full component range:
/// [0 1] per component, except the index range for Indexed spaces and the
/// L*/a*/b* ranges for Lab
fn default_decode(space: &ColorSpace, bits: u32) -> Vec<f32> {
    match space {
        ColorSpace::Indexed(..) => vec![0.0, ((1u64 << bits) - 1) as f32],
        ColorSpace::Lab(params) => params.decode_default(),
        _ => [0.0f32, 1.0]
            .into_iter()
            .cycle()
            .take(space.components() * 2)
            .collect(),
    }
}

/// A malformed decode array (wrong length) degrades to the identity decode
fn effective_decode(image: &ImageXObject, space: &ColorSpace, bits: u32) -> Vec<f32> {
    let expected = space.components() * 2;

    match &image.decode {
        Some(decode) if decode.len() == expected => decode.clone(),
        Some(decode) => {
            log::warn!(
                "decode array of length {} where {} is required; using identity",
                decode.len(),
                expected
            );
            default_decode(space, bits)
        }
        None => default_decode(space, bits),
    }
}

fn decode_stencil(
    image: &ImageXObject,
    stencil_rgba: [f32; 4],
    resolver: &mut dyn Resolve,
) -> PdfResult<RasterImage> {
    let data = decode_stream(&image.stream.stream, &image.stream.dict, resolver)?;

    // a sample of 0 paints with the current color under the default [0 1]
    // decode; [1 0] inverts
    let inverted = matches!(image.decode.as_deref(), Some([min, ..]) if *min == 1.0);

    let width = image.width as usize;
    let height = image.height as usize;
    let row_bytes = (width + 7) / 8;

    let paint = [
        (stencil_rgba[0] * 255.0 + 0.5) as u8,
        (stencil_rgba[1] * 255.0 + 0.5) as u8,
        (stencil_rgba[2] * 255.0 + 0.5) as u8,
        (stencil_rgba[3] * 255.0 + 0.5) as u8,
    ];

    let mut raster = RasterImage::new(image.width, image.height);

    for y in 0..height {
        let row = data.get(y * row_bytes..(y + 1) * row_bytes).unwrap_or(&[]);

        for x in 0..width {
            let byte = row.get(x / 8).copied().unwrap_or(0);
            let mut bit = (byte >> (7 - x % 8)) & 1;

            if inverted {
                bit ^= 1;
            }

            if bit == 0 {
                let idx = (y * width + x) * 4;
                raster.data[idx..idx + 4].copy_from_slice(&paint);
            }
        }
    }

    Ok(raster)
}

/// A DCT-filtered image decodes through the baseline JPEG decoder, with
/// any preceding filters applied first
fn try_dct_path(
    image: &ImageXObject,
    intent: RenderingIntent,
    transfer: &TransferFunction,
    resolver: &mut dyn Resolve,
) -> PdfResult<Option<RasterImage>> {
    let filters = match &image.stream.dict.filter {
        Some(filters) if filters.last() == Some(&FilterKind::Dct) => filters,
        _ => return Ok(None),
    };

    let entropy = if filters.len() == 1 {
        std::borrow::Cow::Borrowed(&image.stream.stream[..])
    } else {
        let prefix_dict = StreamDict {
            len: image.stream.dict.len,
            filter: Some(filters[..filters.len() - 1].to_vec()),
            decode_parms: image.stream.dict.decode_parms.clone(),
            other: Dictionary::empty(),
        };

        decode_stream(&image.stream.stream, &prefix_dict, resolver)?
    };

    let decoded = DctDecoder::new(entropy).decode()?;

    let space = color_space_or_fallback(image, decoded.components);
    let sampler = space.sampler(intent, transfer);
    let decode = effective_decode(image, &space, 8);

    let width = decoded.width.min(image.width) as usize;
    let height = decoded.height.min(image.height) as usize;
    let ncomp = decoded.components;

    let mut raster = RasterImage::new(decoded.width, decoded.height);
    let mut components = vec![0.0f32; ncomp];

    for y in 0..height {
        for x in 0..width {
            let base = (y * decoded.width as usize + x) * ncomp;

            for (i, component) in components.iter_mut().enumerate() {
                let sample = decoded.data.get(base + i).copied().unwrap_or(0) as f32 / 255.0;
                let min = decode.get(i * 2).copied().unwrap_or(0.0);
                let max = decode.get(i * 2 + 1).copied().unwrap_or(1.0);
                *component = min + sample * (max - min);
            }

            let rgba = sampler.sample_rgba8(&space.normalize(&components));

            let idx = (y * decoded.width as usize + x) * 4;
            raster.data[idx..idx + 4].copy_from_slice(&rgba);
        }
    }

    Ok(Some(raster))
}

/// When the image is zlib data with a PNG predictor, wrap the stream in a
/// fabricated PNG container and let the host decoder do the work
fn try_png_fast_path(
    image: &ImageXObject,
    intent: RenderingIntent,
    resolver: &mut dyn Resolve,
) -> PdfResult<Option<RasterImage>> {
    match &image.stream.dict.filter {
        Some(filters) if filters.as_slice() == [FilterKind::Flate] => {}
        _ => return Ok(None),
    }

    let parms = image
        .stream
        .dict
        .decode_parms
        .as_ref()
        .and_then(|parms| parms.first().cloned());

    let parms = match parms {
        Some(dict) => FlateDecoderParams::from_obj(Object::Dictionary(dict), resolver)?,
        None => return Ok(None),
    };

    if !parms.predictor.is_png() {
        return Ok(None);
    }

    let bits = bits_per_component(image);
    let space = color_space_or_fallback(image, parms.colors as usize);

    // the fast path bypasses per-sample decode mapping
    if image.decode.is_some() {
        return Ok(None);
    }

    let mut icc_profile: Option<Vec<u8>> = None;

    let (color_type, palette) = match &space {
        ColorSpace::DeviceGray | ColorSpace::CalGray(..) if parms.colors == 1 => {
            (PngColorType::Grayscale, None)
        }
        ColorSpace::DeviceRgb | ColorSpace::CalRgb(..) if parms.colors == 3 => {
            (PngColorType::Rgb, None)
        }
        ColorSpace::IccBased(icc_space)
            if parms.colors as usize == icc_space.channels()
                && matches!(icc_space.channels(), 1 | 3) =>
        {
            icc_profile = Some(icc_space.profile_bytes().to_vec());

            if icc_space.channels() == 1 {
                (PngColorType::Grayscale, None)
            } else {
                (PngColorType::Rgb, None)
            }
        }
        ColorSpace::Indexed(indexed) if parms.colors == 1 && bits <= 8 => {
            let rgba_palette = indexed.palette(intent);
            let mut plte = Vec::with_capacity(rgba_palette.len() * 3);

            for rgba in rgba_palette.iter() {
                plte.push((rgba[0] * 255.0 + 0.5) as u8);
                plte.push((rgba[1] * 255.0 + 0.5) as u8);
                plte.push((rgba[2] * 255.0 + 0.5) as u8);
            }

            (PngColorType::Indexed, Some(plte))
        }
        _ => return Ok(None),
    };

    if !matches!(bits, 1 | 2 | 4 | 8 | 16) || (color_type == PngColorType::Rgb && bits < 8) {
        return Ok(None);
    }

    let png_bytes = png_fast_path::fabricate_png(
        &image.stream.stream,
        image.width,
        image.height,
        bits as u8,
        color_type,
        palette.as_deref(),
        icc_profile.as_deref(),
    )?;

    match png_fast_path::decode_fabricated(&png_bytes) {
        Ok(raster) => Ok(Some(raster)),
        Err(err) => {
            log::warn!("png fast path failed, falling back: {}", err);
            Ok(None)
        }
    }
}

/// The general path: run the filter chain, then walk packed samples
/// through the decode array and the color pipeline
fn decode_general(
    image: &ImageXObject,
    intent: RenderingIntent,
    transfer: &TransferFunction,
    resolver: &mut dyn Resolve,
) -> PdfResult<RasterImage> {
    let data = decode_stream(&image.stream.stream, &image.stream.dict, resolver)?;

    let bits = bits_per_component(image);
    let space = color_space_or_fallback(image, 1);
    let ncomp = space.components();

    let width = image.width as usize;
    let height = image.height as usize;
    let row_bytes = (width * ncomp * bits as usize + 7) / 8;

    let mut raster = RasterImage::new(image.width, image.height);

    // unfiltered device gray and rgb rows take the dedicated upsamplers
    if image.decode.is_none() && transfer.is_identity() {
        let fast = match (&space, ncomp, bits) {
            (ColorSpace::DeviceGray, 1, 1 | 2 | 4 | 8) | (ColorSpace::DeviceRgb, 3, 8) => true,
            _ => false,
        };

        if fast {
            for y in 0..height {
                let row = data.get(y * row_bytes..(y + 1) * row_bytes).unwrap_or(&[]);
                let dst = &mut raster.data[y * width * 4..(y + 1) * width * 4];

                match (ncomp, bits) {
                    (1, 1) => raw::expand_gray_row_1(row, width, dst),
                    (1, 2) => raw::expand_gray_row_2(row, width, dst),
                    (1, 4) => raw::expand_gray_row_4(row, width, dst),
                    (1, 8) => raw::expand_gray_row_8(row, width, dst),
                    (3, 8) => raw::expand_rgb_row_8(row, width, dst),
                    _ => unreachable!(),
                }
            }

            return Ok(raster);
        }
    }

    let sampler = space.sampler(intent, transfer);
    let decode = effective_decode(image, &space, bits);
    let max_raw = if bits >= 32 {
        u32::MAX as f32
    } else {
        ((1u64 << bits) - 1) as f32
    };

    let mut components = vec![0.0f32; ncomp];

    for y in 0..height {
        let row = data.get(y * row_bytes..(y + 1) * row_bytes).unwrap_or(&[]);

        for x in 0..width {
            for (i, component) in components.iter_mut().enumerate() {
                let raw_sample = read_packed(row, x * ncomp + i, bits);
                let min = decode.get(i * 2).copied().unwrap_or(0.0);
                let max = decode.get(i * 2 + 1).copied().unwrap_or(1.0);

                *component = min + raw_sample as f32 * (max - min) / max_raw;
            }

            let rgba = sampler.sample_rgba8(&normalize_for(&space, &components));

            let idx = (y * width + x) * 4;
            raster.data[idx..idx + 4].copy_from_slice(&rgba);
        }
    }

    Ok(raster)
}

/// Indexed samplers take the raw index; everything else goes through the
/// space's operand normalization
fn normalize_for(space: &ColorSpace, components: &[f32]) -> Vec<f32> {
    match space {
        ColorSpace::Indexed(..) => components.to_vec(),
        _ => space.normalize(components),
    }
}

fn read_packed(row: &[u8], index: usize, bits: u32) -> u32 {
    match bits {
        8 => row.get(index).copied().unwrap_or(0) as u32,
        16 => {
            let hi = row.get(index * 2).copied().unwrap_or(0) as u32;
            let lo = row.get(index * 2 + 1).copied().unwrap_or(0) as u32;
            (hi << 8) | lo
        }
        _ => {
            let bit_pos = index * bits as usize;
            let byte = row.get(bit_pos / 8).copied().unwrap_or(0);
            let shift = 8 - bits as usize - (bit_pos % 8);

            ((byte >> shift) & ((1u16 << bits) - 1) as u8) as u32
        }
    }
}

/// Modulate the image's alpha channel by a subsidiary soft-mask image's
/// luminosity samples, resampling by nearest neighbor when the dimensions
/// differ
fn apply_soft_mask_image(
    raster: &mut RasterImage,
    s_mask: &ImageXObject,
    intent: RenderingIntent,
    resolver: &mut dyn Resolve,
) -> PdfResult<()> {
    let mask = decode_image(
        s_mask,
        [0.0, 0.0, 0.0, 1.0],
        intent,
        &TransferFunction::Identity,
        resolver,
    )?;

    for y in 0..raster.height {
        for x in 0..raster.width {
            let mask_x = x * mask.width / raster.width.max(1);
            let mask_y = y * mask.height / raster.height.max(1);

            let luminosity = mask.pixel(mask_x.min(mask.width.saturating_sub(1)), mask_y.min(mask.height.saturating_sub(1)))[0];

            let idx = ((y * raster.width + x) * 4 + 3) as usize;
            raster.data[idx] = ((raster.data[idx] as u16 * luminosity as u16) / 255) as u8;
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{resolve::NoResolve, stream::Stream};
    use std::collections::HashMap;

    fn image_dict(entries: Vec<(&str, Object)>) -> Dictionary {
        Dictionary::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v))
                .collect::<HashMap<_, _>>(),
        )
    }

    fn unfiltered_image(dict: Dictionary, data: Vec<u8>) -> ImageXObject {
        let stream = Stream::from_dict_and_data(dict, data, &mut NoResolve).unwrap();
        ImageXObject::from_stream(stream, &mut NoResolve).unwrap()
    }

    fn decode(image: &ImageXObject) -> RasterImage {
        decode_image(
            image,
            [0.0, 0.0, 0.0, 1.0],
            RenderingIntent::RelativeColorimetric,
            &TransferFunction::Identity,
            &mut NoResolve,
        )
        .unwrap()
    }

    #[test]
    fn indexed_image_resolves_palette_entries() {
        let image = unfiltered_image(
            image_dict(vec![
                ("Width", Object::Integer(2)),
                ("Height", Object::Integer(1)),
                ("BitsPerComponent", Object::Integer(8)),
                (
                    "ColorSpace",
                    Object::Array(vec![
                        Object::Name(crate::objects::Name("Indexed".to_owned())),
                        Object::Name(crate::objects::Name("DeviceRGB".to_owned())),
                        Object::Integer(1),
                        Object::String("\u{00ff}\u{0}\u{0}\u{0}\u{0}\u{00ff}".to_owned()),
                    ]),
                ),
            ]),
            vec![0, 1],
        );

        let raster = decode(&image);

        assert_eq!(&raster.data[..4], &[255, 0, 0, 255]);
        assert_eq!(&raster.data[4..8], &[0, 0, 255, 255]);
    }

    #[test]
    fn stencil_mask_paints_with_current_color() {
        let image = unfiltered_image(
            image_dict(vec![
                ("Width", Object::Integer(8)),
                ("Height", Object::Integer(1)),
                ("ImageMask", Object::True),
            ]),
            vec![0b0101_0101],
        );

        let raster = decode_image(
            &image,
            [1.0, 0.0, 0.0, 1.0],
            RenderingIntent::RelativeColorimetric,
            &TransferFunction::Identity,
            &mut NoResolve,
        )
        .unwrap();

        // sample 0 paints red, sample 1 leaves transparent
        assert_eq!(&raster.data[..4], &[255, 0, 0, 255]);
        assert_eq!(raster.data[7], 0);
    }

    #[test]
    fn inverted_stencil_decode() {
        let image = unfiltered_image(
            image_dict(vec![
                ("Width", Object::Integer(8)),
                ("Height", Object::Integer(1)),
                ("ImageMask", Object::True),
                (
                    "Decode",
                    Object::Array(vec![Object::Real(1.0), Object::Real(0.0)]),
                ),
            ]),
            vec![0b1000_0000],
        );

        let raster = decode_image(
            &image,
            [0.0, 1.0, 0.0, 1.0],
            RenderingIntent::RelativeColorimetric,
            &TransferFunction::Identity,
            &mut NoResolve,
        )
        .unwrap();

        assert_eq!(&raster.data[..4], &[0, 255, 0, 255]);
        assert_eq!(raster.data[7], 0);
    }

    #[test]
    fn gray_ramp_expands_opaque() {
        let image = unfiltered_image(
            image_dict(vec![
                ("Width", Object::Integer(3)),
                ("Height", Object::Integer(1)),
                ("BitsPerComponent", Object::Integer(8)),
                (
                    "ColorSpace",
                    Object::Name(crate::objects::Name("DeviceGray".to_owned())),
                ),
            ]),
            vec![0, 128, 255],
        );

        let raster = decode(&image);

        assert_eq!(&raster.data[..4], &[0, 0, 0, 255]);
        assert_eq!(&raster.data[4..8], &[128, 128, 128, 255]);
        assert_eq!(&raster.data[8..12], &[255, 255, 255, 255]);
    }

    #[test]
    fn decode_array_inverts_gray() {
        let image = unfiltered_image(
            image_dict(vec![
                ("Width", Object::Integer(2)),
                ("Height", Object::Integer(1)),
                ("BitsPerComponent", Object::Integer(8)),
                (
                    "ColorSpace",
                    Object::Name(crate::objects::Name("DeviceGray".to_owned())),
                ),
                (
                    "Decode",
                    Object::Array(vec![Object::Real(1.0), Object::Real(0.0)]),
                ),
            ]),
            vec![0, 255],
        );

        let raster = decode(&image);

        assert_eq!(&raster.data[..4], &[255, 255, 255, 255]);
        assert_eq!(&raster.data[4..8], &[0, 0, 0, 255]);
    }
}
