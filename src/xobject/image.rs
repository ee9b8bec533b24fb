use crate::{
    color::ColorSpace,
    error::PdfResult,
    objects::{Dictionary, FromObj, Name, Object},
    resources::graphics_state_parameters::RenderingIntent,
    stream::Stream,
    Resolve,
};

/// An image XObject: sample geometry plus the stream carrying (possibly
/// filtered) sample data
#[derive(Debug)]
pub struct ImageXObject {
    /// The width of the image, in samples
    pub width: u32,

    /// The height of the image, in samples
    pub height: u32,

    /// The colour space in which image samples shall be specified; it can be
    /// any type of colour space except Pattern.
    ///
    /// Required for images, except those that use the JPXDecode filter
    pub color_space: Option<ColorSpace>,

    /// The number of bits used to represent each colour component. Only a
    /// single value shall be specified; the number of bits shall be the same
    /// for all colour components. The value shall be 1, 2, 4, 8, or 16. If
    /// ImageMask is true, this entry is optional, but if specified, its value
    /// shall be 1.
    ///
    /// If the image stream uses a filter, the value of BitsPerComponent shall
    /// be consistent with the size of the data samples that the filter delivers.
    /// In particular, a CCITTFaxDecode or JBIG2Decode filter shall always deliver
    /// 1-bit samples, a RunLengthDecode or DCTDecode filter shall always deliver
    /// 8-bit samples, and an LZWDecode or FlateDecode filter shall deliver
    /// samples of a specified size if a predictor function is used
    pub bits_per_component: Option<u32>,

    /// The name of a colour rendering intent to be used in rendering the image
    ///
    /// Default value: the current rendering intent in the graphics state
    pub intent: Option<RenderingIntent>,

    /// A flag indicating whether the image shall be treated as an image mask
    ///
    /// If this flag is true, the value of BitsPerComponent shall be 1 and Mask
    /// and ColorSpace shall not be specified; unmasked areas shall be painted
    /// using the current nonstroking colour
    ///
    /// Default value: false
    pub image_mask: bool,

    /// An image XObject defining an image mask to be applied to this image, or an
    /// array specifying a range of colours to be applied to it as a colour key
    /// mask. If ImageMask is true, this entry shall not be present
    pub mask: Option<Object>,

    /// An array of numbers describing how to map image samples into the range of
    /// values appropriate for the image's colour space. If ImageMask is true, the
    /// array shall be either [0 1] or [1 0]; otherwise, its length shall be twice
    /// the number of colour components required by ColorSpace
    pub decode: Option<Vec<f32>>,

    /// A flag indicating whether image interpolation shall be performed by a conforming
    /// reader
    ///
    /// Default value: false
    pub interpolate: bool,

    /// A subsidiary image XObject defining a softmask image that shall be used as a source
    /// of mask shape or mask opacity values in the transparent imaging model.
    ///
    /// If present, this entry shall override the current soft mask in the graphics state,
    /// as well as the image's Mask entry, if any. However, the other transparency-related
    /// graphics state parameters -- blend mode and alpha constant -- shall remain in effect
    pub s_mask: Option<Box<ImageXObject>>,

    /// The undecoded stream. Filters are applied at draw time so a large
    /// image only materializes when it is painted
    pub stream: Stream,
}

impl ImageXObject {
    pub fn from_stream(mut stream: Stream, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        let dict = &mut stream.dict.other;

        let width = dict.expect_unsigned_integer("Width", resolver)?;
        let height = dict.expect_unsigned_integer("Height", resolver)?;

        let image_mask = dict.get_bool("ImageMask", resolver)?.unwrap_or(false);

        let color_space = match dict.get_object("ColorSpace") {
            Some(obj) if !image_mask => Some(ColorSpace::from_obj(obj, resolver)?),
            _ => None,
        };

        let bits_per_component = dict
            .get_integer("BitsPerComponent", resolver)?
            .map(|bits| bits as u32);

        let intent = dict
            .get::<Name>("Intent", resolver)?
            .map(|name| RenderingIntent::from_name_or_default(name.as_str()));

        let mask = dict.get_object("Mask");

        let decode = dict.get::<Vec<f32>>("Decode", resolver)?;
        let interpolate = dict.get_bool("Interpolate", resolver)?.unwrap_or(false);

        let s_mask = dict
            .get_stream("SMask", resolver)?
            .map(|stream| ImageXObject::from_stream(stream, resolver).map(Box::new))
            .transpose()?;

        Ok(Self {
            width,
            height,
            color_space,
            bits_per_component,
            intent,
            image_mask,
            mask,
            decode,
            interpolate,
            s_mask,
            stream,
        })
    }

    /// Build an image object from an inline-image dictionary whose
    /// abbreviated keys have already been expanded
    pub fn from_inline_dict(
        dict: Dictionary,
        data: Vec<u8>,
        resolver: &mut dyn Resolve,
    ) -> PdfResult<Self> {
        let stream = Stream::from_dict_and_data(dict, data, resolver)?;
        Self::from_stream(stream, resolver)
    }
}
