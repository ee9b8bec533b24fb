use crate::{
    assert_len,
    error::PdfResult,
    function::TransferFunction,
    icc::IccRenderingIntent,
    objects::{Dictionary, Object},
    stream::Stream,
    Resolve,
};

/// A graphics state parameter dictionary, applied by the `gs` operator.
/// Every entry is optional; absent entries leave the corresponding graphics
/// state field untouched
#[derive(Debug, Clone)]
pub struct GraphicsStateParameters {
    pub line_width: Option<f32>,
    pub line_cap_style: Option<LineCapStyle>,
    pub line_join_style: Option<LineJoinStyle>,
    pub miter_limit: Option<f32>,

    /// The line dash pattern, expressed as an array of the form [dashArray dashPhase],
    /// where dashArray shall be itself an array and dashPhase shall be an integer
    pub line_dash_pattern: Option<LineDashPattern>,

    /// The name of the rendering intent
    pub rendering_intent: Option<RenderingIntent>,

    /// An array of the form [font size], where font shall be an indirect reference to a font
    /// dictionary and size shall be a number expressed in text space units. These two objects
    /// correspond to the operands of the Tf operator; however, the first operand shall be an
    /// indirect object reference instead of a resource name
    pub font: Option<Object>,

    /// The transfer function, which maps the interval [0.0 1.0] to the interval [0.0 1.0]. The value
    /// shall be either a single function (which applies to all process colorants) or an array of four
    /// functions (which apply to the process colorants individually). The name Identity may be used to
    /// represent the identity function
    pub transfer: Option<TransferFunction>,

    /// Same as TR except that the value may also be the name Default, denoting the transfer function
    /// that was in effect at the start of the page. If both TR and TR2 are present in the same graphics
    /// state parameter dictionary, TR2 shall take precedence
    pub transfer_two: Option<TransferFunction>,

    /// The flatness tolerance controls the maximum permitted distance in device pixels between the
    /// mathematically correct path and an approximation constructed from straight line segments
    pub flatness_tolerance: Option<f32>,

    /// The smoothness tolerance controls the quality of smooth shading (type 2 patterns and the sh
    /// operator) and thus indirectly controls the rendering performance
    pub smoothness_tolerance: Option<f32>,

    /// A flag specifying whether to apply automatic stroke adjustment
    pub stroke_adjustment: Option<bool>,

    /// The current blend mode to be used in the transparent imaging model
    pub blend_mode: Option<BlendMode>,

    /// The current soft mask, specifying the mask shape or mask opacity values that shall
    /// be used in the transparent imaging model.
    ///
    /// Although the current soft mask is sometimes referred to as a "soft clip," altering
    /// it with the gs operator completely replaces the old value with the new one, rather
    /// than intersecting the two as is done with the current clipping path parameter
    pub soft_mask: Option<SoftMask>,

    /// The current stroking alpha constant, specifying the constant shape or constant
    /// opacity value that shall be used for stroking operations in the transparent imaging
    /// model
    pub stroking_alpha_constant: Option<f32>,

    /// Same as CA, but for nonstroking operations
    pub nonstroking_alpha_constant: Option<f32>,

    /// The alpha source flag, specifying whether the current soft mask and alpha constant
    /// shall be interpreted as shape values (true) or opacity values (false)
    pub alpha_is_shape: Option<bool>,
}

impl GraphicsStateParameters {
    pub fn from_dict(mut dict: Dictionary, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        dict.expect_type("ExtGState", resolver, false)?;

        let line_width = dict.get_number("LW", resolver)?;
        let line_cap_style = dict
            .get_integer("LC", resolver)?
            .map(LineCapStyle::from_integer)
            .transpose()?;
        let line_join_style = dict
            .get_integer("LJ", resolver)?
            .map(LineJoinStyle::from_integer)
            .transpose()?;
        let miter_limit = dict.get_number("ML", resolver)?;
        let line_dash_pattern = dict
            .get_arr("D", resolver)?
            .map(|arr| LineDashPattern::from_arr(arr, resolver))
            .transpose()?;
        let rendering_intent = dict
            .get_name("RI", resolver)?
            .map(|name| RenderingIntent::from_name_or_default(name.as_str()));
        let font = dict.get_object("Font");
        let transfer = dict
            .get_object("TR")
            .map(|obj| TransferFunction::from_obj(obj, resolver))
            .transpose()?;
        let transfer_two = dict
            .get_object("TR2")
            .map(|obj| TransferFunction::from_obj(obj, resolver))
            .transpose()?;
        let flatness_tolerance = dict.get_number("FL", resolver)?;
        let smoothness_tolerance = dict.get_number("SM", resolver)?;
        let stroke_adjustment = dict.get_bool("SA", resolver)?;

        let blend_mode = dict
            .get_object("BM")
            .map(|obj| BlendMode::from_obj(obj, resolver))
            .transpose()?;

        let soft_mask = dict
            .get_object("SMask")
            .map(|obj| SoftMask::from_obj(obj, resolver))
            .transpose()?;

        let stroking_alpha_constant = dict.get_number("CA", resolver)?;
        let nonstroking_alpha_constant = dict.get_number("ca", resolver)?;
        let alpha_is_shape = dict.get_bool("AIS", resolver)?;

        Ok(GraphicsStateParameters {
            line_width,
            line_cap_style,
            line_join_style,
            miter_limit,
            line_dash_pattern,
            rendering_intent,
            font,
            transfer,
            transfer_two,
            flatness_tolerance,
            smoothness_tolerance,
            stroke_adjustment,
            blend_mode,
            soft_mask,
            stroking_alpha_constant,
            nonstroking_alpha_constant,
            alpha_is_shape,
        })
    }

    /// TR2 takes precedence over TR when both are present
    pub fn effective_transfer(&self) -> Option<&TransferFunction> {
        self.transfer_two.as_ref().or(self.transfer.as_ref())
    }
}

/// The standard blend modes of the transparent imaging model. Mapping from
/// names is total: unknown names and the compatibility alias collapse to
/// Normal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    fn recognize(name: &str) -> Option<Self> {
        Some(match name {
            "Normal" | "Compatible" => Self::Normal,
            "Multiply" => Self::Multiply,
            "Screen" => Self::Screen,
            "Overlay" => Self::Overlay,
            "Darken" => Self::Darken,
            "Lighten" => Self::Lighten,
            "ColorDodge" => Self::ColorDodge,
            "ColorBurn" => Self::ColorBurn,
            "HardLight" => Self::HardLight,
            "SoftLight" => Self::SoftLight,
            "Difference" => Self::Difference,
            "Exclusion" => Self::Exclusion,
            "Hue" => Self::Hue,
            "Saturation" => Self::Saturation,
            "Color" => Self::Color,
            "Luminosity" => Self::Luminosity,
            _ => return None,
        })
    }

    pub fn from_name(name: &str) -> Self {
        Self::recognize(name).unwrap_or_else(|| {
            log::warn!("unknown blend mode {:?}, using Normal", name);
            Self::Normal
        })
    }

    /// A name or an array of names; the first recognized name wins
    pub fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        Ok(match resolver.resolve(obj)? {
            Object::Name(name) => Self::from_name(name.as_str()),
            Object::Array(names) => names
                .into_iter()
                .filter_map(|obj| resolver.assert_name(obj).ok())
                .find_map(|name| Self::recognize(&name))
                .unwrap_or_default(),
            found => {
                log::warn!("malformed blend mode object {:?}", found);
                Self::Normal
            }
        })
    }
}

#[derive(Debug, Clone)]
pub enum SoftMask {
    Dictionary(Box<SoftMaskDictionary>),
    None,
}

impl SoftMask {
    pub fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        let obj = resolver.resolve(obj)?;

        if obj.name_is("None") {
            return Ok(Self::None);
        }

        Ok(Self::Dictionary(Box::new(SoftMaskDictionary::from_dict(
            resolver.assert_dict(obj)?,
            resolver,
        )?)))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

#[derive(Debug, Clone)]
pub struct SoftMaskDictionary {
    /// A subtype specifying the method to be used in deriving the mask values from the
    /// transparency group specified by the G entry
    pub subtype: SoftMaskSubtype,

    /// A transparency group XObject to be used as the source of alpha or colour values
    /// for deriving the mask. If the subtype S is Luminosity, the group attributes
    /// dictionary shall contain a CS entry defining the colour space in which the compositing
    /// computation is to be performed
    pub transparency_group: Stream,

    /// An array of component values specifying the colour to be used as the backdrop against
    /// which to composite the transparency group XObject G. This entry shall be consulted only
    /// if the subtype S is Luminosity. The array shall consist of n numbers, where n is the
    /// number of components in the colour space specified by the CS entry in the group attributes
    /// dictionary.
    ///
    /// Default value: the colour space's initial value, representing black
    pub backdrop_color: Option<Vec<f32>>,

    /// A function object specifying the transfer function to be used
    /// in deriving the mask values. The function shall accept one input, the computed
    /// group alpha or luminosity (depending on the value of the subtype S), and shall
    /// return one output, the resulting mask value.
    ///
    /// Default value: Identity
    pub transfer_function: TransferFunction,

    /// The indirect object the mask form came from, when known; mask
    /// recording enters it on the recursion guard
    pub group_object_number: Option<usize>,
}

impl SoftMaskDictionary {
    pub fn from_dict(mut dict: Dictionary, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        let subtype = SoftMaskSubtype::from_str(dict.expect_name("S", resolver)?.as_str())?;

        let group_obj = dict
            .get_object("G")
            .ok_or_else(|| anyhow::anyhow!(crate::ParseError::MissingRequiredKey { key: "G" }))?;

        let group_object_number = match &group_obj {
            crate::Object::Reference(reference) => Some(reference.object_number),
            _ => None,
        };

        let transparency_group = resolver.assert_stream(group_obj)?;
        let backdrop_color = dict.get::<Vec<f32>>("BC", resolver)?;
        let transfer_function = dict
            .get_object("TR")
            .map(|obj| TransferFunction::from_obj(obj, resolver))
            .transpose()?
            .unwrap_or(TransferFunction::Identity);

        Ok(Self {
            subtype,
            transparency_group,
            backdrop_color,
            transfer_function,
            group_object_number,
        })
    }
}

#[pdf_enum]
pub enum SoftMaskSubtype {
    /// The group's computed alpha shall be used, disregarding its colour
    Alpha = "Alpha",

    /// The group's computed colour shall be converted to a single-component luminosity value
    Luminosity = "Luminosity",
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineDashPattern {
    pub dash_array: Vec<f32>,
    pub dash_phase: f32,
}

impl LineDashPattern {
    pub fn solid() -> Self {
        Self {
            dash_array: Vec::new(),
            dash_phase: 0.0,
        }
    }

    pub fn new(dash_array: Vec<f32>, dash_phase: f32) -> Self {
        Self {
            dash_array,
            dash_phase,
        }
    }

    pub fn from_arr(mut arr: Vec<Object>, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        assert_len(arr.len(), 2)?;

        let dash_phase = resolver.assert_number(arr.pop().unwrap())?;
        let dash_array = resolver
            .assert_arr(arr.pop().unwrap())?
            .into_iter()
            .map(|obj| resolver.assert_number(obj))
            .collect::<PdfResult<Vec<f32>>>()?;

        Ok(Self {
            dash_array,
            dash_phase,
        })
    }
}

impl Default for LineDashPattern {
    fn default() -> Self {
        Self::solid()
    }
}

#[pdf_enum]
pub enum RenderingIntent {
    AbsoluteColorimetric = "AbsoluteColorimetric",
    RelativeColorimetric = "RelativeColorimetric",
    Saturation = "Saturation",
    Perceptual = "Perceptual",
}

impl RenderingIntent {
    /// An unknown intent name degrades to the initial value rather than
    /// erroring
    pub fn from_name_or_default(name: &str) -> Self {
        Self::from_str(name).unwrap_or_else(|_| {
            log::warn!("unknown rendering intent {:?}", name);
            Self::RelativeColorimetric
        })
    }

    pub fn to_icc(self) -> IccRenderingIntent {
        match self {
            Self::AbsoluteColorimetric => IccRenderingIntent::AbsoluteColorimetric,
            Self::RelativeColorimetric => IccRenderingIntent::RelativeColorimetric,
            Self::Saturation => IccRenderingIntent::Saturation,
            Self::Perceptual => IccRenderingIntent::Perceptual,
        }
    }
}

impl Default for RenderingIntent {
    fn default() -> Self {
        Self::RelativeColorimetric
    }
}

#[pdf_enum(Integer)]
pub enum LineJoinStyle {
    Miter = 0,
    Round = 1,
    Bevel = 2,
}

#[pdf_enum(Integer)]
pub enum LineCapStyle {
    Butt = 0,
    Round = 1,
    ProjectingSquare = 2,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn blend_mode_mapping_is_total() {
        for (name, expected) in [
            ("Normal", BlendMode::Normal),
            ("Compatible", BlendMode::Normal),
            ("Multiply", BlendMode::Multiply),
            ("Screen", BlendMode::Screen),
            ("Overlay", BlendMode::Overlay),
            ("Darken", BlendMode::Darken),
            ("Lighten", BlendMode::Lighten),
            ("ColorDodge", BlendMode::ColorDodge),
            ("ColorBurn", BlendMode::ColorBurn),
            ("HardLight", BlendMode::HardLight),
            ("SoftLight", BlendMode::SoftLight),
            ("Difference", BlendMode::Difference),
            ("Exclusion", BlendMode::Exclusion),
            ("Hue", BlendMode::Hue),
            ("Saturation", BlendMode::Saturation),
            ("Color", BlendMode::Color),
            ("Luminosity", BlendMode::Luminosity),
            ("NotABlendMode", BlendMode::Normal),
        ] {
            assert_eq!(BlendMode::from_name(name), expected);
        }
    }

    #[test]
    fn first_recognized_blend_mode_in_array_wins() {
        use crate::{objects::Name, resolve::NoResolve};

        let mode = BlendMode::from_obj(
            Object::Array(vec![
                Object::Name(Name("Multiply".to_owned())),
                Object::Name(Name("Screen".to_owned())),
            ]),
            &mut NoResolve,
        )
        .unwrap();

        assert_eq!(mode, BlendMode::Multiply);
    }
}
