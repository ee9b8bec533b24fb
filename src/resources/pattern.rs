use std::rc::Rc;

use crate::{
    data_structures::{Matrix, Rectangle},
    error::PdfResult,
    filter::decode_stream,
    objects::Object,
    shading::Shading,
    stream::Stream,
    FromObj, Resolve,
};

use super::{graphics_state_parameters::GraphicsStateParameters, ResourceSet, Resources};

#[derive(Debug)]
pub enum Pattern {
    /// Tiling patterns consist of a small graphical figure (called a pattern cell) that is
    /// replicated at fixed horizontal and vertical intervals to fill the area to be painted.
    /// The graphics objects to use for tiling shall be described by a content stream
    Tiling(TilingPattern),

    /// Shading patterns define a gradient fill that produces a smooth transition between
    /// colours across the area. The colour to use shall be specified as a function of position
    /// using any of a variety of methods
    Shading(ShadingPattern),
}

impl Pattern {
    const TYPE: &'static str = "Pattern";
}

impl FromObj for Pattern {
    fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        let obj = resolver.resolve(obj)?;

        Ok(if let Object::Stream(mut stream) = obj {
            stream.dict.other.expect_type(Self::TYPE, resolver, false)?;

            let pattern_type =
                PatternType::from_integer(stream.dict.other.expect_integer("PatternType", resolver)?)?;

            match pattern_type {
                PatternType::Tiling => Pattern::Tiling(TilingPattern::from_stream(stream, resolver)?),
                PatternType::Shading => anyhow::bail!("shading patterns are dictionaries"),
            }
        } else {
            let mut dict = resolver.assert_dict(obj)?;
            dict.expect_type(Self::TYPE, resolver, false)?;

            let pattern_type = PatternType::from_integer(dict.expect_integer("PatternType", resolver)?)?;

            match pattern_type {
                PatternType::Shading => {
                    Pattern::Shading(ShadingPattern::from_dict_inner(dict, resolver)?)
                }
                PatternType::Tiling => anyhow::bail!("tiling patterns are streams"),
            }
        })
    }
}

#[derive(Debug)]
pub struct TilingPattern {
    /// A code that determines how the colour of the pattern cell shall be specified
    pub paint_type: PaintType,

    /// A code that controls adjustments to the spacing of tiles relative to the device pixel grid
    pub tiling_type: TilingType,

    /// An array of four numbers in the pattern coordinate system giving the coordinates of the
    /// left, bottom, right, and top edges, respectively, of the pattern cell's bounding box. These
    /// boundaries shall be used to clip the pattern cell
    pub bbox: Rectangle,

    /// The desired horizontal spacing between pattern cells, measured in the pattern coordinate system
    pub x_step: f32,

    /// The desired vertical spacing between pattern cells, measured in the pattern coordinate system
    ///
    /// XStep and YStep may differ from the dimensions of the pattern cell implied by the BBox entry.
    /// This allows tiling with irregularly shaped figures
    ///
    /// XStep and YStep may be either positive or negative but shall not be zero
    pub y_step: f32,

    /// A resource dictionary that shall contain all of the named resources required by the pattern's
    /// content stream
    pub resources: Rc<ResourceSet>,

    /// An array of six numbers specifying the pattern matrix.
    ///
    /// Default value: the identity matrix [1 0 0 1 0 0].
    pub matrix: Matrix,

    /// The decoded cell content stream
    pub content: Vec<u8>,

    /// The indirect object this pattern came from, when known; cell
    /// recording enters it on the recursion guard
    pub object_number: Option<usize>,
}

impl TilingPattern {
    pub fn from_stream(stream: Stream, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        let content = decode_stream(&stream.stream, &stream.dict, resolver)?.into_owned();

        let mut dict = stream.dict.other;
        let paint_type = PaintType::from_integer(dict.expect_integer("PaintType", resolver)?)?;
        let tiling_type = TilingType::from_integer(dict.expect_integer("TilingType", resolver)?)?;
        let bbox = dict.expect::<Rectangle>("BBox", resolver)?;
        let x_step = dict.expect_number("XStep", resolver)?;
        let y_step = dict.expect_number("YStep", resolver)?;
        let resources = Rc::new(ResourceSet::new(Resources::from_dict(
            dict.expect_dict("Resources", resolver)?,
            resolver,
        )?));
        let matrix = dict
            .get::<Matrix>("Matrix", resolver)?
            .unwrap_or_else(Matrix::identity);

        anyhow::ensure!(x_step != 0.0 && y_step != 0.0, "tile steps shall not be zero");

        Ok(Self {
            paint_type,
            tiling_type,
            bbox,
            x_step,
            y_step,
            resources,
            matrix,
            content,
            object_number: None,
        })
    }
}

#[derive(Debug)]
pub struct ShadingPattern {
    /// A shading object defining the shading pattern's gradient fill
    pub shading: Rc<Shading>,

    /// An array of six numbers specifying the pattern matrix
    ///
    /// Default value: the identity matrix [1 0 0 1 0 0].
    pub matrix: Matrix,

    /// A graphics state parameter dictionary containing graphics state parameters to be put
    /// into effect temporarily while the shading pattern is painted. Any parameters that are
    /// so specified shall be inherited from the graphics state that was in effect at the
    /// beginning of the content stream in which the pattern is defined as a resource
    pub ext_g_state: Option<GraphicsStateParameters>,
}

impl ShadingPattern {
    fn from_dict_inner(
        mut dict: crate::objects::Dictionary,
        resolver: &mut dyn Resolve,
    ) -> PdfResult<Self> {
        let shading = Rc::new(Shading::from_obj(
            dict.get_object("Shading")
                .ok_or_else(|| anyhow::anyhow!("shading pattern missing Shading entry"))?,
            resolver,
        )?);

        let matrix = dict
            .get::<Matrix>("Matrix", resolver)?
            .unwrap_or_else(Matrix::identity);

        let ext_g_state = dict
            .get_dict("ExtGState", resolver)?
            .map(|dict| GraphicsStateParameters::from_dict(dict, resolver))
            .transpose()?;

        Ok(Self {
            shading,
            matrix,
            ext_g_state,
        })
    }
}

#[pdf_enum(Integer)]
pub enum PatternType {
    Tiling = 1,
    Shading = 2,
}

#[pdf_enum(Integer)]
pub enum PaintType {
    /// The pattern's content stream shall specify the colours used to paint the pattern
    /// cell. When the content stream begins execution, the current colour is the one
    /// that was initially in effect in the pattern's parent content stream
    Colored = 1,

    /// The pattern's content stream shall not specify any colour information. Instead,
    /// the entire pattern cell is painted with a separately specified colour each time
    /// the pattern is used. Essentially, the content stream describes a stencil
    /// through which the current colour shall be poured
    Uncolored = 2,
}

#[pdf_enum(Integer)]
pub enum TilingType {
    /// Pattern cells shall be spaced consistently -- that is, by a multiple of a device
    /// pixel. To achieve this, the conforming reader may need to distort the pattern
    /// cell slightly by making small adjustments to XStep, YStep, and the transformation
    /// matrix. The amount of distortion shall not exceed 1 device pixel
    ConstantSpacing = 1,

    /// The pattern cell shall not be distorted, but the spacing between pattern cells
    /// may vary by as much as 1 device pixel, both horizontally and vertically, when
    /// the pattern is painted. This achieves the spacing requested by XStep and YStep
    /// on average but not necessarily for each individual pattern cell
    NoDistortion = 2,

    /// Pattern cells shall be spaced consistently as in tiling type 1 but with additional
    /// distortion permitted to enable a more efficient implementation. Sampled
    /// identically to constant spacing here
    ConstantSpacingAndFasterTiling = 3,
}
