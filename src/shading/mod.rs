use crate::{
    color::ColorSpace,
    data_structures::Rectangle,
    error::PdfResult,
    filter::decode_stream,
    function::Function,
    objects::{Dictionary, FromObj, Object, TypeOrArray},
    Resolve,
};

pub use self::{
    axial::AxialShading,
    function_based::FunctionBasedShading,
    mesh::{FreeformShading, LatticeformShading, MeshTriangle},
    patch::PatchMeshShading,
    radial::RadialShading,
};

mod axial;
mod function_based;
mod mesh;
mod patch;
mod radial;

/// A shading: the geometry-to-color mapping painted by the `sh` operator
/// and by shading patterns
#[derive(Debug)]
pub struct Shading {
    /// The colour space in which colour values shall be expressed. This may be any device,
    /// CIE-based, or special colour space except a Pattern space
    pub color_space: ColorSpace,

    /// An array of colour components appropriate to the colour space, specifying a single
    /// background colour value. If present, this colour shall be used, before any painting
    /// operation involving the shading, to fill those portions of the area to be painted
    /// that lie outside the bounds of the shading object
    ///
    /// The background colour is applied only when the shading is used as part of a shading
    /// pattern, not when it is painted directly with the sh operator
    pub background: Option<Vec<f32>>,

    /// An array of four numbers giving the left, bottom, right, and top coordinates,
    /// respectively, of the shading's bounding box. The coordinates shall be interpreted
    /// in the shading's target coordinate space. If present, this bounding box shall be
    /// applied as a temporary clipping boundary when the shading is painted, in addition
    /// to the current clipping path and any other clipping boundaries in effect at that
    /// time
    pub bbox: Option<Rectangle>,

    /// A flag indicating whether to filter the shading function to prevent aliasing artifacts
    ///
    /// Default value: false
    pub anti_alias: bool,

    pub subtype: ShadingSubtype,
}

#[derive(Debug)]
pub enum ShadingSubtype {
    FunctionBased(FunctionBasedShading),
    Axial(AxialShading),
    Radial(RadialShading),
    Freeform(FreeformShading),
    Latticeform(LatticeformShading),
    CoonsPatchMesh(PatchMeshShading),
    TensorProductPatchMesh(PatchMeshShading),
}

#[pdf_enum(Integer)]
pub enum ShadingType {
    FunctionBased = 1,
    Axial = 2,
    Radial = 3,

    /// Free-form Gouraud-shaded triangle mesh
    Freeform = 4,

    /// Lattice-form Gouraud-shaded triangle mesh
    Latticeform = 5,
    CoonsPatchMesh = 6,
    TensorProductPatchMesh = 7,
}

impl Shading {
    pub fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        let obj = resolver.resolve(obj)?;

        // mesh shadings are streams carrying their vertex data; the scalar
        // types are plain dictionaries
        let (mut dict, data) = match obj {
            Object::Stream(stream) => {
                let data = decode_stream(&stream.stream, &stream.dict, resolver)?.into_owned();
                (stream.dict.other, Some(data))
            }
            obj => (resolver.assert_dict(obj)?, None),
        };

        let shading_type = ShadingType::from_integer(dict.expect_integer("ShadingType", resolver)?)?;

        let color_space = ColorSpace::from_obj(dict.expect::<Object>("ColorSpace", resolver)?, resolver)?;

        let background = dict.get::<Vec<f32>>("Background", resolver)?;
        let bbox = dict.get::<Rectangle>("BBox", resolver)?;
        let anti_alias = dict.get_bool("AntiAlias", resolver)?.unwrap_or(false);

        let components = color_space.components();

        let subtype = match shading_type {
            ShadingType::FunctionBased => {
                ShadingSubtype::FunctionBased(FunctionBasedShading::from_dict(&mut dict, resolver)?)
            }
            ShadingType::Axial => {
                ShadingSubtype::Axial(AxialShading::from_dict(&mut dict, resolver)?)
            }
            ShadingType::Radial => {
                ShadingSubtype::Radial(RadialShading::from_dict(&mut dict, resolver)?)
            }
            ShadingType::Freeform => ShadingSubtype::Freeform(FreeformShading::from_dict(
                &mut dict,
                expect_mesh_data(data)?,
                components,
                resolver,
            )?),
            ShadingType::Latticeform => ShadingSubtype::Latticeform(
                LatticeformShading::from_dict(&mut dict, expect_mesh_data(data)?, components, resolver)?,
            ),
            ShadingType::CoonsPatchMesh => ShadingSubtype::CoonsPatchMesh(
                PatchMeshShading::from_dict(&mut dict, expect_mesh_data(data)?, components, false, resolver)?,
            ),
            ShadingType::TensorProductPatchMesh => ShadingSubtype::TensorProductPatchMesh(
                PatchMeshShading::from_dict(&mut dict, expect_mesh_data(data)?, components, true, resolver)?,
            ),
        };

        Ok(Self {
            color_space,
            background,
            bbox,
            anti_alias,
            subtype,
        })
    }
}

fn expect_mesh_data(data: Option<Vec<u8>>) -> PdfResult<Vec<u8>> {
    data.ok_or_else(|| anyhow::anyhow!("mesh shading requires a stream"))
}

/// A 1-in, n-out function, or an array of n 1-in, 1-out functions. Mesh and
/// scalar shadings share this shape
#[derive(Debug)]
pub enum ShadingFunction {
    Single(Function),
    PerComponent(Vec<Function>),
}

impl ShadingFunction {
    pub fn from_dict(dict: &mut Dictionary, resolver: &mut dyn Resolve) -> PdfResult<Option<Self>> {
        Ok(
            match dict.get::<TypeOrArray<Object>>("Function", resolver)? {
                Some(TypeOrArray::Type(obj)) => {
                    Some(ShadingFunction::Single(Function::from_obj(obj, resolver)?))
                }
                Some(TypeOrArray::Array(objs)) => Some(ShadingFunction::PerComponent(
                    objs.into_iter()
                        .map(|obj| Function::from_obj(obj, resolver))
                        .collect::<PdfResult<Vec<Function>>>()?,
                )),
                None => None,
            },
        )
    }

    /// Evaluate at parametric position `t`, producing color components
    pub fn eval(&self, t: f32) -> PdfResult<Vec<f32>> {
        match self {
            ShadingFunction::Single(function) => function.eval(&[t]),
            ShadingFunction::PerComponent(functions) => functions
                .iter()
                .map(|function| function.eval_single(t))
                .collect(),
        }
    }
}
