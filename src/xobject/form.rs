use std::rc::Rc;

use crate::{
    color::ColorSpace,
    data_structures::{Matrix, Rectangle},
    error::PdfResult,
    filter::decode_stream,
    objects::{Dictionary, FromObj, Object},
    resources::{ResourceSet, Resources},
    stream::Stream,
    Resolve,
};

#[derive(Debug)]
pub struct FormXObject {
    /// An array of four numbers in the form coordinate system, giving the
    /// coordinates of the left, bottom, right, and top edges, respectively, of the form
    /// XObject's bounding box. These boundaries shall be used to clip the form XObject and
    /// to determine its size for caching
    pub bbox: Rectangle,

    /// An array of six numbers specifying the form matrix, which maps form space into
    /// user space
    ///
    /// Default value: the identity matrix [1 0 0 1 0 0].
    pub matrix: Matrix,

    /// A dictionary specifying any resources (such as fonts and images) required by the
    /// form XObject.
    ///
    /// In PDF 1.2 and later versions, form XObjects may be independent of the content
    /// streams in which they appear, and this is strongly recommended although not required.
    /// In an independent form XObject, the resource dictionary of the form XObject is required
    /// and shall contain all named resources used by the form XObject
    pub resources: Option<Rc<ResourceSet>>,

    /// A group attributes dictionary indicating that the contents of the form XObject shall
    /// be treated as a group and specifying the attributes of that group
    pub group: Option<GroupAttributes>,

    /// The decoded content stream of the form
    pub content: Vec<u8>,

    /// The indirect object number this form came from, used by the
    /// recursion guard. Forms defined inline have none and are never
    /// guarded
    pub object_number: Option<usize>,
}

impl FormXObject {
    pub fn from_stream(
        stream: Stream,
        object_number: Option<usize>,
        resolver: &mut dyn Resolve,
    ) -> PdfResult<Self> {
        let content = decode_stream(&stream.stream, &stream.dict, resolver)?.into_owned();

        let mut dict = stream.dict.other;

        let bbox = dict.expect::<Rectangle>("BBox", resolver)?;
        let matrix = dict
            .get::<Matrix>("Matrix", resolver)?
            .unwrap_or_else(Matrix::identity);

        let resources = dict
            .get_dict("Resources", resolver)?
            .map(|dict| {
                Ok::<_, anyhow::Error>(Rc::new(ResourceSet::new(Resources::from_dict(
                    dict, resolver,
                )?)))
            })
            .transpose()?;

        let group = dict
            .get_dict("Group", resolver)?
            .map(|dict| GroupAttributes::from_dict(dict, resolver))
            .transpose()?;

        Ok(Self {
            bbox,
            matrix,
            resources,
            group,
            content,
            object_number,
        })
    }
}

/// A group attributes dictionary: the form's content shall be treated as a
/// transparency group, composed into its own buffer before being blended
/// onto the parent
#[derive(Debug)]
pub struct GroupAttributes {
    /// The group colour space, used for interpolating colour values during
    /// compositing within the group. Required for luminosity soft masks;
    /// resolved through the page's color pipeline
    pub color_space: Option<ColorSpace>,

    /// A flag specifying whether the group is isolated: whether it
    /// composites against a fully transparent initial backdrop rather than
    /// the group's own backdrop
    ///
    /// Default value: false
    pub isolated: bool,

    /// A flag specifying whether the group is knockout: whether each
    /// element composites against the group's initial backdrop rather than
    /// the stack of earlier elements
    ///
    /// Default value: false
    pub knockout: bool,
}

impl GroupAttributes {
    pub fn from_dict(mut dict: Dictionary, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        let subtype = dict.expect_name("S", resolver)?;

        if subtype != "Transparency" {
            anyhow::bail!(crate::ParseError::MismatchedTypeKey {
                expected: "Transparency",
                found: subtype.0,
            });
        }

        let color_space = match dict.get_object("CS") {
            Some(obj) if !matches!(obj, Object::Null) => {
                Some(ColorSpace::from_obj(obj, resolver)?)
            }
            _ => None,
        };

        let isolated = dict.get_bool("I", resolver)?.unwrap_or(false);
        let knockout = dict.get_bool("K", resolver)?.unwrap_or(false);

        Ok(Self {
            color_space,
            isolated,
            knockout,
        })
    }
}
