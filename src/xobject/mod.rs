use crate::{error::PdfResult, stream::Stream, Resolve};

pub use self::{form::FormXObject, form::GroupAttributes, image::ImageXObject};

mod form;
mod image;

/// An external object (commonly called an XObject) is a graphics object
/// whose contents are defined by a self-contained stream, separate from the
/// content stream in which it is used
#[derive(Debug)]
pub enum XObject {
    Image(ImageXObject),
    Form(FormXObject),
}

#[pdf_enum]
enum XObjectSubtype {
    PostScript = "PS",
    Image = "Image",
    Form = "Form",
}

impl XObject {
    const TYPE: &'static str = "XObject";

    /// `object_number` is the indirect object this stream came from, when
    /// known; the form recursion guard tracks object numbers
    pub fn from_stream(
        mut stream: Stream,
        object_number: Option<usize>,
        resolver: &mut dyn Resolve,
    ) -> PdfResult<Self> {
        let dict = &mut stream.dict.other;

        dict.expect_type(Self::TYPE, resolver, false)?;

        let subtype = XObjectSubtype::from_str(dict.expect_name("Subtype", resolver)?.as_str())?;

        Ok(match subtype {
            XObjectSubtype::Image => {
                XObject::Image(ImageXObject::from_stream(stream, resolver)?)
            }
            XObjectSubtype::Form => {
                XObject::Form(FormXObject::from_stream(stream, object_number, resolver)?)
            }
            XObjectSubtype::PostScript => {
                anyhow::bail!("postscript xobjects target postscript output devices")
            }
        })
    }
}
