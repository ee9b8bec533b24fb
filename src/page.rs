use std::rc::Rc;

use crate::{
    data_structures::{Matrix, Rectangle},
    error::PdfResult,
    filter::decode_stream,
    objects::{Object, TypeOrArray},
    render::{Canvas, RenderParams, Renderer, TextShaper},
    resources::{ResourceSet, Resources},
    Resolve,
};

/// One page: its geometry, its resource dictionary with the per-page
/// name-to-resource cache, and its combined content stream. Pages hold no
/// mutable global state
#[derive(Debug)]
pub struct Page {
    /// A rectangle expressed in default user space units, that shall define
    /// the boundaries of the physical medium on which the page shall be
    /// displayed or printed
    pub media_box: Rectangle,

    /// A rectangle, expressed in default user space units, that shall define
    /// the visible region of default user space. When the page is displayed
    /// or printed, its contents shall be clipped (cropped) to this rectangle
    pub crop_box: Option<Rectangle>,

    /// The number of degrees by which the page shall be rotated clockwise
    /// when displayed or printed. The value shall be a multiple of 90.
    ///
    /// Default value: 0
    pub rotate: i32,

    pub resources: Rc<ResourceSet>,

    /// The decoded, concatenated content streams of the page
    pub contents: Vec<u8>,

    /// A positive number that shall give the size of default user space
    /// units, in multiples of 1/72 inch.
    ///
    /// Default value: 1.0
    pub user_unit: f32,
}

/// US Letter, the fallback when a page carries no media box
const DEFAULT_MEDIA_BOX: Rectangle = Rectangle {
    lower_left_x: 0.0,
    lower_left_y: 0.0,
    upper_right_x: 612.0,
    upper_right_y: 792.0,
};

impl Page {
    pub fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        let mut dict = resolver.assert_dict(obj)?;

        let media_box = dict
            .get::<Rectangle>("MediaBox", resolver)?
            .unwrap_or_else(|| {
                log::warn!("page without MediaBox, assuming letter size");
                DEFAULT_MEDIA_BOX
            });

        let crop_box = dict.get::<Rectangle>("CropBox", resolver)?;

        let rotate = dict
            .get_integer("Rotate", resolver)?
            .map(|rotate| rotate.rem_euclid(360) / 90 * 90)
            .unwrap_or(0);

        let resources = match dict.get_dict("Resources", resolver)? {
            Some(dict) => Rc::new(ResourceSet::new(Resources::from_dict(dict, resolver)?)),
            None => Rc::new(ResourceSet::empty()),
        };

        let user_unit = dict.get_number("UserUnit", resolver)?.unwrap_or(1.0);

        let contents = match dict.get::<TypeOrArray<Object>>("Contents", resolver)? {
            Some(streams) => {
                let mut combined = Vec::new();

                for obj in streams.to_vec() {
                    let stream = resolver.assert_stream(obj)?;
                    combined.extend_from_slice(&decode_stream(
                        &stream.stream,
                        &stream.dict,
                        resolver,
                    )?);
                    // content streams are concatenated with a separating
                    // newline so tokens never fuse across boundaries
                    combined.push(b'\n');
                }

                combined
            }
            None => Vec::new(),
        };

        Ok(Self {
            media_box,
            crop_box,
            rotate,
            resources,
            contents,
            user_unit,
        })
    }

    /// The visible region: the crop box intersected with the media box,
    /// or the media box alone
    pub fn visible_box(&self) -> Rectangle {
        match self.crop_box {
            Some(crop_box) => crop_box.intersection(self.media_box),
            None => self.media_box,
        }
    }

    /// Page dimensions in default user space after rotation
    pub fn rotated_size(&self) -> (f32, f32) {
        let visible = self.visible_box();

        if self.rotate % 180 == 0 {
            (visible.width(), visible.height())
        } else {
            (visible.height(), visible.width())
        }
    }

    /// Interpret the page's content stream onto a canvas. `base_matrix`
    /// maps default user space to the device; page rotation and the
    /// media-box origin compose into it
    pub fn render(
        &self,
        canvas: &mut dyn Canvas,
        resolver: &mut dyn Resolve,
        shaper: &dyn TextShaper,
        base_matrix: Matrix,
    ) -> PdfResult<()> {
        let visible = self.visible_box();

        let origin = Matrix::new_translate(-visible.lower_left_x, -visible.lower_left_y);

        let rotation = match self.rotate {
            90 => Matrix::new(0.0, 1.0, -1.0, 0.0, visible.height(), 0.0),
            180 => Matrix::new(-1.0, 0.0, 0.0, -1.0, visible.width(), visible.height()),
            270 => Matrix::new(0.0, -1.0, 1.0, 0.0, 0.0, visible.width()),
            _ => Matrix::identity(),
        };

        let params = RenderParams {
            base_matrix: origin * rotation * base_matrix,
        };

        let mut renderer = Renderer::new(
            canvas,
            resolver,
            shaper,
            Rc::clone(&self.resources),
            params,
        );

        renderer.render(&self.contents)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{objects::Dictionary, resolve::NoResolve};
    use std::collections::HashMap;

    fn page(entries: Vec<(&str, Object)>) -> Page {
        let dict = Dictionary::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v))
                .collect::<HashMap<_, _>>(),
        );

        Page::from_obj(Object::Dictionary(dict), &mut NoResolve).unwrap()
    }

    fn rect(values: [f32; 4]) -> Object {
        Object::Array(values.iter().map(|&v| Object::Real(v)).collect())
    }

    #[test]
    fn missing_media_box_defaults_to_letter() {
        let page = page(vec![]);

        assert_eq!(page.media_box.width(), 612.0);
        assert_eq!(page.media_box.height(), 792.0);
    }

    #[test]
    fn rotation_swaps_dimensions() {
        let page = page(vec![
            ("MediaBox", rect([0.0, 0.0, 200.0, 100.0])),
            ("Rotate", Object::Integer(90)),
        ]);

        assert_eq!(page.rotated_size(), (100.0, 200.0));
    }

    #[test]
    fn negative_rotation_normalizes() {
        let page = page(vec![
            ("MediaBox", rect([0.0, 0.0, 200.0, 100.0])),
            ("Rotate", Object::Integer(-90)),
        ]);

        assert_eq!(page.rotate, 270);
    }

    #[test]
    fn crop_box_clips_to_media_box() {
        let page = page(vec![
            ("MediaBox", rect([0.0, 0.0, 100.0, 100.0])),
            ("CropBox", rect([50.0, 50.0, 150.0, 150.0])),
        ]);

        assert_eq!(page.visible_box(), Rectangle::new(50.0, 50.0, 100.0, 100.0));
    }
}
