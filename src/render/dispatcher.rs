use std::rc::Rc;

use crate::{
    data_structures::{Matrix, Rectangle},
    geometry::{FillRule, Path},
    image::RasterImage,
};

use super::canvas::{Canvas, Paint, Picture, TextBlob};

/// The facade between the content interpreter and the specialized
/// renderers. Stateless: every call carries the canvas and the prepared
/// paint, and each routes to exactly one family of canvas primitives
pub struct RenderDispatcher;

impl RenderDispatcher {
    /// Paint a finished path. The path is already in device space; the
    /// fill rule travels on the canvas call
    pub fn draw_path(canvas: &mut dyn Canvas, path: &Path, paint: &Paint, _rule: FillRule) {
        canvas.draw_path(path, paint);
    }

    /// Emit a run of shaped glyphs.
    ///
    /// The blob's glyph positions are in device space with Y growing up
    /// (the text-space convention); glyph rendering needs Y down. The flip
    /// is applied locally around the emission, never globally, since paths
    /// already use device-oriented Y after the CTM
    pub fn draw_text_sequence(
        canvas: &mut dyn Canvas,
        blob: &TextBlob,
        origin: (f32, f32),
        paint: &Paint,
    ) {
        let (x, y) = origin;

        canvas.save();
        // flip around the baseline
        canvas.concat(
            Matrix::new_translate(0.0, -y) * Matrix::new_flip_y(0.0) * Matrix::new_translate(0.0, y),
        );
        canvas.draw_text_blob(blob, x, y, paint);
        canvas.restore();
    }

    /// Draw a decoded image into the unit square [0,1] x [0,1] of the
    /// current user space. Image sample rows run top-down, so the unit
    /// square is flipped before the image lands in it
    pub fn draw_image(
        canvas: &mut dyn Canvas,
        image: Rc<RasterImage>,
        ctm: Matrix,
        paint: &Paint,
    ) {
        canvas.save();
        canvas.concat(ctm);
        canvas.concat(Matrix::new_flip_y(1.0));
        canvas.draw_image(image, Rectangle::new(0.0, 0.0, 1.0, 1.0), paint);
        canvas.restore();
    }

    /// Paint a shading's prepared picture (mesh triangles, gradient fill)
    pub fn draw_shading(canvas: &mut dyn Canvas, picture: Rc<Picture>, paint: &Paint) {
        canvas.draw_picture(picture, paint);
    }

    /// Replay a recorded form or group layer
    pub fn draw_form(canvas: &mut dyn Canvas, picture: Rc<Picture>, paint: &Paint) {
        canvas.draw_picture(picture, paint);
    }
}
