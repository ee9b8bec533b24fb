use std::rc::Rc;

use crate::resources::graphics_state_parameters::{BlendMode, SoftMaskSubtype};

use super::canvas::{Canvas, ColorFilter, CompositeMode, Paint, Picture};

/// A soft-mask bracket around one mark.
///
/// On begin, a layer captures the unmodified content. On end, the recorded
/// mask picture composes over the captured layer with destination-in
/// blending (luminosity masks additionally route through a luma-to-alpha
/// color filter), and the layer is restored. `end` consumes the scope, so
/// the bracket closes exactly once on every exit path; the renderer's
/// closure-shaped caller runs it even when the content errors
#[must_use = "a begun soft-mask scope must be ended"]
pub struct SoftMaskScope {
    _private: (),
}

impl SoftMaskScope {
    pub fn begin(canvas: &mut dyn Canvas) -> Self {
        // capture the unmodified content in its own layer
        canvas.save_layer(&Paint::default());

        Self { _private: () }
    }

    /// Compose the mask and close the layer. A mask that failed to record
    /// leaves the content unmasked rather than dropping it
    pub fn end(
        self,
        canvas: &mut dyn Canvas,
        mask_picture: Option<Rc<Picture>>,
        subtype: SoftMaskSubtype,
    ) {
        if let Some(picture) = mask_picture {
            canvas.draw_picture(picture, &mask_compose_paint(subtype));
        }

        canvas.restore();
    }
}

/// The paint that turns a recorded mask rendering into per-pixel alpha:
/// destination-in keeps content weighted by the mask's alpha, and
/// luminosity masks first convert luma to alpha
pub fn mask_compose_paint(subtype: SoftMaskSubtype) -> Paint {
    Paint {
        composite: CompositeMode::DstIn,
        color_filter: match subtype {
            SoftMaskSubtype::Luminosity => Some(ColorFilter::LumaToAlpha),
            SoftMaskSubtype::Alpha => None,
        },
        blend_mode: BlendMode::Normal,
        ..Paint::default()
    }
}

/// The paint used when merging a transparency group's layer onto its
/// parent: the group as a whole takes the surrounding alpha and blend mode
pub fn group_layer_paint(alpha: f32, blend_mode: BlendMode) -> Paint {
    Paint {
        alpha,
        blend_mode,
        ..Paint::default()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        data_structures::Rectangle,
        render::canvas::{CanvasOp, PictureRecorder},
    };

    #[test]
    fn luminosity_mask_paint_has_luma_filter() {
        let paint = mask_compose_paint(SoftMaskSubtype::Luminosity);

        assert_eq!(paint.composite, CompositeMode::DstIn);
        assert_eq!(paint.color_filter, Some(ColorFilter::LumaToAlpha));
    }

    #[test]
    fn alpha_mask_paint_composes_raw_alpha() {
        let paint = mask_compose_paint(SoftMaskSubtype::Alpha);

        assert_eq!(paint.composite, CompositeMode::DstIn);
        assert_eq!(paint.color_filter, None);
    }

    #[test]
    fn scope_brackets_layer_and_composes_mask() {
        let mut canvas = PictureRecorder::new(Rectangle::new(0.0, 0.0, 10.0, 10.0));

        let scope = SoftMaskScope::begin(&mut canvas);
        // mark would render here
        scope.end(
            &mut canvas,
            Some(Rc::new(Picture::default())),
            SoftMaskSubtype::Luminosity,
        );

        let ops = canvas.ops();
        assert!(matches!(ops[0], CanvasOp::SaveLayer(..)));
        assert!(matches!(ops[1], CanvasOp::DrawPicture { .. }));
        assert!(matches!(ops[2], CanvasOp::Restore));
    }
}
