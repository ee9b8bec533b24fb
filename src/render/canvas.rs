use std::rc::Rc;

use crate::{
    data_structures::{Matrix, Rectangle},
    geometry::{FillRule, Path, Point},
    image::RasterImage,
    resources::graphics_state_parameters::{
        BlendMode, LineCapStyle, LineDashPattern, LineJoinStyle,
    },
};

/// The surface the renderer paints onto. Implementations range from raster
/// backends to the recording canvas used for tiling cells, soft masks, and
/// tests
pub trait Canvas {
    fn save(&mut self);
    fn restore(&mut self);

    /// Open an offscreen layer; subsequent marks composite into it, and the
    /// matching [Self::restore] applies `paint` when merging it down
    fn save_layer(&mut self, paint: &Paint);

    fn concat(&mut self, matrix: Matrix);
    fn clip_rect(&mut self, rect: Rectangle);
    fn clip_path(&mut self, path: &Path, rule: FillRule);

    fn draw_path(&mut self, path: &Path, paint: &Paint);
    fn draw_text_blob(&mut self, blob: &TextBlob, x: f32, y: f32, paint: &Paint);

    /// `dst` is the destination rectangle in current user space
    fn draw_image(&mut self, image: Rc<RasterImage>, dst: Rectangle, paint: &Paint);
    fn draw_picture(&mut self, picture: Rc<Picture>, paint: &Paint);

    /// The current clip bounds, expressed in the current local coordinate
    /// space
    fn local_clip_bounds(&self) -> Rectangle;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeMode {
    /// Ordinary painting: source over destination through the blend mode
    SrcOver,
    /// Keep destination pixels weighted by source alpha; used to apply a
    /// soft mask to a captured layer
    DstIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFilter {
    /// Replace alpha with the source luma; the color channels become
    /// opaque. Composing with [CompositeMode::DstIn] turns a luminosity
    /// rendering into a mask
    LumaToAlpha,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrokeParams {
    pub width: f32,
    pub cap: LineCapStyle,
    pub join: LineJoinStyle,
    pub miter_limit: f32,
    pub dash: LineDashPattern,
}

impl Default for StrokeParams {
    fn default() -> Self {
        Self {
            width: 1.0,
            cap: LineCapStyle::Butt,
            join: LineJoinStyle::Miter,
            miter_limit: 10.0,
            dash: LineDashPattern::solid(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaintStyle {
    Fill,
    Stroke(StrokeParams),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: [f32; 4],
}

/// The painted-geometry color sources beyond a solid color
#[derive(Debug, Clone)]
pub enum Shader {
    /// A recorded pattern cell repeated at fixed steps
    Tile {
        picture: Rc<Picture>,
        bbox: Rectangle,
        x_step: f32,
        y_step: f32,
        matrix: Matrix,
    },
    LinearGradient {
        start: Point,
        end: Point,
        stops: Vec<GradientStop>,
        extend: [bool; 2],
    },
    RadialGradient {
        start_center: Point,
        start_radius: f32,
        end_center: Point,
        end_radius: f32,
        stops: Vec<GradientStop>,
        extend: [bool; 2],
    },
}

#[derive(Debug, Clone)]
pub struct Paint {
    /// Non-premultiplied RGBA
    pub color: [f32; 4],
    pub style: PaintStyle,
    pub alpha: f32,
    pub blend_mode: BlendMode,
    pub composite: CompositeMode,
    pub color_filter: Option<ColorFilter>,
    pub shader: Option<Shader>,
    pub anti_alias: bool,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            color: [0.0, 0.0, 0.0, 1.0],
            style: PaintStyle::Fill,
            alpha: 1.0,
            blend_mode: BlendMode::Normal,
            composite: CompositeMode::SrcOver,
            color_filter: None,
            shader: None,
            anti_alias: true,
        }
    }
}

impl Paint {
    pub fn fill(color: [f32; 4]) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionedGlyph {
    pub glyph_id: u16,
    pub x: f32,
    pub y: f32,
}

/// A run of positioned glyphs sharing one font and size
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlob {
    pub glyphs: Vec<PositionedGlyph>,
    pub font_size: f32,
}

/// One recorded canvas call
#[derive(Debug, Clone)]
pub enum CanvasOp {
    Save,
    Restore,
    SaveLayer(Paint),
    Concat(Matrix),
    ClipRect(Rectangle),
    ClipPath { path: Path, rule: FillRule },
    DrawPath { path: Path, paint: Paint },
    DrawTextBlob { blob: TextBlob, x: f32, y: f32, paint: Paint },
    DrawImage { image: Rc<RasterImage>, dst: Rectangle, paint: Paint },
    DrawPicture { picture: Rc<Picture>, paint: Paint },
}

/// A replayable display list
#[derive(Debug, Clone, Default)]
pub struct Picture {
    pub ops: Vec<CanvasOp>,
    pub cull_rect: Rectangle,
}

impl Picture {
    /// Replay every recorded call onto another canvas
    pub fn playback(&self, canvas: &mut dyn Canvas) {
        for op in &self.ops {
            match op {
                CanvasOp::Save => canvas.save(),
                CanvasOp::Restore => canvas.restore(),
                CanvasOp::SaveLayer(paint) => canvas.save_layer(paint),
                CanvasOp::Concat(matrix) => canvas.concat(*matrix),
                CanvasOp::ClipRect(rect) => canvas.clip_rect(*rect),
                CanvasOp::ClipPath { path, rule } => canvas.clip_path(path, *rule),
                CanvasOp::DrawPath { path, paint } => canvas.draw_path(path, paint),
                CanvasOp::DrawTextBlob { blob, x, y, paint } => {
                    canvas.draw_text_blob(blob, *x, *y, paint)
                }
                CanvasOp::DrawImage { image, dst, paint } => {
                    canvas.draw_image(Rc::clone(image), *dst, paint)
                }
                CanvasOp::DrawPicture { picture, paint } => {
                    canvas.draw_picture(Rc::clone(picture), paint)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RecorderState {
    matrix: Matrix,
    /// Device-space clip bounds
    clip: Rectangle,
}

/// Records canvas calls into a [Picture]. Holds its buffer only until
/// [PictureRecorder::finish] hands the picture to the draw call that uses
/// it
#[derive(Debug)]
pub struct PictureRecorder {
    ops: Vec<CanvasOp>,
    cull_rect: Rectangle,
    state: RecorderState,
    stack: Vec<RecorderState>,
    layer_depth: u32,
}

impl PictureRecorder {
    pub fn new(cull_rect: Rectangle) -> Self {
        Self {
            ops: Vec::new(),
            cull_rect,
            state: RecorderState {
                matrix: Matrix::identity(),
                clip: cull_rect,
            },
            stack: Vec::new(),
            layer_depth: 0,
        }
    }

    pub fn finish(self) -> Picture {
        Picture {
            ops: self.ops,
            cull_rect: self.cull_rect,
        }
    }

    pub fn ops(&self) -> &[CanvasOp] {
        &self.ops
    }
}

impl Canvas for PictureRecorder {
    fn save(&mut self) {
        self.stack.push(self.state);
        self.ops.push(CanvasOp::Save);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
            self.ops.push(CanvasOp::Restore);
        }
    }

    fn save_layer(&mut self, paint: &Paint) {
        self.stack.push(self.state);
        self.layer_depth += 1;
        self.ops.push(CanvasOp::SaveLayer(paint.clone()));
    }

    fn concat(&mut self, matrix: Matrix) {
        self.state.matrix = matrix * self.state.matrix;
        self.ops.push(CanvasOp::Concat(matrix));
    }

    fn clip_rect(&mut self, rect: Rectangle) {
        let device = rect.transform(self.state.matrix);
        self.state.clip = self.state.clip.intersection(device);
        self.ops.push(CanvasOp::ClipRect(rect));
    }

    fn clip_path(&mut self, path: &Path, rule: FillRule) {
        let device = path.bounding_box().transform(self.state.matrix);
        self.state.clip = self.state.clip.intersection(device);
        self.ops.push(CanvasOp::ClipPath {
            path: path.clone(),
            rule,
        });
    }

    fn draw_path(&mut self, path: &Path, paint: &Paint) {
        self.ops.push(CanvasOp::DrawPath {
            path: path.clone(),
            paint: paint.clone(),
        });
    }

    fn draw_text_blob(&mut self, blob: &TextBlob, x: f32, y: f32, paint: &Paint) {
        self.ops.push(CanvasOp::DrawTextBlob {
            blob: blob.clone(),
            x,
            y,
            paint: paint.clone(),
        });
    }

    fn draw_image(&mut self, image: Rc<RasterImage>, dst: Rectangle, paint: &Paint) {
        self.ops.push(CanvasOp::DrawImage {
            image,
            dst,
            paint: paint.clone(),
        });
    }

    fn draw_picture(&mut self, picture: Rc<Picture>, paint: &Paint) {
        self.ops.push(CanvasOp::DrawPicture {
            picture,
            paint: paint.clone(),
        });
    }

    fn local_clip_bounds(&self) -> Rectangle {
        // map the device clip back into the local space
        match self.state.matrix.invert() {
            Some(inverse) => self.state.clip.transform(inverse),
            None => self.state.clip,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn clip_bounds_track_transform() {
        let mut recorder = PictureRecorder::new(Rectangle::new(0.0, 0.0, 100.0, 100.0));

        recorder.concat(Matrix::new_scale(2.0, 2.0));
        recorder.clip_rect(Rectangle::new(0.0, 0.0, 10.0, 10.0));

        let bounds = recorder.local_clip_bounds();
        assert!((bounds.width() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn restore_rewinds_clip() {
        let mut recorder = PictureRecorder::new(Rectangle::new(0.0, 0.0, 100.0, 100.0));

        recorder.save();
        recorder.clip_rect(Rectangle::new(0.0, 0.0, 5.0, 5.0));
        recorder.restore();

        assert_eq!(
            recorder.local_clip_bounds(),
            Rectangle::new(0.0, 0.0, 100.0, 100.0)
        );
    }

    #[test]
    fn playback_replays_in_order() {
        let mut recorder = PictureRecorder::new(Rectangle::new(0.0, 0.0, 10.0, 10.0));
        recorder.draw_path(
            &Path::from_rect(Rectangle::new(1.0, 1.0, 2.0, 2.0)),
            &Paint::fill([1.0, 0.0, 0.0, 1.0]),
        );

        let picture = recorder.finish();

        let mut target = PictureRecorder::new(Rectangle::new(0.0, 0.0, 10.0, 10.0));
        picture.playback(&mut target);

        assert_eq!(target.ops().len(), 1);
        assert!(matches!(target.ops()[0], CanvasOp::DrawPath { .. }));
    }
}
