use std::{cell::RefCell, collections::HashSet, rc::Rc};

use crate::{
    color::ColorSpace,
    data_structures::Matrix,
    function::TransferFunction,
    geometry::{FillRule, Path},
    resources::{
        graphics_state_parameters::{
            BlendMode, GraphicsStateParameters, LineCapStyle, LineDashPattern, LineJoinStyle,
            RenderingIntent, SoftMask,
        },
        pattern::Pattern,
    },
};

use super::text_state::TextState;

/// The set of object numbers currently being rendered. Entering an XObject
/// already in the set drops the reference; this is the sole mechanism
/// preventing unbounded recursion across forms, tiling patterns, and soft
/// masks.
///
/// Carried on the graphics state, never global, so concurrent pages render
/// independently. `save`/`restore` share the set rather than copying it
pub type RecursionGuard = Rc<RefCell<HashSet<usize>>>;

/// The current paint: a solid color in some color space, or a pattern with
/// its resolved tint
#[derive(Debug, Clone)]
pub enum PaintSource {
    Solid {
        space: ColorSpace,
        components: Vec<f32>,
    },
    Pattern {
        pattern: Option<Rc<Pattern>>,
        /// For uncolored patterns, the tint operands and the space they
        /// resolve through
        tint: Option<(ColorSpace, Vec<f32>)>,
        /// The underlying space declared alongside the Pattern family,
        /// used to interpret `scn` tint operands
        underlying: Option<ColorSpace>,
    },
}

impl PaintSource {
    pub fn black() -> Self {
        PaintSource::Solid {
            space: ColorSpace::DeviceGray,
            components: vec![0.0],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClipState {
    /// The intersection of all clip paths since the last `save` consumed by
    /// this scope, kept as recorded paths
    pub paths: Vec<(Path, FillRule)>,
}

impl ClipState {
    pub fn unclipped() -> Self {
        Self { paths: Vec::new() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GraphicsState {
    pub device_independent: DeviceIndependentGraphicsState,
    pub device_dependent: DeviceDependentGraphicsState,
}

#[derive(Debug, Clone)]
pub struct DeviceIndependentGraphicsState {
    /// The current transformation matrix, which maps positions from user
    /// coordinates to device coordinates. This matrix is modified by each
    /// application of the coordinate transformation operator, cm.
    ///
    /// Initial value: a matrix that transforms default user coordinates
    /// to device coordinates
    pub current_transformation_matrix: Matrix,

    /// The current clipping path, which defines the boundary against which
    /// all output shall be cropped.
    ///
    /// Initial value: the boundary of the entire imageable portion of the
    /// output page
    pub clip: ClipState,

    /// The current colour to be used during painting operations, stored
    /// alongside its colour space. There are two separate colour
    /// parameters: one for stroking and one for all other painting
    /// operations.
    ///
    /// Initial value: black in DeviceGray
    pub stroke_paint: PaintSource,
    pub fill_paint: PaintSource,

    /// The thickness, in user space units, of paths to be stroked
    ///
    /// Initial value: 1.0
    pub line_width: f32,

    /// A code specifying the shape of the endpoints for any open path that is
    /// stroked
    ///
    /// Initial value: 0, for square butt caps
    pub line_cap_style: LineCapStyle,

    /// A code specifying the shape of joints between connected segments of a
    /// stroked path
    ///
    /// Initial value: 0, for mitered joins
    pub line_join_style: LineJoinStyle,

    /// The maximum length of mitered line joins for stroked paths
    ///
    /// Initial value: 10.0, for a miter cutoff below approximately 11.5
    /// degrees
    pub miter_limit: f32,

    /// A description of the dash pattern to be used when paths are stroked.
    ///
    /// Initial value: a solid line
    pub line_dash_pattern: LineDashPattern,

    /// The rendering intent to be used when converting CIE-based colours to
    /// device colours.
    ///
    /// Initial value: RelativeColorimetric
    pub rendering_intent: RenderingIntent,

    /// A flag specifying whether to compensate for possible rasterization
    /// effects when stroking a path with a line width that is small relative
    /// to the pixel resolution of the output device.
    ///
    /// Initial value: false
    pub stroke_adjustment: bool,

    /// The current blend mode to be used in the transparent imaging model.
    /// Implicitly reset to its initial value at the beginning of execution
    /// of a transparency group XObject.
    ///
    /// Initial value: Normal
    pub blend_mode: BlendMode,

    /// A soft-mask dictionary specifying the mask shape or mask opacity values
    /// to be used in the transparent imaging model, or None if no such
    /// mask is specified.
    ///
    /// Initial value: None
    pub soft_mask: SoftMask,

    /// The constant shape or constant opacity value to be used in the
    /// transparent imaging model. There are two separate alpha constant
    /// parameters: one for stroking and one for all other painting
    /// operations.
    ///
    /// Initial value: 1.0
    pub stroking_alpha_constant: f32,
    pub nonstroking_alpha_constant: f32,

    /// A flag specifying whether the current soft mask and alpha constant
    /// parameters shall be interpreted as shape values (true) or opacity
    /// values (false).
    ///
    /// Initial value: false
    pub alpha_source: bool,

    pub text_state: TextState,

    /// Shared across `save`/`restore`: membership survives state brackets
    /// by design of the guard, not of the bracket
    pub recursion_guard: RecursionGuard,
}

impl Default for DeviceIndependentGraphicsState {
    fn default() -> Self {
        Self {
            current_transformation_matrix: Matrix::identity(),
            clip: ClipState::unclipped(),
            stroke_paint: PaintSource::black(),
            fill_paint: PaintSource::black(),
            line_width: 1.0,
            line_cap_style: LineCapStyle::Butt,
            line_join_style: LineJoinStyle::Miter,
            miter_limit: 10.0,
            line_dash_pattern: LineDashPattern::solid(),
            rendering_intent: RenderingIntent::RelativeColorimetric,
            stroke_adjustment: false,
            blend_mode: BlendMode::Normal,
            soft_mask: SoftMask::None,
            stroking_alpha_constant: 1.0,
            nonstroking_alpha_constant: 1.0,
            alpha_source: false,
            text_state: TextState::default(),
            recursion_guard: Rc::new(RefCell::new(HashSet::new())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeviceDependentGraphicsState {
    /// A function that adjusts device gray or colour component levels to
    /// compensate for nonlinear response in a particular output device.
    /// Chained with the external transfer imposed by surrounding soft-mask
    /// or transparency groups.
    ///
    /// Initial value: identity
    pub transfer: TransferFunction,

    /// The precision with which curves shall be rendered on the output device.
    /// The value of this parameter (positive number) gives the maximum error
    /// tolerance, measured in output device pixels.
    ///
    /// Initial value: 1.0
    pub flatness_tolerance: f32,

    /// The precision with which colour gradients are to be rendered on the
    /// output device. The value of this parameter (0 to 1.0) gives the maximum
    /// error tolerance, expressed as a fraction of the range of each colour
    /// component.
    ///
    /// Initial value: 0.5
    pub smoothness_tolerance: f32,
}

impl Default for DeviceDependentGraphicsState {
    fn default() -> Self {
        Self {
            transfer: TransferFunction::Identity,
            flatness_tolerance: 1.0,
            smoothness_tolerance: 0.5,
        }
    }
}

impl GraphicsState {
    /// Apply a graphics state parameter dictionary (the `gs` operator).
    /// Absent entries leave fields untouched
    pub fn apply_parameters(&mut self, params: &GraphicsStateParameters) {
        let di = &mut self.device_independent;

        if let Some(line_width) = params.line_width {
            di.line_width = line_width;
        }
        if let Some(cap) = params.line_cap_style {
            di.line_cap_style = cap;
        }
        if let Some(join) = params.line_join_style {
            di.line_join_style = join;
        }
        if let Some(miter_limit) = params.miter_limit {
            di.miter_limit = miter_limit;
        }
        if let Some(dash) = &params.line_dash_pattern {
            di.line_dash_pattern = dash.clone();
        }
        if let Some(intent) = params.rendering_intent {
            di.rendering_intent = intent;
        }
        if let Some(blend_mode) = params.blend_mode {
            di.blend_mode = blend_mode;
        }
        if let Some(soft_mask) = &params.soft_mask {
            di.soft_mask = soft_mask.clone();
        }
        if let Some(alpha) = params.stroking_alpha_constant {
            di.stroking_alpha_constant = alpha;
        }
        if let Some(alpha) = params.nonstroking_alpha_constant {
            di.nonstroking_alpha_constant = alpha;
        }
        if let Some(alpha_is_shape) = params.alpha_is_shape {
            di.alpha_source = alpha_is_shape;
        }
        if let Some(stroke_adjustment) = params.stroke_adjustment {
            di.stroke_adjustment = stroke_adjustment;
        }

        let dd = &mut self.device_dependent;

        if let Some(transfer) = params.effective_transfer() {
            dd.transfer = transfer.clone();
        }
        if let Some(flatness) = params.flatness_tolerance {
            dd.flatness_tolerance = flatness;
        }
        if let Some(smoothness) = params.smoothness_tolerance {
            dd.smoothness_tolerance = smoothness;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn save_restore_shares_recursion_guard() {
        let state = GraphicsState::default();
        let copy = state.clone();

        state
            .device_independent
            .recursion_guard
            .borrow_mut()
            .insert(7);

        assert!(copy.device_independent.recursion_guard.borrow().contains(&7));
    }

    #[test]
    fn parameters_leave_unset_fields_untouched(){
        let mut state = GraphicsState::default();
        state.device_independent.line_width = 4.0;

        let params = GraphicsStateParameters {
            line_width: None,
            line_cap_style: Some(LineCapStyle::Round),
            line_join_style: None,
            miter_limit: None,
            line_dash_pattern: None,
            rendering_intent: None,
            font: None,
            transfer: None,
            transfer_two: None,
            flatness_tolerance: None,
            smoothness_tolerance: None,
            stroke_adjustment: None,
            blend_mode: None,
            soft_mask: None,
            stroking_alpha_constant: Some(0.5),
            nonstroking_alpha_constant: None,
            alpha_is_shape: None,
        };

        state.apply_parameters(&params);

        assert_eq!(state.device_independent.line_width, 4.0);
        assert_eq!(state.device_independent.line_cap_style, LineCapStyle::Round);
        assert_eq!(state.device_independent.stroking_alpha_constant, 0.5);
    }
}
