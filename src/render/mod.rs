/*!

The content-stream interpreter: the operator processor driving the graphics
state, the path and text state machines, and the render dispatcher.

Execution is strictly sequential; no operator suspends. Recursion through
form XObjects, tiling cells, and soft masks is bounded solely by the
object-number guard carried on the graphics state.

*/

use std::{borrow::Cow, rc::Rc};

use crate::{
    color::ColorSpace,
    content::{ContentLexer, ContentOperator, ContentToken},
    data_structures::Matrix,
    error::{PdfResult, RenderError},
    geometry::{FillRule, Path, Point},
    image::decode_image,
    objects::{Dictionary, FromObj, Name, Object},
    resources::{
        graphics_state_parameters::SoftMaskSubtype,
        pattern::{PaintType, Pattern, TilingPattern},
        ResourceSet,
    },
    shading::Shading,
    xobject::{FormXObject, XObject},
    Resolve,
};

pub use self::{
    canvas::{
        Canvas, CanvasOp, ColorFilter, CompositeMode, GradientStop, Paint, PaintStyle, Picture,
        PictureRecorder, PositionedGlyph, Shader, StrokeParams, TextBlob,
    },
    dispatcher::RenderDispatcher,
    graphics_state::{GraphicsState, PaintSource, RecursionGuard},
    text::{CharacterInfo, MonospaceShaper, TextShaper},
    text_state::{TextRenderingMode, TextState},
};

pub mod canvas;
mod dispatcher;
mod graphics_state;
mod shading;
pub mod text;
mod text_state;
mod transparency;

use transparency::SoftMaskScope;

/// Parameters fixed for the duration of one rendering job
#[derive(Debug, Clone)]
pub struct RenderParams {
    /// Maps default user space onto the device
    pub base_matrix: Matrix,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            base_matrix: Matrix::identity(),
        }
    }
}

pub struct Renderer<'b> {
    resolver: &'b mut dyn Resolve,
    canvas: &'b mut dyn Canvas,
    shaper: &'b dyn TextShaper,

    graphics_state: GraphicsState,
    graphics_state_stack: Vec<GraphicsState>,
    operand_stack: Vec<Object>,

    /// Innermost resource dictionary last; form XObjects and tiling cells
    /// push their own
    resource_stack: Vec<Rc<ResourceSet>>,

    current_path: Path,
    pending_clip: Option<FillRule>,

    /// `Q` may not pop below this depth; form execution raises it
    state_floor: usize,

    params: RenderParams,
}

impl<'b> Renderer<'b> {
    pub fn new(
        canvas: &'b mut dyn Canvas,
        resolver: &'b mut dyn Resolve,
        shaper: &'b dyn TextShaper,
        resources: Rc<ResourceSet>,
        params: RenderParams,
    ) -> Self {
        let mut graphics_state = GraphicsState::default();
        graphics_state.device_independent.current_transformation_matrix = params.base_matrix;

        Self {
            resolver,
            canvas,
            shaper,
            graphics_state,
            graphics_state_stack: Vec::new(),
            operand_stack: Vec::new(),
            resource_stack: vec![resources],
            current_path: Path::new(),
            pending_clip: None,
            state_floor: 0,
            params,
        }
    }

    /// A renderer for nested content (tiling cells, soft masks) that
    /// shares the resolver and shaper but paints onto its own canvas with
    /// a derived graphics state
    fn nested<'c>(
        canvas: &'c mut dyn Canvas,
        resolver: &'c mut dyn Resolve,
        shaper: &'c dyn TextShaper,
        resources: Rc<ResourceSet>,
        graphics_state: GraphicsState,
        params: RenderParams,
    ) -> Renderer<'c> {
        Renderer {
            resolver,
            canvas,
            shaper,
            graphics_state,
            graphics_state_stack: Vec::new(),
            operand_stack: Vec::new(),
            resource_stack: vec![resources],
            current_path: Path::new(),
            pending_clip: None,
            state_floor: 0,
            params,
        }
    }

    pub fn graphics_state(&self) -> &GraphicsState {
        &self.graphics_state
    }

    /// Interpret a complete content stream. Marks are applied in source
    /// order; the partial output of a failing stream stays on the canvas
    pub fn render(&mut self, content: &[u8]) -> PdfResult<()> {
        self.execute(content)
    }

    fn execute(&mut self, content: &[u8]) -> PdfResult<()> {
        let mut lexer = ContentLexer::new(Cow::Borrowed(content));

        let base_depth = self.graphics_state_stack.len();
        let previous_floor = self.state_floor;
        self.state_floor = base_depth;

        let mut result = Ok(());

        while let Some(token) = lexer.next() {
            let step = match token {
                Ok(ContentToken::Object(obj)) => {
                    self.operand_stack.push(obj);
                    Ok(())
                }
                Ok(ContentToken::Operator(ContentOperator::BI)) => {
                    let step = lexer
                        .lex_inline_image()
                        .and_then(|(dict, data)| self.draw_inline_image(dict, data));
                    self.operand_stack.clear();
                    step
                }
                Ok(ContentToken::Operator(op)) => {
                    let step = self.execute_operator(op);
                    self.operand_stack.clear();
                    step
                }
                Err(err) => Err(err),
            };

            if let Err(err) = step {
                result = Err(err);
                break;
            }
        }

        self.state_floor = previous_floor;

        if result.is_ok() && self.graphics_state_stack.len() != base_depth {
            anyhow::bail!(RenderError::MismatchedSaveRestore);
        }

        result
    }

    fn execute_operator(&mut self, op: ContentOperator) -> PdfResult<()> {
        match op {
            // graphics state
            ContentOperator::q => self.save_graphics_state(),
            ContentOperator::Q => self.restore_graphics_state()?,
            ContentOperator::cm => self.concat_matrix(),
            ContentOperator::w => {
                self.graphics_state.device_independent.line_width = self.pop_number()
            }
            ContentOperator::J => self.set_line_cap(),
            ContentOperator::j => self.set_line_join(),
            ContentOperator::M => {
                self.graphics_state.device_independent.miter_limit = self.pop_number()
            }
            ContentOperator::d => self.set_dash_pattern(),
            ContentOperator::ri => self.set_rendering_intent(),
            ContentOperator::i => {
                self.graphics_state.device_dependent.flatness_tolerance = self.pop_number()
            }
            ContentOperator::gs => self.set_graphics_state_parameters()?,

            // path construction
            ContentOperator::m => self.path_move_to(),
            ContentOperator::l => self.path_line_to(),
            ContentOperator::c => self.path_curve_to(),
            ContentOperator::v => self.path_curve_to_replicate_initial(),
            ContentOperator::y => self.path_curve_to_replicate_final(),
            ContentOperator::re => self.path_rectangle(),
            ContentOperator::h => self.current_path.close(),

            // path painting
            ContentOperator::S => self.paint_path(false, true, FillRule::NonZero, false)?,
            ContentOperator::s => self.paint_path(false, true, FillRule::NonZero, true)?,
            ContentOperator::f | ContentOperator::F => {
                self.paint_path(true, false, FillRule::NonZero, false)?
            }
            ContentOperator::f_star => self.paint_path(true, false, FillRule::EvenOdd, false)?,
            ContentOperator::B => self.paint_path(true, true, FillRule::NonZero, false)?,
            ContentOperator::B_star => self.paint_path(true, true, FillRule::EvenOdd, false)?,
            ContentOperator::b => self.paint_path(true, true, FillRule::NonZero, true)?,
            ContentOperator::b_star => self.paint_path(true, true, FillRule::EvenOdd, true)?,
            ContentOperator::n => self.paint_path(false, false, FillRule::NonZero, false)?,

            // clipping
            ContentOperator::W => self.pending_clip = Some(FillRule::NonZero),
            ContentOperator::W_star => self.pending_clip = Some(FillRule::EvenOdd),

            // color
            ContentOperator::CS => self.set_color_space(true)?,
            ContentOperator::cs => self.set_color_space(false)?,
            ContentOperator::G => self.set_device_color(true, ColorSpace::DeviceGray),
            ContentOperator::g => self.set_device_color(false, ColorSpace::DeviceGray),
            ContentOperator::RG => self.set_device_color(true, ColorSpace::DeviceRgb),
            ContentOperator::rg => self.set_device_color(false, ColorSpace::DeviceRgb),
            ContentOperator::K => self.set_device_color(true, ColorSpace::DeviceCmyk),
            ContentOperator::k => self.set_device_color(false, ColorSpace::DeviceCmyk),
            ContentOperator::SC => self.set_color_components(true),
            ContentOperator::sc => self.set_color_components(false),
            ContentOperator::SCN => self.set_color_extended(true)?,
            ContentOperator::scn => self.set_color_extended(false)?,

            // text
            ContentOperator::BT => self.begin_text(),
            ContentOperator::ET => self.end_text(),
            ContentOperator::Tc => {
                self.text_state_mut().character_spacing = self.pop_number()
            }
            ContentOperator::Tw => self.text_state_mut().word_spacing = self.pop_number(),
            ContentOperator::Tz => {
                let scale = self.pop_number();
                self.text_state_mut().horizontal_scaling = scale / 100.0;
            }
            ContentOperator::TL => self.text_state_mut().leading = self.pop_number(),
            ContentOperator::Ts => self.text_state_mut().rise = self.pop_number(),
            ContentOperator::Tf => self.set_font_and_size()?,
            ContentOperator::Tr => self.set_text_rendering_mode()?,
            ContentOperator::Td => self.move_text_position(false),
            ContentOperator::TD => self.move_text_position(true),
            ContentOperator::Tm => self.set_text_matrix(),
            ContentOperator::T_star => self.next_line(),
            ContentOperator::Tj => self.show_text()?,
            ContentOperator::TJ => self.show_text_adjusted()?,
            ContentOperator::single_quote => {
                self.next_line();
                self.show_text()?;
            }
            ContentOperator::double_quote => {
                let text = self.pop();
                let spacing = self.pop_number();
                let word_spacing = self.pop_number();

                self.text_state_mut().word_spacing = word_spacing;
                self.text_state_mut().character_spacing = spacing;
                self.next_line();

                if let Some(text) = text {
                    self.operand_stack.push(text);
                    self.show_text()?;
                }
            }

            // xobjects and shading
            ContentOperator::Do => self.draw_xobject()?,
            ContentOperator::sh => self.paint_shading()?,

            // marked content carries no marks
            ContentOperator::BMC | ContentOperator::MP => {
                self.pop();
            }
            ContentOperator::BDC | ContentOperator::DP => {
                self.pop();
                self.pop();
            }
            ContentOperator::EMC => {}

            // type 3 glyph metrics are consumed by the font machinery
            ContentOperator::d0 => {
                self.pop();
                self.pop();
            }
            ContentOperator::d1 => {
                for _ in 0..6 {
                    self.pop();
                }
            }

            // compatibility brackets are handled by the lexer
            ContentOperator::BX | ContentOperator::EX => {}

            // BI is intercepted before dispatch; ID/EI only occur inside it
            ContentOperator::BI | ContentOperator::ID | ContentOperator::EI => {
                log::warn!("stray inline-image operator {:?}", op);
            }
        }

        Ok(())
    }

    // ---- operand helpers -------------------------------------------------

    /// Operand-stack underflows consume what is available and proceed
    fn pop(&mut self) -> Option<Object> {
        self.operand_stack.pop()
    }

    fn pop_number(&mut self) -> f32 {
        match self.pop() {
            Some(obj) => self.resolver.assert_number(obj).unwrap_or(0.0),
            None => 0.0,
        }
    }

    fn pop_integer(&mut self) -> i32 {
        match self.pop() {
            Some(obj) => self.resolver.assert_integer(obj).unwrap_or(0),
            None => 0,
        }
    }

    fn pop_name(&mut self) -> Option<Name> {
        let obj = self.pop()?;
        self.resolver.assert_name(obj).map(Name).ok()
    }

    fn pop_string_bytes(&mut self) -> Option<Vec<u8>> {
        let obj = self.pop()?;
        let s = self.resolver.assert_string(obj).ok()?;

        // string objects carry one byte per char
        Some(s.chars().map(|c| c as u32 as u8).collect())
    }

    fn pop_arr(&mut self) -> Option<Vec<Object>> {
        let obj = self.pop()?;
        self.resolver.assert_arr(obj).ok()
    }

    fn text_state_mut(&mut self) -> &mut TextState {
        &mut self.graphics_state.device_independent.text_state
    }

    fn ctm(&self) -> Matrix {
        self.graphics_state
            .device_independent
            .current_transformation_matrix
    }

    fn lookup_resources<T>(
        &mut self,
        lookup: impl Fn(&ResourceSet, &str, &mut dyn Resolve) -> PdfResult<Option<T>>,
        name: &str,
    ) -> PdfResult<Option<T>> {
        for resources in self.resource_stack.iter().rev() {
            if let Some(found) = lookup(resources.as_ref(), name, &mut *self.resolver)? {
                return Ok(Some(found));
            }
        }

        Ok(None)
    }

    // ---- graphics state --------------------------------------------------

    /// Save the current graphics state on the graphics state stack
    fn save_graphics_state(&mut self) {
        self.graphics_state_stack.push(self.graphics_state.clone());
        self.canvas.save();
    }

    fn restore_graphics_state(&mut self) -> PdfResult<()> {
        if self.graphics_state_stack.len() <= self.state_floor {
            anyhow::bail!(RenderError::MismatchedSaveRestore);
        }

        // the pop cannot fail below the floor check above
        self.graphics_state = self.graphics_state_stack.pop().unwrap();
        self.canvas.restore();

        Ok(())
    }

    /// Modify the current transformation matrix (CTM) by concatenating the
    /// specified matrix. Although the operands specify a matrix, they shall be
    /// written as six separate numbers, not as an array
    fn concat_matrix(&mut self) {
        let f = self.pop_number();
        let e = self.pop_number();
        let d = self.pop_number();
        let c = self.pop_number();
        let b = self.pop_number();
        let a = self.pop_number();

        let matrix = Matrix::new(a, b, c, d, e, f);

        self.graphics_state
            .device_independent
            .current_transformation_matrix = matrix * self.ctm();
    }

    fn set_line_cap(&mut self) {
        use crate::resources::graphics_state_parameters::LineCapStyle;

        if let Ok(cap) = LineCapStyle::from_integer(self.pop_integer()) {
            self.graphics_state.device_independent.line_cap_style = cap;
        }
    }

    fn set_line_join(&mut self) {
        use crate::resources::graphics_state_parameters::LineJoinStyle;

        if let Ok(join) = LineJoinStyle::from_integer(self.pop_integer()) {
            self.graphics_state.device_independent.line_join_style = join;
        }
    }

    fn set_dash_pattern(&mut self) {
        use crate::resources::graphics_state_parameters::LineDashPattern;

        let phase = self.pop_number();

        let dashes = self
            .pop_arr()
            .map(|arr| {
                arr.into_iter()
                    .filter_map(|obj| self.resolver.assert_number(obj).ok())
                    .collect::<Vec<f32>>()
            })
            .unwrap_or_default();

        self.graphics_state.device_independent.line_dash_pattern =
            LineDashPattern::new(dashes, phase);
    }

    fn set_rendering_intent(&mut self) {
        use crate::resources::graphics_state_parameters::RenderingIntent;

        if let Some(name) = self.pop_name() {
            self.graphics_state.device_independent.rendering_intent =
                RenderingIntent::from_name_or_default(name.as_str());
        }
    }

    /// Set parameters from a named graphics state parameter dictionary in
    /// the ExtGState subdictionary of the current resource dictionary
    fn set_graphics_state_parameters(&mut self) -> PdfResult<()> {
        let name = match self.pop_name() {
            Some(name) => name,
            None => return Ok(()),
        };

        let params = self.lookup_resources(ResourceSet::ext_g_state, name.as_str())?;

        match params {
            Some(params) => self.graphics_state.apply_parameters(&params),
            None => log::warn!("no ExtGState resource named {:?}", name),
        }

        Ok(())
    }

    // ---- path construction ----------------------------------------------

    fn device_point(&mut self) -> Point {
        let y = self.pop_number();
        let x = self.pop_number();

        self.ctm().apply(Point::new(x, y))
    }

    fn path_move_to(&mut self) {
        let point = self.device_point();
        self.current_path.move_to(point);
    }

    fn path_line_to(&mut self) {
        let point = self.device_point();
        self.current_path.line_to(point);
    }

    fn path_curve_to(&mut self) {
        let end = self.device_point();
        let second = self.device_point();
        let first = self.device_point();

        self.current_path.cubic_curve_to(first, second, end);
    }

    fn path_curve_to_replicate_initial(&mut self) {
        let end = self.device_point();
        let second = self.device_point();

        self.current_path
            .cubic_curve_to_replicate_initial(second, end);
    }

    fn path_curve_to_replicate_final(&mut self) {
        let end = self.device_point();
        let first = self.device_point();

        self.current_path.cubic_curve_to_replicate_final(first, end);
    }

    /// Append a rectangle to the current path as a complete subpath, with
    /// lower-left corner (x, y) and dimensions width and height in user
    /// space
    fn path_rectangle(&mut self) {
        let height = self.pop_number();
        let width = self.pop_number();
        let y = self.pop_number();
        let x = self.pop_number();

        let ctm = self.ctm();

        self.current_path
            .move_to(ctm.apply(Point::new(x, y)));
        self.current_path
            .line_to(ctm.apply(Point::new(x + width, y)));
        self.current_path
            .line_to(ctm.apply(Point::new(x + width, y + height)));
        self.current_path
            .line_to(ctm.apply(Point::new(x, y + height)));
        self.current_path.close();
    }

    /// End the current path, optionally filling and stroking, then apply
    /// any pending clip. A clip over an empty path is a no-op
    fn paint_path(
        &mut self,
        fill: bool,
        stroke: bool,
        rule: FillRule,
        close: bool,
    ) -> PdfResult<()> {
        if close {
            self.current_path.close();
        }

        let path = std::mem::take(&mut self.current_path);

        if !path.is_empty() {
            if fill {
                let paint = self.resolve_paint(false)?;
                self.with_soft_mask(|renderer| {
                    RenderDispatcher::draw_path(renderer.canvas, &path, &paint, rule);
                    Ok(())
                })?;
            }

            if stroke {
                let paint = self.resolve_paint(true)?;
                self.with_soft_mask(|renderer| {
                    RenderDispatcher::draw_path(renderer.canvas, &path, &paint, rule);
                    Ok(())
                })?;
            }

            if let Some(clip_rule) = self.pending_clip.take() {
                self.canvas.clip_path(&path, clip_rule);
                self.graphics_state
                    .device_independent
                    .clip
                    .paths
                    .push((path, clip_rule));
            }
        } else {
            self.pending_clip = None;
        }

        Ok(())
    }

    // ---- color -----------------------------------------------------------

    fn set_color_space(&mut self, stroking: bool) -> PdfResult<()> {
        let name = match self.pop_name() {
            Some(name) => name,
            None => return Ok(()),
        };

        // a named resource takes precedence; device and pattern families
        // resolve directly, with Default* overrides consulted for device
        // names
        let space = match self.lookup_resources(ResourceSet::color_space, name.as_str())? {
            Some(space) => space,
            None => ColorSpace::from_obj(Object::Name(name.clone()), self.resolver)?,
        };

        let source = if space.is_pattern() {
            let underlying = match &space {
                ColorSpace::Pattern(underlying) => underlying.as_deref().cloned(),
                _ => None,
            };

            PaintSource::Pattern {
                pattern: None,
                tint: None,
                underlying,
            }
        } else {
            PaintSource::Solid {
                components: space.initial_components(),
                space,
            }
        };

        self.set_paint_source(stroking, source);

        Ok(())
    }

    fn set_paint_source(&mut self, stroking: bool, source: PaintSource) {
        if stroking {
            self.graphics_state.device_independent.stroke_paint = source;
        } else {
            self.graphics_state.device_independent.fill_paint = source;
        }
    }

    /// The single-operator device color forms: G, g, RG, rg, K, k
    fn set_device_color(&mut self, stroking: bool, space: ColorSpace) {
        let n = space.components();

        let mut components = vec![0.0; n];
        for slot in components.iter_mut().rev() {
            *slot = self.pop_number();
        }

        self.set_paint_source(stroking, PaintSource::Solid { space, components });
    }

    /// `SC`/`sc`: operand count is the component count of the current
    /// space. Malformed operands leave the current paint unchanged
    fn set_color_components(&mut self, stroking: bool) {
        let di = &self.graphics_state.device_independent;
        let source = if stroking {
            &di.stroke_paint
        } else {
            &di.fill_paint
        };

        let space = match source {
            PaintSource::Solid { space, .. } => space.clone(),
            PaintSource::Pattern { .. } => {
                log::warn!("sc against a pattern space; leaving paint unchanged");
                return;
            }
        };

        let n = space.components();
        let mut components = vec![0.0; n];

        for slot in components.iter_mut().rev() {
            match self.pop() {
                Some(obj) => match self.resolver.assert_number(obj) {
                    Ok(value) => *slot = value,
                    Err(..) => return,
                },
                None => {}
            }
        }

        self.set_paint_source(stroking, PaintSource::Solid { space, components });
    }

    /// `SCN`/`scn`: like `SC`/`sc`, plus pattern names. Against a pattern
    /// space the operands are (optional tint components, pattern name)
    fn set_color_extended(&mut self, stroking: bool) -> PdfResult<()> {
        let di = &self.graphics_state.device_independent;
        let source = if stroking {
            &di.stroke_paint
        } else {
            &di.fill_paint
        };

        let underlying = match source {
            PaintSource::Pattern { underlying, .. } => underlying.clone(),
            PaintSource::Solid { .. } => {
                self.set_color_components(stroking);
                return Ok(());
            }
        };

        let name = match self.pop_name() {
            Some(name) => name,
            None => return Ok(()),
        };

        // remaining operands are tint components in the underlying space
        let mut tint_components = Vec::new();
        while let Some(obj) = self.pop() {
            if let Ok(value) = self.resolver.assert_number(obj) {
                tint_components.push(value);
            }
        }
        tint_components.reverse();

        let pattern = self.lookup_resources(ResourceSet::pattern, name.as_str())?;

        if pattern.is_none() {
            log::warn!("no pattern resource named {:?}", name);
        }

        let tint = underlying
            .clone()
            .filter(|_| !tint_components.is_empty())
            .map(|space| (space, tint_components));

        self.set_paint_source(
            stroking,
            PaintSource::Pattern {
                pattern,
                tint,
                underlying,
            },
        );

        Ok(())
    }

    /// Resolve the current paint source into a canvas paint: solid colors
    /// through the color pipeline, patterns into shaders. An invalid
    /// pattern degrades to solid black
    fn resolve_paint(&mut self, stroking: bool) -> PdfResult<Paint> {
        let di = &self.graphics_state.device_independent;

        let alpha = if stroking {
            di.stroking_alpha_constant
        } else {
            di.nonstroking_alpha_constant
        };

        let style = if stroking {
            let scale = {
                let ctm = self.ctm();
                ((ctm.a * ctm.d - ctm.b * ctm.c).abs()).sqrt()
            };

            PaintStyle::Stroke(StrokeParams {
                width: di.line_width * scale,
                cap: di.line_cap_style,
                join: di.line_join_style,
                miter_limit: di.miter_limit,
                dash: di.line_dash_pattern.clone(),
            })
        } else {
            PaintStyle::Fill
        };

        let blend_mode = di.blend_mode;
        let intent = di.rendering_intent;
        let transfer = self.graphics_state.device_dependent.transfer.clone();

        let source = if stroking {
            di.stroke_paint.clone()
        } else {
            di.fill_paint.clone()
        };

        let mut paint = Paint {
            style,
            alpha,
            blend_mode,
            ..Paint::default()
        };

        match source {
            PaintSource::Solid { space, components } => {
                let sampler = space.sampler(intent, &transfer);
                paint.color = sampler.sample(&space.normalize(&components));
            }
            PaintSource::Pattern { pattern: None, .. } => {
                paint.color = [0.0, 0.0, 0.0, 1.0];
            }
            PaintSource::Pattern {
                pattern: Some(pattern),
                tint,
                ..
            } => match &*pattern {
                Pattern::Tiling(tiling) => match self.record_tile_shader(tiling, tint.as_ref()) {
                    Ok(shader) => paint.shader = Some(shader),
                    Err(err) => {
                        log::warn!("invalid tiling pattern, painting black: {}", err);
                        paint.color = [0.0, 0.0, 0.0, 1.0];
                    }
                },
                Pattern::Shading(shading_pattern) => {
                    let mut state_for_pattern = self.graphics_state.clone();
                    if let Some(params) = &shading_pattern.ext_g_state {
                        state_for_pattern.apply_parameters(params);
                    }

                    let matrix = shading_pattern.matrix * self.params.base_matrix;
                    let bounds = self.canvas.local_clip_bounds();

                    match shading::prepare_shading(
                        &shading_pattern.shading,
                        matrix,
                        bounds,
                        intent,
                        &transfer,
                    )
                    .map(shading::PreparedShading::into_shader)
                    {
                        Ok(Some(shader)) => paint.shader = Some(shader),
                        Ok(None) | Err(..) => {
                            log::warn!("invalid shading pattern, painting black");
                            paint.color = [0.0, 0.0, 0.0, 1.0];
                        }
                    }
                }
            },
        }

        Ok(paint)
    }

    /// Record the pattern cell into a picture and wrap it in a repeating
    /// tile shader. The cell renders with a sub-graphics-state that
    /// inherits everything except the recursion guard entry; uncolored
    /// cells paint with the tint resolved through the underlying space
    fn record_tile_shader(
        &mut self,
        tiling: &TilingPattern,
        tint: Option<&(ColorSpace, Vec<f32>)>,
    ) -> PdfResult<Shader> {
        let guard = Rc::clone(&self.graphics_state.device_independent.recursion_guard);

        // a cell that reaches itself through its own resources is dropped,
        // same as a self-referencing form
        let guarded = match tiling.object_number {
            Some(object_number) => {
                if !guard.borrow_mut().insert(object_number) {
                    return Ok(Shader::Tile {
                        picture: Rc::new(Picture::default()),
                        bbox: tiling.bbox,
                        x_step: tiling.x_step,
                        y_step: tiling.y_step,
                        matrix: tiling.matrix * self.params.base_matrix,
                    });
                }
                Some(object_number)
            }
            None => None,
        };

        let result = self.record_tile_shader_guarded(tiling, tint);

        if let Some(object_number) = guarded {
            guard.borrow_mut().remove(&object_number);
        }

        result
    }

    fn record_tile_shader_guarded(
        &mut self,
        tiling: &TilingPattern,
        tint: Option<&(ColorSpace, Vec<f32>)>,
    ) -> PdfResult<Shader> {
        let mut cell_state = GraphicsState::default();
        cell_state.device_independent.recursion_guard =
            Rc::clone(&self.graphics_state.device_independent.recursion_guard);
        cell_state.device_independent.rendering_intent =
            self.graphics_state.device_independent.rendering_intent;

        if tiling.paint_type == PaintType::Uncolored {
            match tint {
                Some((space, components)) => {
                    let source = PaintSource::Solid {
                        space: space.clone(),
                        components: components.clone(),
                    };

                    cell_state.device_independent.fill_paint = source.clone();
                    cell_state.device_independent.stroke_paint = source;
                }
                // a stencil with no poured color paints black
                None => {}
            }
        }

        let mut recorder = PictureRecorder::new(tiling.bbox);
        recorder.clip_rect(tiling.bbox);

        {
            let mut cell_renderer = Renderer::nested(
                &mut recorder,
                &mut *self.resolver,
                self.shaper,
                Rc::clone(&tiling.resources),
                cell_state,
                RenderParams::default(),
            );

            cell_renderer.execute(&tiling.content)?;
        }

        Ok(Shader::Tile {
            picture: Rc::new(recorder.finish()),
            bbox: tiling.bbox,
            x_step: tiling.x_step,
            y_step: tiling.y_step,
            matrix: tiling.matrix * self.params.base_matrix,
        })
    }

    // ---- transparency ----------------------------------------------------

    /// Bracket one mark with the soft mask in the graphics state, if any.
    /// The scope ends on every exit path
    fn with_soft_mask<F>(&mut self, draw: F) -> PdfResult<()>
    where
        F: FnOnce(&mut Self) -> PdfResult<()>,
    {
        use crate::resources::graphics_state_parameters::SoftMask;

        let mask = match &self.graphics_state.device_independent.soft_mask {
            SoftMask::None => return draw(self),
            SoftMask::Dictionary(dict) => dict.clone(),
        };

        let scope = SoftMaskScope::begin(self.canvas);

        let drawn = draw(self);

        let mask_picture = match self.record_soft_mask(&mask) {
            Ok(picture) => Some(Rc::new(picture)),
            Err(err) => {
                log::warn!("soft mask failed to record: {}", err);
                None
            }
        };

        scope.end(self.canvas, mask_picture, mask.subtype);

        drawn
    }

    /// Render the mask's form XObject into a side picture with a derived
    /// graphics state: solid white paint for alpha masks, solid black for
    /// luminosity, alphas of 1.0, Normal blending, and no nested mask
    fn record_soft_mask(
        &mut self,
        mask: &crate::resources::graphics_state_parameters::SoftMaskDictionary,
    ) -> PdfResult<Picture> {
        let guard = Rc::clone(&self.graphics_state.device_independent.recursion_guard);

        // a mask form already being rendered is dropped; the mark then
        // composes unmasked rather than recursing
        let guarded = match mask.group_object_number {
            Some(object_number) => {
                if !guard.borrow_mut().insert(object_number) {
                    return Ok(Picture::default());
                }
                Some(object_number)
            }
            None => None,
        };

        let result = self.record_soft_mask_guarded(mask);

        if let Some(object_number) = guarded {
            guard.borrow_mut().remove(&object_number);
        }

        result
    }

    fn record_soft_mask_guarded(
        &mut self,
        mask: &crate::resources::graphics_state_parameters::SoftMaskDictionary,
    ) -> PdfResult<Picture> {
        let form = FormXObject::from_stream(
            mask.transparency_group.clone(),
            mask.group_object_number,
            self.resolver,
        )?;

        let level = match mask.subtype {
            SoftMaskSubtype::Alpha => 1.0,
            SoftMaskSubtype::Luminosity => 0.0,
        };

        let mut mask_state = GraphicsState::default();
        mask_state.device_independent.recursion_guard =
            Rc::clone(&self.graphics_state.device_independent.recursion_guard);

        let solid = PaintSource::Solid {
            space: ColorSpace::DeviceGray,
            components: vec![level],
        };
        mask_state.device_independent.fill_paint = solid.clone();
        mask_state.device_independent.stroke_paint = solid;
        mask_state.device_independent.current_transformation_matrix =
            form.matrix * self.ctm();

        // the mask's transfer function maps computed luminosity or alpha
        // into mask values
        let derived_transfer = mask.transfer_function.clone();
        mask_state.device_dependent.transfer = derived_transfer.clone();

        let device_bbox = form
            .bbox
            .transform(mask_state.device_independent.current_transformation_matrix);

        let mut recorder = PictureRecorder::new(device_bbox);

        // for luminosity, the backdrop fills first, mapped through the
        // group color space under the current intent
        if mask.subtype == SoftMaskSubtype::Luminosity {
            let group_space = form
                .group
                .as_ref()
                .and_then(|group| group.color_space.clone())
                .unwrap_or(ColorSpace::DeviceGray);

            let backdrop = mask
                .backdrop_color
                .clone()
                .unwrap_or_else(|| group_space.initial_components());

            let sampler = group_space.sampler(
                self.graphics_state.device_independent.rendering_intent,
                &derived_transfer,
            );
            let color = sampler.sample(&group_space.normalize(&backdrop));

            recorder.draw_path(&Path::from_rect(device_bbox), &Paint::fill(color));
        }

        let resources = form
            .resources
            .clone()
            .unwrap_or_else(|| Rc::new(ResourceSet::empty()));

        let params = self.params.clone();

        {
            let mut mask_renderer = Renderer::nested(
                &mut recorder,
                &mut *self.resolver,
                self.shaper,
                resources,
                mask_state,
                params,
            );

            mask_renderer.execute(&form.content)?;
        }

        Ok(recorder.finish())
    }

    // ---- xobjects ----------------------------------------------------------

    /// Paint the specified XObject. The operand name shall appear as a key in
    /// the XObject subdictionary of the current resource dictionary
    fn draw_xobject(&mut self) -> PdfResult<()> {
        let name = match self.pop_name() {
            Some(name) => name,
            None => return Ok(()),
        };

        let xobject = match self.lookup_resources(ResourceSet::xobject, name.as_str())? {
            Some(xobject) => xobject,
            None => {
                log::warn!("no XObject resource named {:?}", name);
                return Ok(());
            }
        };

        match &*xobject {
            XObject::Image(image) => self.draw_image_xobject(image),
            XObject::Form(form) => self.draw_form(form),
        }
    }

    fn draw_inline_image(&mut self, dict: Dictionary, data: Vec<u8>) -> PdfResult<()> {
        let image =
            crate::xobject::ImageXObject::from_inline_dict(dict, data, self.resolver)?;

        self.draw_image_xobject(&image)
    }

    fn draw_image_xobject(&mut self, image: &crate::xobject::ImageXObject) -> PdfResult<()> {
        let fill_paint = self.resolve_paint(false)?;

        let di = &self.graphics_state.device_independent;
        let intent = di.rendering_intent;
        let alpha = di.nonstroking_alpha_constant;
        let blend_mode = di.blend_mode;
        let transfer = self.graphics_state.device_dependent.transfer.clone();

        let raster = decode_image(image, fill_paint.color, intent, &transfer, self.resolver)?;

        let paint = Paint {
            alpha,
            blend_mode,
            ..Paint::default()
        };

        let ctm = self.ctm();

        self.with_soft_mask(|renderer| {
            RenderDispatcher::draw_image(renderer.canvas, Rc::new(raster), ctm, &paint);
            Ok(())
        })
    }

    /// Execute a form XObject's content with its matrix and bounding box.
    /// A form whose object number is already on the recursion guard is
    /// dropped without error; this is the sole protection against
    /// reference cycles
    fn draw_form(&mut self, form: &FormXObject) -> PdfResult<()> {
        let guard = Rc::clone(&self.graphics_state.device_independent.recursion_guard);

        if let Some(object_number) = form.object_number {
            if !guard.borrow_mut().insert(object_number) {
                return Ok(());
            }
        }

        let result = self.draw_form_guarded(form);

        if let Some(object_number) = form.object_number {
            guard.borrow_mut().remove(&object_number);
        }

        result
    }

    fn draw_form_guarded(&mut self, form: &FormXObject) -> PdfResult<()> {
        self.save_graphics_state();

        let result = self.draw_form_inner(form);

        // unwind whatever the form's own brackets left behind, then the
        // outer save
        while self.graphics_state_stack.len() > self.state_floor {
            if self.restore_graphics_state().is_err() {
                break;
            }
        }

        result
    }

    fn draw_form_inner(&mut self, form: &FormXObject) -> PdfResult<()> {
        {
            let di = &mut self.graphics_state.device_independent;
            di.current_transformation_matrix = form.matrix * di.current_transformation_matrix;
        }

        // the bbox clips the form's content
        let mut bbox_path = Path::from_rect(form.bbox);
        bbox_path.apply_transform(self.ctm());
        self.canvas.clip_path(&bbox_path, FillRule::NonZero);

        let is_group = form.group.is_some();

        if is_group {
            let di = &self.graphics_state.device_independent;
            let layer_paint =
                transparency::group_layer_paint(di.nonstroking_alpha_constant, di.blend_mode);

            self.canvas.save_layer(&layer_paint);

            // within the group, transparency parameters reset to their
            // initial values
            let di = &mut self.graphics_state.device_independent;
            di.blend_mode = Default::default();
            di.stroking_alpha_constant = 1.0;
            di.nonstroking_alpha_constant = 1.0;
            di.soft_mask = crate::resources::graphics_state_parameters::SoftMask::None;
        }

        if let Some(resources) = &form.resources {
            self.resource_stack.push(Rc::clone(resources));
        }

        let result = self.execute(&form.content);

        if form.resources.is_some() {
            self.resource_stack.pop();
        }

        if is_group {
            self.canvas.restore();
        }

        result
    }

    // ---- shading ----------------------------------------------------------

    /// Paint the shading pattern's gradient across the current clip region
    fn paint_shading(&mut self) -> PdfResult<()> {
        let name = match self.pop_name() {
            Some(name) => name,
            None => return Ok(()),
        };

        let shading: Rc<Shading> = match self.lookup_resources(ResourceSet::shading, name.as_str())?
        {
            Some(shading) => shading,
            None => {
                log::warn!("no shading resource named {:?}", name);
                return Ok(());
            }
        };

        let di = &self.graphics_state.device_independent;
        let intent = di.rendering_intent;
        let alpha = di.nonstroking_alpha_constant;
        let blend_mode = di.blend_mode;
        let ctm = self.ctm();
        let transfer = self.graphics_state.device_dependent.transfer.clone();

        let bounds = self.canvas.local_clip_bounds();

        let prepared = shading::prepare_shading(&shading, ctm, bounds, intent, &transfer)?;

        let base_paint = Paint {
            alpha,
            blend_mode,
            ..Paint::default()
        };

        self.with_soft_mask(|renderer| {
            prepared.paint(renderer.canvas, &base_paint);
            Ok(())
        })
    }

    // ---- text -------------------------------------------------------------

    /// Begin a text object, initializing the text matrix, Tm, and the text line
    /// matrix, Tlm, to the identity matrix. Text objects shall not be nested
    fn begin_text(&mut self) {
        let text_state = self.text_state_mut();
        text_state.reinit();
        text_state.in_text_object = true;
    }

    /// End a text object. The text positioning since `BT` is discarded;
    /// composited marks remain
    fn end_text(&mut self) {
        let text_state = self.text_state_mut();
        text_state.reinit();
        text_state.in_text_object = false;
    }

    /// Set the text font to _font_ and the text font size to _size_. _font_
    /// shall be the name of a font resource in the Font subdictionary of the
    /// current resource dictionary
    fn set_font_and_size(&mut self) -> PdfResult<()> {
        let size = self.pop_number();
        let name = match self.pop_name() {
            Some(name) => name,
            None => return Ok(()),
        };

        let font = self.lookup_resources(ResourceSet::font, name.as_str())?;

        if font.is_none() {
            log::warn!("no font resource named {:?}", name);
        }

        let text_state = self.text_state_mut();
        text_state.font = font;
        text_state.font_size = size;

        Ok(())
    }

    fn set_text_rendering_mode(&mut self) -> PdfResult<()> {
        let mode = TextRenderingMode::from_integer(self.pop_integer())?;
        self.text_state_mut().rendering_mode = mode;

        Ok(())
    }

    /// Move to the start of the next line, offset from the start of the current
    /// line by (t_x, t_y):
    ///
    /// T_m = T_lm = [1 0 0, 0 1 0, t_x t_y 1] * T_lm
    fn move_text_position(&mut self, set_leading: bool) {
        let t_y = self.pop_number();
        let t_x = self.pop_number();

        if set_leading {
            self.text_state_mut().leading = -t_y;
        }

        let text_state = self.text_state_mut();
        let matrix = Matrix::new_translate(t_x, t_y) * text_state.text_line_matrix;

        text_state.text_matrix = matrix;
        text_state.text_line_matrix = matrix;
    }

    fn set_text_matrix(&mut self) {
        let f = self.pop_number();
        let e = self.pop_number();
        let d = self.pop_number();
        let c = self.pop_number();
        let b = self.pop_number();
        let a = self.pop_number();

        let matrix = Matrix::new(a, b, c, d, e, f);

        let text_state = self.text_state_mut();
        text_state.text_matrix = matrix;
        text_state.text_line_matrix = matrix;
    }

    /// `T*`: move to the start of the next line using the current leading
    fn next_line(&mut self) {
        let leading = self.graphics_state.device_independent.text_state.leading;

        let text_state = self.text_state_mut();
        let matrix = Matrix::new_translate(0.0, -leading) * text_state.text_line_matrix;

        text_state.text_matrix = matrix;
        text_state.text_line_matrix = matrix;
    }

    fn show_text(&mut self) -> PdfResult<()> {
        let bytes = match self.pop_string_bytes() {
            Some(bytes) => bytes,
            None => return Ok(()),
        };

        self.show_text_bytes(&bytes)
    }

    /// Show one or more text strings, allowing individual glyph positioning.
    /// A number adjusts the text position by that amount in thousandths of
    /// a unit of text space
    fn show_text_adjusted(&mut self) -> PdfResult<()> {
        let arr = match self.pop_arr() {
            Some(arr) => arr,
            None => return Ok(()),
        };

        for element in arr {
            match element {
                Object::String(s) => {
                    let bytes: Vec<u8> = s.chars().map(|c| c as u32 as u8).collect();
                    self.show_text_bytes(&bytes)?;
                }
                element => {
                    if let Ok(adjustment) = self.resolver.assert_number(element) {
                        let text_state = self.text_state_mut();
                        let tx = -adjustment / 1000.0
                            * text_state.font_size
                            * text_state.horizontal_scaling;

                        text_state.text_matrix =
                            Matrix::new_translate(tx, 0.0) * text_state.text_matrix;
                    }
                }
            }
        }

        Ok(())
    }

    /// Shape and place one string's glyphs, advancing the text matrix.
    /// Glyph emission carries the local Y-flip; invisible and clip-only
    /// modes advance without emitting
    fn show_text_bytes(&mut self, bytes: &[u8]) -> PdfResult<()> {
        let text_state = &self.graphics_state.device_independent.text_state;

        if !text_state.in_text_object {
            log::warn!("text-showing operator outside BT/ET");
        }

        let font = match &text_state.font {
            Some(font) => Rc::clone(font),
            None => {
                log::warn!("text shown with no font selected");
                return Ok(());
            }
        };

        let font_size = text_state.font_size;
        let horizontal_scaling = text_state.horizontal_scaling;
        let character_spacing = text_state.character_spacing;
        let word_spacing = text_state.word_spacing;
        let rise = text_state.rise;
        let rendering_mode = text_state.rendering_mode;

        let codes = self.shaper.extract_character_codes(&font, bytes);

        let mut glyphs = Vec::new();
        let ctm = self.ctm();

        for code in codes {
            let info = self.shaper.extract_character_info(&font, code);

            let text_matrix = self.graphics_state.device_independent.text_state.text_matrix;

            // glyph-space parameters scale into text space, then through
            // the text and current transformation matrices
            let rendering_matrix = Matrix::new(
                font_size * horizontal_scaling,
                0.0,
                0.0,
                font_size,
                0.0,
                rise,
            ) * text_matrix
                * ctm;

            let position = rendering_matrix.apply(Point::new(
                info.offset.0 / 1000.0,
                info.offset.1 / 1000.0,
            ));

            for &glyph_id in &info.glyph_ids {
                glyphs.push(PositionedGlyph {
                    glyph_id,
                    x: position.x,
                    y: position.y,
                });
            }

            let advance = info.advance / 1000.0;
            let is_space = code == 32;

            let tx = (advance * font_size
                + character_spacing
                + if is_space { word_spacing } else { 0.0 })
                * horizontal_scaling;

            let text_state = self.text_state_mut();
            text_state.text_matrix = Matrix::new_translate(tx, 0.0) * text_state.text_matrix;
        }

        if glyphs.is_empty()
            || rendering_mode == TextRenderingMode::Invisible
            || rendering_mode == TextRenderingMode::Clip
        {
            return Ok(());
        }

        let origin = (glyphs[0].x, glyphs[0].y);
        let blob = TextBlob {
            glyphs,
            font_size,
        };

        if rendering_mode.fills() {
            let paint = self.resolve_paint(false)?;
            self.with_soft_mask(|renderer| {
                RenderDispatcher::draw_text_sequence(renderer.canvas, &blob, origin, &paint);
                Ok(())
            })?;
        }

        if rendering_mode.strokes() {
            let paint = self.resolve_paint(true)?;
            self.with_soft_mask(|renderer| {
                RenderDispatcher::draw_text_sequence(renderer.canvas, &blob, origin, &paint);
                Ok(())
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{data_structures::Rectangle, resolve::NoResolve};

    fn render_to_recorder(content: &[u8]) -> PictureRecorder {
        let mut recorder = PictureRecorder::new(Rectangle::new(0.0, 0.0, 500.0, 500.0));
        let mut resolver = NoResolve;
        let shaper = MonospaceShaper;

        {
            let mut renderer = Renderer::new(
                &mut recorder,
                &mut resolver,
                &shaper,
                Rc::new(ResourceSet::empty()),
                RenderParams::default(),
            );

            renderer.render(content).unwrap();
        }

        recorder
    }

    fn drawn_paths(recorder: &PictureRecorder) -> Vec<(&Path, &Paint)> {
        recorder
            .ops()
            .iter()
            .filter_map(|op| match op {
                CanvasOp::DrawPath { path, paint } => Some((path, paint)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn solid_red_rectangle_marks_canvas() {
        let recorder = render_to_recorder(b"1 0 0 rg 10 10 100 50 re f");

        let paths = drawn_paths(&recorder);
        assert_eq!(paths.len(), 1);

        let (path, paint) = paths[0];
        assert_eq!(path.bounding_box(), Rectangle::new(10.0, 10.0, 110.0, 60.0));
        assert_eq!(paint.color, [1.0, 0.0, 0.0, 1.0]);
        assert!(matches!(paint.style, PaintStyle::Fill));
    }

    #[test]
    fn ctm_transforms_path_coordinates() {
        let recorder = render_to_recorder(b"2 0 0 2 0 0 cm 5 5 10 10 re f");

        let paths = drawn_paths(&recorder);
        assert_eq!(
            paths[0].0.bounding_box(),
            Rectangle::new(10.0, 10.0, 30.0, 30.0)
        );
    }

    #[test]
    fn save_restore_round_trips_state() {
        let recorder = render_to_recorder(b"q 0 1 0 rg Q 0 0 20 20 re f");

        let paths = drawn_paths(&recorder);
        // the green fill was restored away; the default is black
        assert_eq!(paths[0].1.color, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn unbalanced_restore_is_structural() {
        let mut recorder = PictureRecorder::new(Rectangle::new(0.0, 0.0, 100.0, 100.0));
        let mut resolver = NoResolve;
        let shaper = MonospaceShaper;

        let mut renderer = Renderer::new(
            &mut recorder,
            &mut resolver,
            &shaper,
            Rc::new(ResourceSet::empty()),
            RenderParams::default(),
        );

        let err = renderer.render(b"Q").unwrap_err();
        assert!(err.downcast_ref::<RenderError>().is_some());
    }

    #[test]
    fn unbalanced_save_is_structural() {
        let mut recorder = PictureRecorder::new(Rectangle::new(0.0, 0.0, 100.0, 100.0));
        let mut resolver = NoResolve;
        let shaper = MonospaceShaper;

        let mut renderer = Renderer::new(
            &mut recorder,
            &mut resolver,
            &shaper,
            Rc::new(ResourceSet::empty()),
            RenderParams::default(),
        );

        assert!(renderer.render(b"q 1 0 0 rg").is_err());
    }

    #[test]
    fn clip_with_empty_path_is_noop() {
        let recorder = render_to_recorder(b"W n 0 0 10 10 re f");

        assert!(!recorder
            .ops()
            .iter()
            .any(|op| matches!(op, CanvasOp::ClipPath { .. })));
    }

    #[test]
    fn clip_path_applies_after_painting() {
        let recorder = render_to_recorder(b"0 0 50 50 re W n 0 0 10 10 re f");

        assert!(recorder
            .ops()
            .iter()
            .any(|op| matches!(op, CanvasOp::ClipPath { .. })));
    }

    #[test]
    fn operand_underflow_consumes_available_and_proceeds() {
        // `rg` wants three operands but only two are supplied
        let recorder = render_to_recorder(b"0.5 0.5 rg 0 0 10 10 re f");

        let paths = drawn_paths(&recorder);
        assert_eq!(paths.len(), 1);
        // the missing operand reads as zero
        assert_eq!(paths[0].1.color[2], 0.5);
    }

    #[test]
    fn gray_operator_sets_gray_paint() {
        let recorder = render_to_recorder(b"0.5 g 0 0 10 10 re f");

        let paths = drawn_paths(&recorder);
        assert_eq!(paths[0].1.color, [0.5, 0.5, 0.5, 1.0]);
    }

    #[test]
    fn stroke_paint_carries_line_width() {
        let recorder = render_to_recorder(b"3 w 0 0 10 10 re S");

        let paths = drawn_paths(&recorder);
        match &paths[0].1.style {
            PaintStyle::Stroke(stroke) => assert_eq!(stroke.width, 3.0),
            PaintStyle::Fill => panic!("expected stroke paint"),
        }
    }

    #[test]
    fn text_emits_flipped_blob() {
        let recorder =
            render_to_recorder(b"BT 12 0 0 12 40 50 Tm (AB) Tj ET 0 0 5 5 re f");

        // no font resource resolves, so no blob lands, but the path after
        // ET still paints: the text machine must not derail the stream
        assert_eq!(drawn_paths(&recorder).len(), 1);
    }

    #[test]
    fn invisible_text_mode_advances_without_marks() {
        let recorder = render_to_recorder(b"BT 3 Tr (hi) Tj ET");

        assert!(!recorder
            .ops()
            .iter()
            .any(|op| matches!(op, CanvasOp::DrawTextBlob { .. })));
    }

    use crate::{
        objects::Reference,
        resources::Resources,
        store::{MemoryProvider, ObjectStore},
        stream::Stream,
    };
    use std::collections::HashMap;

    fn dict(entries: Vec<(&str, Object)>) -> Dictionary {
        Dictionary::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v))
                .collect::<HashMap<_, _>>(),
        )
    }

    fn name(s: &str) -> Object {
        Object::Name(Name(s.to_owned()))
    }

    fn numbers(values: &[f32]) -> Object {
        Object::Array(values.iter().map(|&v| Object::Real(v)).collect())
    }

    fn render_with_store(
        content: &[u8],
        resources: Dictionary,
        provider: MemoryProvider,
    ) -> PictureRecorder {
        let mut recorder =
            PictureRecorder::new(crate::data_structures::Rectangle::new(0.0, 0.0, 500.0, 500.0));
        let mut store = ObjectStore::new(Box::new(provider));
        let shaper = MonospaceShaper;

        let resources = Rc::new(ResourceSet::new(
            Resources::from_dict(resources, &mut store).unwrap(),
        ));

        {
            let mut renderer = Renderer::new(
                &mut recorder,
                &mut store,
                &shaper,
                resources,
                RenderParams::default(),
            );

            renderer.render(content).unwrap();
        }

        recorder
    }

    #[test]
    fn text_with_font_emits_flipped_blob() {
        let resources = dict(vec![(
            "Font",
            Object::Dictionary(dict(vec![("F1", Object::Dictionary(dict(vec![]))) ])),
        )]);

        let recorder = render_with_store(
            b"BT /F1 12 Tf 40 50 Td (AB) Tj ET",
            resources,
            MemoryProvider::new(),
        );

        let blob = recorder
            .ops()
            .iter()
            .find_map(|op| match op {
                CanvasOp::DrawTextBlob { blob, .. } => Some(blob),
                _ => None,
            })
            .expect("text blob drawn");

        assert_eq!(blob.glyphs.len(), 2);
        assert_eq!(blob.glyphs[0].x, 40.0);
        assert_eq!(blob.glyphs[0].y, 50.0);

        // the monospace shaper advances half an em per glyph: the text
        // matrix scale of 12 places the second glyph 6 units along
        assert!((blob.glyphs[1].x - 46.0).abs() < 1e-3);
    }

    #[test]
    fn recursive_form_renders_inner_content_once() {
        let form_reference = Reference {
            object_number: 5,
            generation: 0,
        };

        let form_resources = dict(vec![(
            "XObject",
            Object::Dictionary(dict(vec![("Fm", Object::Reference(form_reference))])),
        )]);

        let form_stream = Stream {
            dict: crate::stream::StreamDict {
                len: None,
                filter: None,
                decode_parms: None,
                other: dict(vec![
                    ("Type", name("XObject")),
                    ("Subtype", name("Form")),
                    ("BBox", numbers(&[0.0, 0.0, 100.0, 100.0])),
                    ("Resources", Object::Dictionary(form_resources.clone())),
                ]),
            },
            stream: b"0 0 10 10 re f /Fm Do".to_vec(),
        };

        let mut provider = MemoryProvider::new();
        provider.insert(form_reference, Object::Stream(form_stream));

        let recorder = render_with_store(b"/Fm Do", form_resources, provider);

        let fills = recorder
            .ops()
            .iter()
            .filter(|op| matches!(op, CanvasOp::DrawPath { .. }))
            .count();

        // the self-reference is dropped, not an error, and not infinite
        assert_eq!(fills, 1);
    }

    #[test]
    fn colored_tiling_pattern_fills_with_tile_shader() {
        let pattern_stream = Stream {
            dict: crate::stream::StreamDict {
                len: None,
                filter: None,
                decode_parms: None,
                other: dict(vec![
                    ("Type", name("Pattern")),
                    ("PatternType", Object::Integer(1)),
                    ("PaintType", Object::Integer(1)),
                    ("TilingType", Object::Integer(1)),
                    ("BBox", numbers(&[0.0, 0.0, 10.0, 10.0])),
                    ("XStep", Object::Integer(10)),
                    ("YStep", Object::Integer(10)),
                    ("Resources", Object::Dictionary(dict(vec![]))),
                ]),
            },
            stream: b"3 3 4 4 re f".to_vec(),
        };

        let resources = dict(vec![(
            "Pattern",
            Object::Dictionary(dict(vec![("P1", Object::Stream(pattern_stream))])),
        )]);

        let recorder = render_with_store(
            b"/Pattern cs /P1 scn 0 0 100 100 re f",
            resources,
            MemoryProvider::new(),
        );

        let paint = recorder
            .ops()
            .iter()
            .find_map(|op| match op {
                CanvasOp::DrawPath { paint, .. } => Some(paint),
                _ => None,
            })
            .expect("fill drawn");

        match &paint.shader {
            Some(Shader::Tile {
                picture,
                x_step,
                y_step,
                ..
            }) => {
                assert_eq!(*x_step, 10.0);
                assert_eq!(*y_step, 10.0);
                // the recorded cell contains the dot
                assert!(picture
                    .ops
                    .iter()
                    .any(|op| matches!(op, CanvasOp::DrawPath { .. })));
            }
            other => panic!("expected tile shader, got {:?}", other),
        }
    }

    #[test]
    fn luminosity_soft_mask_brackets_each_mark() {
        let mask_form = Stream {
            dict: crate::stream::StreamDict {
                len: None,
                filter: None,
                decode_parms: None,
                other: dict(vec![
                    ("Type", name("XObject")),
                    ("Subtype", name("Form")),
                    ("BBox", numbers(&[0.0, 0.0, 100.0, 100.0])),
                    (
                        "Group",
                        Object::Dictionary(dict(vec![
                            ("S", name("Transparency")),
                            ("CS", name("DeviceGray")),
                        ])),
                    ),
                ]),
            },
            // left half white, right half black
            stream: b"1 g 0 0 50 100 re f 0 g 50 0 50 100 re f".to_vec(),
        };

        let ext_g_state = dict(vec![(
            "GS0",
            Object::Dictionary(dict(vec![(
                "SMask",
                Object::Dictionary(dict(vec![
                    ("S", name("Luminosity")),
                    ("G", Object::Stream(mask_form)),
                ])),
            )])),
        )]);

        let resources = dict(vec![("ExtGState", Object::Dictionary(ext_g_state))]);

        let recorder = render_with_store(
            b"/GS0 gs 1 0 0 rg 0 0 100 100 re f",
            resources,
            MemoryProvider::new(),
        );

        let ops = recorder.ops();

        let layer_at = ops
            .iter()
            .position(|op| matches!(op, CanvasOp::SaveLayer(..)))
            .expect("soft mask opens a layer");

        let compose_at = ops
            .iter()
            .position(|op| {
                matches!(
                    op,
                    CanvasOp::DrawPicture { paint, .. }
                        if paint.composite == CompositeMode::DstIn
                            && paint.color_filter == Some(ColorFilter::LumaToAlpha)
                )
            })
            .expect("mask composes with DstIn and luma-to-alpha");

        let content_at = ops
            .iter()
            .position(|op| {
                matches!(op, CanvasOp::DrawPath { paint, .. } if paint.color == [1.0, 0.0, 0.0, 1.0])
            })
            .expect("red fill drawn inside the layer");

        assert!(layer_at < content_at);
        assert!(content_at < compose_at);
        assert!(matches!(ops[compose_at + 1], CanvasOp::Restore));
    }
}
