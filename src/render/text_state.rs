use std::rc::Rc;

use crate::{data_structures::Matrix, resources::FontResource};

#[derive(Debug, Clone)]
pub struct TextState {
    /// The character-spacing parameter shall be a number specified in unscaled
    /// text space units (although it shall be subject to scaling by the Th
    /// parameter if the writing mode is horizontal). When the glyph for each
    /// character in the string is rendered, Tc shall be added to the horizontal
    /// or vertical component of the glyph's displacement, depending on the writing
    /// mode
    pub character_spacing: f32,

    /// Word spacing works the same way as character spacing but shall apply only
    /// to the ASCII SPACE character (20h). The word-spacing parameter shall be
    /// added to the glyph's horizontal or vertical displacement (depending on
    /// the writing mode).
    ///
    /// Word spacing shall be applied to every occurrence of the single-byte
    /// character code 32 in a string when using a simple font or a composite
    /// font that defines code 32 as a single-byte code. It shall not apply to
    /// occurrences of the byte value 32 in multiple-byte codes
    pub word_spacing: f32,

    /// The horizontal scaling parameter adjusts the width of glyphs by stretching
    /// or compressing them in the horizontal direction. Its value shall be
    /// specified as a percentage of the normal width of the glyphs, with 100
    /// being the normal width
    pub horizontal_scaling: f32,

    /// The leading parameter shall be specified in unscaled text space units.
    /// It specifies the vertical distance between the baselines of adjacent
    /// lines of text
    pub leading: f32,

    pub font: Option<Rc<FontResource>>,
    pub font_size: f32,
    pub rendering_mode: TextRenderingMode,

    /// Text rise, shall specify the distance, in unscaled text space units, to
    /// move the baseline up or down from its default location. Positive values
    /// of text rise shall move the baseline up
    pub rise: f32,

    pub text_matrix: Matrix,
    pub text_line_matrix: Matrix,

    /// Whether a `BT` has been seen without its matching `ET`
    pub in_text_object: bool,
}

impl TextState {
    /// `BT`: reset both text matrices to the identity
    pub fn reinit(&mut self) {
        self.text_matrix = Matrix::identity();
        self.text_line_matrix = Matrix::identity();
    }
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            character_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 1.0,
            leading: 0.0,
            font: None,
            font_size: 0.0,
            rendering_mode: TextRenderingMode::Fill,
            rise: 0.0,
            text_matrix: Matrix::identity(),
            text_line_matrix: Matrix::identity(),
            in_text_object: false,
        }
    }
}

#[pdf_enum(Integer)]
pub enum TextRenderingMode {
    Fill = 0,
    Stroke = 1,
    FillAndStroke = 2,
    Invisible = 3,
    FillAndClip = 4,
    StrokeAndClip = 5,
    FillAndStrokeAndClip = 6,
    Clip = 7,
}

impl TextRenderingMode {
    pub fn fills(self) -> bool {
        matches!(
            self,
            Self::Fill | Self::FillAndStroke | Self::FillAndClip | Self::FillAndStrokeAndClip
        )
    }

    pub fn strokes(self) -> bool {
        matches!(
            self,
            Self::Stroke | Self::FillAndStroke | Self::StrokeAndClip | Self::FillAndStrokeAndClip
        )
    }

    pub fn clips(self) -> bool {
        matches!(
            self,
            Self::FillAndClip | Self::StrokeAndClip | Self::FillAndStrokeAndClip | Self::Clip
        )
    }
}
