use crate::resources::FontResource;

/// Metrics and glyph mapping for one character code, as produced by the
/// external text-layout collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterInfo {
    pub unicode: Option<char>,
    pub glyph_ids: Vec<u16>,
    /// Per-glyph widths in unscaled glyph space (thousandths of an em)
    pub widths: Vec<f32>,
    /// The advance of the whole cluster in unscaled glyph space
    pub advance: f32,
    /// Placement offset in unscaled glyph space
    pub offset: (f32, f32),
    pub x_scale: f32,
    /// The width the font file reports, before any PDF /Widths override
    pub original_width: f32,
}

/// The font shaper seam: the interpreter feeds it string bytes and
/// composes the glyph IDs and metrics it returns. Glyph outlines never
/// cross this boundary
pub trait TextShaper {
    /// Split string bytes into character codes under the font's encoding
    fn extract_character_codes(&self, font: &FontResource, bytes: &[u8]) -> Vec<u32>;

    fn extract_character_info(&self, font: &FontResource, code: u32) -> CharacterInfo;
}

/// A fixed-advance shaper: each byte is one code, one glyph, half an em
/// wide. Stands in when no host shaper is registered, and anchors the text
/// pipeline in tests
#[derive(Debug, Default)]
pub struct MonospaceShaper;

impl MonospaceShaper {
    /// Advance per glyph in thousandths of an em
    const ADVANCE: f32 = 500.0;
}

impl TextShaper for MonospaceShaper {
    fn extract_character_codes(&self, _font: &FontResource, bytes: &[u8]) -> Vec<u32> {
        bytes.iter().map(|&b| u32::from(b)).collect()
    }

    fn extract_character_info(&self, _font: &FontResource, code: u32) -> CharacterInfo {
        CharacterInfo {
            unicode: char::from_u32(code),
            glyph_ids: vec![code as u16],
            widths: vec![Self::ADVANCE],
            advance: Self::ADVANCE,
            offset: (0.0, 0.0),
            x_scale: 1.0,
            original_width: Self::ADVANCE,
        }
    }
}
