use std::borrow::Cow;

use crate::{
    error::PdfResult,
    lex::{LexBase, LexObject},
    objects::{Dictionary, Name, Object},
};

pub use operator::ContentOperator;

mod operator;

pub struct ContentLexer<'a> {
    pub(crate) buffer: Cow<'a, [u8]>,
    cursor: usize,

    /// If >0, unrecognized operators will be ignored
    ///
    /// Incremented when encountering a `BX` operator, and decremented
    /// when an `EX` operator is encountered
    in_compatibility_mode: u32,
}

#[derive(Debug, PartialEq)]
pub enum ContentToken {
    Object(Object),
    Operator(ContentOperator),
}

#[derive(Debug)]
enum ContentTokenOrUnknownOperator {
    Token(ContentToken),
    UnknownOperator(String),
}

impl Iterator for ContentLexer<'_> {
    type Item = PdfResult<ContentToken>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Some(Ok(ContentTokenOrUnknownOperator::Token(tok))) => {
                match &tok {
                    ContentToken::Operator(ContentOperator::BX) => {
                        self.in_compatibility_mode += 1
                    }
                    ContentToken::Operator(ContentOperator::EX) => {
                        self.in_compatibility_mode = self.in_compatibility_mode.saturating_sub(1)
                    }
                    _ => {}
                }

                Some(Ok(tok))
            }
            Some(Ok(ContentTokenOrUnknownOperator::UnknownOperator(s))) => {
                // unknown operators are skipped either way; outside a
                // compatibility section they are logged
                if !self.in_compatibility_mode() {
                    log::warn!("unknown content operator {:?}, skipping", s);
                }

                self.next()
            }
            Some(Err(e)) => Some(Err(e)),
            None => None,
        }
    }
}

impl<'a> ContentLexer<'a> {
    pub fn new(buffer: Cow<'a, [u8]>) -> Self {
        Self {
            buffer,
            cursor: 0,
            in_compatibility_mode: 0,
        }
    }

    pub fn debug_contents(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    fn in_compatibility_mode(&self) -> bool {
        self.in_compatibility_mode != 0
    }

    fn try_lex_operator(&mut self) -> PdfResult<ContentTokenOrUnknownOperator> {
        let start = self.cursor;

        while let Some(b) = self.peek_byte() {
            // terminal characters that end operators but are not alphanumeric
            if b == b'*' || b == b'\'' || b == b'"' {
                self.next_byte();
                break;
            }

            if !b.is_ascii_alphanumeric() {
                break;
            }

            self.next_byte();
        }

        let s = std::str::from_utf8(&self.buffer[start..self.cursor]).unwrap();

        if s == "true" {
            return Ok(ContentTokenOrUnknownOperator::Token(ContentToken::Object(
                Object::True,
            )));
        }

        if s == "false" {
            return Ok(ContentTokenOrUnknownOperator::Token(ContentToken::Object(
                Object::False,
            )));
        }

        if s == "null" {
            return Ok(ContentTokenOrUnknownOperator::Token(ContentToken::Object(
                Object::Null,
            )));
        }

        Ok(if let Ok(op) = ContentOperator::from_str(s) {
            ContentTokenOrUnknownOperator::Token(ContentToken::Operator(op))
        } else {
            ContentTokenOrUnknownOperator::UnknownOperator(s.to_owned())
        })
    }

    fn next_token(&mut self) -> Option<PdfResult<ContentTokenOrUnknownOperator>> {
        self.skip_whitespace();
        match self.peek_byte() {
            Some(b'"' | b'\'' | b'a'..=b'z' | b'A'..=b'Z') => Some(self.try_lex_operator()),
            Some(..) => Some(Ok(ContentTokenOrUnknownOperator::Token(
                ContentToken::Object(match self.lex_object() {
                    Ok(v) => v,
                    Err(e) => return Some(Err(e)),
                }),
            ))),
            None => None,
        }
    }

    /// Lex an inline image, assuming the `BI` operator has already been
    /// consumed: abbreviated key-value pairs up to `ID`, then binary sample
    /// data running to `EI`
    pub fn lex_inline_image(&mut self) -> PdfResult<(Dictionary, Vec<u8>)> {
        let mut dict = Dictionary::empty();

        loop {
            self.skip_whitespace();

            match self.peek_byte() {
                Some(b'/') => {
                    let key = self.lex_name()?;
                    let value = self.lex_object()?;

                    let (key, value) = expand_inline_image_entry(key, value);
                    dict.insert(key, value);
                }
                Some(..) => {
                    self.expect_bytes(b"ID")?;
                    break;
                }
                None => anyhow::bail!(crate::ParseError::UnexpectedEof),
            }
        }

        // a single whitespace byte separates ID from the sample data
        if self.next_is_whitespace() {
            self.next_byte();
        }

        let data_start = self.cursor;
        let data_end = self.find_inline_image_end();

        let data = self.buffer[data_start..data_end].to_vec();
        self.cursor = data_end;

        self.skip_whitespace();
        self.expect_bytes(b"EI")?;

        Ok((dict, data))
    }

    /// Scan for the whitespace-delimited `EI` that terminates inline image
    /// data. Binary sample data may contain the byte pair by chance, so the
    /// match requires surrounding whitespace or end of stream
    fn find_inline_image_end(&self) -> usize {
        let buffer = &self.buffer[..];
        let mut i = self.cursor;

        while i + 1 < buffer.len() {
            if buffer[i] == b'E' && buffer[i + 1] == b'I' {
                let before_ok = i == 0 || Self::is_whitespace(buffer[i - 1]);
                let after_ok = buffer
                    .get(i + 2)
                    .map_or(true, |&b| Self::is_whitespace(b) || Self::is_delimiter(b));

                if before_ok && after_ok {
                    // exclude the whitespace before the marker
                    return i.saturating_sub(1).max(self.cursor);
                }
            }

            i += 1;
        }

        buffer.len()
    }
}

/// Inline images abbreviate both keys and a handful of well-known values;
/// abbreviations map to their long forms at resolve time
fn expand_inline_image_entry(key: Name, value: Object) -> (String, Object) {
    let key = match key.as_str() {
        "W" => "Width",
        "H" => "Height",
        "BPC" => "BitsPerComponent",
        "CS" => "ColorSpace",
        "D" => "Decode",
        "DP" => "DecodeParms",
        "F" => "Filter",
        "IM" => "ImageMask",
        "I" => "Interpolate",
        other => other,
    }
    .to_owned();

    let value = match key.as_str() {
        "ColorSpace" => expand_names(value, expand_color_space_abbreviation),
        "Filter" => expand_names(value, expand_filter_abbreviation),
        _ => value,
    };

    (key, value)
}

fn expand_names(value: Object, expand: fn(&str) -> &str) -> Object {
    match value {
        Object::Name(name) => Object::Name(Name(expand(name.as_str()).to_owned())),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|obj| expand_names(obj, expand))
                .collect(),
        ),
        other => other,
    }
}

fn expand_color_space_abbreviation(name: &str) -> &str {
    match name {
        "G" => "DeviceGray",
        "RGB" => "DeviceRGB",
        "CMYK" => "DeviceCMYK",
        "I" => "Indexed",
        other => other,
    }
}

fn expand_filter_abbreviation(name: &str) -> &str {
    match name {
        "AHx" => "ASCIIHexDecode",
        "A85" => "ASCII85Decode",
        "LZW" => "LZWDecode",
        "Fl" => "FlateDecode",
        "RL" => "RunLengthDecode",
        "CCF" => "CCITTFaxDecode",
        "DCT" => "DCTDecode",
        other => other,
    }
}

impl LexBase for ContentLexer<'_> {
    fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn cursor_mut(&mut self) -> &mut usize {
        &mut self.cursor
    }
}

impl LexObject for ContentLexer<'_> {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rg_operator_is_not_parsed_as_number() {
        let buffer = b"1 1 1 RG";

        let tokens = ContentLexer::new(Cow::Borrowed(buffer))
            .collect::<PdfResult<Vec<ContentToken>>>()
            .unwrap();

        assert_eq!(
            tokens,
            vec![
                ContentToken::Object(Object::Integer(1)),
                ContentToken::Object(Object::Integer(1)),
                ContentToken::Object(Object::Integer(1)),
                ContentToken::Operator(ContentOperator::RG)
            ]
        );
    }

    #[test]
    fn empty_line() {
        let buffer = b"\n\n  \n\n";

        let tokens = ContentLexer::new(Cow::Borrowed(buffer))
            .collect::<PdfResult<Vec<ContentToken>>>()
            .unwrap();

        assert_eq!(tokens, vec![]);
    }

    #[test]
    fn quote_operators() {
        let buffer = b"( )'\"";

        let tokens = ContentLexer::new(Cow::Borrowed(buffer))
            .collect::<PdfResult<Vec<ContentToken>>>()
            .unwrap();

        assert_eq!(
            tokens,
            vec![
                ContentToken::Object(Object::String(" ".to_owned())),
                ContentToken::Operator(ContentOperator::single_quote),
                ContentToken::Operator(ContentOperator::double_quote),
            ]
        );
    }

    #[test]
    fn no_space_after_star_operator() {
        let buffer = b"b*RG";

        let tokens = ContentLexer::new(Cow::Borrowed(buffer))
            .collect::<PdfResult<Vec<ContentToken>>>()
            .unwrap();

        assert_eq!(
            tokens,
            vec![
                ContentToken::Operator(ContentOperator::b_star),
                ContentToken::Operator(ContentOperator::RG),
            ]
        );
    }

    #[test]
    fn unknown_operator_is_skipped() {
        let buffer = b"1 qq 2";

        let tokens = ContentLexer::new(Cow::Borrowed(buffer))
            .collect::<PdfResult<Vec<ContentToken>>>()
            .unwrap();

        assert_eq!(
            tokens,
            vec![
                ContentToken::Object(Object::Integer(1)),
                ContentToken::Object(Object::Integer(2)),
            ]
        );
    }

    #[test]
    fn inline_image_abbreviations_expand() {
        let buffer = b"/W 4 /H 1 /BPC 8 /CS /G /IM false ID \x00\x40\x80\xFF EI";

        let mut lexer = ContentLexer::new(Cow::Borrowed(&buffer[..]));

        let (mut dict, data) = lexer.lex_inline_image().unwrap();

        assert_eq!(dict.get_object("Width"), Some(Object::Integer(4)));
        assert_eq!(dict.get_object("Height"), Some(Object::Integer(1)));
        assert_eq!(dict.get_object("BitsPerComponent"), Some(Object::Integer(8)));
        assert_eq!(
            dict.get_object("ColorSpace"),
            Some(Object::Name(Name("DeviceGray".to_owned())))
        );
        assert_eq!(dict.get_object("ImageMask"), Some(Object::False));
        assert_eq!(data, vec![0x00, 0x40, 0x80, 0xFF]);
    }

    #[test]
    fn compatibility_section_suppresses_unknown_operators() {
        let buffer = b"BX zz EX 5";

        let tokens = ContentLexer::new(Cow::Borrowed(buffer))
            .collect::<PdfResult<Vec<ContentToken>>>()
            .unwrap();

        assert_eq!(
            tokens,
            vec![
                ContentToken::Operator(ContentOperator::BX),
                ContentToken::Operator(ContentOperator::EX),
                ContentToken::Object(Object::Integer(5)),
            ]
        );
    }
}
