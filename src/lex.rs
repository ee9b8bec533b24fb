use std::collections::HashMap;

use crate::{
    error::{ParseError, PdfResult},
    objects::{Dictionary, Name, Object},
};

const FORM_FEED: u8 = b'\x0C';
const BACKSPACE: u8 = b'\x08';

/// Inverse powers of ten for single-pass real-number accumulation. Content
/// streams rarely carry more than 5 fractional digits; anything deeper is
/// beyond `f32` precision anyway
const INVERSE_POWERS_OF_TEN: [f32; 10] = [
    1.0, 1e-1, 1e-2, 1e-3, 1e-4, 1e-5, 1e-6, 1e-7, 1e-8, 1e-9,
];

pub(crate) trait LexBase {
    fn buffer(&self) -> &[u8];
    fn cursor(&self) -> usize;
    fn cursor_mut(&mut self) -> &mut usize;

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek_byte() {
            if Self::is_whitespace(b) {
                self.next_byte();
            } else if b == b'%' {
                self.next_byte();
                self.skip_comment();
            } else {
                break;
            }
        }
    }

    fn next_byte(&mut self) -> Option<u8> {
        self.buffer().get(self.cursor()).copied().map(|b| {
            *self.cursor_mut() += 1;
            b
        })
    }

    fn peek_byte(&self) -> Option<u8> {
        self.buffer().get(self.cursor()).copied()
    }

    fn peek_byte_offset(&self, offset: usize) -> Option<u8> {
        self.buffer().get(self.cursor() + offset).copied()
    }

    fn next_is_delimiter(&self) -> bool {
        self.peek_byte().map_or(false, Self::is_delimiter)
    }

    fn next_is_whitespace(&self) -> bool {
        self.peek_byte().map_or(false, Self::is_whitespace)
    }

    /// Whitespace chars are defined as
    ///
    /// * NUL             0x0
    /// * Horizontal tab  0x9
    /// * Line feed       0xa
    /// * Form feed       0xc
    /// * Carriage return 0xd
    /// * Space           0x20
    fn is_whitespace(b: u8) -> bool {
        matches!(b, b'\0' | 0x9 | b'\n' | FORM_FEED | b'\r' | b' ')
    }

    fn is_delimiter(b: u8) -> bool {
        matches!(
            b,
            b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
        )
    }

    fn is_regular(b: u8) -> bool {
        !Self::is_whitespace(b) && !Self::is_delimiter(b)
    }

    /// Assumes the leading `%` has already been consumed
    fn skip_comment(&mut self) {
        while !self.next_is_eol() {
            self.next_byte();
        }
    }

    fn next_is_eol(&self) -> bool {
        match self.peek_byte() {
            Some(b'\r' | b'\n') => true,
            Some(..) => false,
            None => true,
        }
    }

    /// Does not modify the cursor
    fn next_matches(&mut self, bytes: &[u8]) -> bool {
        let start_pos = self.cursor();

        for &b in bytes {
            if Some(b) != self.next_byte() {
                *self.cursor_mut() = start_pos;
                return false;
            }
        }

        *self.cursor_mut() = start_pos;

        true
    }

    fn expect_byte(&mut self, expected: u8) -> PdfResult<()> {
        match self.next_byte() {
            Some(found) if expected == found => Ok(()),
            found => anyhow::bail!(ParseError::MismatchedByte { expected, found }),
        }
    }

    fn expect_bytes(&mut self, bytes: &[u8]) -> PdfResult<()> {
        for &b in bytes {
            self.expect_byte(b)?;
        }

        Ok(())
    }

    fn hex_byte_to_digit(b: u8) -> Option<u8> {
        match b {
            b'0'..=b'9' => Some(b - b'0'),
            b'a'..=b'f' => Some(b - b'a' + 10),
            b'A'..=b'F' => Some(b - b'A' + 10),
            _ => None,
        }
    }

    fn lex_name(&mut self) -> PdfResult<Name> {
        self.expect_byte(b'/')?;

        let mut name = String::new();

        while let Some(b) = self.peek_byte() {
            if !Self::is_regular(b) {
                break;
            }

            self.next_byte();

            if b == b'#' {
                let hi = self
                    .next_byte()
                    .and_then(Self::hex_byte_to_digit)
                    .ok_or(ParseError::UnexpectedEof)?;
                let lo = self
                    .next_byte()
                    .and_then(Self::hex_byte_to_digit)
                    .ok_or(ParseError::UnexpectedEof)?;

                name.push((hi * 16 + lo) as char);
            } else {
                name.push(b as char);
            }
        }

        Ok(Name(name))
    }

    fn lex_string(&mut self) -> PdfResult<String> {
        self.expect_byte(b'(')?;

        let mut string = String::new();
        let mut num_open_parens = 0;

        while let Some(b) = self.peek_byte() {
            match b {
                b')' if num_open_parens == 0 => {
                    self.next_byte();
                    break;
                }
                b')' => {
                    num_open_parens -= 1;
                    string.push(')');
                }
                b'(' => {
                    num_open_parens += 1;
                    string.push('(');
                }
                b'\\' => {
                    self.next_byte();
                    match self.next_byte() {
                        Some(b'n') => string.push('\n'),
                        Some(b'r') => string.push('\r'),
                        Some(b't') => string.push('\t'),
                        Some(b'b') => string.push(BACKSPACE as char),
                        Some(b'f') => string.push(FORM_FEED as char),
                        Some(b'(') => string.push('('),
                        Some(b')') => string.push(')'),
                        Some(b'\\') => string.push('\\'),
                        // a backslash at end of line elides the newline
                        Some(b'\r') => {
                            if self.peek_byte() == Some(b'\n') {
                                self.next_byte();
                            }
                        }
                        Some(b'\n') => {}
                        // octal escape of the form `\ddd` (1 to 3 digits)
                        Some(c @ b'0'..=b'7') => {
                            let mut n = c - b'0';

                            for _ in 0..2 {
                                match self.peek_byte() {
                                    Some(d @ b'0'..=b'7') => {
                                        self.next_byte();
                                        n = n.wrapping_mul(8).wrapping_add(d - b'0');
                                    }
                                    _ => break,
                                }
                            }

                            string.push(n as char);
                        }
                        // a reverse solidus before anything else is dropped
                        Some(c) => string.push(c as char),
                        None => anyhow::bail!(ParseError::UnexpectedEof),
                    }
                    continue;
                }
                _ => {
                    string.push(b as char);
                }
            }
            self.next_byte();
        }

        Ok(string)
    }

    /// Single-pass number accumulation. A malformed token yields zero rather
    /// than an error
    fn lex_number(&mut self) -> Object {
        let negative = match self.peek_byte() {
            Some(b'+') => {
                self.next_byte();
                false
            }
            Some(b'-') => {
                self.next_byte();
                true
            }
            _ => false,
        };

        let mut whole: i64 = 0;

        while let Some(b @ b'0'..=b'9') = self.peek_byte() {
            self.next_byte();
            whole = whole.saturating_mul(10).saturating_add((b - b'0') as i64);
        }

        if self.peek_byte() != Some(b'.') {
            let n = if negative { -whole } else { whole };
            return Object::Integer(n.clamp(i32::MIN as i64, i32::MAX as i64) as i32);
        }

        self.next_byte();

        let mut frac: i64 = 0;
        let mut frac_digits = 0usize;

        while let Some(b @ b'0'..=b'9') = self.peek_byte() {
            self.next_byte();

            // digits beyond f32 precision are consumed but ignored
            if frac_digits + 1 < INVERSE_POWERS_OF_TEN.len() {
                frac = frac * 10 + (b - b'0') as i64;
                frac_digits += 1;
            }
        }

        let mut value = whole as f32 + frac as f32 * INVERSE_POWERS_OF_TEN[frac_digits];

        if negative {
            value = -value;
        }

        Object::Real(value)
    }
}

pub(crate) trait LexObject: LexBase {
    fn lex_object(&mut self) -> PdfResult<Object> {
        self.skip_whitespace();
        let obj = match self.peek_byte() {
            Some(b't') => self.lex_true(),
            Some(b'f') => self.lex_false(),
            Some(b'n') => self.lex_null(),
            Some(b'<') => self.lex_gt(),
            Some(b'+' | b'-' | b'0'..=b'9' | b'.') => Ok(self.lex_number()),
            Some(b'(') => Ok(Object::String(self.lex_string()?)),
            Some(b'/') => Ok(Object::Name(self.lex_name()?)),
            Some(b'[') => self.lex_array(),
            Some(b) => anyhow::bail!("unexpected object start {:?}", b as char),
            None => anyhow::bail!(ParseError::UnexpectedEof),
        }?;
        self.skip_whitespace();
        Ok(obj)
    }

    /// Assumes leading 't' has not been consumed
    fn lex_true(&mut self) -> PdfResult<Object> {
        self.expect_bytes(b"true")?;

        Ok(Object::True)
    }

    /// Assumes leading 'f' has not been consumed
    fn lex_false(&mut self) -> PdfResult<Object> {
        self.expect_bytes(b"false")?;

        Ok(Object::False)
    }

    /// Assumes leading 'n' has not been consumed
    fn lex_null(&mut self) -> PdfResult<Object> {
        self.expect_bytes(b"null")?;

        Ok(Object::Null)
    }

    fn lex_gt(&mut self) -> PdfResult<Object> {
        match self.peek_byte_offset(1) {
            Some(b'<') => self.lex_dict(),
            // special cased empty byte string, `<>`
            Some(b'>') => {
                self.next_byte();
                self.next_byte();
                Ok(Object::String(String::new()))
            }
            Some(..) => self.lex_hex_string(),
            None => anyhow::bail!(ParseError::UnexpectedEof),
        }
    }

    fn lex_dict_inner(&mut self) -> PdfResult<Dictionary> {
        self.expect_byte(b'<')?;
        self.expect_byte(b'<')?;
        self.skip_whitespace();

        let mut dict = HashMap::new();

        while let Some(b) = self.peek_byte() {
            if b == b'>' {
                self.next_byte();
                self.expect_byte(b'>')?;
                break;
            }

            let name = self.lex_name()?;
            let value = self.lex_object()?;
            self.skip_whitespace();
            dict.insert(name.0, value);
        }

        self.skip_whitespace();

        Ok(Dictionary::new(dict))
    }

    fn lex_dict(&mut self) -> PdfResult<Object> {
        Ok(Object::Dictionary(self.lex_dict_inner()?))
    }

    fn lex_hex_string(&mut self) -> PdfResult<Object> {
        self.expect_byte(b'<')?;

        let mut string = String::new();
        let mut pending: Option<u8> = None;

        while let Some(b) = self.next_byte() {
            if b == b'>' {
                // an odd number of digits behaves as if followed by 0
                if let Some(hi) = pending {
                    string.push((hi * 16) as char);
                }
                break;
            }

            if Self::is_whitespace(b) {
                continue;
            }

            let digit = Self::hex_byte_to_digit(b).ok_or(ParseError::UnexpectedEof)?;

            match pending.take() {
                Some(hi) => string.push((hi * 16 + digit) as char),
                None => pending = Some(digit),
            }
        }

        Ok(Object::String(string))
    }

    fn lex_array(&mut self) -> PdfResult<Object> {
        let mut arr = Vec::new();
        self.expect_byte(b'[')?;
        while let Some(b) = self.peek_byte() {
            if b == b']' {
                self.next_byte();
                break;
            }

            arr.push(self.lex_object()?);
        }

        Ok(Object::Array(arr))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct TestLexer {
        buffer: Vec<u8>,
        cursor: usize,
    }

    impl TestLexer {
        fn new(buffer: &[u8]) -> Self {
            Self {
                buffer: buffer.to_vec(),
                cursor: 0,
            }
        }
    }

    impl LexBase for TestLexer {
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

    impl LexObject for TestLexer {}

    #[test]
    fn numbers() {
        assert_eq!(
            TestLexer::new(b"123").lex_object().unwrap(),
            Object::Integer(123)
        );
        assert_eq!(
            TestLexer::new(b"-7").lex_object().unwrap(),
            Object::Integer(-7)
        );
        assert_eq!(
            TestLexer::new(b"+4.75").lex_object().unwrap(),
            Object::Real(4.75)
        );
        assert_eq!(
            TestLexer::new(b".5").lex_object().unwrap(),
            Object::Real(0.5)
        );
        assert_eq!(
            TestLexer::new(b"-.002").lex_object().unwrap(),
            Object::Real(-0.002)
        );
    }

    #[test]
    fn malformed_number_is_zero() {
        assert_eq!(
            TestLexer::new(b"- ").lex_object().unwrap(),
            Object::Integer(0)
        );
        assert_eq!(TestLexer::new(b".").lex_object().unwrap(), Object::Real(0.0));
    }

    #[test]
    fn name_with_hex_escape() {
        assert_eq!(
            TestLexer::new(b"/A#20B").lex_object().unwrap(),
            Object::Name(Name("A B".to_owned()))
        );
    }

    #[test]
    fn nested_string() {
        assert_eq!(
            TestLexer::new(b"(a(b)c)").lex_object().unwrap(),
            Object::String("a(b)c".to_owned())
        );
    }

    #[test]
    fn octal_escape() {
        assert_eq!(
            TestLexer::new(b"(\\101)").lex_object().unwrap(),
            Object::String("A".to_owned())
        );
    }

    #[test]
    fn hex_string_with_odd_digits() {
        assert_eq!(
            TestLexer::new(b"<414>").lex_object().unwrap(),
            Object::String("A\x40".to_owned())
        );
    }

    #[test]
    fn dictionary() {
        let obj = TestLexer::new(b"<< /Width 8 /Gray true >>")
            .lex_object()
            .unwrap();

        let mut dict = match obj {
            Object::Dictionary(d) => d,
            _ => panic!("expected dictionary"),
        };

        assert_eq!(dict.get_object("Width"), Some(Object::Integer(8)));
        assert_eq!(dict.get_object("Gray"), Some(Object::True));
    }
}
