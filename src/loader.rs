use miette::Result;

use crate::error;
use crate::runtime::MEMORY_SIZE;

/// A program image ready to be copied into memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    /// Address the image is loaded at
    orig: u8,
    bytes: Vec<u8>,
}

impl Program {
    /// Parse the textual program format.
    ///
    /// Each line holds a single byte written in binary. Everything after a `#` is a comment and
    /// blank lines are skipped. Any other content is an error rather than a zero.
    pub fn parse(src: &str) -> Result<Program> {
        let mut bytes = Vec::new();
        let mut line_start = 0;

        for line in src.split_inclusive('\n') {
            let code = line.split_once('#').map_or(line, |(code, _)| code);
            let lit = code.trim();
            if !lit.is_empty() {
                let offs = line_start + (code.len() - code.trim_start().len());
                let span = offs..offs + lit.len();

                if bytes.len() == MEMORY_SIZE {
                    return Err(error::load_too_large(span, src, MEMORY_SIZE));
                }
                let byte = parse_byte(lit)
                    .map_err(|reason| error::load_bad_literal(span, src, reason))?;
                bytes.push(byte);
            }
            line_start += line.len();
        }

        Ok(Program { orig: 0, bytes })
    }

    /// Use raw bytes as the image, as produced by [`Program::emit`].
    pub fn from_raw(raw: &[u8]) -> Result<Program> {
        if raw.len() > MEMORY_SIZE {
            return Err(error::load_image_too_large(0, raw.len(), MEMORY_SIZE));
        }
        Ok(Program {
            orig: 0,
            bytes: raw.to_vec(),
        })
    }

    pub fn orig(&self) -> u8 {
        self.orig
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Raw binary image.
    pub fn emit(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

/// Parse a binary literal such as `10000010` or `0b1000_0010`.
fn parse_byte(lit: &str) -> Result<u8, &'static str> {
    let digits = lit
        .strip_prefix("0b")
        .or_else(|| lit.strip_prefix("0B"))
        .unwrap_or(lit);
    let digits: String = digits.chars().filter(|&c| c != '_').collect();

    if digits.is_empty() || !digits.chars().all(|c| c == '0' || c == '1') {
        return Err("not a binary literal");
    }
    // Leading zeroes are fine, only significant bits count
    u8::from_str_radix(&digits, 2).map_err(|_| "wider than 8 bits")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_comments_and_blanks() {
        let src = "# print8.ls8\n\
                   \n\
                   10000010 # LDI R0,8\n\
                   00000000\n\
                   00001000\n\
                   \t01000111   # PRN R0\n\
                   00000000\n\
                   00000001 # HLT\n";
        let program = Program::parse(src).unwrap();
        assert_eq!(program.orig(), 0);
        assert_eq!(
            program.bytes(),
            &[0b1000_0010, 0, 8, 0b0100_0111, 0, 0b0000_0001]
        );
    }

    #[test]
    fn handles_crlf_and_missing_trailing_newline() {
        let program = Program::parse("00000001\r\n00000010").unwrap();
        assert_eq!(program.bytes(), &[1, 2]);
    }

    #[test]
    fn empty_source_is_empty_program() {
        let program = Program::parse("# nothing here\n\n").unwrap();
        assert!(program.is_empty());
    }

    #[test]
    fn accepts_prefix_and_separators() {
        let program = Program::parse("0b1010_0010\n0B1\n1\n000000001").unwrap();
        assert_eq!(program.bytes(), &[0b1010_0010, 1, 1, 1]);
    }

    #[test]
    fn parse_byte_errors() {
        assert_eq!(parse_byte("10000010"), Ok(130));
        assert_eq!(parse_byte("12"), Err("not a binary literal"));
        assert_eq!(parse_byte("0b"), Err("not a binary literal"));
        assert_eq!(parse_byte("LDI"), Err("not a binary literal"));
        assert_eq!(parse_byte("-1"), Err("not a binary literal"));
        assert_eq!(parse_byte("100000000"), Err("wider than 8 bits"));
    }

    #[test]
    fn malformed_line_is_an_error() {
        assert!(Program::parse("00000001\nhello\n").is_err());
        assert!(Program::parse("10000010 00000000\n").is_err());
        assert!(Program::parse("111111111\n").is_err());
    }

    #[test]
    fn rejects_oversized_program() {
        let src = "00000001\n".repeat(MEMORY_SIZE);
        assert_eq!(Program::parse(&src).unwrap().len(), MEMORY_SIZE);

        let src = "00000001\n".repeat(MEMORY_SIZE + 1);
        assert!(Program::parse(&src).is_err());
    }

    #[test]
    fn raw_round_trip() {
        let program = Program::parse("10000010\n00000000\n00001000\n").unwrap();
        let raw = program.emit();
        assert_eq!(Program::from_raw(&raw).unwrap(), program);
        assert!(Program::from_raw(&[0; MEMORY_SIZE + 1]).is_err());
    }
}
