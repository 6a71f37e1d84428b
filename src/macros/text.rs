use super::{
    params::{parse_int, Cursor},
    MacroError, MacroExpander,
};
use crate::markup;

const REGISTERS: [&str; 34] = [
    "a", "b", "c", "d", "e", "f", "h", "l", "i", "r", "af", "bc", "de", "hl", "sp", "pc", "ix",
    "iy", "ixh", "ixl", "iyh", "iyl", "a'", "b'", "c'", "d'", "e'", "f'", "h'", "l'", "af'",
    "bc'", "de'", "hl'",
];

/// Read `num` or `(num)`. An empty bracketed value gives `None`.
fn read_number_param(cursor: &mut Cursor) -> Result<Option<u32>, MacroError> {
    let raw = match cursor.ch() {
        Some('(') => cursor.read_text()?.trim().to_owned(),
        _ => cursor.read_number().to_owned(),
    };
    if raw.is_empty() {
        return Ok(None);
    }
    parse_int(&raw)
        .map(Some)
        .ok_or_else(|| MacroError::Parsing(format!("Invalid integer: '{}'", raw)))
}

impl MacroExpander<'_> {
    // #CALL:name(args)
    pub(super) fn expand_call(
        &self,
        text: &str,
        index: usize,
        cwd: &str,
    ) -> Result<(usize, String), MacroError> {
        let mut cursor = Cursor::new(text, index);
        if !cursor.accept(':') {
            return Err(MacroError::Parsing("Malformed macro: #CALL".to_owned()));
        }
        let name = cursor.read_while(|c| c.is_alphanumeric() || c == '_');
        let args = cursor
            .read_optional_text()?
            .ok_or_else(|| MacroError::Parsing(format!("No argument list specified: #CALL:{}", name)))?;
        let callback = self.callbacks.get(name).ok_or_else(|| {
            MacroError::Parsing(format!("Unknown method name in #CALL macro: {}", name))
        })?;
        let args: Vec<String> = match args.as_str() {
            "" => vec![],
            args => args.split(',').map(str::to_owned).collect(),
        };
        Ok((cursor.position(), callback(cwd, &args)))
    }

    // #CHRnum or #CHR(num)
    pub(super) fn expand_chr(&self, text: &str, index: usize) -> Result<(usize, String), MacroError> {
        let mut cursor = Cursor::new(text, index);
        let num = read_number_param(&mut cursor)?
            .ok_or_else(|| MacroError::Parsing("No parameters (expected 1)".to_owned()))?;
        Ok((cursor.position(), format!("&#{};", num)))
    }

    // #HTML(text)
    pub(super) fn expand_html(&self, text: &str, index: usize) -> Result<(usize, String), MacroError> {
        let mut cursor = Cursor::new(text, index);
        let html = cursor.read_text()?;
        Ok((cursor.position(), html))
    }

    // #REGreg
    pub(super) fn expand_reg(&self, text: &str, index: usize) -> Result<(usize, String), MacroError> {
        let mut cursor = Cursor::new(text, index);
        let reg = cursor.read_while(|c| "abcdefhilprsxy'".contains(c));
        if reg.is_empty() {
            return Err(MacroError::Parsing("Missing register argument".to_owned()));
        }
        if !REGISTERS.contains(&reg) {
            return Err(MacroError::Parsing(format!("Bad register: \"{}\"", reg)));
        }
        let name = if self.config.lower_case {
            reg.to_owned()
        } else {
            reg.to_uppercase()
        };
        Ok((cursor.position(), markup::reg(&name)))
    }

    // #SPACE[num] or #SPACE([num])
    pub(super) fn expand_space(&self, text: &str, index: usize) -> Result<(usize, String), MacroError> {
        let mut cursor = Cursor::new(text, index);
        let num = read_number_param(&mut cursor)?.unwrap_or(1);
        Ok((cursor.position(), "&#160;".repeat(num as usize)))
    }
}
