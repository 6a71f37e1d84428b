use super::MacroError;
use crate::graphics::CropRect;

/// Characters allowed in an image macro's numeric parameter string.
pub const IMAGE_CHARS: &str = "$0123456789abcdefABCDEF,";
/// Extra characters allowed when parameters may be given by name.
const NAME_CHARS: &str = "ghijklmnopqrstuvwxyz=";

/// Upper bound on the number of tiles an address range may expand to.
pub const MAX_TILES: usize = 65536;

/// The characters a parameter string is made of.
#[derive(Debug, Clone, Copy)]
pub enum Chars<'a> {
    Only(&'a str),
    Except(&'a str),
}

impl Chars<'_> {
    fn accepts(&self, ch: char) -> bool {
        match self {
            Chars::Only(chars) => chars.contains(ch),
            Chars::Except(chars) => !chars.contains(ch),
        }
    }
}

/// Walks a macro's arguments one character at a time.
pub struct Cursor<'a> {
    input: &'a str,
    position: usize, // Byte offset of the current char
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str, position: usize) -> Self {
        Self { input, position }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn ch(&self) -> Option<char> {
        self.input
            .get(self.position..)
            .and_then(|rest| rest.chars().next())
    }

    pub fn read_char(&mut self) {
        if let Some(ch) = self.ch() {
            self.position += ch.len_utf8();
        }
    }

    /// Consume `ch` if it's the current char.
    pub fn accept(&mut self, ch: char) -> bool {
        if self.ch() == Some(ch) {
            self.read_char();
            true
        } else {
            false
        }
    }

    pub fn read_while(&mut self, valid: impl Fn(char) -> bool) -> &'a str {
        let start = self.position;
        while self.ch().is_some_and(&valid) {
            self.read_char();
        }
        &self.input[start..self.position]
    }

    /// Read a bracketed string, e.g. `(text)`, allowing nested brackets.
    pub fn read_text(&mut self) -> Result<String, MacroError> {
        let start = self.position;
        if !self.accept('(') {
            return Err(MacroError::Parsing("No text parameter".to_owned()));
        }
        let mut depth = 1;
        while let Some(ch) = self.ch() {
            self.read_char();
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(self.input[start + 1..self.position - 1].to_owned());
                    }
                }
                _ => (),
            }
        }
        Err(MacroError::Parsing(format!(
            "No closing bracket: {}",
            &self.input[start..]
        )))
    }

    /// Read a bracketed string if there is one.
    pub fn read_optional_text(&mut self) -> Result<Option<String>, MacroError> {
        match self.ch() {
            Some('(') => self.read_text().map(Some),
            _ => Ok(None),
        }
    }

    /// Read a decimal or `$`-prefixed hexadecimal number as written.
    pub fn read_number(&mut self) -> &'a str {
        let start = self.position;
        if self.accept('$') {
            self.read_while(|c| c.is_ascii_hexdigit());
        } else {
            self.read_while(|c| c.is_ascii_digit());
        }
        &self.input[start..self.position]
    }

    /// Read a decimal or `$`-prefixed hexadecimal address.
    pub fn read_address(&mut self) -> Result<(String, u16), MacroError> {
        let start = self.position;
        let addr_str = self.read_number();
        parse_int(addr_str)
            .and_then(|address| u16::try_from(address).ok())
            .map(|address| (addr_str.to_owned(), address))
            .ok_or_else(|| {
                MacroError::Parsing(format!(
                    "Invalid address: '{}'",
                    self.input.get(start..).unwrap_or_default()
                ))
            })
    }
}

/// A decimal or `$`-prefixed hexadecimal number.
pub fn parse_int(text: &str) -> Option<u32> {
    match text.strip_prefix('$') {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

/// Read a parameter string made of `chars`, followed by an optional
/// bracketed string. Returns the end index, the parameter string and the
/// bracketed string.
pub fn parse_params<'a>(
    text: &'a str,
    index: usize,
    chars: Chars,
) -> Result<(usize, &'a str, Option<String>), MacroError> {
    let mut cursor = Cursor::new(text, index);
    let params = cursor.read_while(|c| chars.accepts(c));
    let p_text = cursor.read_optional_text()?;
    Ok((cursor.position(), params, p_text))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(u32),
    Text(String),
    /// An optional parameter with no default.
    Unset,
}

/// Parameter values, one per declared slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Params(Vec<Value>);

impl Params {
    pub fn int(&self, slot: usize) -> u32 {
        self.opt(slot).unwrap_or_default()
    }

    pub fn opt(&self, slot: usize) -> Option<u32> {
        match self.0.get(slot) {
            Some(Value::Int(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn text(&self, slot: usize) -> &str {
        match self.0.get(slot) {
            Some(Value::Text(text)) => text,
            _ => "",
        }
    }
}

/// The parameters a macro accepts.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec<'a> {
    /// One name per slot.
    pub names: &'a [&'a str],
    /// Defaults of the trailing optional slots.
    pub defaults: &'a [Option<u32>],
    /// Slots kept as text rather than evaluated as integers.
    pub text: &'a [usize],
    /// Whether `name=value` is accepted.
    pub named: bool,
}

impl<'a> ParamSpec<'a> {
    pub const fn positional(names: &'a [&'a str], defaults: &'a [Option<u32>]) -> Self {
        Self {
            names,
            defaults,
            text: &[],
            named: false,
        }
    }

    pub const fn named(names: &'a [&'a str], defaults: &'a [Option<u32>]) -> Self {
        Self {
            names,
            defaults,
            text: &[],
            named: true,
        }
    }

    pub const fn with_text(self, text: &'a [usize]) -> Self {
        Self { text, ..self }
    }

    fn required(&self) -> usize {
        self.names.len().saturating_sub(self.defaults.len())
    }
}

const CROP: ParamSpec<'static> = ParamSpec::named(
    &["x", "y", "width", "height"],
    &[Some(0), Some(0), None, None],
);

/// Evaluate a comma-separated parameter string against `spec`. Empty values
/// take their defaults.
#[tracing::instrument]
pub fn get_params(params: &str, spec: &ParamSpec) -> Result<Params, MacroError> {
    let num = spec.names.len();
    let mut values: Vec<Option<Value>> = vec![None; num];
    if !params.is_empty() {
        let mut positional = 0;
        for token in params.split(',') {
            let (slot, raw) = match token.split_once('=') {
                Some((name, raw)) if spec.named => {
                    let slot = spec
                        .names
                        .iter()
                        .position(|n| *n == name)
                        .ok_or_else(|| {
                            MacroError::Parsing(format!("Unknown keyword argument: '{}'", name))
                        })?;
                    (slot, raw)
                }
                _ => {
                    positional += 1;
                    (positional - 1, token)
                }
            };
            if slot >= num {
                return Err(MacroError::Parsing(format!(
                    "Too many parameters (expected {}): '{}'",
                    num, params
                )));
            }
            if raw.is_empty() {
                continue;
            }
            let value = if spec.text.contains(&slot) {
                Value::Text(raw.to_owned())
            } else {
                parse_int(raw).map(Value::Int).ok_or_else(|| {
                    MacroError::Parsing(format!(
                        "Cannot parse integer '{}' in parameter string: '{}'",
                        raw, params
                    ))
                })?
            };
            values[slot] = Some(value);
        }
    }

    let required = spec.required();
    values
        .into_iter()
        .enumerate()
        .map(|(slot, value)| match value {
            Some(value) => Ok(value),
            None if slot >= required => Ok(spec.defaults[slot - required].map_or(Value::Unset, Value::Int)),
            None if spec.named => Err(MacroError::Parsing(format!(
                "Missing required argument '{}': '{}'",
                spec.names[slot], params
            ))),
            None => Err(MacroError::Parsing(format!(
                "Not enough parameters (expected {}): '{}'",
                required, params
            ))),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Params)
}

/// Parse integer parameters starting at `index`, with no bracketed string.
pub fn parse_ints(text: &str, index: usize, spec: &ParamSpec) -> Result<(usize, Params), MacroError> {
    let valid = if spec.named {
        format!("{}{}", IMAGE_CHARS, NAME_CHARS)
    } else {
        IMAGE_CHARS.to_owned()
    };
    let mut cursor = Cursor::new(text, index);
    let params = cursor.read_while(|c| valid.contains(c));
    Ok((cursor.position(), get_params(params, spec)?))
}

/// An image macro's parameters with its crop rectangle and file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageParams {
    pub end: usize,
    pub params: Params,
    pub crop: CropRect,
    pub fname: Option<String>,
}

/// Parse `params[{x,y,width,height}][(fname)]`. `chars` extends the set of
/// characters allowed in `params`.
#[tracing::instrument]
pub fn parse_image_params(
    text: &str,
    index: usize,
    spec: &ParamSpec,
    chars: &str,
) -> Result<ImageParams, MacroError> {
    let mut valid = format!("{}{}", IMAGE_CHARS, chars);
    if spec.named {
        valid.push_str(NAME_CHARS);
    }
    let (mut end, param_string, mut fname) = parse_params(text, index, Chars::Only(&valid))?;
    let params = get_params(param_string, spec)?;

    let mut crop = CropRect::default();
    if fname.is_none() && text[end..].starts_with('{') {
        let (crop_end, crop_params) = parse_ints(text, end + 1, &CROP)?;
        let mut cursor = Cursor::new(text, crop_end);
        if !cursor.accept('}') {
            return Err(MacroError::Parsing(format!(
                "No closing brace on cropping specification: {}",
                &text[end..crop_end]
            )));
        }
        crop = CropRect::new(
            crop_params.int(0),
            crop_params.int(1),
            crop_params.opt(2).filter(|w| *w > 0),
            crop_params.opt(3).filter(|h| *h > 0),
        );
        fname = cursor.read_optional_text()?;
        end = cursor.position();
    }

    Ok(ImageParams {
        end,
        params,
        crop,
        fname,
    })
}

/// Expand an address range specification into tile addresses.
///
/// The specification is `addr`, or `A-B[-H[-V]]`, optionally followed by
/// `xN`. Addresses run from `A` to `B` in rows of `width`, `H` apart within a
/// row (default 1) and `V` apart from one row to the next (default
/// `H * width`). The whole list is repeated `N` times.
pub fn udg_addresses(spec: &str, width: u32) -> Result<Vec<u32>, MacroError> {
    let invalid = || MacroError::Parsing(format!("Invalid address range specification: {}", spec));
    let (range, num) = match spec.split_once('x') {
        Some((range, num)) => (range, parse_int(num).ok_or_else(invalid)? as usize),
        None => (spec, 1),
    };
    let mut elements = range
        .splitn(4, '-')
        .map(|n| parse_int(n).map(i64::from))
        .collect::<Option<Vec<i64>>>()
        .ok_or_else(invalid)?;
    let width = i64::from(width.max(1));
    if elements.len() < 2 {
        elements.push(elements[0]);
    }
    if elements.len() < 3 {
        elements.push(1);
    }
    if elements.len() < 4 {
        elements.push(elements[2].checked_mul(width).ok_or_else(invalid)?);
    }
    let (mut address, end, h_step, v_step) = (elements[0], elements[1], elements[2], elements[3]);
    let row_step = (width - 1)
        .checked_mul(h_step)
        .and_then(|n| v_step.checked_sub(n))
        .ok_or_else(invalid)?;

    let mut addresses = vec![];
    while address <= end {
        if addresses.len() >= MAX_TILES {
            return Err(MacroError::Parsing(format!("Address range too long: {}", spec)));
        }
        addresses.push(address.rem_euclid(65536) as u32);
        let step = if addresses.len() as i64 % width != 0 {
            h_step
        } else {
            row_step
        };
        address = address.checked_add(step).ok_or_else(invalid)?;
    }
    if addresses.len().saturating_mul(num) > MAX_TILES {
        return Err(MacroError::Parsing(format!("Address range too long: {}", spec)));
    }
    Ok(addresses.repeat(num))
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    const UDG: ParamSpec<'static> = ParamSpec::named(
        &["addr", "attr", "scale", "step", "inc", "flip", "rotate", "mask"],
        &[Some(56), Some(4), Some(1), Some(0), Some(0), Some(0), Some(1)],
    );

    #[test]
    fn test_parse_int() {
        let tests = vec![
            ("0", Some(0)),
            ("32768", Some(32768)),
            ("$8000", Some(32768)),
            ("$ff", Some(255)),
            ("$", None),
            ("12a", None),
            ("", None),
        ];
        for (input, expected) in tests {
            assert_eq!(parse_int(input), expected);
        }
    }

    #[test]
    fn test_read_text() {
        let tests = vec![
            ("(abc)", "abc", 5),
            ("(a(b)c) rest", "a(b)c", 7),
            ("()", "", 2),
        ];
        for (input, expected, end) in tests {
            let mut cursor = Cursor::new(input, 0);
            assert_eq!(cursor.read_text().unwrap(), expected);
            assert_eq!(cursor.position(), end);
        }
        let mut cursor = Cursor::new("(abc", 0);
        assert_eq!(
            cursor.read_text().unwrap_err().to_string(),
            "No closing bracket: (abc"
        );
    }

    #[test]
    fn test_read_address() {
        let mut cursor = Cursor::new("$8000(x)", 0);
        assert_eq!(cursor.read_address().unwrap(), ("$8000".to_owned(), 32768));
        assert_eq!(cursor.position(), 5);
        assert!(Cursor::new("65536", 0).read_address().is_err());
        assert!(Cursor::new("x", 0).read_address().is_err());
    }

    #[test]
    fn test_get_params_positional() {
        let spec = ParamSpec::positional(&["a", "b", "c"], &[Some(2), Some(3)]);
        let tests = vec![
            ("1", vec![1, 2, 3]),
            ("1,5", vec![1, 5, 3]),
            ("$10,,7", vec![16, 2, 7]),
        ];
        for (input, expected) in tests {
            let params = get_params(input, &spec).unwrap();
            assert_eq!((0..3).map(|i| params.int(i)).collect::<Vec<_>>(), expected);
        }
        let errors = vec![
            ("", "Not enough parameters (expected 1): ''"),
            ("1,2,3,4", "Too many parameters (expected 3): '1,2,3,4'"),
            ("1,x", "Cannot parse integer 'x' in parameter string: '1,x'"),
        ];
        for (input, expected) in errors {
            assert_eq!(get_params(input, &spec).unwrap_err().to_string(), expected);
        }
    }

    #[test]
    fn test_get_params_named() {
        let params = get_params("39144,scale=2,mask=2", &UDG).unwrap();
        assert_eq!(params.int(0), 39144);
        assert_eq!(params.int(1), 56);
        assert_eq!(params.int(2), 2);
        assert_eq!(params.int(7), 2);
        assert_eq!(
            get_params("39144,size=2", &UDG).unwrap_err().to_string(),
            "Unknown keyword argument: 'size'"
        );
        assert_eq!(
            get_params("attr=5", &UDG).unwrap_err().to_string(),
            "Missing required argument 'addr': 'attr=5'"
        );
    }

    #[test]
    fn test_text_slots() {
        let spec = ParamSpec::positional(&["addr", "attr"], &[Some(56)]).with_text(&[0]);
        let params = get_params("32768-32770-1x2,7", &spec).unwrap();
        assert_eq!(params.text(0), "32768-32770-1x2");
        assert_eq!(params.int(1), 7);
    }

    #[test]
    fn test_parse_image_params() {
        let text = "#UDG39144,scale=2{1,2,width=3}(sprite) trailing";
        let parsed = parse_image_params(text, 4, &UDG, "").unwrap();
        assert_eq!(&text[parsed.end..], " trailing");
        assert_eq!(parsed.params.int(2), 2);
        assert_eq!(parsed.crop, CropRect::new(1, 2, Some(3), None));
        assert_eq!(parsed.fname.as_deref(), Some("sprite"));

        let parsed = parse_image_params("#UDG39144(a*b)", 4, &UDG, "").unwrap();
        assert_eq!(parsed.end, 14);
        assert_eq!(parsed.crop, CropRect::default());
        assert_eq!(parsed.fname.as_deref(), Some("a*b"));

        let parsed = parse_image_params("#UDG39144{0,0,0,0}.", 4, &UDG, "").unwrap();
        assert_eq!(parsed.end, 18);
        assert_eq!(parsed.crop, CropRect::default());
        assert_eq!(parsed.fname, None);

        assert!(parse_image_params("#UDG39144{1,2", 4, &UDG, "").is_err());
    }

    #[test]
    fn test_udg_addresses() {
        let tests = vec![
            ("30000-30002", 1, vec![30000, 30001, 30002]),
            ("30000-30003-2", 2, vec![30000, 30002]),
            ("30000-30009-1-8", 2, vec![30000, 30001, 30008, 30009]),
            ("100x3", 1, vec![100, 100, 100]),
            ("100", 4, vec![100]),
            ("$8000-$8010-8", 1, vec![0x8000, 0x8008, 0x8010]),
            ("40000-40001-1-16x2", 2, vec![40000, 40001, 40000, 40001]),
            ("5-1", 1, vec![]),
        ];
        for (spec, width, expected) in tests {
            assert_eq!(udg_addresses(spec, width).unwrap(), expected);
        }
        for spec in ["1-2-3-4-5", "abc", "100x", "-3"] {
            assert_eq!(
                udg_addresses(spec, 1).unwrap_err().to_string(),
                format!("Invalid address range specification: {}", spec)
            );
        }
        assert!(udg_addresses("0-10-0", 1).is_err());

        let tests = vec![
            ("0-1-4294967295", 4294967295),
            ("0-1-4294967295-0", 4294967295),
            ("0-4294967295-4294967295-1", 4294967295),
        ];
        for (spec, width) in tests {
            assert_eq!(
                udg_addresses(spec, width).unwrap_err().to_string(),
                format!("Invalid address range specification: {}", spec)
            );
        }
    }
}
