use std::{collections::HashMap, io::Write};

use thiserror::Error;

use crate::{
    config::Config,
    disassembly::Disassembly,
    graphics::{Frame, FrameCache, FrameError},
    images::{FileStore, ImageError, ImageFormat, ImageWriter},
    snapshot::{Snapshot, SnapshotError, SnapshotStack},
    xref::{Resolver, XrefError},
};

/// Parameter strings, crop rectangles and address ranges.
pub mod params;

/// `#FONT`, `#SCR`, `#UDG` and `#UDGARRAY`.
mod graphic;
/// `#BUG`, `#D`, `#EREFS`, `#FACT`, `#LINK`, `#POKE`, `#R` and `#REFS`.
mod links;
/// `#POKES`, `#POPS` and `#PUSHS`.
mod memory;
/// `#LIST`, `#TABLE` and `#UDGTABLE`.
mod tables;
/// `#CALL`, `#CHR`, `#HTML`, `#REG` and `#SPACE`.
mod text;

/// Every macro the expander knows about.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::EnumString,
    strum_macros::Display,
    strum_macros::EnumIter,
)]
pub enum Macro {
    BUG,
    CALL,
    CHR,
    D,
    EREFS,
    FACT,
    FONT,
    HTML,
    LINK,
    LIST,
    POKE,
    POKES,
    POPS,
    PUSHS,
    R,
    REFS,
    REG,
    SCR,
    SPACE,
    TABLE,
    UDG,
    UDGARRAY,
    UDGTABLE,
}

impl Macro {
    /// Whether the macro produces an image file.
    pub fn is_image(self) -> bool {
        matches!(self, Macro::FONT | Macro::SCR | Macro::UDG | Macro::UDGARRAY)
    }
}

/// Error raised by a single macro.
#[derive(Error, Debug)]
pub enum MacroError {
    #[error("{0}")]
    Parsing(String),
    #[error("Macro not supported here")]
    Unsupported,
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Xref(#[from] XrefError),
}

/// Error that aborts the expansion of a piece of text.
#[derive(Error, Debug)]
pub enum ExpandError {
    #[error("Found unknown macro: {0}")]
    UnknownMacro(String),
    #[error("Found unsupported macro: {0}")]
    UnsupportedMacro(String),
    #[error("Error while parsing {name} macro: {source} (at '{span}')")]
    Parse {
        name: String,
        span: String,
        source: MacroError,
    },
}

/// State shared by the macros over a rendering pass.
#[derive(Debug)]
pub struct RenderContext {
    pub snapshots: SnapshotStack,
    pub frames: FrameCache,
}

impl RenderContext {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshots: SnapshotStack::new(snapshot),
            frames: FrameCache::default(),
        }
    }
}

/// A function that `#CALL` can invoke. It's given the current directory and
/// the arguments.
pub type Callback<'a> = Box<dyn Fn(&str, &[String]) -> String + 'a>;

/// Expands the macros in a piece of text.
pub struct MacroExpander<'a> {
    config: &'a Config,
    disassembly: &'a dyn Disassembly,
    file_store: Box<dyn FileStore + 'a>,
    image_writer: Box<dyn ImageWriter + 'a>,
    context: RenderContext,
    callbacks: HashMap<String, Callback<'a>>,
}

/// Find the first `#` followed by one or more upper case letters, returning
/// the start of the `#` and the end of the name.
fn find_macro(text: &str) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut from = 0;
    while let Some(offset) = text[from..].find('#') {
        let start = from + offset;
        let len = bytes[start + 1..]
            .iter()
            .take_while(|b| b.is_ascii_uppercase())
            .count();
        if len > 0 {
            return Some((start, start + 1 + len));
        }
        from = start + 1;
    }
    None
}

/// The text from a macro's `#` up to the next whitespace.
fn span(text: &str, start: usize) -> &str {
    let rest = &text[start..];
    rest.find(char::is_whitespace).map_or(rest, |end| &rest[..end])
}

impl<'a> MacroExpander<'a> {
    pub fn new(
        config: &'a Config,
        disassembly: &'a dyn Disassembly,
        file_store: Box<dyn FileStore + 'a>,
        image_writer: Box<dyn ImageWriter + 'a>,
    ) -> Self {
        Self {
            config,
            disassembly,
            file_store,
            image_writer,
            context: RenderContext::new(disassembly.snapshot().clone()),
            callbacks: HashMap::new(),
        }
    }

    /// Make `callback` available to `#CALL:name(...)`.
    pub fn register_call(&mut self, name: &str, callback: impl Fn(&str, &[String]) -> String + 'a) {
        self.callbacks.insert(name.to_owned(), Box::new(callback));
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    /// The current memory snapshot.
    pub fn snapshot(&self) -> &Snapshot {
        self.context.snapshots.current()
    }

    fn resolver(&self) -> Resolver<'a> {
        Resolver::new(self.config, self.disassembly)
    }

    /// Expand every macro in `text`, where `cwd` is the directory of the page
    /// being written, relative to the root of the output tree.
    ///
    /// After each expansion the search starts again from the beginning of the
    /// text, so macros in a macro's output are expanded too. A macro whose
    /// output contains itself never terminates.
    #[tracing::instrument(skip(self, text))]
    pub fn expand(&mut self, text: &str, cwd: &str) -> Result<String, ExpandError> {
        let mut text = text.to_owned();
        if !text.contains('#') {
            return Ok(text);
        }

        while let Some((start, index)) = find_macro(&text) {
            let marker = text[start..index].to_owned();
            let name: Macro = marker[1..]
                .parse()
                .map_err(|_| ExpandError::UnknownMacro(marker.clone()))?;
            tracing::debug!(%marker, start, "expanding macro");
            let (end, rep) = match self.dispatch(name, &text, index, cwd) {
                Ok(expansion) => expansion,
                Err(MacroError::Unsupported) => return Err(ExpandError::UnsupportedMacro(marker)),
                Err(source) => {
                    return Err(ExpandError::Parse {
                        span: span(&text, start).to_owned(),
                        name: marker,
                        source,
                    })
                }
            };
            text.replace_range(start..end, &rep);
        }

        Ok(text)
    }

    /// Run the handler for `name`, whose arguments start at `index`. Returns
    /// the end of the arguments and the replacement text.
    fn dispatch(
        &mut self,
        name: Macro,
        text: &str,
        index: usize,
        cwd: &str,
    ) -> Result<(usize, String), MacroError> {
        if name.is_image() && !self.config.images {
            return Err(MacroError::Unsupported);
        }
        match name {
            Macro::BUG => self.expand_bug(text, index, cwd),
            Macro::CALL => self.expand_call(text, index, cwd),
            Macro::CHR => self.expand_chr(text, index),
            Macro::D => self.expand_d(text, index),
            Macro::EREFS => self.expand_erefs(text, index),
            Macro::FACT => self.expand_fact(text, index, cwd),
            Macro::FONT => self.expand_font(text, index, cwd),
            Macro::HTML => self.expand_html(text, index),
            Macro::LINK => self.expand_link(text, index, cwd),
            Macro::LIST => self.expand_list(text, index),
            Macro::POKE => self.expand_poke(text, index, cwd),
            Macro::POKES => self.expand_pokes(text, index),
            Macro::POPS => self.expand_pops(index),
            Macro::PUSHS => self.expand_pushs(text, index),
            Macro::R => self.expand_r(text, index, cwd),
            Macro::REFS => self.expand_refs(text, index),
            Macro::REG => self.expand_reg(text, index),
            Macro::SCR => self.expand_scr(text, index, cwd),
            Macro::SPACE => self.expand_space(text, index),
            Macro::TABLE | Macro::UDGTABLE => self.expand_table(text, index),
            Macro::UDG => self.expand_udg(text, index, cwd),
            Macro::UDGARRAY => self.expand_udgarray(text, index, cwd),
        }
    }

    fn need_image(&self, image_path: &str) -> bool {
        let need = self.file_store.need_image(image_path);
        if !need {
            tracing::debug!(image_path, "image exists, skipping");
        }
        need
    }

    /// Encode `frames` into the file at `image_path`, in the format its
    /// suffix names.
    fn write_image(&mut self, image_path: &str, frames: &[Frame]) -> Result<(), ImageError> {
        let format = ImageFormat::from_path(image_path)?;
        let io_error = |source| ImageError::Io {
            path: image_path.to_owned(),
            source,
        };
        let mut out = self.file_store.open_file(image_path).map_err(io_error)?;
        self.image_writer.write_image(frames, out.as_mut(), format)?;
        out.flush().map_err(io_error)?;
        tracing::info!(image_path, frames = frames.len(), "wrote image");
        Ok(())
    }
}
