#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    io::{self, Write},
    rc::Rc,
};

use tiledoc::{
    config::Config,
    disassembly::Disassembly,
    graphics::Frame,
    images::{FileStore, ImageError, ImageFormat, ImageWriter},
    macros::{ExpandError, MacroExpander},
};

/// What an image writer was asked to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Written {
    pub format: ImageFormat,
    pub frames: usize,
    pub delays: Vec<u32>,
}

/// Image writer that only records its calls.
#[derive(Default, Clone)]
pub struct RecordingWriter {
    pub calls: Rc<RefCell<Vec<Written>>>,
}

impl ImageWriter for RecordingWriter {
    fn write_image(
        &mut self,
        frames: &[Frame],
        _out: &mut dyn Write,
        format: ImageFormat,
    ) -> Result<(), ImageError> {
        self.calls.borrow_mut().push(Written {
            format,
            frames: frames.len(),
            delays: frames.iter().map(Frame::delay).collect(),
        });
        Ok(())
    }
}

/// Image writer that keeps a copy of every frame it is given.
#[derive(Default, Clone)]
pub struct CapturingWriter {
    pub frames: Rc<RefCell<Vec<Frame>>>,
}

impl ImageWriter for CapturingWriter {
    fn write_image(
        &mut self,
        frames: &[Frame],
        _out: &mut dyn Write,
        _format: ImageFormat,
    ) -> Result<(), ImageError> {
        self.frames.borrow_mut().extend_from_slice(frames);
        Ok(())
    }
}

/// Expand `text` and return the frames written along the way.
pub fn capture_frames(disassembly: &dyn Disassembly, text: &str) -> Vec<Frame> {
    let config = Config::default();
    let writer = CapturingWriter::default();
    let mut expander = MacroExpander::new(
        &config,
        disassembly,
        Box::new(MemoryStore::default()),
        Box::new(writer.clone()),
    );
    expander.expand(text, "").unwrap();
    let frames = writer.frames.borrow().clone();
    frames
}

/// Growable buffer that stays readable after the store is boxed.
#[derive(Default, Clone)]
pub struct SharedBuf(pub Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// File store held in memory.
#[derive(Default, Clone)]
pub struct MemoryStore {
    pub existing: HashSet<String>,
    pub replace: bool,
    pub files: Rc<RefCell<HashMap<String, SharedBuf>>>,
}

impl MemoryStore {
    pub fn with_existing(paths: &[&str]) -> Self {
        Self {
            existing: paths.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn opened(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files.borrow().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn contents(&self, path: &str) -> Vec<u8> {
        self.files
            .borrow()
            .get(path)
            .map(|buf| buf.0.borrow().clone())
            .unwrap_or_default()
    }
}

impl FileStore for MemoryStore {
    fn file_exists(&self, path: &str) -> bool {
        self.existing.contains(path)
    }

    fn replace_images(&self) -> bool {
        self.replace
    }

    fn open_file(&mut self, path: &str) -> io::Result<Box<dyn Write + '_>> {
        let buf = SharedBuf::default();
        self.files.borrow_mut().insert(path.to_owned(), buf.clone());
        Ok(Box::new(buf))
    }
}

/// Expand `text` with a fresh expander over `disassembly`.
pub fn expand(
    config: &Config,
    disassembly: &dyn Disassembly,
    text: &str,
    cwd: &str,
) -> Result<String, ExpandError> {
    let mut expander = MacroExpander::new(
        config,
        disassembly,
        Box::new(MemoryStore::default()),
        Box::new(RecordingWriter::default()),
    );
    expander.expand(text, cwd)
}
