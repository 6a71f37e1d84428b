use std::{
    fs,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use thiserror::Error;

use crate::graphics::Frame;

/// Rasterises frames into PNG and GIF files with the `image` crate.
pub mod encoder;

pub use encoder::RasterEncoder;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Unsupported image file format: {0}")]
    UnsupportedFormat(String),
    #[error("Cannot write an empty image: {0}")]
    Empty(String),
    #[error("Unable to write image file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Image encoding failed: {0}")]
    Encode(#[from] ::image::ImageError),
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::EnumString, strum_macros::Display,
)]
#[strum(serialize_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Gif,
}

impl ImageFormat {
    /// Work out the format of an image file from its `.png` or `.gif` suffix.
    pub fn from_path(image_path: &str) -> Result<Self, ImageError> {
        let lower = image_path.to_lowercase();
        if lower.ends_with(".png") {
            Ok(ImageFormat::Png)
        } else if lower.ends_with(".gif") {
            Ok(ImageFormat::Gif)
        } else {
            Err(ImageError::UnsupportedFormat(image_path.to_owned()))
        }
    }

    pub fn has_suffix(fname: &str) -> bool {
        Self::from_path(fname).is_ok()
    }
}

/// Writes frames to an output stream in a given container format.
pub trait ImageWriter {
    fn write_image(
        &mut self,
        frames: &[Frame],
        out: &mut dyn Write,
        format: ImageFormat,
    ) -> Result<(), ImageError>;
}

/// Where generated files go, and whether an image needs (re)writing.
pub trait FileStore {
    fn file_exists(&self, path: &str) -> bool;

    fn replace_images(&self) -> bool;

    /// An image is needed if it doesn't exist yet or all images are being
    /// rebuilt.
    fn need_image(&self, image_path: &str) -> bool {
        self.replace_images() || !self.file_exists(image_path)
    }

    fn open_file(&mut self, path: &str) -> io::Result<Box<dyn Write + '_>>;
}

/// File store rooted at an output directory on disk.
#[derive(Debug)]
pub struct FileInfo {
    odir: PathBuf,
    replace_images: bool,
}

impl FileInfo {
    pub fn new(odir: impl Into<PathBuf>, replace_images: bool) -> Self {
        Self {
            odir: odir.into(),
            replace_images,
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        let mut full = self.odir.clone();
        full.extend(path.split('/').filter(|c| !c.is_empty()));
        full
    }
}

impl FileStore for FileInfo {
    fn file_exists(&self, path: &str) -> bool {
        self.full_path(path).is_file()
    }

    fn replace_images(&self) -> bool {
        self.replace_images
    }

    #[tracing::instrument(skip(self))]
    fn open_file(&mut self, path: &str) -> io::Result<Box<dyn Write + '_>> {
        let full = self.full_path(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Box::new(BufWriter::new(fs::File::create(full)?)))
    }
}

/// Join virtual path components with `/`, skipping empty ones.
pub fn join(components: &[&str]) -> String {
    components
        .iter()
        .filter(|c| !c.replace('/', "").is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/")
}

fn components(path: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = vec![];
    for part in path.split('/') {
        match part {
            "" | "." => (),
            ".." if parts.last().is_some_and(|p| *p != "..") => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }
    parts
}

/// Normalise a virtual path, collapsing `.` and `..` components.
pub fn normpath(path: &str) -> String {
    let parts = components(path);
    if parts.is_empty() {
        ".".to_owned()
    } else {
        parts.join("/")
    }
}

/// Path of `target` relative to directory `cwd`; both are relative to the
/// root of the output tree.
pub fn relpath(cwd: &str, target: &str) -> String {
    let from = components(cwd);
    let to = components(target);
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let parts: Vec<&str> = std::iter::repeat("..")
        .take(from.len() - common)
        .chain(to[common..].iter().copied())
        .collect();
    if parts.is_empty() {
        ".".to_owned()
    } else {
        parts.join("/")
    }
}

/// File name of the page for the entry at `address`.
pub fn asm_fname(address: u16, path: &str) -> String {
    normpath(&join(&[path, &format!("{}.html", address)]))
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn test_relpath() {
        let tests = vec![
            ("", "reference/bugs.html", "reference/bugs.html"),
            ("asm", "asm/32768.html", "32768.html"),
            ("asm", "images/udgs/udg.png", "../images/udgs/udg.png"),
            ("maps/deep", "index.html", "../../index.html"),
            ("reference", "reference", "."),
            ("./asm/", "asm/../index.html", "../index.html"),
        ];
        for (cwd, target, expected) in tests {
            assert_eq!(relpath(cwd, target), expected);
        }
    }

    #[test]
    fn test_join_and_asm_fname() {
        assert_eq!(join(&["images/udgs", "udg.png"]), "images/udgs/udg.png");
        assert_eq!(join(&["", "udg.png"]), "udg.png");
        assert_eq!(join(&["/", "a", "b"]), "a/b");
        assert_eq!(asm_fname(32768, "asm"), "asm/32768.html");
        assert_eq!(asm_fname(24576, "./other/"), "other/24576.html");
    }

    #[test]
    fn test_image_format() {
        assert_eq!(ImageFormat::from_path("a/b.png").unwrap(), ImageFormat::Png);
        assert_eq!(ImageFormat::from_path("a/b.GIF").unwrap(), ImageFormat::Gif);
        assert!(matches!(
            ImageFormat::from_path("a/b.jpg"),
            Err(ImageError::UnsupportedFormat(path)) if path == "a/b.jpg"
        ));
        assert_eq!("gif".parse::<ImageFormat>().unwrap(), ImageFormat::Gif);
        assert_eq!(ImageFormat::Png.to_string(), "png");
    }

    struct Existing(bool, bool);

    impl FileStore for Existing {
        fn file_exists(&self, _path: &str) -> bool {
            self.0
        }

        fn replace_images(&self) -> bool {
            self.1
        }

        fn open_file(&mut self, _path: &str) -> io::Result<Box<dyn Write + '_>> {
            Ok(Box::new(io::sink()))
        }
    }

    #[test]
    fn test_need_image() {
        assert!(Existing(false, false).need_image("x.png"));
        assert!(!Existing(true, false).need_image("x.png"));
        assert!(Existing(true, true).need_image("x.png"));
    }
}
