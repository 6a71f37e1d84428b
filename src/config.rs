use std::collections::HashMap;

use lazy_static::lazy_static;
use thiserror::Error;

use crate::images::ImageFormat;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid path specification: '{0}'")]
    InvalidPath(String),
    #[error("Invalid address: '{0}'")]
    InvalidAddress(String),
}

pub const P_GAME_INDEX: &str = "GameIndex";
pub const P_BUGS: &str = "Bugs";
pub const P_FACTS: &str = "Facts";
pub const P_POKES: &str = "Pokes";

/// Path ID of the directory that holds the entry pages.
pub const CODE_PATH: &str = "CodePath";
/// Default path ID for `#UDG` and `#UDGARRAY` images.
pub const UDG_IMAGE_PATH: &str = "UDGImagePath";
pub const FONT_IMAGE_PATH: &str = "FontImagePath";
pub const SCREENSHOT_IMAGE_PATH: &str = "ScreenshotImagePath";

lazy_static! {
    /// Built-in path table: page and directory IDs to locations in the
    /// output tree.
    static ref DEFAULT_PATHS: Vec<(&'static str, &'static str)> = vec![
        (CODE_PATH, "asm"),
        (FONT_IMAGE_PATH, "images/font"),
        (SCREENSHOT_IMAGE_PATH, "images/scr"),
        (UDG_IMAGE_PATH, "images/udgs"),
        (P_BUGS, "reference/bugs.html"),
        ("Changelog", "reference/changelog.html"),
        ("DataMap", "maps/data.html"),
        (P_FACTS, "reference/facts.html"),
        (P_GAME_INDEX, "index.html"),
        ("GameStatusBuffer", "buffers/gbuffer.html"),
        ("Glossary", "reference/glossary.html"),
        ("GraphicGlitches", "graphics/glitches.html"),
        ("Graphics", "graphics/graphics.html"),
        ("MemoryMap", "maps/all.html"),
        ("MessagesMap", "maps/messages.html"),
        (P_POKES, "reference/pokes.html"),
        ("RoutinesMap", "maps/routines.html"),
        ("UnusedMap", "maps/unused.html"),
    ];

    static ref DEFAULT_TITLES: Vec<(&'static str, &'static str)> = vec![
        (P_BUGS, "Bugs"),
        ("Changelog", "Changelog"),
        ("DataMap", "Data"),
        (P_FACTS, "Trivia"),
        (P_GAME_INDEX, "Index"),
        ("GameStatusBuffer", "Game status buffer"),
        ("Glossary", "Glossary"),
        ("GraphicGlitches", "Graphic glitches"),
        ("Graphics", "Graphics"),
        ("MemoryMap", "Memory map"),
        ("MessagesMap", "Messages"),
        (P_POKES, "Pokes"),
        ("RoutinesMap", "Routines"),
        ("UnusedMap", "Unused addresses"),
    ];
}

/// A named entry on the bugs, trivia or pokes page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub anchor: String,
    pub title: String,
}

impl Item {
    pub fn new(anchor: &str, title: &str) -> Self {
        Self {
            anchor: anchor.to_owned(),
            title: title.to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Page and directory IDs to paths relative to the output root.
    pub paths: HashMap<String, String>,
    pub titles: HashMap<String, String>,
    /// Link text per page ID; falls back to the page title.
    pub links: HashMap<String, String>,
    pub bugs: Vec<Item>,
    pub facts: Vec<Item>,
    pub pokes: Vec<Item>,
    /// Code IDs of other disassemblies to the directories of their entry
    /// pages.
    pub other_code: HashMap<String, String>,
    pub default_image_format: ImageFormat,
    pub replace_images: bool,
    /// Render `#REG` register names in lower case.
    pub lower_case: bool,
    /// Use instruction labels as `#R` link text.
    pub asm_labels: bool,
    /// Whether the image macros are allowed at all.
    pub images: bool,
}

fn owned(table: &[(&str, &str)]) -> HashMap<String, String> {
    table
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: owned(&DEFAULT_PATHS),
            titles: owned(&DEFAULT_TITLES),
            links: HashMap::new(),
            bugs: vec![],
            facts: vec![],
            pokes: vec![],
            other_code: HashMap::new(),
            default_image_format: ImageFormat::default(),
            replace_images: false,
            lower_case: false,
            asm_labels: false,
            images: true,
        }
    }
}

impl Config {
    pub fn path(&self, id: &str) -> Option<&str> {
        self.paths.get(id).map(String::as_str)
    }

    /// Default link text for a page.
    pub fn link_text(&self, page_id: &str) -> String {
        self.links
            .get(page_id)
            .filter(|text| !text.is_empty())
            .or_else(|| self.titles.get(page_id))
            .cloned()
            .unwrap_or_else(|| page_id.to_owned())
    }

    /// Directory of the entry pages of the main disassembly (`None`) or of
    /// another one.
    pub fn code_path(&self, code_id: Option<&str>) -> Option<&str> {
        match code_id {
            None => self.path(CODE_PATH),
            Some(id) => self.other_code.get(id).map(String::as_str),
        }
    }

    /// Apply a `ID=PATH` override, as given on the command line.
    pub fn set_path(&mut self, spec: &str) -> Result<(), ConfigError> {
        match spec.split_once('=') {
            Some((id, path)) if !id.is_empty() => {
                self.paths.insert(id.to_owned(), path.to_owned());
                Ok(())
            }
            _ => Err(ConfigError::InvalidPath(spec.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.path(P_BUGS), Some("reference/bugs.html"));
        assert_eq!(config.path(UDG_IMAGE_PATH), Some("images/udgs"));
        assert_eq!(config.code_path(None), Some("asm"));
        assert_eq!(config.code_path(Some("rom")), None);
        assert_eq!(config.default_image_format, ImageFormat::Png);
        assert!(config.images);
    }

    #[test]
    fn test_link_text() {
        let mut config = Config::default();
        assert_eq!(config.link_text(P_FACTS), "Trivia");
        assert_eq!(config.link_text("Nowhere"), "Nowhere");
        config.links.insert(P_FACTS.to_owned(), "Facts".to_owned());
        assert_eq!(config.link_text(P_FACTS), "Facts");
        config.links.insert(P_BUGS.to_owned(), String::new());
        assert_eq!(config.link_text(P_BUGS), "Bugs");
    }

    #[test]
    fn test_set_path() {
        let mut config = Config::default();
        config.set_path("UDGImagePath=gfx").unwrap();
        assert_eq!(config.path(UDG_IMAGE_PATH), Some("gfx"));
        let tests = vec!["=gfx", "gfx"];
        for spec in tests {
            assert_eq!(
                config.set_path(spec),
                Err(ConfigError::InvalidPath(spec.to_owned()))
            );
        }
        assert_eq!(
            ConfigError::InvalidPath("gfx".to_owned()).to_string(),
            "Invalid path specification: 'gfx'"
        );
    }
}
