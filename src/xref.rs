use thiserror::Error;

use crate::{
    config::{Config, Item, P_BUGS, P_FACTS, P_POKES},
    disassembly::Disassembly,
    images::{self, ImageFormat},
    markup,
};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum XrefError {
    #[error("Unknown page ID: {0}")]
    UnknownPage(String),
    #[error("Unknown path ID '{id}' for image file '{fname}'")]
    UnknownPathId { id: String, fname: String },
    #[error("Could not find code path for '{0}' disassembly")]
    UnknownCode(String),
    #[error("Could not find routine file containing {0}")]
    NoContainer(String),
    #[error("Cannot determine title of item '{0}'")]
    UnknownItem(String),
    #[error("Cannot determine description for nonexistent entry at {0}")]
    NoEntry(String),
    #[error("Entry at {0} has no description")]
    NoDescription(String),
    #[error("Entry point at {0} has no referrers")]
    NoReferrers(String),
}

/// The pages that hold named items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Bug,
    Fact,
    Poke,
}

impl ItemKind {
    pub fn page_id(self) -> &'static str {
        match self {
            ItemKind::Bug => P_BUGS,
            ItemKind::Fact => P_FACTS,
            ItemKind::Poke => P_POKES,
        }
    }

    fn items(self, config: &Config) -> &[Item] {
        match self {
            ItemKind::Bug => &config.bugs,
            ItemKind::Fact => &config.facts,
            ItemKind::Poke => &config.pokes,
        }
    }
}

/// Resolves page IDs, items, addresses and image names to paths relative to
/// the directory of the page being written.
pub struct Resolver<'a> {
    config: &'a Config,
    disassembly: &'a dyn Disassembly,
}

impl<'a> Resolver<'a> {
    pub fn new(config: &'a Config, disassembly: &'a dyn Disassembly) -> Self {
        Self {
            config,
            disassembly,
        }
    }

    fn page_href(&self, cwd: &str, page_id: &str) -> Result<String, XrefError> {
        self.config
            .path(page_id)
            .map(|path| images::relpath(cwd, path))
            .ok_or_else(|| XrefError::UnknownPage(page_id.to_owned()))
    }

    /// Link to a page, with `anchor` (including its `#`) appended. An empty
    /// `link_text` is replaced by the page's link text.
    #[tracing::instrument(skip(self))]
    pub fn page_link(
        &self,
        cwd: &str,
        page_id: &str,
        anchor: &str,
        link_text: &str,
    ) -> Result<String, XrefError> {
        let href = self.page_href(cwd, page_id)? + anchor;
        let text = match link_text {
            "" => self.config.link_text(page_id),
            text => text.to_owned(),
        };
        Ok(markup::link(&href, &text))
    }

    /// Link to an item on the bugs, trivia or pokes page, or to the page
    /// itself if `item` is empty.
    #[tracing::instrument(skip(self))]
    pub fn item_link(
        &self,
        cwd: &str,
        kind: ItemKind,
        item: &str,
        link_text: &str,
    ) -> Result<String, XrefError> {
        let text = match (item, link_text) {
            ("", "") => self.config.link_text(kind.page_id()),
            (item, "") => kind
                .items(self.config)
                .iter()
                .find(|i| i.anchor == item)
                .map(|i| i.title.clone())
                .ok_or_else(|| XrefError::UnknownItem(item.to_owned()))?,
            (_, text) => text.to_owned(),
        };
        let mut href = self.page_href(cwd, kind.page_id())?;
        if !item.is_empty() {
            href.push('#');
            href.push_str(item);
        }
        Ok(markup::link(&href, &text))
    }

    /// Link to the instruction at `address`, in this disassembly or in the
    /// one identified by `code_id`.
    #[tracing::instrument(skip(self))]
    pub fn address_link(
        &self,
        cwd: &str,
        addr_str: &str,
        address: u16,
        code_id: Option<&str>,
        anchor: &str,
        link_text: &str,
    ) -> Result<String, XrefError> {
        let code_path = match code_id {
            Some(id) => self
                .config
                .code_path(Some(id))
                .ok_or_else(|| XrefError::UnknownCode(id.to_owned()))?,
            None => self.config.code_path(None).unwrap_or_default(),
        };
        let container = self.disassembly.container(address, code_id);
        if code_id.is_none() && container.is_none() {
            return Err(XrefError::NoContainer(addr_str.to_owned()));
        }
        let container_address = container.map_or(address, |entry| entry.address);
        let anchor = if address == container_address {
            anchor.to_owned()
        } else {
            format!("#{}", address)
        };
        let href = images::relpath(cwd, &images::asm_fname(container_address, code_path)) + &anchor;

        let label = match self.config.asm_labels {
            true => self.disassembly.asm_label(address),
            false => None,
        };
        let text = match link_text {
            "" => label
                .or_else(|| self.disassembly.instruction_addr_str(address, code_id))
                .unwrap_or(addr_str),
            text => text,
        };
        Ok(markup::link(&href, text))
    }

    /// Full path of an image file relative to the root of the output tree,
    /// or `None` if `fname` is blank.
    ///
    /// A name starting with `/` is used as is (minus the `/`); anything else
    /// goes in the directory of `path_id`. The default image format's suffix
    /// is added unless the name already ends in `.png` or `.gif`.
    pub fn image_path(&self, fname: &str, path_id: &str) -> Result<Option<String>, XrefError> {
        if fname.is_empty() {
            return Ok(None);
        }
        let suffix = if ImageFormat::has_suffix(fname) {
            String::new()
        } else {
            format!(".{}", self.config.default_image_format)
        };
        if let Some(rooted) = fname.strip_prefix('/') {
            return Ok(Some(format!("{}{}", rooted, suffix)));
        }
        match self.config.path(path_id) {
            Some(dir) => Ok(Some(images::join(&[dir, &format!("{}{}", fname, suffix)]))),
            None => Err(XrefError::UnknownPathId {
                id: path_id.to_owned(),
                fname: fname.to_owned(),
            }),
        }
    }

    /// `<img>` element for an image; the alt text is the file's base name
    /// without its suffix.
    pub fn img_element(&self, cwd: &str, image_path: &str) -> String {
        let basename = image_path.rsplit('/').next().unwrap_or(image_path);
        let alt = basename
            .get(..basename.len().saturating_sub(4))
            .unwrap_or(basename);
        markup::img(alt, &images::relpath(cwd, image_path))
    }

    /// First paragraph of the description of the entry at `address`.
    pub fn description(&self, addr_str: &str, address: u16) -> Result<String, XrefError> {
        let entry = self
            .disassembly
            .entry(address)
            .ok_or_else(|| XrefError::NoEntry(addr_str.to_owned()))?;
        entry
            .description
            .first()
            .cloned()
            .ok_or_else(|| XrefError::NoDescription(addr_str.to_owned()))
    }

    pub fn entry_point_refs(&self, addr_str: &str, address: u16) -> Result<Vec<u16>, XrefError> {
        let mut refs = self.disassembly.entry_point_refs(address);
        if refs.is_empty() {
            return Err(XrefError::NoReferrers(addr_str.to_owned()));
        }
        refs.sort_unstable();
        Ok(refs)
    }

    pub fn referrers(&self, addr_str: &str, address: u16) -> Result<Vec<u16>, XrefError> {
        if self.disassembly.entry(address).is_none() {
            return Err(XrefError::NoEntry(addr_str.to_owned()));
        }
        let mut refs = self.disassembly.referrers(address);
        refs.sort_unstable();
        Ok(refs)
    }
}
