use super::{params::Cursor, MacroError, MacroExpander};
use crate::xref::ItemKind;

fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '-'
}

/// `routine at #R1` or `routines at #R1, #R2 and #R3`.
fn routines(addresses: &[u16]) -> String {
    let refs: Vec<String> = addresses.iter().map(|a| format!("#R{}", a)).collect();
    match refs.split_last() {
        Some((last, [])) => format!("routine at {}", last),
        Some((last, rest)) => format!("routines at {} and {}", rest.join(", "), last),
        None => String::new(),
    }
}

impl MacroExpander<'_> {
    // #BUG[#name][(link text)], and likewise #FACT and #POKE
    fn expand_item(
        &self,
        kind: ItemKind,
        text: &str,
        index: usize,
        cwd: &str,
    ) -> Result<(usize, String), MacroError> {
        let mut cursor = Cursor::new(text, index);
        let item = if cursor.accept('#') {
            cursor.read_while(is_name_char)
        } else {
            ""
        };
        let link_text = cursor.read_optional_text()?.unwrap_or_default();
        let link = self.resolver().item_link(cwd, kind, item, &link_text)?;
        Ok((cursor.position(), link))
    }

    pub(super) fn expand_bug(
        &self,
        text: &str,
        index: usize,
        cwd: &str,
    ) -> Result<(usize, String), MacroError> {
        self.expand_item(ItemKind::Bug, text, index, cwd)
    }

    pub(super) fn expand_fact(
        &self,
        text: &str,
        index: usize,
        cwd: &str,
    ) -> Result<(usize, String), MacroError> {
        self.expand_item(ItemKind::Fact, text, index, cwd)
    }

    pub(super) fn expand_poke(
        &self,
        text: &str,
        index: usize,
        cwd: &str,
    ) -> Result<(usize, String), MacroError> {
        self.expand_item(ItemKind::Poke, text, index, cwd)
    }

    // #LINK:PageId[#name](link text)
    pub(super) fn expand_link(
        &self,
        text: &str,
        index: usize,
        cwd: &str,
    ) -> Result<(usize, String), MacroError> {
        let mut cursor = Cursor::new(text, index);
        let page_id = if cursor.accept(':') {
            cursor.read_while(|c| !c.is_whitespace() && c != '(' && c != '#')
        } else {
            ""
        };
        if page_id.is_empty() {
            return Err(MacroError::Parsing(format!(
                "No page ID specified: #LINK{}",
                &text[index..cursor.position()]
            )));
        }
        let anchor_start = cursor.position();
        if cursor.accept('#') {
            cursor.read_while(is_name_char);
        }
        let anchor = &text[anchor_start..cursor.position()];
        let link_text = cursor.read_optional_text()?.ok_or_else(|| {
            MacroError::Parsing(format!(
                "No link text specified: #LINK{}",
                &text[index..cursor.position()]
            ))
        })?;
        let link = self.resolver().page_link(cwd, page_id, anchor, &link_text)?;
        Ok((cursor.position(), link))
    }

    // #Raddr[@code][#name][(link text)]
    pub(super) fn expand_r(
        &self,
        text: &str,
        index: usize,
        cwd: &str,
    ) -> Result<(usize, String), MacroError> {
        let mut cursor = Cursor::new(text, index);
        let (addr_str, address) = cursor.read_address()?;
        let code_id = if cursor.accept('@') {
            Some(cursor.read_while(is_name_char))
        } else {
            None
        };
        let anchor_start = cursor.position();
        if cursor.accept('#') {
            cursor.read_while(is_name_char);
        }
        let anchor = &text[anchor_start..cursor.position()];
        let link_text = cursor.read_optional_text()?.unwrap_or_default();
        let link = self
            .resolver()
            .address_link(cwd, &addr_str, address, code_id, anchor, &link_text)?;
        Ok((cursor.position(), link))
    }

    // #REFSaddr[(prefix)]
    pub(super) fn expand_refs(&self, text: &str, index: usize) -> Result<(usize, String), MacroError> {
        let mut cursor = Cursor::new(text, index);
        let (addr_str, address) = cursor.read_address()?;
        let prefix = cursor.read_optional_text()?.unwrap_or_default();
        let refs = self.resolver().referrers(&addr_str, address)?;
        let rep = if refs.is_empty() {
            "Not used directly by any other routines".to_owned()
        } else {
            format!("{} {}", prefix, routines(&refs)).trim_start().to_owned()
        };
        Ok((cursor.position(), rep))
    }

    // #EREFSaddr
    pub(super) fn expand_erefs(&self, text: &str, index: usize) -> Result<(usize, String), MacroError> {
        let mut cursor = Cursor::new(text, index);
        let (addr_str, address) = cursor.read_address()?;
        let refs = self.resolver().entry_point_refs(&addr_str, address)?;
        Ok((cursor.position(), routines(&refs)))
    }

    // #Daddr
    pub(super) fn expand_d(&self, text: &str, index: usize) -> Result<(usize, String), MacroError> {
        let mut cursor = Cursor::new(text, index);
        let (addr_str, address) = cursor.read_address()?;
        let description = self.resolver().description(&addr_str, address)?;
        Ok((cursor.position(), description))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn test_routines() {
        let tests = vec![
            (vec![], ""),
            (vec![32768], "routine at #R32768"),
            (vec![1, 2], "routines at #R1 and #R2"),
            (vec![1, 2, 3], "routines at #R1, #R2 and #R3"),
        ];
        for (input, expected) in tests {
            assert_eq!(routines(&input), expected);
        }
    }
}
