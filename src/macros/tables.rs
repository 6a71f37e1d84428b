use super::{params::Cursor, MacroError, MacroExpander};
use crate::markup::{self, Cell, List, Table};

/// Position of `terminator` at or after `index`, and the index just past it.
fn find_terminator(
    text: &str,
    index: usize,
    terminator: &str,
    kind: &str,
) -> Result<(usize, usize), MacroError> {
    match text[index..].find(terminator) {
        Some(offset) => Ok((index + offset, index + offset + terminator.len())),
        None => Err(MacroError::Parsing(format!("Missing {} terminator", kind))),
    }
}

/// Contents of each `{ ... }` block in `body`. Braces only open or close a
/// block when they are separated from the contents by whitespace.
fn blocks(body: &str) -> Vec<&str> {
    let bytes = body.as_bytes();
    let is_space = |i: usize| i >= bytes.len() || bytes[i].is_ascii_whitespace();
    let mut blocks = vec![];
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' && (i == 0 || is_space(i - 1)) && is_space(i + 1) {
            let start = i + 1;
            let mut j = start;
            while j < bytes.len() && !(bytes[j] == b'}' && is_space(j - 1) && is_space(j + 1)) {
                j += 1;
            }
            blocks.push(body[start..j].trim());
            i = j + 1;
        } else {
            i += 1;
        }
    }
    blocks
}

/// Split a row on the `|` separators that are not inside brackets.
fn split_cells(row: &str) -> Vec<&str> {
    let mut cells = vec![];
    let mut depth = 0;
    let mut start = 0;
    for (i, ch) in row.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            '|' if depth == 0 => {
                cells.push(row[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    cells.push(row[start..].trim());
    cells
}

fn span_value(indicator: &str, kind: &str) -> Result<u32, MacroError> {
    match indicator[1..].parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(MacroError::Parsing(format!(
            "Invalid {} indicator: '{}'",
            kind, indicator
        ))),
    }
}

/// Parse a cell, with its optional `=h,t,cN,rN` marker.
fn parse_cell(source: &str) -> Result<Cell, MacroError> {
    let mut cell = Cell {
        contents: source.to_owned(),
        colspan: 1,
        rowspan: 1,
        ..Default::default()
    };
    let Some(marked) = source.strip_prefix('=') else {
        return Ok(cell);
    };
    let (marker, contents) = match marked.find(char::is_whitespace) {
        Some(i) => (&marked[..i], marked[i..].trim_start()),
        None => (marked, ""),
    };
    if marker.is_empty() {
        return Ok(cell);
    }
    for indicator in marker.split(',') {
        match indicator.chars().next() {
            Some('h') => cell.header = true,
            Some('t') => cell.transparent = true,
            Some('c') => cell.colspan = span_value(indicator, "colspan")?,
            Some('r') => cell.rowspan = span_value(indicator, "rowspan")?,
            _ => {}
        }
    }
    cell.contents = contents.to_owned();
    Ok(cell)
}

/// Parse the rows of a table, assigning each cell the class of the column it
/// starts in. Columns covered by a rowspan from an earlier row are skipped.
fn parse_table(body: &str, class: &str, col_classes: &[&str]) -> Result<Table, MacroError> {
    let mut rows = vec![];
    let mut busy: Vec<u32> = vec![];
    for source in blocks(body) {
        let occupied: Vec<bool> = busy.iter().map(|&n| n > 0).collect();
        for n in busy.iter_mut() {
            *n = n.saturating_sub(1);
        }
        let mut row = vec![];
        let mut col = 0;
        for cell_source in split_cells(source) {
            let mut cell = parse_cell(cell_source)?;
            while occupied.get(col).copied().unwrap_or(false) {
                col += 1;
            }
            cell.class = col_classes.get(col).copied().unwrap_or_default().to_owned();
            let next = col + cell.colspan as usize;
            if cell.rowspan > 1 {
                if busy.len() < next {
                    busy.resize(next, 0);
                }
                for n in &mut busy[col..next] {
                    *n = cell.rowspan - 1;
                }
            }
            col = next;
            row.push(cell);
        }
        rows.push(row);
    }
    Ok(Table {
        class: class.to_owned(),
        rows,
    })
}

impl MacroExpander<'_> {
    // #TABLE[(class[,col1class[,col2class...]])]<rows>TABLE#
    pub(super) fn expand_table(&self, text: &str, index: usize) -> Result<(usize, String), MacroError> {
        let (body_end, end) = find_terminator(text, index, "TABLE#", "table")?;
        let mut cursor = Cursor::new(&text[..body_end], index);
        let classes = cursor.read_optional_text()?.unwrap_or_default();
        let mut classes = classes.split(',').map(str::trim);
        let class = classes.next().unwrap_or_default();
        let col_classes: Vec<&str> = classes.collect();
        let table = parse_table(&text[cursor.position()..body_end], class, &col_classes)?;
        Ok((end, markup::table(&table)))
    }

    // #LIST[(class)]<items>LIST#
    pub(super) fn expand_list(&self, text: &str, index: usize) -> Result<(usize, String), MacroError> {
        let (body_end, end) = find_terminator(text, index, "LIST#", "list")?;
        let mut cursor = Cursor::new(&text[..body_end], index);
        let class = cursor.read_optional_text()?.unwrap_or_default();
        let list = List {
            class: class.trim().to_owned(),
            items: blocks(&text[cursor.position()..body_end])
                .into_iter()
                .map(str::to_owned)
                .collect(),
        };
        Ok((end, markup::list(&list)))
    }
}
