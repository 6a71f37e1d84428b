//! HTML fragments produced by the macros.

/// A cell of a `#TABLE`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cell {
    pub contents: String,
    pub header: bool,
    pub transparent: bool,
    pub colspan: u32,
    pub rowspan: u32,
    /// Class of the column the cell starts in.
    pub class: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub class: String,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct List {
    pub class: String,
    pub items: Vec<String>,
}

fn class_attr(class: &str) -> String {
    if class.is_empty() {
        String::new()
    } else {
        format!(" class=\"{}\"", class)
    }
}

pub fn link(href: &str, text: &str) -> String {
    format!("<a href=\"{}\">{}</a>", href, text)
}

pub fn img(alt: &str, src: &str) -> String {
    format!("<img alt=\"{}\" src=\"{}\" />", alt, src)
}

pub fn reg(name: &str) -> String {
    format!("<span class=\"register\">{}</span>", name)
}

pub fn table(table: &Table) -> String {
    let mut html = vec![format!("<table{}>", class_attr(&table.class))];
    for row in &table.rows {
        html.push("<tr>".to_owned());
        for cell in row {
            let colspan = match cell.colspan {
                n if n > 1 => format!(" colspan=\"{}\"", n),
                _ => String::new(),
            };
            let rowspan = match cell.rowspan {
                n if n > 1 => format!(" rowspan=\"{}\"", n),
                _ => String::new(),
            };
            let (tag, class) = if cell.header {
                ("th", String::new())
            } else {
                let mut class = cell.class.clone();
                if cell.transparent {
                    class.push_str(" transparent");
                }
                ("td", class_attr(class.trim_start()))
            };
            html.push(format!(
                "<{tag}{class}{colspan}{rowspan}>{}</{tag}>",
                cell.contents
            ));
        }
        html.push("</tr>".to_owned());
    }
    html.push("</table>".to_owned());
    html.join("\n")
}

pub fn list(list: &List) -> String {
    let mut html = vec![format!("<ul{}>", class_attr(&list.class))];
    html.extend(list.items.iter().map(|item| format!("<li>{}</li>", item)));
    html.push("</ul>".to_owned());
    html.join("\n")
}
