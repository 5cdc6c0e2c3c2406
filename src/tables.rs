use html5ever::LocalName;
use tracing::{debug, trace};

use crate::arena_dom::Ref;
use crate::document::Document;

pub const NESTED_TABLE_LABEL: &str = "Illegal nested table :";

fn is_cell(node: Ref<'_>) -> bool {
    node.is_named(local_name!("td")) || node.is_named(local_name!("th"))
}

fn is_structural(name: &LocalName) -> bool {
    matches!(
        *name,
        local_name!("caption") | local_name!("thead") | local_name!("tbody") | local_name!("tr")
    )
}

/// First direct child that is a caption, header, body or row. Text and other elements are
/// skipped.
fn first_structural_child<'arena>(table: Ref<'arena>) -> Option<Ref<'arena>> {
    table
        .element_children()
        .find(|child| child.local_name().map_or(false, is_structural))
}

/// Collapses every table nested inside another one. The row holding the nested table is emptied
/// and given a single cell with a warning followed by the nested table's text.
pub fn eliminate_nested_tables(document: &Document<'_>) {
    debug!("Removing nested tables from HTML...");
    for table in document.select(local_name!("table")) {
        if !table.is_attached() {
            continue;
        }
        let nested: Vec<_> = table
            .descendants()
            .filter(|node| node.is_named(local_name!("table")))
            .collect();
        for inner in nested {
            if inner.is_attached() {
                replace_nested_table(document, inner);
            }
        }
    }
}

fn replace_nested_table<'arena>(document: &Document<'arena>, table: Ref<'arena>) {
    let label = document.create_element("b");
    label.append(document.create_text(NESTED_TABLE_LABEL));
    let cell = document.create_element("td");
    cell.append(label);
    cell.append(document.create_text(&format!(" {}", table.text_content())));

    let row = table
        .ancestors()
        .take_while(|ancestor| !ancestor.is_named(local_name!("table")))
        .find(|ancestor| is_cell(ancestor))
        .and_then(|cell| cell.parent.get())
        .filter(|parent| parent.is_named(local_name!("tr")));
    match row {
        Some(row) => {
            trace!("collapsing row holding a nested table");
            for child in row.children().collect::<Vec<_>>() {
                child.detach();
            }
            row.append(cell);
        }
        None => {
            trace!("replacing nested table outside of a row");
            table.replace_with(cell);
        }
    }
}

/// Gives every table a `<thead>` and a `<tbody>`.
///
/// A leading `<caption>` is moved out in front of the table. When bare rows follow, the first one
/// goes into a new header and the rest into a new body. When a body comes first, its first row is
/// moved into a new header in front of it. Afterwards every `<td>` in a header row becomes a
/// `<th>`.
pub fn normalize_tables(document: &Document<'_>) {
    debug!("Properly formatting tables...");
    for table in document.select(local_name!("table")) {
        normalize_table(document, table);
    }

    for header in document.select(local_name!("thead")) {
        let cells: Vec<_> = header
            .element_children()
            .filter(|row| row.is_named(local_name!("tr")))
            .flat_map(|row| row.element_children())
            .filter(|cell| cell.is_named(local_name!("td")))
            .collect();
        for cell in cells {
            into_header_cell(document, cell);
        }
    }
}

fn normalize_table<'arena>(document: &Document<'arena>, table: Ref<'arena>) {
    let mut first = first_structural_child(table);
    if let Some(caption) = first.filter(|child| child.is_named(local_name!("caption"))) {
        trace!("moving caption in front of its table");
        table.insert_before(caption);
        first = first_structural_child(table);
    }

    let first = match first {
        Some(first) => first,
        None => return,
    };
    if first.is_named(local_name!("tr")) {
        let rows: Vec<_> = table
            .element_children()
            .filter(|child| child.is_named(local_name!("tr")))
            .collect();
        let header = document.create_element("thead");
        first.insert_before(header);
        header.append(first);
        if rows.len() > 1 {
            let body = document.create_element("tbody");
            header.insert_after(body);
            for row in &rows[1..] {
                body.append(row);
            }
        }
    } else if first.is_named(local_name!("tbody")) {
        let first_row = match first
            .element_children()
            .find(|child| child.is_named(local_name!("tr")))
        {
            Some(row) => row,
            None => return,
        };
        let header = document.create_element("thead");
        first.insert_before(header);
        header.append(first_row);
        if first.element_children().next().is_none() && first.has_blank_text() {
            first.detach();
        }
    }
}

/// Swaps a `<td>` for a `<th>` with the same attributes and content.
fn into_header_cell<'arena>(document: &Document<'arena>, cell: Ref<'arena>) {
    let header_cell = document.create_element("th");
    for attr in cell.attributes() {
        header_cell.set_attribute(attr.name.local.clone(), &attr.value);
    }
    cell.reparent_children(header_cell);
    cell.replace_with(header_cell);
}

/// Unwraps the paragraphs sitting directly in table cells. When a cell holds more than one, a
/// `<br>` keeps them apart.
pub fn flatten_table_cells(document: &Document<'_>) {
    debug!("Cleaning up tables cells...");
    let cells: Vec<_> = document
        .root()
        .descendants()
        .filter(|node| is_cell(node))
        .collect();
    for cell in cells {
        let paragraphs: Vec<_> = cell
            .element_children()
            .filter(|child| child.is_named(local_name!("p")))
            .collect();
        for (index, paragraph) in paragraphs.into_iter().enumerate() {
            if index > 0 {
                paragraph.insert_before(document.create_element("br"));
            }
            paragraph.unwrap();
        }
    }
}
