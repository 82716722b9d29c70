use super::TableView;
use crate::formatting::OutputFormatter;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use std::io::{self, Write};

/// Draw one table, or a "not available" line naming the missing fields.
pub fn render_table(view: &TableView, formatter: &dyn OutputFormatter) -> String {
    let mut out = formatter.header(&view.title);
    out.push('\n');

    if !view.is_available() {
        out.push_str(&formatter.warning(&format!(
            "Not available: missing field(s) {}",
            view.missing.join(", ")
        )));
        out.push('\n');
        return out;
    }
    if view.rows.is_empty() {
        out.push_str(&formatter.dim("No matching records"));
        out.push('\n');
        return out;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(view.headers.iter().map(Cell::new));
    for row in &view.rows {
        table.add_row(row.iter().map(|value| {
            let cell = Cell::new(value);
            if looks_numeric(value) {
                cell.set_alignment(CellAlignment::Right)
            } else {
                cell
            }
        }));
    }
    out.push_str(&table.to_string());
    out.push('\n');
    out
}

pub fn write_tables(
    writer: &mut dyn Write,
    views: &[TableView],
    formatter: &dyn OutputFormatter,
) -> io::Result<()> {
    for (i, view) in views.iter().enumerate() {
        if i > 0 {
            writeln!(writer)?;
        }
        write!(writer, "{}", render_table(view, formatter))?;
    }
    Ok(())
}

fn looks_numeric(value: &str) -> bool {
    let trimmed = value.trim_end_matches('%').replace([',', '$'], "");
    !trimmed.is_empty() && trimmed.parse::<f64>().is_ok()
}
