use comfy_table::{Table, Cell, ContentArrangement, Attribute, CellAlignment};
use colored::*;

use crate::extract::Dimensions;

/// Builds the table shown for an extracted board.
pub fn dimensions_table(dims: &Dimensions) -> Table {
    let mut table = Table::new();
    table
        .set_header(vec![
            Cell::new("Rows").fg(comfy_table::Color::Cyan).add_attribute(Attribute::Bold),
            Cell::new("Columns").fg(comfy_table::Color::Cyan).add_attribute(Attribute::Bold),
            Cell::new("Mines").fg(comfy_table::Color::Cyan).add_attribute(Attribute::Bold),
            Cell::new("Cells").fg(comfy_table::Color::Cyan).add_attribute(Attribute::Bold),
            Cell::new("Density").fg(comfy_table::Color::Cyan).add_attribute(Attribute::Bold),
        ])
        .load_preset(comfy_table::presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new(dims.rows).set_alignment(CellAlignment::Right),
        Cell::new(dims.columns).set_alignment(CellAlignment::Right),
        Cell::new(dims.mines).set_alignment(CellAlignment::Right),
        Cell::new(dims.cells()).set_alignment(CellAlignment::Right),
        Cell::new(format!("{:.1}%", dims.density() * 100.0)).set_alignment(CellAlignment::Right),
    ]);
    table
}

/// Prints the outcome of one query.
pub fn display_dimensions(result: Option<&Dimensions>) {
    match result {
        Some(dims) => println!("{}", dimensions_table(dims)),
        None => println!(
            "{}",
            "Could not extract dimensions from that request. Try e.g. \"a 16x30 board with 99 mines\".".yellow()
        ),
    }
}
