use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use normkit_model::Value;

use crate::commands::UnitRow;

pub fn units_table(rows: &[UnitRow]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Capability"),
        header_cell("Provider"),
        header_cell("Transform"),
    ]);
    apply_table_style(&mut table);
    for row in rows {
        let own = row.transform == format!("{}#{}", row.provider, row.capability);
        table.add_row(vec![
            Cell::new(&row.capability).add_attribute(Attribute::Bold),
            Cell::new(&row.provider).fg(Color::Cyan),
            transform_cell(&row.transform, own),
        ]);
    }
    table
}

pub fn print_units(rows: &[UnitRow]) {
    println!("{}", units_table(rows));
    println!("{} capabilities", rows.len());
}

pub fn print_values(values: &[Value], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(values)?);
    } else {
        for value in values {
            println!("{value}");
        }
    }
    Ok(())
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold)
}

/// Aliases (a transform owned under another name) are dimmed.
fn transform_cell(label: &str, own: bool) -> Cell {
    if own {
        Cell::new(label)
    } else {
        Cell::new(label).add_attribute(Attribute::Dim)
    }
}
