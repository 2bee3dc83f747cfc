use anyhow::Result;

use stockreaper_core::{admin::ListRequest, Extension};

pub async fn run(extension: &Extension, orderby: Option<String>, order: Option<String>) -> Result<()> {
    let listing = extension.list(&ListRequest::admin(orderby, order)).await?;

    if listing.rows.is_empty() {
        println!("No products to show.");
        return Ok(());
    }

    let headers: Vec<&str> = listing.columns.iter().map(|(_, label)| label).collect();

    // Column widths from headers and cell contents
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &listing.rows {
        for (i, (_, cell)) in row.cells.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("Products ({}):\n", listing.rows.len());
    println!("{}", line(headers));
    for row in &listing.rows {
        println!("{}", line(row.cells.iter().map(|(_, c)| c.as_str()).collect()));
    }

    Ok(())
}
