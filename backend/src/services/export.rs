//! Product list export: CSV and PDF

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use crate::error::{AppError, AppResult};
use crate::services::product::Product;

const CSV_HEADERS: [&str; 5] = ["Name", "SKU", "Quantity", "Weight (kg)", "Location"];

/// Render the product list as CSV. Every cell is quoted.
pub fn products_csv(products: &[Product]) -> AppResult<String> {
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(vec![]);

    wtr.write_record(CSV_HEADERS)
        .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;

    for product in products {
        wtr.write_record([
            product.name.as_str(),
            product.sku.as_str(),
            &product.quantity.to_string(),
            &unit_weight_cell(product),
            product.location.as_deref().unwrap_or(""),
        ])
        .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }

    let csv_data = String::from_utf8(
        wtr.into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?,
    )
    .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;

    Ok(csv_data)
}

/// Render the product list as a one-table PDF (A4, portrait)
pub fn products_pdf(products: &[Product]) -> AppResult<Vec<u8>> {
    const PAGE_WIDTH: f32 = 210.0;
    const PAGE_HEIGHT: f32 = 297.0;
    const TOP: f32 = 280.0;
    const BOTTOM: f32 = 20.0;
    const ROW_STEP: f32 = 7.0;
    // Column x offsets: Name, SKU, Quantity, Weight (kg), Location
    const COLUMNS: [f32; 5] = [15.0, 75.0, 115.0, 140.0, 170.0];

    let (doc, first_page, first_layer) = PdfDocument::new(
        "Products",
        Mm(PAGE_WIDTH.into()),
        Mm(PAGE_HEIGHT.into()),
        "Layer 1",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| AppError::Internal(format!("PDF font error: {}", e)))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| AppError::Internal(format!("PDF font error: {}", e)))?;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    layer.use_text("Products", 16.0, Mm(COLUMNS[0].into()), Mm(TOP.into()), &bold);

    let mut y = TOP - 12.0;
    write_row(&layer, &bold, 11.0, y, &COLUMNS, CSV_HEADERS);
    y -= ROW_STEP;

    for product in products {
        if y < BOTTOM {
            let (page, page_layer) = doc.add_page(
                Mm(PAGE_WIDTH.into()),
                Mm(PAGE_HEIGHT.into()),
                "Layer 1",
            );
            layer = doc.get_page(page).get_layer(page_layer);
            y = TOP;
            write_row(&layer, &bold, 11.0, y, &COLUMNS, CSV_HEADERS);
            y -= ROW_STEP;
        }

        write_row(
            &layer,
            &font,
            10.0,
            y,
            &COLUMNS,
            [
                product.name.as_str(),
                product.sku.as_str(),
                &product.quantity.to_string(),
                &unit_weight_cell(product),
                product.location.as_deref().unwrap_or(""),
            ],
        );
        y -= ROW_STEP;
    }

    doc.save_to_bytes()
        .map_err(|e| AppError::Internal(format!("PDF generation failed: {}", e)))
}

fn write_row(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    size: f32,
    y: f32,
    columns: &[f32; 5],
    cells: [&str; 5],
) {
    for (x, cell) in columns.iter().zip(cells) {
        layer.use_text(cell, size.into(), Mm((*x).into()), Mm(y.into()), font);
    }
}

/// Unit weight column: blank threshold products print as 0, like the list page
fn unit_weight_cell(product: &Product) -> String {
    product
        .weight
        .map(|w| w.to_string())
        .unwrap_or_else(|| "0".to_string())
}
