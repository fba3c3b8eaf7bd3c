//! SKU barcode rendering (Code 128, PNG)

use barcoders::generators::image::Image;
use barcoders::sym::code128::Code128;

use crate::error::{AppError, AppResult};

const BARCODE_HEIGHT: u32 = 80;

/// Render a product SKU as a Code 128 barcode PNG.
///
/// Code 128 payloads start with a character-set selector; `Ɓ` picks set B,
/// which covers the full printable-ASCII SKU alphabet.
pub fn sku_barcode_png(sku: &str) -> AppResult<Vec<u8>> {
    let barcode = Code128::new(format!("\u{0181}{}", sku))
        .map_err(|_| AppError::ValidationError("SKU cannot be encoded as Code 128".to_string()))?;

    let png = Image::png(BARCODE_HEIGHT);
    png.generate(&barcode.encode()[..])
        .map_err(|e| AppError::Internal(format!("Barcode rendering failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    #[test]
    fn renders_png_for_plain_sku() {
        let bytes = sku_barcode_png("WH-001").unwrap();
        assert!(bytes.starts_with(&PNG_SIGNATURE));
    }

    #[test]
    fn renders_png_for_alphanumeric_sku() {
        let bytes = sku_barcode_png("A1b2C3").unwrap();
        assert!(bytes.starts_with(&PNG_SIGNATURE));
    }

    #[test]
    fn rejects_characters_outside_code128() {
        let err = sku_barcode_png("倉庫").unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
