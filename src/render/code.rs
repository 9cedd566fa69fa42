use image::{imageops, GrayImage, Luma};
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};

use crate::error::RenderError;

/// QR-код билета. Строится заново при каждом рендере контейнера.
pub struct ScanCode {
    payload: String,
    code: QrCode,
}

impl std::fmt::Debug for ScanCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanCode")
            .field("payload", &self.payload)
            .field("width", &self.code.width())
            .finish()
    }
}

impl ScanCode {
    pub fn new(payload: &str) -> Result<Self, RenderError> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)
            .map_err(|e| RenderError::Code(e.to_string()))?;
        Ok(Self {
            payload: payload.to_string(),
            code,
        })
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Inline SVG для HTML-фрагмента, без XML-пролога.
    pub fn svg(&self, size: u32) -> String {
        let document = self
            .code
            .render::<svg::Color>()
            .min_dimensions(size, size)
            .dark_color(svg::Color("#111827"))
            .light_color(svg::Color("#ffffff"))
            .build();

        match document.find("<svg") {
            Some(start) => document[start..].to_string(),
            None => document,
        }
    }

    /// Растровый код ровно size x size пикселей.
    pub fn bitmap(&self, size: u32) -> GrayImage {
        let image = self
            .code
            .render::<Luma<u8>>()
            .quiet_zone(true)
            .min_dimensions(size, size)
            .build();

        if image.width() == size && image.height() == size {
            image
        } else {
            imageops::resize(&image, size, size, imageops::FilterType::Nearest)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn svg_is_inline_ready() {
        let code = ScanCode::new("Booking:HT-20261102-123456").unwrap();
        let svg = code.svg(160);

        assert!(svg.starts_with("<svg"));
        assert!(!svg.contains("<?xml"));
        assert_eq!(code.payload(), "Booking:HT-20261102-123456");
    }

    #[test]
    fn bitmap_has_requested_size() {
        let code = ScanCode::new("Booking:HT-20261102-123456").unwrap();
        let bitmap = code.bitmap(200);

        assert_eq!(bitmap.dimensions(), (200, 200));
        // тихая зона белая
        assert_eq!(bitmap.get_pixel(0, 0), &Luma([255u8]));
    }

    #[test]
    fn oversized_payload_is_a_render_error() {
        let payload = "x".repeat(8000);
        assert!(matches!(ScanCode::new(&payload), Err(RenderError::Code(_))));
    }
}
