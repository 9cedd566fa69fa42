use image::{Rgb, RgbImage, RgbaImage};
use printpdf::{ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument, Px};
use serde::Deserialize;
use std::str::FromStr;

use crate::error::ExportError;

const MM_PER_INCH: f32 = 25.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    A4,
    Letter,
}

impl PageFormat {
    /// Размер страницы в альбомной ориентации, (ширина, высота) в мм.
    pub fn landscape_mm(self) -> (f32, f32) {
        let (w, h) = match self {
            PageFormat::A4 => (210.0, 297.0),
            PageFormat::Letter => (215.9, 279.4),
        };
        (h, w)
    }
}

impl FromStr for PageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(PageFormat::A4),
            "letter" => Ok(PageFormat::Letter),
            other => Err(format!("unknown page format '{}'", other)),
        }
    }
}

/// Положение картинки на странице, в мм от левого нижнего угла.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Вписывает картинку в страницу с полями: по центру, с сохранением пропорций.
/// Картинка не увеличивается больше размера при 96 dpi.
pub fn fit_on_page(
    image_px: (u32, u32),
    page_mm: (f32, f32),
    margin_mm: f32,
    natural_dpi: f32,
) -> Placement {
    let (px_w, px_h) = (image_px.0.max(1) as f32, image_px.1.max(1) as f32);
    let avail_w = (page_mm.0 - 2.0 * margin_mm).max(1.0);
    let avail_h = (page_mm.1 - 2.0 * margin_mm).max(1.0);

    let natural_w = px_w / natural_dpi * MM_PER_INCH;
    let natural_h = px_h / natural_dpi * MM_PER_INCH;
    let scale = (avail_w / natural_w).min(avail_h / natural_h).min(1.0);

    let width = natural_w * scale;
    let height = natural_h * scale;
    Placement {
        x: (page_mm.0 - width) / 2.0,
        y: (page_mm.1 - height) / 2.0,
        width,
        height,
    }
}

/// Прозрачные пиксели накладываются на белый фон.
pub fn flatten_on_white(image: &RgbaImage) -> RgbImage {
    let mut out = RgbImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as f32 / 255.0;
        let blend = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        out.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}

/// Собирает одностраничный PDF из растра билета.
pub trait DocumentWriter: Send + Sync {
    fn write(&self, title: &str, image: &RgbaImage) -> Result<Vec<u8>, ExportError>;
}

#[derive(Debug, Clone)]
pub struct PdfWriter {
    page: PageFormat,
    margin_mm: f32,
    natural_dpi: f32,
}

impl PdfWriter {
    /// `raster_scale` - во сколько раз растр крупнее экранного размера.
    pub fn new(page: PageFormat, margin_mm: f32, raster_scale: f32) -> Self {
        Self {
            page,
            margin_mm,
            natural_dpi: 96.0 * raster_scale,
        }
    }
}

impl DocumentWriter for PdfWriter {
    fn write(&self, title: &str, image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
        let page_mm = self.page.landscape_mm();
        let (doc, page, layer) = PdfDocument::new(title, Mm(page_mm.0), Mm(page_mm.1), "Ticket");
        let layer = doc.get_page(page).get_layer(layer);

        let rgb = flatten_on_white(image);
        let (width, height) = rgb.dimensions();
        let placement = fit_on_page((width, height), page_mm, self.margin_mm, self.natural_dpi);

        let pdf_image = Image::from(ImageXObject {
            width: Px(width as usize),
            height: Px(height as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: rgb.into_raw(),
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        });

        // DPI = пиксели / (мм / 25.4)
        let dpi = width as f32 / (placement.width / MM_PER_INCH);
        pdf_image.add_to_layer(
            layer,
            ImageTransform {
                translate_x: Some(Mm(placement.x)),
                translate_y: Some(Mm(placement.y)),
                dpi: Some(dpi),
                ..Default::default()
            },
        );

        doc.save_to_bytes()
            .map_err(|e| ExportError::Document(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn page_format_parses_case_insensitively() {
        assert_eq!("A4".parse::<PageFormat>(), Ok(PageFormat::A4));
        assert_eq!(" letter ".parse::<PageFormat>(), Ok(PageFormat::Letter));
        assert!("legal".parse::<PageFormat>().is_err());
    }

    #[test]
    fn clamped_scale_fits_card_at_screen_size() {
        let export = crate::config::ExportConfig {
            raster_scale: 100.0,
            ..Default::default()
        };
        let scale = export.effective_raster_scale();
        let writer = PdfWriter::new(PageFormat::A4, 10.0, scale);
        assert_eq!(writer.natural_dpi, 384.0);

        // Растр 3600 x 1680 при 384 dpi - те же 238 x 111 мм, что и при 1x
        let p = fit_on_page((3600, 1680), PageFormat::A4.landscape_mm(), 10.0, writer.natural_dpi);
        let one_x = fit_on_page((900, 420), PageFormat::A4.landscape_mm(), 10.0, 96.0);
        assert!((p.width - one_x.width).abs() < 0.01);
        assert!((p.height - one_x.height).abs() < 0.01);
    }

    #[test]
    fn landscape_is_wider_than_tall() {
        let (w, h) = PageFormat::A4.landscape_mm();
        assert_eq!((w, h), (297.0, 210.0));
        let (w, h) = PageFormat::Letter.landscape_mm();
        assert!(w > h);
    }

    #[test]
    fn wide_image_is_scaled_down_and_centered() {
        // 4000 x 1000 px при 96 dpi ~ 1058 x 265 мм, не влезает в A4
        let page = PageFormat::A4.landscape_mm();
        let p = fit_on_page((4000, 1000), page, 10.0, 96.0);

        assert!((p.width - 277.0).abs() < 0.01);
        assert!((p.width / p.height - 4.0).abs() < 0.001);
        assert!((p.x - 10.0).abs() < 0.01);
        assert!((p.y - (210.0 - p.height) / 2.0).abs() < 0.01);
    }

    #[test]
    fn small_image_is_not_upscaled() {
        let page = PageFormat::A4.landscape_mm();
        let p = fit_on_page((96, 48), page, 10.0, 96.0);

        assert!((p.width - 25.4).abs() < 0.01);
        assert!((p.height - 12.7).abs() < 0.01);
        assert!((p.x + p.width / 2.0 - 148.5).abs() < 0.01);
    }

    #[test]
    fn transparent_pixels_become_white() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        img.put_pixel(1, 0, Rgba([10, 20, 30, 255]));

        let flat = flatten_on_white(&img);
        assert_eq!(flat.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(flat.get_pixel(1, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn pdf_starts_with_header() {
        let writer = PdfWriter::new(PageFormat::Letter, 10.0, 2.0);
        let img = RgbaImage::from_pixel(40, 20, Rgba([200, 50, 50, 255]));

        let bytes = writer.write("Ticket", &img).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
