use cosmic_text::{Attrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, SwashCache, Weight};
use image::{imageops, DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

use crate::error::ExportError;
use crate::render::RenderedTicket;

// Размеры карточки при масштабе 1.0
const CARD_WIDTH: f32 = 900.0;
const CARD_HEIGHT: f32 = 420.0;
const PADDING: f32 = 28.0;
const HEADER_HEIGHT: f32 = 64.0;
const CODE_SIZE: f32 = 150.0;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const HEADER_FILL: Rgba<u8> = Rgba([17, 24, 39, 255]);
const ACCENT: Rgba<u8> = Rgba([22, 163, 74, 255]);
const DIVIDER: Rgba<u8> = Rgba([229, 231, 235, 255]);
const TEXT: Color = Color::rgb(17, 24, 39);
const MUTED: Color = Color::rgb(107, 114, 128);
const ON_DARK: Color = Color::rgb(255, 255, 255);

/// Снимок отрисованного билета в пиксели.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, ticket: &RenderedTicket) -> Result<RgbaImage, ExportError>;
}

pub fn encode_png(image: RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image)
        .write_to(&mut bytes, ImageFormat::Png)
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    Ok(bytes.into_inner())
}

struct TextEngine {
    fonts: FontSystem,
    cache: SwashCache,
}

/// Рисует карточку билета: шапка, маршрут, сетка деталей, итог и QR-код.
pub struct CardRasterizer {
    scale: f32,
    // Шрифты грузятся при первом экспорте
    engine: Mutex<Option<TextEngine>>,
}

impl CardRasterizer {
    /// `scale` берётся из `ExportConfig::effective_raster_scale`.
    pub fn new(scale: f32) -> Self {
        Self {
            scale,
            engine: Mutex::new(None),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (
            (CARD_WIDTH * self.scale).round() as u32,
            (CARD_HEIGHT * self.scale).round() as u32,
        )
    }
}

impl Rasterizer for CardRasterizer {
    fn rasterize(&self, ticket: &RenderedTicket) -> Result<RgbaImage, ExportError> {
        let (width, height) = self.size();
        let s = self.scale;
        let mut canvas = RgbaImage::from_pixel(width, height, BACKGROUND);

        let mut guard = self.engine.lock().unwrap_or_else(PoisonError::into_inner);
        let engine = guard.get_or_insert_with(|| TextEngine {
            fonts: FontSystem::new(),
            cache: SwashCache::new(),
        });
        let mut pen = Pen {
            canvas: &mut canvas,
            engine,
            scale: s,
        };

        let fragment = &ticket.fragment;
        let content_right = CARD_WIDTH - PADDING * 2.0 - CODE_SIZE;

        pen.fill(0.0, 0.0, CARD_WIDTH, HEADER_HEIGHT, HEADER_FILL);
        pen.text(&fragment.header.title(), PADDING, 18.0, 22.0, true, ON_DARK, content_right);
        pen.text(&fragment.status, CARD_WIDTH - PADDING - 120.0, 22.0, 16.0, true, ON_DARK, 120.0);

        let mut y = HEADER_HEIGHT + 18.0;
        pen.text(&fragment.identity.passenger, PADDING, y, 20.0, true, TEXT, content_right);
        y += 28.0;
        let contact = format!(
            "{}  ·  {}  ·  {}",
            fragment.identity.booking_id, fragment.identity.phone, fragment.identity.email
        );
        pen.text(&contact, PADDING, y, 14.0, false, MUTED, content_right);
        y += 30.0;

        let route = format!(
            "{}  →  {}   ({})",
            fragment.route.origin, fragment.route.destination, fragment.route.distance
        );
        pen.text(&route, PADDING, y, 18.0, true, TEXT, content_right);
        y += 34.0;
        pen.fill(PADDING, y, content_right, 1.0, DIVIDER);
        y += 12.0;

        // Сетка деталей в три колонки
        let column = content_right / 3.0;
        for (i, item) in fragment.details.iter().enumerate() {
            let x = PADDING + column * (i % 3) as f32;
            let row_y = y + 48.0 * (i / 3) as f32;
            pen.text(&item.label, x, row_y, 12.0, false, MUTED, column - 8.0);
            pen.text(&item.value, x, row_y + 16.0, 15.0, true, TEXT, column - 8.0);
        }
        y += 48.0 * fragment.details.len().div_ceil(3) as f32 + 4.0;

        pen.fill(PADDING, y, 6.0, 30.0, ACCENT);
        pen.text(&format!("Total  {}", fragment.total), PADDING + 16.0, y + 4.0, 20.0, true, TEXT, content_right);
        y += 42.0;
        pen.text(&fragment.notes, PADDING, y, 13.0, false, MUTED, content_right);

        let footer = format!("Issued by {} · Ref {}", fragment.footer.issuer, fragment.footer.reference);
        pen.text(&footer, PADDING, CARD_HEIGHT - PADDING - 14.0, 12.0, false, MUTED, CARD_WIDTH - PADDING * 2.0);
        drop(guard);

        let code_px = (CODE_SIZE * s).round() as u32;
        let code = DynamicImage::ImageLuma8(ticket.code.bitmap(code_px)).to_rgba8();
        let code_x = ((CARD_WIDTH - PADDING - CODE_SIZE) * s).round() as i64;
        let code_y = ((HEADER_HEIGHT + 24.0) * s).round() as i64;
        imageops::overlay(&mut canvas, &code, code_x, code_y);

        debug!("Ticket {} rasterized at {}x{}", ticket.booking_id(), width, height);
        Ok(canvas)
    }
}

struct Pen<'a> {
    canvas: &'a mut RgbaImage,
    engine: &'a mut TextEngine,
    scale: f32,
}

impl Pen<'_> {
    fn fill(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba<u8>) {
        let s = self.scale;
        let (cw, ch) = self.canvas.dimensions();
        let x0 = (x * s).round().max(0.0) as u32;
        let y0 = (y * s).round().max(0.0) as u32;
        let x1 = (((x + w) * s).round() as u32).min(cw);
        let y1 = (((y + h) * s).round() as u32).min(ch);
        for py in y0..y1 {
            for px in x0..x1 {
                self.canvas.put_pixel(px, py, color);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn text(&mut self, text: &str, x: f32, y: f32, size: f32, bold: bool, color: Color, max_width: f32) {
        let s = self.scale;
        let TextEngine { fonts, cache } = &mut *self.engine;

        let mut buffer = Buffer::new(fonts, Metrics::new(size * s, size * s * 1.3));
        buffer.set_size(fonts, Some(max_width * s), Some(size * s * 2.6));
        let attrs = Attrs::new()
            .family(Family::SansSerif)
            .weight(if bold { Weight::BOLD } else { Weight::NORMAL });
        buffer.set_text(fonts, text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(fonts, false);

        let origin_x = (x * s).round() as i32;
        let origin_y = (y * s).round() as i32;
        let canvas = &mut *self.canvas;
        let (cw, ch) = canvas.dimensions();

        buffer.draw(fonts, cache, color, |gx, gy, w, h, glyph| {
            let alpha = glyph.a() as u32;
            if alpha == 0 {
                return;
            }
            for dy in 0..h as i32 {
                for dx in 0..w as i32 {
                    let px = origin_x + gx + dx;
                    let py = origin_y + gy + dy;
                    if px < 0 || py < 0 || px as u32 >= cw || py as u32 >= ch {
                        continue;
                    }
                    let dst = canvas.get_pixel_mut(px as u32, py as u32);
                    let blend = |src: u8, dst: u8| {
                        ((src as u32 * alpha + dst as u32 * (255 - alpha)) / 255) as u8
                    };
                    *dst = Rgba([
                        blend(glyph.r(), dst[0]),
                        blend(glyph.g(), dst[1]),
                        blend(glyph.b(), dst[2]),
                        255,
                    ]);
                }
            }
        });
    }
}
