use std::convert::Infallible;

use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, Line, PrimitiveStyle, Rectangle};
use embedded_graphics::text::renderer::TextRenderer;
use embedded_graphics::text::{Baseline, Text};

use crate::render::overlay::Overlay;
use crate::render::skeleton::{
    HUD_BACKGROUND, LANDMARK_COLOR, LOW_VISIBILITY_COLOR, SKELETON_COLOR, TEXT_COLOR,
};

/// HUDのフォント
const HUD_FONT: MonoFont<'static> = FONT_10X20;
/// 角度表示のフォント
const ANGLE_FONT: MonoFont<'static> = FONT_6X10;
const HUD_MARGIN: i32 = 8;
const HUD_LINE_SPACING: i32 = 4;
const LANDMARK_RADIUS: i32 = 4;

fn to_rgb(color: u32) -> Rgb888 {
    Rgb888::new((color >> 16) as u8, (color >> 8) as u8, color as u8)
}

fn from_rgb(color: Rgb888) -> u32 {
    ((color.r() as u32) << 16) | ((color.g() as u32) << 8) | color.b() as u32
}

/// 線分を [0, max_x] × [0, max_y] に切り詰める (Liang-Barsky)
///
/// 範囲外や非有限の座標を含む線分は None。
fn clip_segment(a: (f64, f64), b: (f64, f64), max_x: f64, max_y: f64) -> Option<((f64, f64), (f64, f64))> {
    if ![a.0, a.1, b.0, b.1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    for (p, q) in [(-dx, a.0), (dx, max_x - a.0), (-dy, a.1), (dy, max_y - a.1)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
    }
    Some(((a.0 + t0 * dx, a.1 + t0 * dy), (a.0 + t1 * dx, a.1 + t1 * dy)))
}

/// 0RGB の u32 ピクセルバッファ
///
/// `DrawTarget` を実装しているので embedded-graphics の図形と文字をそのまま描ける。
pub struct Canvas {
    buffer: Vec<u32>,
    width: usize,
    height: usize,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            buffer: vec![0u32; width * height],
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn buffer(&self) -> &[u32] {
        &self.buffer
    }

    #[cfg(test)]
    fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.buffer[y * self.width + x])
    }

    pub fn clear(&mut self, color: u32) {
        self.buffer.fill(color);
    }

    /// 点 (x, y) が余白 `margin` 込みでキャンバス内か
    fn near(&self, x: f32, y: f32, margin: f32) -> bool {
        x.is_finite()
            && y.is_finite()
            && x >= -margin
            && y >= -margin
            && x <= self.width as f32 + margin
            && y <= self.height as f32 + margin
    }

    /// オーバーレイを描画（背景はクリアする）
    pub fn draw_overlay(&mut self, overlay: &Overlay) {
        self.clear(0);

        let sx = self.width as f32 / overlay.width.max(1) as f32;
        let sy = self.height as f32 / overlay.height.max(1) as f32;
        let to_screen = |x: f32, y: f32| -> (f32, f32) { (overlay.screen_x(x) * sx, y * sy) };

        // 骨格線を描画
        for &((x1, y1), (x2, y2)) in &overlay.segments {
            let (ax, ay) = to_screen(x1, y1);
            let (bx, by) = to_screen(x2, y2);
            self.draw_segment((ax as f64, ay as f64), (bx as f64, by as f64), SKELETON_COLOR);
        }

        // ランドマークを描画
        for p in &overlay.points {
            let (px, py) = to_screen(p.x, p.y);
            if self.near(px, py, LANDMARK_RADIUS as f32) {
                let color = if p.visible { LANDMARK_COLOR } else { LOW_VISIBILITY_COLOR };
                self.draw_circle(px as i32, py as i32, LANDMARK_RADIUS, color);
            }
        }

        // 角度（文字は反転しない）
        for label in &overlay.angles {
            let (px, py) = to_screen(label.x, label.y);
            if self.near(px, py, 0.0) {
                self.draw_text(px as i32 + 6, py as i32 - 6, &label.text(), &ANGLE_FONT, TEXT_COLOR);
            }
        }

        // HUD
        if !overlay.hud.is_empty() {
            let style = MonoTextStyle::new(&HUD_FONT, to_rgb(TEXT_COLOR));
            let line_height = HUD_FONT.character_size.height as i32 + HUD_LINE_SPACING;
            let box_w = overlay
                .hud
                .iter()
                .map(|l| style.measure_string(l, Point::zero(), Baseline::Top).bounding_box.size.width)
                .max()
                .unwrap_or(0) as i32
                + HUD_MARGIN * 2;
            let box_h = line_height * overlay.hud.len() as i32 + HUD_MARGIN * 2;
            self.fill_rect(0, 0, box_w, box_h, HUD_BACKGROUND);
            for (i, line) in overlay.hud.iter().enumerate() {
                let y = HUD_MARGIN + line_height * i as i32;
                self.draw_text(HUD_MARGIN, y, line, &HUD_FONT, TEXT_COLOR);
            }
        }
    }

    /// 左上 (x, y) から文字列を描画
    fn draw_text(&mut self, x: i32, y: i32, text: &str, font: &MonoFont<'_>, color: u32) {
        let style = MonoTextStyle::new(font, to_rgb(color));
        let _ = Text::with_baseline(text, Point::new(x, y), style, Baseline::Top).draw(self);
    }

    /// 矩形を塗りつぶし
    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        if w <= 0 || h <= 0 {
            return;
        }
        let _ = Rectangle::new(Point::new(x, y), Size::new(w as u32, h as u32))
            .into_styled(PrimitiveStyle::with_fill(to_rgb(color)))
            .draw(self);
    }

    /// 線を描画。キャンバス外の部分は切り捨てる
    fn draw_segment(&mut self, a: (f64, f64), b: (f64, f64), color: u32) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let max_x = (self.width - 1) as f64;
        let max_y = (self.height - 1) as f64;
        let Some((a, b)) = clip_segment(a, b, max_x, max_y) else {
            return;
        };
        let _ = Line::new(
            Point::new(a.0.round() as i32, a.1.round() as i32),
            Point::new(b.0.round() as i32, b.1.round() as i32),
        )
        .into_styled(PrimitiveStyle::with_stroke(to_rgb(color), 1))
        .draw(self);
    }

    /// 円を描画（塗りつぶし）
    fn draw_circle(&mut self, cx: i32, cy: i32, radius: i32, color: u32) {
        let r = radius.max(0) as i64;
        let (x, y) = (cx as i64, cy as i64);
        if x < -r || y < -r || x > self.width as i64 + r || y > self.height as i64 + r {
            return;
        }
        let diameter = (radius.max(0) * 2 + 1) as u32;
        let _ = Circle::with_center(Point::new(cx, cy), diameter)
            .into_styled(PrimitiveStyle::with_fill(to_rgb(color)))
            .draw(self);
    }

    /// ピクセルをセット（境界チェック付き）
    fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            self.buffer[y as usize * self.width + x as usize] = color;
        }
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, from_rgb(color));
        }
        Ok(())
    }
}
