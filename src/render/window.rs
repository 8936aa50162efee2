use anyhow::Result;
use minifb::{Key, Window, WindowOptions};

use crate::render::canvas::Canvas;
use crate::render::overlay::Overlay;
use crate::render::RenderSink;

/// minifbを使用したレンダラー
pub struct MinifbRenderer {
    window: Window,
    canvas: Canvas,
}

impl MinifbRenderer {
    /// ウィンドウを作成
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        Ok(Self {
            window,
            canvas: Canvas::new(width, height),
        })
    }

    /// ウィンドウが開いているか
    pub fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(Key::Escape)
    }

    /// バッファをウィンドウに表示
    pub fn update(&mut self) -> Result<()> {
        self.window.update_with_buffer(
            self.canvas.buffer(),
            self.canvas.width(),
            self.canvas.height(),
        )?;
        Ok(())
    }
}

impl RenderSink for MinifbRenderer {
    fn draw(&mut self, overlay: &Overlay) {
        self.canvas.draw_overlay(overlay);
        if let Err(e) = self.update() {
            tracing::warn!("window update failed: {e}");
        }
    }
}
