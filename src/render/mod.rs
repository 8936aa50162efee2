pub mod canvas;
pub mod overlay;
pub mod skeleton;
#[cfg(feature = "desktop")]
pub mod window;

pub use canvas::Canvas;
pub use overlay::{AngleLabel, Overlay, OverlayPoint};
pub use skeleton::SKELETON_CONNECTIONS;
#[cfg(feature = "desktop")]
pub use window::MinifbRenderer;

/// 描画先。フレーム毎に1回呼ばれる
pub trait RenderSink {
    fn draw(&mut self, overlay: &Overlay);
}

/// 何も描画しない
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl RenderSink for NullRenderer {
    fn draw(&mut self, _overlay: &Overlay) {}
}

impl RenderSink for Canvas {
    fn draw(&mut self, overlay: &Overlay) {
        self.draw_overlay(overlay);
    }
}

/// 最後に受け取ったオーバーレイを保持する
#[derive(Debug, Default, Clone)]
pub struct LastOverlay(pub Option<Overlay>);

impl RenderSink for LastOverlay {
    fn draw(&mut self, overlay: &Overlay) {
        self.0 = Some(overlay.clone());
    }
}
