use crate::pose::{LandmarkIndex, LandmarkSet};
use crate::render::skeleton::{BODY_LANDMARKS, SKELETON_CONNECTIONS};

/// 描画用ランドマーク（ピクセル座標）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayPoint {
    pub index: LandmarkIndex,
    pub x: f32,
    pub y: f32,
    pub visible: bool,
}

/// 関節の横に出す角度表示
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleLabel {
    pub x: f32,
    pub y: f32,
    pub degrees: f32,
}

impl AngleLabel {
    pub fn text(&self) -> String {
        format!("{}", self.degrees.round() as i32)
    }
}

/// 1フレーム分の描画指示
///
/// 座標はフレームのピクセル座標。左右反転は描画側で `screen_x` を通して行い、
/// 文字は反転しない。
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub width: u32,
    pub height: u32,
    pub mirror_x: bool,
    pub points: Vec<OverlayPoint>,
    pub segments: Vec<((f32, f32), (f32, f32))>,
    pub angles: Vec<AngleLabel>,
    pub hud: Vec<String>,
}

impl Overlay {
    /// 姿勢なしの空オーバーレイ
    pub fn new(width: u32, height: u32, mirror_x: bool) -> Self {
        Self {
            width,
            height,
            mirror_x,
            points: Vec::new(),
            segments: Vec::new(),
            angles: Vec::new(),
            hud: Vec::new(),
        }
    }

    /// 骨格とランドマークを追加。線は両端が見えている時だけ
    pub fn add_pose(&mut self, set: &LandmarkSet, visibility_threshold: f32) {
        for &index in BODY_LANDMARKS.iter() {
            let lm = set.get(index);
            let (x, y) = lm.to_pixel(self.width, self.height);
            self.points.push(OverlayPoint {
                index,
                x,
                y,
                visible: lm.is_visible(visibility_threshold),
            });
        }

        for (start, end) in SKELETON_CONNECTIONS.iter() {
            let a = set.get(*start);
            let b = set.get(*end);
            if a.is_visible(visibility_threshold) && b.is_visible(visibility_threshold) {
                self.segments.push((
                    a.to_pixel(self.width, self.height),
                    b.to_pixel(self.width, self.height),
                ));
            }
        }
    }

    pub fn add_angle(&mut self, at: (f32, f32), degrees: f32) {
        self.angles.push(AngleLabel {
            x: at.0,
            y: at.1,
            degrees,
        });
    }

    pub fn push_hud(&mut self, line: impl Into<String>) {
        self.hud.push(line.into());
    }

    /// 反転を考慮した表示X座標
    pub fn screen_x(&self, x: f32) -> f32 {
        if self.mirror_x {
            self.width as f32 - x
        } else {
            x
        }
    }
}
