use super::landmark::{Landmark, LandmarkIndex, LandmarkSet};

/// 元アプリの VISIBILITY_THRESHOLD
pub const DEFAULT_VISIBILITY_THRESHOLD: f32 = 0.6;

/// 可視性ゲート
///
/// 四肢のランドマークが全て閾値を超えている時だけ、そのフレームで
/// カウント判定してよい。閾値ちょうどは不合格。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityGate {
    threshold: f32,
}

impl VisibilityGate {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// 全ランドマークの可視性が閾値を超えているか
    pub fn is_reliable(&self, landmarks: &[Landmark]) -> bool {
        landmarks.iter().all(|l| l.is_visible(self.threshold))
    }

    /// ランドマーク集合のうち指定インデックスが全て信頼できるか
    pub fn admits(&self, set: &LandmarkSet, indices: &[LandmarkIndex]) -> bool {
        self.is_reliable(&set.select(indices))
    }
}

impl Default for VisibilityGate {
    fn default() -> Self {
        Self::new(DEFAULT_VISIBILITY_THRESHOLD)
    }
}
