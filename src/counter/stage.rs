use serde::{Deserialize, Serialize};
use std::fmt;

/// 四肢の動作フェーズ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// 信頼できる観測がまだない
    #[default]
    Unknown,
    /// 伸展側（開始姿勢）
    Down,
    /// 屈曲側（1レップ完了）
    Up,
}

impl Stage {
    /// UI 表示用ラベル
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Unknown => "---",
            Stage::Down => "down",
            Stage::Up => "up",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unknown() {
        assert_eq!(Stage::default(), Stage::Unknown);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Stage::Unknown.to_string(), "---");
        assert_eq!(Stage::Down.label(), "down");
        assert_eq!(Stage::Up.label(), "up");
    }
}
