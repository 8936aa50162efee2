//! 種目ごとの幾何と閾値
//!
//! 4種目とも同じヒステリシス機械を使い、ここで定義する `ExerciseProfile` だけが異なる。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::config::{ExercisesConfig, LegLiftConfig, Side, ThresholdConfig};
use crate::pose::{checked_joint_angle, LandmarkIndex, LandmarkSet};

/// 種目
///
/// シリアライズ名はバックエンドに保存される種目IDと同じ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExerciseKind {
    #[serde(rename = "lifting")]
    Curl,
    #[serde(rename = "lunges")]
    Lunge,
    #[serde(rename = "jumping-jacks")]
    JumpingJack,
    #[serde(rename = "leg-lifts")]
    LegLift,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 4] = [
        ExerciseKind::Curl,
        ExerciseKind::Lunge,
        ExerciseKind::JumpingJack,
        ExerciseKind::LegLift,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            ExerciseKind::Curl => "lifting",
            ExerciseKind::Lunge => "lunges",
            ExerciseKind::JumpingJack => "jumping-jacks",
            ExerciseKind::LegLift => "leg-lifts",
        }
    }

    /// 種目IDから変換。不明なIDはカール扱い
    pub fn from_id(id: &str) -> Self {
        match id {
            "lunges" => ExerciseKind::Lunge,
            "jumping-jacks" => ExerciseKind::JumpingJack,
            "leg-lifts" => ExerciseKind::LegLift,
            _ => ExerciseKind::Curl,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ExerciseKind::Curl => "Bicep Curls",
            ExerciseKind::Lunge => "Lunges",
            ExerciseKind::JumpingJack => "Jumping Jacks",
            ExerciseKind::LegLift => "Leg Lifts",
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// 角度の比較条件。NaN はどの条件も満たさない
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// angle > v
    Above(f32),
    /// angle >= v
    AtLeast(f32),
    /// angle < v
    Below(f32),
    /// angle <= v
    AtMost(f32),
}

impl Bound {
    pub fn admits(&self, angle: f32) -> bool {
        match *self {
            Bound::Above(v) => angle > v,
            Bound::AtLeast(v) => angle >= v,
            Bound::Below(v) => angle < v,
            Bound::AtMost(v) => angle <= v,
        }
    }
}

/// 3点で定義される関節角度。`vertex` が頂点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointAngle {
    pub a: LandmarkIndex,
    pub vertex: LandmarkIndex,
    pub c: LandmarkIndex,
}

impl JointAngle {
    pub const fn new(a: LandmarkIndex, vertex: LandmarkIndex, c: LandmarkIndex) -> Self {
        Self { a, vertex, c }
    }

    /// ピクセル座標で角度を測る
    pub fn measure(&self, set: &LandmarkSet, width: u32, height: u32) -> Option<f32> {
        checked_joint_angle(
            set.get(self.a).to_pixel(width, height),
            set.get(self.vertex).to_pixel(width, height),
            set.get(self.c).to_pixel(width, height),
        )
    }
}

/// 角度スロットと条件の組。全て満たした時に成立
pub type Condition = Vec<(usize, Bound)>;

/// 独立して数える1単位（片腕、片脚、両腕まとめて等）
#[derive(Debug, Clone, PartialEq)]
pub struct LimbProfile {
    pub name: &'static str,
    pub angles: Vec<JointAngle>,
    pub extended: Condition,
    pub contracted: Condition,
}

impl LimbProfile {
    /// 可視性ゲートにかけるランドマーク（重複なし）
    pub fn landmarks(&self) -> Vec<LandmarkIndex> {
        let mut out = Vec::new();
        for angle in &self.angles {
            for idx in [angle.a, angle.vertex, angle.c] {
                if !out.contains(&idx) {
                    out.push(idx);
                }
            }
        }
        out
    }

    /// 条件を評価。角度が測れないスロットを含む条件は不成立
    pub fn holds(condition: &Condition, angles: &[Option<f32>]) -> bool {
        condition.iter().all(|&(slot, bound)| {
            angles
                .get(slot)
                .copied()
                .flatten()
                .is_some_and(|a| bound.admits(a))
        })
    }
}

/// 種目の完全な定義
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseProfile {
    pub kind: ExerciseKind,
    pub limbs: Vec<LimbProfile>,
    pub visibility_threshold: f32,
    pub cooldown: Duration,
    pub rearm_on_down: bool,
}

impl ExerciseProfile {
    pub fn for_kind(kind: ExerciseKind, config: &ExercisesConfig) -> Self {
        match kind {
            ExerciseKind::Curl => Self::curl(&config.curl),
            ExerciseKind::Lunge => Self::lunge(&config.lunge),
            ExerciseKind::JumpingJack => Self::jumping_jack(&config.jumping_jack),
            ExerciseKind::LegLift => Self::leg_lift(&config.leg_lift),
        }
    }

    fn with_limbs(kind: ExerciseKind, t: &ThresholdConfig, limbs: Vec<LimbProfile>) -> Self {
        Self {
            kind,
            limbs,
            visibility_threshold: t.visibility,
            cooldown: t.cooldown(),
            rearm_on_down: t.rearm_on_down,
        }
    }

    /// 肩-肘-手首、左右独立
    pub fn curl(t: &ThresholdConfig) -> Self {
        use LandmarkIndex::*;
        let arm = |name, shoulder, elbow, wrist| LimbProfile {
            name,
            angles: vec![JointAngle::new(shoulder, elbow, wrist)],
            extended: vec![(0, Bound::Above(t.down_angle))],
            contracted: vec![(0, Bound::Below(t.up_angle))],
        };
        Self::with_limbs(
            ExerciseKind::Curl,
            t,
            vec![
                arm("Left", LeftShoulder, LeftElbow, LeftWrist),
                arm("Right", RightShoulder, RightElbow, RightWrist),
            ],
        )
    }

    /// 腰-膝-足首、左右独立
    pub fn lunge(t: &ThresholdConfig) -> Self {
        use LandmarkIndex::*;
        let leg = |name, hip, knee, ankle| LimbProfile {
            name,
            angles: vec![JointAngle::new(hip, knee, ankle)],
            extended: vec![(0, Bound::Above(t.down_angle))],
            contracted: vec![(0, Bound::Below(t.up_angle))],
        };
        Self::with_limbs(
            ExerciseKind::Lunge,
            t,
            vec![
                leg("Left", LeftHip, LeftKnee, LeftAnkle),
                leg("Right", RightHip, RightKnee, RightAnkle),
            ],
        )
    }

    /// 肘-肩-腰を両腕で見て、両方が条件を満たした時だけ遷移する
    pub fn jumping_jack(t: &ThresholdConfig) -> Self {
        use LandmarkIndex::*;
        let arms = LimbProfile {
            name: "Arms",
            angles: vec![
                JointAngle::new(LeftElbow, LeftShoulder, LeftHip),
                JointAngle::new(RightElbow, RightShoulder, RightHip),
            ],
            extended: vec![(0, Bound::AtLeast(t.down_angle)), (1, Bound::AtLeast(t.down_angle))],
            contracted: vec![(0, Bound::AtMost(t.up_angle)), (1, Bound::AtMost(t.up_angle))],
        };
        Self::with_limbs(ExerciseKind::JumpingJack, t, vec![arms])
    }

    /// 肩-腰-膝で脚の上げ下げ、腰-膝-足首で膝が伸びていることを確認する（片脚）
    pub fn leg_lift(config: &LegLiftConfig) -> Self {
        use LandmarkIndex::*;
        let t = &config.thresholds;
        let (name, shoulder, hip, knee, ankle) = match config.side {
            Side::Left => ("Left", LeftShoulder, LeftHip, LeftKnee, LeftAnkle),
            Side::Right => ("Right", RightShoulder, RightHip, RightKnee, RightAnkle),
        };
        let knee_straight = Bound::AtLeast(config.knee_extended_angle);
        let leg = LimbProfile {
            name,
            angles: vec![
                JointAngle::new(shoulder, hip, knee),
                JointAngle::new(hip, knee, ankle),
            ],
            extended: vec![(0, Bound::Above(t.down_angle)), (1, knee_straight)],
            contracted: vec![(0, Bound::Below(t.up_angle)), (1, knee_straight)],
        };
        Self::with_limbs(ExerciseKind::LegLift, t, vec![leg])
    }
}
