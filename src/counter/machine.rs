use std::time::Instant;

use super::exercise::{ExerciseKind, ExerciseProfile, JointAngle, LimbProfile};
use super::limb::{LimbTracker, Observation};
use super::stage::Stage;
use crate::pose::{LandmarkIndex, LandmarkSet, VisibilityGate};

/// 四肢1つ分のフレーム結果
#[derive(Debug, Clone, PartialEq)]
pub struct LimbReading {
    pub name: &'static str,
    pub stage: Stage,
    /// 可視性ゲートを通過したか
    pub reliable: bool,
    /// 測定した角度。ゲート不通過や退化時は None
    pub angles: Vec<(JointAngle, Option<f32>)>,
}

/// 1フレーム処理の結果
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutcome {
    pub reps: u32,
    /// このフレームで増えたレップ数
    pub counted: u32,
    pub limbs: Vec<LimbReading>,
}

impl FrameOutcome {
    pub fn stage_label(&self) -> String {
        format_stage_label(self.limbs.iter().map(|l| (l.name, l.stage)))
    }
}

/// カウンタ状態のスナップショット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseState {
    pub reps: u32,
    pub stages: Vec<Stage>,
    pub cooldowns: Vec<bool>,
}

/// 1肢なら "down"、2肢なら "Left: down | Right: ---"
fn format_stage_label<'a>(limbs: impl Iterator<Item = (&'a str, Stage)>) -> String {
    let limbs: Vec<_> = limbs.collect();
    match limbs.as_slice() {
        [(_, stage)] => stage.label().to_string(),
        many => many
            .iter()
            .map(|(name, stage)| format!("{}: {}", name, stage.label()))
            .collect::<Vec<_>>()
            .join(" | "),
    }
}

/// 汎用レップカウンタ
///
/// `ExerciseProfile` の各四肢を独立した `LimbTracker` で追跡し、
/// 合計レップ数を持つ。状態は全てこのインスタンスが所有する。
pub struct RepCounter {
    profile: ExerciseProfile,
    gate: VisibilityGate,
    required: Vec<Vec<LandmarkIndex>>,
    limbs: Vec<LimbTracker>,
    reps: u32,
}

impl RepCounter {
    pub fn new(profile: ExerciseProfile) -> Self {
        let gate = VisibilityGate::new(profile.visibility_threshold);
        let required = profile.limbs.iter().map(LimbProfile::landmarks).collect();
        let limbs = vec![LimbTracker::new(); profile.limbs.len()];
        Self {
            profile,
            gate,
            required,
            limbs,
            reps: 0,
        }
    }

    pub fn kind(&self) -> ExerciseKind {
        self.profile.kind
    }

    pub fn profile(&self) -> &ExerciseProfile {
        &self.profile
    }

    pub fn reps(&self) -> u32 {
        self.reps
    }

    /// 1フレーム分のランドマークで状態を進める
    ///
    /// ゲートを通らなかった四肢は状態をそのまま保つ。
    pub fn process(&mut self, set: &LandmarkSet, width: u32, height: u32, now: Instant) -> FrameOutcome {
        let mut counted = 0;
        let mut readings = Vec::with_capacity(self.limbs.len());

        for ((limb, tracker), required) in self
            .profile
            .limbs
            .iter()
            .zip(self.limbs.iter_mut())
            .zip(&self.required)
        {
            let reliable = self.gate.admits(set, required);
            let angles: Vec<Option<f32>> = if reliable {
                limb.angles.iter().map(|a| a.measure(set, width, height)).collect()
            } else {
                vec![None; limb.angles.len()]
            };

            if reliable {
                let obs = Observation {
                    extended: LimbProfile::holds(&limb.extended, &angles),
                    contracted: LimbProfile::holds(&limb.contracted, &angles),
                };
                if tracker.advance(obs, now, self.profile.cooldown, self.profile.rearm_on_down) {
                    counted += 1;
                    tracing::debug!(exercise = %self.profile.kind, limb = limb.name, "rep counted");
                }
            }

            readings.push(LimbReading {
                name: limb.name,
                stage: tracker.stage(),
                reliable,
                angles: limb.angles.iter().copied().zip(angles).collect(),
            });
        }

        self.reps = self.reps.saturating_add(counted);
        FrameOutcome {
            reps: self.reps,
            counted,
            limbs: readings,
        }
    }

    pub fn stage_label(&self) -> String {
        format_stage_label(self.state_labels().into_iter())
    }

    /// 四肢名と現在のステージ
    pub fn state_labels(&self) -> Vec<(&'static str, Stage)> {
        self.profile
            .limbs
            .iter()
            .zip(&self.limbs)
            .map(|(limb, tracker)| (limb.name, tracker.stage()))
            .collect()
    }

    pub fn state(&self, now: Instant) -> ExerciseState {
        ExerciseState {
            reps: self.reps,
            stages: self.limbs.iter().map(LimbTracker::stage).collect(),
            cooldowns: self.limbs.iter().map(|l| l.cooldown_active(now)).collect(),
        }
    }

    /// レップ数・ステージ・クールダウンを全て初期値に戻す
    pub fn reset(&mut self) {
        self.reps = 0;
        for limb in &mut self.limbs {
            limb.reset();
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{ExercisesConfig, ThresholdConfig};
    use crate::pose::Landmark;
    use std::time::Duration;

    pub const W: u32 = 640;
    pub const H: u32 = 480;

    /// 頂点 `vertex` に `angle_deg` の角度ができるよう a, c を配置する
    pub fn place_angle(
        set: &mut LandmarkSet,
        a: LandmarkIndex,
        vertex: LandmarkIndex,
        c: LandmarkIndex,
        center: (f32, f32),
        angle_deg: f32,
    ) {
        let r = 0.1;
        let (s, co) = angle_deg.to_radians().sin_cos();
        // ピクセル比を打ち消すため、x方向は H/W でスケール
        let sx = H as f32 / W as f32;
        set.landmarks[vertex as usize] = Landmark::new(center.0, center.1, 0.95);
        set.landmarks[a as usize] = Landmark::new(center.0 + r * sx, center.1, 0.95);
        set.landmarks[c as usize] = Landmark::new(center.0 + r * co * sx, center.1 + r * s, 0.95);
    }

    pub fn curl_frame(left: f32, right: f32) -> LandmarkSet {
        use LandmarkIndex::*;
        let mut set = LandmarkSet::default();
        place_angle(&mut set, LeftShoulder, LeftElbow, LeftWrist, (0.3, 0.5), left);
        place_angle(&mut set, RightShoulder, RightElbow, RightWrist, (0.7, 0.5), right);
        set
    }

    fn curl_counter() -> RepCounter {
        RepCounter::new(ExerciseProfile::for_kind(ExerciseKind::Curl, &ExercisesConfig::default()))
    }

    fn feed(counter: &mut RepCounter, frames: &[LandmarkSet], start: Instant, step: Duration) -> u32 {
        let mut last = 0;
        for (i, f) in frames.iter().enumerate() {
            last = counter.process(f, W, H, start + step * i as u32).reps;
        }
        last
    }

    #[test]
    fn test_place_angle_helper() {
        let set = curl_frame(35.0, 160.0);
        let profile = ExerciseProfile::curl(&ThresholdConfig::new(1500, 150.0, 40.0));
        let left = profile.limbs[0].angles[0].measure(&set, W, H).unwrap();
        let right = profile.limbs[1].angles[0].measure(&set, W, H).unwrap();
        assert!((left - 35.0).abs() < 0.01, "left = {left}");
        assert!((right - 160.0).abs() < 0.01, "right = {right}");
    }

    #[test]
    fn test_no_count_without_down() {
        let mut counter = curl_counter();
        let frames: Vec<_> = [90.0, 80.0, 35.0, 30.0].iter().map(|&a| curl_frame(a, 90.0)).collect();
        let reps = feed(&mut counter, &frames, Instant::now(), Duration::from_millis(100));
        assert_eq!(reps, 0);
        assert_eq!(counter.state(Instant::now()).stages, vec![Stage::Unknown, Stage::Unknown]);
    }

    #[test]
    fn test_jitter_around_down_angle_does_not_count() {
        let mut counter = curl_counter();
        let frames: Vec<_> = [155.0, 145.0, 155.0, 145.0, 155.0, 145.0]
            .iter()
            .map(|&a| curl_frame(a, a))
            .collect();
        let reps = feed(&mut counter, &frames, Instant::now(), Duration::from_millis(1600));
        assert_eq!(reps, 0);
    }

    #[test]
    fn test_full_cycles_count() {
        let mut counter = curl_counter();
        let frames: Vec<_> = [160.0, 35.0, 160.0, 35.0].iter().map(|&a| curl_frame(a, 90.0)).collect();
        let reps = feed(&mut counter, &frames, Instant::now(), Duration::from_secs(2));
        assert_eq!(reps, 2);
    }

    #[test]
    fn test_repeated_up_inside_cooldown_counts_once() {
        let mut counter = curl_counter();
        let frames: Vec<_> = [160.0, 35.0, 35.0, 35.0].iter().map(|&a| curl_frame(a, 90.0)).collect();
        let reps = feed(&mut counter, &frames, Instant::now(), Duration::from_millis(200));
        assert_eq!(reps, 1);
    }

    #[test]
    fn test_arms_count_independently_and_sum() {
        let mut counter = curl_counter();
        let frames = [
            curl_frame(160.0, 160.0),
            curl_frame(30.0, 160.0),
            curl_frame(30.0, 30.0),
        ];
        let t0 = Instant::now();
        let out: Vec<_> = frames
            .iter()
            .enumerate()
            .map(|(i, f)| counter.process(f, W, H, t0 + Duration::from_millis(100 * i as u64)))
            .collect();
        assert_eq!(out[1].counted, 1);
        assert_eq!(out[1].stage_label(), "Left: up | Right: down");
        assert_eq!(out[2].reps, 2);
    }

    #[test]
    fn test_occluded_frames_do_not_change_state() {
        let mut counter = curl_counter();
        let t0 = Instant::now();
        counter.process(&curl_frame(160.0, 160.0), W, H, t0);

        let mut occluded = curl_frame(30.0, 30.0);
        occluded.landmarks[LandmarkIndex::LeftWrist as usize].visibility = 0.2;
        occluded.landmarks[LandmarkIndex::RightElbow as usize].visibility = 0.6;
        let out = counter.process(&occluded, W, H, t0 + Duration::from_millis(100));

        assert_eq!(out.reps, 0);
        assert!(out.limbs.iter().all(|l| !l.reliable && l.stage == Stage::Down));
        assert!(out.limbs[0].angles.iter().all(|(_, a)| a.is_none()));

        // 見えるようになれば続きから数える
        let out = counter.process(&curl_frame(30.0, 160.0), W, H, t0 + Duration::from_millis(200));
        assert_eq!(out.reps, 1);
    }

    #[test]
    fn test_degenerate_geometry_never_counts() {
        let mut counter = curl_counter();
        let t0 = Instant::now();
        counter.process(&curl_frame(160.0, 160.0), W, H, t0);
        // 肩・肘・手首が同一点 → 角度なし
        let mut collapsed = LandmarkSet::default();
        for lm in collapsed.landmarks.iter_mut() {
            *lm = Landmark::new(0.5, 0.5, 0.9);
        }
        let out = counter.process(&collapsed, W, H, t0 + Duration::from_millis(100));
        assert_eq!(out.reps, 0);
        assert_eq!(out.limbs[0].stage, Stage::Down);
    }

    #[test]
    fn test_reps_are_monotonic() {
        let mut counter = curl_counter();
        let t0 = Instant::now();
        let angles = [170.0, 20.0, 100.0, 20.0, 155.0, 39.0, 39.0, 151.0, 10.0, 90.0];
        let mut prev = 0;
        for (i, &a) in angles.iter().cycle().take(50).enumerate() {
            let mut set = curl_frame(a, 180.0 - a);
            if i % 7 == 0 {
                set.landmarks[LandmarkIndex::LeftElbow as usize].visibility = 0.1;
            }
            let reps = counter.process(&set, W, H, t0 + Duration::from_millis(250 * i as u64)).reps;
            assert!(reps >= prev);
            prev = reps;
        }
        assert!(prev > 0);
    }

    #[test]
    fn test_reset_restores_pristine_state() {
        let mut counter = curl_counter();
        let t0 = Instant::now();
        counter.process(&curl_frame(160.0, 160.0), W, H, t0);
        counter.process(&curl_frame(30.0, 30.0), W, H, t0);
        assert_eq!(counter.reps(), 2);
        counter.reset();
        assert_eq!(
            counter.state(t0),
            ExerciseState {
                reps: 0,
                stages: vec![Stage::Unknown, Stage::Unknown],
                cooldowns: vec![false, false],
            }
        );
        assert_eq!(counter.stage_label(), "Left: --- | Right: ---");
    }

    #[test]
    fn test_lunge_legs_are_independent() {
        use LandmarkIndex::*;
        let mut counter =
            RepCounter::new(ExerciseProfile::for_kind(ExerciseKind::Lunge, &ExercisesConfig::default()));
        let t0 = Instant::now();
        let legs = |l: f32, r: f32| {
            let mut set = LandmarkSet::default();
            place_angle(&mut set, LeftHip, LeftKnee, LeftAnkle, (0.4, 0.6), l);
            place_angle(&mut set, RightHip, RightKnee, RightAnkle, (0.6, 0.6), r);
            set
        };
        counter.process(&legs(175.0, 175.0), W, H, t0);
        let out = counter.process(&legs(100.0, 150.0), W, H, t0 + Duration::from_millis(500));
        assert_eq!(out.reps, 1);
        counter.process(&legs(175.0, 100.0), W, H, t0 + Duration::from_millis(1000));
        let out = counter.process(&legs(100.0, 175.0), W, H, t0 + Duration::from_millis(2500));
        assert_eq!(out.reps, 3);
    }

    #[test]
    fn test_jumping_jack_needs_both_arms() {
        use LandmarkIndex::*;
        let mut counter = RepCounter::new(ExerciseProfile::for_kind(
            ExerciseKind::JumpingJack,
            &ExercisesConfig::default(),
        ));
        let t0 = Instant::now();
        let arms = |l: f32, r: f32| {
            let mut set = LandmarkSet::default();
            place_angle(&mut set, LeftElbow, LeftShoulder, LeftHip, (0.4, 0.4), l);
            place_angle(&mut set, RightElbow, RightShoulder, RightHip, (0.6, 0.4), r);
            set
        };
        counter.process(&arms(170.0, 150.0), W, H, t0);
        assert_eq!(counter.stage_label(), "---");
        counter.process(&arms(170.0, 165.0), W, H, t0);
        assert_eq!(counter.stage_label(), "down");
        let out = counter.process(&arms(10.0, 30.0), W, H, t0 + Duration::from_millis(300));
        assert_eq!(out.reps, 0);
        let out = counter.process(&arms(10.0, 15.0), W, H, t0 + Duration::from_millis(400));
        assert_eq!(out.reps, 1);
        assert_eq!(out.stage_label(), "up");
    }

    #[test]
    fn test_leg_lift_requires_straight_knee() {
        use LandmarkIndex::*;
        let mut counter =
            RepCounter::new(ExerciseProfile::for_kind(ExerciseKind::LegLift, &ExercisesConfig::default()));
        let t0 = Instant::now();
        // shoulder-hip-knee を (hip 頂点), hip-knee-ankle を (knee 頂点) で独立に置く
        let leg = |hip_angle: f32, knee_angle: f32| {
            let mut set = LandmarkSet::default();
            place_angle(&mut set, RightShoulder, RightHip, RightKnee, (0.5, 0.5), hip_angle);
            let knee = set.landmarks[RightKnee as usize];
            let (s, c) = knee_angle.to_radians().sin_cos();
            // knee→hip の向きを基準に ankle を置く
            let hip = set.landmarks[RightHip as usize];
            let base = ((hip.y - knee.y) * H as f32).atan2((hip.x - knee.x) * W as f32);
            let (bs, bc) = (base.sin(), base.cos());
            let dir = (bc * c - bs * s, bs * c + bc * s);
            set.landmarks[RightAnkle as usize] = Landmark::new(
                knee.x + 0.1 * dir.0 * H as f32 / W as f32,
                knee.y + 0.1 * dir.1,
                0.95,
            );
            set
        };
        counter.process(&leg(175.0, 175.0), W, H, t0);
        assert_eq!(counter.stage_label(), "down");
        let out = counter.process(&leg(90.0, 120.0), W, H, t0 + Duration::from_millis(500));
        assert_eq!(out.reps, 0);
        let out = counter.process(&leg(90.0, 170.0), W, H, t0 + Duration::from_millis(600));
        assert_eq!(out.reps, 1);
    }
}
