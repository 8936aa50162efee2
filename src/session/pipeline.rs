use std::time::Instant;

use crate::counter::{FrameOutcome, RepCounter};
use crate::pose::Frame;
use crate::render::{Overlay, RenderSink};
use crate::session::{format_duration, UpdateSink};

/// フレーム毎の処理: ゲート → 角度 → 状態機械 → 通知と描画
pub struct FramePipeline<U, R> {
    counter: RepCounter,
    updates: U,
    renderer: R,
    mirror_x: bool,
}

impl<U: UpdateSink, R: RenderSink> FramePipeline<U, R> {
    pub fn new(counter: RepCounter, updates: U, renderer: R, mirror_x: bool) -> Self {
        Self {
            counter,
            updates,
            renderer,
            mirror_x,
        }
    }

    pub fn counter(&self) -> &RepCounter {
        &self.counter
    }

    pub fn counter_mut(&mut self) -> &mut RepCounter {
        &mut self.counter
    }

    pub fn updates_mut(&mut self) -> &mut U {
        &mut self.updates
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn into_sinks(self) -> (U, R) {
        (self.updates, self.renderer)
    }

    /// 1フレーム処理する
    ///
    /// ランドマークが無いフレームはカウントせず、姿勢なしのオーバーレイだけ描く。
    pub fn process(&mut self, frame: &Frame, now: Instant, elapsed_secs: u64) -> Option<FrameOutcome> {
        let mut overlay = Overlay::new(frame.width, frame.height, self.mirror_x);

        let outcome = frame.landmarks.as_ref().map(|set| {
            let outcome = self.counter.process(set, frame.width, frame.height, now);
            self.updates.on_update(outcome.reps, &outcome.stage_label());

            overlay.add_pose(set, self.counter.profile().visibility_threshold);
            for reading in &outcome.limbs {
                for (joint, degrees) in &reading.angles {
                    if let Some(degrees) = degrees {
                        let at = set.get(joint.vertex).to_pixel(frame.width, frame.height);
                        overlay.add_angle(at, *degrees);
                    }
                }
            }
            outcome
        });

        self.fill_hud(&mut overlay, now, elapsed_secs);
        self.renderer.draw(&overlay);
        outcome
    }

    fn fill_hud(&self, overlay: &mut Overlay, now: Instant, elapsed_secs: u64) {
        overlay.push_hud(format!("REPS: {}", self.counter.reps()));
        let state = self.counter.state_labels();
        if let [(_, stage)] = state.as_slice() {
            overlay.push_hud(format!("STAGE: {}", stage));
        } else {
            for (name, stage) in state {
                overlay.push_hud(format!("{}: {}", name.to_uppercase(), stage));
            }
        }
        // どれかの肢がクールダウン中なら次のレップは数えない
        let cooling = self.counter.state(now).cooldowns.contains(&true);
        overlay.push_hud(if cooling { "READY: NO" } else { "READY: YES" });
        overlay.push_hud(format!("TIME: {}", format_duration(elapsed_secs)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExercisesConfig;
    use crate::counter::machine::tests::{curl_frame, H, W};
    use crate::counter::{ExerciseKind, ExerciseProfile};
    use crate::render::LastOverlay;
    use crate::session::{ChannelSink, SessionEvent};
    use std::time::Duration;

    fn pipeline(kind: ExerciseKind) -> (FramePipeline<ChannelSink, LastOverlay>, tokio::sync::mpsc::UnboundedReceiver<SessionEvent>) {
        let counter = RepCounter::new(ExerciseProfile::for_kind(kind, &ExercisesConfig::default()));
        let (sink, rx) = ChannelSink::new();
        (FramePipeline::new(counter, sink, LastOverlay::default(), false), rx)
    }

    #[test]
    fn test_counts_and_notifies() {
        let (mut p, mut rx) = pipeline(ExerciseKind::Curl);
        let start = Instant::now();
        for (i, angle) in [160.0, 35.0].into_iter().enumerate() {
            let frame = Frame::new(Some(curl_frame(angle, angle)), W, H);
            p.process(&frame, start + Duration::from_secs(i as u64), 0);
        }

        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::Update { reps: 0, stage: "Left: down | Right: down".into() }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::Update { reps: 2, stage: "Left: up | Right: up".into() }
        );
    }

    #[test]
    fn test_overlay_contents() {
        let (mut p, _rx) = pipeline(ExerciseKind::Curl);
        let frame = Frame::new(Some(curl_frame(160.0, 90.0)), W, H);
        p.process(&frame, Instant::now(), 65);

        let overlay = p.renderer().0.as_ref().unwrap();
        assert!(!overlay.points.is_empty());
        assert_eq!(overlay.angles.len(), 2);
        assert_eq!(overlay.angles[0].text(), "160");
        assert_eq!(
            overlay.hud,
            vec!["REPS: 0", "LEFT: down", "RIGHT: ---", "READY: YES", "TIME: 01:05"]
        );
    }

    #[test]
    fn test_ready_line_follows_cooldown() {
        let (mut p, _rx) = pipeline(ExerciseKind::Curl);
        let start = Instant::now();
        p.process(&Frame::new(Some(curl_frame(160.0, 160.0)), W, H), start, 0);
        p.process(&Frame::new(Some(curl_frame(35.0, 35.0)), W, H), start + Duration::from_millis(100), 0);
        let hud = &p.renderer().0.as_ref().unwrap().hud;
        assert_eq!(hud[0], "REPS: 2");
        assert!(hud.contains(&"READY: NO".to_string()), "{hud:?}");

        // クールダウン (1.5秒) 明け
        p.process(&Frame::new(None, W, H), start + Duration::from_secs(2), 2);
        let hud = &p.renderer().0.as_ref().unwrap().hud;
        assert!(hud.contains(&"READY: YES".to_string()), "{hud:?}");
    }

    #[test]
    fn test_single_limb_hud() {
        let (mut p, _rx) = pipeline(ExerciseKind::JumpingJack);
        p.process(&Frame::new(None, W, H), Instant::now(), 0);
        let overlay = p.renderer().0.as_ref().unwrap();
        assert_eq!(overlay.hud[1], "STAGE: ---");
    }

    #[test]
    fn test_missing_landmarks_skip_counting() {
        let (mut p, mut rx) = pipeline(ExerciseKind::Curl);
        let outcome = p.process(&Frame::new(None, W, H), Instant::now(), 3);

        assert!(outcome.is_none());
        assert!(rx.try_recv().is_err());
        let overlay = p.renderer().0.as_ref().unwrap();
        assert!(overlay.points.is_empty());
        assert_eq!(overlay.hud.last().map(String::as_str), Some("TIME: 00:03"));
    }
}
