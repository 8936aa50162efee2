use std::time::{Duration, Instant};

use crate::counter::{ExerciseKind, ExerciseProfile, ExerciseState, FrameOutcome, RepCounter};
use crate::pose::Frame;
use crate::render::RenderSink;
use crate::session::pipeline::FramePipeline;
use crate::session::timer::SessionTimer;
use crate::session::{SessionSettings, UpdateSink, WorkoutResult};

/// 1回のワークアウト（同期版）
///
/// ホストがフレーム毎に `process_frame`、定期的に `tick` を呼ぶ。
/// `stop` 以降はフレームもティックも無視する。
pub struct Workout<U, R> {
    kind: ExerciseKind,
    pipeline: FramePipeline<U, R>,
    timer: SessionTimer,
    tick_period: Duration,
    next_tick: Instant,
    active: bool,
}

impl<U: UpdateSink, R: RenderSink> Workout<U, R> {
    /// 新しい状態でセッションを開始
    pub fn start(kind: ExerciseKind, settings: &SessionSettings, updates: U, renderer: R, now: Instant) -> Self {
        let counter = RepCounter::new(ExerciseProfile::for_kind(kind, &settings.exercises));
        tracing::info!(exercise = %kind, "workout started");
        Self {
            kind,
            pipeline: FramePipeline::new(counter, updates, renderer, settings.mirror_x),
            timer: SessionTimer::new(now),
            tick_period: settings.tick_period,
            next_tick: now + settings.tick_period,
            active: true,
        }
    }

    pub fn kind(&self) -> ExerciseKind {
        self.kind
    }

    pub fn reps(&self) -> u32 {
        self.pipeline.counter().reps()
    }

    pub fn elapsed_secs(&self, now: Instant) -> u64 {
        if self.active {
            self.timer.elapsed_secs(now)
        } else {
            0
        }
    }

    pub fn state(&self, now: Instant) -> ExerciseState {
        self.pipeline.counter().state(now)
    }

    pub fn renderer(&self) -> &R {
        self.pipeline.renderer()
    }

    pub fn into_sinks(self) -> (U, R) {
        self.pipeline.into_sinks()
    }

    /// 1フレーム処理。停止後は None
    pub fn process_frame(&mut self, frame: &Frame, now: Instant) -> Option<FrameOutcome> {
        if !self.active {
            return None;
        }
        let elapsed = self.timer.elapsed_secs(now);
        self.pipeline.process(frame, now, elapsed)
    }

    /// 期限が来ていれば経過秒を通知する
    ///
    /// 取りこぼした周期はまとめて1回だけ通知する。
    pub fn tick(&mut self, now: Instant) -> Option<u64> {
        if !self.active || now < self.next_tick {
            return None;
        }
        while self.next_tick <= now {
            self.next_tick += self.tick_period;
        }
        let elapsed = self.timer.elapsed_secs(now);
        self.pipeline.updates_mut().on_tick(elapsed);
        Some(elapsed)
    }

    /// 停止して結果を返す。2回目以降はゼロの結果
    pub fn stop(&mut self, now: Instant) -> WorkoutResult {
        if !self.active {
            return WorkoutResult::zero(self.kind);
        }
        let result = WorkoutResult {
            exercise: self.kind,
            reps: self.pipeline.counter().reps(),
            duration_seconds: self.timer.elapsed_secs(now),
        };
        self.active = false;
        self.pipeline.counter_mut().reset();
        tracing::info!(
            exercise = %self.kind,
            reps = result.reps,
            duration = result.duration_seconds,
            "workout stopped"
        );
        result
    }
}
