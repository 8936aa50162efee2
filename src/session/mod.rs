//! ワークアウトセッション
//!
//! フレーム処理 (`pipeline`)、同期ハンドル (`workout`)、
//! tokio タスクで状態を所有する非同期ハンドル (`task`)、結果の保存 (`store`)。

pub mod pipeline;
pub mod store;
pub mod task;
pub mod timer;
pub mod workout;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::config::{Config, ExercisesConfig};
use crate::counter::ExerciseKind;

pub use pipeline::FramePipeline;
pub use store::{JsonlStore, ProgressSummary, WorkoutRecord, WorkoutStore};
pub use task::{spawn_session, SessionHandle};
pub use timer::SessionTimer;
pub use workout::Workout;

/// UI へのコールバック
pub trait UpdateSink {
    /// フレーム処理毎のレップ数とステージ表示
    fn on_update(&mut self, reps: u32, stage: &str);
    /// 1秒毎の経過秒
    fn on_tick(&mut self, elapsed_secs: u64);
}

/// 何もしない
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl UpdateSink for NullSink {
    fn on_update(&mut self, _reps: u32, _stage: &str) {}
    fn on_tick(&mut self, _elapsed_secs: u64) {}
}

/// セッションからの通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Update { reps: u32, stage: String },
    Tick { elapsed_secs: u64 },
}

/// 通知をチャネルへ流す。受信側が閉じていれば捨てる
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl UpdateSink for ChannelSink {
    fn on_update(&mut self, reps: u32, stage: &str) {
        let _ = self.tx.send(SessionEvent::Update {
            reps,
            stage: stage.to_string(),
        });
    }

    fn on_tick(&mut self, elapsed_secs: u64) {
        let _ = self.tx.send(SessionEvent::Tick { elapsed_secs });
    }
}

/// 終了時のスナップショット
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutResult {
    pub exercise: ExerciseKind,
    pub reps: u32,
    pub duration_seconds: u64,
}

impl WorkoutResult {
    pub fn zero(exercise: ExerciseKind) -> Self {
        Self {
            exercise,
            reps: 0,
            duration_seconds: 0,
        }
    }

    pub fn duration_label(&self) -> String {
        format_duration(self.duration_seconds)
    }
}

/// 秒を "MM:SS" に整形（60分以上は分の桁が増える）
pub fn format_duration(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// セッション開始に必要な設定
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub exercises: ExercisesConfig,
    pub tick_period: Duration,
    pub frame_width: u32,
    pub frame_height: u32,
    pub inbox_capacity: usize,
    pub mirror_x: bool,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            exercises: config.exercises.clone(),
            tick_period: config.session.tick_period(),
            frame_width: config.session.frame_width,
            frame_height: config.session.frame_height,
            inbox_capacity: config.session.inbox_capacity.max(1),
            mirror_x: config.debug.mirror_x,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
