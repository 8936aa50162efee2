//! セッション状態を1つの tokio タスクが所有する非同期版
//!
//! フレーム・ティック・停止は全てタスクの受信箱を通して直列化される。
//! フレームはキューに溜めず、受信箱が満杯なら捨てる。

use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::counter::ExerciseKind;
use crate::pose::Frame;
use crate::render::RenderSink;
use crate::session::workout::Workout;
use crate::session::{SessionSettings, UpdateSink, WorkoutResult};

enum Command {
    Frame { frame: Frame, at: Instant },
    Stop {
        at: Instant,
        reply: oneshot::Sender<WorkoutResult>,
    },
}

/// tokio の時計で現在時刻（テストでは一時停止した時計に従う）
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// セッションタスクへのハンドル
pub struct SessionHandle {
    kind: ExerciseKind,
    tx: mpsc::Sender<Command>,
    task: Option<JoinHandle<()>>,
}

/// 所有タスクを起動してハンドルを返す
pub fn spawn_session<U, R>(kind: ExerciseKind, settings: &SessionSettings, updates: U, renderer: R) -> SessionHandle
where
    U: UpdateSink + Send + 'static,
    R: RenderSink + Send + 'static,
{
    let (tx, rx) = mpsc::channel(settings.inbox_capacity.max(1));
    let start = tokio::time::Instant::now();
    let workout = Workout::start(kind, settings, updates, renderer, start.into_std());
    let mut ticker = tokio::time::interval_at(start + settings.tick_period, settings.tick_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let task = tokio::spawn(run_session(workout, rx, ticker));
    SessionHandle {
        kind,
        tx,
        task: Some(task),
    }
}

async fn run_session<U: UpdateSink, R: RenderSink>(
    mut workout: Workout<U, R>,
    mut rx: mpsc::Receiver<Command>,
    mut ticker: tokio::time::Interval,
) {
    loop {
        tokio::select! {
            biased;
            at = ticker.tick() => {
                workout.tick(at.into_std());
            }
            cmd = rx.recv() => match cmd {
                Some(Command::Frame { frame, at }) => {
                    workout.process_frame(&frame, at);
                }
                Some(Command::Stop { at, reply }) => {
                    let _ = reply.send(workout.stop(at));
                    break;
                }
                None => {
                    workout.stop(now());
                    break;
                }
            },
        }
    }
}

impl SessionHandle {
    pub fn kind(&self) -> ExerciseKind {
        self.kind
    }

    /// フレームを渡す。受信箱が満杯か停止済みなら捨てて false
    pub fn submit_frame(&self, frame: Frame) -> bool {
        if self.task.is_none() {
            return false;
        }
        match self.tx.try_send(Command::Frame { frame, at: now() }) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::trace!(exercise = %self.kind, "inbox full, frame dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// 停止して結果を返す。2回目以降はゼロの結果
    ///
    /// 経過時間は呼び出した時点で確定し、受信箱の待ちは含まない。
    pub async fn stop(&mut self) -> WorkoutResult {
        let at = now();
        let Some(task) = self.task.take() else {
            return WorkoutResult::zero(self.kind);
        };
        let (reply, reply_rx) = oneshot::channel();
        if self.tx.send(Command::Stop { at, reply }).await.is_err() {
            tracing::warn!(exercise = %self.kind, "session task already gone");
            return WorkoutResult::zero(self.kind);
        }
        let result = reply_rx.await.unwrap_or_else(|_| WorkoutResult::zero(self.kind));
        if let Err(e) = task.await {
            tracing::warn!("session task failed: {e}");
        }
        result
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
