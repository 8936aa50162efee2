//! rep_server のコネクション処理
//!
//! 接続毎に最大1セッション。セッション状態は `spawn_session` のタスクが持ち、
//! ここは受信メッセージをハンドルへ渡して結果を送り返すだけ。

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use futures::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use crate::counter::ExerciseKind;
use crate::pose::{Frame, LandmarkSet};
use crate::protocol::{message_stream, send_to_sink, ClientMessage, ServerMessage};
use crate::render::NullRenderer;
use crate::session::{spawn_session, SessionHandle, SessionSettings, UpdateSink, WorkoutRecord, WorkoutResult, WorkoutStore};

/// 全接続で共有する状態
pub struct ServerState<S> {
    pub settings: SessionSettings,
    pub store: Mutex<S>,
    next_session: AtomicU64,
}

impl<S: WorkoutStore> ServerState<S> {
    pub fn new(settings: SessionSettings, store: S) -> Self {
        Self {
            settings,
            store: Mutex::new(store),
            next_session: AtomicU64::new(1),
        }
    }

    fn next_session_id(&self) -> u64 {
        self.next_session.fetch_add(1, Ordering::Relaxed)
    }

    fn progress(&self) -> ServerMessage {
        let summary = match self.store.lock() {
            Ok(store) => store.summary(),
            Err(_) => Err(anyhow::anyhow!("store lock poisoned")),
        };
        match summary {
            Ok(summary) => ServerMessage::Progress { summary },
            Err(e) => {
                tracing::error!("failed to read workouts: {e:#}");
                ServerMessage::Error {
                    message: format!("failed to read workouts: {e}"),
                }
            }
        }
    }

    fn save(&self, session: u64, result: &WorkoutResult) {
        let record = WorkoutRecord::new(session, result, chrono::Local::now());
        let saved = match self.store.lock() {
            Ok(mut store) => store.save(&record),
            Err(_) => Err(anyhow::anyhow!("store lock poisoned")),
        };
        if let Err(e) = saved {
            tracing::error!(session, "failed to save workout: {e:#}");
        }
    }
}

/// セッションの通知をクライアント宛メッセージに変換する
struct ProtocolSink {
    session: u64,
    tx: mpsc::UnboundedSender<ServerMessage>,
}

impl UpdateSink for ProtocolSink {
    fn on_update(&mut self, reps: u32, stage: &str) {
        let _ = self.tx.send(ServerMessage::Update {
            session: self.session,
            reps,
            stage: stage.to_string(),
        });
    }

    fn on_tick(&mut self, elapsed_secs: u64) {
        let _ = self.tx.send(ServerMessage::Tick {
            session: self.session,
            elapsed_secs,
        });
    }
}

struct ActiveSession {
    id: u64,
    handle: SessionHandle,
    width: u32,
    height: u32,
}

/// 接続を受け付け続ける
pub async fn serve<S>(listener: TcpListener, state: Arc<ServerState<S>>) -> Result<()>
where
    S: WorkoutStore + Send + 'static,
{
    loop {
        let (tcp_stream, addr) = listener.accept().await?;
        tcp_stream.set_nodelay(true)?;
        tracing::info!("Client connected: {}", addr);

        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_client(tcp_stream, addr, state).await {
                tracing::warn!("client {} error: {:#}", addr, e);
            }
            tracing::info!("Client disconnected: {}", addr);
        });
    }
}

async fn handle_client<S>(tcp_stream: TcpStream, addr: SocketAddr, state: Arc<ServerState<S>>) -> Result<()>
where
    S: WorkoutStore + Send + 'static,
{
    let (mut sink, mut source) = message_stream(tcp_stream).split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ServerMessage>();

    let writer = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            if let Err(e) = send_to_sink(&mut sink, &msg).await {
                tracing::warn!("send failed: {e}");
                break;
            }
        }
    });

    let mut active: Option<ActiveSession> = None;
    let mut last: Option<(u64, ExerciseKind)> = None;
    let mut dropped_frames: u64 = 0;

    let result = async {
        while let Some(bytes) = source.next().await {
            let msg: ClientMessage = bincode::deserialize(&bytes?)?;
            match msg {
                ClientMessage::Start { exercise, width, height } => {
                    if let Some(session) = active.take() {
                        finish(session, &state, &out_tx).await;
                    }
                    let id = state.next_session_id();
                    let sink = ProtocolSink {
                        session: id,
                        tx: out_tx.clone(),
                    };
                    let handle = spawn_session(exercise, &state.settings, sink, NullRenderer);
                    let (width, height) = if width == 0 || height == 0 {
                        (state.settings.frame_width, state.settings.frame_height)
                    } else {
                        (width, height)
                    };
                    tracing::info!(session = id, exercise = %exercise, %addr, "session started");
                    active = Some(ActiveSession { id, handle, width, height });
                    last = Some((id, exercise));
                    let _ = out_tx.send(ServerMessage::Started { session: id, exercise });
                }
                ClientMessage::Landmarks { landmarks, .. } => {
                    let Some(session) = active.as_ref() else {
                        let _ = out_tx.send(ServerMessage::Error {
                            message: "no active session".to_string(),
                        });
                        continue;
                    };
                    let set = if landmarks.is_empty() {
                        None
                    } else {
                        match LandmarkSet::from_triples(&landmarks) {
                            Some(set) => Some(set),
                            None => {
                                let _ = out_tx.send(ServerMessage::Error {
                                    message: format!("expected 33 landmarks, got {}", landmarks.len()),
                                });
                                continue;
                            }
                        }
                    };
                    if !session.handle.submit_frame(Frame::new(set, session.width, session.height)) {
                        dropped_frames += 1;
                    }
                }
                ClientMessage::Stop => match active.take() {
                    Some(session) => finish(session, &state, &out_tx).await,
                    None => {
                        let (session, exercise) = last.unwrap_or((0, ExerciseKind::Curl));
                        let _ = out_tx.send(ServerMessage::Finished {
                            session,
                            result: WorkoutResult::zero(exercise),
                        });
                    }
                },
                ClientMessage::Progress => {
                    let _ = out_tx.send(state.progress());
                }
            }
        }
        anyhow::Ok(())
    }
    .await;

    if let Some(session) = active.take() {
        finish(session, &state, &out_tx).await;
    }
    if dropped_frames > 0 {
        tracing::info!(%addr, dropped_frames, "frames dropped while session was busy");
    }
    drop(out_tx);
    let _ = writer.await;
    result
}

async fn finish<S: WorkoutStore>(
    mut session: ActiveSession,
    state: &ServerState<S>,
    out_tx: &mpsc::UnboundedSender<ServerMessage>,
) {
    let result = session.handle.stop().await;
    state.save(session.id, &result);
    tracing::info!(
        session = session.id,
        reps = result.reps,
        duration = %result.duration_label(),
        "session finished"
    );
    let _ = out_tx.send(ServerMessage::Finished {
        session: session.id,
        result,
    });
}
