//! TCP protocol between a pose source and the rep server.
//!
//! The pose source opens a session, streams landmark frames and stops it.
//! The server answers with rep/stage updates, elapsed-time ticks and the final
//! result. Frames are bincode payloads behind a length prefix.

use bytes::Bytes;
use futures::{Sink, SinkExt, StreamExt};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::counter::ExerciseKind;
use crate::pose::LandmarkSet;
use crate::session::{ProgressSummary, WorkoutResult};

// --- Message types ---

/// Pose source → server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Start a session. Any running session is stopped first.
    Start {
        exercise: ExerciseKind,
        width: u32,
        height: u32,
    },
    /// One frame of `[x, y, visibility]` triples. Empty means no person detected.
    Landmarks {
        timestamp_us: u64,
        landmarks: Vec<[f32; 3]>,
    },
    Stop,
    /// Ask for totals over all saved workouts.
    Progress,
}

impl ClientMessage {
    pub fn landmarks(timestamp_us: u64, set: Option<&LandmarkSet>) -> Self {
        ClientMessage::Landmarks {
            timestamp_us,
            landmarks: set.map(LandmarkSet::to_triples).unwrap_or_default(),
        }
    }
}

/// Server → pose source
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Started { session: u64, exercise: ExerciseKind },
    Update { session: u64, reps: u32, stage: String },
    Tick { session: u64, elapsed_secs: u64 },
    Finished { session: u64, result: WorkoutResult },
    Progress { summary: ProgressSummary },
    Error { message: String },
}

// --- TCP codec helpers ---

pub type MessageStream = Framed<TcpStream, LengthDelimitedCodec>;

/// Create a framed message stream with length-delimited framing.
pub fn message_stream(stream: TcpStream) -> MessageStream {
    let codec = LengthDelimitedCodec::builder()
        .max_frame_length(1024 * 1024) // 1MB
        .new_codec();
    Framed::new(stream, codec)
}

/// Send a serializable message (bincode + length prefix).
pub async fn send_message<T: Serialize>(
    stream: &mut MessageStream,
    msg: &T,
) -> anyhow::Result<()> {
    send_to_sink(stream, msg).await
}

/// Same as `send_message` for any bytes sink, e.g. the write half of a split stream.
pub async fn send_to_sink<S, T>(sink: &mut S, msg: &T) -> anyhow::Result<()>
where
    S: Sink<Bytes, Error = std::io::Error> + Unpin,
    T: Serialize,
{
    let data = bincode::serialize(msg)?;
    sink.send(Bytes::from(data)).await?;
    Ok(())
}

/// Receive and deserialize a message.
pub async fn recv_message<T: DeserializeOwned>(
    stream: &mut MessageStream,
) -> anyhow::Result<T> {
    match stream.next().await {
        Some(Ok(bytes)) => Ok(bincode::deserialize(&bytes)?),
        Some(Err(e)) => Err(e.into()),
        None => Err(anyhow::anyhow!("connection closed")),
    }
}
