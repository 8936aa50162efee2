use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

use super::landmark::LandmarkSet;

/// 姿勢推定から届く1フレーム
///
/// 姿勢が検出されなかったフレームは `landmarks` が None。
#[derive(Debug, Clone)]
pub struct Frame {
    pub landmarks: Option<LandmarkSet>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    pub fn new(landmarks: Option<LandmarkSet>, width: u32, height: u32) -> Self {
        Self {
            landmarks,
            width,
            height,
        }
    }
}

/// 録画ファイルの1行
///
/// `{"t_ms": 33, "landmarks": [[x, y, visibility], ...]}`
/// landmarks が空の行は姿勢なしフレーム。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordedFrame {
    /// 録画開始からの経過ミリ秒
    pub t_ms: u64,
    #[serde(default)]
    pub landmarks: Vec<[f32; 3]>,
}

impl RecordedFrame {
    pub fn offset(&self) -> Duration {
        Duration::from_millis(self.t_ms)
    }

    pub fn to_frame(&self, width: u32, height: u32) -> Frame {
        Frame::new(LandmarkSet::from_triples(&self.landmarks), width, height)
    }
}

/// JSON Lines 形式の録画を読み込む。空行は無視
pub fn read_recording<P: AsRef<Path>>(path: P) -> Result<Vec<RecordedFrame>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    parse_recording(BufReader::new(file))
        .with_context(|| format!("failed to parse {}", path.display()))
}

pub fn parse_recording<R: BufRead>(reader: R) -> Result<Vec<RecordedFrame>> {
    let mut frames = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: RecordedFrame = serde_json::from_str(&line)
            .with_context(|| format!("line {}", lineno + 1))?;
        frames.push(frame);
    }
    Ok(frames)
}
