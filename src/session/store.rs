use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::counter::ExerciseKind;
use crate::session::WorkoutResult;

/// 保存用のワークアウト記録
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    pub session_id: u64,
    pub exercise: ExerciseKind,
    pub reps: u32,
    pub duration_seconds: u64,
    /// RFC 3339
    pub finished_at: String,
}

impl WorkoutRecord {
    pub fn new(session_id: u64, result: &WorkoutResult, finished_at: DateTime<Local>) -> Self {
        Self {
            session_id,
            exercise: result.exercise,
            reps: result.reps,
            duration_seconds: result.duration_seconds,
            finished_at: finished_at.to_rfc3339(),
        }
    }
}

/// 直近何回分でレップ数を平均するか
pub const MOVING_AVERAGE_WINDOW: usize = 7;

/// 保存済み記録の集計
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub total_workouts: u64,
    pub total_reps: u64,
    pub total_duration_seconds: u64,
    /// 直近 `MOVING_AVERAGE_WINDOW` 回のレップ数の平均。記録がなければ 0
    pub recent_average_reps: f64,
}

impl ProgressSummary {
    pub fn from_records(records: &[WorkoutRecord]) -> Self {
        let sorted = sorted_by_finish(records);
        let recent_average_reps = moving_average_reps(&sorted, MOVING_AVERAGE_WINDOW)
            .last()
            .copied()
            .unwrap_or(0.0);
        Self {
            total_workouts: records.len() as u64,
            total_reps: records.iter().map(|r| r.reps as u64).sum(),
            total_duration_seconds: records.iter().map(|r| r.duration_seconds).sum(),
            recent_average_reps,
        }
    }
}

/// 終了時刻順に並べる。時刻が読めない記録は先頭
fn sorted_by_finish(records: &[WorkoutRecord]) -> Vec<WorkoutRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|r| DateTime::parse_from_rfc3339(&r.finished_at).ok());
    sorted
}

/// 各記録までの直近 `window` 回のレップ数の移動平均
pub fn moving_average_reps(records: &[WorkoutRecord], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..records.len())
        .map(|i| {
            let recent = &records[(i + 1).saturating_sub(window)..=i];
            recent.iter().map(|r| r.reps as f64).sum::<f64>() / recent.len() as f64
        })
        .collect()
}

pub trait WorkoutStore {
    fn save(&mut self, record: &WorkoutRecord) -> Result<()>;

    /// 保存済みの記録を全て読む
    fn load_all(&self) -> Result<Vec<WorkoutRecord>>;

    fn summary(&self) -> Result<ProgressSummary> {
        Ok(ProgressSummary::from_records(&self.load_all()?))
    }
}

/// 1行1レコードの JSON Lines ファイルに追記する
#[derive(Debug, Clone)]
pub struct JsonlStore {
    path: PathBuf,
}

impl JsonlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WorkoutStore for JsonlStore {
    fn save(&mut self, record: &WorkoutRecord) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        let line = serde_json::to_string(record)?;
        writeln!(file, "{}", line)?;
        tracing::debug!(session = record.session_id, path = %self.path.display(), "workout saved");
        Ok(())
    }

    /// ファイルが無ければ空
    fn load_all(&self) -> Result<Vec<WorkoutRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = std::fs::File::open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        let mut records = Vec::new();
        for (i, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line)
                .with_context(|| format!("{}: line {}", self.path.display(), i + 1))?;
            records.push(record);
        }
        Ok(records)
    }
}
