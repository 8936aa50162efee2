use std::time::{Duration, Instant};

use anyhow::{bail, Result};

use workout_reps::config::Config;
use workout_reps::counter::ExerciseKind;
use workout_reps::logging;
use workout_reps::pose::read_recording;
use workout_reps::render::MinifbRenderer;
use workout_reps::session::{format_duration, SessionSettings, UpdateSink, Workout};

const CONFIG_PATH: &str = "rep_server.toml";

/// レップ数かステージが変わった時だけログに出す
#[derive(Default)]
struct LogSink {
    last: Option<(u32, String)>,
}

impl UpdateSink for LogSink {
    fn on_update(&mut self, reps: u32, stage: &str) {
        if self.last.as_ref().map(|(r, s)| (*r, s.as_str())) != Some((reps, stage)) {
            tracing::info!("reps: {} stage: {}", reps, stage);
            self.last = Some((reps, stage.to_string()));
        }
    }

    fn on_tick(&mut self, elapsed_secs: u64) {
        tracing::debug!("time: {}", format_duration(elapsed_secs));
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let Some(recording_path) = args.get(1) else {
        bail!("usage: rep_viewer <recording.jsonl> [lifting|lunges|jumping-jacks|leg-lifts]");
    };
    let exercise = args
        .get(2)
        .map(|id| ExerciseKind::from_id(id))
        .unwrap_or(ExerciseKind::Curl);

    let config = Config::load_or_default(CONFIG_PATH)?;
    logging::init("rep_viewer", &config.server.log_dir, config.debug.verbose)?;

    let recording = read_recording(recording_path)?;
    tracing::info!("{}: {} frames, exercise: {}", recording_path, recording.len(), exercise.display_name());

    let settings = SessionSettings::from_config(&config);
    let (w, h) = (settings.frame_width, settings.frame_height);
    let renderer = MinifbRenderer::new("rep_viewer", w as usize, h as usize)?;

    let start = Instant::now();
    let mut workout = Workout::start(exercise, &settings, LogSink::default(), renderer, start);

    for recorded in &recording {
        if !workout.renderer().is_open() {
            break;
        }
        let due = start + recorded.offset();
        let now = Instant::now();
        if due > now {
            std::thread::sleep(due - now);
        }
        workout.process_frame(&recorded.to_frame(w, h), due);
        workout.tick(due);
    }

    // 最後のフレームを少し表示しておく
    std::thread::sleep(Duration::from_millis(500));

    let result = workout.stop(Instant::now());
    tracing::info!(
        "{}: {} reps in {}",
        result.exercise.display_name(),
        result.reps,
        result.duration_label()
    );
    Ok(())
}
