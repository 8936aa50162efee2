use std::time::Instant;

/// セッション経過時間
///
/// 経過秒は常に開始時刻からの差で求め、差分の積算はしない。
#[derive(Debug, Clone, Copy)]
pub struct SessionTimer {
    start: Instant,
}

impl SessionTimer {
    pub fn new(start: Instant) -> Self {
        Self { start }
    }

    /// floor((now - start) / 1s)。開始前の時刻は0
    pub fn elapsed_secs(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.start).as_secs()
    }
}
