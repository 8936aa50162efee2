use std::time::{Duration, Instant};

use super::stage::Stage;

/// 1フレーム分の判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Observation {
    /// 伸展側の条件を満たした
    pub extended: bool,
    /// 屈曲側の条件を満たした
    pub contracted: bool,
}

/// 四肢ごとのヒステリシス状態機械
///
/// Unknown → Down → Up → Down → ... と遷移し、Down → Up の時だけ1レップ数える。
/// クールダウンは期限の Instant で持つので、後から発火するタイマーは存在しない。
#[derive(Debug, Clone, Default)]
pub struct LimbTracker {
    stage: Stage,
    cooldown_until: Option<Instant>,
}

impl LimbTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// `now` の時点でクールダウン中か
    pub fn cooldown_active(&self, now: Instant) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }

    /// 観測で状態を進める。レップが数えられたら true
    pub fn advance(
        &mut self,
        obs: Observation,
        now: Instant,
        cooldown: Duration,
        rearm_on_down: bool,
    ) -> bool {
        if obs.extended {
            self.stage = Stage::Down;
            if rearm_on_down {
                self.cooldown_until = None;
            }
            return false;
        }

        if obs.contracted && self.stage == Stage::Down && !self.cooldown_active(now) {
            self.stage = Stage::Up;
            self.cooldown_until = Some(now + cooldown);
            return true;
        }

        false
    }

    pub fn reset(&mut self) {
        self.stage = Stage::Unknown;
        self.cooldown_until = None;
    }
}
