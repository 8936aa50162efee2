use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub debug: DebugConfig,
    #[serde(default)]
    pub exercises: ExercisesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// 待ち受けアドレス
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// ワークアウト結果の保存先 (JSON Lines)
    #[serde(default = "default_results_path")]
    pub results_path: String,
    /// ログ出力ディレクトリ
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

fn default_listen_addr() -> String { "0.0.0.0:9100".to_string() }
fn default_results_path() -> String { "workouts.jsonl".to_string() }
fn default_log_dir() -> String { "logs".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            results_path: default_results_path(),
            log_dir: default_log_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// 経過時間の通知間隔（ミリ秒）
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// 角度計算に使うフレーム幅（ピクセル）
    #[serde(default = "default_frame_width")]
    pub frame_width: u32,
    /// 角度計算に使うフレーム高さ（ピクセル）
    #[serde(default = "default_frame_height")]
    pub frame_height: u32,
    /// セッションタスクの受信箱サイズ。溢れたフレームは捨てる
    #[serde(default = "default_inbox_capacity")]
    pub inbox_capacity: usize,
}

fn default_tick_ms() -> u64 { 1000 }
fn default_frame_width() -> u32 { 640 }
fn default_frame_height() -> u32 { 480 }
fn default_inbox_capacity() -> usize { 4 }

impl SessionConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            frame_width: default_frame_width(),
            frame_height: default_frame_height(),
            inbox_capacity: default_inbox_capacity(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    /// オーバーレイを左右反転（セルフィー表示）
    #[serde(default = "default_true")]
    pub mirror_x: bool,
    #[serde(default)]
    pub verbose: bool,
}

fn default_true() -> bool { true }

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            mirror_x: true,
            verbose: false,
        }
    }
}

/// 体の左右
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    #[default]
    Right,
}

/// ヒステリシス判定の閾値
///
/// 下限角度を超えると down、上限角度を下回ると up。
/// 比較が厳密 (>) か包含 (>=) かは種目ごとに固定。
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ThresholdConfig {
    #[serde(default = "default_visibility")]
    pub visibility: f32,
    pub cooldown_ms: u64,
    /// down 判定の角度（伸展側）
    pub down_angle: f32,
    /// up 判定の角度（屈曲側）
    pub up_angle: f32,
    /// down に戻った時点でクールダウンを解除するか
    #[serde(default = "default_true")]
    pub rearm_on_down: bool,
}

fn default_visibility() -> f32 { crate::pose::DEFAULT_VISIBILITY_THRESHOLD }

impl ThresholdConfig {
    pub fn new(cooldown_ms: u64, down_angle: f32, up_angle: f32) -> Self {
        Self {
            visibility: default_visibility(),
            cooldown_ms,
            down_angle,
            up_angle,
            rearm_on_down: true,
        }
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// 角度は 0〜180 の有限値で up < down、可視性は 0〜1
    pub fn validate(&self, name: &str) -> Result<()> {
        for (field, angle) in [("down_angle", self.down_angle), ("up_angle", self.up_angle)] {
            if !angle.is_finite() || !(0.0..=180.0).contains(&angle) {
                bail!("exercises.{name}.{field} must be within 0..=180, got {angle}");
            }
        }
        if self.up_angle >= self.down_angle {
            bail!(
                "exercises.{name}: up_angle ({}) must be below down_angle ({})",
                self.up_angle,
                self.down_angle
            );
        }
        if !self.visibility.is_finite() || !(0.0..=1.0).contains(&self.visibility) {
            bail!("exercises.{name}.visibility must be within 0..=1, got {}", self.visibility);
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LegLiftConfig {
    #[serde(flatten)]
    pub thresholds: ThresholdConfig,
    /// 膝が伸びているとみなす hip-knee-ankle 角度
    #[serde(default = "default_knee_extended_angle")]
    pub knee_extended_angle: f32,
    /// 追跡する脚
    #[serde(default)]
    pub side: Side,
}

fn default_knee_extended_angle() -> f32 { 160.0 }

impl LegLiftConfig {
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate("leg_lift")?;
        let knee = self.knee_extended_angle;
        if !knee.is_finite() || !(0.0..=180.0).contains(&knee) {
            bail!("exercises.leg_lift.knee_extended_angle must be within 0..=180, got {knee}");
        }
        Ok(())
    }
}

impl Default for LegLiftConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdConfig::new(1500, 170.0, 100.0),
            knee_extended_angle: default_knee_extended_angle(),
            side: Side::Right,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExercisesConfig {
    #[serde(default = "default_curl")]
    pub curl: ThresholdConfig,
    #[serde(default = "default_lunge")]
    pub lunge: ThresholdConfig,
    #[serde(default = "default_jumping_jack")]
    pub jumping_jack: ThresholdConfig,
    #[serde(default)]
    pub leg_lift: LegLiftConfig,
}

fn default_curl() -> ThresholdConfig { ThresholdConfig::new(1500, 150.0, 40.0) }
fn default_lunge() -> ThresholdConfig { ThresholdConfig::new(1000, 170.0, 110.0) }
fn default_jumping_jack() -> ThresholdConfig { ThresholdConfig::new(1000, 160.0, 20.0) }

impl ExercisesConfig {
    pub fn validate(&self) -> Result<()> {
        self.curl.validate("curl")?;
        self.lunge.validate("lunge")?;
        self.jumping_jack.validate("jumping_jack")?;
        self.leg_lift.validate()
    }
}

impl Default for ExercisesConfig {
    fn default() -> Self {
        Self {
            curl: default_curl(),
            lunge: default_lunge(),
            jumping_jack: default_jumping_jack(),
            leg_lift: LegLiftConfig::default(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.exercises.validate().context("invalid exercise thresholds")?;
        Ok(config)
    }

    /// ファイルがなければデフォルト設定。あれば読み込んで検証する
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("{} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:9100");
        assert_eq!(config.session.tick_period(), Duration::from_secs(1));
        assert_eq!(config.session.frame_width, 640);
        assert!(config.debug.mirror_x);
        assert_eq!(config.exercises.curl, ThresholdConfig::new(1500, 150.0, 40.0));
        assert_eq!(config.exercises.leg_lift.side, Side::Right);
    }

    #[test]
    fn test_default_visibility_thresholds() {
        let ex = ExercisesConfig::default();
        for t in [&ex.curl, &ex.lunge, &ex.jumping_jack, &ex.leg_lift.thresholds] {
            assert_eq!(t.visibility, 0.6);
            assert!(t.rearm_on_down);
        }
    }

    #[test]
    fn test_override_sections() {
        let config = Config::from_toml(
            r#"
            [session]
            tick_ms = 500

            [exercises.curl]
            cooldown_ms = 800
            down_angle = 155.0
            up_angle = 35.0
            rearm_on_down = false

            [exercises.leg_lift]
            cooldown_ms = 1200
            down_angle = 165.0
            up_angle = 95.0
            side = "left"
            "#,
        )
        .unwrap();
        assert_eq!(config.session.tick_period(), Duration::from_millis(500));
        assert_eq!(config.session.frame_height, 480);
        assert_eq!(config.exercises.curl.cooldown(), Duration::from_millis(800));
        assert!(!config.exercises.curl.rearm_on_down);
        assert_eq!(config.exercises.curl.visibility, 0.6);
        assert_eq!(config.exercises.lunge, ThresholdConfig::new(1000, 170.0, 110.0));
        assert_eq!(config.exercises.leg_lift.side, Side::Left);
        assert_eq!(config.exercises.leg_lift.knee_extended_angle, 160.0);
        assert_eq!(config.exercises.leg_lift.thresholds.up_angle, 95.0);
    }

    #[test]
    fn test_incomplete_threshold_table_is_error() {
        let result = Config::from_toml("[exercises.lunge]\ndown_angle = 160.0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("definitely/not/here.toml").unwrap();
        assert_eq!(config.session.tick_ms, 1000);
    }

    #[test]
    fn test_defaults_are_valid() {
        ExercisesConfig::default().validate().unwrap();
    }

    #[test]
    fn test_inverted_thresholds_are_rejected() {
        // down 150 / up 160 だと 145〜155 の揺れが毎回レップになる
        let result = Config::from_toml(
            r#"
            [exercises.curl]
            cooldown_ms = 1500
            down_angle = 150.0
            up_angle = 160.0
            "#,
        );
        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("up_angle"), "{err:#}");

        let equal = ThresholdConfig::new(1000, 120.0, 120.0);
        assert!(equal.validate("lunge").is_err());
    }

    #[test]
    fn test_non_finite_and_out_of_range_values_are_rejected() {
        let nan_angle = "[exercises.lunge]\ncooldown_ms = 1000\ndown_angle = nan\nup_angle = 110.0\n";
        assert!(Config::from_toml(nan_angle).is_err());

        let wide = "[exercises.jumping_jack]\ncooldown_ms = 1000\ndown_angle = 400.0\nup_angle = 20.0\n";
        assert!(Config::from_toml(wide).is_err());

        let visibility = "[exercises.curl]\ncooldown_ms = 1500\ndown_angle = 150.0\nup_angle = 40.0\nvisibility = 1.5\n";
        assert!(Config::from_toml(visibility).is_err());

        let knee = "[exercises.leg_lift]\ncooldown_ms = 1500\ndown_angle = 170.0\nup_angle = 100.0\nknee_extended_angle = inf\n";
        assert!(Config::from_toml(knee).is_err());
    }

    #[test]
    fn test_invalid_file_is_error_not_default() {
        let path = std::env::temp_dir().join(format!("workout_reps_bad_config_{}.toml", std::process::id()));
        fs::write(&path, "[exercises.curl]\ncooldown_ms = 1500\ndown_angle = 150.0\nup_angle = 160.0\n").unwrap();
        let result = Config::load_or_default(&path);
        let _ = fs::remove_file(&path);
        assert!(result.is_err());
    }

    #[test]
    fn test_bundled_config_matches_defaults() {
        let config = Config::from_toml(include_str!("../rep_server.toml")).unwrap();
        let defaults = ExercisesConfig::default();
        assert_eq!(config.exercises.curl, defaults.curl);
        assert_eq!(config.exercises.lunge, defaults.lunge);
        assert_eq!(config.exercises.jumping_jack, defaults.jumping_jack);
        assert_eq!(config.exercises.leg_lift, defaults.leg_lift);
        assert_eq!(config.session.inbox_capacity, 4);
    }
}
