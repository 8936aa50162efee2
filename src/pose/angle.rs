//! 関節角度の計算
//!
//! 頂点 b から a, c へのベクトルの極角差を 0〜180° に正規化して返す。

/// これより短いベクトルは向きが定まらないものとして扱う（ピクセル単位）
const MIN_SEGMENT_LENGTH: f32 = 1e-4;

/// 頂点 `b` における角度（度）。退化した入力では `None`
pub fn checked_joint_angle(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> Option<f32> {
    let finite = [a.0, a.1, b.0, b.1, c.0, c.1].iter().all(|v| v.is_finite());
    if !finite {
        return None;
    }

    let ba = (a.0 - b.0, a.1 - b.1);
    let bc = (c.0 - b.0, c.1 - b.1);
    if ba.0.hypot(ba.1) < MIN_SEGMENT_LENGTH || bc.0.hypot(bc.1) < MIN_SEGMENT_LENGTH {
        return None;
    }

    let radians = bc.1.atan2(bc.0) - ba.1.atan2(ba.0);
    let angle = radians.to_degrees().abs();
    Some(if angle > 180.0 { 360.0 - angle } else { angle })
}

/// 頂点 `b` における角度（度, 0〜180）
///
/// 退化した入力（長さ0の腕、非有限値）では 0.0 を返す。
/// 閾値判定には `checked_joint_angle` を使うこと。
pub fn joint_angle(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> f32 {
    checked_joint_angle(a, b, c).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_straight_line() {
        let angle = joint_angle((0.0, 0.0), (50.0, 0.0), (100.0, 0.0));
        assert!(approx_eq(angle, 180.0));
    }

    #[test]
    fn test_right_angle() {
        let angle = joint_angle((0.0, 0.0), (50.0, 0.0), (50.0, 50.0));
        assert!(approx_eq(angle, 90.0));
    }

    #[test]
    fn test_folded() {
        let angle = joint_angle((100.0, 0.0), (0.0, 0.0), (100.0, 0.0));
        assert!(approx_eq(angle, 0.0));
    }

    #[test]
    fn test_reflex_is_reflected() {
        // a は -170°, c は +170° 方向: 極角差 340° → 20°
        let (s, c) = 170f32.to_radians().sin_cos();
        let angle = joint_angle((c, -s), (0.0, 0.0), (c, s));
        assert!(approx_eq(angle, 20.0), "angle = {angle}");
    }

    #[test]
    fn test_order_of_outer_points_does_not_matter() {
        let a = (10.0, 40.0);
        let b = (30.0, 30.0);
        let c = (60.0, 5.0);
        assert!(approx_eq(joint_angle(a, b, c), joint_angle(c, b, a)));
    }

    #[test]
    fn test_result_range() {
        let points = [(0.0, 0.0), (3.0, 7.0), (-5.0, 2.0), (8.0, -4.0), (-1.0, -9.0)];
        for &a in &points {
            for &c in &points {
                if let Some(angle) = checked_joint_angle(a, (1.0, 1.0), c) {
                    assert!((0.0..=180.0).contains(&angle), "angle = {angle}");
                }
            }
        }
    }

    #[test]
    fn test_degenerate_segment() {
        assert_eq!(checked_joint_angle((5.0, 5.0), (5.0, 5.0), (10.0, 5.0)), None);
        assert_eq!(joint_angle((5.0, 5.0), (5.0, 5.0), (10.0, 5.0)), 0.0);
    }

    #[test]
    fn test_non_finite_input() {
        assert_eq!(checked_joint_angle((f32::NAN, 0.0), (1.0, 1.0), (2.0, 0.0)), None);
        assert_eq!(checked_joint_angle((0.0, 0.0), (1.0, f32::INFINITY), (2.0, 0.0)), None);
        assert_eq!(joint_angle((f32::NAN, 0.0), (1.0, 1.0), (2.0, 0.0)), 0.0);
    }
}
