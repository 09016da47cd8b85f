/// Motion integrator: turns a move direction into a horizontal velocity command.
///
/// Only the x component is ever written. Gravity and jump impulses own y.

use serde::Deserialize;

use super::vec2::Vec2;

/// How the horizontal velocity reaches its target each physics tick.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum MotionPolicy {
    /// Velocity set directly to the target (no inertia).
    Snap,
    /// Velocity closes `blend` of the remaining gap per tick, `blend` in (0, 1].
    Smoothed { blend: f32 },
}

/// Policy name as written in config.toml.
#[derive(Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum MotionKind {
    Snap,
    Smoothed,
}

impl MotionPolicy {
    pub fn from_kind(kind: MotionKind, blend: f32) -> Self {
        match kind {
            MotionKind::Snap => MotionPolicy::Snap,
            MotionKind::Smoothed => MotionPolicy::Smoothed { blend },
        }
    }
}

pub fn target_velocity_x(move_direction: f32, max_speed: f32, grounded: bool, air_control: f32) -> f32 {
    let control = if grounded { 1.0 } else { air_control };
    move_direction * max_speed * control
}

/// Next velocity for one physics tick. `current.y` passes through untouched.
pub fn integrate(policy: MotionPolicy, current: Vec2, target_x: f32) -> Vec2 {
    let x = match policy {
        MotionPolicy::Snap => target_x,
        MotionPolicy::Smoothed { blend } => {
            let blend = blend.clamp(0.0, 1.0);
            current.x + (target_x - current.x) * blend
        }
    };
    current.with_x(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grounded_uses_full_speed() {
        assert_eq!(target_velocity_x(1.0, 3.4, true, 0.5), 3.4);
        assert_eq!(target_velocity_x(-0.5, 4.0, true, 0.5), -2.0);
    }

    #[test]
    fn airborne_scaled_by_air_control() {
        assert!((target_velocity_x(1.0, 3.4, false, 0.5) - 1.7).abs() < 1e-6);
        assert_eq!(target_velocity_x(1.0, 3.4, false, 0.0), 0.0);
    }

    #[test]
    fn snap_reaches_target_immediately_and_keeps_y() {
        let v = integrate(MotionPolicy::Snap, Vec2::new(-3.0, 6.5), 2.0);
        assert_eq!(v, Vec2::new(2.0, 6.5));
    }

    #[test]
    fn smoothed_approaches_without_overshoot() {
        let policy = MotionPolicy::Smoothed { blend: 0.25 };
        let mut v = Vec2::new(0.0, -1.0);
        let mut last_gap = 4.0_f32;
        for _ in 0..40 {
            v = integrate(policy, v, 4.0);
            let gap = 4.0 - v.x;
            assert!(gap >= 0.0 && gap < last_gap);
            assert_eq!(v.y, -1.0);
            last_gap = gap;
        }
        assert!(last_gap < 0.01);
    }

    #[test]
    fn first_smoothed_step_is_one_blend() {
        let v = integrate(MotionPolicy::Smoothed { blend: 0.5 }, Vec2::ZERO, 2.0);
        assert!((v.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn kind_maps_to_policy() {
        assert_eq!(MotionPolicy::from_kind(MotionKind::Snap, 0.3), MotionPolicy::Snap);
        assert_eq!(
            MotionPolicy::from_kind(MotionKind::Smoothed, 0.3),
            MotionPolicy::Smoothed { blend: 0.3 }
        );
    }
}
