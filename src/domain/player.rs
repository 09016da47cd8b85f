/// Player state machine.
///
/// Two orthogonal flags gate everything: `alive` and `movement_allowed`.
/// Death clears both; the post-win freeze clears only `movement_allowed`.
///
/// Frame update order (only while movement is allowed):
///   1. Ground snapshot (previous ← current, current ← sensor)
///   2. Axis deadzone → move_direction
///   3. Facing flip
///   4. Jump (two consecutive grounded ticks, no buffering while airborne)
///   5. Attack (cooldown gate)
///
/// This module decides; `sim::step` applies the decisions to the host.

use crate::config::PlayerConfig;

use super::entity::Facing;
use super::motion;

#[derive(Clone, Debug)]
pub struct PlayerState {
    pub facing: Facing,
    pub move_direction: f32,
    pub grounded: bool,
    pub was_grounded: bool,
    pub alive: bool,
    pub movement_allowed: bool,
    pub jump_queued: bool,
    pub attack_queued: bool,
    /// `None` until the first attack fires.
    pub last_attack_time: Option<f64>,
}

/// What one frame update decided. Applied by the caller.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct FrameDecision {
    /// Vertical velocity to set this frame (instant impulse).
    pub jump_velocity: Option<f32>,
    /// Attack fired this frame, in this direction.
    pub attack: Option<Facing>,
    /// Facing changed this frame.
    pub flipped: bool,
}

impl PlayerState {
    pub fn new(facing: Facing) -> Self {
        PlayerState {
            facing,
            move_direction: 0.0,
            grounded: false,
            was_grounded: false,
            alive: true,
            movement_allowed: true,
            jump_queued: false,
            attack_queued: false,
            last_attack_time: None,
        }
    }

    /// Edge-triggered jump press.
    pub fn queue_jump(&mut self) {
        self.jump_queued = true;
    }

    /// Edge-triggered attack press.
    pub fn queue_attack(&mut self) {
        self.attack_queued = true;
    }

    pub fn frame_update(
        &mut self,
        cfg: &PlayerConfig,
        attack_cooldown: f32,
        grounded_now: bool,
        axis_x: f32,
        now: f64,
    ) -> FrameDecision {
        let mut out = FrameDecision::default();
        if !self.movement_allowed { return out; }

        self.was_grounded = self.grounded;
        self.grounded = grounded_now;

        // No deceleration ramp: below the deadzone the player stops dead.
        self.move_direction = if axis_x.abs() > cfg.deadzone {
            axis_x.clamp(-1.0, 1.0)
        } else {
            0.0
        };

        let facing = Facing::from_sign(self.move_direction, self.facing);
        if facing != self.facing {
            self.facing = facing;
            out.flipped = true;
        }

        if self.jump_queued && self.grounded && self.was_grounded {
            out.jump_velocity = Some(cfg.jump_height);
            self.jump_queued = false;
        }
        if !self.grounded {
            self.jump_queued = false;
        }

        if self.attack_queued && self.attack_ready(attack_cooldown, now) {
            out.attack = Some(self.facing);
            self.attack_queued = false;
            self.last_attack_time = Some(now);
        }

        out
    }

    pub fn attack_ready(&self, cooldown: f32, now: f64) -> bool {
        match self.last_attack_time {
            None => true,
            Some(last) => now >= last + cooldown as f64,
        }
    }

    /// Horizontal velocity the motion integrator should aim for.
    pub fn target_velocity_x(&self, cfg: &PlayerConfig) -> f32 {
        motion::target_velocity_x(self.move_direction, cfg.max_speed, self.grounded, cfg.air_control)
    }

    /// Returns false if the player was already dead.
    pub fn die(&mut self) -> bool {
        if !self.alive { return false; }
        self.alive = false;
        self.halt();
        true
    }

    /// Post-win freeze. Returns false if already frozen (or dead).
    pub fn freeze(&mut self) -> bool {
        if !self.movement_allowed { return false; }
        self.halt();
        true
    }

    fn halt(&mut self) {
        self.movement_allowed = false;
        self.move_direction = 0.0;
        self.jump_queued = false;
        self.attack_queued = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> PlayerConfig {
        PlayerConfig::default()
    }

    const COOLDOWN: f32 = 0.3;

    /// Player that has been standing on ground for a couple of frames.
    fn standing() -> PlayerState {
        let mut p = PlayerState::new(Facing::Right);
        p.frame_update(&cfg(), COOLDOWN, true, 0.0, 0.0);
        p.frame_update(&cfg(), COOLDOWN, true, 0.0, 0.0);
        p
    }

    #[test]
    fn deadzone_snaps_to_zero() {
        let mut p = standing();
        p.frame_update(&cfg(), COOLDOWN, true, 0.09, 0.1);
        assert_eq!(p.move_direction, 0.0);
        p.frame_update(&cfg(), COOLDOWN, true, -0.1, 0.2);
        assert_eq!(p.move_direction, 0.0);
        p.frame_update(&cfg(), COOLDOWN, true, 0.4, 0.3);
        assert_eq!(p.move_direction, 0.4);
        p.frame_update(&cfg(), COOLDOWN, true, 0.0, 0.4);
        assert_eq!(p.move_direction, 0.0);
    }

    #[test]
    fn facing_flips_only_on_nonzero_opposite_input() {
        let mut p = standing();
        let d = p.frame_update(&cfg(), COOLDOWN, true, -1.0, 0.1);
        assert!(d.flipped);
        assert_eq!(p.facing, Facing::Left);
        let d = p.frame_update(&cfg(), COOLDOWN, true, 0.0, 0.2);
        assert!(!d.flipped);
        assert_eq!(p.facing, Facing::Left);
        let d = p.frame_update(&cfg(), COOLDOWN, true, -0.5, 0.3);
        assert!(!d.flipped);
    }

    #[test]
    fn jump_fires_after_two_grounded_ticks() {
        let mut p = standing();
        p.queue_jump();
        let d = p.frame_update(&cfg(), COOLDOWN, true, 0.0, 0.1);
        assert_eq!(d.jump_velocity, Some(6.5));
        assert!(!p.jump_queued);
    }

    #[test]
    fn jump_waits_one_tick_after_landing() {
        let mut p = PlayerState::new(Facing::Right);
        p.frame_update(&cfg(), COOLDOWN, false, 0.0, 0.0);
        p.queue_jump();
        // Landing tick: grounded now but not on the previous tick.
        let d = p.frame_update(&cfg(), COOLDOWN, true, 0.0, 0.1);
        assert_eq!(d.jump_velocity, None);
        assert!(p.jump_queued);
        let d = p.frame_update(&cfg(), COOLDOWN, true, 0.0, 0.2);
        assert_eq!(d.jump_velocity, Some(6.5));
    }

    #[test]
    fn airborne_jump_is_discarded_not_buffered() {
        let mut p = PlayerState::new(Facing::Right);
        p.frame_update(&cfg(), COOLDOWN, false, 0.0, 0.0);
        p.queue_jump();
        let d = p.frame_update(&cfg(), COOLDOWN, false, 0.0, 0.1);
        assert_eq!(d.jump_velocity, None);
        assert!(!p.jump_queued);
        // Landing afterwards must not fire the old request.
        p.frame_update(&cfg(), COOLDOWN, true, 0.0, 0.2);
        let d = p.frame_update(&cfg(), COOLDOWN, true, 0.0, 0.3);
        assert_eq!(d.jump_velocity, None);
    }

    #[test]
    fn single_frame_sensor_dropout_blocks_jump() {
        let mut p = standing();
        p.frame_update(&cfg(), COOLDOWN, false, 0.0, 0.1);
        p.queue_jump();
        let d = p.frame_update(&cfg(), COOLDOWN, true, 0.0, 0.2);
        assert_eq!(d.jump_velocity, None);
    }

    #[test]
    fn attack_spam_respects_cooldown() {
        let mut p = standing();
        let mut fired = vec![];
        // 60 frames of 10 ms with the attack pressed every frame.
        for i in 0..60 {
            let now = 0.01 * i as f64;
            p.queue_attack();
            if p.frame_update(&cfg(), COOLDOWN, true, 0.0, now).attack.is_some() {
                fired.push(now);
            }
        }
        assert!(fired.len() >= 2);
        for pair in fired.windows(2) {
            assert!(pair[1] - pair[0] >= COOLDOWN as f64 - 1e-9);
        }
    }

    #[test]
    fn first_attack_fires_immediately_in_facing_direction() {
        let mut p = standing();
        p.frame_update(&cfg(), COOLDOWN, true, -1.0, 0.0);
        p.queue_attack();
        let d = p.frame_update(&cfg(), COOLDOWN, true, 0.0, 0.01);
        assert_eq!(d.attack, Some(Facing::Left));
        assert_eq!(p.last_attack_time, Some(0.01));
    }

    #[test]
    fn queued_attack_fires_once_cooldown_elapses() {
        let mut p = standing();
        p.queue_attack();
        assert!(p.frame_update(&cfg(), COOLDOWN, true, 0.0, 1.0).attack.is_some());
        p.queue_attack();
        assert!(p.frame_update(&cfg(), COOLDOWN, true, 0.0, 1.1).attack.is_none());
        assert!(p.attack_queued);
        assert!(p.frame_update(&cfg(), COOLDOWN, true, 0.0, 1.31).attack.is_some());
    }

    #[test]
    fn death_stops_everything() {
        let mut p = standing();
        p.frame_update(&cfg(), COOLDOWN, true, 1.0, 0.1);
        p.queue_jump();
        assert!(p.die());
        assert!(!p.alive);
        assert!(!p.movement_allowed);
        assert_eq!(p.move_direction, 0.0);
        assert!(!p.die());
        let d = p.frame_update(&cfg(), COOLDOWN, true, 1.0, 0.2);
        assert_eq!(d, FrameDecision::default());
        assert_eq!(p.move_direction, 0.0);
    }

    #[test]
    fn freeze_keeps_player_alive() {
        let mut p = standing();
        assert!(p.freeze());
        assert!(p.alive);
        assert!(!p.movement_allowed);
        assert!(!p.freeze());
        // Dying after a freeze still registers.
        assert!(p.die());
    }

    #[test]
    fn target_velocity_uses_air_control_when_airborne() {
        let mut p = PlayerState::new(Facing::Right);
        p.frame_update(&cfg(), COOLDOWN, false, 1.0, 0.0);
        assert!((p.target_velocity_x(&cfg()) - 1.7).abs() < 1e-6);
    }
}
