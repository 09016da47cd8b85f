/// Shared identities: facing, host body handles, collider handles, contact tags.
/// The host owns the actual bodies; the core only ever holds these handles.

use super::vec2::Vec2;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    /// Facing that matches a signed horizontal quantity. Zero keeps `current`.
    pub fn from_sign(value: f32, current: Facing) -> Facing {
        if value > 0.0 {
            Facing::Right
        } else if value < 0.0 {
            Facing::Left
        } else {
            current
        }
    }

    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    /// Unit direction along the x axis.
    pub fn as_vec(self) -> Vec2 {
        match self {
            Facing::Left => Vec2::LEFT,
            Facing::Right => Vec2::RIGHT,
        }
    }
}

/// Handle to a rigid body owned by the physics host.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct BodyRef(pub u32);

/// Handle to a single collider (a body may own several, e.g. a ground probe).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ColliderId(pub u32);

/// Classification the host attaches to every contact.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ContactTag {
    Ground,
    Player,
    Enemy,
    Pickup,
    Goal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_keeps_current_facing() {
        assert_eq!(Facing::from_sign(0.0, Facing::Left), Facing::Left);
        assert_eq!(Facing::from_sign(0.0, Facing::Right), Facing::Right);
    }

    #[test]
    fn sign_picks_facing() {
        assert_eq!(Facing::from_sign(-0.3, Facing::Right), Facing::Left);
        assert_eq!(Facing::from_sign(0.7, Facing::Left), Facing::Right);
    }

    #[test]
    fn facing_vector_matches_sign() {
        assert_eq!(Facing::Left.as_vec().x, Facing::Left.sign());
        assert_eq!(Facing::Right.as_vec().x, Facing::Right.sign());
    }
}
