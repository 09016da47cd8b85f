pub mod ai;
pub mod attack;
pub mod entity;
pub mod ground;
pub mod motion;
pub mod pickup;
pub mod player;
pub mod vec2;
