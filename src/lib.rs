/// Clock Runner: the behaviour core of a small time-attack platformer.
///
/// `domain` holds the pure state machines, `sim` wires them to a physics
/// host and presentation sinks through the traits in `sim::ports`.

pub mod config;
pub mod domain;
pub mod error;
pub mod sim;
