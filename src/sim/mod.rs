pub mod bus;
pub mod event;
pub mod level;
pub mod ports;
pub mod presentation;
pub mod sandbox;
pub mod step;
pub mod timer;
pub mod world;
