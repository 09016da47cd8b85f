/// End-of-level presenter: popups, music switches and scene requests.
///
/// Loss (time ran out or player killed) switches to the game-over track at
/// once and raises the popup after `game_over_delay`, leaving room for the
/// death animation. A win only shows if the game was not already lost.

use tracing::info;

use super::event::GameEvent;
use super::ports::{MusicTrack, Sinks};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EndScreen {
    GameOver,
    Victory,
}

/// Scene loads requested from the end screens, by build index.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SceneRequest {
    MainMenu,
    FirstLevel,
}

impl SceneRequest {
    pub fn index(self) -> usize {
        match self {
            SceneRequest::MainMenu => 0,
            SceneRequest::FirstLevel => 1,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Presenter {
    delay: f32,
    lost: bool,
    /// Countdown to the game-over popup.
    pending: Option<f32>,
    screen: Option<EndScreen>,
}

impl Presenter {
    pub fn new(game_over_delay: f32) -> Self {
        Presenter { delay: game_over_delay, lost: false, pending: None, screen: None }
    }

    /// Level start: background music on.
    pub fn start(&mut self, sinks: &mut Sinks) {
        sinks.music(MusicTrack::Background, true);
    }

    pub fn on_event(&mut self, event: &GameEvent, sinks: &mut Sinks) {
        match event {
            GameEvent::TimeRanOut | GameEvent::PlayerKilled => {
                // A win is final.
                if self.lost || self.screen == Some(EndScreen::Victory) { return; }
                self.lost = true;
                sinks.music(MusicTrack::GameOver, false);
                self.pending = Some(self.delay);
                info!("game lost, popup in {:.1}s", self.delay);
            }
            GameEvent::GameWon => {
                if self.lost || self.screen.is_some() { return; }
                self.screen = Some(EndScreen::Victory);
                sinks.music(MusicTrack::Victory, true);
                info!("game won");
            }
            _ => {}
        }
    }

    /// Advance the popup delay by one frame.
    pub fn tick(&mut self, dt: f32) {
        if let Some(remaining) = self.pending.as_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                self.pending = None;
                self.screen = Some(EndScreen::GameOver);
            }
        }
    }

    pub fn screen(&self) -> Option<EndScreen> {
        self.screen
    }

    pub fn is_lost(&self) -> bool {
        self.lost
    }

    pub fn exit(&self) -> SceneRequest {
        SceneRequest::MainMenu
    }

    pub fn restart(&self) -> SceneRequest {
        SceneRequest::FirstLevel
    }
}
