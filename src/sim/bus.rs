/// Outcome broadcaster. Owned by the world; subscribers are registered
/// explicitly and notified synchronously, in subscription order.

use crossbeam_channel::Sender;
use tracing::info;

use super::event::Outcome;

pub trait OutcomeListener {
    fn on_outcome(&mut self, outcome: Outcome);
}

/// Forward outcomes into a channel. A dropped receiver is not an error.
impl OutcomeListener for Sender<Outcome> {
    fn on_outcome(&mut self, outcome: Outcome) {
        let _ = self.send(outcome);
    }
}

#[derive(Default)]
pub struct OutcomeBus {
    listeners: Vec<Box<dyn OutcomeListener>>,
    time_ran_out: bool,
    game_won: bool,
}

impl OutcomeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Box<dyn OutcomeListener>) {
        self.listeners.push(listener);
    }

    /// Deliver `outcome` to every subscriber. Returns false, and delivers
    /// nothing, if it already fired this life.
    pub fn publish(&mut self, outcome: Outcome) -> bool {
        let latch = match outcome {
            Outcome::TimeRanOut => &mut self.time_ran_out,
            Outcome::GameWon => &mut self.game_won,
        };
        if *latch { return false; }
        *latch = true;

        info!(?outcome, listeners = self.listeners.len(), "outcome");
        for listener in self.listeners.iter_mut() {
            listener.on_outcome(outcome);
        }
        true
    }

    pub fn has_fired(&self, outcome: Outcome) -> bool {
        match outcome {
            Outcome::TimeRanOut => self.time_ran_out,
            Outcome::GameWon => self.game_won,
        }
    }

    /// Re-arm both outcomes. Subscribers stay registered.
    pub fn reset(&mut self) {
        self.time_ran_out = false;
        self.game_won = false;
    }
}
