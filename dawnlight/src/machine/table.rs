//! Event → next-state lookup.

use std::collections::HashMap;

use super::StateId;
use crate::types::{ButtonId, Event};

/// Transition table keyed on `(state, event)`. Wired once at startup and
/// read-only afterwards.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    edges: HashMap<(StateId, Event), StateId>,
}

impl TransitionTable {
    pub fn empty() -> Self {
        Self {
            edges: HashMap::new(),
        }
    }

    /// The installation's transition table.
    ///
    /// | State      | click-A | click-B  | hold-U | day-trigger | night-trigger |
    /// |------------|---------|----------|--------|-------------|---------------|
    /// | Off        | Day     | ClockDay |        |             |               |
    /// | Day        | Night   |          | Off    |             |               |
    /// | Night      | Day     |          | Off    |             |               |
    /// | ClockDay   |         |          | Off    |             | ClockNight    |
    /// | ClockNight |         |          | Off    | ClockDay    |               |
    ///
    /// plus `Start --auto--> Off` and `* --shutdown--> Finish` for every
    /// non-terminal state.
    pub fn canonical() -> Self {
        use StateId::*;

        let click_a = Event::click(ButtonId::A);
        let click_b = Event::click(ButtonId::B);
        let hold_u = Event::hold(ButtonId::U);

        let mut table = Self::empty()
            .with(Start, Event::auto(), Off)
            .with(Off, click_a, Day)
            .with(Off, click_b, ClockDay)
            .with(Day, click_a, Night)
            .with(Day, hold_u, Off)
            .with(Night, click_a, Day)
            .with(Night, hold_u, Off)
            .with(ClockDay, hold_u, Off)
            .with(ClockDay, Event::night_trigger(), ClockNight)
            .with(ClockNight, hold_u, Off)
            .with(ClockNight, Event::day_trigger(), ClockDay);

        for state in [Off, Day, Night, ClockDay, ClockNight] {
            table = table.with(state, Event::shutdown(), Finish);
        }

        table
    }

    pub fn with(mut self, from: StateId, event: Event, to: StateId) -> Self {
        self.edges.insert((from, event), to);
        self
    }

    /// Next state for `event` in `state`, or `None` if the event does not
    /// apply there.
    pub fn next(&self, state: StateId, event: &Event) -> Option<StateId> {
        self.edges.get(&(state, *event)).copied()
    }

    /// Events that `state` reacts to.
    pub fn events_for(&self, state: StateId) -> impl Iterator<Item = &Event> {
        self.edges
            .keys()
            .filter(move |(from, _)| *from == state)
            .map(|(_, event)| event)
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::canonical()
    }
}
