//! The octopus session: the one owner of the well-being record.
//!
//! Front-ends call the `on_*` entry points; each runs a transition against the
//! store's working copy, persists it right away and then tells every
//! subscriber about the new state. Everything runs on the caller's thread.

use crate::chat::{classify, ChatIntent};
use crate::model::{Note, Transition, WellbeingState};
use crate::scheduler::DecayScheduler;
use crate::storage::{KeyValueStorage, LoadOutcome, StateStore};
use std::time::Instant;

pub type Listener = Box<dyn FnMut(&WellbeingState, Transition)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub struct Session<S: KeyValueStorage> {
    store: StateStore<S>,
    scheduler: DecayScheduler,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl<S: KeyValueStorage> Session<S> {
    pub fn open(
        storage: S,
        key: impl Into<String>,
        scheduler: DecayScheduler,
    ) -> (Self, LoadOutcome) {
        let (store, outcome) = StateStore::open(storage, key);
        (
            Self {
                store,
                scheduler,
                listeners: Vec::new(),
                next_listener: 0,
            },
            outcome,
        )
    }

    pub fn state(&self) -> &WellbeingState {
        self.store.current()
    }

    pub fn store(&self) -> &StateStore<S> {
        &self.store
    }

    pub fn scheduler(&self) -> &DecayScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut DecayScheduler {
        &mut self.scheduler
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&WellbeingState, Transition) + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn on_feed(&mut self) -> WellbeingState {
        self.commit(Transition::Feed)
    }

    pub fn on_give_toy(&mut self) -> WellbeingState {
        self.commit(Transition::GiveToy)
    }

    pub fn on_reset(&mut self) -> WellbeingState {
        self.commit(Transition::Reset)
    }

    pub fn on_note(&mut self, note: Note) -> WellbeingState {
        self.commit(Transition::PlayNote(note))
    }

    /// Only jokes change the record; other chat is left to the front-end.
    pub fn on_chat_text(&mut self, text: &str) -> (Option<ChatIntent>, WellbeingState) {
        let intent = classify(text);
        let state = match intent {
            Some(ChatIntent::Joke) => self.commit(Transition::ChatJoke),
            _ => *self.state(),
        };
        (intent, state)
    }

    pub fn on_decay_tick(&mut self) -> WellbeingState {
        self.commit(Transition::IdleDecay)
    }

    /// Runs idle decay if the scheduler says one is due.
    pub fn pump(&mut self, now: Instant) -> Option<WellbeingState> {
        if self.scheduler.poll(now) {
            Some(self.on_decay_tick())
        } else {
            None
        }
    }

    fn commit(&mut self, transition: Transition) -> WellbeingState {
        self.store.current_mut().apply(transition);
        let state = *self.store.current();
        if let Err(e) = self.store.save(&state) {
            tracing::warn!(transition = transition.name(), error = %e, "failed to persist state");
        }
        tracing::debug!(
            transition = transition.name(),
            hunger = state.hunger,
            happiness = state.happiness,
            toys = state.toys,
            "committed"
        );
        for (_, listener) in self.listeners.iter_mut() {
            listener(&state, transition);
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, DEFAULT_STORAGE_KEY};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    fn session(storage: &MemoryStorage) -> Session<&MemoryStorage> {
        Session::open(storage, DEFAULT_STORAGE_KEY, DecayScheduler::default()).0
    }

    fn persisted(storage: &MemoryStorage) -> WellbeingState {
        crate::storage::decode_state(&storage.raw(DEFAULT_STORAGE_KEY).unwrap()).into_state()
    }

    #[test]
    fn every_entry_point_persists_immediately() {
        let storage = MemoryStorage::new();
        let mut s = session(&storage);

        let st = s.on_feed();
        assert_eq!(persisted(&storage), st);
        let st = s.on_give_toy();
        assert_eq!(persisted(&storage), st);
        let st = s.on_note(Note::A4);
        assert_eq!(persisted(&storage), st);
        let (_, st) = s.on_chat_text("joke please");
        assert_eq!(persisted(&storage), st);
        let st = s.on_decay_tick();
        assert_eq!(persisted(&storage), st);
        let st = s.on_reset();
        assert_eq!(persisted(&storage), WellbeingState::default());
        assert_eq!(st, WellbeingState::default());
    }

    #[test]
    fn subscribers_hear_each_commit_once() {
        let storage = MemoryStorage::new();
        let mut s = session(&storage);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        s.subscribe(move |st, t| sink.borrow_mut().push((*st, t)));

        s.on_feed();
        s.on_give_toy();
        s.on_chat_text("hello");
        s.on_chat_text("so funny");

        let seen = seen.borrow();
        let names: Vec<_> = seen.iter().map(|(_, t)| t.name()).collect();
        assert_eq!(names, ["feed", "give-toy", "chat-joke"]);
        assert_eq!(seen.last().unwrap().0, *s.state());
    }

    #[test]
    fn unsubscribed_listener_goes_quiet() {
        let storage = MemoryStorage::new();
        let mut s = session(&storage);
        let count = Rc::new(RefCell::new(0));
        let c = Rc::clone(&count);
        let id = s.subscribe(move |_, _| *c.borrow_mut() += 1);
        s.on_feed();
        assert!(s.unsubscribe(id));
        assert!(!s.unsubscribe(id));
        s.on_feed();
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn non_joke_chat_leaves_state_alone() {
        let storage = MemoryStorage::new();
        let mut s = session(&storage);
        let (intent, st) = s.on_chat_text("I think you're hungry");
        assert_eq!(intent, Some(ChatIntent::Hungry));
        assert_eq!(st, WellbeingState::default());
        assert_eq!(storage.raw(DEFAULT_STORAGE_KEY), None);
        assert_eq!(s.on_chat_text("  ").0, None);
    }

    #[test]
    fn pump_follows_the_scheduler() {
        let storage = MemoryStorage::new();
        let period = Duration::from_secs(15);
        let (mut s, _) = Session::open(&storage, "k", DecayScheduler::new(period));
        let t0 = Instant::now();
        assert_eq!(s.pump(t0 + period), None);

        s.scheduler_mut().start(t0);
        assert_eq!(s.pump(t0 + period / 2), None);
        let st = s.pump(t0 + period).unwrap();
        assert_eq!(st, WellbeingState::new(23.0, 50.0, 0));

        s.scheduler_mut().stop();
        assert_eq!(s.pump(t0 + period * 5), None);
        assert_eq!(s.state().hunger, 23.0);
    }

    #[test]
    fn decay_interleaves_with_user_actions() {
        let storage = MemoryStorage::with_entry(
            DEFAULT_STORAGE_KEY,
            r#"{"hunger":69,"happiness":50,"toys":0}"#,
        );
        let mut s = session(&storage);
        assert_eq!(s.on_decay_tick(), WellbeingState::new(72.0, 46.0, 0));
        assert_eq!(s.on_feed(), WellbeingState::new(57.0, 54.0, 0));
        assert_eq!(s.on_decay_tick(), WellbeingState::new(60.0, 54.0, 0));
    }
}
