//! Keyboard shortcuts
//!
//! A `Keymap` binds a single key, or a set of keys sharing one handler, to an
//! action. The first binding that claims a key wins.

use crate::sequencer::SequencerEvent;

type Handler<A> = Box<dyn Fn(&str) -> A + Send + Sync>;

struct Binding<A> {
    keys: Vec<String>,
    handler: Handler<A>,
}

pub struct Keymap<A> {
    bindings: Vec<Binding<A>>,
}

impl<A> Default for Keymap<A> {
    fn default() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }
}

impl<A> Keymap<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind one key to a fixed action
    pub fn on_key(self, key: &str, action: A) -> Self
    where
        A: Clone + Send + Sync + 'static,
    {
        self.on_keys(&[key], move |_| action.clone())
    }

    /// Bind several keys to one handler; the handler sees the pressed key
    pub fn on_keys<F>(mut self, keys: &[&str], handler: F) -> Self
    where
        F: Fn(&str) -> A + Send + Sync + 'static,
    {
        self.bindings.push(Binding {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            handler: Box::new(handler),
        });
        self
    }

    /// Action for `key`, or `None` when nothing is bound
    pub fn dispatch(&self, key: &str) -> Option<A> {
        self.bindings
            .iter()
            .find(|binding| binding.keys.iter().any(|k| k == key))
            .map(|binding| (binding.handler)(key))
    }

    pub fn is_bound(&self, key: &str) -> bool {
        self.bindings
            .iter()
            .any(|binding| binding.keys.iter().any(|k| k == key))
    }
}

/// `1`-`5` rate the current drop, `Enter` / `ArrowDown` confirm it
pub fn survey_keymap() -> Keymap<SequencerEvent> {
    Keymap::new()
        .on_keys(&["1", "2", "3", "4", "5"], |key| {
            SequencerEvent::SelectRating(key.parse().unwrap_or_default())
        })
        .on_keys(&["Enter", "ArrowDown"], |_| SequencerEvent::Confirm)
}
