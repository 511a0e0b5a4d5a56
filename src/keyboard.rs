//! Global keyboard listener registry.
//!
//! The window delivers every key press to a [`KeyboardHub`]. Views register
//! a listener for as long as they are mounted; the returned
//! [`ListenerGuard`] removes it again on drop.

use crate::controller::Command;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Space,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    /// Focus is in a text field; shortcuts must not fire.
    pub in_text_input: bool,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            in_text_input: false,
        }
    }
}

/// Feed shortcut bound to a key press, if any.
pub fn command_for(event: &KeyEvent) -> Option<Command> {
    if event.in_text_input {
        return None;
    }
    match event.key {
        Key::ArrowRight => Some(Command::Next),
        Key::ArrowLeft => Some(Command::Previous),
        Key::Space => Some(Command::TogglePlay),
        Key::Char('m') | Key::Char('M') => Some(Command::ToggleMute),
        _ => None,
    }
}

/// Returns true when the listener handled the event and the platform's
/// default action (e.g. scroll on space) must be suppressed.
type Listener = Box<dyn FnMut(&KeyEvent) -> bool>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// Dispatcher for window-level key events. Cloning shares the registry.
///
/// Listeners run while the registry is borrowed and must not add or remove
/// listeners themselves.
#[derive(Clone, Default)]
pub struct KeyboardHub {
    registry: Rc<RefCell<Registry>>,
}

impl KeyboardHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, listener: impl FnMut(&KeyEvent) -> bool + 'static) -> ListenerGuard {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, Box::new(listener)));
        tracing::debug!("Key listener {} installed", id);

        ListenerGuard {
            registry: Rc::downgrade(&self.registry),
            id,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.registry.borrow().listeners.len()
    }

    /// Deliver an event to every listener. Returns whether any of them
    /// suppressed the default action.
    pub fn dispatch(&self, event: KeyEvent) -> bool {
        let mut registry = self.registry.borrow_mut();
        let mut prevent_default = false;
        for (_, listener) in registry.listeners.iter_mut() {
            prevent_default |= listener(&event);
        }
        prevent_default
    }
}

/// Keeps a listener installed; dropping it uninstalls the listener.
#[must_use = "the listener is removed as soon as the guard is dropped"]
pub struct ListenerGuard {
    registry: Weak<RefCell<Registry>>,
    id: u64,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        registry
            .borrow_mut()
            .listeners
            .retain(|(id, _)| *id != self.id);
        tracing::debug!("Key listener {} removed", self.id);
    }
}
