//! Change notification
//!
//! Mutations of a [`CompositeCollection`](crate::composite::CompositeCollection)
//! are reported as [`ComponentEvent`]s to every registered observer, which
//! lets a front end redraw only what changed.

use crate::parameters::BoundedValue;

/// A change to a component or to the collection holding it.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentEvent {
    /// A parameter received a new value or new bounds
    ParameterChanged {
        component: String,
        parameter: String,
        value: BoundedValue,
    },
    /// A component was appended
    ComponentAdded { component: String },
    /// A component was removed
    ComponentRemoved { component: String },
    /// A component changed its name
    ComponentRenamed { old: String, new: String },
}

impl ComponentEvent {
    /// Name of the component the event concerns (the new name for renames).
    pub fn component(&self) -> &str {
        match self {
            ComponentEvent::ParameterChanged { component, .. }
            | ComponentEvent::ComponentAdded { component }
            | ComponentEvent::ComponentRemoved { component } => component,
            ComponentEvent::ComponentRenamed { new, .. } => new,
        }
    }
}

/// Handle returned on registration, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(usize);

/// Registered observer callbacks.
#[derive(Default)]
pub struct Observers {
    next_id: usize,
    callbacks: Vec<(ObserverId, Box<dyn FnMut(&ComponentEvent)>)>,
}

impl Observers {
    /// Register a callback.
    pub fn subscribe<F>(&mut self, callback: F) -> ObserverId
    where
        F: FnMut(&ComponentEvent) + 'static,
    {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, Box::new(callback)));
        id
    }

    /// Remove a callback. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(i, _)| *i != id);
        self.callbacks.len() != before
    }

    /// Deliver an event to every callback in registration order.
    pub fn notify(&mut self, event: &ComponentEvent) {
        for (_, callback) in self.callbacks.iter_mut() {
            callback(event);
        }
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Whether no callback is registered.
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.callbacks.len())
            .finish()
    }
}
