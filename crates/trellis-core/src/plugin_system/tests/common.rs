#![cfg(test)]

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::plugin_system::context::PluginContext;
use crate::plugin_system::descriptor::{PluginDescriptor, PluginId};
use crate::plugin_system::traits::{Plugin, PluginError, PluginNotification};

/// Shared event log the mock plugins write into
pub type Tracker = Rc<RefCell<Vec<String>>>;

pub fn tracker() -> Tracker {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn entries(tracker: &Tracker) -> Vec<String> {
    tracker.borrow().clone()
}

/// Only the entries starting with `prefix`
pub fn entries_with(tracker: &Tracker, prefix: &str) -> Vec<String> {
    tracker
        .borrow()
        .iter()
        .filter(|entry| entry.starts_with(prefix))
        .cloned()
        .collect()
}

// --- Mock Plugin recording every hook ---
pub struct MockPlugin {
    pub id: String,
    tracker: Tracker,
    fail_activate: bool,
    fail_deactivate: bool,
}

impl MockPlugin {
    pub fn new(id: &str, tracker: &Tracker) -> Self {
        Self {
            id: id.to_string(),
            tracker: tracker.clone(),
            fail_activate: false,
            fail_deactivate: false,
        }
    }

    pub fn failing_activation(mut self) -> Self {
        self.fail_activate = true;
        self
    }

    pub fn failing_deactivation(mut self) -> Self {
        self.fail_deactivate = true;
        self
    }

    fn record(&self, entry: String) {
        self.tracker.borrow_mut().push(entry);
    }
}

impl Plugin for MockPlugin {
    fn activate(&mut self, _context: &Rc<PluginContext>) -> Result<(), PluginError> {
        self.record(format!("activate:{}", self.id));
        if self.fail_activate {
            return Err(PluginError::ActivationError(format!("{} refused to start", self.id)));
        }
        Ok(())
    }

    fn deactivate(&mut self, _context: &PluginContext) -> Result<(), PluginError> {
        self.record(format!("deactivate:{}", self.id));
        if self.fail_deactivate {
            return Err(PluginError::DeactivationError(format!("{} refused to stop", self.id)));
        }
        Ok(())
    }

    fn on_notify(&mut self, sender: &PluginId, notification: PluginNotification) {
        self.record(format!("notify:{}<-{}:{}", self.id, sender, notification.name()));
    }

    fn dispose(&mut self) {
        self.record(format!("dispose:{}", self.id));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Descriptor for a [`MockPlugin`] with the given hard dependencies
pub fn mock_descriptor(id: &str, requires: &[&str], tracker: &Tracker) -> PluginDescriptor {
    let mut builder = PluginDescriptor::builder(id).name(&format!("Mock {}", id));
    for dep in requires {
        builder = builder.requires(*dep);
    }
    let plugin_id = id.to_string();
    let tracker = tracker.clone();
    builder
        .constructor(move || MockPlugin::new(&plugin_id, &tracker))
        .build()
}
