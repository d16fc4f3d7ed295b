#![cfg(test)]

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::plugin_system::{
    Plugin, PluginContext, PluginDescriptor, PluginError, PluginId, PluginManager,
    PluginNotification, PluginState,
};

type Journal = Rc<RefCell<Vec<String>>>;

// --- Logger/Metrics pair used across the scenarios ---
struct Logger {
    journal: Journal,
}

impl Plugin for Logger {
    fn activate(&mut self, _context: &Rc<PluginContext>) -> Result<(), PluginError> {
        self.journal.borrow_mut().push("logger up".into());
        Ok(())
    }

    fn deactivate(&mut self, _context: &PluginContext) -> Result<(), PluginError> {
        self.journal.borrow_mut().push("logger down".into());
        Ok(())
    }

    fn on_notify(&mut self, sender: &PluginId, notification: PluginNotification) {
        self.journal
            .borrow_mut()
            .push(format!("logger saw {} {}", sender, notification));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct Metrics {
    journal: Journal,
    logger_seen: bool,
}

impl Plugin for Metrics {
    fn activate(&mut self, context: &Rc<PluginContext>) -> Result<(), PluginError> {
        self.logger_seen = context.get_plugin_as::<Logger, _, _>("Logger", |_| ()).is_some();
        if !self.logger_seen {
            return Err(PluginError::ActivationError("Logger unavailable".into()));
        }
        self.journal.borrow_mut().push("metrics up".into());
        Ok(())
    }

    fn deactivate(&mut self, _context: &PluginContext) -> Result<(), PluginError> {
        self.journal.borrow_mut().push("metrics down".into());
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn logger(journal: &Journal) -> PluginDescriptor {
    let journal = journal.clone();
    PluginDescriptor::builder("Logger")
        .name("Logger")
        .constructor(move || Logger {
            journal: journal.clone(),
        })
        .build()
}

fn metrics(journal: &Journal) -> PluginDescriptor {
    let journal = journal.clone();
    PluginDescriptor::builder("Metrics")
        .name("Metrics")
        .requires("Logger")
        .constructor(move || Metrics {
            journal: journal.clone(),
            logger_seen: false,
        })
        .build()
}

#[test]
fn test_logger_metrics_walkthrough() {
    let journal: Journal = Rc::default();
    let manager = PluginManager::new();
    manager.register(logger(&journal)).unwrap();
    manager.register(metrics(&journal)).unwrap();

    assert!(!manager.activate("Metrics", false).unwrap());
    assert!(manager.activate("Logger", false).unwrap());
    assert!(manager.activate("Metrics", false).unwrap());
    assert!(!manager.deactivate("Logger", false).unwrap());
    assert!(manager.deactivate("Metrics", false).unwrap());
    assert!(manager.deactivate("Logger", false).unwrap());

    assert_eq!(
        *journal.borrow(),
        vec![
            "logger up",
            "logger saw Metrics plugin.created",
            "metrics up",
            "logger saw Metrics plugin.activated",
            "metrics down",
            "logger saw Metrics plugin.deactivated",
            "logger saw Metrics plugin.disposed",
            "logger down",
        ]
    );
}

#[test]
fn test_registration_order_does_not_matter() {
    let journal: Journal = Rc::default();
    let manager = PluginManager::new();
    manager.register(metrics(&journal)).unwrap();
    assert_eq!(manager.state("Metrics"), Some(PluginState::Unresolved));
    manager.register(logger(&journal)).unwrap();
    assert_eq!(manager.state("Metrics"), Some(PluginState::Resolvable));

    assert!(manager.activate("Metrics", true).unwrap());
    assert_eq!(manager.state("Logger"), Some(PluginState::Active));

    let instance = manager.get_plugin("Metrics").unwrap();
    let seen = instance
        .borrow()
        .as_any()
        .downcast_ref::<Metrics>()
        .map(|metrics| metrics.logger_seen);
    assert_eq!(seen, Some(true));
}

#[test]
fn test_restart_after_full_teardown() {
    let journal: Journal = Rc::default();
    let manager = PluginManager::new();
    manager.register(logger(&journal)).unwrap();
    manager.register(metrics(&journal)).unwrap();

    assert!(manager.activate("Metrics", true).unwrap());
    manager.dispose_all();
    assert!(manager.active_plugins().is_empty());

    journal.borrow_mut().clear();
    assert!(manager.activate("Metrics", true).unwrap());
    assert_eq!(
        *journal.borrow(),
        vec![
            "logger up",
            "logger saw Metrics plugin.created",
            "metrics up",
            "logger saw Metrics plugin.activated",
        ]
    );
}
