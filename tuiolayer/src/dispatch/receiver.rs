//! Receiver interface and the ordered receiver registry.
//!
//! A [`ReceiverSet`] is an explicit, ordered list of subscribers. While a
//! fan-out or a [`DispatchHold`] is active, registrations and unregistrations
//! are queued and applied once the last hold is released, so a change made
//! from inside a callback only affects later events. Each receiver is invoked in isolation: an error, a panic
//! or a re-entrant call in one receiver is recorded as a [`ReceiverFault`]
//! and the fan-out carries on with the next receiver.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use thiserror::Error;
use tracing::{trace, warn};

use crate::container::{Container, LifecycleKind, SessionId};

/// Anything that wants container lifecycle notifications.
///
/// Callbacks run on the consumer tick, synchronously, in registration order.
pub trait ContainerReceiver {
    fn on_added(&mut self, container: &Container) -> Result<(), ReceiverError>;

    fn on_updated(&mut self, container: &Container) -> Result<(), ReceiverError>;

    fn on_removed(&mut self, container: &Container) -> Result<(), ReceiverError>;

    /// Short name used in logs and fault reports.
    fn name(&self) -> &str {
        "receiver"
    }
}

/// Shared handle to a registered receiver. Identity is pointer identity.
pub type SharedReceiver = Rc<RefCell<dyn ContainerReceiver>>;

/// Wrap a receiver for registration.
///
/// Keep the returned `Rc` to read the receiver's state later; coerce a clone
/// to [`SharedReceiver`] to register it.
pub fn shared<R: ContainerReceiver + 'static>(receiver: R) -> Rc<RefCell<R>> {
    Rc::new(RefCell::new(receiver))
}

/// Why a receiver callback did not complete.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReceiverError {
    /// The receiver reported a failure.
    #[error("{0}")]
    Failed(String),

    /// The receiver panicked; the panic was contained.
    #[error("panicked: {0}")]
    Panicked(String),

    /// The receiver was already running further up the stack.
    #[error("re-entered while already dispatching")]
    Reentrant,
}

impl ReceiverError {
    /// Convenience constructor for [`ReceiverError::Failed`].
    pub fn failed(msg: impl Into<String>) -> Self {
        ReceiverError::Failed(msg.into())
    }
}

/// A receiver fault observed during one fan-out.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiverFault {
    pub receiver: String,
    pub kind: LifecycleKind,
    pub session_id: SessionId,
    pub error: ReceiverError,
}

impl fmt::Display for ReceiverFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "receiver '{}' failed on {} {}: {}",
            self.receiver, self.kind, self.session_id, self.error
        )
    }
}

/// Result of one fan-out.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub kind: LifecycleKind,
    pub session_id: SessionId,
    /// Receivers whose callback completed successfully.
    pub delivered: usize,
    pub faults: Vec<ReceiverFault>,
}

impl DispatchOutcome {
    fn new(kind: LifecycleKind, session_id: SessionId) -> Self {
        Self {
            kind,
            session_id,
            delivered: 0,
            faults: Vec::new(),
        }
    }

    /// Whether every receiver completed successfully.
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }

    /// Total receivers invoked (successful or not).
    pub fn attempted(&self) -> usize {
        self.delivered + self.faults.len()
    }

    /// Fold another outcome for the same event into this one.
    pub fn absorb(&mut self, other: DispatchOutcome) {
        self.delivered += other.delivered;
        self.faults.extend(other.faults);
    }
}

struct Entry {
    receiver: SharedReceiver,
    name: String,
}

/// Registry change made while the set was held.
enum Deferred {
    Register(Entry),
    Unregister(SharedReceiver),
}

/// Ordered, idempotent set of receivers.
pub struct ReceiverSet {
    label: &'static str,
    entries: RefCell<Vec<Entry>>,
    holds: Cell<usize>,
    deferred: RefCell<Vec<Deferred>>,
}

/// Keeps a [`ReceiverSet`]'s membership frozen until dropped.
///
/// Holds nest. Changes queued while any hold is alive are applied, in call
/// order, when the last one is released.
#[must_use = "the set is only frozen while the hold is alive"]
pub struct DispatchHold<'a> {
    set: &'a ReceiverSet,
}

impl Drop for DispatchHold<'_> {
    fn drop(&mut self) {
        let remaining = self.set.holds.get() - 1;
        self.set.holds.set(remaining);
        if remaining == 0 {
            self.set.apply_deferred();
        }
    }
}

impl fmt::Debug for ReceiverSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .entries
            .borrow()
            .iter()
            .map(|e| e.name.clone())
            .collect();
        f.debug_struct("ReceiverSet")
            .field("label", &self.label)
            .field("receivers", &names)
            .field("holds", &self.holds.get())
            .finish()
    }
}

impl ReceiverSet {
    /// Create an empty set. `label` names the owner in log output.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            entries: RefCell::new(Vec::new()),
            holds: Cell::new(0),
            deferred: RefCell::new(Vec::new()),
        }
    }

    /// Append a receiver.
    ///
    /// Registering a receiver that is already present is a no-op that logs a
    /// warning. Returns `true` if the receiver was added. While the set is
    /// held the addition is queued and takes effect when the hold ends.
    pub fn register(&self, receiver: SharedReceiver) -> bool {
        if self.will_contain(&receiver) {
            warn!(
                owner = self.label,
                receiver = %receiver_name(&receiver),
                "Could not add receiver, already registered"
            );
            return false;
        }

        let name = receiver_name(&receiver);
        let entry = Entry { receiver, name };
        if self.is_held() {
            trace!(owner = self.label, receiver = %entry.name, "Receiver registration deferred");
            self.deferred.borrow_mut().push(Deferred::Register(entry));
        } else {
            trace!(owner = self.label, receiver = %entry.name, "Receiver registered");
            self.entries.borrow_mut().push(entry);
        }
        true
    }

    /// Remove a receiver.
    ///
    /// Removing a receiver that is not present is a no-op that logs a
    /// warning. Returns `true` if the receiver was removed. While the set is
    /// held the removal is queued and takes effect when the hold ends.
    pub fn unregister(&self, receiver: &SharedReceiver) -> bool {
        if !self.will_contain(receiver) {
            warn!(
                owner = self.label,
                receiver = %receiver_name(receiver),
                "Could not unregister receiver, does not exist"
            );
            return false;
        }

        if self.is_held() {
            trace!(owner = self.label, "Receiver unregistration deferred");
            self.deferred
                .borrow_mut()
                .push(Deferred::Unregister(Rc::clone(receiver)));
        } else {
            self.remove_entry(receiver);
        }
        true
    }

    fn remove_entry(&self, receiver: &SharedReceiver) {
        let mut entries = self.entries.borrow_mut();
        if let Some(index) = entries
            .iter()
            .position(|e| Rc::ptr_eq(&e.receiver, receiver))
        {
            let entry = entries.remove(index);
            trace!(owner = self.label, receiver = %entry.name, "Receiver unregistered");
        }
    }

    /// Whether `receiver` is currently invoked by fan-outs.
    ///
    /// Changes queued behind a hold are not reflected until it is released.
    pub fn contains(&self, receiver: &SharedReceiver) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|e| Rc::ptr_eq(&e.receiver, receiver))
    }

    /// Membership once every queued change has been applied.
    fn will_contain(&self, receiver: &SharedReceiver) -> bool {
        self.deferred
            .borrow()
            .iter()
            .fold(self.contains(receiver), |present, change| match change {
                Deferred::Register(entry) if Rc::ptr_eq(&entry.receiver, receiver) => true,
                Deferred::Unregister(r) if Rc::ptr_eq(r, receiver) => false,
                _ => present,
            })
    }

    // =========================================================================
    // Holds
    // =========================================================================

    /// Freeze membership until the returned hold is dropped.
    ///
    /// Used to keep one event's whole dispatch, across several sets, on the
    /// membership it started with.
    pub fn hold(&self) -> DispatchHold<'_> {
        self.holds.set(self.holds.get() + 1);
        DispatchHold { set: self }
    }

    /// Whether registry changes are currently being queued.
    pub fn is_held(&self) -> bool {
        self.holds.get() > 0
    }

    fn apply_deferred(&self) {
        let changes: Vec<Deferred> = self.deferred.borrow_mut().drain(..).collect();
        for change in changes {
            match change {
                Deferred::Register(entry) => {
                    trace!(owner = self.label, receiver = %entry.name, "Receiver registered");
                    self.entries.borrow_mut().push(entry);
                }
                Deferred::Unregister(receiver) => self.remove_entry(&receiver),
            }
        }
    }

    /// Number of registered receivers.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether no receivers are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Remove every receiver, including changes queued behind a hold.
    pub fn clear(&self) {
        self.deferred.borrow_mut().clear();
        self.entries.borrow_mut().clear();
    }

    /// Invoke every registered receiver for one event, in registration order.
    ///
    /// The set of receivers invoked is fixed when the call starts, and the
    /// set stays held for the duration of the call. Faults are logged after
    /// the whole fan-out has run and returned in the outcome.
    pub fn fan_out(&self, kind: LifecycleKind, container: &Container) -> DispatchOutcome {
        let _hold = self.hold();
        let targets: Vec<(SharedReceiver, String)> = self
            .entries
            .borrow()
            .iter()
            .map(|e| (Rc::clone(&e.receiver), e.name.clone()))
            .collect();

        let mut outcome = DispatchOutcome::new(kind, container.session_id);

        for (receiver, name) in targets {
            let result = match receiver.try_borrow_mut() {
                Ok(mut guard) => panic::catch_unwind(AssertUnwindSafe(|| {
                    invoke(&mut *guard, kind, container)
                }))
                .unwrap_or_else(|payload| Err(ReceiverError::Panicked(panic_message(payload)))),
                Err(_) => Err(ReceiverError::Reentrant),
            };

            match result {
                Ok(()) => outcome.delivered += 1,
                Err(error) => outcome.faults.push(ReceiverFault {
                    receiver: name,
                    kind,
                    session_id: container.session_id,
                    error,
                }),
            }
        }

        for fault in &outcome.faults {
            warn!(owner = self.label, %fault, "Receiver fault during fan-out");
        }

        outcome
    }
}

fn invoke(
    receiver: &mut dyn ContainerReceiver,
    kind: LifecycleKind,
    container: &Container,
) -> Result<(), ReceiverError> {
    match kind {
        LifecycleKind::Added => receiver.on_added(container),
        LifecycleKind::Updated => receiver.on_updated(container),
        LifecycleKind::Removed => receiver.on_removed(container),
    }
}

fn receiver_name(receiver: &SharedReceiver) -> String {
    match receiver.try_borrow() {
        Ok(r) => r.name().to_string(),
        Err(_) => "<busy>".to_string(),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every callback as "name:kind:id" into a shared log.
    struct Probe {
        name: String,
        log: Rc<RefCell<Vec<String>>>,
        fail_on: Option<LifecycleKind>,
        panic_on: Option<LifecycleKind>,
    }

    impl Probe {
        fn new(name: &str, log: &Rc<RefCell<Vec<String>>>) -> Self {
            Self {
                name: name.to_string(),
                log: Rc::clone(log),
                fail_on: None,
                panic_on: None,
            }
        }

        fn record(&mut self, kind: LifecycleKind, c: &Container) -> Result<(), ReceiverError> {
            if self.panic_on == Some(kind) {
                panic!("probe {} exploded", self.name);
            }
            if self.fail_on == Some(kind) {
                return Err(ReceiverError::failed("probe refused"));
            }
            self.log
                .borrow_mut()
                .push(format!("{}:{}:{}", self.name, kind, c.session_id.value()));
            Ok(())
        }
    }

    impl ContainerReceiver for Probe {
        fn on_added(&mut self, c: &Container) -> Result<(), ReceiverError> {
            self.record(LifecycleKind::Added, c)
        }
        fn on_updated(&mut self, c: &Container) -> Result<(), ReceiverError> {
            self.record(LifecycleKind::Updated, c)
        }
        fn on_removed(&mut self, c: &Container) -> Result<(), ReceiverError> {
            self.record(LifecycleKind::Removed, c)
        }
        fn name(&self) -> &str {
            &self.name
        }
    }

    fn log() -> Rc<RefCell<Vec<String>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    mod registration {
        use super::*;

        #[test]
        fn test_register_is_idempotent() {
            let set = ReceiverSet::new("test");
            let log = log();
            let probe: SharedReceiver = shared(Probe::new("a", &log));

            assert!(set.register(Rc::clone(&probe)));
            assert!(!set.register(Rc::clone(&probe)));
            assert_eq!(set.len(), 1);
        }

        #[test]
        fn test_unregister_absent_is_noop() {
            let set = ReceiverSet::new("test");
            let log = log();
            let probe: SharedReceiver = shared(Probe::new("a", &log));

            assert!(!set.unregister(&probe));
            assert!(set.register(Rc::clone(&probe)));
            assert!(set.unregister(&probe));
            assert!(!set.unregister(&probe));
            assert!(set.is_empty());
        }

        #[test]
        fn test_clear() {
            let set = ReceiverSet::new("test");
            let log = log();
            set.register(shared(Probe::new("a", &log)));
            set.register(shared(Probe::new("b", &log)));
            set.clear();
            assert!(set.is_empty());
        }
    }

    mod fan_out {
        use super::*;

        #[test]
        fn test_registration_order() {
            let set = ReceiverSet::new("test");
            let log = log();
            set.register(shared(Probe::new("a", &log)));
            set.register(shared(Probe::new("b", &log)));
            set.register(shared(Probe::new("c", &log)));

            let outcome = set.fan_out(LifecycleKind::Added, &Container::cursor(1, 0.0, 0.0));

            assert!(outcome.is_clean());
            assert_eq!(outcome.delivered, 3);
            assert_eq!(*log.borrow(), vec!["a:added:1", "b:added:1", "c:added:1"]);
        }

        #[test]
        fn test_empty_set_delivers_nothing() {
            let set = ReceiverSet::new("test");
            let outcome = set.fan_out(LifecycleKind::Removed, &Container::cursor(1, 0.0, 0.0));
            assert_eq!(outcome.attempted(), 0);
        }

        #[test]
        fn test_error_does_not_stop_fan_out() {
            let set = ReceiverSet::new("test");
            let log = log();
            let mut failing = Probe::new("bad", &log);
            failing.fail_on = Some(LifecycleKind::Updated);
            set.register(shared(Probe::new("a", &log)));
            set.register(shared(failing));
            set.register(shared(Probe::new("c", &log)));

            let outcome = set.fan_out(LifecycleKind::Updated, &Container::cursor(4, 0.0, 0.0));

            assert_eq!(outcome.delivered, 2);
            assert_eq!(outcome.faults.len(), 1);
            assert_eq!(outcome.faults[0].receiver, "bad");
            assert_eq!(*log.borrow(), vec!["a:updated:4", "c:updated:4"]);
        }

        #[test]
        fn test_panic_is_contained() {
            let set = ReceiverSet::new("test");
            let log = log();
            let mut exploding = Probe::new("boom", &log);
            exploding.panic_on = Some(LifecycleKind::Added);
            set.register(shared(exploding));
            set.register(shared(Probe::new("after", &log)));

            let outcome = set.fan_out(LifecycleKind::Added, &Container::cursor(2, 0.0, 0.0));

            assert_eq!(outcome.delivered, 1);
            assert!(matches!(
                &outcome.faults[0].error,
                ReceiverError::Panicked(msg) if msg.contains("boom")
            ));
            assert_eq!(*log.borrow(), vec!["after:added:2"]);
        }

        /// Registers another receiver from inside its own callback.
        struct Recruiter {
            set: Rc<ReceiverSet>,
            recruit: Option<SharedReceiver>,
        }

        impl ContainerReceiver for Recruiter {
            fn on_added(&mut self, _c: &Container) -> Result<(), ReceiverError> {
                if let Some(r) = self.recruit.take() {
                    self.set.register(r);
                }
                Ok(())
            }
            fn on_updated(&mut self, _c: &Container) -> Result<(), ReceiverError> {
                Ok(())
            }
            fn on_removed(&mut self, _c: &Container) -> Result<(), ReceiverError> {
                Ok(())
            }
        }

        #[test]
        fn test_registration_during_fan_out_applies_to_next_dispatch() {
            let set = Rc::new(ReceiverSet::new("test"));
            let log = log();
            let late: SharedReceiver = shared(Probe::new("late", &log));
            set.register(shared(Recruiter {
                set: Rc::clone(&set),
                recruit: Some(late),
            }));

            let c = Container::cursor(1, 0.0, 0.0);
            let first = set.fan_out(LifecycleKind::Added, &c);
            assert_eq!(first.delivered, 1);
            assert!(log.borrow().is_empty());
            assert_eq!(set.len(), 2);

            set.fan_out(LifecycleKind::Added, &c);
            assert_eq!(*log.borrow(), vec!["late:added:1"]);
        }

        /// Unregisters a receiver from inside its own callback.
        struct Dismisser {
            set: Rc<ReceiverSet>,
            target: Option<SharedReceiver>,
        }

        impl ContainerReceiver for Dismisser {
            fn on_added(&mut self, _c: &Container) -> Result<(), ReceiverError> {
                if let Some(r) = self.target.take() {
                    assert!(self.set.unregister(&r));
                    assert!(!self.set.unregister(&r), "already queued for removal");
                }
                Ok(())
            }
            fn on_updated(&mut self, _c: &Container) -> Result<(), ReceiverError> {
                Ok(())
            }
            fn on_removed(&mut self, _c: &Container) -> Result<(), ReceiverError> {
                Ok(())
            }
        }

        #[test]
        fn test_unregistration_during_fan_out_applies_to_next_dispatch() {
            let set = Rc::new(ReceiverSet::new("test"));
            let log = log();
            let victim: SharedReceiver = shared(Probe::new("victim", &log));
            set.register(shared(Dismisser {
                set: Rc::clone(&set),
                target: Some(Rc::clone(&victim)),
            }));
            set.register(Rc::clone(&victim));

            let c = Container::cursor(1, 0.0, 0.0);
            set.fan_out(LifecycleKind::Added, &c);
            assert_eq!(*log.borrow(), vec!["victim:added:1"]);
            assert!(!set.contains(&victim));

            set.fan_out(LifecycleKind::Added, &c);
            assert_eq!(log.borrow().len(), 1);
        }

        #[test]
        fn test_nested_holds_apply_on_last_release() {
            let set = ReceiverSet::new("test");
            let log = log();
            let outer = set.hold();
            {
                let _inner = set.hold();
                set.register(shared(Probe::new("a", &log)));
            }
            assert!(set.is_held());
            assert!(set.is_empty());

            drop(outer);
            assert!(!set.is_held());
            assert_eq!(set.len(), 1);
        }

        /// Dispatches into its own set from inside a callback.
        struct Echo {
            set: Rc<ReceiverSet>,
            nested: Option<DispatchOutcome>,
        }

        impl ContainerReceiver for Echo {
            fn on_added(&mut self, c: &Container) -> Result<(), ReceiverError> {
                self.nested = Some(self.set.fan_out(LifecycleKind::Updated, c));
                Ok(())
            }
            fn on_updated(&mut self, _c: &Container) -> Result<(), ReceiverError> {
                Ok(())
            }
            fn on_removed(&mut self, _c: &Container) -> Result<(), ReceiverError> {
                Ok(())
            }
            fn name(&self) -> &str {
                "echo"
            }
        }

        #[test]
        fn test_reentrant_receiver_is_skipped() {
            let set = Rc::new(ReceiverSet::new("test"));
            let echo = shared(Echo {
                set: Rc::clone(&set),
                nested: None,
            });
            set.register(echo.clone());

            let outcome = set.fan_out(LifecycleKind::Added, &Container::cursor(3, 0.0, 0.0));
            assert!(outcome.is_clean());

            let nested = echo.borrow().nested.clone().expect("nested dispatch ran");
            assert_eq!(nested.delivered, 0);
            assert_eq!(nested.faults.len(), 1);
            assert_eq!(nested.faults[0].error, ReceiverError::Reentrant);
            assert_eq!(nested.faults[0].receiver, "echo");
        }
    }

    #[test]
    fn test_fault_display() {
        let fault = ReceiverFault {
            receiver: "mapper".into(),
            kind: LifecycleKind::Removed,
            session_id: SessionId(7),
            error: ReceiverError::failed("stale"),
        };
        assert_eq!(
            fault.to_string(),
            "receiver 'mapper' failed on removed #7: stale"
        );
    }
}
