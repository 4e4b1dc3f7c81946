//! Consumer-side set of currently live containers.

use crate::container::{Container, ContainerKind, LifecycleEvent, LifecycleKind, SessionId};

/// How one event changed the live-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveSetChange {
    Inserted,
    Replaced,
    Removed,
    /// Removal of an id that was not live.
    Unchanged,
}

/// Ordered collection of live containers, keyed by session id.
///
/// Order is first appearance. The most recent event for an id decides
/// membership: an update for an id that is not live inserts it (the add was
/// filtered or raced a reconnect), a removal erases it. The broker's live
/// list is stricter and only admits ids through an add.
#[derive(Debug, Clone, Default)]
pub struct LiveSet {
    members: Vec<Container>,
}

impl LiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one lifecycle event.
    pub fn apply(&mut self, event: &LifecycleEvent) -> LiveSetChange {
        self.apply_kind(event.kind, event.container)
    }

    /// Apply a lifecycle transition for `container`.
    pub fn apply_kind(&mut self, kind: LifecycleKind, container: Container) -> LiveSetChange {
        let index = self.index_of(container.session_id);
        match (kind, index) {
            (LifecycleKind::Added | LifecycleKind::Updated, Some(i)) => {
                self.members[i] = container;
                LiveSetChange::Replaced
            }
            (LifecycleKind::Added | LifecycleKind::Updated, None) => {
                self.members.push(container);
                LiveSetChange::Inserted
            }
            (LifecycleKind::Removed, Some(i)) => {
                self.members.remove(i);
                LiveSetChange::Removed
            }
            (LifecycleKind::Removed, None) => LiveSetChange::Unchanged,
        }
    }

    fn index_of(&self, id: SessionId) -> Option<usize> {
        self.members.iter().position(|c| c.session_id == id)
    }

    pub fn get(&self, id: SessionId) -> Option<&Container> {
        self.members.iter().find(|c| c.session_id == id)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.index_of(id).is_some()
    }

    /// Copy of every live container of `kind`, in order of first appearance.
    pub fn of_kind(&self, kind: ContainerKind) -> Vec<Container> {
        self.members
            .iter()
            .filter(|c| c.kind() == kind)
            .copied()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Container> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }
}
