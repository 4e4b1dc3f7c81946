//! Per-variant ignore filter applied at callback time.

use crate::container::ContainerKind;

/// Which container variants a session discards before queueing.
///
/// An ignored variant is dropped for all three of its event kinds, so its
/// live-set stays permanently empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VariantFilter {
    pub ignore_cursors: bool,
    pub ignore_objects: bool,
    pub ignore_blobs: bool,
}

impl VariantFilter {
    /// A filter that accepts everything.
    pub fn accept_all() -> Self {
        Self::default()
    }

    /// Whether events for `kind` should be discarded.
    pub fn ignores(&self, kind: ContainerKind) -> bool {
        match kind {
            ContainerKind::Cursor => self.ignore_cursors,
            ContainerKind::Object => self.ignore_objects,
            ContainerKind::Blob => self.ignore_blobs,
        }
    }

    /// Whether events for `kind` pass through.
    pub fn accepts(&self, kind: ContainerKind) -> bool {
        !self.ignores(kind)
    }

    /// Variants this filter lets through, in declaration order.
    pub fn accepted_kinds(&self) -> Vec<ContainerKind> {
        ContainerKind::ALL
            .iter()
            .copied()
            .filter(|k| self.accepts(*k))
            .collect()
    }
}
