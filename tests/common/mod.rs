//! Common test utilities for sync cycle tests
//!
//! Provides a recording backend client and entity fixtures.

pub mod recording_client;

pub use recording_client::{Call, RecordingClient, INBOUND_CAPACITY};

use unisync::{ChildRef, GraphEntity};

/// A note with two outline children and one semantic reference to a
/// separate page.
pub fn project_note() -> GraphEntity {
    GraphEntity::note("0x1", "Project")
        .with_child(ChildRef::subentity(0.0, GraphEntity::note("0x2", "goals")))
        .with_child(ChildRef::semantic(1.0, GraphEntity::note("0x3", "Meeting: Monday")))
        .with_child(ChildRef::subentity(2.0, GraphEntity::note("0x4", "risks")))
}
