//! Graph entity snapshots received from the backend

mod entity;


pub use entity::{schema, ChildKind, ChildRef, EntityError, EntityResult, GraphEntity};
