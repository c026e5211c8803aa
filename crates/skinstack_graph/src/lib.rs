// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene graph model for deformer stacks.
//!
//! This crate provides the read side of the deformer tools:
//! - Node, plug and connection value types
//! - Classification of host connection lists into geometry roles
//! - The [`SceneHost`] capability every host adapter implements
//! - An in-memory host for tests and offline scene files
//! - A read-only graph inspector

pub mod node;
pub mod plug;
pub mod connection;
pub mod classify;
pub mod host;
pub mod scene;
pub mod inspector;

pub use node::{KindTable, Node, NodeKind, NodeName};
pub use plug::{Plug, PlugParseError};
pub use connection::{Connection, ConnectionId, Role};
pub use classify::{classify, Classified, ClassifyError, PlugEnd, RoleLookupError};
pub use host::{Directions, HostError, SceneHost};
pub use scene::{DisplayedMessage, HostCall, InMemoryScene, Link, SceneDocument, SceneError};
pub use inspector::{GraphInspector, InspectError};
