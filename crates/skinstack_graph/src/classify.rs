// SPDX-License-Identifier: MIT OR Apache-2.0
//! Classification of raw host connection lists.
//!
//! The host returns a flat list of plug paths where each even element is a
//! source and the following odd element its destination. Classification pairs
//! them strictly by position and derives a [`Role`] from the plug that belongs
//! to the focus node, looked up in [`ROLE_TABLE`].

use crate::connection::{Connection, Role};
use crate::node::NodeName;
use crate::plug::{Plug, PlugParseError, INPUT_GEOMETRY, ORIGINAL_GEOMETRY, OUTPUT_GEOMETRY};

/// Which end of a connection a plug sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlugEnd {
    /// Upstream end
    Source,
    /// Downstream end
    Destination,
}

/// Recognized geometry plugs: (role, end of the focus plug, attribute).
///
/// No two entries share an end and attribute, so lookup order is irrelevant.
pub const ROLE_TABLE: [(Role, PlugEnd, &str); 3] = [
    (Role::InputGeometry, PlugEnd::Destination, INPUT_GEOMETRY),
    (Role::OriginalGeometry, PlugEnd::Destination, ORIGINAL_GEOMETRY),
    (Role::OutputGeometry, PlugEnd::Source, OUTPUT_GEOMETRY),
];

/// Look up the role of a focus-node plug
pub fn role_for(end: PlugEnd, attribute: &str) -> Role {
    ROLE_TABLE
        .iter()
        .find(|(_, e, a)| *e == end && *a == attribute)
        .map_or(Role::Unclassified, |(role, _, _)| *role)
}

/// Error for malformed connection lists
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    /// List had an odd number of elements
    #[error("Connection list has an unpaired plug: {0:?}")]
    UnpairedPlug(String),

    /// A plug path could not be parsed
    #[error(transparent)]
    Plug(#[from] PlugParseError),
}

/// Error when looking up a single connection by role
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleLookupError {
    /// No connection has the role
    #[error("no {0} connection")]
    Missing(Role),

    /// More than one connection has the role
    #[error("{count} {role} connections, expected one")]
    Ambiguous {
        /// The role looked up
        role: Role,
        /// How many connections carry it
        count: usize,
    },
}

/// Classify a flat connection list for the node `focus`.
///
/// Pure: the same input always yields the same roles.
pub fn classify(focus: &NodeName, raw: &[String]) -> Result<Classified, ClassifyError> {
    let pairs = raw.chunks_exact(2);
    if let [unpaired] = pairs.remainder() {
        return Err(ClassifyError::UnpairedPlug(unpaired.clone()));
    }

    let mut connections = Vec::with_capacity(raw.len() / 2);
    for pair in pairs {
        let source = Plug::parse(&pair[0])?;
        let destination = Plug::parse(&pair[1])?;
        let role = focus_role(focus, &source, &destination);
        connections.push(Connection::new(source, destination, role));
    }

    Ok(Classified { connections })
}

fn focus_role(focus: &NodeName, source: &Plug, destination: &Plug) -> Role {
    // Destination is tested first so a self-connection gets a single role.
    if destination.node == *focus {
        let role = role_for(PlugEnd::Destination, &destination.attribute);
        if role != Role::Unclassified {
            return role;
        }
    }
    if source.node == *focus {
        return role_for(PlugEnd::Source, &source.attribute);
    }
    Role::Unclassified
}

/// Classified connections of one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    connections: Vec<Connection>,
}

impl Classified {
    /// All connections, in host order
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Connections with a given role
    pub fn with_role(&self, role: Role) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.role == role)
    }

    /// Geometry connections (any role but unclassified)
    pub fn geometry(&self) -> impl Iterator<Item = &Connection> {
        self.connections
            .iter()
            .filter(|c| c.role != Role::Unclassified)
    }

    /// The connection with a role, if there is at most one
    pub fn optional(&self, role: Role) -> Result<Option<&Connection>, RoleLookupError> {
        let mut matches = self.with_role(role);
        let first = matches.next();
        let extra = matches.count();
        if extra > 0 {
            return Err(RoleLookupError::Ambiguous {
                role,
                count: extra + 1,
            });
        }
        Ok(first)
    }

    /// The single connection with a role
    pub fn unique(&self, role: Role) -> Result<&Connection, RoleLookupError> {
        self.optional(role)?.ok_or(RoleLookupError::Missing(role))
    }

    /// Number of connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Check if there are no connections
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
