// SPDX-License-Identifier: MIT OR Apache-2.0
//! Merge and rebuild engines for skin deformer stacks.
//!
//! Both engines follow the same protocol against a [`SceneHost`]:
//! classify the operands' connections, validate every precondition, build a
//! [`RewirePlan`], then apply it. No mutation is issued until all queries
//! for the operation have succeeded.
//!
//! [`SceneHost`]: skinstack_graph::SceneHost

pub mod config;
pub mod error;
pub mod plan;
pub mod merge;
pub mod rebuild;
pub mod discover;
mod validate;

pub use config::RewireConfig;
pub use error::{ClassificationIssue, DeformError};
pub use plan::{AppliedStep, RewirePlan, RewireStep};
pub use merge::{MergeEngine, MergeReport, PreparedMerge};
pub use rebuild::{RebuildEngine, RebuildMode, RebuildOutcome};
pub use discover::find_deformers;
