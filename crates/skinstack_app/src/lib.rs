// SPDX-License-Identifier: MIT OR Apache-2.0
//! Session layer and host adapters for the `skinstack` tool.
//!
//! - [`session`]: source and target deformer lists over one scene host
//! - [`script`]: RON command scripts driving a session
//! - [`settings`]: tool settings file
//! - [`command_port`]: scene host backed by a DCC command port

pub mod command_port;
pub mod script;
pub mod session;
pub mod settings;

pub use command_port::CommandPortHost;
pub use script::{Script, ScriptError, ScriptSummary, SessionCommand};
pub use session::{RebuildResult, Session, SessionError};
pub use settings::{Settings, SettingsError, SETTINGS_FILE_NAME, SETTINGS_FORMAT_VERSION};
