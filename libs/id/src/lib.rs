//! # nodeparam-id
//!
//! Identifier types shared by the node-parameter crates.
//!
//! ## Kinds of identifier
//!
//! - **Names** (`NodeName`, `JobName`) are user-controlled strings. They are
//!   validated on construction but otherwise opaque: a node name does not
//!   have to refer to a node that currently exists.
//! - **IDs** (`BuildId`, `TriggerId`) are system-generated, prefixed ULIDs
//!   handed out by the build-trigger engine: `bld_01HV4Z2WQXKJNM8GPQY6VBKC3D`.
//!
//! The controller node is addressed with the reserved name `built-in`
//! (see [`NodeName::BUILT_IN`]).

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use types::*;

/// Re-export ulid for consumers that need raw ULID operations
pub use ulid::Ulid;
