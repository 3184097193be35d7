//! Data models for Quahog
//!
//! Plain data describing jj changes, their role in a patch chain, and
//! operation-log positions.

mod change;
mod kind;
mod operation;

pub use change::Change;
pub use kind::{
    BASE_MARKER, ChangeKind, DEFAULT_PATCH_EXTENSION, PATCH_EXTENSIONS, PATCH_MARKER, PatchMeta,
};
pub use operation::OperationId;
