//! Grid interaction engine.
//!
//! Entities and their field accessors, the TSV clipboard engine, the
//! single-editor editing state machine, the row virtualizer and the
//! [`GridSession`] that wires them together for a frontend.

pub mod clipboard;
pub mod editing;
pub mod entity;
pub mod error;
pub mod fields;
pub mod notify;
pub mod rows;
pub mod session;
pub mod shortcuts;
pub mod update;
pub mod validation;

pub use entity::{Entity, EntityKind, EntityStore, FieldValue, Folder, Task};
pub use error::{ClipboardError, EditError, PasteError};
pub use fields::{ColumnDef, FieldRegistry, FieldTarget};
pub use session::GridSession;
pub use update::{Applied, CommitResult, EntityUpdate, RejectStage, Rejected, UpdateBatch, UpdateSink};
