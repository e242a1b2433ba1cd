//! Grid interaction primitives shared by the engine and its frontends.
//!
//! Everything here is synchronous and framework-agnostic: identifiers,
//! the row/column position index, the selection model and the column
//! layout reducers.

pub mod cell_id;
pub mod columns;
pub mod grid_map;
pub mod selection;

pub use cell_id::{CellId, ROW_SELECTION_COLUMN};
pub use grid_map::GridMap;
pub use selection::{SelectionOptions, SelectionState, SelectionStore};
