//! `leavegrid-engine` — In-memory workbook model.
//!
//! Plain data crate: the loader (`leavegrid-io`) fills it, the import
//! engine (`leavegrid-import`) reads it. No file IO, no parsing logic.

pub mod cell;
pub mod sheet;
pub mod workbook;

pub use cell::{Cell, CellValue, FillRef};
pub use sheet::Sheet;
pub use workbook::Workbook;
