//! `leavegrid-io` — Workbook loading.
//!
//! One-way conversion: an `.xlsx` file becomes the in-memory
//! `leavegrid_engine::Workbook` the import engine consumes. Cell values
//! come from calamine; fill references, notes and the theme part are read
//! out of the ZIP directly, because the import engine needs fills as
//! theme-slot-plus-tint references rather than flattened colors.

pub mod xlsx;
pub mod xlsx_parts;

pub use xlsx::{load_workbook, LoadReport, XlsxError};
