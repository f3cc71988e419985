//! Typed records for the dashboard dataset.
//!
//! The hosting page shipped these as loosely-shaped objects with abbreviated
//! keys; here every record has named fields, and serde aliases keep the
//! abbreviated keys readable.

pub mod epic;
pub mod gantt;
pub mod issue;

pub use epic::EpicRecord;
pub use gantt::{GanttColor, GanttEntry};
pub use issue::Issue;
