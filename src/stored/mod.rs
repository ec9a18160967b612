//! An owned, arena-backed table built directly from parse events
//! (spec.md §3 Data model, §4.7).

pub mod arena;
pub mod builder;
pub mod table;
pub mod value;

pub use arena::{Arena, Security};
pub use builder::{StoredTableBuilder, TransposingBuilder};
pub use table::{Content, StoredTable};
pub use value::StoredValue;
