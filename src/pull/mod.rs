//! Pull-style interfaces layered over the push engine (spec.md §4.3, §4.4):
//! a primitive event queue, and a field-granular iterator built on it.

pub mod field;
pub mod primitive;

pub use field::{field_adapter_mask, FieldPullParser, FieldState};
pub use primitive::{FieldValue, PrimitiveEvent, PrimitiveHandler, PrimitiveMask, PrimitivePullParser, PrimitiveState};
