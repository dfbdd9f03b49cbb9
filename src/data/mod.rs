//! Catalog records: typed models, raw field access, extraction and retrieval

mod extract;
mod loader;
pub mod raw;
mod space_object;

pub use extract::*;
pub use loader::*;
pub use raw::{parse_epoch, RawFields};
pub use space_object::*;
