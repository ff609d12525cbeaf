//! Configuration loading and schema definitions
//!
//! Only presentation concerns are configurable. Compression caps are fixed
//! policy and live in `shrink_image`.

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
