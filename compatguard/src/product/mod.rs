//! Product data model shared by the extractor, evaluator and rule store.

pub mod nema;
pub mod schema;

pub use nema::{NemaRating, UnknownNemaRating};
pub use schema::{format_amps, format_volts, Category, Phase, ProductSpec, UnknownCategory};
