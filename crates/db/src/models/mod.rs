//! Database row models.
//!
//! Each submodule contains a `FromRow` entity struct matching the table
//! row, plus conversions to and from the domain types in `finch-core`.

pub mod notification;
