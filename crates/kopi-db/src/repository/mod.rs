//! # Repository Module
//!
//! One repository per entity family, each a thin typed wrapper around the
//! shared `SqlitePool`. Repositories own SQL; business rules stay in
//! kopi-engine.

pub mod audit;
pub mod product;
pub mod recipe;
pub mod sales;
pub mod sync;
pub mod users;
pub mod waste;
