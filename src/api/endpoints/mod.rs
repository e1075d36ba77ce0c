//! API endpoint handlers, one module per resource.

pub mod form;
pub mod health;
pub mod predict;
pub mod result;
pub mod schema;
