//! Route handlers for the bookstore API

pub mod clone;
pub mod publish;
pub mod version;
