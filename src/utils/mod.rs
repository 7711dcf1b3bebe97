//! Small text helpers shared across modules

pub mod links;
