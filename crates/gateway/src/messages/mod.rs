//! Wire message types

pub mod execution;
