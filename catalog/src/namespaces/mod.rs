//! Built-in namespace modules.
//!
//! Each sub-module encodes one built-in namespace as Rust static data.
//! Modules are listed in dependency order; see [`crate::Catalog::standard`]
//! for the assembly sequence.

pub mod sys;
pub mod d;
pub mod cm;
