// SPDX-License-Identifier: MIT

//! Variable context for workflow runs
//!
//! This module provides:
//! - `ContextValue` - text plus media parts and extracted fields
//! - `VariableContext` - run-scoped storage with nested path resolution
//! - template interpolation (`interpolate`, `construct_parts`)

mod store;
mod template;
mod value;

pub use store::VariableContext;
pub use value::{media_parts, value_to_text, ContextValue};
