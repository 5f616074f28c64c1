// SPDX-License-Identifier: MIT

//! Agent development kit: the model boundary, generation client, tools and errors

pub mod error;
pub mod generation;
pub mod model;
pub mod tool;
