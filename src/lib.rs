// SPDX-License-Identifier: MIT

//! flowline-rs: a visual-workflow execution engine for multi-step LLM pipelines
//!
//! `adk` holds the model boundary (generation client, tool trait, errors);
//! `flowline` holds the workflow engine, roadmap reconciler, persistence and
//! HTTP surface.

pub mod adk;
pub mod flowline;
