// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property locator strategies.
//!
//! - [`SourceLocator`]: a configuration source and an override map, searched in
//!   a [`LookupOrder`] (default or reverted)
//! - [`DynamicLocator`]: a fixed overlay in front of any inner locator
//! - [`FastDynamicLocator`]: the same overlay semantics specialized for a
//!   source locator

pub mod dynamic;
pub mod source;

pub use dynamic::{DynamicLocator, FastDynamicLocator};
pub use source::{LookupOrder, SourceLocator};
