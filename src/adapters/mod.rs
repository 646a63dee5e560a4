// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapters layer containing concrete implementations of the ports.
//!
//! This module contains the in-memory override map, the on-disk property file
//! support, the default value mapper and the locator strategies.

pub mod locators;
pub mod mappers;
pub mod properties_file;
pub mod property_map;

pub use locators::{DynamicLocator, FastDynamicLocator, LookupOrder, SourceLocator};
pub use mappers::DefaultValueMapper;
pub use properties_file::{PropertiesDirectory, PropertiesParser};
pub use property_map::PropertyMap;
