#![doc = "cit-convert-core: core logic library for cit-convert."]

//! This crate contains the conversion engine that turns legacy custom-item-texture rule files
//! into item definitions, item models, equipment definitions and a conversion ledger.
//!
//! # Usage
//! Build a [`config::ConvertConfig`], pick a [`contract::PropertiesReader`] (normally
//! [`properties::PropertiesFileReader`]) and call [`pipeline::convert_pack`].

pub mod assets;
pub mod cit;
pub mod config;
pub mod context;
pub mod contract;
pub mod conversion;
pub mod equipment;
pub mod error;
pub mod organization;
pub mod pipeline;
pub mod properties;
pub mod report;
pub mod resolve;
pub mod synthesis;
