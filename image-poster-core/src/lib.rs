#![doc = "image-poster-core: core logic library for image-poster."]

//! This crate contains the data model and pipeline for image-poster:
//! the posted-set record, the candidate scanner, batch selection and the
//! publish orchestration. It has no HTTP dependency; the network side is
//! reached through the [`contract::Publisher`] trait.
//!
//! # Usage
//! Build a [`config::Layout`], hand a `Publisher` implementation to
//! [`run::post_batch`], and inspect the returned [`run::PostReport`].

pub mod config;
pub mod contract;
pub mod run;
pub mod scan;
pub mod select;
pub mod state;
