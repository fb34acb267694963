//! Core library for the stock-merge command line application.
//!
//! The library reconciles inventory exports from two storefronts into one
//! stock report. The modules are structured to keep responsibilities narrow
//! and composable: IO adapters live under [`io`], record types inside
//! [`model`], cleaning in [`normalize`], pairing in [`matching`], stock
//! arithmetic in [`aggregate`], the report layout in [`report`], and the
//! end-to-end pipeline under [`merge`](mod@merge).

pub mod aggregate;
pub mod config;
pub mod error;
pub mod io;
pub mod matching;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod report;

pub use config::{MergeConfig, NoMatchPolicy};
pub use error::{MergeError, Result, SourceSide};
pub use merge::{merge, merge_files};
pub use report::emit;
