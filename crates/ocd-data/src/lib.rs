//! # ocd-data
//!
//! Drives an SCM generator to build one observational dataset and a number
//! of interventional episodes, splits them into train/validation index
//! views, and serves them as batch sources.

pub mod dataset;
pub mod loader;
pub mod module;

pub use dataset::{random_split, OcdDataset, Subset};
pub use loader::{Batch, BatchIter, DataLoader, LoaderOverrides, Loaders};
pub use module::{ModuleState, OcdDataModule, Stage};
