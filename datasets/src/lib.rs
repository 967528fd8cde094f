//! `segmenta-datasets` provides synthetic datasets ready to be used in tests, doc examples and
//! the `segmenta generate` command.
//!
//! ## Current State
//!
//! * [`generate::blobs`]: isotropic clusters around given centroids
//! * [`generate::customers`]: a customer table drawn from four behavioural tiers
//!
//! Every generator takes an explicit random number generator, so a seeded one always produces
//! the same data.

pub mod generate;
