//! Host integration - the "active object cache" slot
//!
//! A host swaps cache implementations by installing a drop-in. Here the
//! drop-in is a small JSON marker file naming the provider and the cache
//! directory; [`Activation`] ties it to a [`CacheStore`](crate::CacheStore).

pub mod activation;
pub mod dropin;

pub use activation::Activation;
pub use dropin::{CacheHost, DropIn, DropInHost};
