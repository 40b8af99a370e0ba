//! Walks a Bitcoin-style node's header chain over JSON-RPC and caches the
//! traversed headers in a CSV file, so later runs resume from where the
//! cache stops instead of re-fetching.
//!
//! The interesting parts are `sync` (resume resolution, bounded traversal,
//! dedup merge) and `store` (the lossless CSV round-trip); `net` and
//! `render` are thin I/O glue around them.
pub mod header;
pub mod net;
pub mod render;
pub mod store;
pub mod sync;
