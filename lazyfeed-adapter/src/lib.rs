//! Adapter utilities for the `lazyfeed` crate.
//!
//! The `lazyfeed` crate is host-agnostic and focuses on the core loading and
//! rendering state machine. This crate provides small, framework-neutral
//! helpers commonly needed by hosts:
//!
//! - A synchronous [`DataSource`] abstraction with an in-memory
//!   [`PagedVecSource`] implementation
//! - A [`FeedDriver`] that owns the effect loop: it serves fetch effects from
//!   the attached source and runs (or defers) insert frames
//!
//! This crate is intentionally framework-agnostic (no DOM/TUI bindings).
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

mod driver;
mod source;


pub use driver::FeedDriver;
pub use source::{DataSource, PagedVecSource, SourceError};
