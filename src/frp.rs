//! A small single-threaded functional-reactive library.
//!
//! Streams push discrete events while a [`Transaction`] is open. Cells are
//! pull-sampled: a derived cell recomputes from its inputs whenever it is
//! sampled, and exposes an `updates` stream so that listeners learn about
//! changes. Values held by a cell only change when the transaction that
//! produced them closes, so any sample taken during a transaction observes
//! the state from before it.
//!
//! Cycles are allowed through [`CellLoop`] as long as they pass through a
//! `hold`, which never re-enters its input when sampled.

mod cell;
mod stream;
mod transaction;

use std::any::Any;

use thiserror::Error;

pub use cell::{Cell, CellLoop, CellSink};
pub use stream::{Stream, StreamSink};
pub use transaction::Transaction;

/// Errors raised while wiring a reactive graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrpError {
    #[error("cell loop is already bound to a cell")]
    LoopAlreadyBound,
}

/// Keeps a subscription alive. Dropping it unsubscribes.
#[must_use = "dropping a Listener unsubscribes it immediately"]
pub struct Listener {
    registrations: Vec<Box<dyn Any>>,
}

impl Listener {
    pub(crate) fn new(registrations: Vec<Box<dyn Any>>) -> Self {
        Listener { registrations }
    }

    /// Merges two listeners into one handle that keeps both alive.
    pub fn append(mut self, other: Listener) -> Listener {
        self.registrations.extend(other.registrations);
        self
    }
}
