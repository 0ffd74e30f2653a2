//! Acquisition and release bookkeeping for a single import.
//!
//! Resources are acquired in the order listener, parser, source, windows and
//! released in exactly the reverse order on every exit path. The [`Journal`]
//! records each step so the discipline can be inspected after the fact.

use core::fmt::{self, Display, Formatter};

use anyhow::Result;
use serde::Serialize;

use crate::ImportError;

/// A resource held by a running import.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Resource {
    /// The consumer listener opened from the sink.
    Listener,
    /// The format parser.
    Parser,
    /// The open input file.
    Source,
    /// A mapped window of the input.
    Window {
        /// Position in the visitation order.
        index: usize,
        /// Start of the window in bytes.
        offset: u64,
        /// Length of the window in bytes.
        len: u64,
    },
}

impl Display for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listener => write!(f, "listener"),
            Self::Parser => write!(f, "parser"),
            Self::Source => write!(f, "source"),
            Self::Window { index, offset, len } => {
                write!(f, "window {index} ({len} bytes at {offset})")
            }
        }
    }
}

/// A single acquisition or release.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Event {
    Acquired(Resource),
    Released(Resource),
}

/// Ordered record of resource events for one import.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Journal {
    events: Vec<Event>,
}

impl Journal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `resource` was acquired.
    pub fn acquire(&mut self, resource: Resource) {
        log::trace!("acquired {resource}");
        self.events.push(Event::Acquired(resource));
    }

    /// Records that `resource` was released.
    pub fn release(&mut self, resource: Resource) {
        log::trace!("released {resource}");
        self.events.push(Event::Released(resource));
    }

    /// All events in the order they happened.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Resources acquired but not yet released, oldest first.
    #[must_use]
    pub fn held(&self) -> Vec<Resource> {
        self.events.iter().fold(Vec::new(), |mut held, event| {
            match event {
                Event::Acquired(resource) => held.push(*resource),
                Event::Released(resource) => {
                    if let Some(pos) = held.iter().rposition(|r| r == resource) {
                        held.remove(pos);
                    }
                }
            }
            held
        })
    }

    /// Whether every acquisition was released, each in reverse order of acquisition.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        let mut stack = Vec::new();
        for event in &self.events {
            match event {
                Event::Acquired(resource) => stack.push(*resource),
                Event::Released(resource) => {
                    if stack.pop() != Some(*resource) {
                        return false;
                    }
                }
            }
        }
        stack.is_empty()
    }

    /// Windows mapped so far, in mapping order.
    #[must_use]
    pub fn windows(&self) -> Vec<Resource> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Acquired(resource @ Resource::Window { .. }) => Some(*resource),
                _ => None,
            })
            .collect()
    }

    /// Discards all events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// Merges the outcome of a scoped step with the result of releasing its resource.
///
/// The outcome's error wins. When both fail the result is
/// `ImportError::Cleanup`, which keeps the release failure observable.
pub(crate) fn settle<T>(outcome: Result<T>, released: Result<()>) -> Result<T> {
    match (outcome, released) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(secondary)) => Err(secondary),
        (Err(primary), Ok(())) => Err(primary),
        (Err(primary), Err(secondary)) => {
            log::warn!("release failed after import error: {secondary:#}");
            Err(ImportError::Cleanup { primary, secondary }.into())
        }
    }
}
