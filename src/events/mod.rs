//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the synchronizer, the
//! registry, and task bodies.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Synchronizer` (registration, run, stop path), the
//!   periodic loop (`IntervalOverrun`), `SubscriberSet` workers
//!   (overflow/panic).
//! - **Consumer**: the synchronizer's listener, which fans events out to the
//!   [`SubscriberSet`](crate::subscribers::SubscriberSet).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
