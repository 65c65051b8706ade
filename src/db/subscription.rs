// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live first-page subscriptions.
//!
//! A [`Subscription`] is the receiving end of a snapshot channel. Dropping
//! it unsubscribes: the producer sees the channel close and stops.

use crate::error::AppError;
use crate::models::FeedItem;
use tokio::sync::mpsc;

/// One delivery from a live subscription.
pub type SnapshotEvent = Result<Vec<FeedItem>, AppError>;

/// Receiving half, owned by the subscriber.
#[derive(Debug)]
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<SnapshotEvent>,
}

/// Sending half, owned by the store backend.
#[derive(Debug, Clone)]
pub struct SnapshotSender {
    sender: mpsc::UnboundedSender<SnapshotEvent>,
}

impl Subscription {
    /// Create a connected sender/subscription pair.
    pub fn channel() -> (SnapshotSender, Subscription) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (SnapshotSender { sender }, Subscription { receiver })
    }

    /// Wait for the next snapshot. `None` once the producer has stopped.
    pub async fn next(&mut self) -> Option<SnapshotEvent> {
        self.receiver.recv().await
    }
}

impl SnapshotSender {
    /// Deliver an event. Returns `false` if the subscriber is gone.
    pub fn send(&self, event: SnapshotEvent) -> bool {
        self.sender.send(event).is_ok()
    }

    /// Whether the subscriber has unsubscribed.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Resolves once the subscriber has unsubscribed.
    pub async fn closed(&self) {
        self.sender.closed().await
    }
}
