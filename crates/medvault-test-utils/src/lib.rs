// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Medvault integration tests.
//!
//! Provides deterministic collaborators so engine passes can be driven
//! without wall-clock time, a mail server or a shared database.
//!
//! # Components
//!
//! - [`RecordingNotifier`] - captures notifications, fails on demand
//! - [`FixedClock`] - settable time source
//! - [`InMemoryStore`] - both stores over plain collections
//! - [`TestHarness`] - temp-dir SQLite store wired to the fakes above

pub mod clock;
pub mod fixtures;
pub mod harness;
pub mod memory_store;
pub mod recording_notifier;

pub use clock::FixedClock;
pub use harness::TestHarness;
pub use memory_store::InMemoryStore;
pub use recording_notifier::RecordingNotifier;
