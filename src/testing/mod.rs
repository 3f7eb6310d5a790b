//! Testing utilities for the dashboard
//!
//! - In-process HTTP requests against the router, no server needed
//! - Fake source fetchers for driving refreshes deterministically
//!
//! Pair these with [`ManualClock`](crate::clock::ManualClock) to move time in
//! cooldown and session-expiry tests.

mod fakes;
mod request;

pub use fakes::{BlockingFetcher, BlockingHandle, FailingFetcher, StaticFetcher};
pub use request::{TestRequest, TestResponse, get, post};
