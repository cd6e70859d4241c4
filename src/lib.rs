//! Progress and achievement engine for time-boxed habit challenges.
//!
//! Users join a challenge, mark logical days as completed and accumulate
//! points, streaks and achievement tags. The engine is pure computation
//! over in-memory records; persistence happens behind [`ChallengeStore`]
//! and the HTTP surface is the consumer's concern.

pub mod consts;
pub mod leaderboard;

mod achievement;
mod challenge;
mod config;
mod error;
mod event;
mod profile;
mod progress;
mod service;
mod statistics;
mod store;
mod view;

pub use achievement::*;
pub use challenge::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use leaderboard::RankedEntry;
pub use profile::*;
pub use progress::*;
pub use service::*;
pub use statistics::*;
pub use store::*;
pub use view::*;

pub type ChallengeId = String;
pub type UserId = String;
