pub mod api;
pub mod crawler;
pub mod error;
pub mod model;

pub use api::{FriendService, HttpFriendService};
pub use crawler::{Crawler, ProgressCallback};
pub use error::ClientError;
pub use model::{CrawlOutcome, EdgeRecord, Expansion, Person, PersonSet, UserId};
