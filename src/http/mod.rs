//! HTTP plumbing shared by the fleet and the front door

pub mod etag;
pub mod files;
pub mod server;

pub use etag::weak_etag;
pub use server::{bind, CloseOutcome, RunningServer};
