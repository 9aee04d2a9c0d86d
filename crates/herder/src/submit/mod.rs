//! Result submission boundary.
//!
//! Jobs are assembled as [`model::TestJob`] values and handed to a
//! [`service::ResultsService`]; bulk files go through a [`blob::BlobStore`].
//! Both are traits: the transport behind them is deployment-specific and
//! lives outside this crate.

pub mod blob;
pub mod model;
pub mod platform;
pub mod service;

pub use model::{JobState, TestJob};
pub use service::{ResultsService, SubmitError, Submitter};
