//! Entity importers (§4.8, §4.13): the per-type pipelines that validate,
//! resolve contacts, extract attachments, coalesce, and track per-year
//! statistics.

pub mod calls;
pub mod sms;
pub mod year_tracker;

pub use calls::CallImporter;
pub use sms::MessageImporter;
