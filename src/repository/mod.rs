//! On-disk repository layout (§3): the marker file, the summary/manifest
//! writer (§4.10), and the read-only structural validator (§4.14).

pub mod marker;
pub mod validator;
pub mod writer;

pub use marker::RepositoryMarker;
pub use validator::{validate, ValidationReport};
pub use writer::write_outputs;
