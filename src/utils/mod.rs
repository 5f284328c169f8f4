pub mod extractor;
pub mod parameter_error_handler;
pub mod path;

pub use extractor::BearerIdentity;
pub use parameter_error_handler::{path_error_handler, query_error_handler};
pub use path::submission_path;
