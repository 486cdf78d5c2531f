//! Change metadata and serialization.

pub mod change;
pub mod labels;
pub mod report;
pub mod yaml;

pub use change::Change;
pub use labels::{first_line, ChangeMessage, Labels};
pub use report::{OutputFormat, RunReport};
pub use yaml::{from_yaml, read_yaml_file, to_yaml};
