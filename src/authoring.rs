//! Author identities and destination author policies.

pub mod author;
pub mod policy;

pub use author::{Author, InvalidAuthor};
pub use policy::{Authoring, AuthoringMode};
