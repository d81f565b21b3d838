mod site;
mod document;
mod metadata;

pub use site::*;
pub use document::*;
pub use metadata::*;
