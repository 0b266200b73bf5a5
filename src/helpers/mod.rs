//! Helper functions shared by the generator and the templates

mod date;
mod html;
mod meta;
mod url;

pub use date::*;
pub use html::*;
pub use meta::*;
pub use url::*;
