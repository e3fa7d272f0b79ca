//! Command-line front end for page files.

pub mod headless;
pub mod logging;
pub mod pipeline;
pub mod summary;
