pub mod aggregate;
pub mod error;
pub mod io;
pub mod model;
pub mod normalize;
pub mod registry;
pub mod run;

pub use error::{ReportError, Result};
