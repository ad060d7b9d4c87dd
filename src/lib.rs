mod aggregate;
mod config;
mod job;
mod parse;
mod path;
mod submit;
mod utils;

pub use aggregate::*;
pub use config::*;
pub use job::*;
pub use parse::*;
pub use path::*;
pub use submit::*;
pub use utils::*;
