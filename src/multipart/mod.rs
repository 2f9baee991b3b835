//! Multipart body reader and writer (§4.5).

mod error;
mod reader;
mod writer;

pub use error::Error;
pub use reader::MultipartReader;
pub use writer::{MultipartWriter, Part, PartBody};
