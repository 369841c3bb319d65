//! Document ingestion: PDF loading, page extraction and chunking

mod chunker;
mod loader;
mod parser;

pub use chunker::TextChunker;
pub use loader::PdfDirectoryLoader;
pub use parser::{clean_page_text, PdfParser};
