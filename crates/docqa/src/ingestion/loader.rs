//! PDF directory loader

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::parser::PdfParser;
use crate::config::{DocumentsConfig, ParseErrorPolicy};
use crate::error::{Error, Result};
use crate::providers::DocumentSource;
use crate::types::{LoadedCorpus, Page, SkippedFile};

/// Loads page text from every PDF in a directory
#[derive(Debug, Clone)]
pub struct PdfDirectoryLoader {
    dir: PathBuf,
    recursive: bool,
    policy: ParseErrorPolicy,
}

impl PdfDirectoryLoader {
    /// Create a non-recursive loader that skips unreadable files
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            recursive: false,
            policy: ParseErrorPolicy::Skip,
        }
    }

    /// Create from configuration
    pub fn from_config(config: &DocumentsConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            recursive: config.recursive,
            policy: config.on_parse_error,
        }
    }

    /// Set the corrupt file policy
    pub fn with_policy(mut self, policy: ParseErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Descend into subdirectories
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// List PDF files in lexicographic path order
    pub fn list_files(&self) -> Result<Vec<PathBuf>> {
        match std::fs::metadata(&self.dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(Error::io(
                    &self.dir,
                    io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
                ))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::io(
                    &self.dir,
                    io::Error::new(io::ErrorKind::NotFound, "directory not found"),
                ))
            }
            Err(e) => return Err(Error::io(&self.dir, e)),
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.dir)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(self.dir.as_path()).to_path_buf();
                Error::io(path, e.into())
            })?;

            if entry.file_type().is_file() && is_pdf(entry.path()) {
                files.push(entry.into_path());
            }
        }

        files.sort();
        Ok(files)
    }

    /// Load pages from every PDF in the directory
    pub async fn load(&self) -> Result<LoadedCorpus> {
        let dir = self.dir.clone();
        let loader = self.clone();
        let files = tokio::task::spawn_blocking(move || loader.list_files())
            .await
            .map_err(|e| Error::internal(format!("Task join error: {}", e)))??;

        tracing::info!("Loading {} PDF files from {}", files.len(), dir.display());

        let mut corpus = LoadedCorpus::default();

        for path in files {
            let filename = display_name(&dir, &path);
            match load_file(&path, &filename).await {
                Ok(texts) => {
                    tracing::debug!("{}: {} pages", filename, texts.len());
                    corpus.documents += 1;
                    corpus.pages.extend(
                        texts
                            .into_iter()
                            .enumerate()
                            .map(|(i, text)| Page::new(filename.clone(), i as u32, text)),
                    );
                }
                Err(e) => match self.policy {
                    ParseErrorPolicy::Abort => return Err(e),
                    ParseErrorPolicy::Skip => {
                        tracing::warn!("Skipping {}: {}", filename, e);
                        corpus.skipped.push(SkippedFile {
                            filename,
                            reason: e.to_string(),
                        });
                    }
                },
            }
        }

        tracing::info!(
            "Loaded {} pages from {} documents ({} skipped)",
            corpus.pages.len(),
            corpus.documents,
            corpus.skipped.len()
        );

        Ok(corpus)
    }
}

#[async_trait]
impl DocumentSource for PdfDirectoryLoader {
    async fn load(&self) -> Result<LoadedCorpus> {
        PdfDirectoryLoader::load(self).await
    }

    fn location(&self) -> &Path {
        &self.dir
    }

    fn name(&self) -> &str {
        "pdf-directory"
    }
}

/// Read and parse one file off the async runtime
async fn load_file(path: &Path, filename: &str) -> Result<Vec<String>> {
    let data = tokio::fs::read(path).await.map_err(|e| Error::io(path, e))?;
    let name = filename.to_string();

    tokio::task::spawn_blocking(move || PdfParser::parse_pages(&name, &data))
        .await
        .map_err(|e| Error::page_parse(filename, format!("parser crashed: {}", e)))?
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Path relative to the documents directory, with forward slashes
fn display_name(dir: &Path, path: &Path) -> String {
    path.strip_prefix(dir)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::parser::test_pdf;
    use crate::ingestion::TextChunker;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, bytes: &[u8]) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, bytes).unwrap();
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let err = PdfDirectoryLoader::new("/definitely/not/here")
            .load()
            .await
            .unwrap_err();
        match err {
            Error::Io { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
                assert_eq!(source.to_string(), "directory not found");
            }
            other => panic!("expected io error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_file_instead_of_directory() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.pdf", &test_pdf::build(&["x"]));
        let err = PdfDirectoryLoader::new(tmp.path().join("a.pdf"))
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[tokio::test]
    async fn test_lexicographic_order_and_pdf_only() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "b.pdf", &test_pdf::build(&["second file"]));
        write(tmp.path(), "a.PDF", &test_pdf::build(&["first file"]));
        write(tmp.path(), "notes.txt", b"not a pdf");
        write(tmp.path(), ".hidden.pdf", &test_pdf::build(&["hidden"]));
        write(tmp.path(), "nested/c.pdf", &test_pdf::build(&["nested"]));

        let corpus = PdfDirectoryLoader::new(tmp.path()).load().await.unwrap();

        assert_eq!(corpus.documents, 2);
        let names: Vec<&str> = corpus.pages.iter().map(|p| p.document.as_str()).collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
        assert!(corpus.pages[0].text.contains("first file"));
    }

    #[tokio::test]
    async fn test_recursive() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.pdf", &test_pdf::build(&["top"]));
        write(tmp.path(), "nested/c.pdf", &test_pdf::build(&["nested"]));

        let corpus = PdfDirectoryLoader::new(tmp.path())
            .recursive(true)
            .load()
            .await
            .unwrap();

        let names: Vec<&str> = corpus.pages.iter().map(|p| p.document.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "nested/c.pdf"]);
    }

    #[tokio::test]
    async fn test_corrupt_file_skipped() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.pdf", &test_pdf::build(&["good"]));
        write(tmp.path(), "b.pdf", b"%PDF-1.4 this is not really a pdf");

        let corpus = PdfDirectoryLoader::new(tmp.path()).load().await.unwrap();

        assert_eq!(corpus.documents, 1);
        assert_eq!(corpus.pages.len(), 1);
        assert_eq!(corpus.skipped.len(), 1);
        assert_eq!(corpus.skipped[0].filename, "b.pdf");
    }

    #[tokio::test]
    async fn test_corrupt_file_aborts() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.pdf", &test_pdf::build(&["good"]));
        write(tmp.path(), "b.pdf", b"garbage");

        let err = PdfDirectoryLoader::new(tmp.path())
            .with_policy(ParseErrorPolicy::Abort)
            .load()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::PageParse { ref filename, .. } if filename == "b.pdf"));
    }

    #[tokio::test]
    async fn test_two_page_pdf_chunks() {
        let tmp = TempDir::new().unwrap();
        let a = "A".repeat(1500);
        let b = "B".repeat(500);
        write(tmp.path(), "census.pdf", &test_pdf::build(&[a.as_str(), b.as_str()]));

        let corpus = PdfDirectoryLoader::new(tmp.path()).load().await.unwrap();
        assert_eq!(corpus.pages.len(), 2);
        assert_eq!(corpus.pages[0].page_number, 0);
        assert_eq!(corpus.pages[0].text, a);
        assert_eq!(corpus.pages[1].text, b);

        let chunks = TextChunker::new(1000, 200).unwrap().split(&corpus.pages);
        let lengths: Vec<usize> = chunks.iter().map(|c| c.char_len()).collect();
        assert_eq!(lengths, vec![1000, 700, 500]);
    }
}
