//! Course document parsing and chunking.
//!
//! A course file starts with a title line, optionally followed by
//! `Course Link:` and `Course Instructor:` headers. `Lesson N: title` lines
//! open lessons; a `Lesson Link:` line may follow each lesson header. All
//! other lines are body text, which is cleaned and split into overlapping
//! sentence-aligned chunks.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use lectern_core::config::DocumentConfig;
use lectern_core::error::LecternError;
use lectern_core::types::{ChunkMetadata, CourseChunk, CourseDocument, Lesson};

/// File extensions picked up by [`DocumentProcessor::process_folder`].
const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md"];

static COURSE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^course title:\s*(.+)$").expect("Invalid title regex"));
static COURSE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^course link:\s*(.+)$").expect("Invalid link regex"));
static COURSE_INSTRUCTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^course instructor:\s*(.+)$").expect("Invalid instructor regex")
});
static LESSON_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^lesson\s+(\d+):\s*(.*)$").expect("Invalid lesson regex"));
static LESSON_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^lesson link:\s*(.+)$").expect("Invalid lesson link regex"));

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text into sentences at `.`, `!` or `?` followed by whitespace.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        let at_boundary = matches!(c, '.' | '!' | '?')
            && chars.peek().map(|n| n.is_whitespace()).unwrap_or(false);
        if at_boundary {
            let sentence = current.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            current.clear();
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

/// Split text into sentence-aligned chunks of at most `chunk_size` characters.
///
/// A sentence longer than `chunk_size` becomes a chunk of its own. Each chunk
/// after the first repeats the trailing sentences of its predecessor, up to
/// `overlap` characters.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let sentences = split_sentences(&clean_text(text));
    let lens: Vec<usize> = sentences.iter().map(|s| s.chars().count()).collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < sentences.len() {
        let mut end = start;
        let mut size = 0;
        while end < sentences.len() {
            let addition = lens[end] + usize::from(end > start);
            if end > start && size + addition > chunk_size {
                break;
            }
            size += addition;
            end += 1;
        }

        chunks.push(sentences[start..end].join(" "));
        if end >= sentences.len() {
            break;
        }

        let mut overlap_size = 0;
        let mut overlap_count = 0;
        for k in (start..end).rev() {
            let len = lens[k] + usize::from(k + 1 < end);
            if overlap_size + len > overlap {
                break;
            }
            overlap_size += len;
            overlap_count += 1;
        }

        start = (end - overlap_count).max(start + 1);
    }

    chunks
}

/// Parses course files into chunked [`CourseDocument`]s.
#[derive(Debug, Clone)]
pub struct DocumentProcessor {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl DocumentProcessor {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap,
        }
    }

    pub fn from_config(config: &DocumentConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Parse course text. `source` is recorded on every chunk.
    pub fn parse(&self, source: &str, text: &str) -> Result<CourseDocument, LecternError> {
        let mut lines = text.lines().map(str::trim).skip_while(|l| l.is_empty());

        let first = lines
            .next()
            .ok_or_else(|| LecternError::Document(format!("{} is empty", source)))?;
        let title = COURSE_TITLE
            .captures(first)
            .map(|c| c[1].trim().to_string())
            .unwrap_or_else(|| first.to_string());

        let mut link = None;
        let mut instructor = None;
        let mut lessons: Vec<Lesson> = Vec::new();
        // Body text per section; section 0 (lesson None) holds text before
        // the first lesson header.
        let mut sections: Vec<(Option<u32>, String)> = vec![(None, String::new())];
        let mut expect_lesson_link = false;

        for line in lines {
            if lessons.is_empty() {
                if let Some(c) = COURSE_LINK.captures(line) {
                    link = Some(c[1].trim().to_string());
                    continue;
                }
                if let Some(c) = COURSE_INSTRUCTOR.captures(line) {
                    instructor = Some(c[1].trim().to_string());
                    continue;
                }
            }

            if let Some(c) = LESSON_HEADER.captures(line) {
                if let Ok(number) = c[1].parse::<u32>() {
                    lessons.push(Lesson {
                        number,
                        title: c[2].trim().to_string(),
                        link: None,
                    });
                    sections.push((Some(number), String::new()));
                    expect_lesson_link = true;
                    continue;
                }
            }

            if expect_lesson_link {
                expect_lesson_link = false;
                if let Some(c) = LESSON_LINK.captures(line) {
                    if let Some(lesson) = lessons.last_mut() {
                        lesson.link = Some(c[1].trim().to_string());
                    }
                    continue;
                }
            }

            if let Some((_, body)) = sections.last_mut() {
                body.push_str(line);
                body.push('\n');
            }
        }

        let mut chunks = Vec::new();
        for (lesson_number, body) in sections {
            for content in chunk_text(&body, self.chunk_size, self.chunk_overlap) {
                let chunk_index = chunks.len();
                chunks.push(CourseChunk {
                    content,
                    metadata: ChunkMetadata {
                        source: source.to_string(),
                        course_title: title.clone(),
                        lesson_number,
                        chunk_index,
                    },
                });
            }
        }

        debug!(
            source,
            title = %title,
            lessons = lessons.len(),
            chunks = chunks.len(),
            "Parsed course document"
        );

        Ok(CourseDocument {
            title,
            link,
            instructor,
            lessons,
            chunks,
        })
    }

    /// Read and parse a single course file.
    pub fn process_file(&self, path: &Path) -> Result<CourseDocument, LecternError> {
        let text = std::fs::read_to_string(path)?;
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        self.parse(&source, &text)
    }

    /// Parse every supported file in a folder, in file-name order.
    ///
    /// Files that cannot be read or parsed are skipped with a warning.
    /// Returns the documents and the number of courses found.
    pub fn process_folder(
        &self,
        folder: &Path,
    ) -> Result<(Vec<CourseDocument>, usize), LecternError> {
        let mut paths: Vec<_> = std::fs::read_dir(folder)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            match self.process_file(&path) {
                Ok(doc) => documents.push(doc),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping course file"),
            }
        }

        let count = documents.len();
        Ok((documents, count))
    }
}
