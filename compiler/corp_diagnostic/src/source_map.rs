//! Host-supplied source text.
//!
//! The engine never reads files. Hosts that want source lines in reports
//! register file contents here. Line starts are computed once per file so
//! lookups by `(file, line)` are O(1).

/// File name → source text.
#[derive(Clone, Debug, Default)]
pub struct SourceMap {
    files: Vec<(String, LineIndex)>,
}

impl SourceMap {
    pub fn new() -> Self {
        SourceMap::default()
    }

    /// Register (or replace) a file's contents.
    pub fn add(&mut self, file: impl Into<String>, text: impl Into<String>) {
        let file = file.into();
        let index = LineIndex::build(text.into());
        match self.files.iter_mut().find(|(name, _)| *name == file) {
            Some(entry) => entry.1 = index,
            None => self.files.push((file, index)),
        }
    }

    /// Builder-style [`SourceMap::add`].
    #[must_use]
    pub fn with_file(mut self, file: impl Into<String>, text: impl Into<String>) -> Self {
        self.add(file, text);
        self
    }

    /// Whether `file` has been registered.
    pub fn contains(&self, file: &str) -> bool {
        self.files.iter().any(|(name, _)| name == file)
    }

    /// Text of a 1-based line without its line terminator.
    pub fn line_text(&self, file: &str, line: u32) -> Option<&str> {
        let (_, index) = self.files.iter().find(|(name, _)| name == file)?;
        index.line(line)
    }
}

/// Source text with pre-computed line starts.
#[derive(Clone, Debug, Default)]
struct LineIndex {
    text: String,
    /// Byte offset of each line start; `starts[0] == 0`.
    starts: Vec<usize>,
}

impl LineIndex {
    fn build(text: String) -> Self {
        let mut starts = vec![0];
        for (i, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                starts.push(i + 1);
            }
        }
        LineIndex { text, starts }
    }

    fn line(&self, line: u32) -> Option<&str> {
        let idx = usize::try_from(line).ok()?.checked_sub(1)?;
        let start = *self.starts.get(idx)?;
        let end = self
            .starts
            .get(idx + 1)
            .map_or(self.text.len(), |next| next - 1);
        let text = self.text.get(start..end)?;
        Some(text.strip_suffix('\r').unwrap_or(text))
    }
}
