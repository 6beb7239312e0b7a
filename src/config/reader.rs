//! Shared line-oriented reader for `.cfg` files: `#` starts a comment, blank
//! lines are skipped, and every yielded line carries its 1-based line number so
//! parse failures can be reported as `Config` errors with file:line context.

use crate::errors::GraphStudyError;
use std::io::BufRead;
use std::path::Path;

pub struct ConfigReader {
    filename: String,
    lines: Vec<(usize, String)>,
    cursor: usize,
}

impl ConfigReader {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| anyhow::anyhow!("cannot open {}: {e}", path.display()))?;
        Self::from_reader(path.display().to_string(), std::io::BufReader::new(file))
    }

    pub fn from_reader(filename: String, reader: impl BufRead) -> anyhow::Result<Self> {
        let mut lines = Vec::new();
        for (idx, raw) in reader.lines().enumerate() {
            let raw = raw?;
            let stripped = strip_comment(&raw);
            let trimmed = stripped.trim();
            if !trimmed.is_empty() {
                lines.push((idx + 1, trimmed.to_string()));
            }
        }
        Ok(Self {
            filename,
            lines,
            cursor: 0,
        })
    }

    pub fn failure(&self, lineno: usize, message: impl Into<String>) -> GraphStudyError {
        GraphStudyError::config(message, &self.filename, Some(lineno))
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }
}

impl Iterator for ConfigReader {
    type Item = (usize, String);

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.lines.get(self.cursor).cloned();
        self.cursor += 1;
        item
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_and_blanks() {
        let text = "# header\n\n  LINDENMAYER  SMALL  42  # inline\nQUASI3D MEDIUM 1\n";
        let reader = ConfigReader::from_reader("test.cfg".into(), text.as_bytes()).unwrap();
        let lines: Vec<_> = reader.map(|(_, l)| l).collect();
        assert_eq!(lines, vec!["LINDENMAYER  SMALL  42", "QUASI3D MEDIUM 1"]);
    }
}
