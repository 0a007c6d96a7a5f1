//! Leading `---` YAML block of a note.
//!
//! The block is kept as raw text alongside its parsed mapping. Serializing an
//! untouched block re-emits the original bytes; [`Frontmatter::set`] splices only
//! the lines belonging to the target key.

use serde_yaml::{Mapping, Value};

const FENCE: &str = "---";

#[derive(Debug, Clone, PartialEq)]
pub struct Frontmatter {
    /// Opening fence line including its line ending.
    open: String,
    /// YAML between the fences, every line terminated.
    inner: String,
    /// Closing fence line, with its line ending if the file had one.
    close: String,
    mapping: Mapping,
}

impl Frontmatter {
    /// A new, empty block (`---\n---\n`).
    pub fn empty() -> Self {
        Self {
            open: "---\n".to_string(),
            inner: String::new(),
            close: "---\n".to_string(),
            mapping: Mapping::new(),
        }
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.mapping.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// `true` when the key exists with a non-null, non-blank value.
    pub fn has_value(&self, key: &str) -> bool {
        match self.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Sequence(seq)) => !seq.is_empty(),
            Some(_) => true,
        }
    }

    /// Tags from the `tags` key, accepting a list or a single string. A leading
    /// `#` is stripped.
    pub fn tags(&self) -> Vec<String> {
        let clean = |s: &str| s.trim().trim_start_matches('#').to_string();
        match self.get("tags") {
            Some(Value::Sequence(seq)) => seq
                .iter()
                .filter_map(Value::as_str)
                .map(clean)
                .filter(|t| !t.is_empty())
                .collect(),
            Some(Value::String(s)) => s
                .split([',', ' '])
                .map(clean)
                .filter(|t| !t.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Set a top-level key. An existing entry is replaced in place; a new key is
    /// appended. All other lines keep their bytes.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> crate::error::Result<()> {
        let value = value.into();
        let mut entry = Mapping::new();
        entry.insert(Value::String(key.to_string()), value.clone());
        let rendered = serde_yaml::to_string(&entry)?;

        let newline = if self.open.ends_with("\r\n") { "\r\n" } else { "\n" };
        let rendered = if newline == "\n" {
            rendered
        } else {
            rendered.replace('\n', newline)
        };

        match find_entry(&self.inner, key) {
            Some((start, end)) => self.inner.replace_range(start..end, &rendered),
            None => {
                if !self.inner.is_empty() && !self.inner.ends_with('\n') {
                    self.inner.push_str(newline);
                }
                self.inner.push_str(&rendered);
            }
        }

        self.mapping.insert(Value::String(key.to_string()), value);
        Ok(())
    }

    /// Render the block including both fences.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.open.len() + self.inner.len() + self.close.len());
        out.push_str(&self.open);
        out.push_str(&self.inner);
        out.push_str(&self.close);
        out
    }
}

/// Split a note into its frontmatter and body.
///
/// Missing, unterminated, unparsable or non-mapping blocks yield `None` and the
/// whole text as body.
pub fn parse(text: &str) -> (Option<Frontmatter>, String) {
    match split(text) {
        Some((fm, body_start)) => (Some(fm), text[body_start..].to_string()),
        None => (None, text.to_string()),
    }
}

/// Inverse of [`parse`].
pub fn serialize(frontmatter: Option<&Frontmatter>, body: &str) -> String {
    match frontmatter {
        Some(fm) => {
            let mut out = fm.render();
            out.push_str(body);
            out
        }
        None => body.to_string(),
    }
}

fn split(text: &str) -> Option<(Frontmatter, usize)> {
    let mut lines = text.split_inclusive('\n');
    let open = lines.next()?;
    if trim_eol(open) != FENCE || !open.ends_with('\n') {
        return None;
    }

    let mut offset = open.len();
    let inner_start = offset;
    for line in lines {
        if trim_eol(line) == FENCE {
            let inner = &text[inner_start..offset];
            let mapping = parse_mapping(inner)?;
            let close_end = offset + line.len();
            let fm = Frontmatter {
                open: open.to_string(),
                inner: inner.to_string(),
                close: line.to_string(),
                mapping,
            };
            return Some((fm, close_end));
        }
        offset += line.len();
    }
    None
}

fn parse_mapping(inner: &str) -> Option<Mapping> {
    if inner.trim().is_empty() {
        return Some(Mapping::new());
    }
    match serde_yaml::from_str::<Value>(inner) {
        Ok(Value::Mapping(mapping)) => Some(mapping),
        Ok(Value::Null) => Some(Mapping::new()),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("frontmatter: unparsable block treated as absent: {e}");
            None
        }
    }
}

/// Byte range of a top-level key's entry: its key line plus every following
/// indented, blank or list-item continuation line. A column-0 comment ends it.
fn find_entry(inner: &str, key: &str) -> Option<(usize, usize)> {
    let mut offset = 0;
    let mut found: Option<usize> = None;

    for line in inner.split_inclusive('\n') {
        let starts_entry = is_top_level(line);
        if let Some(start) = found {
            if starts_entry || line.starts_with('#') {
                return Some((start, offset));
            }
        } else if starts_entry && entry_key(line).as_deref() == Some(key) {
            found = Some(offset);
        }
        offset += line.len();
    }

    found.map(|start| (start, inner.len()))
}

fn is_top_level(line: &str) -> bool {
    let content = trim_eol(line);
    match content.chars().next() {
        None => false,
        Some(c) => !c.is_whitespace() && c != '#' && !content.starts_with("- ") && content != "-",
    }
}

fn entry_key(line: &str) -> Option<String> {
    match serde_yaml::from_str::<Value>(trim_eol(line)) {
        Ok(Value::Mapping(m)) => m.keys().next().and_then(Value::as_str).map(str::to_string),
        // Key with a block value on the following lines (`tags:`).
        _ => {
            let (k, _) = trim_eol(line).split_once(':')?;
            Some(k.trim().trim_matches(['"', '\'']).to_string())
        }
    }
}

fn trim_eol(line: &str) -> &str {
    line.trim_end_matches('\n').trim_end_matches('\r')
}
