//! Front-matter parsing: turns the raw bytes of one content file into a [`ContentRecord`].
//!
//! Parsing never fails. A missing, unterminated or malformed front-matter block
//! simply contributes no metadata, and the defaults below fill the gaps.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_TITLE: &str = "Untitled";

const DELIMITER: &str = "---";

/// Metadata carried by every record: the known fields plus any extra
/// front-matter keys, passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub title: String,
    pub slug: String,
    #[serde(rename = "publishDate")]
    pub publish_date: String,
    pub draft: bool,
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Metadata {
    /// Look up any front-matter key, known or extra, as a JSON value.
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "title" => Some(Value::String(self.title.clone())),
            "slug" => Some(Value::String(self.slug.clone())),
            "publishDate" => Some(Value::String(self.publish_date.clone())),
            "draft" => Some(Value::Bool(self.draft)),
            "tags" => Some(Value::from(self.tags.clone())),
            other => self.extra.get(other).cloned(),
        }
    }
}

/// One parsed content file. Built once by [`parse`] and read through accessors only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentRecord {
    metadata: Metadata,
    content: String,
    #[serde(rename = "rawContent")]
    raw_content: String,
    source: PathBuf,
}

impl ContentRecord {
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Body text with the front-matter block stripped.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// The whole file as read.
    pub fn raw_content(&self) -> &str {
        &self.raw_content
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

/// Parse a content file. `path` only feeds the slug fallback and [`ContentRecord::source`].
pub fn parse(raw: &[u8], path: &Path) -> ContentRecord {
    let raw_content = String::from_utf8_lossy(raw).into_owned();
    let (front_matter, content) = split_front_matter(&raw_content);

    let mut fields = front_matter.map(parse_mapping).unwrap_or_default();
    let title = fields.remove("title").and_then(scalar_string);
    let slug = fields.remove("slug").and_then(scalar_string);
    let publish_date = fields.remove("publishDate").and_then(scalar_string);
    let draft = fields.remove("draft").and_then(as_bool);
    let tags = fields.remove("tags").map(as_tags);

    let metadata = Metadata {
        title: title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        slug: slug.unwrap_or_else(|| file_stem(path)),
        publish_date: publish_date
            .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        draft: draft.unwrap_or(true),
        tags: tags.unwrap_or_default(),
        extra: fields,
    };
    debug!(path = %path.display(), slug = %metadata.slug, "Parsed content file");

    ContentRecord {
        metadata,
        content: content.to_string(),
        raw_content,
        source: path.to_path_buf(),
    }
}

/// Split `text` into its front-matter source (if a complete block opens the file) and the body.
fn split_front_matter(text: &str) -> (Option<&str>, &str) {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let Some(after_open) = strip_delimiter_line(text) else {
        return (None, text);
    };

    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']).trim_end() == DELIMITER {
            let yaml = &after_open[..offset];
            let body = &after_open[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }
    (None, text)
}

/// If the first line of `text` is the opening delimiter, return what follows it.
fn strip_delimiter_line(text: &str) -> Option<&str> {
    let (first, rest) = match text.find('\n') {
        Some(idx) => (&text[..idx], &text[idx + 1..]),
        None => (text, ""),
    };
    (first.trim_end_matches('\r').trim_end() == DELIMITER).then_some(rest)
}

fn parse_mapping(yaml: &str) -> Map<String, Value> {
    let mapping = match serde_yaml::from_str(yaml) {
        Ok(serde_yaml::Value::Mapping(mapping)) => mapping,
        Ok(_) => return Map::new(),
        Err(e) => {
            debug!(error = %e, "Ignoring malformed front-matter");
            return Map::new();
        }
    };

    let mut fields = Map::new();
    for (key, value) in mapping {
        let Some(key) = yaml_key(&key) else {
            debug!(?key, "Skipping front-matter entry with a non-scalar key");
            continue;
        };
        match serde_json::to_value(value) {
            Ok(value) => {
                fields.insert(key, value);
            }
            Err(e) => debug!(error = %e, %key, "Skipping front-matter value not representable as JSON"),
        }
    }
    fields
}

/// Render a scalar YAML key as a string; null, sequence and mapping keys have no form.
fn yaml_key(key: &serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn scalar_string(value: Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

fn as_bool(value: Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(b),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_tags(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.into_iter().filter_map(scalar_string).collect(),
        other => scalar_string(other).into_iter().collect(),
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(text: &str) -> ContentRecord {
        parse(text.as_bytes(), Path::new("posts/hello-world.md"))
    }

    #[test]
    fn explicit_front_matter_wins() {
        let record = parse_str(
            "---\ntitle: \"Hello\"\nslug: greeting\npublishDate: \"2020-01-01\"\ndraft: false\ntags: [rust, blog]\n---\n# Body\n",
        );
        let meta = record.metadata();
        assert_eq!(meta.title, "Hello");
        assert_eq!(meta.slug, "greeting");
        assert_eq!(meta.publish_date, "2020-01-01");
        assert!(!meta.draft);
        assert_eq!(meta.tags, vec!["rust", "blog"]);
        assert_eq!(record.content(), "# Body\n");
    }

    #[test]
    fn missing_front_matter_uses_defaults() {
        let record = parse_str("Just text.\n");
        let meta = record.metadata();
        assert_eq!(meta.title, DEFAULT_TITLE);
        assert_eq!(meta.slug, "hello-world");
        assert!(meta.draft);
        assert!(meta.tags.is_empty());
        assert!(chrono::DateTime::parse_from_rfc3339(&meta.publish_date).is_ok());
        assert_eq!(record.content(), "Just text.\n");
        assert_eq!(record.raw_content(), "Just text.\n");
    }

    #[test]
    fn parse_is_total() {
        let inputs: [&[u8]; 7] = [
            b"",
            b"---",
            b"---\n",
            b"---\ntitle: [unclosed\n---\nbody",
            b"---\n- just\n- a list\n---\n",
            b"---\ntitle: x\nno closing delimiter",
            &[0xff, 0xfe, b'-', b'-', b'-', b'\n'],
        ];
        for input in inputs {
            let record = parse(input, Path::new("a.md"));
            let meta = record.metadata();
            assert!(!meta.title.is_empty());
            assert_eq!(meta.slug, "a");
            assert!(!meta.publish_date.is_empty());
            assert!(meta.draft);
        }
    }

    #[test]
    fn odd_keys_do_not_discard_the_rest_of_the_block() {
        let record = parse_str(
            "---\ntitle: Hello\ndraft: false\n~: weird\n[a, b]: seq\n1: one\nnested:\n  ? [x]\n  : y\n---\nbody",
        );
        let meta = record.metadata();
        assert_eq!(meta.title, "Hello");
        assert!(!meta.draft);
        assert_eq!(meta.extra.get("1"), Some(&Value::from("one")));
        assert!(!meta.extra.contains_key("nested"));
        assert_eq!(record.content(), "body");
    }

    #[test]
    fn malformed_block_is_still_stripped_from_body() {
        let record = parse_str("---\ntitle: [unclosed\n---\nbody");
        assert_eq!(record.metadata().title, DEFAULT_TITLE);
        assert_eq!(record.content(), "body");
    }

    #[test]
    fn unterminated_block_is_body() {
        let text = "---\ntitle: x\nno closing delimiter";
        let record = parse_str(text);
        assert_eq!(record.metadata().title, DEFAULT_TITLE);
        assert_eq!(record.content(), text);
    }

    #[test]
    fn unknown_keys_pass_through() {
        let record = parse_str("---\ntitle: T\nauthor: Sam\nseries:\n  name: intro\n  part: 2\n---\n");
        let meta = record.metadata();
        assert_eq!(meta.extra.get("author"), Some(&Value::from("Sam")));
        assert_eq!(meta.get("series").and_then(|s| s.get("part").cloned()), Some(Value::from(2)));
        assert!(!meta.extra.contains_key("title"));
        assert_eq!(meta.get("title"), Some(Value::from("T")));
    }

    #[test]
    fn loose_types_are_coerced() {
        let record = parse_str("---\ntitle: 42\ndraft: \"false\"\ntags: solo\npublishDate: 2021-06-01T10:00:00Z\n---\n");
        let meta = record.metadata();
        assert_eq!(meta.title, "42");
        assert!(!meta.draft);
        assert_eq!(meta.tags, vec!["solo"]);
        assert_eq!(meta.publish_date, "2021-06-01T10:00:00Z");
    }

    #[test]
    fn uninterpretable_draft_is_unpublished() {
        let record = parse_str("---\ndraft: maybe\n---\n");
        assert!(record.metadata().draft);
    }

    #[test]
    fn empty_title_falls_back() {
        let record = parse_str("---\ntitle: \"\"\n---\n");
        assert_eq!(record.metadata().title, DEFAULT_TITLE);
    }

    #[test]
    fn crlf_and_bom_are_handled() {
        let record = parse_str("\u{feff}---\r\ntitle: Windows\r\n---\r\nbody\r\n");
        assert_eq!(record.metadata().title, "Windows");
        assert_eq!(record.content(), "body\r\n");
    }

    #[test]
    fn metadata_serializes_with_camel_case_date() {
        let record = parse_str("---\ntitle: T\npublishDate: \"2020-01-01\"\nauthor: Sam\n---\n");
        let json = serde_json::to_value(record.metadata()).unwrap();
        assert_eq!(json["publishDate"], "2020-01-01");
        assert_eq!(json["author"], "Sam");
    }
}
