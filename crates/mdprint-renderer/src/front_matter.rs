//! YAML front matter.

use std::fmt::Write;

use serde_yaml::{Mapping, Value};

use crate::error::RenderError;
use crate::util::escape_html;

/// Parsed front matter, in source order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrontMatter {
    entries: Vec<(String, String)>,
}

impl FrontMatter {
    /// Parse the body of a `---` delimited block.
    ///
    /// An empty block yields no entries. Anything other than a mapping is an error.
    pub fn parse(yaml: &str) -> Result<Self, RenderError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: Value = serde_yaml::from_str(yaml).map_err(RenderError::FrontMatter)?;
        match value {
            Value::Null => Ok(Self::default()),
            Value::Mapping(mapping) => Ok(Self::from_mapping(&mapping)),
            _ => Err(RenderError::FrontMatterShape),
        }
    }

    fn from_mapping(mapping: &Mapping) -> Self {
        let entries = mapping
            .iter()
            .map(|(key, value)| (scalar_text(key), value_text(value)))
            .collect();
        Self { entries }
    }

    /// Value of the `title` key, if present and non-empty.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.get("title").filter(|t| !t.trim().is_empty())
    }

    /// Value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All entries in source order.
    #[must_use]
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Render as a metadata table, omitting the title.
    ///
    /// Returns `None` when nothing besides the title is present.
    #[must_use]
    pub fn to_html(&self) -> Option<String> {
        let rows: Vec<_> = self.entries.iter().filter(|(k, _)| k != "title").collect();
        if rows.is_empty() {
            return None;
        }
        let mut html = String::from("<table class=\"front-matter\">\n<tbody>\n");
        for (key, value) in rows {
            let _ = writeln!(
                html,
                "<tr><th>{}</th><td>{}</td></tr>",
                escape_html(key),
                escape_html(value)
            );
        }
        html.push_str("</tbody>\n</table>\n");
        Some(html)
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_owned())
            .unwrap_or_default(),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Sequence(items) => items.iter().map(scalar_text).collect::<Vec<_>>().join(", "),
        Value::Tagged(tagged) => value_text(&tagged.value),
        other => scalar_text(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_mapping_in_order() {
        let fm = FrontMatter::parse("title: Report\nauthor: Ann\ntags: [a, b]\nversion: 2\n")
            .unwrap();
        assert_eq!(fm.title(), Some("Report"));
        assert_eq!(
            fm.entries(),
            &[
                ("title".to_owned(), "Report".to_owned()),
                ("author".to_owned(), "Ann".to_owned()),
                ("tags".to_owned(), "a, b".to_owned()),
                ("version".to_owned(), "2".to_owned()),
            ]
        );
    }

    #[test]
    fn test_empty_block() {
        let fm = FrontMatter::parse("\n").unwrap();
        assert!(fm.entries().is_empty());
        assert_eq!(fm.to_html(), None);
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let result = FrontMatter::parse("title: [unclosed\n");
        assert!(matches!(result, Err(RenderError::FrontMatter(_))));
    }

    #[test]
    fn test_non_mapping_is_error() {
        let result = FrontMatter::parse("- just\n- a list\n");
        assert!(matches!(result, Err(RenderError::FrontMatterShape)));
    }

    #[test]
    fn test_html_omits_title_and_escapes() {
        let fm = FrontMatter::parse("title: T\nauthor: A & B\n").unwrap();
        assert_eq!(
            fm.to_html().unwrap(),
            "<table class=\"front-matter\">\n<tbody>\n<tr><th>author</th><td>A &amp; B</td></tr>\n</tbody>\n</table>\n"
        );
    }

    #[test]
    fn test_title_only_has_no_table() {
        let fm = FrontMatter::parse("title: Only\n").unwrap();
        assert_eq!(fm.to_html(), None);
    }
}
