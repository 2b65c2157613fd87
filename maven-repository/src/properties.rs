//! Minimal reader for Java-style `.properties` files such as `pom.properties`.

use std::collections::HashMap;

/// Parsed key/value pairs of a properties file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    values: HashMap<String, String>,
}

impl Properties {
    /// Parse properties text.
    ///
    /// Supports `#`/`!` comments, `=`, `:` or whitespace separators,
    /// backslash line continuations and backslash escapes (`\t`, `\n`, `\uXXXX`,
    /// and `\` before any other character). Later keys override earlier ones.
    pub fn parse(text: &str) -> Self {
        let mut values = HashMap::new();
        let mut logical = String::new();

        for line in text.lines() {
            let line = line.trim_start();
            if logical.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
                continue;
            }

            if ends_with_continuation(line) {
                logical.push_str(&line[..line.len() - 1]);
                continue;
            }
            logical.push_str(line);

            let (key, value) = split_entry(&logical);
            values.insert(key, value);
            logical.clear();
        }

        if !logical.is_empty() {
            let (key, value) = split_entry(&logical);
            values.insert(key, value);
        }

        Self { values }
    }

    /// Get a property by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Get a non-empty property by key.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| !value.is_empty())
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no properties were found.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A line continues when it ends in an odd number of backslashes.
fn ends_with_continuation(line: &str) -> bool {
    line.bytes().rev().take_while(|b| *b == b'\\').count() % 2 == 1
}

/// Split a logical line into its unescaped key and value.
fn split_entry(entry: &str) -> (String, String) {
    let mut key_end = entry.len();
    let mut escaped = false;
    for (idx, c) in entry.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || c.is_whitespace() {
            key_end = idx;
            break;
        }
    }

    let rest = entry[key_end..].trim_start();
    let rest = rest
        .strip_prefix('=')
        .or_else(|| rest.strip_prefix(':'))
        .unwrap_or(rest)
        .trim_start();
    (unescape(&entry[..key_end]), unescape(rest.trim_end()))
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{0c}'),
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == 4 => {
                        out.push(decoded);
                        chars.nth(3);
                    }
                    _ => out.push('u'),
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pom_properties() {
        let text = "#Generated by Maven\n#Tue Mar 04 10:00:00 CET 2014\nversion=1.2.0\ngroupId=be.nabu.libs\nartifactId=types-api\n";
        let props = Properties::parse(text);

        assert_eq!(props.len(), 3);
        assert_eq!(props.get("groupId"), Some("be.nabu.libs"));
        assert_eq!(props.get("artifactId"), Some("types-api"));
        assert_eq!(props.get("version"), Some("1.2.0"));
        assert_eq!(props.get("packaging"), None);
    }

    #[test]
    fn test_separators() {
        let props = Properties::parse("a = 1\nb: 2\nc 3\n! comment\nd=\n");

        assert_eq!(props.get("a"), Some("1"));
        assert_eq!(props.get("b"), Some("2"));
        assert_eq!(props.get("c"), Some("3"));
        assert_eq!(props.get("d"), Some(""));
        assert_eq!(props.get_non_empty("d"), None);
    }

    #[test]
    fn test_continuation() {
        let props = Properties::parse("version=1.\\\n  0\n");
        assert_eq!(props.get("version"), Some("1.0"));
    }

    #[test]
    fn test_escapes() {
        let props = Properties::parse(
            "version=1.0\\:beta\nmy\\ key\\=x = a\\tb\nname=caf\\u00e9\npath=C\\\\dir\\\\\nnext=1\n",
        );

        assert_eq!(props.get("version"), Some("1.0:beta"));
        assert_eq!(props.get("my key=x"), Some("a\tb"));
        assert_eq!(props.get("name"), Some("caf\u{e9}"));
        assert_eq!(props.get("path"), Some("C\\dir\\"));
        assert_eq!(props.get("next"), Some("1"));
    }

    #[test]
    fn test_empty() {
        assert!(Properties::parse("# nothing here\n\n").is_empty());
    }
}
