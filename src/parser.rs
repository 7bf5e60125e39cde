//! Pure text-parsing helpers over Dokku's line-oriented command output.

use std::collections::HashMap;

/// Trim each line, dropping empty lines and `====`-prefixed header lines.
pub fn parse_lines_skip_headers(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("===="))
        .map(str::to_string)
        .collect()
}

/// Split each line at the first occurrence of `sep`, trimming both sides.
/// On duplicate keys, the last line wins.
pub fn parse_key_value(text: &str, sep: char) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in parse_lines_skip_headers(text) {
        if let Some(idx) = line.find(sep) {
            let key = line[..idx].trim().to_string();
            let value = line[idx + sep.len_utf8()..].trim().to_string();
            map.insert(key, value);
        }
    }
    map
}

/// Parse a single `key: value` line. Returns `(key, value, true)` on success,
/// or `(String::new(), String::new(), false)` if the line has no colon.
pub fn parse_colon_key_value_line(line: &str) -> (String, String, bool) {
    match line.find(':') {
        Some(idx) => (
            line[..idx].trim().to_string(),
            line[idx + 1..].trim().to_string(),
            true,
        ),
        None => (String::new(), String::new(), false),
    }
}

/// Parse `plugin:list` output into `(name, status)` pairs. The format is
/// `name version status description…`; status is the third
/// whitespace-separated field, not the last.
pub fn parse_plugin_list(text: &str) -> Vec<(String, String)> {
    parse_lines_skip_headers(text)
        .into_iter()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() >= 3 {
                Some((fields[0].to_string(), fields[2].to_string()))
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blank_and_header_lines() {
        let text = "==== App info\nfoo: bar\n\n  baz: qux  \n";
        let lines = parse_lines_skip_headers(text);
        assert_eq!(lines, vec!["foo: bar", "baz: qux"]);
    }

    #[test]
    fn key_value_last_write_wins() {
        let text = "a: 1\nb: 2\na: 3\n";
        let map = parse_key_value(text, ':');
        assert_eq!(map.get("a").map(String::as_str), Some("3"));
        assert_eq!(map.get("b").map(String::as_str), Some("2"));
    }

    #[test]
    fn colon_line_without_colon_is_not_ok() {
        let (k, v, ok) = parse_colon_key_value_line("no colon here");
        assert!(!ok);
        assert!(k.is_empty());
        assert!(v.is_empty());
    }

    #[test]
    fn plugin_list_status_is_third_field() {
        let text = "postgres 1.0.0 enabled description\nredis 1.2 disabled other\n";
        let plugins = parse_plugin_list(text);
        assert_eq!(
            plugins,
            vec![
                ("postgres".to_string(), "enabled".to_string()),
                ("redis".to_string(), "disabled".to_string()),
            ]
        );
    }
}
