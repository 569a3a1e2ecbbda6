use regex::Regex;
use std::sync::LazyLock;

use crate::core::task::Priority;

static HEADLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<stars>\*+)(?: (?P<rest>.*))?$").unwrap());

static TASK_HEADLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<state>TODO|DONE) )?(?:\[#(?P<priority>[ABC])\] )?(?P<title>.*)$").unwrap()
});

static PROPERTY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*:(?P<key>[A-Z_]+):(?:\s+(?P<value>.*))?$").unwrap());

/// Indentation applied to body lines so they never start with `*`.
pub const BODY_INDENT: &str = "  ";

pub struct OrgParser;

/// A parsed org heading with its property drawer and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHeading {
    pub level: usize,
    /// Everything after the stars, untouched.
    pub raw_title: String,
    pub done: Option<bool>,
    pub priority: Option<Priority>,
    /// Title with any TODO/DONE keyword and priority cookie removed.
    pub title: String,
    pub properties: Vec<(String, String)>,
    /// Body lines with the writer's indentation stripped, joined by `\n`.
    pub body: String,
}

impl OrgParser {
    /// Parse an org file string into a list of headings.
    /// Lines before the first heading (`#+TITLE:` and friends) are skipped.
    ///
    /// Body lines keep a trailing `\r`; headlines and drawers ignore it.
    pub fn parse(input: &str) -> Vec<ParsedHeading> {
        let lines: Vec<&str> = input.split_terminator('\n').collect();
        let mut headings = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let Some(captures) = HEADLINE_RE.captures(without_cr(lines[i])) else {
                i += 1;
                continue;
            };
            let level = captures["stars"].len();
            let raw_title = captures
                .name("rest")
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();

            let (done, priority, title) = match TASK_HEADLINE_RE.captures(&raw_title) {
                Some(caps) => (
                    caps.name("state").map(|m| m.as_str() == "DONE"),
                    caps.name("priority")
                        .and_then(|m| Priority::from_org(m.as_str())),
                    caps["title"].to_string(),
                ),
                None => (None, None, raw_title.clone()),
            };

            i += 1;

            let mut properties = Vec::new();
            if i < lines.len() && lines[i].trim() == ":PROPERTIES:" {
                i += 1;
                while i < lines.len() && lines[i].trim() != ":END:" {
                    if let Some(caps) = PROPERTY_RE.captures(without_cr(lines[i])) {
                        let value = caps
                            .name("value")
                            .map(|m| m.as_str().trim_end().to_string())
                            .unwrap_or_default();
                        properties.push((caps["key"].to_string(), value));
                    }
                    i += 1;
                }
                if i < lines.len() {
                    i += 1; // skip :END:
                }
            }

            let mut body_lines = Vec::new();
            while i < lines.len() && !HEADLINE_RE.is_match(without_cr(lines[i])) {
                let line = lines[i];
                body_lines.push(line.strip_prefix(BODY_INDENT).unwrap_or(line));
                i += 1;
            }

            headings.push(ParsedHeading {
                level,
                raw_title,
                done,
                priority,
                title,
                properties,
                body: body_lines.join("\n"),
            });
        }

        headings
    }

    /// Extract a property value by key.
    pub fn get_property<'a>(props: &'a [(String, String)], key: &str) -> Option<&'a str> {
        props
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

fn without_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}
