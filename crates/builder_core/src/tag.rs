//! Tag recognition for the artifact markup.
//!
//! Only four markers are recognized. Everything else that starts with `<` is
//! prose. Matching works on the unprocessed tail of the buffer and reports
//! `Incomplete` whenever the tail could still grow into a recognized tag.

/// Opening marker of an artifact tag.
pub const ARTIFACT_TAG_OPEN: &str = "<boltArtifact";
/// Closing tag of an artifact.
pub const ARTIFACT_TAG_CLOSE: &str = "</boltArtifact>";
/// Opening marker of an action tag.
pub const ACTION_TAG_OPEN: &str = "<boltAction";
/// Closing tag of an action.
pub const ACTION_TAG_CLOSE: &str = "</boltAction>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TagKind {
    ArtifactOpen,
    ArtifactClose,
    ActionOpen,
}

impl TagKind {
    pub(crate) fn marker(self) -> &'static str {
        match self {
            TagKind::ArtifactOpen => ARTIFACT_TAG_OPEN,
            TagKind::ArtifactClose => ARTIFACT_TAG_CLOSE,
            TagKind::ActionOpen => ACTION_TAG_OPEN,
        }
    }

    fn has_attributes(self) -> bool {
        !matches!(self, TagKind::ArtifactClose)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TagMatch {
    /// `len` bytes from the start of the input form the whole tag.
    Complete {
        kind: TagKind,
        len: usize,
        self_closing: bool,
    },
    /// The input ends before the tag can be classified.
    Incomplete,
    NoMatch,
}

/// Classify the tag starting at the first byte of `input` (which is `<`).
pub(crate) fn match_tag(input: &str, candidates: &[TagKind]) -> TagMatch {
    let mut incomplete = false;
    for &kind in candidates {
        match match_one(input, kind) {
            TagMatch::NoMatch => {}
            TagMatch::Incomplete => incomplete = true,
            complete @ TagMatch::Complete { .. } => return complete,
        }
    }
    if incomplete {
        TagMatch::Incomplete
    } else {
        TagMatch::NoMatch
    }
}

fn match_one(input: &str, kind: TagKind) -> TagMatch {
    let marker = kind.marker();
    if input.len() < marker.len() {
        return if marker.starts_with(input) {
            TagMatch::Incomplete
        } else {
            TagMatch::NoMatch
        };
    }
    if !input.starts_with(marker) {
        return TagMatch::NoMatch;
    }
    if !kind.has_attributes() {
        return TagMatch::Complete {
            kind,
            len: marker.len(),
            self_closing: false,
        };
    }

    // `<boltActionFoo` is not our tag; the name must end here.
    let after = &input[marker.len()..];
    match after.chars().next() {
        None => TagMatch::Incomplete,
        Some(c) if c == '>' || c == '/' || c.is_whitespace() => match after.find('>') {
            Some(end) => {
                let len = marker.len() + end + 1;
                TagMatch::Complete {
                    kind,
                    len,
                    self_closing: input[..len - 1].trim_end().ends_with('/'),
                }
            }
            None => TagMatch::Incomplete,
        },
        Some(_) => TagMatch::NoMatch,
    }
}

/// Length of the longest proper prefix of `marker` that `input` ends with.
pub(crate) fn partial_suffix_len(input: &str, marker: &str) -> usize {
    (1..marker.len())
        .rev()
        .find(|&len| input.ends_with(&marker[..len]))
        .unwrap_or(0)
}

/// Attributes of one opening tag, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TagAttributes {
    entries: Vec<(String, String)>,
}

impl TagAttributes {
    /// Parse the attributes of a complete opening tag such as `<boltAction type="file">`.
    pub(crate) fn parse(tag: &str, marker: &str) -> Self {
        let body = tag.strip_prefix(marker).unwrap_or(tag);
        let body = body.strip_suffix('>').unwrap_or(body);
        Self {
            entries: parse_pairs(body),
        }
    }

    /// First value for `name`. Names are case-sensitive (`filePath`, `subType`).
    pub(crate) fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

fn parse_pairs(body: &str) -> Vec<(String, String)> {
    let bytes = body.as_bytes();
    let mut entries = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos].is_ascii_whitespace() || bytes[pos] == b'/' {
            pos += 1;
            continue;
        }

        let name_start = pos;
        while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() && bytes[pos] != b'=' {
            pos += 1;
        }
        let name = &body[name_start..pos];
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if bytes.get(pos) != Some(&b'=') {
            entries.push((name.to_string(), String::new()));
            continue;
        }
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }

        let value = match bytes.get(pos) {
            Some(&quote @ (b'"' | b'\'')) => {
                let value_start = pos + 1;
                // An unterminated quote takes the rest of the tag.
                let value_end = body[value_start..]
                    .find(quote as char)
                    .map_or(body.len(), |offset| value_start + offset);
                pos = (value_end + 1).min(bytes.len());
                &body[value_start..value_end]
            }
            Some(_) => {
                let value_start = pos;
                while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() {
                    pos += 1;
                }
                &body[value_start..pos]
            }
            None => "",
        };
        entries.push((name.to_string(), unescape(value)));
    }

    entries
}

fn unescape(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPENERS: &[TagKind] = &[TagKind::ActionOpen, TagKind::ArtifactClose];

    #[test]
    fn complete_open_tag_reports_its_length() {
        let input = r#"<boltAction type="shell">npm i"#;
        assert_eq!(
            match_tag(input, OPENERS),
            TagMatch::Complete {
                kind: TagKind::ActionOpen,
                len: input.find('>').unwrap() + 1,
                self_closing: false,
            }
        );
    }

    #[test]
    fn tail_prefix_of_marker_is_incomplete() {
        assert_eq!(match_tag("<", OPENERS), TagMatch::Incomplete);
        assert_eq!(match_tag("<boltAc", OPENERS), TagMatch::Incomplete);
        assert_eq!(match_tag("</boltArt", OPENERS), TagMatch::Incomplete);
        assert_eq!(match_tag("<boltAction", OPENERS), TagMatch::Incomplete);
        assert_eq!(match_tag(r#"<boltAction type="fi"#, OPENERS), TagMatch::Incomplete);
    }

    #[test]
    fn other_tags_do_not_match() {
        assert_eq!(match_tag("<div>", OPENERS), TagMatch::NoMatch);
        assert_eq!(match_tag("<boltActions>", OPENERS), TagMatch::NoMatch);
        assert_eq!(match_tag("< 3", OPENERS), TagMatch::NoMatch);
        assert_eq!(
            match_tag(r#"<boltArtifact id="a">"#, OPENERS),
            TagMatch::NoMatch
        );
    }

    #[test]
    fn self_closing_tag_is_flagged() {
        let input = r#"<boltAction type="shell" />"#;
        assert_eq!(
            match_tag(input, OPENERS),
            TagMatch::Complete {
                kind: TagKind::ActionOpen,
                len: input.len(),
                self_closing: true,
            }
        );
    }

    #[test]
    fn partial_suffix_finds_longest_prefix() {
        assert_eq!(partial_suffix_len("abc</bolt", ACTION_TAG_CLOSE), 6);
        assert_eq!(partial_suffix_len("abc<", ACTION_TAG_CLOSE), 1);
        assert_eq!(partial_suffix_len("abc", ACTION_TAG_CLOSE), 0);
        assert_eq!(partial_suffix_len("a</boltAction", ACTION_TAG_CLOSE), 12);
    }

    #[test]
    fn attributes_accept_quote_styles_and_entities() {
        let attrs = TagAttributes::parse(
            r#"<boltArtifact id='app' title="Say &quot;hi&quot;" type=bundled hidden>"#,
            ARTIFACT_TAG_OPEN,
        );
        assert_eq!(attrs.get("id"), Some("app"));
        assert_eq!(attrs.get("title"), Some("Say \"hi\""));
        assert_eq!(attrs.get("type"), Some("bundled"));
        assert_eq!(attrs.get("hidden"), Some(""));
        assert_eq!(attrs.get("missing"), None);
    }

    #[test]
    fn attribute_names_are_matched_whole() {
        let attrs = TagAttributes::parse(
            r#"<boltArtifact data-id="x" id="y">"#,
            ARTIFACT_TAG_OPEN,
        );
        assert_eq!(attrs.get("id"), Some("y"));
    }

    #[test]
    fn malformed_attributes_do_not_panic() {
        let attrs = TagAttributes::parse(r#"<boltAction ="x" type="file filePath=>"#, ACTION_TAG_OPEN);
        assert_eq!(attrs.get("type"), Some("file filePath="));

        let attrs = TagAttributes::parse("<boltAction type= >", ACTION_TAG_OPEN);
        assert_eq!(attrs.get("type"), Some(""));

        let attrs = TagAttributes::parse("<boltAction type=\"été\"/>", ACTION_TAG_OPEN);
        assert_eq!(attrs.get("type"), Some("été"));
    }
}
