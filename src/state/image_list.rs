/// Stored image lists
///
/// The `images` column is supposed to hold a JSON array of paths, but legacy
/// rows contain single-quoted lists, double-encoded strings, bare paths and
/// the occasional array of `{url: ...}` objects. This module reads all of
/// those shapes and reports whether the value had to be repaired.
use serde_json::Value;

/// Outcome of reading one stored `images` value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedImages {
    /// Well-formed JSON array of strings (or NULL / blank)
    Clean(Vec<String>),
    /// Recovered from a legacy or malformed shape
    Repaired(Vec<String>),
    /// Could not be recovered; callers treat it as an empty list
    Unreadable,
}

impl ParsedImages {
    #[cfg(test)]
    pub fn into_images(self) -> Vec<String> {
        match self {
            ParsedImages::Clean(images) | ParsedImages::Repaired(images) => images,
            ParsedImages::Unreadable => Vec::new(),
        }
    }

    fn repaired(self) -> Self {
        match self {
            ParsedImages::Clean(images) => ParsedImages::Repaired(images),
            other => other,
        }
    }
}

/// Object keys accepted when an array holds objects instead of strings
const OBJECT_PATH_KEYS: [&str; 3] = ["url", "path", "src"];

/// Read a stored `images` value, tolerating the known malformed shapes.
pub fn parse_image_list(raw: Option<&str>) -> ParsedImages {
    let Some(raw) = raw else {
        return ParsedImages::Clean(Vec::new());
    };
    let text = raw.trim();
    if text.is_empty() {
        return ParsedImages::Clean(Vec::new());
    }

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return match value {
            Value::Null => ParsedImages::Clean(Vec::new()),
            Value::Array(items) => from_json_items(items),
            // Double-encoded list, or a JSON string holding a bare path
            Value::String(inner) => parse_image_list(Some(inner.as_str())).repaired(),
            _ => ParsedImages::Unreadable,
        };
    }

    if text.starts_with('[') {
        return match split_bracketed(text) {
            Some(images) => ParsedImages::Repaired(images),
            None => ParsedImages::Unreadable,
        };
    }

    split_bare(text)
}

/// Serialize a list for storage. Always produces a JSON array of strings.
pub fn to_json(images: &[String]) -> Result<String, serde_json::Error> {
    serde_json::to_string(images)
}

fn from_json_items(items: Vec<Value>) -> ParsedImages {
    let mut images = Vec::with_capacity(items.len());
    let mut repaired = false;

    for item in items {
        match item {
            Value::String(path) => {
                let path = path.trim();
                if path.is_empty() {
                    repaired = true;
                } else {
                    images.push(path.to_string());
                }
            }
            Value::Object(map) => {
                repaired = true;
                let path = OBJECT_PATH_KEYS
                    .iter()
                    .find_map(|key| map.get(*key).and_then(Value::as_str));
                if let Some(path) = path.map(str::trim).filter(|p| !p.is_empty()) {
                    images.push(path.to_string());
                }
            }
            _ => repaired = true,
        }
    }

    if repaired {
        ParsedImages::Repaired(images)
    } else {
        ParsedImages::Clean(images)
    }
}

/// Split `['a.jpg', "b.jpg", c.jpg]`. Quoted items may use either quote
/// character and backslash escapes; unquoted items run to the next comma.
/// Returns `None` on an unterminated quote or stray bracket.
fn split_bracketed(text: &str) -> Option<Vec<String>> {
    let inner = text.strip_prefix('[')?.strip_suffix(']')?;
    let mut chars = inner.chars().peekable();
    let mut images = Vec::new();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        match chars.peek().copied() {
            None => break,
            Some(quote @ ('\'' | '"')) => {
                chars.next();
                let mut item = String::new();
                loop {
                    match chars.next()? {
                        '\\' => item.push(chars.next()?),
                        c if c == quote => break,
                        c => item.push(c),
                    }
                }
                let item = item.trim();
                if !item.is_empty() {
                    images.push(item.to_string());
                }

                while chars.next_if(|c| c.is_whitespace()).is_some() {}
                match chars.next() {
                    None => break,
                    Some(',') => continue,
                    Some(_) => return None,
                }
            }
            Some(_) => {
                let mut item = String::new();
                let mut at_end = true;
                for c in chars.by_ref() {
                    if c == ',' {
                        at_end = false;
                        break;
                    }
                    item.push(c);
                }
                let item = item.trim();
                if item.contains(['[', ']', '\'', '"']) {
                    return None;
                }
                if !item.is_empty() {
                    images.push(item.to_string());
                }
                if at_end {
                    break;
                }
            }
        }
    }

    Some(images)
}

/// A single bare path, or several separated by commas.
fn split_bare(text: &str) -> ParsedImages {
    if text.contains([']', '{', '}']) {
        return ParsedImages::Unreadable;
    }
    let images: Vec<String> = text
        .split(',')
        .map(|item| item.trim().trim_matches(|c: char| c == '\'' || c == '"').trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    ParsedImages::Repaired(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_clean_json_array() {
        assert_eq!(
            parse_image_list(Some(r#"["/uploads/properties/a.jpg", "b.jpg"]"#)),
            ParsedImages::Clean(strings(&["/uploads/properties/a.jpg", "b.jpg"]))
        );
    }

    #[test]
    fn test_null_and_blank_are_clean_and_empty() {
        assert_eq!(parse_image_list(None), ParsedImages::Clean(vec![]));
        assert_eq!(parse_image_list(Some("  ")), ParsedImages::Clean(vec![]));
        assert_eq!(parse_image_list(Some("null")), ParsedImages::Clean(vec![]));
        assert_eq!(parse_image_list(Some("[]")), ParsedImages::Clean(vec![]));
    }

    #[test]
    fn test_single_quoted_list_is_repaired() {
        assert_eq!(
            parse_image_list(Some("['a.jpg']")),
            ParsedImages::Repaired(strings(&["a.jpg"]))
        );
        assert_eq!(
            parse_image_list(Some("['a.jpg', 'b.png',]")),
            ParsedImages::Repaired(strings(&["a.jpg", "b.png"]))
        );
    }

    #[test]
    fn test_apostrophes_survive_inside_double_quotes() {
        // A blanket quote swap would corrupt this one
        assert_eq!(
            parse_image_list(Some(r#"["it's-sunny.jpg", 'b.jpg']"#)),
            ParsedImages::Repaired(strings(&["it's-sunny.jpg", "b.jpg"]))
        );
        assert_eq!(
            parse_image_list(Some(r"['it\'s.jpg']")),
            ParsedImages::Repaired(strings(&["it's.jpg"]))
        );
    }

    #[test]
    fn test_unquoted_items() {
        assert_eq!(
            parse_image_list(Some("[a.jpg, /uploads/properties/b.jpg]")),
            ParsedImages::Repaired(strings(&["a.jpg", "/uploads/properties/b.jpg"]))
        );
    }

    #[test]
    fn test_double_encoded_string() {
        assert_eq!(
            parse_image_list(Some(r#""[\"a.jpg\",\"b.jpg\"]""#)),
            ParsedImages::Repaired(strings(&["a.jpg", "b.jpg"]))
        );
    }

    #[test]
    fn test_bare_paths() {
        assert_eq!(
            parse_image_list(Some("/uploads/properties/a.jpg")),
            ParsedImages::Repaired(strings(&["/uploads/properties/a.jpg"]))
        );
        assert_eq!(
            parse_image_list(Some("a.jpg, b.jpg")),
            ParsedImages::Repaired(strings(&["a.jpg", "b.jpg"]))
        );
    }

    #[test]
    fn test_object_items_and_junk_elements() {
        assert_eq!(
            parse_image_list(Some(r#"[{"url": "a.jpg"}, 42, null, "b.jpg", ""]"#)),
            ParsedImages::Repaired(strings(&["a.jpg", "b.jpg"]))
        );
    }

    #[test]
    fn test_unrecoverable_shapes() {
        assert_eq!(parse_image_list(Some("['a.jpg")), ParsedImages::Unreadable);
        assert_eq!(parse_image_list(Some("['a.jpg' 'b.jpg']")), ParsedImages::Unreadable);
        assert_eq!(parse_image_list(Some("[['a.jpg']]")), ParsedImages::Unreadable);
        assert_eq!(parse_image_list(Some("42")), ParsedImages::Unreadable);
        assert_eq!(parse_image_list(Some("{broken")), ParsedImages::Unreadable);
        assert!(parse_image_list(Some("{broken")).into_images().is_empty());
    }

    #[test]
    fn test_to_json_round_trips_through_parser() {
        let images = strings(&["/uploads/properties/it's.jpg"]);
        let json = to_json(&images).unwrap();
        assert_eq!(parse_image_list(Some(json.as_str())), ParsedImages::Clean(images));
    }
}
