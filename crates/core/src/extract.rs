//! Recovery of JSON objects embedded in free text.
//!
//! Model replies mix narration with tool-call objects. The scanner walks the
//! text once and tracks whether it is outside any object, inside one, inside a
//! string literal, or right after a backslash inside a string. Braces only
//! count outside string literals. Each outermost balanced span is parsed on its
//! own; spans that do not parse are dropped.

use std::str::CharIndices;

use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScanState {
    Idle,
    InObject,
    InString,
    InEscape,
}

/// Iterator over the well-formed top-level JSON objects in a text.
pub struct ObjectScanner<'a> {
    text: &'a str,
    chars: CharIndices<'a>,
    state: ScanState,
    depth: usize,
    start: usize,
}

impl<'a> ObjectScanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, chars: text.char_indices(), state: ScanState::Idle, depth: 0, start: 0 }
    }
}

impl Iterator for ObjectScanner<'_> {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        for (index, ch) in self.chars.by_ref() {
            match (self.state, ch) {
                (ScanState::Idle, '{') => {
                    self.state = ScanState::InObject;
                    self.depth = 1;
                    self.start = index;
                }
                (ScanState::Idle, _) => {}
                (ScanState::InObject, '"') => self.state = ScanState::InString,
                (ScanState::InObject, '{') => self.depth += 1,
                (ScanState::InObject, '}') => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        self.state = ScanState::Idle;
                        let span = &self.text[self.start..=index];
                        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(span)
                        {
                            return Some(value);
                        }
                    }
                }
                (ScanState::InObject, _) => {}
                (ScanState::InString, '\\') => self.state = ScanState::InEscape,
                (ScanState::InString, '"') => self.state = ScanState::InObject,
                (ScanState::InString, _) => {}
                (ScanState::InEscape, _) => self.state = ScanState::InString,
            }
        }

        None
    }
}

/// All well-formed top-level objects in `text`, left to right.
pub fn extract_json_objects(text: &str) -> Vec<Value> {
    ObjectScanner::new(text).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::extract_json_objects;

    #[test]
    fn narration_with_nested_object() {
        let objects = extract_json_objects(r#"foo {"a":1} bar {"b":{"c":2}} baz"#);
        assert_eq!(objects, vec![json!({"a": 1}), json!({"b": {"c": 2}})]);
    }

    #[test]
    fn unterminated_object_yields_nothing() {
        assert!(extract_json_objects(r#"{"x":1"#).is_empty());
    }

    #[test]
    fn empty_and_plain_text_yield_nothing() {
        assert!(extract_json_objects("").is_empty());
        assert!(extract_json_objects("no tool calls here } { stray").is_empty());
    }

    #[test]
    fn braces_inside_strings_are_not_counted() {
        let objects = extract_json_objects(r#"call {"note":"use } and { freely","n":1} done"#);
        assert_eq!(objects, vec![json!({"note": "use } and { freely", "n": 1})]);
    }

    #[test]
    fn escaped_quotes_keep_string_open() {
        let objects = extract_json_objects(r#"{"q":"say \"hi}\" now"} {"k":2}"#);
        assert_eq!(objects, vec![json!({"q": "say \"hi}\" now"}), json!({"k": 2})]);
    }

    #[test]
    fn escaped_backslash_before_closing_quote() {
        let objects = extract_json_objects(r#"{"path":"C:\\"} tail"#);
        assert_eq!(objects, vec![json!({"path": "C:\\"})]);
    }

    #[test]
    fn malformed_span_is_dropped_and_scan_continues() {
        let objects = extract_json_objects(r#"{not json} then {"ok":true} and {'single':1}"#);
        assert_eq!(objects, vec![json!({"ok": true})]);
    }

    #[test]
    fn inner_objects_are_not_emitted_separately() {
        let objects = extract_json_objects(
            r#"{"tool_name":"get_shipping_quote","args":{"country":"DE","postal_code":"10115"}}"#,
        );
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0]["args"]["country"], "DE");
    }

    #[test]
    fn multibyte_text_around_objects() {
        let objects =
            extract_json_objects(r#"Versand nach Österreich → {"tool_name":"resolve_country","args":{"name":"Österreich"}} ✓"#);
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0]["args"]["name"], "Österreich");
    }

    #[test]
    fn k_objects_among_noise_are_returned_in_order() {
        let noise = ["", "text ", "} ", "\"quoted\" ", "{broken ", "\n\t"];
        for k in 0..6usize {
            let mut text = String::new();
            for i in 0..k {
                text.push_str(noise[i % noise.len()]);
                if noise[i % noise.len()].starts_with('{') {
                    // An unterminated brace would swallow the next object.
                    text.push_str("} ");
                }
                text.push_str(&format!(r#"{{"i":{i},"s":"{{\"x\"}}","n":{{"d":[{i}]}}}}"#));
            }
            text.push_str(" trailing");

            let objects = extract_json_objects(&text);
            assert_eq!(objects.len(), k, "text: {text}");
            for (i, object) in objects.iter().enumerate() {
                assert_eq!(object["i"], json!(i));
            }
        }
    }
}
