//! Type-text to schema mapping.
//!
//! [`TypeMapper`] converts the textual form of a TypeScript type, as produced by the
//! source-analysis collaborator, into a [`SchemaNode`]. It is a pragmatic scanner over
//! balanced brackets rather than a full type parser; rules are tried in a fixed order and
//! the first match wins:
//!
//! 1. inline object literal `{ a: T; b?: U }`
//! 2. union `A | B | ...` (after unwrapping a parenthesised expression)
//! 3. primitive keywords and literal types
//! 4. opaque binary markers (`Buffer`, streams)
//! 5. arrays `T[]`, `Array<T>`, `ReadonlyArray<T>`
//! 6. `Record<K, V>`, approximated as a free-form object
//! 7. named references `Name` / `Name<Args>`
//! 8. `{type: object}` fallback
//!
//! Mapping never fails: anything unrecognised becomes `{type: object}`.

use crate::schema::{SchemaNode, SchemaType};
use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static NAMED_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^[A-Z][A-Za-z0-9_]*(?:<.+>)?$").expect("named type pattern is valid")
});

/// Types serialized as raw bytes
const BINARY_MARKERS: &[&str] = &[
    "Buffer",
    "Blob",
    "Uint8Array",
    "ArrayBuffer",
    "Stream",
    "Readable",
    "ReadStream",
    "ReadableStream",
    "NodeJS.ReadableStream",
    "StreamableFile",
    "Express.Multer.File",
];

/// Type mapper - converts type text to OpenAPI schemas
pub struct TypeMapper;

impl TypeMapper {
    /// Map type text to a schema.
    ///
    /// Returns `None` when the type signals "no content" (`void`, `undefined`, `never`);
    /// callers must then omit the `content` entry instead of emitting an empty object.
    pub fn map_type(text: &str) -> Option<SchemaNode> {
        let text = text.trim();
        if text.is_empty() {
            return Some(SchemaNode::object());
        }

        if text.starts_with('{') && closes_at_end(text) {
            return Some(Self::map_inline_object(&text[1..text.len() - 1]));
        }

        if text.starts_with('(') && closes_at_end(text) {
            return Self::map_type(&text[1..text.len() - 1]);
        }

        let members = split_top_level(text, |c| c == '|');
        if members.len() > 1 {
            return Self::map_union(&members);
        }

        match text {
            "string" => return Some(SchemaNode::typed("string")),
            "number" => return Some(SchemaNode::typed("number")),
            "boolean" => return Some(SchemaNode::typed("boolean")),
            "Date" => return Some(SchemaNode::formatted("string", "date-time")),
            "void" | "undefined" | "never" => return None,
            "unknown" | "any" => return Some(SchemaNode::object()),
            _ => {}
        }

        if let Some(literal) = Self::map_literal(text) {
            return Some(literal);
        }

        if BINARY_MARKERS.contains(&text) {
            return Some(SchemaNode::formatted("string", "binary"));
        }

        if let Some(element) = text.strip_suffix("[]") {
            return Some(SchemaNode::array(Self::map_type_or_object(element)));
        }
        if let Some(element) =
            generic_argument(text, "Array").or_else(|| generic_argument(text, "ReadonlyArray"))
        {
            return Some(SchemaNode::array(Self::map_type_or_object(element)));
        }

        // Lossy on purpose: the value type is not carried into additionalProperties
        if generic_argument(text, "Record").is_some() {
            return Some(SchemaNode::object());
        }

        if Self::is_named_type(text) {
            return Some(SchemaNode::reference(text));
        }

        debug!("Unrecognized type text `{}`, using object placeholder", text);
        Some(SchemaNode::object())
    }

    /// Map type text, substituting `{type: object}` for "no content" types
    pub fn map_type_or_object(text: &str) -> SchemaNode {
        Self::map_type(text).unwrap_or_else(SchemaNode::object)
    }

    /// Whether the text is a bare PascalCase name with optional balanced generic arguments
    fn is_named_type(text: &str) -> bool {
        if !NAMED_TYPE_RE.is_match(text) {
            return false;
        }
        match text.find('<') {
            Some(open) => closes_at_end(&text[open..]),
            None => true,
        }
    }

    fn map_inline_object(body: &str) -> SchemaNode {
        let mut properties = IndexMap::new();
        let mut required = Vec::new();

        for member in split_top_level(body, |c| c == ';' || c == ',') {
            let member = member.trim();
            // Index signatures are not modelled
            if member.is_empty() || member.starts_with('[') {
                continue;
            }
            let Some(colon) = find_top_level(member, ':') else {
                continue;
            };

            let raw_name = member[..colon].trim();
            let raw_name = raw_name.strip_prefix("readonly ").unwrap_or(raw_name).trim();
            let (name, optional) = match raw_name.strip_suffix('?') {
                Some(name) => (name.trim_end(), true),
                None => (raw_name, false),
            };
            // Method signature
            if name.contains('(') {
                continue;
            }
            let name = strip_quotes(name).to_string();

            let schema = Self::map_type_or_object(&member[colon + 1..]);
            if !optional && !required.contains(&name) {
                required.push(name.clone());
            }
            properties.insert(name, schema);
        }

        SchemaNode {
            properties,
            required,
            ..SchemaNode::object()
        }
    }

    fn map_union(members: &[&str]) -> Option<SchemaNode> {
        let mut has_null = false;
        let mut kept = Vec::new();
        for member in members {
            match member.trim() {
                "undefined" => {}
                "null" => has_null = true,
                other => kept.push(other),
            }
        }

        let node = match kept.as_slice() {
            [] if has_null => SchemaNode {
                nullable: Some(true),
                ..SchemaNode::object()
            },
            [] => return None,
            [single] => {
                let node = Self::map_type(single)?;
                return Some(if has_null { make_nullable(node) } else { node });
            }
            _ => {
                if let Some(literals) = Self::map_literal_union(&kept) {
                    return Some(if has_null { make_nullable(literals) } else { literals });
                }

                let mut one_of: Vec<SchemaNode> =
                    kept.iter().filter_map(|member| Self::map_type(member)).collect();
                match one_of.len() {
                    0 => return None,
                    1 => {
                        let node = one_of.remove(0);
                        return Some(if has_null { make_nullable(node) } else { node });
                    }
                    _ => SchemaNode {
                        one_of,
                        nullable: has_null.then_some(true),
                        ..Default::default()
                    },
                }
            }
        };
        Some(node)
    }

    /// Literal type such as `'active'`, `42` or `true`
    fn map_literal(text: &str) -> Option<SchemaNode> {
        let (schema_type, value) = literal_value(text)?;
        Some(SchemaNode {
            enum_values: Some(vec![value]),
            ..SchemaNode::typed(schema_type)
        })
    }

    /// Union made only of literals of one kind
    fn map_literal_union(members: &[&str]) -> Option<SchemaNode> {
        let literals: Vec<(&str, Value)> = members
            .iter()
            .map(|member| literal_value(member))
            .collect::<Option<_>>()?;

        let schema_type = literals[0].0;
        if literals.iter().any(|(kind, _)| *kind != schema_type) {
            return None;
        }

        let mut values: Vec<Value> = Vec::new();
        for (_, value) in literals {
            if !values.contains(&value) {
                values.push(value);
            }
        }

        if schema_type == "boolean" && values.len() == 2 {
            return Some(SchemaNode::typed("boolean"));
        }
        Some(SchemaNode {
            enum_values: Some(values),
            ..SchemaNode::typed(schema_type)
        })
    }
}

/// Mark a mapped node nullable using the 3.0.x encoding.
///
/// A `$ref` cannot carry siblings, so it is wrapped in `allOf` first.
fn make_nullable(node: SchemaNode) -> SchemaNode {
    if node.reference.is_some() {
        return SchemaNode {
            all_of: vec![node],
            nullable: Some(true),
            ..Default::default()
        };
    }
    if node.schema_type == Some(SchemaType::Single("null".to_string())) {
        return node;
    }
    SchemaNode {
        nullable: Some(true),
        ..node
    }
}

fn literal_value(text: &str) -> Option<(&'static str, Value)> {
    let text = text.trim();
    if text.len() >= 2 {
        let quoted = ['\'', '"', '`']
            .iter()
            .any(|quote| text.starts_with(*quote) && text.ends_with(*quote));
        if quoted {
            return Some(("string", Value::String(text[1..text.len() - 1].to_string())));
        }
    }
    match text {
        "true" => return Some(("boolean", Value::Bool(true))),
        "false" => return Some(("boolean", Value::Bool(false))),
        _ => {}
    }
    if let Ok(int) = text.parse::<i64>() {
        return Some(("number", Value::from(int)));
    }
    text.parse::<f64>()
        .ok()
        .filter(|float| float.is_finite())
        .and_then(serde_json::Number::from_f64)
        .map(|number| ("number", Value::Number(number)))
}

fn strip_quotes(name: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = name
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    name
}

/// Inner text of `Name<...>` when the generic argument list spans the rest of the text
fn generic_argument<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(name)?;
    if rest.starts_with('<') && closes_at_end(rest) {
        Some(&rest[1..rest.len() - 1])
    } else {
        None
    }
}

/// Bracket nesting tracker shared by the scanning helpers.
///
/// Quoted string literals are skipped and the `>` of an arrow (`=>`) does not close a
/// generic bracket.
struct DepthScanner {
    depth: i32,
    quote: Option<char>,
    prev: char,
}

impl DepthScanner {
    fn new() -> Self {
        Self {
            depth: 0,
            quote: None,
            prev: ' ',
        }
    }

    /// Feed one character; returns true when it sits at nesting depth 0 outside quotes
    /// and is not itself a bracket.
    fn step(&mut self, c: char) -> bool {
        let prev = std::mem::replace(&mut self.prev, c);
        if let Some(quote) = self.quote {
            if c == quote && prev != '\\' {
                self.quote = None;
            }
            return false;
        }
        match c {
            '\'' | '"' | '`' => {
                self.quote = Some(c);
                false
            }
            '<' | '{' | '(' | '[' => {
                self.depth += 1;
                false
            }
            '>' if prev == '=' => self.depth == 0,
            '>' | '}' | ')' | ']' => {
                self.depth -= 1;
                false
            }
            _ => self.depth == 0,
        }
    }
}

/// Split on separator characters found at nesting depth 0, trimming each piece and
/// dropping empty ones
fn split_top_level(text: &str, is_separator: impl Fn(char) -> bool) -> Vec<&str> {
    let mut scanner = DepthScanner::new();
    let mut parts = Vec::new();
    let mut start = 0;
    for (index, c) in text.char_indices() {
        if scanner.step(c) && is_separator(c) {
            parts.push(text[start..index].trim());
            start = index + c.len_utf8();
        }
    }
    parts.push(text[start..].trim());
    parts.retain(|part| !part.is_empty());
    parts
}

fn find_top_level(text: &str, target: char) -> Option<usize> {
    let mut scanner = DepthScanner::new();
    text.char_indices()
        .find(|(_, c)| scanner.step(*c) && *c == target)
        .map(|(index, _)| index)
}

/// Whether the bracket opening the text is closed by its last character
fn closes_at_end(text: &str) -> bool {
    let mut scanner = DepthScanner::new();
    let last = text.len().saturating_sub(1);
    for (index, c) in text.char_indices() {
        scanner.step(c);
        if scanner.depth == 0 && scanner.quote.is_none() {
            return index == last && index > 0;
        }
    }
    false
}
