//! `${key:default}` placeholder substitution

use crate::PropertyValue;

const PREFIX: &str = "${";
const OPEN: u8 = b'{';
const SUFFIX: u8 = b'}';
const VALUE_SEPARATOR: u8 = b':';

/// Failure to resolve a property's placeholders
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("Could not resolve placeholder '{placeholder}' in value \"{value}\"")]
    Unresolvable { placeholder: String, value: String },

    #[error("Circular placeholder reference '{placeholder}' in property definitions")]
    Circular { placeholder: String },
}

/// Substitutes placeholders using a raw property lookup
///
/// Referenced text values are resolved recursively; other values are
/// substituted through their `Display` form.
pub(crate) struct PlaceholderResolver<F> {
    lookup: F,
}

impl<F> PlaceholderResolver<F>
where
    F: Fn(&str) -> Option<PropertyValue>,
{
    pub(crate) fn new(lookup: F) -> Self {
        Self { lookup }
    }

    pub(crate) fn resolve(&self, text: &str) -> Result<String, ResolveError> {
        let mut visiting = Vec::new();
        self.substitute(text, &mut visiting)
    }

    fn substitute(&self, value: &str, visiting: &mut Vec<String>) -> Result<String, ResolveError> {
        let mut out = String::with_capacity(value.len());
        let mut rest = value;

        while let Some(start) = rest.find(PREFIX) {
            out.push_str(&rest[..start]);
            let body = &rest[start + PREFIX.len()..];

            // Unterminated placeholders are kept verbatim
            let Some(end) = find_matching_suffix(body) else {
                out.push_str(&rest[start..]);
                return Ok(out);
            };

            let (raw_key, default) = split_default(&body[..end]);
            let key = self.substitute(raw_key, visiting)?;
            if visiting.contains(&key) {
                return Err(ResolveError::Circular { placeholder: key });
            }

            visiting.push(key.clone());
            let replacement = match (self.lookup)(&key) {
                Some(PropertyValue::Text(text)) => self.substitute(&text, visiting)?,
                Some(other) => other.to_string(),
                None => match default {
                    Some(default) => self.substitute(default, visiting)?,
                    None => {
                        return Err(ResolveError::Unresolvable {
                            placeholder: key,
                            value: value.to_string(),
                        })
                    }
                },
            };
            visiting.pop();

            out.push_str(&replacement);
            rest = &body[end + 1..];
        }

        out.push_str(rest);
        Ok(out)
    }
}

/// Index of the `}` closing the placeholder whose body starts `s`
///
/// Every `{`, with or without a leading `$`, opens a nested level.
fn find_matching_suffix(s: &str) -> Option<usize> {
    let mut depth = 0usize;

    for (i, b) in s.bytes().enumerate() {
        match b {
            OPEN => depth += 1,
            SUFFIX if depth == 0 => return Some(i),
            SUFFIX => depth -= 1,
            _ => {}
        }
    }

    None
}

/// Split `key:default` at the first separator outside nested braces
fn split_default(body: &str) -> (&str, Option<&str>) {
    let mut depth = 0usize;

    for (i, b) in body.bytes().enumerate() {
        match b {
            OPEN => depth += 1,
            SUFFIX => depth = depth.saturating_sub(1),
            VALUE_SEPARATOR if depth == 0 => return (&body[..i], Some(&body[i + 1..])),
            _ => {}
        }
    }

    (body, None)
}
