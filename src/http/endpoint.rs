use std::collections::BTreeMap;
use std::fmt::{self, Display};

use crate::error::TransportError;

/// URL path pattern with `{name}` placeholders, e.g. `/products/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointTemplate(&'static str);

impl EndpointTemplate {
    pub const fn new(pattern: &'static str) -> Self {
        Self(pattern)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Substitute path parameters and split the result into raw (not yet
    /// percent-encoded) path segments.
    ///
    /// Values are inserted verbatim. An unresolved placeholder is an error
    /// because the call could only ever hit the wrong URL.
    pub fn resolve(&self, params: &BTreeMap<String, String>) -> Result<Vec<String>, TransportError> {
        self.0
            .trim_start_matches('/')
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| self.substitute(segment, params))
            .collect()
    }

    fn substitute(
        &self,
        segment: &'static str,
        params: &BTreeMap<String, String>,
    ) -> Result<String, TransportError> {
        let mut resolved = String::new();
        let mut rest = segment;
        while let Some(((prefix, name), tail)) = next_placeholder(rest) {
            let value = params
                .get(name)
                .ok_or_else(|| TransportError::UnresolvedPlaceholder {
                    template: self.0.to_string(),
                    name: name.to_string(),
                })?;
            resolved.push_str(prefix);
            resolved.push_str(value);
            rest = tail;
        }
        resolved.push_str(rest);
        Ok(resolved)
    }
}

impl Display for EndpointTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Returns `((text before the token, token name), remainder)`.
fn next_placeholder(input: &'static str) -> Option<((&'static str, &'static str), &'static str)> {
    let open = input.find('{')?;
    let close = open + input[open..].find('}')?;
    let name = &input[open + 1..close];
    if name.is_empty() {
        return None;
    }
    Some(((&input[..open], name), &input[close + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn resolves_into_segments() {
        let template = EndpointTemplate::new("/products/{id}");
        let segments = template.resolve(&params(&[("id", "5")])).unwrap();
        assert_eq!(segments, ["products", "5"]);
    }

    #[test]
    fn keeps_adversarial_values_verbatim() {
        let template = EndpointTemplate::new("/products/{id}");
        let segments = template.resolve(&params(&[("id", "!@#")])).unwrap();
        assert_eq!(segments, ["products", "!@#"]);
    }

    #[test]
    fn substitutes_inside_a_segment() {
        let template = EndpointTemplate::new("/files/{name}.{ext}");
        let segments = template
            .resolve(&params(&[("name", "report"), ("ext", "json")]))
            .unwrap();
        assert_eq!(segments, ["files", "report.json"]);
    }

    #[test]
    fn unresolved_placeholder_is_an_error() {
        let template = EndpointTemplate::new("/carts/{id}");
        let err = template.resolve(&BTreeMap::new()).unwrap_err();
        assert!(matches!(
            err,
            TransportError::UnresolvedPlaceholder { ref name, .. } if name == "id"
        ));
    }
}
