//! Route pattern matching module
//!
//! Patterns are `/`-separated segments, each either a literal or a `{param}`
//! placeholder capturing exactly one segment.

/// One segment of a route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(&'static str),
    Param(&'static str),
}

/// Compiled route pattern such as `/download/{name}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: &'static str,
    segments: Vec<Segment>,
}

/// Raw (still percent-encoded) parameters captured by a pattern
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    values: Vec<(&'static str, String)>,
}

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl RoutePattern {
    pub fn parse(raw: &'static str) -> Self {
        let segments = split_segments(raw)
            .map(|segment| {
                segment
                    .strip_prefix('{')
                    .and_then(|s| s.strip_suffix('}'))
                    .map_or(Segment::Literal(segment), Segment::Param)
            })
            .collect();
        Self { raw, segments }
    }

    pub const fn as_str(&self) -> &'static str {
        self.raw
    }

    /// Match a request path, returning captured parameters on success
    ///
    /// A parameter may capture an empty segment (`/download/`); rejecting it is
    /// left to the request decoder so the client gets 400 rather than 404.
    pub fn match_path(&self, path: &str) -> Option<PathParams> {
        let mut params = PathParams::default();
        let mut actual = split_segments(path);

        for segment in &self.segments {
            let value = actual.next()?;
            match segment {
                Segment::Literal(literal) if *literal == value => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => params.values.push((name, value.to_string())),
            }
        }

        if actual.next().is_some() {
            return None;
        }
        Some(params)
    }
}

fn split_segments(path: &str) -> std::str::Split<'_, char> {
    path.strip_prefix('/').unwrap_or(path).split('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_pattern() {
        let pattern = RoutePattern::parse("/files");
        assert_eq!(pattern.match_path("/files"), Some(PathParams::default()));
        assert_eq!(pattern.match_path("/files/"), None);
        assert_eq!(pattern.match_path("/filesx"), None);
        assert_eq!(pattern.match_path("/"), None);
    }

    #[test]
    fn test_param_capture() {
        let pattern = RoutePattern::parse("/download/{name}");
        let params = pattern.match_path("/download/report.pdf").unwrap();
        assert_eq!(params.get("name"), Some("report.pdf"));
        assert_eq!(params.get("other"), None);
    }

    #[test]
    fn test_param_is_single_segment() {
        let pattern = RoutePattern::parse("/file/{name}");
        assert_eq!(pattern.match_path("/file/a/b"), None);
        assert_eq!(pattern.match_path("/file"), None);
    }

    #[test]
    fn test_param_keeps_percent_encoding() {
        let pattern = RoutePattern::parse("/file/{name}");
        let params = pattern.match_path("/file/my%20notes.txt").unwrap();
        assert_eq!(params.get("name"), Some("my%20notes.txt"));
    }

    #[test]
    fn test_empty_param_matches() {
        let pattern = RoutePattern::parse("/download/{name}");
        let params = pattern.match_path("/download/").unwrap();
        assert_eq!(params.get("name"), Some(""));
    }
}
