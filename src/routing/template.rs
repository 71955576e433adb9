use crate::controller::Parameters;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
}

/// A route path such as `/widgets/:widgetId`, split into literal and
/// parameter segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn parse(raw: &str) -> Self {
        let segments = raw
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| match param_name(segment) {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(segment.to_string()),
            })
            .collect();

        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Parameter names in order of first appearance.
    pub fn params(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for segment in &self.segments {
            if let Segment::Param(name) = segment {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }

    /// Match a request path, returning the raw parameter values. Literal
    /// segments compare case-insensitively and empty segments are ignored,
    /// so `/widgets` and `/widgets/` both match `/widgets/`.
    pub fn captures(&self, path: &str) -> Option<Parameters> {
        let parts: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut captured = Parameters::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal.eq_ignore_ascii_case(part) => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    captured.entry(name.clone()).or_insert_with(|| part.to_string());
                }
            }
        }
        Some(captured)
    }

    /// The same path in axum's syntax: `/widgets/{widgetId}`.
    pub fn axum_path(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }

        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(literal) => format!("/{literal}"),
                Segment::Param(name) => format!("/{{{name}}}"),
            })
            .collect()
    }

    /// Every axum path serving this template. A template ending in `/` is
    /// served with and without the trailing slash.
    pub fn axum_paths(&self) -> Vec<String> {
        let path = self.axum_path();
        if path != "/" && self.raw.ends_with('/') {
            vec![format!("{path}/"), path]
        } else {
            vec![path]
        }
    }

    /// Why axum cannot serve this template, if it cannot.
    pub fn axum_conflict(&self) -> Option<String> {
        let mut seen: Vec<&String> = Vec::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) if literal.starts_with([':', '*']) || literal.contains(['{', '}']) => {
                    return Some(format!("segment `{literal}` is neither a parameter nor a plain literal"));
                }
                Segment::Param(name) if seen.contains(&name) => {
                    return Some(format!("parameter `{name}` appears more than once"));
                }
                Segment::Param(name) => seen.push(name),
                Segment::Literal(_) => {}
            }
        }
        None
    }

    /// The path with parameter names erased; two templates with the same
    /// shape match the same requests.
    pub fn shape(&self) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(literal) => format!("/{}", literal.to_lowercase()),
                Segment::Param(_) => "/:".to_string(),
            })
            .collect()
    }
}

/// `:name` where name is anything axum can capture, e.g. `:line-itemId`.
fn param_name(segment: &str) -> Option<&str> {
    let name = segment.strip_prefix(':')?;
    (!name.is_empty() && !name.contains([':', '*', '{', '}'])).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_params() {
        let template = PathTemplate::parse("/shops/:shopId/widgets/:widgetId");
        assert_eq!(template.params(), vec!["shopId", "widgetId"]);
        assert_eq!(template.axum_path(), "/shops/{shopId}/widgets/{widgetId}");
        assert_eq!(template.as_str(), "/shops/:shopId/widgets/:widgetId");
    }

    #[test]
    fn test_repeated_param_listed_once() {
        let template = PathTemplate::parse("/:id/copy/:id");
        assert_eq!(template.params(), vec!["id"]);
    }

    #[test]
    fn test_param_names() {
        let template = PathTemplate::parse("/line-items/:line-itemId/:9lives");
        assert_eq!(template.params(), vec!["line-itemId", "9lives"]);
        assert_eq!(template.axum_path(), "/line-items/{line-itemId}/{9lives}");
        assert_eq!(template.axum_conflict(), None);

        let template = PathTemplate::parse("/a/:/b");
        assert!(template.params().is_empty());
    }

    #[test]
    fn test_axum_conflicts() {
        assert!(PathTemplate::parse("/a/:").axum_conflict().is_some());
        assert!(PathTemplate::parse("/a/::id").axum_conflict().is_some());
        assert!(PathTemplate::parse("/files/*rest").axum_conflict().is_some());
        assert!(PathTemplate::parse("/a/{b}").axum_conflict().is_some());
        assert!(PathTemplate::parse("/:id/copy/:id").axum_conflict().is_some());
        assert_eq!(PathTemplate::parse("/widgets/:widgetId").axum_conflict(), None);
    }

    #[test]
    fn test_captures() {
        let template = PathTemplate::parse("/widgets/:widgetId");
        let captured = template.captures("/Widgets/42/").unwrap();
        assert_eq!(captured["widgetId"], "42");
        assert!(template.captures("/widgets").is_none());
        assert!(template.captures("/gadgets/42").is_none());
        assert!(template.captures("/widgets/42/parts").is_none());
    }

    #[test]
    fn test_root_and_trailing_slash() {
        let index = PathTemplate::parse("/widgets/");
        assert_eq!(index.axum_path(), "/widgets");
        assert_eq!(index.axum_paths(), vec!["/widgets/", "/widgets"]);
        assert_eq!(PathTemplate::parse("/widgets/:widgetId").axum_paths(), vec!["/widgets/{widgetId}"]);
        assert!(index.captures("/widgets").unwrap().is_empty());

        let root = PathTemplate::parse("/");
        assert_eq!(root.axum_path(), "/");
        assert_eq!(root.axum_paths(), vec!["/"]);
        assert!(root.captures("/").is_some());
    }

    #[test]
    fn test_shape_ignores_param_names() {
        assert_eq!(
            PathTemplate::parse("/Widgets/:widgetId").shape(),
            PathTemplate::parse("/widgets/:id").shape()
        );
    }
}
