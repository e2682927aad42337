//! HTTP span helpers.

#[derive(Debug, Clone)]
pub(super) struct RequestSpanName {
    /// Route with checkout keys collapsed, used as the metric label
    pub(super) otel_path: String,
    pub(super) otel_span_name: String,
}

pub(super) fn request_span_name(method: &str, path: &str) -> RequestSpanName {
    let otel_path = route_for_path(path);
    let otel_span_name = format!("{method} {otel_path}");

    RequestSpanName {
        otel_path,
        otel_span_name,
    }
}

/// Checkout keys are chosen by clients, so they are replaced with `{key}` to bound cardinality.
fn route_for_path(path: &str) -> String {
    let mut segments = path.trim_matches('/').split('/');

    match (segments.next(), segments.next()) {
        (Some("checkout"), Some("quote")) => "/checkout/quote".to_owned(),
        (Some("checkout"), Some(_)) => segments.fold("/checkout/{key}".to_owned(), |route, s| {
            format!("{route}/{s}")
        }),
        (Some(""), None) => "/".to_owned(),
        _ => format!("/{}", path.trim_matches('/')),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_keys_are_collapsed() {
        assert_eq!(route_for_path("/checkout/chk_1/confirm"), "/checkout/{key}/confirm");
        assert_eq!(route_for_path("/checkout/chk_1"), "/checkout/{key}");
        assert_eq!(route_for_path("/checkout/quote"), "/checkout/quote");
    }

    #[test]
    fn other_paths_are_kept() {
        assert_eq!(route_for_path("/healthcheck"), "/healthcheck");
        assert_eq!(route_for_path("/"), "/");
    }

    #[test]
    fn span_name_includes_method() {
        let names = request_span_name("GET", "/checkout/abc/return");

        assert_eq!(names.otel_span_name, "GET /checkout/{key}/return");
        assert_eq!(names.otel_path, "/checkout/{key}/return");
    }
}
