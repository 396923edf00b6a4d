//! URL joining for collection endpoints.

use url::Url;

/// Join `base` and `endpoint`, then append `path` beneath the result.
///
/// `base`/`endpoint` resolve with RFC 3986 reference semantics, so a base
/// without a trailing slash loses its last segment. When `path` is given,
/// exactly one `/` separates it from the joined endpoint. A `base` that is
/// not an absolute URL is concatenated as-is and left for the transport to
/// reject.
pub fn build_url(base: &str, endpoint: &str, path: Option<&str>) -> String {
    let Ok(parsed) = Url::parse(base) else {
        return concat_url(base, endpoint, path);
    };
    let Ok(joined) = parsed.join(endpoint) else {
        return concat_url(base, endpoint, path);
    };

    let Some(path) = path.filter(|p| !p.is_empty()) else {
        return joined.into();
    };

    let mut joined: String = joined.into();
    if !joined.ends_with('/') {
        joined.push('/');
    }
    let path = path.strip_prefix('/').unwrap_or(path);

    match Url::parse(&joined).and_then(|u| u.join(path)) {
        Ok(url) => url.into(),
        Err(_) => format!("{joined}{path}"),
    }
}

fn concat_url(base: &str, endpoint: &str, path: Option<&str>) -> String {
    let mut out = base.to_string();
    for part in [Some(endpoint), path].into_iter().flatten() {
        if part.is_empty() {
            continue;
        }
        if !out.ends_with('/') {
            out.push('/');
        }
        out.push_str(part.strip_prefix('/').unwrap_or(part));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://adsapi.snapchat.com/v1/";

    #[test]
    fn joins_endpoint_and_path() {
        assert_eq!(
            build_url(BASE, "campaigns", Some("C1/adsquads")),
            "https://adsapi.snapchat.com/v1/campaigns/C1/adsquads"
        );
    }

    #[test]
    fn leading_slash_on_path_is_ignored() {
        assert_eq!(
            build_url(BASE, "campaigns", Some("/C1/adsquads")),
            build_url(BASE, "campaigns", Some("C1/adsquads")),
        );
    }

    #[test]
    fn trailing_slash_on_endpoint_is_ignored() {
        assert_eq!(
            build_url(BASE, "campaigns/", Some("C1")),
            build_url(BASE, "campaigns", Some("C1")),
        );
        assert_eq!(
            build_url(BASE, "campaigns/", Some("/C1")),
            "https://adsapi.snapchat.com/v1/campaigns/C1"
        );
    }

    #[test]
    fn without_path_is_plain_join() {
        assert_eq!(build_url(BASE, "me", None), "https://adsapi.snapchat.com/v1/me");
        assert_eq!(build_url(BASE, "me", Some("")), "https://adsapi.snapchat.com/v1/me");
    }

    #[test]
    fn base_without_trailing_slash_replaces_last_segment() {
        assert_eq!(
            build_url("https://adsapi.snapchat.com/v1", "campaigns", None),
            "https://adsapi.snapchat.com/campaigns"
        );
    }

    #[test]
    fn absolute_endpoint_replaces_base_path() {
        assert_eq!(
            build_url(BASE, "/me", None),
            "https://adsapi.snapchat.com/me"
        );
    }

    #[test]
    fn malformed_base_is_passed_through() {
        assert_eq!(build_url("not a url", "campaigns", Some("/C1")), "not a url/campaigns/C1");
    }
}
