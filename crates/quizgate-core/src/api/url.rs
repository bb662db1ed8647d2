//! URL assembly helpers.

/// Join a base address and a request path with exactly one `/` between them.
///
/// Trailing slashes on the base and leading slashes on the path are
/// collapsed; nothing else in either side is touched.
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return base.to_string();
    }
    format!("{}/{}", base, path)
}

/// Serialize query parameters, skipping entries without a value.
///
/// Order is preserved. Keys and values are percent-encoded.
pub fn query_string<K, V>(params: &[(K, Option<V>)]) -> String
where
    K: AsRef<str>,
    V: ToString,
{
    params
        .iter()
        .filter_map(|(key, value)| {
            value.as_ref().map(|v| {
                format!(
                    "{}={}",
                    urlencoding::encode(key.as_ref()),
                    urlencoding::encode(&v.to_string())
                )
            })
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Append a query string to a path, if there is one.
pub fn with_query(path: &str, query: &str) -> String {
    if query.is_empty() {
        path.to_string()
    } else if path.contains('?') {
        format!("{}&{}", path, query)
    } else {
        format!("{}?{}", path, query)
    }
}
