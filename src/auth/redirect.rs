use url::{Position, Url};

const ORIGIN: &str = "http://rsu.invalid/";

/// Resolves `next` against our own origin and returns the normalized path, query and
/// fragment when scheme, host and port are unchanged. Absolute URLs, `//host`
/// references and other schemes fall back to `None`. The result is always a valid
/// `Location` header value.
pub fn safe_next(next: Option<&str>) -> Option<String> {
    let next = next?.trim();
    if next.is_empty() {
        return None;
    }
    let base = Url::parse(ORIGIN).ok()?;
    let resolved = base.join(next).ok()?;
    if resolved.origin() != base.origin() {
        return None;
    }
    Some(resolved[Position::BeforePath..].to_string())
}
