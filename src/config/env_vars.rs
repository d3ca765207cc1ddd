use std::path::PathBuf;

/// Expand `%VAR%`, `${VAR}` and `$VAR` tokens from the process environment.
///
/// Tokens naming an undefined variable are left in the output untouched.
/// Substituted values are not expanded again.
pub fn expand_env_vars(raw: &str) -> String {
    expand_with(raw, |name| std::env::var(name).ok())
}

/// Expand variable tokens using an arbitrary lookup.
pub fn expand_with<F>(raw: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(pos) = rest.find(|c| c == '%' || c == '$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        match parse_token(tail) {
            Some((len, name)) => {
                match lookup(name) {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(&tail[..len]),
                }
                rest = &tail[len..];
            }
            None => {
                // Lone sigil, keep it and move on
                out.push_str(&tail[..1]);
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Parse a variable token at the start of `tail`, returning its length and name.
fn parse_token(tail: &str) -> Option<(usize, &str)> {
    if let Some(body) = tail.strip_prefix('%') {
        let end = body.find('%')?;
        if end == 0 {
            return None;
        }
        return Some((end + 2, &body[..end]));
    }

    let body = tail.strip_prefix('$')?;
    if let Some(braced) = body.strip_prefix('{') {
        let end = braced.find('}')?;
        if end == 0 {
            return None;
        }
        return Some((end + 3, &braced[..end]));
    }

    let end = body
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    if end == 0 {
        return None;
    }
    Some((end + 1, &body[..end]))
}

/// Resolve a configured source path into a concrete path.
///
/// Expands environment variables and drops trailing separators, except on a
/// bare drive root such as `C:\`.
pub fn resolve_source_path(raw: &str) -> PathBuf {
    let expanded = expand_env_vars(raw);
    let trimmed = expanded.trim_end_matches(|c| c == '/' || c == '\\');
    if trimmed.is_empty() || trimmed.ends_with(':') {
        PathBuf::from(expanded)
    } else {
        PathBuf::from(trimmed)
    }
}
