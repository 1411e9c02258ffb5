//! Name helpers used to turn route identifiers into class and method names.

/// Separator between namespace segments in a handler class name.
pub const NAMESPACE_SEPARATOR: &str = "::";

/// Camel-cases `text`, splitting on `_` and `-`.
///
/// Every piece is lowercased and its first character upper-cased:
/// `"user_posts"` becomes `"UserPosts"`, `"LIST-ALL"` becomes `"ListAll"`.
pub fn camelize(text: &str) -> String {
    text.split(['_', '-'])
        .filter(|piece| !piece.is_empty())
        .map(|piece| ucfirst(&piece.to_lowercase()))
        .collect()
}

/// Reverses [`camelize`]: `"UserPosts"` becomes `"user_posts"` with `'_'`.
pub fn uncamelize(text: &str, delimiter: char) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    for (idx, ch) in text.chars().enumerate() {
        if ch.is_uppercase() {
            if idx > 0 {
                out.push(delimiter);
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Upper-cases the first character.
pub fn ucfirst(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lower-cases the first character.
pub fn lcfirst(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Namespace part of a fully-qualified class, `None` for an empty name.
///
/// `"App::Tasks::MainTask"` gives `"App::Tasks"`; a bare class gives `""`.
pub fn namespace_of(class: &str) -> Option<String> {
    let trimmed = class.trim_end_matches(NAMESPACE_SEPARATOR);
    if trimmed.is_empty() {
        return None;
    }
    Some(
        trimmed
            .rsplit_once(NAMESPACE_SEPARATOR)
            .map(|(ns, _)| ns.to_string())
            .unwrap_or_default(),
    )
}

/// Class part of a fully-qualified class, `None` for an empty name.
pub fn class_of(class: &str) -> Option<String> {
    let trimmed = class.trim_end_matches(NAMESPACE_SEPARATOR);
    if trimmed.is_empty() {
        return None;
    }
    Some(
        trimmed
            .rsplit_once(NAMESPACE_SEPARATOR)
            .map_or(trimmed, |(_, name)| name)
            .to_string(),
    )
}

/// Joins a namespace and a class name with exactly one separator.
pub fn join_namespace(namespace: &str, class: &str) -> String {
    if namespace.is_empty() {
        return class.to_string();
    }
    if namespace.ends_with(NAMESPACE_SEPARATOR) {
        format!("{namespace}{class}")
    } else {
        format!("{namespace}{NAMESPACE_SEPARATOR}{class}")
    }
}
