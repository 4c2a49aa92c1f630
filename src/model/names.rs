//! Naming helpers for model members, shared by the association resolver
//! and the backends
//!
//! Language-agnostic: these produce identifiers, not rendered code.

/// Upper-case the first character, leave the rest alone
pub fn capitalise(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Element name for a collection member name: `persons` -> `person`.
///
/// Plain English plural endings only. A name that does not look plural is
/// returned unchanged.
pub fn singular(name: &str) -> String {
    const IRREGULAR: &[(&str, &str)] = &[
        ("children", "child"),
        ("people", "person"),
        ("men", "man"),
        ("women", "woman"),
        ("indices", "index"),
        ("aliases", "alias"),
        ("statuses", "status"),
    ];

    for (plural, single) in IRREGULAR {
        if let Some(stem) = strip_suffix_ignore_case(name, plural) {
            let tail = &name[stem.len()..];
            if stem.is_empty() || tail.starts_with(|c: char| c.is_ascii_uppercase()) {
                return format!("{}{}", stem, match_case(tail, single));
            }
        }
    }

    if let Some(stem) = name.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{}y", stem);
        }
    }
    for suffix in ["sses", "shes", "ches", "xes", "zes"] {
        if let Some(stem) = name.strip_suffix(suffix) {
            return format!("{}{}", stem, &suffix[..suffix.len() - 2]);
        }
    }
    if name.ends_with("ss") || name.ends_with("us") || name.ends_with("is") {
        return name.to_string();
    }
    match name.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}

fn strip_suffix_ignore_case<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    if name.len() < suffix.len() || !name.is_char_boundary(name.len() - suffix.len()) {
        return None;
    }
    let (stem, tail) = name.split_at(name.len() - suffix.len());
    tail.eq_ignore_ascii_case(suffix).then_some(stem)
}

fn match_case(original: &str, replacement: &str) -> String {
    if original.starts_with(|c: char| c.is_ascii_uppercase()) {
        capitalise(replacement)
    } else {
        replacement.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalise() {
        assert_eq!(capitalise("persons"), "Persons");
        assert_eq!(capitalise(""), "");
        assert_eq!(capitalise("iPerson"), "IPerson");
    }

    #[test]
    fn test_singular() {
        assert_eq!(singular("persons"), "person");
        assert_eq!(singular("relatives"), "relative");
        assert_eq!(singular("categories"), "category");
        assert_eq!(singular("addresses"), "address");
        assert_eq!(singular("boxes"), "box");
        assert_eq!(singular("children"), "child");
        assert_eq!(singular("grandChildren"), "grandChild");
        assert_eq!(singular("status"), "status");
        assert_eq!(singular("owner"), "owner");
    }
}
