//! Versioned physical index-name arithmetic.
//!
//! Aliases are the public handle; the physical index behind an alias
//! carries a trailing `-v{major}.{minor}` suffix so a blue/green reindex
//! can compute its target name from the current one.

/// The physical name of the first index behind a fresh alias.
pub fn initial(alias: &str) -> String {
    format!("{alias}-v1.0")
}

/// Split a physical index name into its base and `(major, minor)` version,
/// if it carries a version suffix.
pub fn parse_version(name: &str) -> Option<(&str, u32, u32)> {
    let (base, suffix) = name.rsplit_once("-v")?;
    let (major, minor) = suffix.split_once('.')?;
    let major: u32 = major.parse().ok()?;
    let minor: u32 = minor.parse().ok()?;
    if base.is_empty() {
        return None;
    }
    Some((base, major, minor))
}

/// Compute the next physical index name: the minor component is
/// incremented. A name without a recognizable version suffix restarts the
/// sequence at `-v1.0`.
pub fn next_version(name: &str) -> String {
    match parse_version(name) {
        Some((base, major, minor)) => format!("{base}-v{major}.{}", minor + 1),
        None => initial(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_name() {
        assert_eq!(initial("assets-model"), "assets-model-v1.0");
    }

    #[test]
    fn parse_versioned_name() {
        assert_eq!(parse_version("assets-v2.7"), Some(("assets", 2, 7)));
        assert_eq!(parse_version("a-b-c-v10.0"), Some(("a-b-c", 10, 0)));
    }

    #[test]
    fn parse_rejects_unversioned() {
        assert_eq!(parse_version("assets"), None);
        assert_eq!(parse_version("assets-v1"), None);
        assert_eq!(parse_version("assets-vx.y"), None);
        assert_eq!(parse_version("-v1.0"), None);
    }

    #[test]
    fn next_increments_minor() {
        assert_eq!(next_version("assets-v1.0"), "assets-v1.1");
        assert_eq!(next_version("assets-v3.41"), "assets-v3.42");
    }

    #[test]
    fn next_of_unversioned_starts_over() {
        assert_eq!(next_version("legacy-assets"), "legacy-assets-v1.0");
    }

    #[test]
    fn version_round_trip_is_stable() {
        let n1 = next_version("docs-v1.0");
        let n2 = next_version(&n1);
        assert_eq!(n2, "docs-v1.2");
    }
}
