use std::cmp::Ordering;

use semver::Version;

/// Orders two version names. Accepts full semver as well as shortened forms
/// (`1.2`, `v3`) and returns `None` when either side is not a version.
#[must_use]
pub fn compare_version_names(left: &str, right: &str) -> Option<Ordering> {
    let left = parse_semver(left)?;
    let right = parse_semver(right)?;
    Some(left.cmp(&right))
}

fn parse_semver(version: &str) -> Option<Version> {
    let version = version.trim();
    let version = version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version);

    if let Ok(parsed) = Version::parse(version) {
        return Some(parsed);
    }

    let (core, suffix) = split_semver_core_and_suffix(version);
    let mut parts = core.split('.');
    let major = parts.next()?.parse::<u64>().ok()?;
    let minor = parts.next().and_then(|part| part.parse::<u64>().ok());
    let patch = parts.next().and_then(|part| part.parse::<u64>().ok());

    if parts.next().is_some() {
        return None;
    }

    let normalized = match (minor, patch) {
        (None, None) => format!("{major}.0.0{suffix}"),
        (Some(minor), None) => format!("{major}.{minor}.0{suffix}"),
        (Some(minor), Some(patch)) => format!("{major}.{minor}.{patch}{suffix}"),
        (None, Some(_)) => return None,
    };

    Version::parse(&normalized).ok()
}

fn split_semver_core_and_suffix(version: &str) -> (&str, &str) {
    let suffix_idx = version.find(['-', '+']).unwrap_or(version.len());
    (&version[..suffix_idx], &version[suffix_idx..])
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::compare_version_names;

    fn is_newer(latest: &str, current: &str) -> bool {
        compare_version_names(latest, current) == Some(Ordering::Greater)
    }

    #[test]
    fn test_version_comparison() {
        assert!(is_newer("1.0.1", "1.0.0"));
        assert!(is_newer("2.0.0", "1.9.9"));
        assert!(is_newer("1.2", "1.1.9"));
        assert!(is_newer("v1", "0.99.0"));
        assert!(is_newer("1.0.0", "1.0.0-beta.2"));
        assert!(!is_newer("1.2", "1.2.0"));
        assert!(!is_newer("1.0.0-beta.2", "1.0.0-beta.10"));
        assert!(!is_newer("0.9.0", "1.0.0"));
    }

    #[test]
    fn compare_version_names_handles_short_forms() {
        assert_eq!(compare_version_names("4.4", "4.10"), Some(Ordering::Less));
        assert_eq!(compare_version_names("V2.1", "2.1.0"), Some(Ordering::Equal));
        assert_eq!(compare_version_names("10", "9.9.9"), Some(Ordering::Greater));
    }

    #[test]
    fn compare_version_names_rejects_non_versions() {
        assert!(compare_version_names("KitKat", "4.4").is_none());
        assert!(compare_version_names("1.2.3.4", "1.2.3").is_none());
        assert!(compare_version_names("", "1").is_none());
    }
}
