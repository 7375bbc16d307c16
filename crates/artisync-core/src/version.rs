use semver::Version;

/// Normalize a free-form version or tag into `major.minor.patch`.
///
/// Leading `v`/`V` markers and any pre-release or build suffix are dropped,
/// then up to three leading dot-separated numeric tokens are read. Missing
/// trailing components default to zero. `None` is the "no version" result
/// and sorts below every parsed version.
#[must_use]
pub fn parse_version(input: &str) -> Option<Version> {
    let trimmed = input.trim();
    let unprefixed = trimmed
        .strip_prefix(['v', 'V'])
        .unwrap_or(trimmed);
    let core = unprefixed
        .find(['-', '+'])
        .map_or(unprefixed, |idx| &unprefixed[..idx]);

    let mut parts = core.split('.').map(|part| part.parse::<u64>().ok());
    let major = parts.next().flatten()?;
    let minor = parts.next().flatten();
    let patch = minor.and_then(|_| parts.next().flatten());

    Some(Version::new(major, minor.unwrap_or(0), patch.unwrap_or(0)))
}

/// Whether `candidate` is strictly newer than `current`.
///
/// An unparsable candidate is never newer.
#[must_use]
pub fn is_newer_version(candidate: &str, current: &str) -> bool {
    parse_version(candidate) > parse_version(current)
}

/// Development builds (`0.0.x`) never prompt for updates.
#[must_use]
pub fn is_development_build(version: &str) -> bool {
    parse_version(version).is_some_and(|version| version.major == 0 && version.minor == 0)
}
