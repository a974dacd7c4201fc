//! Version comparison across sources.
//!
//! Versions are compared as semver, leniently: a leading `v` is ignored and
//! missing minor/patch components are zero (`"1.2"` is `1.2.0`). When either
//! side has no usable version, the last-modified timestamps decide.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use semver::Version;

use portfolio_types::element::Source;
use portfolio_types::unified::SourceVersion;

/// Parse a version string, padding short forms. `None` if it is not semver.
pub fn parse_lenient(raw: &str) -> Option<Version> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed);
    if let Ok(v) = Version::parse(trimmed) {
        return Some(v);
    }

    // Pad "1" and "1.2" (pre-release/build suffixes are not padded).
    let mut parts = trimmed.split('.').collect::<Vec<_>>();
    let all_numeric = parts
        .iter()
        .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));
    if parts.len() < 3 && all_numeric {
        parts.resize(3, "0");
        return Version::parse(&parts.join(".")).ok();
    }
    None
}

/// Order two source versions. `None` when they cannot be compared.
pub fn compare(a: &SourceVersion, b: &SourceVersion) -> Option<Ordering> {
    let parsed = (
        a.version.as_deref().and_then(parse_lenient),
        b.version.as_deref().and_then(parse_lenient),
    );
    if let (Some(va), Some(vb)) = parsed {
        return Some(va.cmp(&vb));
    }
    match (a.last_modified, b.last_modified) {
        (Some(ta), Some(tb)) => Some(ta.cmp(&tb)),
        _ => None,
    }
}

pub fn is_newer(candidate: &SourceVersion, baseline: &SourceVersion) -> bool {
    compare(candidate, baseline) == Some(Ordering::Greater)
}

/// Pick the source holding the newest version strictly ahead of the
/// authoritative one. Equal candidates resolve to the earlier source in
/// `priority`.
pub fn newest_update(
    versions: &BTreeMap<Source, SourceVersion>,
    authoritative: Source,
    priority: &[Source],
) -> Option<Source> {
    let baseline = versions.get(&authoritative)?;
    let mut best: Option<(Source, &SourceVersion)> = None;

    let ordered = priority
        .iter()
        .copied()
        .chain(Source::ALL)
        .filter(|s| *s != authoritative);
    let mut seen = Vec::new();
    for source in ordered {
        if seen.contains(&source) {
            continue;
        }
        seen.push(source);
        let Some(candidate) = versions.get(&source) else {
            continue;
        };
        if !is_newer(candidate, baseline) {
            continue;
        }
        match best {
            Some((_, current)) if !is_newer(candidate, current) => {}
            _ => best = Some((source, candidate)),
        }
    }
    best.map(|(source, _)| source)
}
