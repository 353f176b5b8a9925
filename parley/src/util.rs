/*!
Small helpers shared across the crate: identifier checks and "did you mean"
suggestions.
 */

/// True for `[A-Za-z_][A-Za-z0-9_]*`
pub(crate) fn is_identifier(candidate: &str) -> bool {
    let mut chars = candidate.chars();

    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Similarity above which a candidate is worth suggesting
const SIMILARITY_THRESHOLD: f64 = 0.8;

/**
Find the candidates that are plausibly what the user meant by `input`,
most similar first. Similarity is Jaro-Winkler, with a boost for candidates
that `input` is a prefix of.
 */
pub fn suggestions<'a>(input: &str, candidates: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut scored: Vec<(f64, &str)> = candidates
        .into_iter()
        .filter(|&candidate| candidate != input)
        .filter_map(|candidate| {
            let score = strsim::jaro_winkler(input, candidate);
            let score = match candidate.starts_with(input) && !input.is_empty() {
                true => score.max(SIMILARITY_THRESHOLD),
                false => score,
            };
            (score >= SIMILARITY_THRESHOLD).then_some((score, candidate))
        })
        .collect();

    scored.sort_by(|(a, left), (b, right)| b.total_cmp(a).then_with(|| left.cmp(right)));
    scored.dedup_by(|(_, a), (_, b)| a == b);
    scored
        .into_iter()
        .map(|(_, candidate)| candidate.to_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert!(is_identifier("name"));
        assert!(is_identifier("_private2"));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("dry-run"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn close_candidates_are_suggested() {
        assert_eq!(
            suggestions("--cont", ["--count", "--verbose", "--help"]),
            ["--count"]
        );
        assert_eq!(suggestions("stauts", ["status", "push", "pull"]), ["status"]);
        assert!(suggestions("zzz", ["status", "push"]).is_empty());
    }

    #[test]
    fn prefixes_are_always_suggested() {
        assert_eq!(
            suggestions("--co", ["--color", "--count", "--help"]),
            ["--color", "--count"]
        );
    }
}
