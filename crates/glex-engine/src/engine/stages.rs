/// Requested stage list after validation.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Normalized {
    /// Known names, first occurrence kept, request order preserved.
    pub names: Vec<String>,
    /// Unknown names, in request order.
    pub unknown: Vec<String>,
}

/// Drops unknown and duplicate names from a stage-list request.
///
/// Unknown names are skipped individually; the rest of the batch survives.
pub(crate) fn normalize<S: AsRef<str>>(requested: &[S], is_known: impl Fn(&str) -> bool) -> Normalized {
    let mut out = Normalized::default();
    for name in requested.iter().map(AsRef::as_ref) {
        if !is_known(name) {
            if !out.unknown.iter().any(|u| u == name) {
                out.unknown.push(name.to_owned());
            }
            continue;
        }
        if !out.names.iter().any(|n| n == name) {
            out.names.push(name.to_owned());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(name: &str) -> bool {
        matches!(name, "A" | "B" | "C")
    }

    #[test]
    fn unknown_names_are_dropped_and_reported() {
        let n = normalize(&["X", "B"], known);
        assert_eq!(n.names, vec!["B"]);
        assert_eq!(n.unknown, vec!["X"]);
    }

    #[test]
    fn duplicates_keep_first_occurrence() {
        let n = normalize(&["C", "A", "C", "B", "A"], known);
        assert_eq!(n.names, vec!["C", "A", "B"]);
        assert!(n.unknown.is_empty());
    }

    #[test]
    fn empty_request_is_empty_list() {
        let n = normalize::<&str>(&[], known);
        assert_eq!(n, Normalized::default());
    }

    #[test]
    fn repeated_unknown_reported_once() {
        let n = normalize(&["Z", "Z"], known);
        assert_eq!(n.unknown, vec!["Z"]);
    }
}
