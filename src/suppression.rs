//! `#pragma warning disable|restore` handling.
//!
//! A `disable` on row `r` suppresses diagnostics starting after `r` until a
//! matching `restore` or end of file. Ids match lint names or rule codes; a
//! pragma without ids applies to every lint.

use crate::lint::{LintDescriptor, canonical_lint_name};

#[derive(Debug, Clone, PartialEq, Eq)]
struct SuppressedRange {
    /// `None` means every lint.
    id: Option<String>,
    disabled_at: usize,
    restored_at: Option<usize>,
}

impl SuppressedRange {
    fn covers(&self, row: usize) -> bool {
        row > self.disabled_at && self.restored_at.is_none_or(|end| row < end)
    }

    fn applies_to(&self, lint: &LintDescriptor) -> bool {
        self.id.as_deref().is_none_or(|id| lint.matches(id))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PragmaSuppressions {
    ranges: Vec<SuppressedRange>,
}

#[derive(Debug, PartialEq, Eq)]
enum PragmaAction {
    Disable,
    Restore,
}

/// Lint name and rule code of one rule are the same id; unknown ids
/// compare case-insensitively.
fn same_id(a: &str, b: &str) -> bool {
    match (canonical_lint_name(a), canonical_lint_name(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a.eq_ignore_ascii_case(b),
    }
}

/// `(action, ids)` for a `#pragma warning` line; empty ids mean "all".
fn parse_pragma(line: &str) -> Option<(PragmaAction, Vec<String>)> {
    let line = line.split("//").next().unwrap_or(line);
    let rest = line.trim().strip_prefix('#')?.trim_start();
    let rest = rest.strip_prefix("pragma")?.trim_start();
    let rest = rest.strip_prefix("warning")?.trim_start();

    let (action, ids) = if let Some(ids) = rest.strip_prefix("disable") {
        (PragmaAction::Disable, ids)
    } else if let Some(ids) = rest.strip_prefix("restore") {
        (PragmaAction::Restore, ids)
    } else {
        return None;
    };

    let ids = ids
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();
    Some((action, ids))
}

impl PragmaSuppressions {
    pub fn parse(source: &str) -> Self {
        let mut ranges: Vec<SuppressedRange> = Vec::new();

        for (idx, line) in source.lines().enumerate() {
            let row = idx + 1;
            let Some((action, ids)) = parse_pragma(line) else {
                continue;
            };
            let targets: Vec<Option<String>> = if ids.is_empty() {
                vec![None]
            } else {
                ids.into_iter().map(Some).collect()
            };

            for target in targets {
                match action {
                    PragmaAction::Disable => ranges.push(SuppressedRange {
                        id: target,
                        disabled_at: row,
                        restored_at: None,
                    }),
                    PragmaAction::Restore => {
                        // A bare restore closes everything still open.
                        for open in ranges.iter_mut().filter(|r| r.restored_at.is_none()) {
                            let closes = match (&target, &open.id) {
                                (None, _) => true,
                                (Some(t), Some(id)) => same_id(t, id),
                                (Some(_), None) => false,
                            };
                            if closes {
                                open.restored_at = Some(row);
                            }
                        }
                    }
                }
            }
        }

        Self { ranges }
    }

    pub fn is_suppressed(&self, lint: &LintDescriptor, row: usize) -> bool {
        self.ranges
            .iter()
            .any(|r| r.covers(row) && r.applies_to(lint))
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::stash::DUPLICATE_STASH_CALL;

    #[test]
    fn disable_until_restore() {
        let src = "a\n#pragma warning disable AK1008\nb\n#pragma warning restore AK1008\nc\n";
        let s = PragmaSuppressions::parse(src);
        assert!(!s.is_suppressed(&DUPLICATE_STASH_CALL, 1));
        assert!(s.is_suppressed(&DUPLICATE_STASH_CALL, 3));
        assert!(!s.is_suppressed(&DUPLICATE_STASH_CALL, 5));
    }

    #[test]
    fn restore_by_name_closes_disable_by_code() {
        let src = "#pragma warning disable AK1008\nb\n#pragma warning restore duplicate_stash_call\nc\n";
        let s = PragmaSuppressions::parse(src);
        assert!(s.is_suppressed(&DUPLICATE_STASH_CALL, 2));
        assert!(!s.is_suppressed(&DUPLICATE_STASH_CALL, 4));

        let src = "#pragma warning disable CS0168\nb\n#pragma warning restore cs0168\nc\n";
        let s = PragmaSuppressions::parse(src);
        assert!(s.ranges.iter().all(|r| r.restored_at == Some(3)));
    }

    #[test]
    fn lint_names_and_lists_are_accepted() {
        let src = "#pragma warning disable CS0168, duplicate_stash_call // noisy\nx\n";
        let s = PragmaSuppressions::parse(src);
        assert!(s.is_suppressed(&DUPLICATE_STASH_CALL, 2));
    }

    #[test]
    fn bare_disable_covers_everything_to_eof() {
        let src = "  #pragma warning disable\nx\ny\n";
        let s = PragmaSuppressions::parse(src);
        assert!(s.is_suppressed(&DUPLICATE_STASH_CALL, 3));
    }

    #[test]
    fn unrelated_ids_do_not_suppress() {
        let src = "#pragma warning disable CS0168\nx\n";
        let s = PragmaSuppressions::parse(src);
        assert!(!s.is_empty());
        assert!(!s.is_suppressed(&DUPLICATE_STASH_CALL, 2));
    }

    #[test]
    fn other_pragmas_are_ignored() {
        assert_eq!(parse_pragma("#pragma checksum \"f\""), None);
        assert_eq!(parse_pragma("// #pragma warning disable"), None);
        assert_eq!(
            parse_pragma("# pragma warning restore ak1008"),
            Some((PragmaAction::Restore, vec!["ak1008".to_string()]))
        );
    }
}
