//! Line-set merging — the dedup and ordering core of the ledgers.
//!
//! A ledger is a set of lines. Merging unions incoming lines with what is
//! already on disk (exact string equality is the dedup key), then orders
//! the union by the destination's sort key. Ties on the key fall back to
//! whole-line lexicographic order, which makes the result independent of
//! the order merges were applied in.

use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Union `existing` and `incoming` as line sets and sort by `key`.
pub fn merge_lines<K, F>(
    existing: Vec<String>,
    incoming: Vec<String>,
    key: F,
) -> Vec<String>
where
    K: Ord,
    F: Fn(&str) -> K,
{
    let mut set: BTreeSet<String> = existing.into_iter().collect();
    set.extend(incoming);

    let mut rows: Vec<String> = set.into_iter().collect();
    rows.sort_by(|a, b| key(a).cmp(&key(b)).then_with(|| a.cmp(b)));
    rows
}

/// Sort key for per-entity ledger lines: the leading `yyyyMMdd` field.
/// Lines whose leading field is not a date sort before everything else.
pub fn ledger_date_key(line: &str) -> NaiveDate {
    line.split(',')
        .next()
        .and_then(|field| NaiveDate::parse_from_str(field, "%Y%m%d").ok())
        .unwrap_or(NaiveDate::MIN)
}

/// Sort key for universe lines: the leading entity-identifier field,
/// compared lexicographically.
pub fn leading_field(line: &str) -> String {
    line.split(',').next().unwrap_or("").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sorts_ledger_lines_by_date() {
        let merged = merge_lines(
            Vec::new(),
            lines(&["20230105,a,DoD,1", "20230101,b,DoD,2", "20230103,c,DoD,3"]),
            ledger_date_key,
        );
        assert_eq!(
            merged,
            lines(&["20230101,b,DoD,2", "20230103,c,DoD,3", "20230105,a,DoD,1"])
        );
    }

    #[test]
    fn identical_lines_collapse() {
        let merged = merge_lines(
            lines(&["20230101,x,y,1"]),
            lines(&["20230101,x,y,1"]),
            ledger_date_key,
        );
        assert_eq!(merged, lines(&["20230101,x,y,1"]));
    }

    #[test]
    fn near_identical_lines_both_survive() {
        let merged = merge_lines(
            lines(&["20230101,x,y,1"]),
            lines(&["20230101,x,y,10"]),
            ledger_date_key,
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn merge_order_does_not_matter() {
        let a = lines(&["20230103,c,DoD,3", "20230101,a,DoD,1"]);
        let b = lines(&["20230102,b,NASA,2", "20230101,a,DoD,1"]);

        let ab = merge_lines(
            merge_lines(Vec::new(), a.clone(), ledger_date_key),
            b.clone(),
            ledger_date_key,
        );
        let ba = merge_lines(
            merge_lines(Vec::new(), b, ledger_date_key),
            a,
            ledger_date_key,
        );

        assert_eq!(ab, ba);
    }

    #[test]
    fn remerging_the_result_is_a_fixed_point() {
        let rows = lines(&["20230102,b,NASA,2", "20230101,a,DoD,1"]);
        let once = merge_lines(Vec::new(), rows.clone(), ledger_date_key);
        let twice = merge_lines(once.clone(), rows, ledger_date_key);
        assert_eq!(once, twice);
    }

    #[test]
    fn same_date_lines_order_lexicographically() {
        let merged = merge_lines(
            Vec::new(),
            lines(&["20230101,zeta,DoD,1", "20230101,alpha,DoD,1"]),
            ledger_date_key,
        );
        assert_eq!(
            merged,
            lines(&["20230101,alpha,DoD,1", "20230101,zeta,DoD,1"])
        );
    }

    #[test]
    fn universe_lines_sort_by_entity_id() {
        let merged = merge_lines(
            Vec::new(),
            lines(&[
                "zz-2,ZZ,desc,DoD,1",
                "aa-1,AA,desc,NASA,2",
                "mm-9,MM,desc,DoD,3",
            ]),
            leading_field,
        );
        assert_eq!(
            merged,
            lines(&[
                "aa-1,AA,desc,NASA,2",
                "mm-9,MM,desc,DoD,3",
                "zz-2,ZZ,desc,DoD,1",
            ])
        );
    }

    #[test]
    fn undated_lines_sort_first() {
        let merged = merge_lines(
            lines(&["20230101,a,DoD,1"]),
            lines(&["garbage line"]),
            ledger_date_key,
        );
        assert_eq!(merged[0], "garbage line");
    }
}
