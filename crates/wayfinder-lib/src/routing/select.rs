use crate::path::PairPath;

/// Pick the pair to report: minimum total cost over every reachable pair.
///
/// Each pair contributes exactly one cost, the total of the single path the
/// search returned for it. Equal totals keep the earliest pair in candidate
/// order. Returns `None` when nothing was reachable.
pub fn select_best(paths: &[PairPath]) -> Option<&PairPath> {
    paths
        .iter()
        .min_by(|a, b| a.total_cost.total_cmp(&b.total_cost))
}
