use crate::types::SegmentScore;

pub struct BudgetResult {
    /// Every ranked segment in the order considered, `kept` set on accepted ones.
    pub scored: Vec<SegmentScore>,
    pub tokens_used: usize,
    pub segments_selected: usize,
    pub segments_excluded_by_budget: usize,
}

/// Greedy single pass over `ranked`: accept while the running total fits,
/// skip (never revisit) what does not.
pub fn apply_budget(ranked: Vec<SegmentScore>, budget: usize) -> BudgetResult {
    let mut scored = Vec::with_capacity(ranked.len());
    let mut tokens_used = 0;
    let mut segments_selected = 0;
    let mut segments_excluded_by_budget = 0;

    for mut score in ranked {
        if tokens_used + score.tokens <= budget {
            tokens_used += score.tokens;
            score.kept = true;
            segments_selected += 1;
        } else {
            score.kept = false;
            segments_excluded_by_budget += 1;
        }
        scored.push(score);
    }

    BudgetResult {
        scored,
        tokens_used,
        segments_selected,
        segments_excluded_by_budget,
    }
}
