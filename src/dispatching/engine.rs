//! Rule engine for multi-criteria placement ordering.
//!
//! Composes multiple ordering rules with configurable evaluation modes
//! and tie-breaking strategies.

use std::cmp::Ordering;
use std::sync::Arc;

use super::{rules, DispatchingRule, ModuleDemand, RuleScore};

/// How multiple rules are combined.
#[derive(Debug, Clone, Default)]
pub enum EvaluationMode {
    /// Apply rules in sequence; use next rule only on ties.
    #[default]
    Sequential,
    /// Compute weighted sum of all rule scores.
    Weighted,
}

/// How ties are broken after all rules are exhausted.
#[derive(Debug, Clone, Default)]
pub enum TieBreaker {
    /// Keep the input order (the sort is stable).
    #[default]
    NextRule,
    /// Deterministic by module code (lexicographic).
    ByCode,
}

#[derive(Clone)]
struct WeightedRule {
    rule: Arc<dyn DispatchingRule>,
    weight: f64,
}

/// A composable rule engine for module ordering.
///
/// # Example
/// ```
/// use u_timetable::dispatching::RuleEngine;
/// use u_timetable::dispatching::rules;
///
/// let engine = RuleEngine::new()
///     .with_rule(rules::ConflictDegree)
///     .with_tie_breaker(rules::Headcount);
/// ```
#[derive(Clone)]
pub struct RuleEngine {
    rules: Vec<WeightedRule>,
    mode: EvaluationMode,
    tie_breaker: TieBreaker,
    epsilon: f64,
}

impl RuleEngine {
    /// Creates an empty rule engine.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            mode: EvaluationMode::Sequential,
            tie_breaker: TieBreaker::NextRule,
            epsilon: 1e-9,
        }
    }

    /// Most-constrained-first ordering used by the allocator by default:
    /// conflict degree, then group count, then shared students, then
    /// headcount, then module code.
    pub fn most_constrained_first() -> Self {
        Self::new()
            .with_rule(rules::ConflictDegree)
            .with_tie_breaker(rules::GroupCount)
            .with_tie_breaker(rules::SharedStudents)
            .with_tie_breaker(rules::Headcount)
            .with_final_tie_breaker(TieBreaker::ByCode)
    }

    /// Adds a primary rule (weight 1.0).
    pub fn with_rule<R: DispatchingRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(WeightedRule {
            rule: Arc::new(rule),
            weight: 1.0,
        });
        self
    }

    /// Adds a weighted rule.
    pub fn with_weighted_rule<R: DispatchingRule + 'static>(
        mut self,
        rule: R,
        weight: f64,
    ) -> Self {
        self.rules.push(WeightedRule {
            rule: Arc::new(rule),
            weight,
        });
        self
    }

    /// Adds a tie-breaking rule (weight 0.0, used only in Sequential mode).
    pub fn with_tie_breaker<R: DispatchingRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(WeightedRule {
            rule: Arc::new(rule),
            weight: 0.0,
        });
        self
    }

    /// Sets the evaluation mode.
    pub fn with_mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the final tie-breaking strategy.
    pub fn with_final_tie_breaker(mut self, tie_breaker: TieBreaker) -> Self {
        self.tie_breaker = tie_breaker;
        self
    }

    /// Sorts modules by placement priority (placed first = first).
    ///
    /// Returns indices into the given slice. The sort is stable.
    pub fn sort_indices(&self, demands: &[ModuleDemand]) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..demands.len()).collect();

        match &self.mode {
            EvaluationMode::Sequential => {
                indices.sort_by(|&a, &b| self.compare_sequential(&demands[a], &demands[b]));
            }
            EvaluationMode::Weighted => {
                let scores: Vec<f64> = demands.iter().map(|d| self.weighted_score(d)).collect();
                indices.sort_by(|&a, &b| {
                    scores[a]
                        .partial_cmp(&scores[b])
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| self.final_tie(&demands[a], &demands[b]))
                });
            }
        }

        indices
    }

    /// Evaluates a single module and returns scores from each rule.
    pub fn evaluate(&self, demand: &ModuleDemand) -> Vec<RuleScore> {
        self.rules
            .iter()
            .map(|wr| wr.rule.evaluate(demand) * wr.weight)
            .collect()
    }

    fn compare_sequential(&self, a: &ModuleDemand, b: &ModuleDemand) -> Ordering {
        for wr in &self.rules {
            let score_a = wr.rule.evaluate(a);
            let score_b = wr.rule.evaluate(b);

            if (score_a - score_b).abs() > self.epsilon {
                return score_a.partial_cmp(&score_b).unwrap_or(Ordering::Equal);
            }
        }

        self.final_tie(a, b)
    }

    fn final_tie(&self, a: &ModuleDemand, b: &ModuleDemand) -> Ordering {
        match &self.tie_breaker {
            TieBreaker::NextRule => Ordering::Equal,
            TieBreaker::ByCode => a.code.cmp(&b.code),
        }
    }

    fn weighted_score(&self, demand: &ModuleDemand) -> f64 {
        self.rules
            .iter()
            .map(|wr| wr.rule.evaluate(demand) * wr.weight)
            .sum()
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::most_constrained_first()
    }
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field(
                "rules",
                &self
                    .rules
                    .iter()
                    .map(|r| format!("{}(w={})", r.rule.name(), r.weight))
                    .collect::<Vec<_>>(),
            )
            .field("mode", &self.mode)
            .field("tie_breaker", &self.tie_breaker)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatching::rules;

    fn demand(code: &str, groups: usize, degree: usize, headcount: u32) -> ModuleDemand {
        ModuleDemand {
            index: 0,
            code: code.into(),
            group_count: groups,
            headcount,
            credits: 0,
            conflict_degree: degree,
            shared_students: 0,
        }
    }

    #[test]
    fn test_degree_ordering() {
        let demands = vec![
            demand("low", 1, 1, 10),
            demand("high", 1, 5, 10),
            demand("mid", 1, 3, 10),
        ];
        let engine = RuleEngine::new().with_rule(rules::ConflictDegree);
        let order = engine.sort_indices(&demands);
        let codes: Vec<_> = order.iter().map(|&i| demands[i].code.as_str()).collect();
        assert_eq!(codes, vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_sequential_with_tie_breaker() {
        let demands = vec![demand("A", 1, 2, 10), demand("B", 3, 2, 10)];
        let engine = RuleEngine::new()
            .with_rule(rules::ConflictDegree)
            .with_tie_breaker(rules::GroupCount);
        let order = engine.sort_indices(&demands);
        // Degree ties → more groups first
        assert_eq!(demands[order[0]].code, "B");
    }

    #[test]
    fn test_by_code_tie_breaker() {
        let demands = vec![demand("M2", 1, 1, 10), demand("M1", 1, 1, 10)];
        let stable = RuleEngine::new().with_rule(rules::GroupCount);
        assert_eq!(stable.sort_indices(&demands), vec![0, 1]);

        let by_code = stable.with_final_tie_breaker(TieBreaker::ByCode);
        assert_eq!(by_code.sort_indices(&demands), vec![1, 0]);
    }

    #[test]
    fn test_weighted_mode() {
        let demands = vec![demand("A", 4, 1, 10), demand("B", 1, 3, 10)];
        let engine = RuleEngine::new()
            .with_mode(EvaluationMode::Weighted)
            .with_weighted_rule(rules::ConflictDegree, 1.0)
            .with_weighted_rule(rules::GroupCount, 1.0);
        // A: -1 - 4 = -5, B: -3 - 1 = -4 → A first
        assert_eq!(demands[engine.sort_indices(&demands)[0]].code, "A");
    }

    #[test]
    fn test_default_is_most_constrained_first() {
        let demands = vec![
            demand("C", 1, 0, 10),
            demand("B", 2, 4, 50),
            demand("A", 2, 4, 50),
        ];
        let order = RuleEngine::default().sort_indices(&demands);
        let codes: Vec<_> = order.iter().map(|&i| demands[i].code.as_str()).collect();
        assert_eq!(codes, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_empty() {
        assert!(RuleEngine::default().sort_indices(&[]).is_empty());
    }

    #[test]
    fn test_evaluate_scores() {
        let engine = RuleEngine::new()
            .with_rule(rules::ConflictDegree)
            .with_rule(rules::Headcount);
        let scores = engine.evaluate(&demand("X", 1, 3, 40));
        assert_eq!(scores.len(), 2);
        assert!((scores[0] + 3.0).abs() < 1e-10);
        assert!((scores[1] + 40.0).abs() < 1e-10);
    }
}
