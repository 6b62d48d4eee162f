//! Retention planning: which messages survive a compression pass verbatim

use super::models::{ImportanceScore, Message, RetentionRules};
use super::scorer::ImportanceScorer;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::debug;

/// Share of the history retained by importance when enabled
pub const IMPORTANT_FRACTION: f64 = 0.3;

/// Retained and discarded positions for one history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPlan {
    /// Positions kept verbatim, ascending
    pub retained: Vec<usize>,
    /// Positions folded into the summary, ascending
    pub discarded: Vec<usize>,
}

impl RetentionPlan {
    fn keep_all(len: usize) -> Self {
        Self {
            retained: (0..len).collect(),
            discarded: Vec::new(),
        }
    }

    pub fn retained_messages(&self, history: &[Message]) -> Vec<Message> {
        self.retained.iter().map(|&i| history[i].clone()).collect()
    }

    pub fn discarded_messages<'a>(&self, history: &'a [Message]) -> Vec<&'a Message> {
        self.discarded.iter().map(|&i| &history[i]).collect()
    }

    pub fn is_identity(&self) -> bool {
        self.discarded.is_empty()
    }
}

/// Selects the retained subset of a history under a set of retention rules
#[derive(Debug, Clone, Default)]
pub struct RetentionPlanner {
    scorer: ImportanceScorer,
}

impl RetentionPlanner {
    pub fn new(scorer: ImportanceScorer) -> Self {
        Self { scorer }
    }

    /// Retained messages in original order
    pub fn plan(&self, history: &[Message], rules: &RetentionRules) -> Vec<Message> {
        self.plan_indices(history, rules).retained_messages(history)
    }

    /// Compute the plan as positions into `history`
    ///
    /// Safe to call below the recency floor: the whole history is retained.
    pub fn plan_indices(&self, history: &[Message], rules: &RetentionRules) -> RetentionPlan {
        let len = history.len();
        if len <= rules.keep_recent_messages {
            return RetentionPlan::keep_all(len);
        }

        let mut keep = BTreeSet::new();

        if rules.keep_system_messages {
            keep.extend(
                history
                    .iter()
                    .enumerate()
                    .filter(|(_, m)| m.role.is_system())
                    .map(|(i, _)| i),
            );
        }

        keep.extend(len - rules.keep_recent_messages..len);

        if rules.keep_important_messages {
            let scores = self.scorer.score(history);
            keep.extend(top_by_importance(&scores, important_count(len)));
        }

        let retained: Vec<usize> = keep.into_iter().collect();
        let discarded = complement(&retained, len);

        debug!(
            "Retention plan: {} of {} messages kept, {} discarded",
            retained.len(),
            len,
            discarded.len()
        );

        RetentionPlan {
            retained,
            discarded,
        }
    }
}

/// Number of messages retained by importance for a history of `len`
pub fn important_count(len: usize) -> usize {
    (IMPORTANT_FRACTION * len as f64).floor() as usize
}

/// Positions of the `count` highest scores; ties go to the earlier position
fn top_by_importance(scores: &[ImportanceScore], count: usize) -> Vec<usize> {
    let mut ranked: Vec<&ImportanceScore> = scores.iter().collect();
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.index.cmp(&b.index))
    });
    ranked.into_iter().take(count).map(|s| s.index).collect()
}

fn complement(retained: &[usize], len: usize) -> Vec<usize> {
    let mut discarded = Vec::with_capacity(len - retained.len());
    let mut kept = retained.iter().peekable();
    for i in 0..len {
        if kept.peek() == Some(&&i) {
            kept.next();
        } else {
            discarded.push(i);
        }
    }
    discarded
}
