//! Importance scoring for conversation messages
//!
//! Scores are additive and only meaningful relative to each other within one
//! history: the recency term depends on the history length, so scores are
//! recomputed on every compression pass.

use super::models::{ImportanceScore, Message, Role, ScoreReason};
use std::collections::BTreeSet;

const SYSTEM_BONUS: f64 = 100.0;
const RECENCY_WEIGHT: f64 = 20.0;
const RECENT_TAG_THRESHOLD: f64 = 15.0;
const DETAILED_LENGTH: usize = 500;
const DETAILED_BONUS: f64 = 10.0;
const BRIEF_LENGTH: usize = 50;
const BRIEF_PENALTY: f64 = -5.0;
const KEYWORD_BONUS: f64 = 2.0;
const KEYWORD_TAG_THRESHOLD: f64 = 5.0;
const QA_PAIR_BONUS: f64 = 15.0;
const CODE_BONUS: f64 = 15.0;

/// Matched case-insensitively; English and Chinese forms are both listed
const IMPORTANT_KEYWORDS: &[&str] = &[
    "error",
    "bug",
    "fix",
    "exception",
    "implement",
    "config",
    "api",
    "database",
    "错误",
    "漏洞",
    "修复",
    "异常",
    "实现",
    "配置",
    "接口",
    "数据库",
];

/// Matched case-sensitively
const CODE_INDICATORS: &[&str] = &[
    "```",
    "function",
    "class ",
    "const ",
    "def ",
    "import ",
    "{",
    "}",
    "=>",
    "console.log",
    "print(",
];

/// Deterministic multi-factor importance scorer
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportanceScorer;

impl ImportanceScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score every message of `history`, one result per message in input order
    pub fn score(&self, history: &[Message]) -> Vec<ImportanceScore> {
        (0..history.len())
            .map(|index| self.score_at(history, index))
            .collect()
    }

    /// Score the message at `index` in the context of the whole history;
    /// `index` must be in bounds
    fn score_at(&self, history: &[Message], index: usize) -> ImportanceScore {
        let message = &history[index];
        let total = history.len() as f64;
        let mut score = 0.0;
        let mut reasons = BTreeSet::new();

        if message.role == Role::System {
            score += SYSTEM_BONUS;
        }

        let recency = ((total - index as f64) / total * RECENCY_WEIGHT).max(0.0);
        score += recency;
        if recency > RECENT_TAG_THRESHOLD {
            reasons.insert(ScoreReason::Recent);
        }

        let length = message.content.chars().count();
        if length > DETAILED_LENGTH {
            score += DETAILED_BONUS;
            reasons.insert(ScoreReason::Detailed);
        } else if length < BRIEF_LENGTH {
            score += BRIEF_PENALTY;
            reasons.insert(ScoreReason::Brief);
        }

        let keyword_score = keyword_matches(&message.content) as f64 * KEYWORD_BONUS;
        score += keyword_score;
        if keyword_score > KEYWORD_TAG_THRESHOLD {
            reasons.insert(ScoreReason::Keyword);
        }

        if message.role == Role::User
            && history
                .get(index + 1)
                .is_some_and(|next| next.role == Role::Assistant)
        {
            score += QA_PAIR_BONUS;
            reasons.insert(ScoreReason::QaPair);
        }

        if contains_code(&message.content) {
            score += CODE_BONUS;
            reasons.insert(ScoreReason::Code);
        }

        ImportanceScore {
            index,
            score: score.max(0.0),
            reasons,
        }
    }
}

fn keyword_matches(content: &str) -> usize {
    let lowered = content.to_lowercase();
    IMPORTANT_KEYWORDS
        .iter()
        .filter(|keyword| lowered.contains(*keyword))
        .count()
}

fn contains_code(content: &str) -> bool {
    CODE_INDICATORS
        .iter()
        .any(|indicator| content.contains(indicator))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score_of(history: &[Message], index: usize) -> ImportanceScore {
        ImportanceScorer::new().score_at(history, index)
    }

    #[test]
    fn test_system_bonus_dominates() {
        let history = vec![
            Message::user("Please implement the database API and fix this error", 0),
            Message::system("You are helpful", 1),
        ];
        let scores = ImportanceScorer::new().score(&history);
        assert!(scores[1].score > scores[0].score);
        assert_eq!(scores[0].index, 0);
        assert_eq!(scores[1].index, 1);
    }

    #[test]
    fn test_recency_term_follows_position_formula() {
        let history: Vec<Message> = (0..4)
            .map(|i| Message::user("x".repeat(100), i))
            .collect();
        let scores = ImportanceScorer::new().score(&history);
        // (4 - 0) / 4 * 20 = 20, then 15, 10, 5; no other term applies
        assert_eq!(scores[0].score, 20.0);
        assert_eq!(scores[1].score, 15.0);
        assert_eq!(scores[3].score, 5.0);
        assert!(scores[0].has_reason(ScoreReason::Recent));
        assert!(!scores[1].has_reason(ScoreReason::Recent));
    }

    #[test]
    fn test_length_signals_are_exclusive() {
        let history = vec![
            Message::user("y".repeat(600), 0),
            Message::user("y".repeat(100), 1),
            Message::user("ok", 2),
        ];
        let scorer = ImportanceScorer::new();
        let detailed = scorer.score_at(&history, 0);
        let plain = scorer.score_at(&history, 1);
        let brief = scorer.score_at(&history, 2);

        assert!(detailed.has_reason(ScoreReason::Detailed));
        assert!(!detailed.has_reason(ScoreReason::Brief));
        assert!(plain.reasons.is_empty() || plain.reasons == BTreeSet::from([ScoreReason::Recent]));
        assert!(brief.has_reason(ScoreReason::Brief));
    }

    #[test]
    fn test_floor_applies_to_sum() {
        // last of many: recency 20/N, brief -5 -> clamps to zero
        let history: Vec<Message> = (0..10).map(|i| Message::user("ok", i)).collect();
        let last = score_of(&history, 9);
        assert_eq!(last.score, 0.0);

        // recency 4 - 5 + keywords 2 = 1, not clamped per term
        let mut history: Vec<Message> = (0..4).map(|i| Message::user("x".repeat(80), i)).collect();
        history.push(Message::assistant("bug", 4));
        let scored = score_of(&history, 4);
        assert!((scored.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_keywords_are_case_insensitive_and_bilingual() {
        let history = vec![Message::assistant(
            "The ERROR came from the Database config; 数据库配置有错误",
            0,
        )];
        let scored = score_of(&history, 0);
        assert!(scored.has_reason(ScoreReason::Keyword));
        assert_eq!(keyword_matches("The ERROR came from the Database config"), 3);
        assert_eq!(keyword_matches("数据库配置有错误"), 3);
    }

    #[test]
    fn test_keyword_tag_needs_more_than_five_points() {
        assert_eq!(keyword_matches("error bug fix"), 3);
        let history = vec![Message::assistant("error and bug and fix", 0)];
        let scored = score_of(&history, 0);
        assert!(scored.has_reason(ScoreReason::Keyword));

        let history = vec![Message::assistant("error and bug", 0)];
        assert!(!score_of(&history, 0).has_reason(ScoreReason::Keyword));
    }

    #[test]
    fn test_qa_pair_looks_one_ahead_only() {
        let history = vec![
            Message::user("question one", 0),
            Message::user("question two", 1),
            Message::assistant("answer", 2),
        ];
        let scorer = ImportanceScorer::new();
        assert!(!scorer.score_at(&history, 0).has_reason(ScoreReason::QaPair));
        assert!(scorer.score_at(&history, 1).has_reason(ScoreReason::QaPair));
        assert!(!scorer.score_at(&history, 2).has_reason(ScoreReason::QaPair));
    }

    #[test]
    fn test_code_signal_is_case_sensitive() {
        assert!(contains_code("function foo() { return 1; }"));
        assert!(contains_code("print(x)"));
        assert!(!contains_code("FUNCTION in uppercase"));
        assert!(!contains_code("hi"));
    }

    #[test]
    fn test_code_outscores_greeting() {
        for history in [
            vec![Message::user("function foo() { return 1; }", 0), Message::user("hi", 1)],
            vec![Message::user("hi", 0), Message::user("function foo() { return 1; }", 1)],
        ] {
            let scores = ImportanceScorer::new().score(&history);
            let (code, greeting) = if history[0].content == "hi" {
                (&scores[1], &scores[0])
            } else {
                (&scores[0], &scores[1])
            };
            assert!(code.score > greeting.score);
            assert!(code.has_reason(ScoreReason::Code));
        }
    }

    #[test]
    fn test_unknown_role_gets_no_role_bonus() {
        let history = vec![Message::new(Role::Other("tool".into()), "x".repeat(100), 0)];
        assert_eq!(score_of(&history, 0).score, 20.0);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let history = vec![
            Message::system("You are helpful", 0),
            Message::user("how do I fix this bug?", 1),
            Message::assistant("```rust\nfn main() {}\n```", 2),
        ];
        let scorer = ImportanceScorer::new();
        assert_eq!(scorer.score(&history), scorer.score(&history));
    }

    #[test]
    fn test_one_score_per_message_in_order() {
        let scorer = ImportanceScorer::new();
        assert!(scorer.score(&[]).is_empty());

        let history = vec![Message::user("a", 0), Message::assistant("b", 1)];
        let indices: Vec<usize> = scorer.score(&history).iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1]);
    }
}
