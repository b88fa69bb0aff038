//! The scorer: exercise content + submitted answers → raw percentage.
//!
//! Pure and I/O-free. Each exercise type has its own comparison rule;
//! an exercise with zero gradable items scores 0, never NaN.

use std::collections::HashSet;

use crate::exercise::{ExerciseContent, MatchPair, SubmittedAnswers};

/// The outcome of scoring one submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreOutcome {
    /// Raw percentage in [0, 100].
    pub percent: f64,

    /// True when the exercise type has no deterministic check and must be
    /// graded manually. Such submissions are never auto-credited.
    pub needs_review: bool,
}

impl ScoreOutcome {
    const fn graded(percent: f64) -> Self {
        Self {
            percent,
            needs_review: false,
        }
    }
}

/// Errors from scoring a submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoreError {
    /// The submitted answer variant does not match the exercise content
    /// variant (e.g. ordering answers for a matching exercise).
    #[error("answers do not match exercise type: expected {expected}, got {got}")]
    AnswerMismatch {
        /// The content variant tag.
        expected: &'static str,
        /// The submitted variant tag.
        got: &'static str,
    },
}

/// Score a submission against its exercise content.
///
/// # Errors
///
/// Returns [`ScoreError::AnswerMismatch`] when the answer shape does not
/// correspond to the exercise type; this is a caller validation failure,
/// not a zero score.
pub fn score(
    content: &ExerciseContent,
    answers: &SubmittedAnswers,
) -> Result<ScoreOutcome, ScoreError> {
    match (content, answers) {
        (
            ExerciseContent::MultipleChoice { questions },
            SubmittedAnswers::MultipleChoice { answers },
        ) => {
            let correct = questions
                .iter()
                .filter(|q| {
                    answers
                        .get(&q.id)
                        .is_some_and(|a| text_eq(a, &q.correct))
                })
                .count();
            Ok(ScoreOutcome::graded(fraction(correct, questions.len())))
        }

        (ExerciseContent::FillBlanks { blanks }, SubmittedAnswers::FillBlanks { answers }) => {
            let correct = blanks
                .iter()
                .filter(|b| {
                    answers
                        .get(&b.id)
                        .is_some_and(|a| b.accepted.iter().any(|acc| text_eq(a, acc)))
                })
                .count();
            Ok(ScoreOutcome::graded(fraction(correct, blanks.len())))
        }

        (ExerciseContent::MultiSelect { questions }, SubmittedAnswers::MultiSelect { answers }) => {
            let correct = questions
                .iter()
                .filter(|q| {
                    answers
                        .get(&q.id)
                        .is_some_and(|selected| set_eq(selected, &q.correct))
                })
                .count();
            Ok(ScoreOutcome::graded(fraction(correct, questions.len())))
        }

        (ExerciseContent::Ordering { items }, SubmittedAnswers::Ordering { order }) => {
            let in_place = items
                .iter()
                .zip(order.iter())
                .filter(|(expected, got)| text_eq(expected, got))
                .count();
            Ok(ScoreOutcome::graded(fraction(in_place, items.len())))
        }

        (ExerciseContent::Matching { pairs }, SubmittedAnswers::Matching { pairs: submitted }) => {
            let want: HashSet<(String, String)> = pairs.iter().map(normalize_pair).collect();
            let matched = submitted
                .iter()
                .map(normalize_pair)
                .collect::<HashSet<_>>()
                .intersection(&want)
                .count();
            Ok(ScoreOutcome::graded(fraction(matched, pairs.len())))
        }

        (ExerciseContent::FreeResponse { min_words }, SubmittedAnswers::FreeResponse { text }) => {
            // Binary "contributed enough" heuristic.
            let words = text.split_whitespace().count();
            let complete = words >= *min_words as usize && *min_words > 0;
            Ok(ScoreOutcome::graded(if complete { 100.0 } else { 0.0 }))
        }

        (ExerciseContent::Project {}, SubmittedAnswers::Project {}) => Ok(ScoreOutcome {
            percent: 0.0,
            needs_review: true,
        }),

        (content, answers) => Err(ScoreError::AnswerMismatch {
            expected: content_tag(content),
            got: answer_tag(answers),
        }),
    }
}

/// Percentage of `correct` out of `total`, 0.0 when there is nothing to grade.
#[allow(clippy::cast_precision_loss)]
fn fraction(correct: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64 * 100.0
    }
}

fn text_eq(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

fn set_eq(a: &[String], b: &[String]) -> bool {
    let norm = |xs: &[String]| {
        xs.iter()
            .map(|x| x.trim().to_ascii_lowercase())
            .collect::<HashSet<_>>()
    };
    norm(a) == norm(b)
}

fn normalize_pair(p: &MatchPair) -> (String, String) {
    (
        p.left.trim().to_ascii_lowercase(),
        p.right.trim().to_ascii_lowercase(),
    )
}

const fn content_tag(content: &ExerciseContent) -> &'static str {
    match content {
        ExerciseContent::MultipleChoice { .. } => "multiple_choice",
        ExerciseContent::FillBlanks { .. } => "fill_blanks",
        ExerciseContent::MultiSelect { .. } => "multi_select",
        ExerciseContent::Ordering { .. } => "ordering",
        ExerciseContent::Matching { .. } => "matching",
        ExerciseContent::FreeResponse { .. } => "free_response",
        ExerciseContent::Project {} => "project",
    }
}

const fn answer_tag(answers: &SubmittedAnswers) -> &'static str {
    match answers {
        SubmittedAnswers::MultipleChoice { .. } => "multiple_choice",
        SubmittedAnswers::FillBlanks { .. } => "fill_blanks",
        SubmittedAnswers::MultiSelect { .. } => "multi_select",
        SubmittedAnswers::Ordering { .. } => "ordering",
        SubmittedAnswers::Matching { .. } => "matching",
        SubmittedAnswers::FreeResponse { .. } => "free_response",
        SubmittedAnswers::Project {} => "project",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercise::{Blank, ChoiceQuestion, SelectQuestion};
    use std::collections::HashMap;

    fn choice_content() -> ExerciseContent {
        ExerciseContent::MultipleChoice {
            questions: vec![
                ChoiceQuestion {
                    id: "q1".into(),
                    correct: "Paris".into(),
                },
                ChoiceQuestion {
                    id: "q2".into(),
                    correct: "Rome".into(),
                },
            ],
        }
    }

    #[test]
    fn multiple_choice_case_insensitive() {
        let answers = SubmittedAnswers::MultipleChoice {
            answers: HashMap::from([
                ("q1".to_string(), "  paris ".to_string()),
                ("q2".to_string(), "Madrid".to_string()),
            ]),
        };

        let outcome = score(&choice_content(), &answers).unwrap();
        assert!((outcome.percent - 50.0).abs() < f64::EPSILON);
        assert!(!outcome.needs_review);
    }

    #[test]
    fn zero_gradable_items_scores_zero_not_nan() {
        let content = ExerciseContent::MultipleChoice { questions: vec![] };
        let answers = SubmittedAnswers::MultipleChoice {
            answers: HashMap::new(),
        };

        let outcome = score(&content, &answers).unwrap();
        assert!((outcome.percent - 0.0).abs() < f64::EPSILON);
        assert!(outcome.percent.is_finite());
    }

    #[test]
    fn fill_blanks_accepts_alternatives() {
        let content = ExerciseContent::FillBlanks {
            blanks: vec![Blank {
                id: "b1".into(),
                accepted: vec!["colour".into(), "color".into()],
            }],
        };
        let answers = SubmittedAnswers::FillBlanks {
            answers: HashMap::from([("b1".to_string(), "COLOR".to_string())]),
        };

        let outcome = score(&content, &answers).unwrap();
        assert!((outcome.percent - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn multi_select_requires_exact_set() {
        let content = ExerciseContent::MultiSelect {
            questions: vec![SelectQuestion {
                id: "q1".into(),
                correct: vec!["a".into(), "b".into()],
            }],
        };

        let right = SubmittedAnswers::MultiSelect {
            answers: HashMap::from([("q1".to_string(), vec!["B".to_string(), "a".to_string()])]),
        };
        assert!((score(&content, &right).unwrap().percent - 100.0).abs() < f64::EPSILON);

        let partial = SubmittedAnswers::MultiSelect {
            answers: HashMap::from([("q1".to_string(), vec!["a".to_string()])]),
        };
        assert!((score(&content, &partial).unwrap().percent - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ordering_gives_positional_credit() {
        let content = ExerciseContent::Ordering {
            items: vec!["one".into(), "two".into(), "three".into(), "four".into()],
        };
        let answers = SubmittedAnswers::Ordering {
            order: vec!["one".into(), "three".into(), "two".into(), "four".into()],
        };

        let outcome = score(&content, &answers).unwrap();
        assert!((outcome.percent - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn matching_is_order_insensitive() {
        let content = ExerciseContent::Matching {
            pairs: vec![
                MatchPair {
                    left: "cat".into(),
                    right: "meow".into(),
                },
                MatchPair {
                    left: "dog".into(),
                    right: "woof".into(),
                },
            ],
        };
        let answers = SubmittedAnswers::Matching {
            pairs: vec![
                MatchPair {
                    left: "Dog".into(),
                    right: "Woof".into(),
                },
                MatchPair {
                    left: "cat".into(),
                    right: "meow".into(),
                },
            ],
        };

        let outcome = score(&content, &answers).unwrap();
        assert!((outcome.percent - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn free_response_word_count_heuristic() {
        let content = ExerciseContent::FreeResponse { min_words: 5 };

        let enough = SubmittedAnswers::FreeResponse {
            text: "this answer has at least five words".into(),
        };
        assert!((score(&content, &enough).unwrap().percent - 100.0).abs() < f64::EPSILON);

        let short = SubmittedAnswers::FreeResponse {
            text: "too short".into(),
        };
        assert!((score(&content, &short).unwrap().percent - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn project_flagged_for_manual_review() {
        let outcome = score(&ExerciseContent::Project {}, &SubmittedAnswers::Project {}).unwrap();
        assert!(outcome.needs_review);
        assert!((outcome.percent - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn mismatched_answer_shape_is_an_error() {
        let result = score(
            &choice_content(),
            &SubmittedAnswers::Ordering { order: vec![] },
        );
        assert!(matches!(result, Err(ScoreError::AnswerMismatch { .. })));
    }
}
