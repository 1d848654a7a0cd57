//! Scoring extracted answers against an answer key.
//!
//! Subjects occupy consecutive blocks of questions in key order: with
//! `questions_per_subject = 10`, questions 1-10 belong to the first subject,
//! 11-20 to the second and so on. The key is passed explicitly per call.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::QuestionResult;

/// Answer key validation failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GradingError {
    /// A subject's answer list has the wrong length.
    #[error("subject {subject}: expected {expected} answers, got {actual}")]
    LengthMismatch {
        /// Subject name
        subject: String,
        /// `questions_per_subject`
        expected: usize,
        /// Answers given
        actual: usize,
    },

    /// An answer is not an option letter.
    #[error("subject {subject}: invalid option {option:?} at question {question}")]
    InvalidOption {
        /// Subject name
        subject: String,
        /// 1-based question within the subject
        question: usize,
        /// Offending character
        option: char,
    },

    /// Subject name is empty.
    #[error("subject name must not be empty")]
    EmptySubject,

    /// Subject appears twice.
    #[error("duplicate subject: {0}")]
    DuplicateSubject(String),

    /// Key file could not be read or parsed.
    #[error("cannot load answer key: {0}")]
    Load(String),
}

/// Correct answers for one subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectKey {
    /// Subject identifier
    pub subject: String,
    /// Correct option letter per question
    pub answers: Vec<char>,
}

#[derive(Deserialize)]
struct RawAnswerKey {
    questions_per_subject: usize,
    subjects: Vec<SubjectKey>,
}

/// Ordered mapping from subject to a fixed-length answer sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerKey {
    questions_per_subject: usize,
    subjects: Vec<SubjectKey>,
}

impl AnswerKey {
    /// Build a key, checking lengths, letters and subject names
    pub fn new(
        subjects: Vec<SubjectKey>,
        questions_per_subject: usize,
    ) -> Result<Self, GradingError> {
        for (i, key) in subjects.iter().enumerate() {
            if key.subject.trim().is_empty() {
                return Err(GradingError::EmptySubject);
            }
            if subjects[..i].iter().any(|k| k.subject == key.subject) {
                return Err(GradingError::DuplicateSubject(key.subject.clone()));
            }
            if key.answers.len() != questions_per_subject {
                return Err(GradingError::LengthMismatch {
                    subject: key.subject.clone(),
                    expected: questions_per_subject,
                    actual: key.answers.len(),
                });
            }
            if let Some((q, &option)) = key
                .answers
                .iter()
                .enumerate()
                .find(|(_, c)| !c.is_ascii_uppercase())
            {
                return Err(GradingError::InvalidOption {
                    subject: key.subject.clone(),
                    question: q + 1,
                    option,
                });
            }
        }
        Ok(Self {
            questions_per_subject,
            subjects,
        })
    }

    /// Parse a JSON key: `{"questions_per_subject": N, "subjects": [{"subject": .., "answers": [..]}]}`
    pub fn from_json(json: &str) -> Result<Self, GradingError> {
        let raw: RawAnswerKey =
            serde_json::from_str(json).map_err(|e| GradingError::Load(e.to_string()))?;
        Self::new(raw.subjects, raw.questions_per_subject)
    }

    /// Read and parse a JSON key file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GradingError> {
        let json = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            GradingError::Load(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Questions per subject
    pub fn questions_per_subject(&self) -> usize {
        self.questions_per_subject
    }

    /// Subjects in sheet order
    pub fn subjects(&self) -> &[SubjectKey] {
        &self.subjects
    }
}

/// Result for one subject
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectScore {
    /// Subject identifier
    pub subject: String,
    /// Questions answered correctly
    pub correct: usize,
    /// Questions with any option selected
    pub answered: usize,
    /// Questions in the subject
    pub total: usize,
}

/// Per-subject and overall tally
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    /// One entry per subject, key order
    pub subjects: Vec<SubjectScore>,
    /// Sum of correct answers
    pub correct: usize,
    /// Sum of questions
    pub total: usize,
}

/// Compare extracted answers with the key. Missing rows count as unanswered.
pub fn score(key: &AnswerKey, questions: &[QuestionResult]) -> ScoreReport {
    let per = key.questions_per_subject;
    let subjects: Vec<SubjectScore> = key
        .subjects
        .iter()
        .enumerate()
        .map(|(s, subject_key)| {
            let mut correct = 0;
            let mut answered = 0;
            for (q, &expected) in subject_key.answers.iter().enumerate() {
                let Some(selected) = questions.get(s * per + q).and_then(|r| r.option_letter())
                else {
                    continue;
                };
                answered += 1;
                if selected == expected {
                    correct += 1;
                }
            }
            SubjectScore {
                subject: subject_key.subject.clone(),
                correct,
                answered,
                total: per,
            }
        })
        .collect();

    ScoreReport {
        correct: subjects.iter().map(|s| s.correct).sum(),
        total: subjects.iter().map(|s| s.total).sum(),
        subjects,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(name: &str, answers: &str) -> SubjectKey {
        SubjectKey {
            subject: name.to_string(),
            answers: answers.chars().collect(),
        }
    }

    fn question(index: usize, selected: Option<usize>) -> QuestionResult {
        QuestionResult {
            index,
            selected_option: selected,
            scores_per_option: vec![0.0; 4],
        }
    }

    #[test]
    fn test_validates_length() {
        let err = AnswerKey::new(vec![subject("math", "ABC")], 4).unwrap_err();
        assert_eq!(
            err,
            GradingError::LengthMismatch {
                subject: "math".into(),
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn test_validates_letters_and_names() {
        assert!(matches!(
            AnswerKey::new(vec![subject("math", "AbC")], 3),
            Err(GradingError::InvalidOption { question: 2, .. })
        ));
        assert_eq!(
            AnswerKey::new(vec![subject(" ", "ABC")], 3),
            Err(GradingError::EmptySubject)
        );
        assert_eq!(
            AnswerKey::new(vec![subject("math", "ABC"), subject("math", "ABC")], 3),
            Err(GradingError::DuplicateSubject("math".into()))
        );
    }

    #[test]
    fn test_score_per_subject() {
        let key = AnswerKey::new(vec![subject("math", "AB"), subject("physics", "CD")], 2).unwrap();
        let questions = vec![
            question(1, Some(0)), // A, correct
            question(2, Some(2)), // C, wrong
            question(3, None),    // unanswered
            question(4, Some(3)), // D, correct
        ];

        let report = score(&key, &questions);
        assert_eq!(report.correct, 2);
        assert_eq!(report.total, 4);
        assert_eq!(report.subjects[0].correct, 1);
        assert_eq!(report.subjects[0].answered, 2);
        assert_eq!(report.subjects[1].subject, "physics");
        assert_eq!(report.subjects[1].answered, 1);
    }

    #[test]
    fn test_missing_rows_are_unanswered() {
        let key = AnswerKey::new(vec![subject("math", "AAA")], 3).unwrap();
        let report = score(&key, &[question(1, Some(0))]);
        assert_eq!(report.correct, 1);
        assert_eq!(report.subjects[0].answered, 1);
        assert_eq!(report.total, 3);
    }

    #[test]
    fn test_from_json() {
        let key = AnswerKey::from_json(
            r#"{"questions_per_subject": 2, "subjects": [{"subject": "bio", "answers": ["A", "D"]}]}"#,
        )
        .unwrap();
        assert_eq!(key.subjects()[0].answers, vec!['A', 'D']);
        assert!(AnswerKey::from_json("{").is_err());
    }
}
