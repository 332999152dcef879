//! Multiple-choice assignments and their auto-grading.
//!
//! Grading is a single pass over the submitted answers: a question's points
//! are awarded iff the chosen option is marked correct. There is no partial
//! credit and no negative marking.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EduError, Result};
use crate::{AssignmentId, CourseId, OptionId, QuestionId, SubmissionId, UserId};

/// An answer option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    /// Option ID.
    pub id: OptionId,
    /// Option text (may contain LaTeX).
    pub text: String,
    /// Whether choosing it earns the question's points.
    pub is_correct: bool,
}

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    /// Question ID.
    pub id: QuestionId,
    /// Prompt (may contain LaTeX).
    pub prompt: String,
    /// Points for a correct answer.
    pub points: u32,
    /// At least two options, at least one correct.
    pub options: Vec<QuizOption>,
}

/// Author input for one option.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionSpec {
    /// Option text.
    pub text: String,
    /// Marked correct.
    #[serde(default)]
    pub is_correct: bool,
}

/// Author input for one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSpec {
    /// Prompt.
    pub prompt: String,
    /// Points, default 1.
    #[serde(default = "default_points")]
    pub points: u32,
    /// Options.
    pub options: Vec<OptionSpec>,
}

const fn default_points() -> u32 {
    1
}

/// Most points a single question may be worth.
pub const MAX_QUESTION_POINTS: u32 = 1000;

/// Most questions one assignment may hold.
pub const MAX_QUESTIONS: usize = 200;

/// Author input for an assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentSpec {
    /// Title.
    pub title: String,
    /// Instructions shown before starting.
    #[serde(default)]
    pub instructions: String,
    /// Questions.
    pub questions: Vec<QuestionSpec>,
    /// Score percentage needed to pass (default 60).
    #[serde(default = "default_pass_percent")]
    pub pass_percent: u8,
    /// Attempt limit.
    #[serde(default)]
    pub max_attempts: Option<u32>,
    /// Submission deadline.
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
}

const fn default_pass_percent() -> u8 {
    60
}

/// A graded multiple-choice assignment in a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    /// Assignment ID.
    pub id: AssignmentId,
    /// Owning course.
    pub course_id: CourseId,
    /// Title.
    pub title: String,
    /// Instructions.
    pub instructions: String,
    /// Questions.
    pub questions: Vec<QuizQuestion>,
    /// Pass threshold in percent.
    pub pass_percent: u8,
    /// Attempt limit.
    pub max_attempts: Option<u32>,
    /// Deadline.
    pub due_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// One submitted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    /// Question answered.
    pub question_id: QuestionId,
    /// Option chosen.
    pub option_id: OptionId,
}

/// Per-question grading outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResult {
    /// Question.
    pub question_id: QuestionId,
    /// Chosen option, if answered.
    pub selected: Option<OptionId>,
    /// Whether the chosen option is correct.
    pub correct: bool,
    /// Points earned.
    pub points_awarded: u32,
}

/// Outcome of grading a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    /// Points earned.
    pub score: u32,
    /// Points available.
    pub max_score: u32,
    /// Whole percent, rounded down.
    pub percent: u8,
    /// Reached the pass threshold.
    pub passed: bool,
    /// Per-question detail, in assignment order.
    pub results: Vec<QuestionResult>,
}

impl Assignment {
    /// Build an assignment from author input.
    ///
    /// # Errors
    ///
    /// Returns `EduError::Invalid` for a blank title, no questions or more
    /// than [`MAX_QUESTIONS`], a question worth 0 or more than
    /// [`MAX_QUESTION_POINTS`] points, fewer than two options or no correct
    /// option, or a pass threshold above 100.
    pub fn new(course_id: CourseId, spec: AssignmentSpec) -> Result<Self> {
        let title = spec.title.trim();
        if title.is_empty() {
            return Err(EduError::invalid("title", "must not be empty"));
        }
        if spec.questions.is_empty() {
            return Err(EduError::invalid("questions", "at least one question is required"));
        }
        if spec.questions.len() > MAX_QUESTIONS {
            return Err(EduError::invalid(
                "questions",
                format!("at most {MAX_QUESTIONS} questions are allowed"),
            ));
        }
        if spec.pass_percent > 100 {
            return Err(EduError::invalid("pass_percent", "must be at most 100"));
        }
        if spec.max_attempts == Some(0) {
            return Err(EduError::invalid("max_attempts", "must be at least 1"));
        }

        let questions = spec
            .questions
            .into_iter()
            .enumerate()
            .map(|(idx, q)| {
                let n = idx + 1;
                if q.prompt.trim().is_empty() {
                    return Err(EduError::invalid("questions", format!("question {n} has no prompt")));
                }
                if q.points == 0 {
                    return Err(EduError::invalid("questions", format!("question {n} is worth 0 points")));
                }
                if q.points > MAX_QUESTION_POINTS {
                    return Err(EduError::invalid(
                        "questions",
                        format!("question {n} is worth more than {MAX_QUESTION_POINTS} points"),
                    ));
                }
                if q.options.len() < 2 {
                    return Err(EduError::invalid("questions", format!("question {n} needs at least two options")));
                }
                if !q.options.iter().any(|o| o.is_correct) {
                    return Err(EduError::invalid("questions", format!("question {n} has no correct option")));
                }
                Ok(QuizQuestion {
                    id: QuestionId::generate(),
                    prompt: q.prompt.trim().to_string(),
                    points: q.points,
                    options: q
                        .options
                        .into_iter()
                        .map(|o| QuizOption {
                            id: OptionId::generate(),
                            text: o.text,
                            is_correct: o.is_correct,
                        })
                        .collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id: AssignmentId::generate(),
            course_id,
            title: title.to_string(),
            instructions: spec.instructions,
            questions,
            pass_percent: spec.pass_percent,
            max_attempts: spec.max_attempts,
            due_at: spec.due_at,
            created_at: Utc::now(),
        })
    }

    /// Total points available.
    #[must_use]
    pub fn max_score(&self) -> u32 {
        self.questions
            .iter()
            .fold(0u32, |total, q| total.saturating_add(q.points))
    }

    /// Check whether another attempt may be submitted.
    ///
    /// # Errors
    ///
    /// Returns `EduError::InvalidState` after the deadline or once the attempt
    /// limit is used up.
    pub fn ensure_open(&self, previous_attempts: u32, now: DateTime<Utc>) -> Result<()> {
        if self.due_at.is_some_and(|due| now > due) {
            return Err(EduError::InvalidState("the deadline has passed".into()));
        }
        if self
            .max_attempts
            .is_some_and(|max| previous_attempts >= max)
        {
            return Err(EduError::InvalidState("no attempts left".into()));
        }
        Ok(())
    }

    /// Grade a set of answers.
    ///
    /// Unanswered questions and unknown question/option ids earn nothing;
    /// only the first answer given for a question counts.
    #[must_use]
    pub fn grade(&self, answers: &[SubmittedAnswer]) -> Grade {
        let mut seen = HashSet::new();
        let first_answers: Vec<&SubmittedAnswer> = answers
            .iter()
            .filter(|a| seen.insert(a.question_id))
            .collect();

        let mut score = 0u32;
        let results = self
            .questions
            .iter()
            .map(|question| {
                let selected = first_answers
                    .iter()
                    .find(|a| a.question_id == question.id)
                    .map(|a| a.option_id);
                let correct = selected.is_some_and(|chosen| {
                    question
                        .options
                        .iter()
                        .any(|o| o.id == chosen && o.is_correct)
                });
                let points_awarded = if correct { question.points } else { 0 };
                score = score.saturating_add(points_awarded);
                QuestionResult {
                    question_id: question.id,
                    selected,
                    correct,
                    points_awarded,
                }
            })
            .collect();

        let max_score = self.max_score();
        let percent = if max_score == 0 {
            0
        } else {
            // score <= max_score, so the quotient is at most 100.
            #[allow(clippy::cast_possible_truncation)]
            let pct = (u64::from(score) * 100 / u64::from(max_score)) as u8;
            pct
        };
        let passed =
            u64::from(score) * 100 >= u64::from(self.pass_percent) * u64::from(max_score);

        Grade {
            score,
            max_score,
            percent,
            passed,
            results,
        }
    }

    /// The assignment as students see it, without the answer key.
    #[must_use]
    pub fn student_view(&self) -> StudentAssignment {
        StudentAssignment {
            id: self.id,
            course_id: self.course_id,
            title: self.title.clone(),
            instructions: self.instructions.clone(),
            questions: self
                .questions
                .iter()
                .map(|q| StudentQuestion {
                    id: q.id,
                    prompt: q.prompt.clone(),
                    points: q.points,
                    options: q
                        .options
                        .iter()
                        .map(|o| StudentOption {
                            id: o.id,
                            text: o.text.clone(),
                        })
                        .collect(),
                })
                .collect(),
            pass_percent: self.pass_percent,
            max_attempts: self.max_attempts,
            due_at: self.due_at,
            created_at: self.created_at,
        }
    }
}

/// An answer option with its correctness withheld.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentOption {
    /// Option ID.
    pub id: OptionId,
    /// Option text.
    pub text: String,
}

/// A question as shown to students.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentQuestion {
    /// Question ID.
    pub id: QuestionId,
    /// Prompt.
    pub prompt: String,
    /// Points for a correct answer.
    pub points: u32,
    /// Options.
    pub options: Vec<StudentOption>,
}

/// An assignment as shown to students.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentAssignment {
    /// Assignment ID.
    pub id: AssignmentId,
    /// Owning course.
    pub course_id: CourseId,
    /// Title.
    pub title: String,
    /// Instructions.
    pub instructions: String,
    /// Questions.
    pub questions: Vec<StudentQuestion>,
    /// Pass threshold in percent.
    pub pass_percent: u8,
    /// Attempt limit.
    pub max_attempts: Option<u32>,
    /// Deadline.
    pub due_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// A graded attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    /// Submission ID.
    pub id: SubmissionId,
    /// Assignment.
    pub assignment_id: AssignmentId,
    /// Student.
    pub user_id: UserId,
    /// 1-based attempt number.
    pub attempt: u32,
    /// Answers as submitted.
    pub answers: Vec<SubmittedAnswer>,
    /// Grading outcome.
    pub grade: Grade,
    /// Submission time.
    pub submitted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> AssignmentSpec {
        AssignmentSpec {
            title: "Quiz 1".into(),
            instructions: String::new(),
            questions: vec![
                QuestionSpec {
                    prompt: "2 + 2".into(),
                    points: 2,
                    options: vec![
                        OptionSpec { text: "4".into(), is_correct: true },
                        OptionSpec { text: "5".into(), is_correct: false },
                    ],
                },
                QuestionSpec {
                    prompt: "\\sqrt{9}".into(),
                    points: 3,
                    options: vec![
                        OptionSpec { text: "3".into(), is_correct: true },
                        OptionSpec { text: "-3".into(), is_correct: true },
                        OptionSpec { text: "9".into(), is_correct: false },
                    ],
                },
            ],
            pass_percent: 60,
            max_attempts: Some(2),
            due_at: None,
        }
    }

    fn answer(a: &Assignment, q: usize, o: usize) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id: a.questions[q].id,
            option_id: a.questions[q].options[o].id,
        }
    }

    #[test]
    fn all_correct() {
        let a = Assignment::new(CourseId::generate(), spec()).unwrap();
        let grade = a.grade(&[answer(&a, 0, 0), answer(&a, 1, 1)]);
        assert_eq!(grade.score, 5);
        assert_eq!(grade.max_score, 5);
        assert_eq!(grade.percent, 100);
        assert!(grade.passed);
    }

    #[test]
    fn wrong_and_missing_answers_score_zero() {
        let a = Assignment::new(CourseId::generate(), spec()).unwrap();
        let grade = a.grade(&[answer(&a, 0, 1)]);
        assert_eq!(grade.score, 0);
        assert!(!grade.passed);
        assert_eq!(grade.results[1].selected, None);
        assert!(!grade.results[0].correct);
    }

    #[test]
    fn pass_threshold_is_inclusive() {
        let mut s = spec();
        s.pass_percent = 60;
        let a = Assignment::new(CourseId::generate(), s).unwrap();
        // 3 of 5 points = 60%.
        let grade = a.grade(&[answer(&a, 1, 0)]);
        assert_eq!(grade.percent, 60);
        assert!(grade.passed);
    }

    #[test]
    fn only_first_answer_per_question_counts() {
        let a = Assignment::new(CourseId::generate(), spec()).unwrap();
        let grade = a.grade(&[answer(&a, 0, 1), answer(&a, 0, 0)]);
        assert_eq!(grade.results[0].points_awarded, 0);
    }

    #[test]
    fn options_from_other_questions_do_not_count() {
        let a = Assignment::new(CourseId::generate(), spec()).unwrap();
        let cross = SubmittedAnswer {
            question_id: a.questions[0].id,
            option_id: a.questions[1].options[0].id,
        };
        assert_eq!(a.grade(&[cross]).score, 0);
    }

    #[test]
    fn validation() {
        let mut s = spec();
        s.questions[0].options.truncate(1);
        assert!(Assignment::new(CourseId::generate(), s).is_err());

        let mut s = spec();
        s.questions[1].options.iter_mut().for_each(|o| o.is_correct = false);
        assert!(Assignment::new(CourseId::generate(), s).is_err());

        let mut s = spec();
        s.questions.clear();
        assert!(Assignment::new(CourseId::generate(), s).is_err());
    }

    #[test]
    fn attempts_and_deadline() {
        let now = Utc::now();
        let mut s = spec();
        s.due_at = Some(now);
        let a = Assignment::new(CourseId::generate(), s).unwrap();
        assert!(a.ensure_open(0, now).is_ok());
        assert!(a.ensure_open(2, now).is_err());
        assert!(a.ensure_open(0, now + chrono::Duration::seconds(1)).is_err());
    }

    #[test]
    fn student_view_hides_answers() {
        let a = Assignment::new(CourseId::generate(), spec()).unwrap();
        let view = a.student_view();
        assert_eq!(view.questions[0].options[0].id, a.questions[0].options[0].id);
        assert_eq!(view.questions[1].options.len(), 3);

        let json = serde_json::to_value(&view).unwrap();
        assert!(json["questions"][0]["options"][0].get("is_correct").is_none());
        assert_eq!(json["questions"][0]["options"][0]["text"], "4");
    }

    #[test]
    fn oversized_points_are_rejected() {
        let mut s = spec();
        s.questions[0].points = u32::MAX;
        assert!(Assignment::new(CourseId::generate(), s).is_err());

        let mut s = spec();
        s.questions[0].points = MAX_QUESTION_POINTS + 1;
        assert!(Assignment::new(CourseId::generate(), s).is_err());

        let mut s = spec();
        s.questions[0].points = MAX_QUESTION_POINTS;
        let a = Assignment::new(CourseId::generate(), s).unwrap();
        let grade = a.grade(&[answer(&a, 0, 0)]);
        assert_eq!(grade.max_score, MAX_QUESTION_POINTS + 3);
        assert_eq!(grade.score, MAX_QUESTION_POINTS);
    }

    #[test]
    fn too_many_questions_are_rejected() {
        let mut s = spec();
        let template = s.questions[0].clone();
        s.questions = vec![template; MAX_QUESTIONS + 1];
        assert!(Assignment::new(CourseId::generate(), s).is_err());
    }
}
