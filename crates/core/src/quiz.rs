//! Client for the external quiz service: question generation per chapter and
//! answer validation, with a local lenient grader when validation is down.

use std::{collections::HashSet, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    config::QuizSettings,
    error::{LecternError, Result},
    types::Chapter,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Mcq,
    ShortAnswer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<QuizOption>>,
    pub answer: String,
    pub explanation: String,
    pub difficulty: Difficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_objective: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_number: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub quiz_id: String,
    #[serde(default)]
    pub source_window_minutes: u32,
    pub questions: Vec<Question>,
}

impl Quiz {
    fn number_questions(&mut self) {
        for (idx, question) in self.questions.iter_mut().enumerate() {
            question.question_number = Some(idx as u32 + 1);
        }
    }

    pub fn question(&self, number: u32) -> Result<&Question> {
        self.questions
            .iter()
            .find(|q| q.question_number == Some(number))
            .ok_or_else(|| LecternError::QuestionNotFound {
                quiz_id: self.quiz_id.clone(),
                question_number: number,
            })
    }
}

#[derive(Serialize)]
struct StructuredQuizRequest<'a> {
    segments: [&'a Chapter; 1],
    questions_per_segment: u32,
}

#[derive(Serialize)]
struct AnswerValidationRequest<'a> {
    transcript: &'a str,
    question_text: &'a str,
    question_type: QuestionType,
    correct_answer: &'a str,
    user_answer: &'a str,
    options: Option<&'a [QuizOption]>,
}

#[derive(Deserialize)]
struct AnswerValidationResponse {
    #[serde(default)]
    is_correct: bool,
    #[serde(default)]
    feedback: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnswerVerdict {
    pub is_correct: bool,
    pub user_answer: String,
    pub correct_answer: String,
    pub feedback: String,
    pub explanation: String,
    /// True when the service could not grade and the lenient fallback did.
    pub graded_locally: bool,
}

pub struct QuizClient {
    base_url: String,
    client: reqwest::Client,
}

impl QuizClient {
    pub fn new(settings: &QuizSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Ask the service for `questions` questions about one chapter.
    pub async fn generate(&self, chapter: &Chapter, questions: u32) -> Result<Quiz> {
        let url = self.url("/quiz/structured");
        let response = self
            .client
            .post(&url)
            .json(&StructuredQuizRequest {
                segments: [chapter],
                questions_per_segment: questions,
            })
            .send()
            .await
            .map_err(|e| unavailable(e, &url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LecternError::QuizFailed {
                status: status.as_u16(),
                body,
            });
        }

        let mut quiz: Quiz = response.json().await?;
        quiz.number_questions();
        info!(
            quiz_id = %quiz.quiz_id,
            segment = chapter.segment_number,
            questions = quiz.questions.len(),
            "quiz generated"
        );
        Ok(quiz)
    }

    /// Grade an answer remotely, falling back to [`lenient_verdict`] when the
    /// service answers with an error status.
    pub async fn validate(
        &self,
        question: &Question,
        transcript: &str,
        user_answer: &str,
    ) -> Result<AnswerVerdict> {
        let url = self.url("/quiz/validate-answer");
        let response = self
            .client
            .post(&url)
            .json(&AnswerValidationRequest {
                transcript,
                question_text: &question.question,
                question_type: question.question_type,
                correct_answer: &question.answer,
                user_answer,
                options: question.options.as_deref(),
            })
            .send()
            .await
            .map_err(|e| unavailable(e, &url))?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "answer validation failed, grading locally");
            return Ok(lenient_verdict(question, user_answer));
        }

        let result: AnswerValidationResponse = response.json().await?;
        Ok(AnswerVerdict {
            is_correct: result.is_correct,
            user_answer: user_answer.to_string(),
            correct_answer: question.answer.clone(),
            feedback: result.feedback,
            explanation: question.explanation.clone(),
            graded_locally: false,
        })
    }
}

fn unavailable(e: reqwest::Error, url: &str) -> LecternError {
    if e.is_connect() || e.is_timeout() {
        LecternError::QuizServiceUnavailable {
            url: url.to_string(),
        }
    } else {
        LecternError::ApiError(e)
    }
}

/// Local grading used when the validation service cannot answer.
///
/// Multiple choice compares option ids case-insensitively. Short answers pass
/// on any shared word longer than two characters, a 15-character prefix of
/// one answer appearing in the other, or one such word containing another.
pub fn lenient_verdict(question: &Question, user_answer: &str) -> AnswerVerdict {
    let correct = question.answer.as_str();
    let is_correct = match question.question_type {
        QuestionType::Mcq => user_answer.trim().to_uppercase() == correct.trim().to_uppercase(),
        QuestionType::ShortAnswer => short_answer_matches(user_answer, correct),
    };

    let feedback = if is_correct {
        "Good answer!".to_string()
    } else {
        format!("The expected answer was: {correct}")
    };

    AnswerVerdict {
        is_correct,
        user_answer: user_answer.to_string(),
        correct_answer: correct.to_string(),
        feedback,
        explanation: question.explanation.clone(),
        graded_locally: true,
    }
}

fn short_answer_matches(user_answer: &str, correct: &str) -> bool {
    if user_answer.trim().is_empty() {
        return false;
    }

    let user_words = significant_words(user_answer);
    let correct_words = significant_words(correct);
    if !user_words.is_disjoint(&correct_words) {
        return true;
    }

    let user_lower = user_answer.to_lowercase();
    let correct_lower = correct.to_lowercase();
    let prefix = |s: &str| s.chars().take(15).collect::<String>();
    if correct_lower.contains(&prefix(&user_lower)) || user_lower.contains(&prefix(&correct_lower)) {
        return true;
    }

    user_words.iter().any(|uw| {
        correct_words
            .iter()
            .any(|cw| uw.contains(cw.as_str()) || cw.contains(uw.as_str()))
    })
}

fn significant_words(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(question_type: QuestionType, answer: &str) -> Question {
        Question {
            question_type,
            question: "What does a kernel measure?".to_string(),
            options: None,
            answer: answer.to_string(),
            explanation: "Covered in chapter 2.".to_string(),
            difficulty: Difficulty::Medium,
            learning_objective: None,
            question_number: Some(1),
        }
    }

    #[test]
    fn mcq_ignores_case_and_whitespace() {
        let q = question(QuestionType::Mcq, "B");
        assert!(lenient_verdict(&q, " b ").is_correct);

        let wrong = lenient_verdict(&q, "c");
        assert!(!wrong.is_correct);
        assert_eq!(wrong.feedback, "The expected answer was: B");
        assert!(wrong.graded_locally);
    }

    #[test]
    fn short_answer_accepts_word_overlap() {
        let q = question(QuestionType::ShortAnswer, "Similarity between two inputs");
        let verdict = lenient_verdict(&q, "it is the similarity of points");
        assert!(verdict.is_correct);
        assert_eq!(verdict.feedback, "Good answer!");
    }

    #[test]
    fn short_answer_accepts_stems() {
        let q = question(QuestionType::ShortAnswer, "regularization");
        assert!(lenient_verdict(&q, "regular").is_correct);
    }

    #[test]
    fn short_answer_rejects_unrelated_and_empty() {
        let q = question(QuestionType::ShortAnswer, "Similarity between two inputs");
        assert!(!lenient_verdict(&q, "no idea").is_correct);
        assert!(!lenient_verdict(&q, "   ").is_correct);
    }

    #[test]
    fn quiz_response_is_numbered() {
        let mut quiz: Quiz = serde_json::from_str(
            r#"{
                "quiz_id": "q-1",
                "source_window_minutes": 5,
                "questions": [
                    {"type": "mcq", "question": "Q1", "options": [{"id": "A", "text": "x"}],
                     "answer": "A", "explanation": "e", "difficulty": "easy"},
                    {"type": "short_answer", "question": "Q2", "answer": "a",
                     "explanation": "e", "difficulty": "hard", "learning_objective": "lo"}
                ]
            }"#,
        )
        .unwrap();
        quiz.number_questions();

        assert_eq!(quiz.question(2).unwrap().question, "Q2");
        assert_eq!(quiz.question(1).unwrap().question_type, QuestionType::Mcq);
        assert!(matches!(
            quiz.question(3),
            Err(LecternError::QuestionNotFound { question_number: 3, .. })
        ));
    }

    #[test]
    fn structured_request_wraps_one_segment() {
        let chapter = Chapter {
            segment_number: 2,
            segment_title: "Kernels".to_string(),
            segment_start_timestamp: 10.0,
            segment_end_timestamp: 20.0,
            transcript: Vec::new(),
        };
        let body = serde_json::to_value(StructuredQuizRequest {
            segments: [&chapter],
            questions_per_segment: 3,
        })
        .unwrap();

        assert_eq!(body["questions_per_segment"], 3);
        assert_eq!(body["segments"][0]["segment_title"], "Kernels");
        assert_eq!(body["segments"][0]["segment_number"], 2);
    }
}
