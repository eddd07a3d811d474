use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{build_prompt, truncate_for_log, Dialog, Question, QuizError, Responder, Turn};
use crate::answers::{AnswerValue, Resolver};
use crate::config::QuizConfig;

/// Final state of one question in a quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnsweredQuestion {
    pub name: String,
    /// Position in the quiz, from 0.
    pub number: usize,
    /// Prompts sent, including re-prompts.
    pub attempts: u32,
    pub ok: bool,
    /// Present only when `ok`.
    pub answer: Option<AnswerValue>,
}

/// Everything one simulated respondent produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub id: Uuid,
    pub answers: Vec<AnsweredQuestion>,
    pub history: Vec<Turn>,
    /// Prompt → raw reply pairs, replayable with [`QuizRunner::replay`].
    pub recording: HashMap<String, String>,
}

impl Transcript {
    pub fn answered(&self) -> usize {
        self.answers.iter().filter(|a| a.ok).count()
    }

    /// Share of questions with a usable answer; 1.0 for an empty quiz.
    pub fn answered_ratio(&self) -> f32 {
        if self.answers.is_empty() {
            return 1.0;
        }
        self.answered() as f32 / self.answers.len() as f32
    }

    pub fn answer(&self, name: &str) -> Option<&AnswerValue> {
        self.answers
            .iter()
            .find(|a| a.name == name)
            .and_then(|a| a.answer.as_ref())
    }

    /// Chosen option codes for a choice question, ready for the
    /// concordance comparisons.
    pub fn codes(&self, name: &str) -> Option<Vec<String>> {
        let answer = self.answer(name)?;
        answer
            .as_codes()
            .map(<[String]>::to_vec)
            .or_else(|| answer.as_text().map(|code| vec![code.to_string()]))
    }
}

/// Walks a model through a list of questions, re-prompting on unreadable replies.
pub struct QuizRunner<'a, R: Responder + ?Sized> {
    responder: &'a R,
    resolver: Resolver,
    config: QuizConfig,
}

impl<'a, R: Responder + ?Sized> QuizRunner<'a, R> {
    pub fn new(responder: &'a R, resolver: Resolver, config: QuizConfig) -> Self {
        Self {
            responder,
            resolver,
            config,
        }
    }

    fn attempts(&self) -> u32 {
        self.config.attempts.max(1)
    }

    /// One pass through `questions`.
    pub fn run(&self, questions: &[Question]) -> Result<Transcript, QuizError> {
        self.run_dialog(Dialog::new(self.responder), questions)
    }

    /// Re-run a quiz from a transcript's recording without calling the model.
    pub fn replay(
        &self,
        questions: &[Question],
        recording: HashMap<String, String>,
    ) -> Result<Transcript, QuizError> {
        self.run_dialog(Dialog::with_cache(self.responder, recording), questions)
    }

    fn run_dialog(
        &self,
        mut dialog: Dialog<'a, R>,
        questions: &[Question],
    ) -> Result<Transcript, QuizError> {
        let mut seen = HashSet::new();
        if let Some(dup) = questions.iter().find(|q| !seen.insert(q.name.as_str())) {
            return Err(QuizError::DuplicateQuestion(dup.name.clone()));
        }

        let id = Uuid::new_v4();
        let _span = tracing::info_span!(
            "quiz",
            %id,
            questions = questions.len(),
            replay = dialog.is_replay()
        )
        .entered();

        let mut answers = Vec::with_capacity(questions.len());

        for (number, question) in questions.iter().enumerate() {
            let answered = self.ask(&mut dialog, number, question)?;
            tracing::info!(
                question = %question.name,
                ok = answered.ok,
                attempts = answered.attempts,
                answer = %answered
                    .answer
                    .as_ref()
                    .map(|a| truncate_for_log(&a.to_string(), self.config.truncate_len))
                    .unwrap_or_default(),
                "Question finished"
            );
            answers.push(answered);
        }

        let (history, recording) = dialog.into_parts();
        Ok(Transcript {
            id,
            answers,
            history,
            recording,
        })
    }

    fn ask(
        &self,
        dialog: &mut Dialog<'_, R>,
        number: usize,
        question: &Question,
    ) -> Result<AnsweredQuestion, QuizError> {
        let legal_values = question.legal_values();
        let mut prompt = build_prompt(question, false);
        let mut attempts = 0;

        while attempts < self.attempts() {
            attempts += 1;
            let content = dialog.query(&prompt)?.content.clone();
            let extraction = self
                .resolver
                .resolve(&prompt, &content, question.mode, &legal_values)?;

            if extraction.ok {
                return Ok(AnsweredQuestion {
                    name: question.name.clone(),
                    number,
                    attempts,
                    ok: true,
                    answer: extraction.value,
                });
            }

            tracing::warn!(
                question = %question.name,
                attempt = attempts,
                reply = %truncate_for_log(&content, self.config.truncate_len),
                "Unreadable answer, re-prompting"
            );
            prompt = build_prompt(question, true);
        }

        Ok(AnsweredQuestion {
            name: question.name.clone(),
            number,
            attempts,
            ok: false,
            answer: None,
        })
    }

    /// Repeat whole quizzes until enough questions are answered or attempts
    /// run out. Returns the last transcript.
    pub fn run_respondent(&self, questions: &[Question]) -> Result<Transcript, QuizError> {
        let mut last = None;

        for attempt in 1..=self.attempts() {
            match self.run(questions) {
                Ok(transcript) => {
                    let ratio = transcript.answered_ratio();
                    if ratio >= self.config.min_answered_ratio {
                        return Ok(transcript);
                    }
                    tracing::warn!(
                        attempt,
                        answered = transcript.answered(),
                        total = transcript.answers.len(),
                        "Too few answers, rerunning quiz"
                    );
                    last = Some(Ok(transcript));
                }
                Err(QuizError::DuplicateQuestion(name)) => {
                    return Err(QuizError::DuplicateQuestion(name));
                }
                Err(e) => {
                    tracing::error!(attempt, error = %e, "Quiz failed, rerunning");
                    last = Some(Err(e));
                }
            }
        }

        last.unwrap_or_else(|| self.run(questions))
    }
}
