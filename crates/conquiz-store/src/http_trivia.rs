//! HTTP client for the external trivia service.
//!
//! The service exposes `GET /categories` returning `[{id, name}]` and
//! `GET /random?category_id=<id>` returning a question with its answers
//! flagged `is_correct`. Answers of every served question are remembered so
//! submitted answer ids can be resolved without another round trip.

use std::sync::Mutex;

use async_trait::async_trait;
use conquiz_core::error::DomainError;
use conquiz_core::rng::DeterministicRng;
use conquiz_game::application::ports::{AnswersRepository, CategoriesClient, QuestionsClient};
use conquiz_game::domain::values::{
    Answer, AnswerId, Category, CategoryId, Question, QuestionAnswer, QuestionId,
};
use dashmap::DashMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct CategorySchema {
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct AnswerSchema {
    id: i64,
    body: String,
    is_correct: bool,
}

#[derive(Debug, Deserialize)]
struct QuestionSchema {
    id: i64,
    body: String,
    answers: Vec<AnswerSchema>,
}

impl From<CategorySchema> for Category {
    fn from(schema: CategorySchema) -> Self {
        Self {
            id: CategoryId(schema.id),
            title: schema.name,
        }
    }
}

fn into_question(schema: QuestionSchema) -> Result<Question, DomainError> {
    let correct = schema.answers.iter().filter(|a| a.is_correct).count();
    if correct != 1 {
        return Err(DomainError::Infrastructure(format!(
            "trivia question {} has {correct} correct answers",
            schema.id
        )));
    }
    Ok(Question {
        id: QuestionId(schema.id),
        body: schema.body,
        answers: schema
            .answers
            .into_iter()
            .map(|answer| QuestionAnswer {
                id: AnswerId(answer.id),
                body: answer.body,
                is_correct: answer.is_correct,
            })
            .collect(),
    })
}

/// Trivia service adapter implementing the categories, questions and answers
/// ports.
pub struct HttpTriviaClient {
    base_url: String,
    http_client: reqwest::Client,
    rng: Mutex<Box<dyn DeterministicRng>>,
    answers: DashMap<AnswerId, Answer>,
}

impl std::fmt::Debug for HttpTriviaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTriviaClient")
            .field("base_url", &self.base_url)
            .field("cached_answers", &self.answers.len())
            .finish_non_exhaustive()
    }
}

impl HttpTriviaClient {
    /// Creates a client for the service at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, rng: Box<dyn DeterministicRng>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            http_client: reqwest::Client::new(),
            rng: Mutex::new(rng),
            answers: DashMap::new(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, DomainError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| DomainError::Infrastructure(format!("trivia request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::Infrastructure(format!(
                "trivia service returned {status} for {url}"
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DomainError::Infrastructure(format!("invalid trivia response: {e}")))
    }

    fn remember(&self, question: &Question) {
        for answer in &question.answers {
            self.answers.insert(
                answer.id,
                Answer {
                    id: answer.id,
                    question_id: question.id,
                },
            );
        }
    }
}

#[async_trait]
impl CategoriesClient for HttpTriviaClient {
    #[instrument(skip(self))]
    async fn random(&self) -> Result<Category, DomainError> {
        let mut categories: Vec<CategorySchema> = self
            .get_json(&format!("{}/categories", self.base_url))
            .await?;
        if categories.is_empty() {
            return Err(DomainError::Infrastructure(
                "trivia service has no categories".into(),
            ));
        }
        let last = u32::try_from(categories.len() - 1).unwrap_or(u32::MAX);
        let index = self
            .rng
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("trivia rng lock poisoned: {e}")))?
            .next_u32_range(0, last) as usize;
        let category = Category::from(categories.swap_remove(index.min(categories.len() - 1)));
        debug!(category_id = %category.id, "category picked");
        Ok(category)
    }
}

#[async_trait]
impl QuestionsClient for HttpTriviaClient {
    #[instrument(skip(self))]
    async fn random_by_category(&self, category_id: CategoryId) -> Result<Question, DomainError> {
        let schema: QuestionSchema = self
            .get_json(&format!(
                "{}/random?category_id={category_id}",
                self.base_url
            ))
            .await?;
        let question = into_question(schema)?;
        self.remember(&question);
        debug!(question_id = %question.id, "question fetched");
        Ok(question)
    }
}

#[async_trait]
impl AnswersRepository for HttpTriviaClient {
    async fn get(&self, answer_id: AnswerId) -> Result<Answer, DomainError> {
        self.answers
            .get(&answer_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DomainError::AggregateNotFound(format!("answer {answer_id}")))
    }
}
