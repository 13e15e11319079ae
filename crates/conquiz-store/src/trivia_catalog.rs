//! Static trivia catalog for local runs and tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use conquiz_core::error::DomainError;
use conquiz_core::rng::DeterministicRng;
use conquiz_game::application::ports::{AnswersRepository, CategoriesClient, QuestionsClient};
use conquiz_game::domain::values::{Answer, AnswerId, Category, CategoryId, Question, QuestionAnswer, QuestionId};

/// Categories and questions held in memory. Random picks go through the
/// injected RNG so tests can script them.
pub struct StaticTriviaCatalog {
    categories: Vec<Category>,
    questions: HashMap<CategoryId, Vec<Question>>,
    answers: HashMap<AnswerId, Answer>,
    rng: Mutex<Box<dyn DeterministicRng>>,
}

impl std::fmt::Debug for StaticTriviaCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTriviaCatalog")
            .field("categories", &self.categories.len())
            .field("answers", &self.answers.len())
            .finish_non_exhaustive()
    }
}

impl StaticTriviaCatalog {
    /// Builds a catalog from `categories` and their questions.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a question does not have exactly
    /// one correct answer, or belongs to an unknown category.
    pub fn new(
        categories: Vec<Category>,
        questions: Vec<(CategoryId, Question)>,
        rng: Box<dyn DeterministicRng>,
    ) -> Result<Self, DomainError> {
        let mut by_category: HashMap<CategoryId, Vec<Question>> = HashMap::new();
        let mut answers = HashMap::new();
        for (category_id, question) in questions {
            if !categories.iter().any(|category| category.id == category_id) {
                return Err(DomainError::Validation(format!(
                    "question {} references unknown category {category_id}",
                    question.id
                )));
            }
            let correct = question.answers.iter().filter(|a| a.is_correct).count();
            if correct != 1 {
                return Err(DomainError::Validation(format!(
                    "question {} has {correct} correct answers",
                    question.id
                )));
            }
            for answer in &question.answers {
                answers.insert(
                    answer.id,
                    Answer {
                        id: answer.id,
                        question_id: question.id,
                    },
                );
            }
            by_category.entry(category_id).or_default().push(question);
        }
        Ok(Self {
            categories,
            questions: by_category,
            answers,
            rng: Mutex::new(rng),
        })
    }

    /// A small general-knowledge catalog: three categories with three
    /// four-option questions each.
    ///
    /// # Errors
    ///
    /// Never for the built-in data; see [`StaticTriviaCatalog::new`].
    pub fn sample(rng: Box<dyn DeterministicRng>) -> Result<Self, DomainError> {
        const DATA: [(&str, [(&str, [&str; 4]); 3]); 3] = [
            (
                "Geography",
                [
                    ("Capital of Peru?", ["Lima", "Quito", "Bogota", "La Paz"]),
                    ("Longest river in Europe?", ["Volga", "Danube", "Rhine", "Dnieper"]),
                    ("Largest island on Earth?", ["Greenland", "Borneo", "Madagascar", "Baffin"]),
                ],
            ),
            (
                "Science",
                [
                    ("Chemical symbol of gold?", ["Au", "Ag", "Gd", "Go"]),
                    ("Planet with the shortest year?", ["Mercury", "Venus", "Mars", "Earth"]),
                    ("Hardest natural mineral?", ["Diamond", "Quartz", "Topaz", "Corundum"]),
                ],
            ),
            (
                "History",
                [
                    ("Year the Berlin Wall fell?", ["1989", "1991", "1987", "1961"]),
                    ("First emperor of Rome?", ["Augustus", "Nero", "Caesar", "Trajan"]),
                    ("Ship sunk by an iceberg in 1912?", ["Titanic", "Lusitania", "Britannic", "Olympic"]),
                ],
            ),
        ];

        let mut categories = Vec::new();
        let mut questions = Vec::new();
        let mut question_id = 0;
        let mut answer_id = 0;
        for (category_index, (title, entries)) in (1..).zip(DATA) {
            let category_id = CategoryId(category_index);
            categories.push(Category {
                id: category_id,
                title: title.to_owned(),
            });
            for (body, options) in entries {
                question_id += 1;
                let answers = options
                    .iter()
                    .enumerate()
                    .map(|(index, option)| {
                        answer_id += 1;
                        QuestionAnswer {
                            id: AnswerId(answer_id),
                            body: (*option).to_owned(),
                            is_correct: index == 0,
                        }
                    })
                    .collect();
                questions.push((
                    category_id,
                    Question {
                        id: QuestionId(question_id),
                        body: body.to_owned(),
                        answers,
                    },
                ));
            }
        }
        Self::new(categories, questions, rng)
    }

    fn pick<'a, T>(&self, items: &'a [T]) -> Result<Option<&'a T>, DomainError> {
        if items.is_empty() {
            return Ok(None);
        }
        let last = u32::try_from(items.len() - 1).unwrap_or(u32::MAX);
        let index = self
            .rng
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("catalog rng lock poisoned: {e}")))?
            .next_u32_range(0, last);
        Ok(items.get(index as usize))
    }
}

#[async_trait]
impl CategoriesClient for StaticTriviaCatalog {
    async fn random(&self) -> Result<Category, DomainError> {
        self.pick(&self.categories)?
            .cloned()
            .ok_or_else(|| DomainError::Infrastructure("trivia catalog has no categories".into()))
    }
}

#[async_trait]
impl QuestionsClient for StaticTriviaCatalog {
    async fn random_by_category(&self, category_id: CategoryId) -> Result<Question, DomainError> {
        let questions = self.questions.get(&category_id).map_or(&[][..], Vec::as_slice);
        self.pick(questions)?.cloned().ok_or_else(|| {
            DomainError::Infrastructure(format!("no questions in category {category_id}"))
        })
    }
}

#[async_trait]
impl AnswersRepository for StaticTriviaCatalog {
    async fn get(&self, answer_id: AnswerId) -> Result<Answer, DomainError> {
        self.answers
            .get(&answer_id)
            .cloned()
            .ok_or_else(|| DomainError::AggregateNotFound(format!("answer {answer_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conquiz_test_support::{MockRng, SequenceRng};

    #[tokio::test]
    async fn test_sample_catalog_picks_with_injected_rng() {
        // Arrange
        let catalog = StaticTriviaCatalog::sample(Box::new(SequenceRng::new(vec![1, 2]))).unwrap();

        // Act
        let category = catalog.random().await.unwrap();
        let question = catalog.random_by_category(category.id).await.unwrap();

        // Assert
        assert_eq!(category.title, "Science");
        assert_eq!(question.body, "Hardest natural mineral?");
        assert_eq!(question.answers.len(), 4);
        assert_eq!(question.correct_answer(), Some(question.answers[0].id));
    }

    #[tokio::test]
    async fn test_answers_resolve_to_their_question() {
        let catalog = StaticTriviaCatalog::sample(Box::new(MockRng)).unwrap();
        let question = catalog.random_by_category(CategoryId(1)).await.unwrap();

        let answer = AnswersRepository::get(&catalog, question.answers[3].id).await.unwrap();

        assert_eq!(answer.question_id, question.id);
    }

    #[tokio::test]
    async fn test_unknown_answer_and_category_fail() {
        let catalog = StaticTriviaCatalog::sample(Box::new(MockRng)).unwrap();

        let answer = AnswersRepository::get(&catalog, AnswerId(999)).await;
        let question = catalog.random_by_category(CategoryId(42)).await;

        assert!(matches!(answer, Err(DomainError::AggregateNotFound(_))));
        assert!(matches!(question, Err(DomainError::Infrastructure(_))));
    }

    #[test]
    fn test_new_rejects_question_without_single_correct_answer() {
        let categories = vec![Category {
            id: CategoryId(1),
            title: "Misc".to_owned(),
        }];
        let question = Question {
            id: QuestionId(1),
            body: "?".to_owned(),
            answers: vec![
                QuestionAnswer {
                    id: AnswerId(1),
                    body: "a".to_owned(),
                    is_correct: true,
                },
                QuestionAnswer {
                    id: AnswerId(2),
                    body: "b".to_owned(),
                    is_correct: true,
                },
            ],
        };

        let result = StaticTriviaCatalog::new(categories, vec![(CategoryId(1), question)], Box::new(MockRng));

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
