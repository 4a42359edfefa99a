//! The fixed, ordered list of yes/no prompts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum QuestionsError {
    #[error("question list is empty")]
    Empty,

    #[error("failed to read questions from '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Prompts shown by the virtual waiter when no list is supplied.
pub const RESTAURANT_QUESTIONS: &[&str] = &[
    "Is this your first time at our restaurant?",
    "Would you like to see the vegetarian menu?",
    "Do you have any food allergies?",
    "Would you like some water?",
    "Would you prefer bottled water?",
    "Do you want a table near the window?",
    "Are you ready to place your order?",
    "Do you need more time with the menu?",
    "Would you like a starter?",
    "Would you like something spicy?",
    "Do you want a chef's recommendation?",
    "Would you prefer a non-spicy dish?",
    "Do you want rice with your meal?",
    "Would you like a soft drink or juice?",
    "Do you want to skip dessert?",
    "Are you celebrating a special occasion?",
    "Would you like assistance reading the menu?",
    "Is everything okay with your food?",
    "Would you like the bill now?",
    "Do you need help finding the restroom?",
    "Would you like a feedback card?",
    "Do you want your leftovers packed?",
    "Would you like to join our loyalty program?",
    "Should I bring your order now?",
    "Are you enjoying your meal?",
];

/// Immutable, non-empty question sequence. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Questions {
    items: Arc<[String]>,
}

impl Questions {
    /// Build from prompts, trimming each and dropping blank ones.
    pub fn new<I, S>(items: I) -> Result<Self, QuestionsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items: Vec<String> = items
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if items.is_empty() {
            return Err(QuestionsError::Empty);
        }

        Ok(Self {
            items: items.into(),
        })
    }

    /// One question per line.
    pub fn parse(text: &str) -> Result<Self, QuestionsError> {
        Self::new(text.lines())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, QuestionsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| QuestionsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn restaurant() -> Self {
        Self {
            items: RESTAURANT_QUESTIONS.iter().map(|q| q.to_string()).collect(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_last(&self, index: usize) -> bool {
        index + 1 >= self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }
}

impl Default for Questions {
    fn default() -> Self {
        Self::restaurant()
    }
}
