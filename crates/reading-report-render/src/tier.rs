//! Badge tier classification of the overall level label.

use serde::{Deserialize, Serialize};

/// Badge color class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    High,
    Medium,
    Low,
}

/// Maps an overall-level label to a badge tier.
pub trait TierClassifier: Send + Sync {
    fn classify(&self, label: &str) -> Tier;
}

impl<F> TierClassifier for F
where
    F: Fn(&str) -> Tier + Send + Sync,
{
    fn classify(&self, label: &str) -> Tier {
        self(label)
    }
}

/// Case-insensitive substring matching against per-tier keyword lists.
///
/// High keywords are checked first; labels matching neither list are
/// [`Tier::Low`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordTierClassifier {
    pub high: Vec<String>,
    pub medium: Vec<String>,
}

impl Default for KeywordTierClassifier {
    fn default() -> Self {
        Self::new(
            ["high", "excellent", "عالي", "متميز", "مبدع"],
            ["medium", "good", "متوسط", "جيد"],
        )
    }
}

impl KeywordTierClassifier {
    pub fn new<H, M>(high: H, medium: M) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        let lower = |word: String| word.trim().to_lowercase();
        Self {
            high: high.into_iter().map(|w| lower(w.into())).collect(),
            medium: medium.into_iter().map(|w| lower(w.into())).collect(),
        }
    }

    fn matches(keywords: &[String], label: &str) -> bool {
        keywords
            .iter()
            .any(|word| !word.is_empty() && label.contains(word.as_str()))
    }
}

impl TierClassifier for KeywordTierClassifier {
    fn classify(&self, label: &str) -> Tier {
        let label = label.to_lowercase();
        if Self::matches(&self.high, &label) {
            Tier::High
        } else if Self::matches(&self.medium, &label) {
            Tier::Medium
        } else {
            Tier::Low
        }
    }
}
