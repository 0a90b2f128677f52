//! Bank transaction classifier.
//!
//! Three independent signal categories are matched against the body:
//! - transaction verbs (credited, debited, ...) — case-insensitive
//! - currency markers (INR, Rs., ₹, USD, $) — case-sensitive
//! - account context (A/c, account, card, ...) — case-insensitive
//!
//! A message is financial when at least two categories match anywhere in
//! the text. One category alone is too common in ordinary chatter.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::pipeline::types::{ClassificationResult, SignalCategory};

/// Minimum number of distinct categories for a positive classification.
pub const MIN_MATCHED_CATEGORIES: usize = 2;

static DEFAULT_CLASSIFIER: LazyLock<Classifier> = LazyLock::new(Classifier::default);

/// Classify with the shared default rule set.
pub fn classify(body: &str) -> bool {
    DEFAULT_CLASSIFIER.classify(body)
}

/// A compiled pattern for one signal category.
#[derive(Debug, Clone)]
struct SignalRule {
    category: SignalCategory,
    regex: Regex,
}

/// Pure, thread-safe classifier over compiled signal patterns.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<SignalRule>,
}

impl Default for Classifier {
    fn default() -> Self {
        let patterns = [
            (
                SignalCategory::TransactionVerb,
                r"(?i)credited|debited|withdrawn|deposited|paid|received",
            ),
            (SignalCategory::CurrencyMarker, r"INR|Rs\.?|₹|USD|\$"),
            (
                SignalCategory::AccountContext,
                r"(?i)A/c|account|card|bank|wallet",
            ),
        ];

        let rules = patterns
            .into_iter()
            .map(|(category, pattern)| SignalRule {
                category,
                regex: Regex::new(pattern).unwrap(),
            })
            .collect();

        Self { rules }
    }
}

impl Classifier {
    /// Does this body look like a bank transaction notification?
    pub fn classify(&self, body: &str) -> bool {
        self.evaluate(body).is_financial
    }

    /// Classify and report which categories matched.
    pub fn evaluate(&self, body: &str) -> ClassificationResult {
        if body.is_empty() {
            return ClassificationResult::default();
        }

        let matched: Vec<SignalCategory> = self
            .rules
            .iter()
            .filter(|rule| rule.regex.is_match(body))
            .map(|rule| rule.category)
            .collect();

        let is_financial = matched.len() >= MIN_MATCHED_CATEGORIES;
        debug!(
            matches = matched.len(),
            categories = ?matched.iter().map(SignalCategory::label).collect::<Vec<_>>(),
            is_financial,
            "Classified message body"
        );

        ClassificationResult {
            is_financial,
            matched,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_is_not_financial() {
        let classifier = Classifier::default();
        let result = classifier.evaluate("");
        assert!(!result.is_financial);
        assert_eq!(result.match_count(), 0);
        assert!(!classify(""));
    }

    #[test]
    fn otp_message_matches_nothing() {
        let result = Classifier::default().evaluate("Your OTP is 123456");
        assert_eq!(result.match_count(), 0);
        assert!(!result.is_financial);
    }

    #[test]
    fn all_three_categories() {
        let result =
            Classifier::default().evaluate("Your account has been credited with INR 5000");
        assert_eq!(
            result.matched,
            vec![
                SignalCategory::TransactionVerb,
                SignalCategory::CurrencyMarker,
                SignalCategory::AccountContext,
            ]
        );
        assert!(result.is_financial);
    }

    #[test]
    fn single_category_is_not_enough() {
        let classifier = Classifier::default();
        // verb only
        assert!(!classifier.classify("Package received at the front desk"));
        // currency only
        assert!(!classifier.classify("Lunch was $12 today"));
        // context only
        assert!(!classifier.classify("Meet me outside the bank"));
    }

    #[test]
    fn any_two_categories_are_enough() {
        let classifier = Classifier::default();
        // verb + currency
        assert!(classifier.classify("Rs.500 debited"));
        // verb + context
        assert!(classifier.classify("Salary credited to your wallet"));
        // currency + context
        assert!(classifier.classify("Card ending 4321 used for USD 20"));
    }

    #[test]
    fn verbs_and_context_ignore_case() {
        let classifier = Classifier::default();
        assert!(classifier.classify("AMOUNT DEBITED FROM BANK"));
        assert!(classifier.classify("a/c xx1234 Credited"));
    }

    #[test]
    fn currency_is_case_sensitive() {
        let result = Classifier::default().evaluate("usd inr rs");
        assert!(!result.matched.contains(&SignalCategory::CurrencyMarker));
    }

    #[test]
    fn rupee_sign_and_rs_without_period() {
        let classifier = Classifier::default();
        assert!(classifier.classify("₹250 paid"));
        assert!(classifier.classify("Rs 250 paid"));
    }

    #[test]
    fn substring_matches_count() {
        // "prepaid" contains "paid", "cardholder" contains "card"
        assert!(Classifier::default().classify("Dear cardholder, your prepaid plan"));
    }

    #[test]
    fn classifier_is_shareable_across_threads() {
        let classifier = std::sync::Arc::new(Classifier::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let c = std::sync::Arc::clone(&classifier);
                std::thread::spawn(move || c.classify("INR 100 credited to A/c"))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
