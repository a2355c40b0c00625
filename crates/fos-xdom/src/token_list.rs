//! Token Lists
//!
//! Whitespace-separated token sets such as `class` attribute values.
//! Duplicate tokens collapse; first occurrence wins the position.

use std::fmt;

/// Ordered set of whitespace-delimited tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenList {
    tokens: Vec<String>,
}

impl TokenList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a space-separated string
    pub fn parse(s: &str) -> Self {
        let mut list = Self::new();
        for token in s.split_whitespace() {
            list.push_unique(token);
        }
        list
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn item(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(|s| s.as_str())
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Add tokens, returns whether the list changed
    pub fn add(&mut self, tokens: &[&str]) -> bool {
        let before = self.tokens.len();
        for token in tokens {
            for part in token.split_whitespace() {
                self.push_unique(part);
            }
        }
        self.tokens.len() != before
    }

    /// Remove tokens, returns whether the list changed
    pub fn remove(&mut self, tokens: &[&str]) -> bool {
        let before = self.tokens.len();
        self.tokens.retain(|t| !tokens.contains(&t.as_str()));
        self.tokens.len() != before
    }

    /// Toggle a token, returns the new presence state
    pub fn toggle(&mut self, token: &str, force: Option<bool>) -> bool {
        match force {
            Some(true) => {
                self.add(&[token]);
                true
            }
            Some(false) => {
                self.remove(&[token]);
                false
            }
            None => {
                if self.contains(token) {
                    self.remove(&[token]);
                    false
                } else {
                    self.add(&[token]);
                    true
                }
            }
        }
    }

    /// Replace `old_token` in place; false when it was absent
    pub fn replace(&mut self, old_token: &str, new_token: &str) -> bool {
        let Some(pos) = self.tokens.iter().position(|t| t == old_token) else {
            return false;
        };
        if self.contains(new_token) {
            self.tokens.remove(pos);
        } else {
            self.tokens[pos] = new_token.to_string();
        }
        true
    }

    /// Canonical single-space form
    pub fn value(&self) -> String {
        self.tokens.join(" ")
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|s| s.as_str())
    }

    /// Consume into the owned tokens
    pub fn into_tokens(self) -> Vec<String> {
        self.tokens
    }

    fn push_unique(&mut self, token: &str) {
        if !token.is_empty() && !self.contains(token) {
            self.tokens.push(token.to_string());
        }
    }
}

impl fmt::Display for TokenList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value())
    }
}
