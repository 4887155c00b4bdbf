use reqwest::Url;
use thiserror::Error;

/// Identifier and token sourced from the invoking environment, typically the
/// query parameters of an emailed verification link. Both default to the
/// empty string when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryContext {
    pub identifier: String,
    pub token: String,
}

#[derive(Debug, Error)]
pub enum EntryError {
    #[error("invalid verification link: {0}")]
    InvalidLink(String),
}

impl EntryContext {
    pub fn new(identifier: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            token: token.into(),
        }
    }

    /// Parse the `id` and `token` query parameters out of a verification
    /// link. Other parameters are ignored.
    pub fn from_link(link: &str) -> Result<Self, EntryError> {
        let url = Url::parse(link).map_err(|e| EntryError::InvalidLink(e.to_string()))?;

        let mut context = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "id" => context.identifier = value.into_owned(),
                "token" => context.token = value.into_owned(),
                _ => {}
            }
        }
        Ok(context)
    }

    /// A link carrying both values triggers an automatic first attempt.
    pub fn is_auto_submit(&self) -> bool {
        !self.identifier.is_empty() && !self.token.is_empty()
    }
}
