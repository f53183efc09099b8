//! Council roster

use crate::core::error::DomainError;
use crate::core::model::Model;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The fixed, ordered set of council members plus the chairman.
///
/// Invariants: at least one member, no duplicate members. The chairman may or
/// may not also be a member. Declaration order is significant: Stage 1
/// results are reported in this order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRoster")]
pub struct Roster {
    members: Vec<Model>,
    chairman: Model,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title_model: Option<Model>,
}

/// Unchecked wire form; deserialization goes through [`Roster::new`].
#[derive(Deserialize)]
struct RawRoster {
    members: Vec<Model>,
    chairman: Model,
    #[serde(default)]
    title_model: Option<Model>,
}

impl TryFrom<RawRoster> for Roster {
    type Error = DomainError;

    fn try_from(raw: RawRoster) -> Result<Self, Self::Error> {
        let roster = Roster::new(raw.members, raw.chairman)?;
        Ok(match raw.title_model {
            Some(model) => roster.with_title_model(model),
            None => roster,
        })
    }
}

impl Roster {
    pub fn new(members: Vec<Model>, chairman: Model) -> Result<Self, DomainError> {
        if members.is_empty() {
            return Err(DomainError::EmptyRoster);
        }
        let mut seen = HashSet::new();
        for model in &members {
            if !seen.insert(model) {
                return Err(DomainError::DuplicateModel(model.to_string()));
            }
        }
        Ok(Self {
            members,
            chairman,
            title_model: None,
        })
    }

    /// Override the model used for title generation.
    pub fn with_title_model(mut self, model: Model) -> Self {
        self.title_model = Some(model);
        self
    }

    pub fn members(&self) -> &[Model] {
        &self.members
    }

    pub fn chairman(&self) -> &Model {
        &self.chairman
    }

    /// Model used for short title generation (the first member unless overridden).
    pub fn title_model(&self) -> &Model {
        self.title_model
            .as_ref()
            .or_else(|| self.members.first())
            .unwrap_or(&self.chairman)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            members: Model::default_roster(),
            chairman: Model::default_chairman(),
            title_model: None,
        }
    }
}
