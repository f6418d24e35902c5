use crate::error::{EngineError, Result};
use crate::models::Expense;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a member, unique within its group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
}

impl Member {
    pub fn new(id: impl Into<MemberId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl From<String> for MemberId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// An ordered set of members sharing expenses.
///
/// Insertion order is the canonical order: the first member absorbs
/// rounding residue during allocation and breaks ties during planning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    members: Vec<Member>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Builds a group from members, rejecting duplicate ids.
    pub fn with_members(name: impl Into<String>, members: Vec<Member>) -> Result<Self> {
        let mut group = Self::new(name);
        for member in members {
            group.add_member(member)?;
        }
        Ok(group)
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn contains(&self, id: &MemberId) -> bool {
        self.members.iter().any(|m| &m.id == id)
    }

    pub fn add_member(&mut self, member: Member) -> Result<()> {
        if self.contains(&member.id) {
            return Err(EngineError::InvalidGroup(format!(
                "Member '{}' already belongs to group '{}'",
                member.id, self.name
            )));
        }
        self.members.push(member);
        Ok(())
    }

    pub fn rename_member(&mut self, id: &MemberId, name: impl Into<String>) -> Result<()> {
        let member = self
            .members
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or_else(|| EngineError::InvalidGroup(format!("Member '{}' not found", id)))?;
        member.name = name.into();
        Ok(())
    }

    /// Removes a member that no expense refers to, either as payer or as
    /// an allocation entry.
    pub fn remove_member(&mut self, id: &MemberId, expenses: &[Expense]) -> Result<Member> {
        let position = self
            .members
            .iter()
            .position(|m| &m.id == id)
            .ok_or_else(|| EngineError::InvalidGroup(format!("Member '{}' not found", id)))?;

        if let Some(expense) = expenses.iter().find(|e| e.references(id)) {
            return Err(EngineError::InvalidGroup(format!(
                "Member '{}' is referenced by expense {}",
                id, expense.id
            )));
        }

        Ok(self.members.remove(position))
    }
}

/// Collects the ids of `members` in canonical order.
pub fn member_ids(members: &[Member]) -> Vec<MemberId> {
    members.iter().map(|m| m.id.clone()).collect()
}
