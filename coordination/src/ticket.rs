//! Ticket model — immutable customer request and its category set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::TicketError;

pub const SUBJECT_MAX_LEN: usize = 200;
pub const DESCRIPTION_MAX_LEN: usize = 5000;

/// Phrases that suggest the customer pasted sensitive data into the ticket.
const SENSITIVE_MARKERS: &[&str] = &[
    "password",
    "credit card",
    "ssn",
    "social security",
    "bank account",
    "routing number",
];

/// Closed set of ticket categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Billing,
    Technical,
    Security,
    General,
}

impl Category {
    /// All categories, in declaration order.
    pub const ALL: [Category; 4] = [
        Category::Billing,
        Category::Technical,
        Category::Security,
        Category::General,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Billing => "billing",
            Self::Technical => "technical",
            Self::Security => "security",
            Self::General => "general",
        }
    }

    /// Lenient parse; unknown names map to `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "billing" => Some(Self::Billing),
            "technical" => Some(Self::Technical),
            "security" => Some(Self::Security),
            "general" => Some(Self::General),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Customer-declared urgency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "normal" => Some(Self::Normal),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Normal => write!(f, "normal"),
            Self::High => write!(f, "high"),
            Self::Urgent => write!(f, "urgent"),
        }
    }
}

/// Ticket identifier, `TKT-YYYYMMDD-HHMMSS-xxxxxxxx` when generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh id from the creation time plus a random suffix.
    pub fn generate(at: DateTime<Utc>) -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("TKT-{}-{}", at.format("%Y%m%d-%H%M%S"), &suffix[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw, unvalidated ticket fields as they arrive from a caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketInput {
    #[serde(default, alias = "ticket_id")]
    pub id: Option<String>,
    pub subject: String,
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl TicketInput {
    pub fn new(subject: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            description: description.into(),
            ..Default::default()
        }
    }
}

/// A validated support ticket. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TicketInput")]
pub struct Ticket {
    id: TicketId,
    subject: String,
    description: String,
    priority: Priority,
    customer_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl Ticket {
    /// Validate and build a ticket with a generated id.
    pub fn new(
        subject: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, TicketError> {
        Self::try_from(TicketInput::new(subject, description))
    }

    pub fn id(&self) -> &TicketId {
        &self.id
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn customer_id(&self) -> Option<&str> {
        self.customer_id.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Subject and description joined with a single space.
    pub fn full_text(&self) -> String {
        format!("{} {}", self.subject, self.description)
    }

    /// Re-check the field limits. Tickets built through `new`/serde always pass.
    ///
    /// Short but non-blank fields are accepted; `advisories` flags them.
    pub fn validate(&self) -> Result<(), TicketError> {
        check_field("subject", &self.subject, SUBJECT_MAX_LEN)?;
        check_field("description", &self.description, DESCRIPTION_MAX_LEN)
    }

    /// Non-fatal concerns worth logging (brevity, pasted secrets).
    pub fn advisories(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if self.subject.chars().count() < 5 {
            notes.push("subject is very short".to_string());
        }
        if self.description.chars().count() < 20 {
            notes.push("description is very brief".to_string());
        }
        let text = self.full_text().to_lowercase();
        for marker in SENSITIVE_MARKERS {
            if text.contains(marker) {
                notes.push(format!("possible sensitive information: {marker}"));
            }
        }
        notes
    }
}

impl TryFrom<TicketInput> for Ticket {
    type Error = TicketError;

    fn try_from(input: TicketInput) -> Result<Self, Self::Error> {
        let subject = collapse_whitespace(&input.subject);
        let description = collapse_whitespace(&input.description);
        check_field("subject", &subject, SUBJECT_MAX_LEN)?;
        check_field("description", &description, DESCRIPTION_MAX_LEN)?;

        let created_at = input.created_at.unwrap_or_else(Utc::now);
        let id = match input.id.filter(|id| !id.trim().is_empty()) {
            Some(id) => TicketId::new(id.trim()),
            None => TicketId::generate(created_at),
        };

        Ok(Self {
            id,
            subject,
            description,
            priority: input.priority,
            customer_id: input.customer_id,
            created_at,
        })
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn check_field(field: &'static str, value: &str, max: usize) -> Result<(), TicketError> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err(TicketError::Empty { field });
    }
    if len > max {
        return Err(TicketError::TooLong { field, max, len });
    }
    Ok(())
}
