//! Prompt builders for the drafter and the LLM reviewer.
//!
//! Category-specific text comes from `coordination::profile`; this module
//! only assembles it.

use coordination::{profile, Category, RetrievalContext, ReviewCriterion, Ticket};

const DRAFTER_BASE: &str = "You are a professional customer support agent. Your goal is to provide helpful, accurate, and empathetic responses to customer inquiries.

IMPORTANT GUIDELINES:
- Be friendly and professional
- Provide clear, actionable steps when possible
- Don't make promises you can't keep
- If you need more information, ask for it
- Keep responses concise but thorough
- Always acknowledge the customer's concern";

const REVIEWER_BASE: &str = "You are a customer support quality assurance reviewer with high standards. \
Judge the draft response against every criterion below. A draft is approved only when all criteria pass.";

/// System instructions for the drafter.
pub fn drafter_system_prompt(category: Category) -> String {
    format!("{DRAFTER_BASE}\n\n{}", profile(category).drafting_rules)
}

/// User message for the drafter. `feedback` is the previous attempt's
/// correction, present on retries only.
pub fn drafter_user_prompt(
    ticket: &Ticket,
    context: &RetrievalContext,
    feedback: Option<&str>,
) -> String {
    let mut prompt = format!(
        "Please draft a response to this customer support ticket:\n\n\
TICKET DETAILS:\n\
Subject: {}\n\
Description: {}\n\n\
AVAILABLE DOCUMENTATION:\n\
{}",
        ticket.subject(),
        ticket.description(),
        context.format_for_prompt().trim_end(),
    );

    if let Some(feedback) = feedback.filter(|f| !f.trim().is_empty()) {
        prompt.push_str(&format!(
            "\n\nPREVIOUS ATTEMPT FEEDBACK:\n\
The previous response was rejected with this feedback:\n{}\n\
Please address every point in your new response.",
            feedback.trim()
        ));
    }

    prompt.push_str(
        "\n\nPlease write a helpful response that:\n\
1. Acknowledges the customer's issue\n\
2. Uses the provided documentation to give accurate information\n\
3. Provides clear next steps or solutions\n\
4. Maintains a professional and empathetic tone\n\n\
RESPONSE:",
    );
    prompt
}

/// System instructions for the LLM reviewer, including the required
/// output format.
pub fn reviewer_system_prompt(category: Category) -> String {
    let criteria: String = ReviewCriterion::ALL
        .iter()
        .map(|c| format!("- {}: {}\n", c.label(), c.description()))
        .collect();
    let format_lines: String = ReviewCriterion::ALL
        .iter()
        .map(|c| format!("{}: PASS|FAIL - <one-line reason>\n", c.label()))
        .collect();

    format!(
        "{REVIEWER_BASE}\n\n\
CRITERIA:\n{criteria}\n\
{policies}\n\n\
IMPORTANT: You must respond in this exact format, one line per criterion:\n\
{format_lines}\
FEEDBACK: <specific changes the next draft must make>",
        policies = profile(category).review_policies,
    )
}

/// User message for the LLM reviewer.
pub fn reviewer_user_prompt(
    ticket: &Ticket,
    category: Category,
    draft: &str,
    context: &RetrievalContext,
) -> String {
    format!(
        "Review this customer support response:\n\n\
ORIGINAL TICKET:\n\
Subject: {}\n\
Description: {}\n\
Category: {}\n\n\
{}\n\n\
DRAFT RESPONSE:\n\
{}",
        ticket.subject(),
        ticket.description(),
        category,
        context.format_for_prompt().trim_end(),
        draft.trim(),
    )
}
