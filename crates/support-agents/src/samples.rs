//! Built-in sample tickets, one or more per category.

use coordination::{Priority, TicketInput};

const SAMPLES: &[(&str, &str, Priority)] = &[
    (
        "Cannot login to my account",
        "I've been trying to log into my account for the past hour but keep getting an \
'invalid credentials' error even though I'm sure my password is correct. This is urgent as I \
need to access my dashboard for a client meeting.",
        Priority::High,
    ),
    (
        "Double charged this month",
        "I was charged $29.99 twice for my monthly subscription on my credit card. Can you \
please help me get a refund for the duplicate charge? My account email is john@example.com",
        Priority::Normal,
    ),
    (
        "Mobile app keeps crashing",
        "The mobile app crashes every time I try to open the reports section. I'm using \
iPhone 13 with iOS 16.1. This started happening after the latest app update yesterday.",
        Priority::Normal,
    ),
    (
        "How to export my data?",
        "I need to export all my data for backup purposes. Is there a way to do bulk data \
export? I couldn't find this option in the settings menu.",
        Priority::Low,
    ),
    (
        "Suspicious login activity",
        "I received an email saying someone logged into my account from Russia, but I \
haven't traveled there. I'm worried my account has been compromised. Please help immediately!",
        Priority::Urgent,
    ),
];

pub fn sample_tickets() -> Vec<TicketInput> {
    SAMPLES
        .iter()
        .map(|&(subject, description, priority)| TicketInput {
            priority,
            ..TicketInput::new(subject, description)
        })
        .collect()
}
