//! Built-in knowledge base used when no corpus file is configured.

use crate::errors::CorpusError;
use crate::retrieval::corpus::{CorpusSnapshot, DocumentSource};
use crate::ticket::Category;

const DOCUMENTS: &[(Category, &str, &str)] = &[
    (
        Category::Billing,
        "Payment Method Issues",
        "If you're experiencing payment method issues, please verify that your card details are \
correct and not expired. You can update your payment method in the billing section of your \
account settings.",
    ),
    (
        Category::Billing,
        "Refund Policy",
        "Refunds are processed within 3-5 business days after approval. To request a refund, \
please provide your order number and reason for the refund request.",
    ),
    (
        Category::Billing,
        "Subscription Management",
        "You can upgrade, downgrade, or cancel your subscription at any time. Changes take effect \
at the next billing cycle unless you're upgrading, which is immediate.",
    ),
    (
        Category::Billing,
        "Invoice Questions",
        "All invoices are sent to your registered email address. You can also download them from \
the billing section of your account. If you need a specific invoice format, please contact our \
billing team.",
    ),
    (
        Category::Technical,
        "Authentication Troubleshooting",
        "An invalid credentials error at login usually means the email address or password does \
not match the account. Confirm caps lock is off, check the password is correct for the email \
on file, and reset the password if the error persists. Repeated failed attempts lock login for \
15 minutes.",
    ),
    (
        Category::Technical,
        "Login Issues",
        "For login problems, first try clearing your browser cache and cookies. If that doesn't \
work, try resetting your password. Make sure you're using the correct email address associated \
with your account.",
    ),
    (
        Category::Technical,
        "Mobile App Crashes",
        "If the mobile app is crashing, try updating to the latest version from your app store. \
If the problem persists, try restarting your device or reinstalling the app.",
    ),
    (
        Category::Technical,
        "API Integration",
        "Our API has a rate limit of 1000 requests per hour. Make sure you're including your API \
key in the headers and following our authentication guidelines in the documentation.",
    ),
    (
        Category::Technical,
        "Browser Compatibility",
        "Our platform is compatible with Chrome 90+, Firefox 88+, Safari 14+, and Edge 90+. \
Please ensure you're using a supported browser version for the best experience.",
    ),
    (
        Category::Security,
        "Password Reset",
        "To reset your password, click the 'Forgot Password' link on the login page. You'll \
receive an email with reset instructions. The reset link expires after 24 hours for security.",
    ),
    (
        Category::Security,
        "Two-Factor Authentication",
        "We highly recommend enabling 2FA for your account security. You can set this up in your \
account security settings using an authenticator app or SMS.",
    ),
    (
        Category::Security,
        "Suspicious Activity",
        "If you notice any suspicious activity on your account, immediately change your password \
and contact our security team. We monitor all accounts for unusual login patterns.",
    ),
    (
        Category::Security,
        "Data Privacy",
        "We follow strict data privacy guidelines and never share your personal information with \
third parties without your consent. You can review our privacy policy for complete details.",
    ),
    (
        Category::General,
        "Support Hours",
        "Our customer support team is available Monday through Friday, 9 AM to 6 PM EST. For \
urgent issues outside these hours, please use our emergency contact form.",
    ),
    (
        Category::General,
        "Feature Requests",
        "We love hearing your ideas! You can submit feature requests through our feedback form in \
your account dashboard. Our product team reviews all suggestions monthly.",
    ),
    (
        Category::General,
        "Account Deletion",
        "Account deletion is permanent and cannot be undone. If you proceed, all your data will be \
removed within 48 hours. Please download any important data before requesting deletion.",
    ),
    (
        Category::General,
        "Getting Started Guide",
        "New to our platform? Check out our getting started guide in the help center. It covers \
account setup, basic features, and common workflows to help you get up and running quickly.",
    ),
];

/// Document sources of the built-in knowledge base, in insertion order.
pub fn builtin_documents() -> Vec<DocumentSource> {
    DOCUMENTS
        .iter()
        .map(|(category, title, body)| DocumentSource::new(*category, *title, *body))
        .collect()
}

/// Snapshot of the built-in knowledge base.
pub fn builtin_snapshot() -> Result<CorpusSnapshot, CorpusError> {
    CorpusSnapshot::new(builtin_documents())
}
