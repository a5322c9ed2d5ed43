//! HTML notification templates.
//!
//! Every piece of user-supplied text passes through [`escape_html`] before
//! being placed in markup.

use crate::clients::paypal::format_amount;
use crate::models::submission::SubmissionStatus;

/// A notification waiting to be rendered.
#[derive(Debug, Clone)]
pub enum EmailTemplate {
    ApplicationReviewed {
        display_name: String,
        /// `None` for platform applications
        campaign_title: Option<String>,
        approved: bool,
        notes: Option<String>,
    },
    SubmissionReviewed {
        display_name: String,
        campaign_title: String,
        status: SubmissionStatus,
        feedback: Option<String>,
    },
    PayoutPaid {
        display_name: String,
        amount_cents: i64,
        currency: String,
        paypal_reference: String,
    },
    CampaignFunded {
        display_name: String,
        campaign_title: String,
        amount_cents: i64,
        currency: String,
    },
}

/// Subject line and HTML body ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

impl EmailTemplate {
    pub fn kind(&self) -> &'static str {
        match self {
            EmailTemplate::ApplicationReviewed { .. } => "application_reviewed",
            EmailTemplate::SubmissionReviewed { .. } => "submission_reviewed",
            EmailTemplate::PayoutPaid { .. } => "payout_paid",
            EmailTemplate::CampaignFunded { .. } => "campaign_funded",
        }
    }

    pub fn render(&self, app_base_url: &str) -> RenderedEmail {
        let dashboard = format!("{}/dashboard", app_base_url.trim_end_matches('/'));

        match self {
            EmailTemplate::ApplicationReviewed {
                display_name,
                campaign_title,
                approved,
                notes,
            } => {
                let target = match campaign_title {
                    Some(title) => format!("the campaign <strong>{}</strong>", escape_html(title)),
                    None => "CreatorAmp".to_string(),
                };
                let (subject, headline) = if *approved {
                    (
                        "Your CreatorAmp application was approved",
                        format!("Your application to {target} was approved. You can start submitting content."),
                    )
                } else {
                    (
                        "Update on your CreatorAmp application",
                        format!("Your application to {target} was not approved this time."),
                    )
                };

                RenderedEmail {
                    subject: subject.to_string(),
                    html: layout(
                        display_name,
                        &format!("<p>{headline}</p>{}", notes_block("Notes from the reviewer", notes)),
                        &dashboard,
                    ),
                }
            }
            EmailTemplate::SubmissionReviewed {
                display_name,
                campaign_title,
                status,
                feedback,
            } => {
                let outcome = match status {
                    SubmissionStatus::Approved => "was approved. A payout has been scheduled",
                    SubmissionStatus::Rejected => "was rejected",
                    SubmissionStatus::NeedsRevision => "needs a revision before it can be approved",
                    SubmissionStatus::Published => "has been marked as published",
                    SubmissionStatus::Pending => "is waiting for review",
                };

                RenderedEmail {
                    subject: format!("Submission update: {}", campaign_title),
                    html: layout(
                        display_name,
                        &format!(
                            "<p>Your submission to <strong>{}</strong> {outcome}.</p>{}",
                            escape_html(campaign_title),
                            notes_block("Feedback", feedback)
                        ),
                        &dashboard,
                    ),
                }
            }
            EmailTemplate::PayoutPaid {
                display_name,
                amount_cents,
                currency,
                paypal_reference,
            } => RenderedEmail {
                subject: "You've been paid on CreatorAmp".to_string(),
                html: layout(
                    display_name,
                    &format!(
                        "<p>We sent you <strong>{} {}</strong> via PayPal.</p><p>Reference: {}</p>",
                        format_amount(*amount_cents),
                        escape_html(currency),
                        escape_html(paypal_reference)
                    ),
                    &dashboard,
                ),
            },
            EmailTemplate::CampaignFunded {
                display_name,
                campaign_title,
                amount_cents,
                currency,
            } => RenderedEmail {
                subject: format!("Campaign live: {}", campaign_title),
                html: layout(
                    display_name,
                    &format!(
                        "<p>Your payment of <strong>{} {}</strong> was received and <strong>{}</strong> is now open to creators.</p>",
                        format_amount(*amount_cents),
                        escape_html(currency),
                        escape_html(campaign_title)
                    ),
                    &dashboard,
                ),
            },
        }
    }
}

fn notes_block(label: &str, notes: &Option<String>) -> String {
    match notes.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => {
            format!("<p><em>{label}:</em><br>{}</p>", escape_html(text))
        }
        _ => String::new(),
    }
}

fn layout(display_name: &str, content: &str, dashboard_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <body style="font-family: Helvetica, Arial, sans-serif; color: #111;">
    <p>Hi {name},</p>
    {content}
    <p><a href="{dashboard}">Open your dashboard</a></p>
    <p style="color: #888; font-size: 12px;">CreatorAmp</p>
  </body>
</html>"#,
        name = escape_html(display_name),
        dashboard = escape_html(dashboard_url),
    )
}

/// Escape the five HTML-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
