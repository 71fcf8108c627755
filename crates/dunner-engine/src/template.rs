// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Placeholder substitution for campaign templates.
//!
//! Deliberately minimal: the engine's contract with templates is a fixed
//! placeholder set, nothing more. Unknown placeholders pass through
//! unchanged so a typo is visible in test sends rather than silently
//! swallowed.

use dunner_core::types::Invoice;

/// Substitute the supported `{{placeholder}}` tokens with invoice values.
pub fn render(template: &str, invoice: &Invoice) -> String {
    template
        .replace("{{invoice_id}}", &invoice.id.to_string())
        .replace("{{amount_due}}", &format!("{:.2}", invoice.amount_due))
        .replace("{{total_amount}}", &format!("{:.2}", invoice.total_amount))
        .replace(
            "{{days_outstanding}}",
            &invoice.days_outstanding.to_string(),
        )
        .replace("{{customer_email}}", &invoice.customer_email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dunner_core::types::PaymentStatus;

    fn invoice() -> Invoice {
        Invoice {
            id: 4211,
            customer_email: "finance@acme.example".to_string(),
            total_amount: 1250.0,
            amount_due: 437.5,
            days_outstanding: 64,
            payment_status: PaymentStatus::Partial,
        }
    }

    #[test]
    fn substitutes_all_placeholders() {
        let rendered = render(
            "Invoice {{invoice_id}}: {{amount_due}} of {{total_amount}} due for {{days_outstanding}} days ({{customer_email}})",
            &invoice(),
        );
        assert_eq!(
            rendered,
            "Invoice 4211: 437.50 of 1250.00 due for 64 days (finance@acme.example)"
        );
    }

    #[test]
    fn unknown_placeholders_pass_through() {
        let rendered = render("Hello {{customer_name}}", &invoice());
        assert_eq!(rendered, "Hello {{customer_name}}");
    }
}
