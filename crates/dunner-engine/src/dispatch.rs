// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch mode routing: who actually receives each email.
//!
//! Test-mode overrides form a strict precedence chain. A forced-test run
//! outranks the global kill-switchable test mode, which outranks the
//! triggering operator's personal test mode, which outranks live
//! delivery. Routing a test mode without a configured test address is an
//! error, never a silent fall-through to the customer.

use dunner_core::error::DunnerError;
use dunner_core::types::{OperatorEmailSettings, SystemSettings};

/// Settings snapshot driving recipient routing for one run.
#[derive(Debug, Clone, Default)]
pub struct DispatchContext {
    pub settings: SystemSettings,
    pub operator: Option<OperatorEmailSettings>,
    /// Forces test routing regardless of stored settings (campaign test
    /// sends, `--test` runs).
    pub force_test: bool,
}

/// The routing decision for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedRecipient {
    /// Address the transport will deliver to.
    pub to: String,
    /// True when a test override rewrote the customer address.
    pub test_routed: bool,
}

impl DispatchContext {
    /// Resolve the effective recipient for a customer address.
    ///
    /// Precedence: forced test, then global test mode, then operator test
    /// mode, then live. Each test layer requires its own address: forced
    /// test falls back from the global test address to the operator's
    /// recipient, but the stored modes never borrow each other's.
    pub fn route(&self, intended: &str) -> Result<RoutedRecipient, DunnerError> {
        if self.force_test {
            let to = self
                .settings
                .global_test_email
                .clone()
                .or_else(|| self.operator_test_recipient())
                .ok_or_else(|| {
                    DunnerError::Config(
                        "test send requested but no test address is configured".to_string(),
                    )
                })?;
            return Ok(RoutedRecipient { to, test_routed: true });
        }

        if self.settings.global_test_mode {
            let to = self.settings.global_test_email.clone().ok_or_else(|| {
                DunnerError::Config(
                    "global test mode is enabled but global_test_email is not set".to_string(),
                )
            })?;
            return Ok(RoutedRecipient { to, test_routed: true });
        }

        if let Some(operator) = &self.operator {
            if operator.test_mode_enabled {
                let to = operator.test_recipient.clone().ok_or_else(|| {
                    DunnerError::Config(format!(
                        "operator {} has test mode enabled but no test recipient",
                        operator.operator_id
                    ))
                })?;
                return Ok(RoutedRecipient { to, test_routed: true });
            }
        }

        Ok(RoutedRecipient {
            to: intended.to_string(),
            test_routed: false,
        })
    }

    /// Whether any test override is in effect for this context.
    pub fn is_test(&self) -> bool {
        self.force_test
            || self.settings.global_test_mode
            || self
                .operator
                .as_ref()
                .is_some_and(|o| o.test_mode_enabled)
    }

    fn operator_test_recipient(&self) -> Option<String> {
        self.operator
            .as_ref()
            .and_then(|o| o.test_recipient.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operator(test_mode: bool, recipient: Option<&str>) -> OperatorEmailSettings {
        OperatorEmailSettings {
            operator_id: "op-1".to_string(),
            test_mode_enabled: test_mode,
            test_recipient: recipient.map(str::to_string),
            sender_name: None,
        }
    }

    #[test]
    fn live_mode_delivers_to_customer() {
        let ctx = DispatchContext::default();
        let routed = ctx.route("customer@example.com").unwrap();
        assert_eq!(routed.to, "customer@example.com");
        assert!(!routed.test_routed);
        assert!(!ctx.is_test());
    }

    #[test]
    fn global_test_mode_outranks_operator() {
        let ctx = DispatchContext {
            settings: SystemSettings {
                global_test_mode: true,
                global_test_email: Some("qa@example.com".to_string()),
                ..SystemSettings::default()
            },
            operator: Some(operator(true, Some("me@example.com"))),
            force_test: false,
        };
        assert_eq!(ctx.route("customer@example.com").unwrap().to, "qa@example.com");
    }

    #[test]
    fn operator_test_mode_rewrites_when_global_off() {
        let ctx = DispatchContext {
            operator: Some(operator(true, Some("me@example.com"))),
            ..DispatchContext::default()
        };
        let routed = ctx.route("customer@example.com").unwrap();
        assert_eq!(routed.to, "me@example.com");
        assert!(routed.test_routed);
    }

    #[test]
    fn test_mode_without_address_errors() {
        let global = DispatchContext {
            settings: SystemSettings {
                global_test_mode: true,
                global_test_email: None,
                ..SystemSettings::default()
            },
            ..DispatchContext::default()
        };
        assert!(matches!(
            global.route("c@example.com"),
            Err(DunnerError::Config(_))
        ));

        let operator_ctx = DispatchContext {
            operator: Some(operator(true, None)),
            ..DispatchContext::default()
        };
        assert!(matches!(
            operator_ctx.route("c@example.com"),
            Err(DunnerError::Config(_))
        ));
    }

    #[test]
    fn forced_test_prefers_global_then_operator_address() {
        let with_global = DispatchContext {
            settings: SystemSettings {
                global_test_email: Some("qa@example.com".to_string()),
                ..SystemSettings::default()
            },
            operator: Some(operator(false, Some("me@example.com"))),
            force_test: true,
        };
        assert_eq!(with_global.route("c@example.com").unwrap().to, "qa@example.com");

        let operator_only = DispatchContext {
            operator: Some(operator(false, Some("me@example.com"))),
            force_test: true,
            ..DispatchContext::default()
        };
        assert_eq!(operator_only.route("c@example.com").unwrap().to, "me@example.com");

        let nothing = DispatchContext {
            force_test: true,
            ..DispatchContext::default()
        };
        assert!(nothing.route("c@example.com").is_err());
    }
}
