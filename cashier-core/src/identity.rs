use serde::{Deserialize, Serialize};

/// Who is paying. Resolved once per request before the payment handlers run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Buyer {
    Authenticated {
        customer_id: String,
        /// Stored account email; accounts may exist without one
        email: Option<String>,
    },
    Anonymous,
}

impl Buyer {
    pub fn customer_id(&self) -> Option<&str> {
        match self {
            Buyer::Authenticated { customer_id, .. } => Some(customer_id),
            Buyer::Anonymous => None,
        }
    }

    /// The account email, when the buyer is signed in and has one.
    pub fn account_email(&self) -> Option<&str> {
        match self {
            Buyer::Authenticated { email, .. } => email.as_deref().filter(|e| !e.trim().is_empty()),
            Buyer::Anonymous => None,
        }
    }
}

impl Default for Buyer {
    fn default() -> Self {
        Buyer::Anonymous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_email() {
        let buyer = Buyer::Authenticated {
            customer_id: "cust-1".to_string(),
            email: Some("jane@example.com".to_string()),
        };
        assert_eq!(buyer.account_email(), Some("jane@example.com"));
        assert_eq!(buyer.customer_id(), Some("cust-1"));
    }

    #[test]
    fn test_blank_account_email_is_none() {
        let buyer = Buyer::Authenticated {
            customer_id: "cust-1".to_string(),
            email: Some("  ".to_string()),
        };
        assert_eq!(buyer.account_email(), None);
        assert_eq!(Buyer::Anonymous.account_email(), None);
        assert_eq!(Buyer::default().customer_id(), None);
    }
}
