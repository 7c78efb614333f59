use serde::{Deserialize, Serialize};
use std::fmt;

/// Email or phone number a one-time code is sent to
///
/// Serializes as `{"email": ...}` or `{"phone": ...}`, which is the shape
/// the OTP service expects in request bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Identifier {
    Email(String),
    Phone(String),
}

impl Identifier {
    /// Classify raw user input
    ///
    /// Anything containing a non-digit is an email (lower-cased); otherwise
    /// the digits form a phone number. Blank input yields `None`.
    pub fn parse(input: &str) -> Option<Identifier> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        if input.chars().any(|c| !c.is_ascii_digit()) {
            Some(Identifier::Email(input.to_lowercase()))
        } else {
            Some(Identifier::Phone(input.to_string()))
        }
    }

    pub fn email(email: &str) -> Identifier {
        Identifier::Email(email.trim().to_lowercase())
    }

    pub fn value(&self) -> &str {
        match self {
            Identifier::Email(v) | Identifier::Phone(v) => v,
        }
    }

    /// Query parameter name used by the user-status lookup
    pub fn field_name(&self) -> &'static str {
        match self {
            Identifier::Email(_) => "email",
            Identifier::Phone(_) => "phone",
        }
    }

    /// Display form that hides most of the identifier
    pub fn masked(&self) -> String {
        match self {
            Identifier::Email(email) => mask_email(email),
            Identifier::Phone(phone) => {
                let digits: Vec<char> = phone.chars().collect();
                let tail: String = digits[digits.len().saturating_sub(4)..].iter().collect();
                format!("••••••{}", tail)
            }
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

/// Masked form of raw input, `your contact` when it cannot be classified
pub fn mask_identifier(input: &str) -> String {
    Identifier::parse(input)
        .map(|id| id.masked())
        .unwrap_or_else(|| "your contact".to_string())
}

fn mask_email(email: &str) -> String {
    let (name, domain) = email.split_once('@').unwrap_or((email, ""));
    let safe_name: String = name.chars().take(2).collect();

    // First character of the domain, an ellipsis if more follows before the
    // first dot, then everything from that dot on
    let safe_domain = match domain.find('.') {
        Some(dot) if dot > 0 => {
            let mut chars = domain[..dot].chars();
            let first = chars.next().map(String::from).unwrap_or_default();
            let hidden = if chars.next().is_some() { "…" } else { "" };
            format!("{}{}{}", first, hidden, &domain[dot..])
        }
        _ => domain.to_string(),
    };

    let safe_domain = if safe_domain.is_empty() {
        "…".to_string()
    } else {
        safe_domain
    };

    format!("{}…@{}", safe_name, safe_domain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("  Someone@Example.COM " => Some(Identifier::Email("someone@example.com".to_string())) ; "email lower-cased")]
    #[test_case("9800000000" => Some(Identifier::Phone("9800000000".to_string())) ; "all digits is a phone")]
    #[test_case("+977 9800000000" => Some(Identifier::Email("+977 9800000000".to_string())) ; "any non-digit is an email")]
    #[test_case("   " => None ; "blank")]
    fn test_parse(input: &str) -> Option<Identifier> {
        Identifier::parse(input)
    }

    #[test_case("abcdef@gmail.com" => "ab…@g….com" ; "long email")]
    #[test_case("a@b.com" => "a…@b.com" ; "single character parts")]
    #[test_case("ab@localhost" => "ab…@localhost" ; "domain without dot")]
    #[test_case("someone@" => "so…@…" ; "missing domain")]
    #[test_case("9800001234" => "••••••1234" ; "phone")]
    #[test_case("12" => "••••••12" ; "short phone")]
    #[test_case("" => "your contact" ; "unknown")]
    fn test_mask_identifier(input: &str) -> String {
        mask_identifier(input)
    }

    #[test]
    fn test_serializes_as_tagged_field() {
        let json = serde_json::to_value(Identifier::Phone("9800001234".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({"phone": "9800001234"}));

        let json = serde_json::to_value(Identifier::email("A@B.com")).unwrap();
        assert_eq!(json, serde_json::json!({"email": "a@b.com"}));
    }
}
