// 🧾 Client Entity - the customer (공급받는자)
//
// Two shapes of customer:
// - Business: full registration details, like a supplier
// - Individual: just a name and a phone number

use super::company::dash_if_present;
use crate::contact::{format_business_number, format_phone};
use serde::{Deserialize, Serialize};

// ============================================================================
// CLIENT KIND
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientKind {
    #[default]
    Business,
    Individual,
}

impl ClientKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientKind::Business => "business",
            ClientKind::Individual => "individual",
        }
    }

    /// Unknown values fall back to Business, matching the form default.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "individual" => ClientKind::Individual,
            _ => ClientKind::Business,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ClientKind::Business => "사업자",
            ClientKind::Individual => "개인",
        }
    }
}

// ============================================================================
// CLIENT INFO (form values)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientInfo {
    #[serde(rename = "type")]
    pub kind: ClientKind,

    /// 상호 or the individual's name (required)
    pub name: String,

    pub business_number: String,
    pub address: String,
    pub ceo: String,

    /// The form calls this field "contact"
    #[serde(alias = "contact")]
    pub phone: String,

    pub manager: String,
}

impl ClientInfo {
    pub fn business(name: impl Into<String>) -> Self {
        ClientInfo {
            kind: ClientKind::Business,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn individual(name: impl Into<String>, phone: impl Into<String>) -> Self {
        ClientInfo {
            kind: ClientKind::Individual,
            name: name.into(),
            phone: phone.into(),
            ..Default::default()
        }
    }

    /// Trim every field and dash the numeric ones.
    ///
    /// Individuals carry no registration details, so those are cleared.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.phone = dash_if_present(&self.phone, format_phone);

        match self.kind {
            ClientKind::Business => {
                self.address = self.address.trim().to_string();
                self.ceo = self.ceo.trim().to_string();
                self.manager = self.manager.trim().to_string();
                self.business_number =
                    dash_if_present(&self.business_number, format_business_number);
            }
            ClientKind::Individual => {
                self.business_number.clear();
                self.address.clear();
                self.ceo.clear();
                self.manager.clear();
            }
        }

        self
    }

    /// 성명 cell: individuals sign with their own name
    pub fn display_ceo(&self) -> &str {
        match self.kind {
            ClientKind::Individual if self.ceo.is_empty() => &self.name,
            _ => &self.ceo,
        }
    }

    /// 등록번호 cell: individuals show "개인"
    pub fn registration_label(&self) -> &str {
        if !self.business_number.is_empty() {
            &self.business_number
        } else if self.kind == ClientKind::Individual {
            ClientKind::Individual.label()
        } else {
            ""
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty()
    }
}

// ============================================================================
// CLIENT RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,

    #[serde(flatten)]
    pub info: ClientInfo,

    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse() {
        assert_eq!(ClientKind::parse("individual"), ClientKind::Individual);
        assert_eq!(ClientKind::parse(" Individual "), ClientKind::Individual);
        assert_eq!(ClientKind::parse("business"), ClientKind::Business);
        assert_eq!(ClientKind::parse(""), ClientKind::Business);
    }

    #[test]
    fn test_individual_display_fields() {
        let client = ClientInfo::individual("김철수", "01012345678").normalized();

        assert_eq!(client.phone, "010-1234-5678");
        assert_eq!(client.display_ceo(), "김철수");
        assert_eq!(client.registration_label(), "개인");
    }

    #[test]
    fn test_business_display_fields() {
        let mut client = ClientInfo::business("대한상사");
        client.ceo = "이영희".to_string();
        client.business_number = "2223344444".to_string();
        let client = client.normalized();

        assert_eq!(client.display_ceo(), "이영희");
        assert_eq!(client.registration_label(), "222-33-44444");
    }

    #[test]
    fn test_contact_alias() {
        let json = r#"{"type":"individual","name":"박민수","contact":"010-9876-5432"}"#;
        let client: ClientInfo = serde_json::from_str(json).unwrap();

        assert_eq!(client.kind, ClientKind::Individual);
        assert_eq!(client.phone, "010-9876-5432");
    }
}
