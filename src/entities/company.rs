// 🏢 Company Entity - the supplier (공급자) issuing the estimate

use crate::contact::{format_business_number, format_phone};
use serde::{Deserialize, Serialize};

// ============================================================================
// COMPANY INFO (form values)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyInfo {
    /// 상호 (required)
    pub name: String,

    /// 사업자등록번호, `000-00-00000`
    pub business_number: String,

    pub address: String,

    /// 대표자
    pub ceo: String,

    /// 업태
    #[serde(rename = "type")]
    pub business_type: String,

    /// 종목
    #[serde(rename = "item")]
    pub business_item: String,

    pub phone: String,
    pub fax: String,

    /// 담당자
    pub manager: String,
}

impl CompanyInfo {
    pub fn new(name: impl Into<String>) -> Self {
        CompanyInfo {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Trim every field and dash the numeric ones.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.address = self.address.trim().to_string();
        self.ceo = self.ceo.trim().to_string();
        self.business_type = self.business_type.trim().to_string();
        self.business_item = self.business_item.trim().to_string();
        self.manager = self.manager.trim().to_string();
        self.business_number = dash_if_present(&self.business_number, format_business_number);
        self.phone = dash_if_present(&self.phone, format_phone);
        self.fax = dash_if_present(&self.fax, format_phone);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty()
    }
}

/// Leave blank input blank; otherwise run the dashing formatter.
pub(crate) fn dash_if_present(value: &str, formatter: fn(&str) -> String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        formatter(trimmed)
    }
}

// ============================================================================
// COMPANY RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,

    #[serde(flatten)]
    pub info: CompanyInfo,

    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_dashes_numbers() {
        let info = CompanyInfo {
            name: "  한빛인테리어 ".to_string(),
            business_number: "1234567890".to_string(),
            phone: "0212345678".to_string(),
            fax: "".to_string(),
            ..Default::default()
        }
        .normalized();

        assert_eq!(info.name, "한빛인테리어");
        assert_eq!(info.business_number, "123-45-67890");
        assert_eq!(info.phone, "02-1234-5678");
        assert_eq!(info.fax, "");
    }

    #[test]
    fn test_json_field_names() {
        let json = r#"{"name":"한빛","type":"건설업","item":"실내건축"}"#;
        let info: CompanyInfo = serde_json::from_str(json).unwrap();

        assert_eq!(info.business_type, "건설업");
        assert_eq!(info.business_item, "실내건축");
        assert_eq!(info.phone, "");

        let company = Company {
            id: 7,
            info,
            created_at: "2024-01-01 00:00:00".to_string(),
        };
        let value = serde_json::to_value(&company).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["type"], "건설업");
        assert_eq!(value["name"], "한빛");
    }
}
