use super::RuleError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

// 规则状态, 只有两种取值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    #[default]
    Active,
    Inactive,
}

impl RuleStatus {
    pub fn toggled(self) -> Self {
        match self {
            RuleStatus::Active => RuleStatus::Inactive,
            RuleStatus::Inactive => RuleStatus::Active,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleStatus::Active => "active",
            RuleStatus::Inactive => "inactive",
        }
    }

    /// 宽松解析服务端返回的状态字符串
    pub fn from_wire(status: Option<&str>) -> Self {
        match status {
            None => RuleStatus::Active,
            Some(s) => s.parse().unwrap_or_else(|_| {
                warn!("Unknown rule status {:?}, treating as inactive", s);
                RuleStatus::Inactive
            }),
        }
    }
}

impl FromStr for RuleStatus {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(RuleStatus::Active),
            "inactive" => Ok(RuleStatus::Inactive),
            other => Err(RuleError::MalformedResponse(format!(
                "unknown rule status: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// 本地规则
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: RuleStatus,
    pub created_at: DateTime<Utc>,
}

impl Rule {
    pub fn toggle_status(&mut self) {
        self.status = self.status.toggled();
    }

    pub fn is_active(&self) -> bool {
        self.status == RuleStatus::Active
    }
}

/// 规则表单草稿, 仅存在于表单状态中
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDefinitionDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub rule_definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarified_rule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl RuleDefinitionDraft {
    pub fn new(name: impl Into<String>, rule_definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rule_definition: rule_definition.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_credentials(mut self, credentials: &Credentials) -> Self {
        self.username = Some(credentials.username.clone());
        self.password = Some(credentials.password.clone());
        self
    }

    /// 空白描述视为未填写
    pub fn description_text(&self) -> Option<&str> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleDetails {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub entity: String,
    #[serde(default)]
    pub condition: String,
}

/// apply 接口返回的匹配规则, 只读
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppliedRule {
    #[serde(deserialize_with = "deserialize_id")]
    pub rule_id: String,
    pub rule_name: String,
    #[serde(default)]
    pub rule: RuleDetails,
    #[serde(default)]
    pub rule_description: Option<String>,
    #[serde(default)]
    pub created_on: Option<String>,
    #[serde(default)]
    pub updated_on: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// 服务端规则记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub rule_id: String,
    pub rule_name: String,
    #[serde(default)]
    pub rule: Option<Value>,
    #[serde(default)]
    pub rule_description: Option<String>,
    pub created_on: String,
    #[serde(default)]
    pub updated_on: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl TryFrom<RuleRecord> for Rule {
    type Error = RuleError;

    fn try_from(record: RuleRecord) -> Result<Self, Self::Error> {
        let created_at = parse_timestamp(&record.created_on)?;
        Ok(Rule {
            id: record.rule_id,
            name: record.rule_name,
            description: record.rule_description.filter(|d| !d.is_empty()),
            status: RuleStatus::from_wire(record.status.as_deref()),
            created_at,
        })
    }
}

/// 解析服务端时间戳: RFC 3339, "YYYY-MM-DD HH:MM:SS" 或 "YYYY-MM-DD"
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RuleError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(ts.and_utc());
    }
    if let Some(ts) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(ts.and_utc());
    }
    Err(RuleError::MalformedResponse(format!(
        "invalid timestamp: {}",
        raw
    )))
}

// rule_id 可能是数字也可能是字符串
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Num(i64),
        Str(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Num(n) => n.to_string(),
        RawId::Str(s) => s,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn double_toggle_is_identity() {
        for status in [RuleStatus::Active, RuleStatus::Inactive] {
            assert_eq!(status.toggled().toggled(), status);
            assert_ne!(status.toggled(), status);
        }
    }

    #[test]
    fn wire_status_is_lenient() {
        assert_eq!(RuleStatus::from_wire(Some("ACTIVE")), RuleStatus::Active);
        assert_eq!(RuleStatus::from_wire(Some(" inactive ")), RuleStatus::Inactive);
        assert_eq!(RuleStatus::from_wire(None), RuleStatus::Active);
        assert_eq!(RuleStatus::from_wire(Some("archived")), RuleStatus::Inactive);
    }

    #[test]
    fn record_maps_to_rule() {
        let record: RuleRecord = serde_json::from_value(json!({
            "rule_id": 42,
            "rule_name": "Free Shipping",
            "rule": {"field": "orderTotal", "value": 50, "entity": "order", "condition": ">"},
            "rule_description": "Apply free shipping for all orders over $50.",
            "created_on": "2024-03-01T10:15:00Z",
            "updated_on": "2024-03-01T10:15:00Z",
            "tenant_id": "02caae70-9c87-4f0f-a393-5b0f92283a42",
            "status": "inactive"
        }))
        .unwrap();

        let rule = Rule::try_from(record).unwrap();
        assert_eq!(rule.id, "42");
        assert_eq!(rule.name, "Free Shipping");
        assert_eq!(rule.status, RuleStatus::Inactive);
        assert_eq!(rule.created_at.to_rfc3339(), "2024-03-01T10:15:00+00:00");
    }

    #[test]
    fn timestamps_accept_common_shapes() {
        assert!(parse_timestamp("2023-06-23").is_ok());
        assert!(parse_timestamp("2023-06-23 08:30:00").is_ok());
        assert!(parse_timestamp("2023-06-23T08:30:00.123+02:00").is_ok());
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(RuleError::MalformedResponse(_))
        ));
    }

    #[test]
    fn draft_uses_camel_case_on_the_wire() {
        let draft = RuleDefinitionDraft::new("Bonus", "if sales > 10 give 5% bonus");
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(
            value,
            json!({"name": "Bonus", "ruleDefinition": "if sales > 10 give 5% bonus"})
        );
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials::new("admin", "hunter2");
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }
}
