use crate::types::{Credentials, RuleDefinitionDraft, RuleError, ValidationIssue};
use jsonschema::Validator;
use lazy_static::lazy_static;
use serde_json::{json, Value};

pub const NAME_TOO_SHORT: &str = "Rule name must be at least 3 characters.";
pub const DEFINITION_TOO_SHORT: &str = "Rule definition must be at least 10 characters.";
pub const USERNAME_REQUIRED: &str = "Username is required for authentication.";
pub const PASSWORD_REQUIRED: &str = "Password is required for authentication.";
pub const CLARIFY_TOO_SHORT: &str =
    "Please provide a more detailed rule definition (at least 10 characters).";

pub const MIN_NAME_LEN: usize = 3;
pub const MIN_DEFINITION_LEN: usize = 10;

struct FieldRule {
    field: &'static str,
    message: &'static str,
    validator: Validator,
}

fn string_schema(min_length: usize) -> Value {
    json!({ "type": "string", "minLength": min_length })
}

fn field_rule(field: &'static str, schema: Value, message: &'static str) -> FieldRule {
    FieldRule {
        field,
        message,
        validator: jsonschema::validator_for(&schema).expect("field schema is valid"),
    }
}

lazy_static! {
    static ref DRAFT_FIELDS: Vec<FieldRule> = vec![
        field_rule("name", string_schema(MIN_NAME_LEN), NAME_TOO_SHORT),
        field_rule("description", json!({ "type": ["string", "null"] }), "Description must be text."),
        field_rule("ruleDefinition", string_schema(MIN_DEFINITION_LEN), DEFINITION_TOO_SHORT),
        field_rule("clarifiedRule", json!({ "type": ["string", "null"] }), "Clarified rule must be text."),
    ];
    static ref CREDENTIAL_FIELDS: Vec<FieldRule> = vec![
        field_rule("username", string_schema(1), USERNAME_REQUIRED),
        field_rule("password", string_schema(1), PASSWORD_REQUIRED),
    ];
}

/// 规则表单校验, 可选启用凭据字段
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleSchema {
    require_credentials: bool,
}

impl RuleSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(mut self, required: bool) -> Self {
        self.require_credentials = required;
        self
    }

    pub fn requires_credentials(&self) -> bool {
        self.require_credentials
    }

    /// 按字段顺序返回全部问题, 空列表表示通过; 长度按原文计算, 不去除空白
    pub fn issues(&self, draft: &RuleDefinitionDraft) -> Vec<ValidationIssue> {
        let instance = json!({
            "name": draft.name,
            "description": draft.description,
            "ruleDefinition": draft.rule_definition,
            "clarifiedRule": draft.clarified_rule,
            "username": draft.username.as_deref().unwrap_or_default(),
            "password": draft.password.as_deref().unwrap_or_default(),
        });

        let mut issues = check_fields(&DRAFT_FIELDS, &instance);
        if self.require_credentials {
            issues.extend(check_fields(&CREDENTIAL_FIELDS, &instance));
        }
        issues
    }

    pub fn validate(&self, draft: &RuleDefinitionDraft) -> Result<(), RuleError> {
        into_result(self.issues(draft))
    }
}

/// 独立的凭据校验, 用于切换状态/删除前的确认
pub fn validate_credentials(credentials: &Credentials) -> Result<(), RuleError> {
    let instance = json!({
        "username": credentials.username,
        "password": credentials.password,
    });
    into_result(check_fields(&CREDENTIAL_FIELDS, &instance))
}

/// 编辑规则时只检查名称
pub fn validate_rule_name(name: &str) -> Result<(), RuleError> {
    into_result(check_fields(&DRAFT_FIELDS[..1], &json!({ "name": name })))
}

/// 澄清前的本地检查, 去除首尾空白后计算长度
pub fn validate_clarify_input(rule_definition: &str) -> Result<(), RuleError> {
    if rule_definition.trim().chars().count() < MIN_DEFINITION_LEN {
        return Err(RuleError::Validation(vec![ValidationIssue::new(
            "ruleDefinition",
            CLARIFY_TOO_SHORT,
        )]));
    }
    Ok(())
}

fn check_fields(fields: &[FieldRule], instance: &Value) -> Vec<ValidationIssue> {
    fields
        .iter()
        .filter(|rule| !rule.validator.is_valid(&instance[rule.field]))
        .map(|rule| ValidationIssue::new(rule.field, rule.message))
        .collect()
}

fn into_result(issues: Vec<ValidationIssue>) -> Result<(), RuleError> {
    if issues.is_empty() {
        Ok(())
    } else {
        Err(RuleError::Validation(issues))
    }
}
