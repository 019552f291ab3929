use super::Reducer;
use crate::types::{Credentials, Rule, RuleDefinitionDraft, ValidationIssue};

pub const CREATE_SUCCESS_MESSAGE: &str = "Rule created successfully!";

/// 新建规则表单的状态
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleFormState {
    pub draft: RuleDefinitionDraft,
    pub clarifying: bool,
    pub submitting: bool,
    pub clarify_error: Option<String>,
    pub message: Option<String>,
    pub issues: Vec<ValidationIssue>,
    pub created: Option<Rule>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormAction {
    SetName(String),
    SetDescription(Option<String>),
    SetDefinition(String),
    SetCredentials(Credentials),
    ClarifyStarted,
    ClarifySucceeded(String),
    ClarifyFailed(String),
    AcceptClarification,
    DismissClarification,
    SubmitStarted,
    SubmitSucceeded(Rule),
    SubmitFailed {
        message: String,
        issues: Vec<ValidationIssue>,
    },
    Reset,
}

impl RuleFormState {
    pub fn busy(&self) -> bool {
        self.clarifying || self.submitting
    }

    pub fn has_clarification(&self) -> bool {
        self.draft
            .clarified_rule
            .as_deref()
            .is_some_and(|c| !c.is_empty())
    }
}

impl Reducer for RuleFormState {
    type Action = FormAction;

    fn reduce(mut self, action: FormAction) -> Self {
        match action {
            FormAction::SetName(name) => self.draft.name = name,
            FormAction::SetDescription(description) => self.draft.description = description,
            FormAction::SetDefinition(definition) => self.draft.rule_definition = definition,
            FormAction::SetCredentials(credentials) => {
                self.draft = self.draft.with_credentials(&credentials);
            }
            FormAction::ClarifyStarted => {
                self.clarifying = true;
                self.clarify_error = None;
            }
            FormAction::ClarifySucceeded(clarified) => {
                self.clarifying = false;
                self.draft.clarified_rule = Some(clarified);
            }
            FormAction::ClarifyFailed(error) => {
                self.clarifying = false;
                self.clarify_error = Some(error);
            }
            FormAction::AcceptClarification => {
                if let Some(clarified) = self.draft.clarified_rule.take() {
                    self.draft.rule_definition = clarified;
                }
            }
            FormAction::DismissClarification => self.draft.clarified_rule = None,
            FormAction::SubmitStarted => {
                self.submitting = true;
                self.message = None;
                self.issues.clear();
                self.created = None;
            }
            FormAction::SubmitSucceeded(rule) => {
                // 成功后清空表单
                return RuleFormState {
                    message: Some(CREATE_SUCCESS_MESSAGE.to_string()),
                    created: Some(rule),
                    ..Default::default()
                };
            }
            FormAction::SubmitFailed { message, issues } => {
                self.submitting = false;
                self.message = Some(message);
                self.issues = issues;
            }
            FormAction::Reset => return RuleFormState::default(),
        }
        self
    }
}
