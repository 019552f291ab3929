use super::Reducer;
use crate::components::ListOutcome;
use crate::types::Rule;

pub const STATUS_UPDATED_NOTICE: &str = "Rule status updated.";
pub const RULE_DELETED_NOTICE: &str = "Rule deleted.";
pub const RULE_UPDATED_NOTICE: &str = "Rule updated.";

/// 规则列表视图状态; 切换状态/删除/编辑都只作用于本地
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleBoardState {
    pub rules: Vec<Rule>,
    pub loading: bool,
    pub warning: Option<String>,
    pub notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoardAction {
    LoadStarted,
    Loaded(ListOutcome),
    RuleAdded(Rule),
    ToggleStatus(String),
    Delete(String),
    Edit {
        id: String,
        name: String,
        description: Option<String>,
    },
    DismissNotice,
}

impl RuleBoardState {
    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn active_count(&self) -> usize {
        self.rules.iter().filter(|r| r.is_active()).count()
    }
}

impl Reducer for RuleBoardState {
    type Action = BoardAction;

    fn reduce(mut self, action: BoardAction) -> Self {
        match action {
            BoardAction::LoadStarted => self.loading = true,
            BoardAction::Loaded(outcome) => {
                self.loading = false;
                self.rules = outcome.rules;
                self.warning = outcome.warning;
            }
            BoardAction::RuleAdded(rule) => {
                self.rules.retain(|r| r.id != rule.id);
                self.rules.insert(0, rule);
            }
            BoardAction::ToggleStatus(id) => {
                if let Some(rule) = self.rules.iter_mut().find(|r| r.id == id) {
                    rule.toggle_status();
                    self.notice = Some(STATUS_UPDATED_NOTICE.to_string());
                }
            }
            BoardAction::Delete(id) => {
                let before = self.rules.len();
                self.rules.retain(|r| r.id != id);
                if self.rules.len() != before {
                    self.notice = Some(RULE_DELETED_NOTICE.to_string());
                }
            }
            BoardAction::Edit {
                id,
                name,
                description,
            } => {
                if let Some(rule) = self.rules.iter_mut().find(|r| r.id == id) {
                    rule.name = name;
                    rule.description = description;
                    self.notice = Some(RULE_UPDATED_NOTICE.to_string());
                }
            }
            BoardAction::DismissNotice => self.notice = None,
        }
        self
    }
}
