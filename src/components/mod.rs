mod clarify;
mod completion;
mod crud;
mod execute;
mod prompt;
mod rest_client;
mod rules_api;
mod validation;

pub use clarify::ClarificationClient;
pub use completion::{parse_structured, CompletionBackend, DynCompletionBackend, HttpCompletionBackend};
pub use crud::{
    create_error_message, prompts_error_message, ListOutcome, RuleCrudClient, LIST_FAILED_WARNING,
    PROMPTS_FAILED_MESSAGE,
};
pub use execute::{
    apply_error_message, clean_scenario, validate_execute_input, ApplyRuleClient, ExecuteRequest,
    ExecuteResult, RuleExecutor,
};
pub use prompt::{CLARIFY_SYSTEM_PROMPT, EXECUTE_SYSTEM_PROMPT};
pub use rest_client::RestClient;
pub use rules_api::{DynRulesApi, HttpRulesApi, RulesApi, APPLY_PATH, RULES_PATH};
pub use validation::{
    validate_clarify_input, validate_credentials, validate_rule_name, RuleSchema, CLARIFY_TOO_SHORT,
    DEFINITION_TOO_SHORT, NAME_TOO_SHORT, PASSWORD_REQUIRED, USERNAME_REQUIRED,
};
