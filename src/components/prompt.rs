//! 发送给补全服务的提示词模板

pub const CLARIFY_SYSTEM_PROMPT: &str = "You are an AI assistant that helps to clarify ambiguous rule definitions.

The user will provide a rule definition in natural language. Your task is to identify any ambiguities in the rule definition and clarify them by rephrasing the rule in a more precise and unambiguous way.

Respond with a single JSON object of the form {\"clarifiedRule\": \"<the clarified rule>\"} and nothing else.";

pub const EXECUTE_SYSTEM_PROMPT: &str = "You are an expert rule execution engine. A user wants to apply a business rule to some data.
Evaluate the data against the rule and provide the outcome and a brief explanation.
Be concise in your reasoning.

For example, if the rule is \"Free Shipping\" for orders over $50 and the input is { \"orderTotal\": 60 }, the outcome should be \"Free Shipping Applied\" and the reasoning \"The order total of $60 exceeds the $50 threshold for free shipping.\"

Respond with a single JSON object of the form {\"outcome\": \"<result>\", \"reasoning\": \"<explanation>\"} and nothing else.";

pub fn clarify_user_message(rule_definition: &str) -> String {
    format!("Rule Definition: {}", rule_definition.trim())
}

/// 输入数据按原文嵌入, 不做重新序列化
pub fn execute_user_message(rule_name: &str, input_json: &str) -> String {
    let mut out = String::with_capacity(input_json.len() + rule_name.len() + 64);
    out.push_str("Rule to apply: \"");
    out.push_str(rule_name.trim());
    out.push_str("\"\n\nInput Data (JSON):\n```json\n");
    out.push_str(input_json);
    out.push_str("\n```\n\nBased on the rule and the data, determine the result.");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_message_embeds_payload_verbatim() {
        let payload = "{ \"orderTotal\" : 60,\n  \"tier\":\"gold\" }";
        let msg = execute_user_message(" Free Shipping ", payload);
        assert!(msg.contains(payload));
        assert!(msg.starts_with("Rule to apply: \"Free Shipping\""));
    }
}
