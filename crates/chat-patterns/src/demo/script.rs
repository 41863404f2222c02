//! Fixed prompts and inputs used by the demonstration scenarios.

use std::collections::BTreeMap;

use crate::template::ChatPromptTemplate;

/// Everything the scenarios send, kept apart from the sequencing logic.
#[derive(Debug, Clone)]
pub struct DemoScript {
    /// Persona for the single-turn chat.
    pub chat_system: String,
    pub chat_user: String,
    pub template: ChatPromptTemplate,
    pub template_data: BTreeMap<String, String>,
    /// Seed message for the multi-turn conversation.
    pub conversation_system: String,
    /// Customer utterances, sent one per turn.
    pub customer_messages: Vec<String>,
    pub analyzer_system: String,
    pub inquiry: String,
}

impl Default for DemoScript {
    fn default() -> Self {
        let template = ChatPromptTemplate::new()
            .system(
                "
                You are a customer service agent for {company_name}.
                Your role is to {agent_role}.
                Always maintain a {tone} tone and provide {response_style} responses.
                ",
            )
            .user(
                "
                Customer inquiry: {customer_message}
                Customer context: {customer_context}
                Please provide an appropriate response.
                ",
            );

        let template_data = [
            ("company_name", "TechCorp Solutions"),
            ("agent_role", "help customers with technical issues"),
            ("tone", "professional and empathetic"),
            ("response_style", "clear and actionable"),
            (
                "customer_message",
                "My application keeps crashing when I try to save files.",
            ),
            (
                "customer_context",
                "Premium customer, using version 2.1.3 on Windows 11",
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            chat_system: "You are a helpful customer service assistant.".to_string(),
            chat_user: "Hello, I need help with my account.".to_string(),
            template,
            template_data,
            conversation_system: "You are a helpful customer service assistant. \
                Remember the context of our conversation."
                .to_string(),
            customer_messages: vec![
                "Hi, I'm having trouble with my account login.".to_string(),
                "I've tried resetting my password but it's not working.".to_string(),
                "What other options do I have to regain access?".to_string(),
            ],
            analyzer_system: ANALYZER_SYSTEM.to_string(),
            inquiry: "I'm really frustrated! My premium subscription was charged twice this \
                month and I can't get through to anyone for help. This is unacceptable!"
                .to_string(),
        }
    }
}

const ANALYZER_SYSTEM: &str = "You are a customer inquiry analyzer.
Analyze the customer message and respond with a JSON object containing:
- category: the type of inquiry (technical, billing, general, complaint)
- urgency: urgency level (low, medium, high, critical)
- sentiment: customer sentiment (positive, neutral, negative)
- confidence: your confidence in the analysis (0.0 to 1.0)

Respond only with valid JSON, no additional text. Do not wrap the response in a code block.";
