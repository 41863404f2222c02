//! Scenario progress reporting.

use crate::analysis::{ParseError, StructuredAnalysis};
use crate::llm::Role;

use super::Scenario;

/// One observable step of a demonstration run.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEntry {
    RunStarted { providers: Vec<String> },
    ScenarioStarted(Scenario),
    /// No credentials were found, so the run was skipped.
    NotConfigured,
    /// A scenario was asked to run with no provider, so nothing was sent.
    NoProviders,
    ProviderStarted { scenario: Scenario, provider: String },
    /// A rendered prompt message, shown before it is sent.
    Prompt { role: Role, content: String },
    Response { scenario: Scenario, provider: String, content: String },
    Turn { index: usize, utterance: String },
    Failure {
        scenario: Scenario,
        provider: Option<String>,
        message: String,
    },
    Parsed(StructuredAnalysis),
    ParseFailed(ParseError),
    Completed,
}

/// Destination for report entries.
pub trait ReportSink {
    fn record(&mut self, entry: ReportEntry);
}

impl ReportSink for Vec<ReportEntry> {
    fn record(&mut self, entry: ReportEntry) {
        self.push(entry);
    }
}

/// Prints entries to stdout as they arrive.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ReportSink for ConsoleReporter {
    fn record(&mut self, entry: ReportEntry) {
        println!("{}", render(&entry));
    }
}

const PROMPT_PREVIEW_CHARS: usize = 150;
const CHAT_PREVIEW_CHARS: usize = 200;
const TEMPLATE_PREVIEW_CHARS: usize = 300;

/// Human-readable form of an entry.
pub fn render(entry: &ReportEntry) -> String {
    match entry {
        ReportEntry::RunStarted { providers } => format!(
            "LLM Interaction Patterns Demonstration\n{}\nProviders: {}",
            "=".repeat(50),
            providers.join(", ")
        ),
        ReportEntry::ScenarioStarted(scenario) => {
            format!("\n{} Demonstration\n{}", scenario.title(), "=".repeat(40))
        }
        ReportEntry::NotConfigured => "No LLM providers configured. Set OPENAI_API_KEY or \
                                       ANTHROPIC_API_KEY (a .env file in the working \
                                       directory also works)."
            .to_string(),
        ReportEntry::NoProviders => "No models available for demonstration.".to_string(),
        ReportEntry::ProviderStarted { provider, .. } => {
            format!("\nTesting {provider} provider:")
        }
        ReportEntry::Prompt { role, content } => {
            format!("{role}: {}", preview(content, PROMPT_PREVIEW_CHARS))
        }
        ReportEntry::Response {
            scenario, content, ..
        } => match scenario {
            Scenario::BasicChat => format!("Response: {}", preview(content, CHAT_PREVIEW_CHARS)),
            Scenario::PromptTemplate => {
                format!("Response: {}", preview(content, TEMPLATE_PREVIEW_CHARS))
            }
            Scenario::Conversation => {
                format!("Assistant: {}", preview(content, CHAT_PREVIEW_CHARS))
            }
            Scenario::StructuredOutput => format!("Structured analysis:\n{content}"),
        },
        ReportEntry::Turn { index, utterance } => {
            format!("\nTurn {index}:\nCustomer: {utterance}")
        }
        ReportEntry::Failure {
            scenario,
            provider,
            message,
        } => match provider {
            Some(provider) => format!("[error] {} ({provider}): {message}", scenario.title()),
            None => format!("[error] {}: {message}", scenario.title()),
        },
        ReportEntry::Parsed(analysis) => format!(
            "\nParsed analysis:\n  category: {}\n  urgency: {}\n  sentiment: {}\n  confidence: {}",
            analysis.category, analysis.urgency, analysis.sentiment, analysis.confidence
        ),
        ReportEntry::ParseFailed(err) => {
            format!("[warning] response is not a valid analysis ({}): {err}", err.kind())
        }
        ReportEntry::Completed => "\nDemonstration complete.".to_string(),
    }
}

/// First `max_chars` characters of `text`, with `...` appended when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
