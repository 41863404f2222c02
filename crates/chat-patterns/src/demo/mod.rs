//! Demonstration scenarios driven against the configured providers.
//!
//! Every scenario has the same shape: check for providers, send a message
//! sequence, then hand the reply to the next step (report it, append it to a
//! conversation, or parse it). Provider failures are reported and never
//! abort the run.

mod report;
mod script;

use std::fmt;

use tracing::{debug, info, warn};

use crate::analysis::{self, ParseError, StructuredAnalysis};
use crate::conversation::ConversationState;
use crate::llm::{Message, ProviderRegistry};
use crate::template::PromptRenderer;

pub use report::{ConsoleReporter, ReportEntry, ReportSink, preview, render};
pub use script::DemoScript;

/// The four interaction patterns, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Scenario {
    /// One system + user exchange with every provider.
    BasicChat,
    /// Messages rendered from a template, sent to every provider.
    PromptTemplate,
    /// Multi-turn conversation with accumulated history.
    Conversation,
    /// JSON analysis of a customer inquiry.
    StructuredOutput,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::BasicChat,
        Scenario::PromptTemplate,
        Scenario::Conversation,
        Scenario::StructuredOutput,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Scenario::BasicChat => "Basic Chat",
            Scenario::PromptTemplate => "Prompt Template",
            Scenario::Conversation => "Conversation Memory",
            Scenario::StructuredOutput => "Structured Output",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Provider call counts for one scenario.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScenarioOutcome {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Nothing was sent, either for lack of providers or a failed render.
    pub skipped: bool,
}

impl ScenarioOutcome {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    fn success(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    fn failure(&mut self) {
        self.attempted += 1;
        self.failed += 1;
    }
}

/// Result of the multi-turn scenario, including the history it built.
#[derive(Debug, Clone)]
pub struct ConversationOutcome {
    pub outcome: ScenarioOutcome,
    pub state: ConversationState,
}

/// Result of the structured-output scenario.
#[derive(Debug, Clone)]
pub struct StructuredOutcome {
    pub outcome: ScenarioOutcome,
    /// Present only when the provider call itself succeeded.
    pub analysis: Option<Result<StructuredAnalysis, ParseError>>,
}

/// Per-scenario outcomes of a full run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// False when no provider was configured and nothing ran.
    pub configured: bool,
    pub scenarios: Vec<(Scenario, ScenarioOutcome)>,
}

impl RunSummary {
    pub fn total_failures(&self) -> usize {
        self.scenarios.iter().map(|(_, o)| o.failed).sum()
    }
}

/// Runs the demonstration scenarios over a provider registry.
pub struct DemoOrchestrator {
    registry: ProviderRegistry,
    script: DemoScript,
}

impl DemoOrchestrator {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self::with_script(registry, DemoScript::default())
    }

    pub fn with_script(registry: ProviderRegistry, script: DemoScript) -> Self {
        Self { registry, script }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Run the given scenarios in order.
    ///
    /// With an empty registry this reports once and runs nothing.
    pub async fn run(&self, scenarios: &[Scenario], sink: &mut dyn ReportSink) -> RunSummary {
        if self.registry.is_empty() {
            warn!("No LLM providers configured, skipping demonstration");
            sink.record(ReportEntry::NotConfigured);
            return RunSummary::default();
        }

        sink.record(ReportEntry::RunStarted {
            providers: self.registry.ids().into_iter().map(String::from).collect(),
        });

        let mut summary = RunSummary {
            configured: true,
            scenarios: Vec::with_capacity(scenarios.len()),
        };
        for &scenario in scenarios {
            let outcome = self.run_scenario(scenario, sink).await;
            info!(
                scenario = %scenario,
                succeeded = outcome.succeeded,
                failed = outcome.failed,
                "Scenario finished"
            );
            summary.scenarios.push((scenario, outcome));
        }

        sink.record(ReportEntry::Completed);
        summary
    }

    /// Run all four scenarios.
    pub async fn run_all(&self, sink: &mut dyn ReportSink) -> RunSummary {
        self.run(&Scenario::ALL, sink).await
    }

    pub async fn run_scenario(
        &self,
        scenario: Scenario,
        sink: &mut dyn ReportSink,
    ) -> ScenarioOutcome {
        match scenario {
            Scenario::BasicChat => self.basic_chat(sink).await,
            Scenario::PromptTemplate => self.prompt_template(sink).await,
            Scenario::Conversation => self.conversation(sink).await.outcome,
            Scenario::StructuredOutput => self.structured_output(sink).await.outcome,
        }
    }

    /// Send a persona + greeting pair to every provider.
    pub async fn basic_chat(&self, sink: &mut dyn ReportSink) -> ScenarioOutcome {
        if !self.begin(Scenario::BasicChat, sink) {
            return ScenarioOutcome::skipped();
        }

        let messages = [
            Message::system(self.script.chat_system.as_str()),
            Message::user(self.script.chat_user.as_str()),
        ];
        self.broadcast(Scenario::BasicChat, &messages, sink).await
    }

    /// Render the template, show the prompt, then send it to every provider.
    pub async fn prompt_template(&self, sink: &mut dyn ReportSink) -> ScenarioOutcome {
        if !self.begin(Scenario::PromptTemplate, sink) {
            return ScenarioOutcome::skipped();
        }

        let messages = match self.script.template.render(&self.script.template_data) {
            Ok(messages) => messages,
            Err(e) => {
                warn!(error = %e, "Prompt template render failed");
                sink.record(ReportEntry::Failure {
                    scenario: Scenario::PromptTemplate,
                    provider: None,
                    message: e.to_string(),
                });
                return ScenarioOutcome::skipped();
            }
        };

        for message in &messages {
            sink.record(ReportEntry::Prompt {
                role: message.role(),
                content: message.content().to_string(),
            });
        }

        self.broadcast(Scenario::PromptTemplate, &messages, sink).await
    }

    /// Hold a multi-turn conversation with the first provider.
    ///
    /// Each utterance is appended, the whole history is sent, and the reply is
    /// appended before the next turn. A failed turn ends the conversation
    /// because later turns would lack the missing reply as context.
    pub async fn conversation(&self, sink: &mut dyn ReportSink) -> ConversationOutcome {
        let mut state = ConversationState::with_system(self.script.conversation_system.as_str());

        if !self.begin(Scenario::Conversation, sink) {
            return ConversationOutcome {
                outcome: ScenarioOutcome::skipped(),
                state,
            };
        }
        let Some((provider, client)) = self.registry.first() else {
            return ConversationOutcome {
                outcome: ScenarioOutcome::skipped(),
                state,
            };
        };

        sink.record(ReportEntry::ProviderStarted {
            scenario: Scenario::Conversation,
            provider: provider.to_string(),
        });

        let mut outcome = ScenarioOutcome::default();
        for (i, utterance) in self.script.customer_messages.iter().enumerate() {
            sink.record(ReportEntry::Turn {
                index: i + 1,
                utterance: utterance.clone(),
            });
            state.append(Message::user(utterance.as_str()));

            debug!(provider, turn = i + 1, history = state.len(), "Sending turn");
            match client.send(state.messages()).await {
                Ok(reply) => {
                    outcome.success();
                    sink.record(ReportEntry::Response {
                        scenario: Scenario::Conversation,
                        provider: provider.to_string(),
                        content: reply.content().to_string(),
                    });
                    state.append(reply);
                }
                Err(e) => {
                    outcome.failure();
                    warn!(provider, turn = i + 1, error = %e, "Conversation turn failed");
                    sink.record(ReportEntry::Failure {
                        scenario: Scenario::Conversation,
                        provider: Some(provider.to_string()),
                        message: e.to_string(),
                    });
                    break;
                }
            }
        }

        ConversationOutcome { outcome, state }
    }

    /// Ask the first provider for a JSON analysis and validate it.
    pub async fn structured_output(&self, sink: &mut dyn ReportSink) -> StructuredOutcome {
        if !self.begin(Scenario::StructuredOutput, sink) {
            return StructuredOutcome {
                outcome: ScenarioOutcome::skipped(),
                analysis: None,
            };
        }
        let Some((provider, client)) = self.registry.first() else {
            return StructuredOutcome {
                outcome: ScenarioOutcome::skipped(),
                analysis: None,
            };
        };

        let messages = [
            Message::system(self.script.analyzer_system.as_str()),
            Message::user(self.script.inquiry.as_str()),
        ];

        let mut outcome = ScenarioOutcome::default();
        let reply = match client.send(&messages).await {
            Ok(reply) => reply,
            Err(e) => {
                outcome.failure();
                warn!(provider, error = %e, "Structured output request failed");
                sink.record(ReportEntry::Failure {
                    scenario: Scenario::StructuredOutput,
                    provider: Some(provider.to_string()),
                    message: e.to_string(),
                });
                return StructuredOutcome {
                    outcome,
                    analysis: None,
                };
            }
        };
        outcome.success();

        sink.record(ReportEntry::Response {
            scenario: Scenario::StructuredOutput,
            provider: provider.to_string(),
            content: reply.content().to_string(),
        });

        let parsed = analysis::parse(reply.content());
        match &parsed {
            Ok(analysis) => sink.record(ReportEntry::Parsed(*analysis)),
            Err(e) => {
                warn!(provider, kind = e.kind(), error = %e, "Structured output rejected");
                sink.record(ReportEntry::ParseFailed(e.clone()));
            }
        }

        StructuredOutcome {
            outcome,
            analysis: Some(parsed),
        }
    }

    /// Announce a scenario. Returns false when there is nothing to query.
    fn begin(&self, scenario: Scenario, sink: &mut dyn ReportSink) -> bool {
        sink.record(ReportEntry::ScenarioStarted(scenario));
        if self.registry.is_empty() {
            sink.record(ReportEntry::NoProviders);
            return false;
        }
        true
    }

    /// Send the same messages to each provider in registry order.
    async fn broadcast(
        &self,
        scenario: Scenario,
        messages: &[Message],
        sink: &mut dyn ReportSink,
    ) -> ScenarioOutcome {
        let mut outcome = ScenarioOutcome::default();

        for (provider, client) in self.registry.iter() {
            sink.record(ReportEntry::ProviderStarted {
                scenario,
                provider: provider.to_string(),
            });

            debug!(provider, scenario = %scenario, "Dispatching request");
            match client.send(messages).await {
                Ok(reply) => {
                    outcome.success();
                    sink.record(ReportEntry::Response {
                        scenario,
                        provider: provider.to_string(),
                        content: reply.content().to_string(),
                    });
                }
                Err(e) => {
                    outcome.failure();
                    warn!(provider, scenario = %scenario, error = %e, "Provider call failed");
                    sink.record(ReportEntry::Failure {
                        scenario,
                        provider: Some(provider.to_string()),
                        message: e.to_string(),
                    });
                }
            }
        }

        outcome
    }
}
