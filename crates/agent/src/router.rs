//! The query router: one routing cycle per user query.
//!
//! Each cycle makes a routing call to the model, then either:
//! 1. passes the model's direct answer through,
//! 2. runs the requested tool and streams the model's explanation of the
//!    result, or
//! 3. answers from general knowledge when the requested tool is unknown.
//!
//! At most two model calls are made per query. Every failure is turned
//! into events; nothing escapes the stream.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::{FutureExt, Stream, StreamExt};
use parley_config::AppConfig;
use parley_core::error::ProviderError;
use parley_core::message::{Message, Role};
use parley_core::provider::{Provider, ProviderRequest, collect_stream};
use parley_core::tool::{ToolRegistry, ToolResult};
use parley_memory::ConversationLedger;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::events::{Route, RouterEvent};
use crate::extract::extract_tool_call;
use crate::prompts::{GENERAL_KNOWLEDGE_PROMPT, build_result_prompt, build_routing_prompt};

/// Shown to the user when a model call fails. Details go to the log.
pub const APOLOGY: &str =
    "I'm sorry, I ran into a problem while working on that. Please try again in a moment.";

/// Sampling settings applied to every model call.
#[derive(Debug, Clone, PartialEq)]
pub struct RouterSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl RouterSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// The indicator shown before a tool runs. Not recorded in the ledger.
pub fn tool_indicator(tool_name: &str) -> String {
    format!("I'll check that for you using {tool_name}...\n\n")
}

/// The notice shown when the model asks for a tool that is not registered.
pub fn unknown_tool_notice(tool_name: &str) -> String {
    format!(
        "I attempted to use a tool called '{tool_name}', but it's not available. \
         Let me answer based on what I know.\n\n"
    )
}

/// Routes user queries between the model and the tool registry.
pub struct QueryRouter {
    provider: Arc<dyn Provider>,
    tools: ToolRegistry,
    ledger: ConversationLedger,
    settings: RouterSettings,
    session_id: Uuid,
}

impl QueryRouter {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: ToolRegistry,
        ledger: ConversationLedger,
        settings: RouterSettings,
    ) -> Self {
        let session_id = Uuid::new_v4();
        info!(
            session = %session_id,
            provider = provider.name(),
            tools = ?tools.names(),
            max_turns = ledger.max_turns(),
            "Query router ready"
        );
        Self {
            provider,
            tools,
            ledger,
            settings,
            session_id,
        }
    }

    /// Read-only view of the conversation so far.
    pub fn ledger(&self) -> &ConversationLedger {
        &self.ledger
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Forget the conversation. A pinned system turn is kept.
    pub fn reset(&mut self) {
        self.ledger.reset();
        info!(session = %self.session_id, "Conversation reset");
    }

    /// Answer `query`, yielding only the text meant for the user.
    pub fn process_query<'a>(&'a mut self, query: &'a str) -> impl Stream<Item = String> + 'a {
        self.process_query_events(query)
            .filter_map(|event| futures::future::ready(event.text().map(str::to_string)))
    }

    /// Answer `query`, yielding every event of the routing cycle.
    ///
    /// The stream always ends with `RouterEvent::Done`. Dropping it early
    /// abandons the in-flight call; no partial assistant turn is recorded.
    pub fn process_query_events<'a>(
        &'a mut self,
        query: &'a str,
    ) -> impl Stream<Item = RouterEvent> + 'a {
        let this = self;

        async_stream::stream! {
            let started = Instant::now();
            let session = this.session_id;

            let mut routing_messages = vec![Message::system(build_routing_prompt(
                &this.tools.descriptors(),
            ))];
            routing_messages.extend(this.conversation_context());
            routing_messages.push(Message::user(query));
            this.ledger.append_user(query);

            debug!(
                session = %session,
                messages = routing_messages.len(),
                prompt_chars = routing_messages.iter().map(|m| m.content.len()).sum::<usize>(),
                "Routing call"
            );

            let routing_reply = match this.call_model(routing_messages).await {
                Ok(text) => text,
                Err(e) => {
                    error!(session = %session, error = ?e, "Routing call failed");
                    yield RouterEvent::Error { message: APOLOGY.to_string() };
                    yield RouterEvent::Done { route: Route::Failed };
                    return;
                }
            };

            let intent = extract_tool_call(&routing_reply).filter(|intent| intent.use_tool);

            let Some(intent) = intent else {
                info!(session = %session, route = "direct", "Answering directly");
                this.ledger.append_assistant(routing_reply.as_str());
                yield RouterEvent::Chunk { content: routing_reply };
                yield RouterEvent::Done { route: Route::Direct };
                return;
            };

            let tool_name = intent.tool_name;
            let (answer_messages, route) = if this.tools.contains(&tool_name) {
                info!(session = %session, route = "tool", tool = %tool_name, "Using tool");
                yield RouterEvent::Notice { content: tool_indicator(&tool_name) };

                let parameters = serde_json::Value::Object(intent.tool_parameters.clone());
                yield RouterEvent::ToolCall {
                    name: tool_name.clone(),
                    parameters: parameters.clone(),
                };

                let result = this.invoke_contained(&tool_name, intent.tool_parameters).await;
                let payload = result.to_payload();
                debug!(session = %session, tool = %tool_name, payload = %payload, "Tool finished");

                this.ledger.append_tool(tool_name.as_str(), &payload);
                yield RouterEvent::ToolResult {
                    name: tool_name.clone(),
                    success: result.is_success(),
                    payload: payload.clone(),
                };

                let prompt = build_result_prompt(&tool_name, &payload, query);
                (vec![Message::user(prompt)], Route::Tool)
            } else {
                warn!(session = %session, tool = %tool_name, "Model asked for an unknown tool");
                yield RouterEvent::Notice { content: unknown_tool_notice(&tool_name) };
                (
                    vec![Message::system(GENERAL_KNOWLEDGE_PROMPT), Message::user(query)],
                    Route::Fallback,
                )
            };

            let mut rx = match this.provider.stream(this.request(answer_messages)).await {
                Ok(rx) => rx,
                Err(e) => {
                    error!(session = %session, route = ?route, error = ?e, "Answer call failed");
                    yield RouterEvent::Error { message: APOLOGY.to_string() };
                    yield RouterEvent::Done { route: Route::Failed };
                    return;
                }
            };

            let mut answer = String::new();
            loop {
                match rx.recv().await {
                    Some(Ok(chunk)) => {
                        let done = chunk.done;
                        if let Some(content) = chunk.content.filter(|c| !c.is_empty()) {
                            answer.push_str(&content);
                            yield RouterEvent::Chunk { content };
                        }
                        if done {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        error!(session = %session, route = ?route, error = ?e, "Answer stream failed");
                        yield RouterEvent::Error { message: APOLOGY.to_string() };
                        yield RouterEvent::Done { route: Route::Failed };
                        return;
                    }
                    None => {
                        error!(session = %session, route = ?route, "Answer stream closed early");
                        yield RouterEvent::Error { message: APOLOGY.to_string() };
                        yield RouterEvent::Done { route: Route::Failed };
                        return;
                    }
                }
            }

            this.ledger.append_assistant(answer);
            info!(
                session = %session,
                route = ?route,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Query answered"
            );
            yield RouterEvent::Done { route };
        }
    }

    /// Prior user and assistant turns, oldest first.
    fn conversation_context(&self) -> Vec<Message> {
        self.ledger
            .snapshot()
            .into_iter()
            .filter(|turn| matches!(turn.role, Role::User | Role::Assistant))
            .map(|turn| Message::new(turn.role, turn.content))
            .collect()
    }

    fn request(&self, messages: Vec<Message>) -> ProviderRequest {
        ProviderRequest {
            model: self.settings.model.clone(),
            messages,
            temperature: self.settings.temperature,
            max_tokens: Some(self.settings.max_tokens),
            stream: true,
        }
    }

    /// Stream a model call to completion and return the whole text.
    async fn call_model(&self, messages: Vec<Message>) -> Result<String, ProviderError> {
        let rx = self.provider.stream(self.request(messages)).await?;
        collect_stream(rx).await
    }

    /// Run a registered tool, turning a panic into a failure payload.
    async fn invoke_contained(
        &self,
        tool_name: &str,
        parameters: parley_core::tool::ToolParameters,
    ) -> ToolResult {
        match AssertUnwindSafe(self.tools.invoke(tool_name, parameters))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(
                    session = %self.session_id,
                    tool = tool_name,
                    panic = %message,
                    "Tool panicked"
                );
                ToolResult::failure(format!("Error executing tool {tool_name}: {message}"), message)
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
