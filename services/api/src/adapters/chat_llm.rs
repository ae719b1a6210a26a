//! services/api/src/adapters/chat_llm.rs
//!
//! This module contains the adapter for the AI assistant.
//! It implements the `ChatAssistant` port from the `core` crate using an
//! OpenAI-compatible chat-completion service.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use campus_portal_core::domain::{ChatTurn, Role, Speaker};
use campus_portal_core::ports::{ChatAssistant, PortError, PortResult};

const STUDENT_SYSTEM_PROMPT: &str = "You are the campus assistant for the university \
management portal. You help students raise tickets for hostel, mess, cleanliness, repair, \
and academic issues; request outing, leave, and special permissions; find and understand \
announcements; and navigate the portal. Be friendly and concise, and give step-by-step \
instructions when explaining a process.";

const STAFF_SYSTEM_PROMPT: &str = "You are the campus assistant for the university \
management portal. You help faculty and administrators review, assign, and resolve student \
tickets; manage permission requests; create and organize announcements; and interpret the \
portal's analytics. Be professional and efficient, and give clear instructions for \
administrative tasks.";

/// Selects the assistant persona for the caller's role.
fn system_prompt_for(role: Role) -> &'static str {
    match role {
        Role::Student => STUDENT_SYSTEM_PROMPT,
        Role::Faculty | Role::Admin => STAFF_SYSTEM_PROMPT,
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ChatAssistant` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiChatAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiChatAdapter {
    /// Creates a new `OpenAiChatAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `ChatAssistant` Trait Implementation
//=========================================================================================

#[async_trait]
impl ChatAssistant for OpenAiChatAdapter {
    /// Sends one user message, with the prior conversation, to the
    /// completion service. Failures are returned to the caller; the
    /// conversation itself is never touched here, so the user can retry the
    /// same message manually.
    async fn complete(
        &self,
        role: Role,
        history: &[ChatTurn],
        message: &str,
    ) -> PortResult<String> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(history.len() + 2);

        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt_for(role))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        );

        for turn in history {
            let msg = match turn.speaker {
                Speaker::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(turn.text.clone())
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .into(),
                Speaker::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(turn.text.clone())
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .into(),
            };
            messages.push(msg);
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(message)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_tokens(500u32)
            .temperature(0.7)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        // Extract the text content from the first choice in the response.
        if let Some(choice) = response.choices.into_iter().next() {
            if let Some(content) = choice.message.content {
                Ok(content)
            } else {
                Err(PortError::Unexpected(
                    "Chat completion response contained no text content.".to_string(),
                ))
            }
        } else {
            Err(PortError::Unexpected(
                "Chat completion returned no choices in its response.".to_string(),
            ))
        }
    }
}
