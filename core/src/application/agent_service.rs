// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent orchestrator.
//!
//! Turns natural-language queries into either direct answers or calls into
//! the review usecases, with role-based gating on every tool invocation.
//! The LLM is steered toward a single JSON object per turn; anything it
//! emits outside that contract is treated as a verbatim final answer
//! rather than an error. Tool results are re-fed to the LLM for a
//! natural-language summary, falling back to the raw JSON when that step
//! fails.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::application::listing_service::{ListTarget, ListingService};
use crate::application::review_service::ReviewService;
use crate::application::session_memory::{prompt_window, ChatMessage, ChatRole, SessionMemory};
use crate::domain::error::ServiceError;
use crate::domain::llm::LlmProvider;
use crate::domain::principal::{Principal, Role};

/// Window used by every listing tool: the first ten hits.
const TOOL_PAGE_FROM: u32 = 0;
const TOOL_PAGE_SIZE: u32 = 10;

/// One decoded orchestration turn.
#[derive(Debug, Clone, Serialize)]
pub struct AgentReply {
    pub thought: String,
    pub tool_call: Option<ToolCallRequest>,
    pub final_answer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub tool_name: String,
    /// Argument JSON, encoded as a string by the model.
    pub arguments: String,
}

#[derive(Deserialize)]
struct LlmTurn {
    #[serde(default)]
    thought: String,
    #[serde(default)]
    tool_call: Option<ToolCallRequest>,
    #[serde(default)]
    final_answer: Option<String>,
}

#[derive(Deserialize)]
struct GetReviewArgs {
    #[serde(rename = "reviewID")]
    review_id: String,
}

#[derive(Deserialize)]
struct ListReviewByStoreArgs {
    #[serde(rename = "storeID")]
    store_id: String,
}

pub struct AgentService {
    llm: Arc<dyn LlmProvider>,
    reviews: Arc<ReviewService>,
    listings: Arc<ListingService>,
    memory: SessionMemory,
}

impl AgentService {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        reviews: Arc<ReviewService>,
        listings: Arc<ListingService>,
    ) -> Self {
        Self {
            llm,
            reviews,
            listings,
            memory: SessionMemory::new(),
        }
    }

    /// One orchestration turn: compose the prompt from the session tail
    /// and the role's tool menu, then decode the model's decision.
    pub async fn process(
        &self,
        principal: Option<&Principal>,
        session_id: &str,
        query: &str,
    ) -> Result<AgentReply, ServiceError> {
        info!(session_id, query, "agent processing query");

        let tools = match principal {
            Some(p) => tool_catalog_for(Some(p.role)),
            None => {
                warn!("no principal on agent query, offering no tools");
                tool_catalog_for(None)
            }
        };

        let history = self.memory.history(session_id);
        let prompt = build_prompt(&tools, &history, query);

        let completion = self.llm.complete(&prompt).await?;
        let reply = parse_llm_reply(&completion);

        if let Some(answer) = &reply.final_answer {
            self.memory.append(session_id, ChatMessage::user(query));
            self.memory.append(session_id, ChatMessage::assistant(answer.clone()));
        }
        Ok(reply)
    }

    /// Execute one tool under RBAC and summarize its result for the user.
    pub async fn call_tool(
        &self,
        principal: Option<&Principal>,
        tool_name: &str,
        arguments: &str,
        original_query: &str,
    ) -> Result<String, ServiceError> {
        info!(tool_name, arguments, "agent tool call");

        let principal = principal
            .ok_or_else(|| ServiceError::Forbidden("tool calls require a signed-in user".into()))?;

        let raw_result: Value = match tool_name {
            "GetReview" => {
                let args: GetReviewArgs = serde_json::from_str(arguments).map_err(|_| {
                    ServiceError::InvalidArguments("cannot parse GetReview arguments".into())
                })?;
                let review_id: i64 = args.review_id.parse().map_err(|_| {
                    ServiceError::InvalidArguments("reviewID must be a valid number".into())
                })?;
                let review = self.reviews.get_review(review_id).await?;
                to_json(&review)?
            }

            "ListReviewByStoreID" => {
                let args: ListReviewByStoreArgs =
                    serde_json::from_str(arguments).map_err(|_| {
                        ServiceError::InvalidArguments(
                            "cannot parse ListReviewByStoreID arguments".into(),
                        )
                    })?;
                let store_id: i64 = args.store_id.parse().map_err(|_| {
                    ServiceError::InvalidArguments("storeID must be a valid number".into())
                })?;

                // Merchants may only look at their own store.
                if principal.role == Role::Merchant && !principal.owns_store(store_id) {
                    return Err(ServiceError::Forbidden(
                        "a merchant can only list reviews of its own store".into(),
                    ));
                }

                let list = self
                    .listings
                    .list_by(ListTarget::Store, store_id, TOOL_PAGE_FROM, TOOL_PAGE_SIZE)
                    .await?;
                to_json(&list)?
            }

            "ListMyReviews" => {
                if principal.role != Role::Customer {
                    return Err(ServiceError::Forbidden(
                        "only customers can list their own reviews".into(),
                    ));
                }
                let list = self
                    .listings
                    .list_by(
                        ListTarget::User,
                        principal.user_id,
                        TOOL_PAGE_FROM,
                        TOOL_PAGE_SIZE,
                    )
                    .await?;
                to_json(&list)?
            }

            other => return Err(ServiceError::ToolNotFound(other.to_string())),
        };

        Ok(self.summarize(original_query, &raw_result).await)
    }

    /// Re-enter the LLM to phrase the tool result; the raw JSON is the
    /// fallback, so a summarization failure never fails the call.
    async fn summarize(&self, original_query: &str, result: &Value) -> String {
        let payload = result.to_string();
        let prompt = build_summary_prompt(original_query, &payload);

        match self.llm.complete(&prompt).await {
            Ok(summary) => summary,
            Err(err) => {
                error!(%err, "tool result summarization failed, returning raw JSON");
                payload
            }
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, ServiceError> {
    serde_json::to_value(value)
        .map_err(|e| ServiceError::Internal(format!("failed to encode tool result: {e}")))
}

/// The JSON tool catalog offered to the model, selected by role. Roles
/// outside the three known ones see an empty catalog.
fn tool_catalog_for(role: Option<Role>) -> String {
    const GET_REVIEW: &str = r#"{
        "name": "GetReview",
        "description": "根据评论ID获取单条评论的详细信息。",
        "parameters": { "type": "object", "properties": { "reviewID": { "type": "string", "description": "评论的唯一ID" } }, "required": ["reviewID"] }
    }"#;
    const LIST_BY_STORE: &str = r#"{
        "name": "ListReviewByStoreID",
        "description": "根据店铺ID查询该店铺的评论列表。商家只能查询自己店铺的评论。",
        "parameters": { "type": "object", "properties": { "storeID": { "type": "string", "description": "店铺的唯一ID" } }, "required": ["storeID"] }
    }"#;
    const LIST_MINE: &str = r#"{
        "name": "ListMyReviews",
        "description": "查询我（当前登录用户）自己发布过的所有评论列表，不需要提供任何参数。",
        "parameters": { "type": "object", "properties": {} }
    }"#;

    let tools: Vec<&str> = match role {
        Some(Role::Customer) => vec![GET_REVIEW, LIST_BY_STORE, LIST_MINE],
        Some(Role::Merchant) | Some(Role::Reviewer) => vec![GET_REVIEW, LIST_BY_STORE],
        None => vec![],
    };

    format!("[{}]", tools.join(","))
}

/// Compose the orchestration prompt: persona, rules, the session tail,
/// the tool catalog and the strict two-shape output contract.
fn build_prompt(tools: &str, history: &[ChatMessage], query: &str) -> String {
    let mut history_lines: Vec<String> = Vec::new();
    for message in prompt_window(history) {
        let prefix = match message.role {
            ChatRole::User => "[用户]",
            ChatRole::Assistant => "[Critiq]",
        };
        history_lines.push(format!("{} {}", prefix, message.text));
    }
    let joined_history = if history_lines.is_empty() {
        "(无历史对话)".to_string()
    } else {
        history_lines.join("\n")
    };

    format!(
        r#"
你是一个强大的人工智能助手，你的名字叫 Critiq。你的任务是帮助用户与评论系统进行交互。
你必须遵循以下规则：
1. 结合对话上下文回答问题；若需要数据请调用工具。
2. 如果你需要使用工具，你必须在思考(thought)后，从下面提供的可用工具列表中选择一个，并生成一个符合该工具参数格式的JSON对象。
3. 你的输出必须是一个单一的、可被解析的JSON对象，不得包含任何JSON以外的额外文本、解释或注释。
4. 如果用户的意图不明确或缺少必要信息，你应该直接回答，向用户提问以获取更多信息。
5. 如果用户的查询与评论系统无关，你应该直接回答。

对话历史：
{joined_history}

可用工具列表:
{tools}

用户的查询: "{query}"

请严格按照以下格式输出JSON：
{{
  "thought": "这里是你的思考过程...",
  "tool_call": {{ "tool_name": "...", "arguments": "{{...}}" }}
}}
或者
{{
  "thought": "这里是你的思考过程...",
  "final_answer": "你的直接回答内容。"
}}

现在，请处理用户的查询。
"#
    )
}

fn build_summary_prompt(original_query: &str, result_json: &str) -> String {
    format!(
        r#"
你是一个乐于助人的AI助手Critiq。一个工具已经运行完毕，并返回了以下的JSON数据。
你的任务是根据用户的“原始问题”，从这些JSON数据中提取用户最关心的信息，并组织成一段清晰、友好、易于理解的自然语言回复。
不要杜撰JSON中不存在的信息。直接呈现核心信息即可,优先使用分点作答的格式。

用户的原始问题: "{original_query}"

工具返回的JSON数据:
{result_json}

请根据用户的原始问题，生成你的自然语言回复。
"#
    )
}

/// Decode the model output with tolerant preprocessing: trim whitespace
/// and code-fence backticks, drop a leading `json` label, then parse.
/// Non-JSON output becomes a verbatim final answer.
pub fn parse_llm_reply(raw: &str) -> AgentReply {
    let mut sanitized = raw.trim_matches(|c: char| c.is_whitespace() || c == '`');
    if let Some(rest) = sanitized.strip_prefix("json") {
        sanitized = rest;
    }
    let sanitized = sanitized.trim();

    match serde_json::from_str::<LlmTurn>(sanitized) {
        Ok(turn) => AgentReply {
            thought: turn.thought,
            tool_call: turn.tool_call,
            final_answer: turn.final_answer,
        },
        Err(_) => AgentReply {
            thought: "LLM returned a non-JSON response, treating as a final answer.".to_string(),
            tool_call: None,
            final_answer: Some(raw.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_json_is_unwrapped() {
        let raw = "```json\n{\"thought\": \"t\", \"final_answer\": \"hello\"}\n```";
        let reply = parse_llm_reply(raw);
        assert_eq!(reply.thought, "t");
        assert_eq!(reply.final_answer.as_deref(), Some("hello"));
        assert!(reply.tool_call.is_none());
    }

    #[test]
    fn tool_call_shape_is_decoded() {
        let raw = r#"{"thought": "need data", "tool_call": {"tool_name": "GetReview", "arguments": "{\"reviewID\": \"7\"}"}}"#;
        let reply = parse_llm_reply(raw);
        let call = reply.tool_call.unwrap();
        assert_eq!(call.tool_name, "GetReview");
        assert!(call.arguments.contains("reviewID"));
        assert!(reply.final_answer.is_none());
    }

    #[test]
    fn non_json_output_is_a_verbatim_final_answer() {
        let raw = "抱歉，我不明白你的问题。";
        let reply = parse_llm_reply(raw);
        assert_eq!(reply.final_answer.as_deref(), Some(raw));
        assert!(reply.tool_call.is_none());
    }

    #[test]
    fn catalogs_follow_roles() {
        let customer = tool_catalog_for(Some(Role::Customer));
        assert!(customer.contains("GetReview"));
        assert!(customer.contains("ListReviewByStoreID"));
        assert!(customer.contains("ListMyReviews"));

        let merchant = tool_catalog_for(Some(Role::Merchant));
        assert!(merchant.contains("ListReviewByStoreID"));
        assert!(!merchant.contains("ListMyReviews"));

        assert_eq!(tool_catalog_for(None), "[]");
    }

    #[test]
    fn prompt_includes_history_tail_and_catalog() {
        let history = vec![
            ChatMessage::user("first"),
            ChatMessage::assistant("second"),
        ];
        let prompt = build_prompt("[]", &history, "what now?");
        assert!(prompt.contains("[用户] first"));
        assert!(prompt.contains("[Critiq] second"));
        assert!(prompt.contains("what now?"));

        let empty = build_prompt("[]", &[], "q");
        assert!(empty.contains("(无历史对话)"));
    }
}
