// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! LLM-backed text moderation.
//!
//! The classifier prompt pins the model to a one-of-two reply: the single
//! character `是` (approved), or `否：<reason>` (rejected). Anything else
//! is an indeterminate verdict, surfaced as an error so the audit path can
//! leave the review pending.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::llm::LlmProvider;
use crate::domain::moderation::{ModerationError, Moderator, Verdict};

const APPROVED_REASON: &str = "Content approved by AI.";
const REJECTED_FALLBACK_REASON: &str = "内容不当，但未提供具体理由。";

pub struct ModerationClient {
    llm: Arc<dyn LlmProvider>,
}

impl ModerationClient {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    fn build_prompt(text: &str) -> String {
        format!(
            r#"你是一个严格的内容审核员。你的任务是判断给定的评论是否包含不当内容。

不当内容主要分为以下几类：
- 辱骂：包含人身攻击、侮辱性言论或粗俗语言。
- 广告：推广产品、服务或网站，包含链接或联系方式。
- 垃圾信息：无意义的字符、重复文本或与主题无关的内容。
- 色情：涉及露骨的性描述或性暗示。
- 暴力：宣扬、描述或鼓励暴力行为。
- 其他：包含不当内容，如政治敏感话题、宗教敏感话题、种族歧视、性别歧视、地域歧视等。

你的输出必须严格遵循以下格式：
- 如果评论内容得当，只回答“是”。
- 如果评论内容不当，回答“否”，然后紧跟一个冒号“：”，并用一句话简要说明理由。

示例 1:
[评论内容]: "这个产品真是太棒了，强烈推荐！"
你的回答: 是

示例 2:
[评论内容]: "想赚钱吗？快来加我VX: 123456"
你的回答: 否：包含广告和联系方式。

示例 3:
[评论内容]: "方却无法前期亲子课女郎尾气污染"
你的回答: 否：包含垃圾信息。

现在，请审核以下评论：
[评论内容]: "{text}""#
        )
    }

    /// Parse the classifier reply into a verdict.
    fn parse_reply(reply: &str) -> Result<Verdict, ModerationError> {
        let reply = reply.trim();

        if let Some(_rest) = reply.strip_prefix('是') {
            return Ok(Verdict {
                approved: true,
                reason: APPROVED_REASON.to_string(),
            });
        }

        if let Some(rest) = reply.strip_prefix('否') {
            let mut reason = rest.trim();
            for prefix in ["，", ",", "：", ":"] {
                if let Some(stripped) = reason.strip_prefix(prefix) {
                    reason = stripped.trim();
                }
            }
            let reason = if reason.is_empty() {
                REJECTED_FALLBACK_REASON.to_string()
            } else {
                reason.to_string()
            };
            return Ok(Verdict {
                approved: false,
                reason,
            });
        }

        Err(ModerationError::Indeterminate(reply.to_string()))
    }
}

#[async_trait]
impl Moderator for ModerationClient {
    async fn moderate(&self, text: &str) -> Result<Verdict, ModerationError> {
        let completion = self.llm.complete(&Self::build_prompt(text)).await?;
        debug!(reply = %completion, "moderation classifier reply");
        Self::parse_reply(&completion)
    }
}
