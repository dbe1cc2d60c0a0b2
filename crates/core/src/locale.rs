// Centralized user-visible strings: role labels for the prompt, fallback
// replies, and the messages written to the error channel.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Zh,
    En,
}

impl Locale {
    pub fn user_label(self) -> &'static str {
        match self {
            Locale::Zh => "用户",
            Locale::En => "User",
        }
    }

    pub fn assistant_label(self) -> &'static str {
        match self {
            Locale::Zh => "助手",
            Locale::En => "Assistant",
        }
    }

    // Full-width colon for zh, matching how the labels appear in the stop list.
    pub fn separator(self) -> &'static str {
        match self {
            Locale::Zh => "：",
            Locale::En => ":",
        }
    }

    pub fn no_reply(self) -> &'static str {
        match self {
            Locale::Zh => "抱歉，我无法生成回复。",
            Locale::En => "unable to generate a reply",
        }
    }

    pub fn need_more_info(self) -> &'static str {
        match self {
            Locale::Zh => "我需要更多信息来回答您的问题。",
            Locale::En => "need more information to answer",
        }
    }

    pub fn processing_error(self) -> &'static str {
        match self {
            Locale::Zh => "抱歉，处理您的消息时出现了错误。",
            Locale::En => "an error occurred while processing your message.",
        }
    }

    pub fn model_unavailable(self) -> &'static str {
        match self {
            Locale::Zh => "抱歉，AI模型加载失败。",
            Locale::En => "the AI model failed to load",
        }
    }

    pub fn empty_message(self) -> &'static str {
        match self {
            Locale::Zh => "消息不能为空",
            Locale::En => "message must not be empty",
        }
    }

    pub fn invalid_json(self) -> &'static str {
        match self {
            Locale::Zh => "JSON解析错误",
            Locale::En => "invalid JSON",
        }
    }

    pub fn model_load_failed(self, detail: &str) -> String {
        match self {
            Locale::Zh => format!("模型加载失败: {}", detail),
            Locale::En => format!("model failed to load: {}", detail),
        }
    }

    pub fn generation_failed(self, detail: &str) -> String {
        match self {
            Locale::Zh => format!("生成回复失败: {}", detail),
            Locale::En => format!("failed to generate a reply: {}", detail),
        }
    }

    pub fn config_failed(self, detail: &str) -> String {
        match self {
            Locale::Zh => format!("配置错误: {}", detail),
            Locale::En => format!("configuration error: {}", detail),
        }
    }

    pub fn unexpected(self, detail: &str) -> String {
        match self {
            Locale::Zh => format!("未知错误: {}", detail),
            Locale::En => format!("unexpected error: {}", detail),
        }
    }
}
