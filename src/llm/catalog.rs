//! Static catalog of selectable providers and models.

use serde::Serialize;

use crate::models::ChatProvider;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModelOption {
    pub id: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOption {
    pub id: ChatProvider,
    pub label: &'static str,
    pub implemented: bool,
    pub default_model: &'static str,
    pub models: &'static [ModelOption],
}

pub const DEFAULT_PROVIDER: ChatProvider = ChatProvider::Gemini;

pub const PROVIDERS: &[ProviderOption] = &[
    ProviderOption {
        id: ChatProvider::OpenAi,
        label: "OpenAI",
        implemented: false,
        default_model: "gpt-5-mini",
        models: &[
            ModelOption { id: "gpt-5.1", label: "GPT-5.1" },
            ModelOption { id: "gpt-5-mini", label: "GPT-5-mini" },
            ModelOption { id: "gpt-4.1", label: "GPT-4.1 (previous generation)" },
        ],
    },
    ProviderOption {
        id: ChatProvider::Gemini,
        label: "Gemini",
        implemented: true,
        default_model: "gemini-3-pro-preview",
        models: &[
            ModelOption { id: "gemini-2.5-flash", label: "Gemini 2.5 Flash (fast)" },
            ModelOption { id: "gemini-2.5-pro", label: "Gemini 2.5 Pro" },
            ModelOption { id: "gemini-3-pro-preview", label: "Gemini 3 Pro Preview (multimodal)" },
            ModelOption { id: "gemini-3-pro-image-preview", label: "Gemini 3 Pro Image Preview" },
            ModelOption { id: "gemini-2.5-flash-image", label: "Gemini 2.5 Flash Image" },
        ],
    },
    ProviderOption {
        id: ChatProvider::Claude,
        label: "Claude",
        implemented: false,
        default_model: "claude-sonnet-4-5",
        models: &[
            ModelOption { id: "claude-sonnet-4-5", label: "Claude Sonnet 4.5 (recommended)" },
            ModelOption { id: "claude-3-5-haiku-latest", label: "Claude 3.5 Haiku Latest (fast)" },
        ],
    },
];

pub fn provider(id: ChatProvider) -> &'static ProviderOption {
    match id {
        ChatProvider::OpenAi => &PROVIDERS[0],
        ChatProvider::Gemini => &PROVIDERS[1],
        ChatProvider::Claude => &PROVIDERS[2],
    }
}

pub fn default_model(id: ChatProvider) -> &'static str {
    provider(id).default_model
}
