//! Known OpenAI-compatible providers and their default endpoints.

/// A provider the default config skeleton is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderPreset {
    /// Human readable name shown in listings and the `models` header.
    pub label: &'static str,
    /// Key used as `name` in the config files.
    pub name: &'static str,
    pub base_url: &'static str,
}

pub const PROVIDER_PRESETS: &[ProviderPreset] = &[
    ProviderPreset { label: "Anthropic Claude", name: "anthropic", base_url: "https://api.anthropic.com/v1" },
    ProviderPreset { label: "Cerebras", name: "cerebras", base_url: "https://api.cerebras.ai/v1" },
    ProviderPreset { label: "DeepSeek", name: "deepseek", base_url: "https://api.deepseek.com" },
    ProviderPreset { label: "Google AI", name: "gemini", base_url: "https://generativelanguage.googleapis.com/v1beta/openai" },
    ProviderPreset { label: "Groq", name: "groq", base_url: "https://api.groq.com/openai/v1" },
    ProviderPreset { label: "LLaMa.cpp", name: "llamacpp", base_url: "http://127.0.0.1:8080/v1" },
    ProviderPreset { label: "LM Studio", name: "lmstudio", base_url: "http://127.0.0.1:1234/v1" },
    ProviderPreset { label: "Llamafile", name: "llamafile", base_url: "http://127.0.0.1:8080/v1" },
    ProviderPreset { label: "Mistral", name: "mistral", base_url: "https://api.mistral.ai/v1" },
    ProviderPreset { label: "NVIDIA NIM", name: "nvidia_nim", base_url: "https://integrate.api.nvidia.com/v1" },
    ProviderPreset { label: "Ollama", name: "ollama", base_url: "http://127.0.0.1:11434/v1" },
    ProviderPreset { label: "OpenAI", name: "openai", base_url: "https://api.openai.com/v1" },
    ProviderPreset { label: "OpenRouter", name: "openrouter", base_url: "https://openrouter.ai/api/v1" },
];

/// Look up a preset by its config name.
pub fn find_preset(name: &str) -> Option<&'static ProviderPreset> {
    PROVIDER_PRESETS.iter().find(|p| p.name == name)
}
