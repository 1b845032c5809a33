use serde::{Deserialize, Serialize};

use super::tone::Tone;

/// Work item published on the bus for the generation workers.
///
/// Exactly one of `prompt` / `file_name` is set, depending on the request variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationJob {
    pub tone: Tone,
    pub video_name: Option<String>,
    pub audio_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub access_token: String,
    pub user_id: String,
}

impl GenerationJob {
    pub fn from_prompt(
        tone: Tone,
        video_name: Option<String>,
        audio_name: Option<String>,
        prompt: String,
        access_token: String,
        user_id: String,
    ) -> Self {
        Self {
            tone,
            video_name,
            audio_name,
            prompt: Some(prompt),
            file_name: None,
            access_token,
            user_id,
        }
    }

    pub fn from_file(
        tone: Tone,
        video_name: Option<String>,
        audio_name: Option<String>,
        file_name: String,
        access_token: String,
        user_id: String,
    ) -> Self {
        Self {
            tone,
            video_name,
            audio_name,
            prompt: None,
            file_name: Some(file_name),
            access_token,
            user_id,
        }
    }

    /// Canonical wire encoding used as the bus payload.
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Body of `POST /generate/prompt`.
///
/// `tone` stays a raw integer here so that an unknown value is reported as an
/// invalid tone rather than a JSON parse failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePromptRequest {
    #[serde(alias = "Tone")]
    pub tone: i64,
    #[serde(default, alias = "Video")]
    pub video: Option<String>,
    #[serde(default, alias = "Audio")]
    pub audio: Option<String>,
    #[serde(alias = "Prompt")]
    pub prompt: String,
}

/// Query string of `POST /generate/file`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateFileParams {
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub video_name: Option<String>,
    #[serde(default)]
    pub audio_name: Option<String>,
}
