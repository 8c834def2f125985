use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Video {
    pub name: String,
    pub link: String,
    pub cover_image: String,
    pub text: String,
    #[serde(deserialize_with = "id_string")]
    pub video_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryChunk {
    #[serde(deserialize_with = "id_string")]
    pub video_id: String,
    pub content: String,
}

/// Ids arrive either as strings or as bare numbers depending on the backend.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_camel_case_video() {
        let video: Video = serde_json::from_str(
            r#"{"name":"Intro","link":"https://v/1","coverImage":"https://c/1.jpg","text":"t","videoId":"abc"}"#,
        )
        .unwrap();
        assert_eq!(video.cover_image, "https://c/1.jpg");
        assert_eq!(video.video_id, "abc");
    }

    #[test]
    fn missing_fields_default_and_numeric_ids_become_strings() {
        let video: Video = serde_json::from_str(r#"{"name":"Only name","videoId":42}"#).unwrap();
        assert_eq!(video.name, "Only name");
        assert_eq!(video.link, "");
        assert_eq!(video.video_id, "42");

        let chunk: SummaryChunk =
            serde_json::from_str(r#"{"videoId":7,"content":"hello"}"#).unwrap();
        assert_eq!(chunk.video_id, "7");
    }

    #[test]
    fn summary_requires_content() {
        assert!(serde_json::from_str::<SummaryChunk>(r#"{"videoId":"a"}"#).is_err());
    }
}
