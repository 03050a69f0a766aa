use serde_json::Value;

/// Pull the top choice's message text out of a chat-completions body.
///
/// A body with an `error` object, or without a first choice, is an error
/// and the raw text is handed back verbatim. A choice with no content
/// decodes to an empty string; the extractor then reports "no code".
pub fn decode_completion(body: &str) -> Result<String, String> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| format!("Invalid API response: {}", e))?;

    if let Some(err) = value.get("error") {
        let message = err
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string());
        return Err(message);
    }

    let Some(choice) = value.get("choices").and_then(|c| c.get(0)) else {
        return Err(body.to_string());
    };

    Ok(choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .unwrap_or_default()
        .to_string())
}
