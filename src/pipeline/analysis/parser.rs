use super::types::RawAnalysis;
use super::AnalysisError;

/// Parse the model's free-text answer into a loosely typed analysis.
pub fn parse_analysis_response(response: &str) -> Result<RawAnalysis, AnalysisError> {
    if response.trim().is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }

    let unfenced = strip_code_fences(response);
    let json_str = extract_first_json_object(unfenced).ok_or_else(|| {
        AnalysisError::MalformedResponse("No JSON object found in response".into())
    })?;

    serde_json::from_str(json_str).map_err(|e| AnalysisError::JsonParsing(e.to_string()))
}

/// Remove a surrounding ```json ... ``` (or bare ```) fence if present.
fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };

    let after_open = &trimmed[start + 3..];
    // Skip the language tag on the opening fence line.
    let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_open[body_start..];

    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Find the first balanced `{...}` span, ignoring braces inside strings.
fn extract_first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
