use base64::Engine as _;

use super::types::{GenerationRequest, InlineImage};
use crate::models::enums::Specialty;
use crate::models::symptom::split_data_uri;
use crate::models::{SymptomImage, SymptomReport};

pub const ANALYSIS_SYSTEM_PREAMBLE: &str = "\
You are a medical triage assistant for a clinic booking service. You help a patient \
understand which kind of doctor to see. You do not diagnose and you always advise \
consulting a healthcare professional.";

const IMAGE_INSTRUCTION: &str = "\
An image of the affected area is attached. Describe any visible findings that are \
relevant to the symptoms and take them into account in your recommendation.";

/// Build the text instruction for one symptom report.
pub fn build_analysis_prompt(report: &SymptomReport) -> String {
    let specialties = Specialty::ALL
        .iter()
        .map(|s| format!("- {}", s.as_str()))
        .collect::<Vec<_>>()
        .join("\n");

    let duration = report.duration.as_deref().unwrap_or("Not specified");
    let notes = report.additional_notes.as_deref().unwrap_or("None");
    let image_note = if report.image.is_some() {
        format!("\n{IMAGE_INSTRUCTION}\n")
    } else {
        String::new()
    };

    format!(
        r#"{ANALYSIS_SYSTEM_PREAMBLE}

<symptoms>
Description: {description}
Severity: {severity}
Duration: {duration}
Additional notes: {notes}
</symptoms>
{image_note}
Choose the recommended specialty ONLY from this list:
{specialties}

Respond with a single JSON object and nothing else, using exactly these fields:
{{
  "analysis": "short explanation of what the symptoms may indicate",
  "confidence": 0,
  "urgency": "routine | urgent | emergency",
  "recommendations": "what the patient should do next",
  "possibleConditions": ["condition 1", "condition 2"],
  "recommendedSpecialty": "one specialty from the list above"
}}
"confidence" is an integer from 0 to 100."#,
        description = report.description,
        severity = report.severity.as_str(),
    )
}

/// Base64-encode an image for a multimodal part.
pub fn inline_image(image: &SymptomImage) -> InlineImage {
    let encoded = base64::engine::general_purpose::STANDARD.encode(&image.data);
    InlineImage {
        mime_type: image.mime_type.clone(),
        base64_data: strip_data_uri_prefix(&encoded).to_string(),
    }
}

/// Drop a leading `data:<mime>;base64,` so only the payload is transmitted.
pub fn strip_data_uri_prefix(payload: &str) -> &str {
    match split_data_uri(payload) {
        Some((_, data)) => data,
        None => payload.trim(),
    }
}

/// Assemble the full upstream request for a report.
pub fn build_generation_request(report: &SymptomReport, model: &str) -> GenerationRequest {
    GenerationRequest {
        model: model.to_string(),
        prompt: build_analysis_prompt(report),
        image: report.image.as_ref().map(inline_image),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::Severity;

    fn report(image: Option<SymptomImage>) -> SymptomReport {
        SymptomReport::new(
            "Itchy red patches on forearm",
            Severity::Moderate,
            Some("3 days"),
            None,
            image,
        )
        .unwrap()
    }

    #[test]
    fn prompt_lists_every_specialty() {
        let prompt = build_analysis_prompt(&report(None));
        for specialty in Specialty::ALL {
            assert!(prompt.contains(specialty.as_str()), "missing {specialty}");
        }
    }

    #[test]
    fn prompt_includes_report_fields() {
        let prompt = build_analysis_prompt(&report(None));
        assert!(prompt.contains("Itchy red patches on forearm"));
        assert!(prompt.contains("Severity: moderate"));
        assert!(prompt.contains("Duration: 3 days"));
        assert!(prompt.contains("Additional notes: None"));
        assert!(prompt.contains("\"recommendedSpecialty\""));
    }

    #[test]
    fn image_instruction_only_with_image() {
        assert!(!build_analysis_prompt(&report(None)).contains("image of the affected area"));
        let img = SymptomImage {
            mime_type: "image/jpeg".into(),
            data: vec![1, 2, 3],
        };
        assert!(build_analysis_prompt(&report(Some(img))).contains("image of the affected area"));
    }

    #[test]
    fn request_carries_encoded_image() {
        let img = SymptomImage {
            mime_type: "image/png".into(),
            data: b"hello".to_vec(),
        };
        let request = build_generation_request(&report(Some(img)), "gemini-1.5-flash");
        let part = request.image.unwrap();
        assert_eq!(part.mime_type, "image/png");
        assert_eq!(part.base64_data, "aGVsbG8=");
        assert_eq!(request.model, "gemini-1.5-flash");
    }

    #[test]
    fn strips_data_uri_metadata() {
        assert_eq!(strip_data_uri_prefix("data:image/png;base64,QUJD"), "QUJD");
        assert_eq!(strip_data_uri_prefix("QUJD"), "QUJD");
    }
}
