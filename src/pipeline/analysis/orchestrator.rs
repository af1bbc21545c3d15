use std::sync::Arc;

use super::fallback::{classify_symptoms, fallback_raw_response};
use super::normalize::normalize_analysis;
use super::parser::parse_analysis_response;
use super::prompt::build_generation_request;
use super::retry::RetryPolicy;
use super::types::{LlmClient, RawAnalysis, Sleeper, ThreadSleeper};
use super::AnalysisError;
use crate::models::enums::AnalysisSource;
use crate::models::{AnalysisOutcome, SymptomReport};

/// Description that forces the upstream-failure branch (debug only).
pub const FAILURE_SENTINEL: &str = "FAIL_API";

/// Runs one report through the analysis pipeline:
/// prompt → upstream (under the retry policy) → parse → normalize,
/// with the keyword classifier standing in whenever the upstream path fails.
pub struct SymptomAnalyzer {
    llm: Box<dyn LlmClient + Send + Sync>,
    model_name: String,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper + Send + Sync>,
    failure_sentinel: bool,
}

impl SymptomAnalyzer {
    pub fn new(llm: Box<dyn LlmClient + Send + Sync>, model_name: &str) -> Self {
        Self {
            llm,
            model_name: model_name.to_string(),
            policy: RetryPolicy::default(),
            sleeper: Arc::new(ThreadSleeper),
            failure_sentinel: true,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper + Send + Sync>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Enable or disable the `FAIL_API` debug trigger.
    pub fn with_failure_sentinel(mut self, enabled: bool) -> Self {
        self.failure_sentinel = enabled;
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Analyze a report. Never fails: upstream problems yield a fallback result.
    pub fn analyze(&self, report: &SymptomReport) -> AnalysisOutcome {
        let _span = tracing::info_span!(
            "analyze_symptoms",
            report_id = %report.id,
            provider = self.llm.provider(),
            severity = report.severity.as_str(),
            has_image = report.image.is_some(),
        )
        .entered();

        match self.call_upstream(report) {
            Ok((raw, response)) => {
                tracing::info!("Symptom analysis produced by model");
                AnalysisOutcome {
                    result: normalize_analysis(raw, response),
                    source: AnalysisSource::Model,
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    unparseable = e.is_parse_error(),
                    "Upstream analysis unavailable, using keyword classifier"
                );
                let fallback = classify_symptoms(&report.description, report.severity);
                let raw_response = fallback_raw_response(&fallback);
                AnalysisOutcome {
                    result: normalize_analysis(RawAnalysis::from(fallback), raw_response),
                    source: AnalysisSource::Fallback,
                }
            }
        }
    }

    /// Upstream path: returns the parsed answer and the model's full text.
    fn call_upstream(&self, report: &SymptomReport) -> Result<(RawAnalysis, String), AnalysisError> {
        if self.failure_sentinel && report.description == FAILURE_SENTINEL {
            tracing::warn!("Failure sentinel received, skipping upstream call");
            return Err(AnalysisError::ForcedFailure);
        }

        let request = build_generation_request(report, &self.model_name);
        let response = self
            .policy
            .run(self.sleeper.as_ref(), |_attempt| self.llm.generate(&request))?;

        let raw = parse_analysis_response(&response)?;
        Ok((raw, response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::models::enums::{Severity, Specialty, Urgency};
    use crate::models::SymptomImage;
    use crate::pipeline::analysis::fallback::FALLBACK_MARKER;
    use crate::pipeline::analysis::ollama::MockLlmClient;
    use crate::pipeline::analysis::retry::tests::RecordingSleeper;
    use crate::pipeline::analysis::types::GenerationRequest;

    const GOOD_RESPONSE: &str = r#"```json
{
  "analysis": "Itchy red patches consistent with contact dermatitis.",
  "confidence": 82,
  "urgency": "routine",
  "recommendations": "Avoid the suspected irritant and see a dermatologist.",
  "possibleConditions": ["Contact dermatitis", "Eczema"],
  "recommendedSpecialty": "Dermatology"
}
```"#;

    fn report(description: &str, severity: Severity) -> SymptomReport {
        SymptomReport::new(description, severity, Some("3 days"), None, None).unwrap()
    }

    fn analyzer_with(
        client: MockLlmClient,
    ) -> (SymptomAnalyzer, Arc<RecordingSleeper>) {
        let sleeper = Arc::new(RecordingSleeper::default());
        let analyzer = SymptomAnalyzer::new(Box::new(client), "test-model")
            .with_sleeper(sleeper.clone());
        (analyzer, sleeper)
    }

    /// Mock that fails N times with a rate limit then succeeds (shares its counter).
    struct RateLimitThenSucceed {
        failures: usize,
        retry_after: Option<Duration>,
        calls: Arc<AtomicUsize>,
    }

    impl LlmClient for RateLimitThenSucceed {
        fn generate(&self, _request: &GenerationRequest) -> Result<String, AnalysisError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(AnalysisError::RateLimited {
                    retry_after: self.retry_after,
                })
            } else {
                Ok(GOOD_RESPONSE.to_string())
            }
        }

        fn provider(&self) -> &'static str {
            "mock"
        }
    }

    #[test]
    fn model_answer_is_normalized() {
        let (analyzer, sleeper) = analyzer_with(MockLlmClient::new(GOOD_RESPONSE));
        let outcome = analyzer.analyze(&report("Itchy red rash on my arm", Severity::Mild));

        assert_eq!(outcome.source, AnalysisSource::Model);
        assert_eq!(outcome.result.confidence, 82);
        assert_eq!(outcome.result.urgency, Urgency::Routine);
        assert_eq!(outcome.result.recommended_specialty, Specialty::Dermatology);
        assert_eq!(outcome.result.possible_conditions.len(), 2);
        assert_eq!(outcome.result.raw_response, GOOD_RESPONSE);
        assert_eq!(sleeper.total(), Duration::ZERO);
    }

    #[test]
    fn two_rate_limits_then_success_waits_four_seconds() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sleeper = Arc::new(RecordingSleeper::default());
        let analyzer = SymptomAnalyzer::new(
            Box::new(RateLimitThenSucceed {
                failures: 2,
                retry_after: None,
                calls: calls.clone(),
            }),
            "test-model",
        )
        .with_sleeper(sleeper.clone());

        let outcome = analyzer.analyze(&report("Itchy rash", Severity::Mild));

        assert_eq!(outcome.source, AnalysisSource::Model);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(sleeper.total(), Duration::from_secs(4));
    }

    #[test]
    fn three_rate_limits_fall_back() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sleeper = Arc::new(RecordingSleeper::default());
        let analyzer = SymptomAnalyzer::new(
            Box::new(RateLimitThenSucceed {
                failures: 10,
                retry_after: None,
                calls: calls.clone(),
            }),
            "test-model",
        )
        .with_sleeper(sleeper.clone());

        let outcome = analyzer.analyze(&report("Chest pain when climbing stairs", Severity::Moderate));

        assert_eq!(outcome.source, AnalysisSource::Fallback);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(outcome.result.recommended_specialty, Specialty::Cardiology);
    }

    #[test]
    fn long_suggested_wait_falls_back_after_one_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sleeper = Arc::new(RecordingSleeper::default());
        let analyzer = SymptomAnalyzer::new(
            Box::new(RateLimitThenSucceed {
                failures: 1,
                retry_after: Some(Duration::from_secs(30)),
                calls: calls.clone(),
            }),
            "test-model",
        )
        .with_sleeper(sleeper.clone());

        let outcome = analyzer.analyze(&report("Itchy rash", Severity::Mild));

        assert_eq!(outcome.source, AnalysisSource::Fallback);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(sleeper.total(), Duration::ZERO);
    }

    #[test]
    fn custom_policy_limits_attempts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let analyzer = SymptomAnalyzer::new(
            Box::new(RateLimitThenSucceed {
                failures: 1,
                retry_after: None,
                calls: calls.clone(),
            }),
            "test-model",
        )
        .with_policy(RetryPolicy {
            max_attempts: 1,
            ..RetryPolicy::default()
        })
        .with_sleeper(Arc::new(RecordingSleeper::default()));

        let outcome = analyzer.analyze(&report("Itchy rash", Severity::Mild));

        assert_eq!(outcome.source, AnalysisSource::Fallback);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failure_sentinel_skips_upstream() {
        let client = MockLlmClient::new(GOOD_RESPONSE);
        let sleeper = Arc::new(RecordingSleeper::default());
        let analyzer = SymptomAnalyzer::new(Box::new(client), "test-model")
            .with_sleeper(sleeper);

        let outcome = analyzer.analyze(&report(FAILURE_SENTINEL, Severity::Mild));

        assert_eq!(outcome.source, AnalysisSource::Fallback);
        assert!(outcome.result.raw_response.starts_with(FALLBACK_MARKER));
        assert_eq!(outcome.result.recommended_specialty, Specialty::GeneralMedicine);
    }

    #[test]
    fn sentinel_can_be_disabled() {
        let (analyzer, _) = analyzer_with(MockLlmClient::new(GOOD_RESPONSE));
        let analyzer = analyzer.with_failure_sentinel(false);
        let outcome = analyzer.analyze(&report(FAILURE_SENTINEL, Severity::Mild));
        assert_eq!(outcome.source, AnalysisSource::Model);
    }

    #[test]
    fn unparseable_answer_falls_back_without_retry() {
        let client = MockLlmClient::new("I think you should see a doctor.");
        let sleeper = Arc::new(RecordingSleeper::default());
        let analyzer = SymptomAnalyzer::new(Box::new(client), "test-model")
            .with_sleeper(sleeper.clone());

        let outcome = analyzer.analyze(&report("Blurry vision in one eye", Severity::Severe));

        assert_eq!(outcome.source, AnalysisSource::Fallback);
        assert_eq!(outcome.result.recommended_specialty, Specialty::Ophthalmology);
        assert_eq!(outcome.result.urgency, Urgency::Emergency);
        assert_eq!(sleeper.total(), Duration::ZERO);
    }

    #[test]
    fn transport_error_falls_back_immediately() {
        let client = MockLlmClient::new(GOOD_RESPONSE)
            .with_script(vec![Err(AnalysisError::Transport("connection reset".into()))]);
        let (analyzer, sleeper) = analyzer_with(client);

        let outcome = analyzer.analyze(&report("Itchy rash", Severity::Mild));

        assert_eq!(outcome.source, AnalysisSource::Fallback);
        assert_eq!(outcome.result.recommended_specialty, Specialty::Dermatology);
        assert_eq!(sleeper.total(), Duration::ZERO);
    }

    #[test]
    fn out_of_range_model_values_are_repaired() {
        let response = r#"{"analysis":"Hmm","confidence":250,"urgency":"critical",
            "possibleConditions":"flu","recommendedSpecialty":"Astrology"}"#;
        let (analyzer, _) = analyzer_with(MockLlmClient::new(response));

        let outcome = analyzer.analyze(&report("Feeling off", Severity::Mild));

        assert_eq!(outcome.source, AnalysisSource::Model);
        assert_eq!(outcome.result.confidence, 100);
        assert_eq!(outcome.result.urgency, Urgency::Routine);
        assert!(outcome.result.possible_conditions.is_empty());
        assert_eq!(outcome.result.recommended_specialty, Specialty::GeneralMedicine);
        assert!(!outcome.result.recommendations.is_empty());
    }

    #[test]
    fn non_string_fields_keep_the_model_answer() {
        let response = r#"{"analysis":"Dry itchy patches","confidence":77,"urgency":2,
            "recommendations":null,"possibleConditions":["Eczema"],
            "recommendedSpecialty":"Dermatology"}"#;
        let (analyzer, _) = analyzer_with(MockLlmClient::new(response));

        let outcome = analyzer.analyze(&report("Itchy dry skin", Severity::Mild));

        assert_eq!(outcome.source, AnalysisSource::Model);
        assert_eq!(outcome.result.recommended_specialty, Specialty::Dermatology);
        assert_eq!(outcome.result.urgency, Urgency::Routine);
        assert_eq!(outcome.result.confidence, 77);
        assert!(!outcome.result.recommendations.is_empty());
    }

    #[test]
    fn image_is_forwarded_to_upstream() {
        let client = Arc::new(MockLlmClient::new(GOOD_RESPONSE));
        struct Shared(Arc<MockLlmClient>);
        impl LlmClient for Shared {
            fn generate(&self, request: &GenerationRequest) -> Result<String, AnalysisError> {
                self.0.generate(request)
            }
            fn provider(&self) -> &'static str {
                "mock"
            }
        }

        let analyzer = SymptomAnalyzer::new(Box::new(Shared(client.clone())), "test-model");
        let image = SymptomImage {
            mime_type: "image/png".into(),
            data: vec![1, 2, 3],
        };
        let report =
            SymptomReport::new("Rash on my hand", Severity::Mild, None, None, Some(image)).unwrap();

        analyzer.analyze(&report);

        let sent = client.last_request().unwrap();
        let inline = sent.image.unwrap();
        assert_eq!(inline.mime_type, "image/png");
        assert_eq!(inline.base64_data, "AQID");
        assert_eq!(sent.model, "test-model");
    }
}
