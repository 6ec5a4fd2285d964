//! Insight generation: one bounded call to the AI backend per attempt,
//! retried only for transient failures

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::ai::parsing::parse_insight_response;
use crate::ai::{AIBackend, AIClient};
use crate::config::InsightConfig;
use crate::error::{Error, Result};
use crate::models::InsightReport;
use crate::prompts::{Prompt, PromptId, PromptLibrary};

use super::Digest;

/// Turns a [`Digest`] into an [`InsightReport`].
///
/// Holds the prompt template immutably; every call renders its own prompt
/// and parses its own response, so one generator can serve concurrent
/// requests.
#[derive(Clone)]
pub struct InsightGenerator {
    client: AIClient,
    prompt: Prompt,
    config: InsightConfig,
}

impl InsightGenerator {
    /// Load the sales insight prompt (override or embedded) and bind it to
    /// a client
    pub fn new(client: AIClient, config: InsightConfig) -> Result<Self> {
        let prompt = PromptLibrary::new().get(PromptId::SalesInsights)?.clone();
        Ok(Self::with_prompt(client, prompt, config))
    }

    pub fn with_prompt(client: AIClient, prompt: Prompt, config: InsightConfig) -> Self {
        Self {
            client,
            prompt,
            config,
        }
    }

    pub fn client(&self) -> &AIClient {
        &self.client
    }

    pub async fn generate_insights(&self, digest: &Digest) -> Result<InsightReport> {
        let user_prompt = digest.render(&self.prompt);
        let system = self.prompt.system_section().unwrap_or_default();
        let max_attempts = self.config.max_retries + 1;
        let model = self.client.model().to_string();

        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(attempt, model = %model, prompt_len = user_prompt.len(), "Requesting insights");

            let result = match tokio::time::timeout(
                self.config.timeout(),
                self.client.generate(system, &user_prompt),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout(self.config.timeout_secs)),
            };

            match result {
                Ok(text) => {
                    debug!(response = %text, "Insight response");
                    // A malformed response fails the same way again, so it is final
                    let parsed = parse_insight_response(&text, self.config.max_recommendations)
                        .map_err(|e| Error::MalformedInsightResponse {
                            start_date: digest.period.start_date,
                            end_date: digest.period.end_date,
                            region: digest.region.clone(),
                            reason: e.0,
                        })?;
                    info!(attempts = attempt, model = %model, "Insights generated");
                    return Ok(InsightReport {
                        generated_at: Utc::now(),
                        narrative: parsed.narrative,
                        recommendations: parsed.recommendations,
                        trends_analysis: parsed.trends_analysis,
                        model,
                    });
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.config.backoff(attempt - 1);
                    warn!(
                        attempt,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Insight request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!(attempts = attempt, error = %e, "Insight generation failed");
                    return Err(Error::InsightGeneration {
                        model,
                        attempts: attempt,
                        message: e.to_string(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockBackend, MockReply, OllamaBackend};
    use crate::insights::CustomerDigest;
    use crate::models::{
        PeriodComparison, ReportPeriod, SalesSummary, SeasonalSummary,
    };
    use crate::test_utils::{MockLlmServer, ServerBehavior};
    use chrono::NaiveDate;
    use std::time::Duration;

    fn fast_config() -> InsightConfig {
        InsightConfig {
            timeout_secs: 1,
            max_retries: 1,
            backoff_base_ms: 10,
            max_recommendations: 5,
        }
    }

    fn empty_digest() -> Digest {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let period = ReportPeriod {
            start_date: day,
            end_date: day,
        };
        Digest {
            period,
            region: "all".into(),
            sales: SalesSummary {
                period,
                region: "all".into(),
                total_revenue: 0.0,
                total_transactions: 0,
                average_order_value: 0.0,
                visits: 0,
                conversion_rate: 0.0,
                period_comparison: PeriodComparison {
                    previous_period: period,
                    previous_revenue: 0.0,
                    previous_transactions: 0,
                    revenue_growth: 0.0,
                    transaction_growth: 0.0,
                },
            },
            customers: CustomerDigest {
                total_customers: 0,
                returning_customers: 0,
                retention_rate: 0.0,
                segments: vec![],
            },
            categories: vec![],
            top_products: vec![],
            seasonal: SeasonalSummary {
                as_of: day,
                region: "all".into(),
                months: 1,
                threshold_pct: 20.0,
                mean_monthly_revenue: 0.0,
                monthly_trends: vec![],
                seasonal_patterns: vec![],
                peak_periods: vec![],
            },
        }
    }

    fn generator(mock: MockBackend) -> InsightGenerator {
        let prompt = PromptLibrary::embedded_only()
            .get(PromptId::SalesInsights)
            .unwrap()
            .clone();
        InsightGenerator::with_prompt(AIClient::Mock(mock), prompt, fast_config())
    }

    #[tokio::test]
    async fn test_well_formed_response() {
        let mock = MockBackend::new();
        let report = generator(mock.clone())
            .generate_insights(&empty_digest())
            .await
            .unwrap();
        assert_eq!(report.recommendations.len(), 3);
        assert!(report.narrative.starts_with("Revenue held steady"));
        assert_eq!(report.model, "mock");
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_then_success() {
        let mock = MockBackend::scripted([MockReply::Status(503)]);
        let report = generator(mock.clone())
            .generate_insights(&empty_digest())
            .await
            .unwrap();
        assert!(!report.trends_analysis.is_empty());
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_two_transient_failures_surface() {
        let mock = MockBackend::scripted([MockReply::Status(502), MockReply::Status(429)]);
        let err = generator(mock.clone())
            .generate_insights(&empty_digest())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InsightGeneration { attempts: 2, .. }));
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let mock = MockBackend::scripted([MockReply::Status(401)]);
        let err = generator(mock.clone())
            .generate_insights(&empty_digest())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InsightGeneration { attempts: 1, .. }));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_response_called_once() {
        let mock = MockBackend::scripted([MockReply::Text(
            "## Narrative\nFine.\n\n## Trends Analysis\nFlat.".into(),
        )]);
        let err = generator(mock.clone())
            .generate_insights(&empty_digest())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedInsightResponse { ref region, ref reason, start_date, .. }
                if region == "all"
                    && reason.contains("Recommendations")
                    && start_date == NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        ));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let slow = MockReply::Delayed(Duration::from_secs(5), "late".into());
        let mock = MockBackend::scripted([slow.clone(), slow]);
        let err = generator(mock.clone())
            .generate_insights(&empty_digest())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InsightGeneration { attempts: 2, ref message, .. } if message.contains("timed out")));
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_retry_over_http_backend() {
        let server = MockLlmServer::start(ServerBehavior::FailFirst(1)).await;
        let client = AIClient::Ollama(OllamaBackend::new(&server.url(), "llama3.2"));
        let prompt = PromptLibrary::embedded_only()
            .get(PromptId::SalesInsights)
            .unwrap()
            .clone();
        let generator = InsightGenerator::with_prompt(client, prompt, fast_config());

        let report = generator.generate_insights(&empty_digest()).await.unwrap();
        assert_eq!(server.calls(), 2);
        assert_eq!(report.model, "llama3.2");
    }

    #[tokio::test]
    async fn test_malformed_http_response_not_retried() {
        let server = MockLlmServer::start(ServerBehavior::Malformed).await;
        let client = AIClient::Ollama(OllamaBackend::new(&server.url(), "llama3.2"));
        let prompt = PromptLibrary::embedded_only()
            .get(PromptId::SalesInsights)
            .unwrap()
            .clone();
        let generator = InsightGenerator::with_prompt(client, prompt, fast_config());

        let err = generator.generate_insights(&empty_digest()).await.unwrap_err();
        assert!(matches!(err, Error::MalformedInsightResponse { .. }));
        assert_eq!(server.calls(), 1);
    }
}
