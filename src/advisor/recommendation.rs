//! Structured solar-system recommendations.
//!
//! The LLM is asked for a single JSON object matching the
//! `SolarRecommendation` schema. Output is cleaned of code fences, checked
//! against the schema, and deserialized; malformed output is retried up to
//! `MAX_RETRIES` times with a JSON-only reminder appended to the prompt.

use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use crate::context::ContextStore;
use crate::core::errors::ApiError;
use crate::llm::provider::{GenerateOptions, LlmProvider};

const MAX_RETRIES: usize = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationRequest {
    pub pin: String,
    pub district_state: String,
    /// Available roof area in square feet.
    pub roof_size: f64,
    /// Average monthly electricity bill in rupees.
    pub monthly_bill: f64,
    /// Approximate budget in rupees.
    pub budget: f64,
    #[serde(default)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SolarPanelSetup {
    pub recommended_capacity: String,
    pub panel_type: String,
    pub number_of_panels: u32,
    pub estimated_cost: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatterySolution {
    pub battery_type: String,
    pub capacity: String,
    pub backup_duration: String,
    pub estimated_cost: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InstallationDetails {
    pub installation_time: String,
    pub warranty: String,
    pub annual_maintenance: String,
    pub subsidy_available: String,
    #[serde(default)]
    pub subsidy_breakdown: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SolarRecommendation {
    pub solar_panel_setup: SolarPanelSetup,
    pub battery_solution: BatterySolution,
    pub installation_details: InstallationDetails,
}

#[derive(Clone)]
pub struct RecommendationEngine {
    llm: Arc<dyn LlmProvider>,
    context: ContextStore,
}

impl RecommendationEngine {
    pub fn new(llm: Arc<dyn LlmProvider>, context: ContextStore) -> Self {
        Self { llm, context }
    }

    pub async fn generate(
        &self,
        request: &RecommendationRequest,
        options: &GenerateOptions,
    ) -> Result<SolarRecommendation, ApiError> {
        let base_prompt = build_prompt(request, &self.context.combined());

        let mut last_error = String::new();
        let mut last_output = String::new();

        for attempt in 0..MAX_RETRIES {
            tracing::info!("Recommendation attempt {}/{}", attempt + 1, MAX_RETRIES);

            let prompt = if attempt == 0 {
                base_prompt.clone()
            } else {
                format!(
                    "{}\n\n**Reminder:** Please ensure your output is ONLY the JSON object requested, with no extra text or formatting.",
                    base_prompt
                )
            };

            let raw = self.llm.generate(&prompt, options).await?;
            last_output = raw.clone();

            match parse_recommendation(&raw) {
                Ok(recommendation) => {
                    budget_check(&recommendation, request.budget);
                    return Ok(recommendation);
                }
                Err(err) => {
                    tracing::warn!(
                        "Failed to parse recommendation on attempt {}: {}",
                        attempt + 1,
                        err
                    );
                    last_error = err;
                }
            }
        }

        Err(ApiError::Internal(format!(
            "Failed to parse recommendation from AI after {} attempts. Last error: {}. Last raw output: {}",
            MAX_RETRIES, last_error, last_output
        )))
    }
}

/// Clean, schema-check, and deserialize one LLM answer.
fn parse_recommendation(raw: &str) -> Result<SolarRecommendation, String> {
    let cleaned = strip_code_fences(raw);

    let value: serde_json::Value =
        serde_json::from_str(&cleaned).map_err(|err| format!("invalid JSON: {}", err))?;

    let validator = schema_validator();
    if let Err(err) = validator.validate(&value) {
        return Err(format!("schema violation: {}", err));
    }

    serde_json::from_value(value).map_err(|err| format!("deserialization failed: {}", err))
}

/// Drop a leading ```json (or bare ```) fence and a trailing ``` fence.
fn strip_code_fences(raw: &str) -> String {
    let mut cleaned = raw.trim();
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest;
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }
    cleaned.trim().to_string()
}

fn schema_validator() -> &'static jsonschema::Validator {
    static VALIDATOR: OnceLock<jsonschema::Validator> = OnceLock::new();
    VALIDATOR.get_or_init(|| {
        let schema = serde_json::to_value(schema_for!(SolarRecommendation))
            .expect("recommendation schema serializes");
        jsonschema::validator_for(&schema).expect("recommendation schema compiles")
    })
}

pub fn schema_json() -> String {
    let schema = schema_for!(SolarRecommendation);
    serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string())
}

fn build_prompt(request: &RecommendationRequest, context: &str) -> String {
    format!(
        r#"
You are an expert Solar Energy Advisor for India. Your task is to generate a personalized solar panel system recommendation based on the user's specific details and the provided context.

**Context:**
{context}

**User Details:**
- Pincode: {pin}
- District/State: {district_state}
- Available Roof Size: {roof_size} sq ft
- Average Monthly Electricity Bill: Rs. {monthly_bill}
- Approximate Budget: Rs. {budget}

**Instructions:**
1. Analyze the user details and the context (especially subsidy information relevant to India).
2. Determine a suitable solar panel system configuration (capacity, panel type, number of panels).
3. Suggest an appropriate battery solution if applicable (type, capacity, backup duration).
4. Estimate costs for panels and battery. Ensure these are numerical estimates prefixed with '₹' and using commas (e.g., ₹3,50,000).
5. Provide installation details (time, warranty, maintenance).
6. Calculate the estimated subsidy amount based on the recommended system capacity and the rules in the context. Ensure this is a numerical estimate prefixed with '₹' (e.g., ₹94,500).
7. **Provide a clear breakdown of how the subsidy amount was calculated in the 'subsidy_breakdown' field.** Explain the calculation based on the system capacity (e.g., "Subsidy for first 3kW: 3 * ₹18,000 = ₹54,000. Subsidy for next 2kW: 2 * ₹9,000 = ₹18,000. Total: ₹72,000").
8. Ensure all monetary values (costs, subsidy) are in Indian Rupees (₹) and use appropriate formatting (e.g., ₹1,00,000).
9. Keep the total cost (after potential subsidy) within or close to the user's budget. If the budget is insufficient for the *ideal* system, recommend the best possible system within the budget, clearly stating any compromises made. If no reasonable system fits the budget even with subsidy, state this clearly in the cost/subsidy fields (e.g., "Budget too low for recommended system").
10. **Strictly format your entire response as a single JSON object matching the following structure. Do not include any text, explanations, or markdown formatting before or after the JSON object.**
```json
{schema}
```
Ensure the JSON is valid.
"#,
        context = context,
        pin = request.pin,
        district_state = request.district_state,
        roof_size = request.roof_size,
        monthly_bill = request.monthly_bill,
        budget = request.budget,
        schema = schema_json(),
    )
}

/// Strip currency symbols and separators, keep digits and the decimal point.
pub fn parse_currency(value: &str) -> Option<f64> {
    static NON_NUMERIC: OnceLock<Regex> = OnceLock::new();
    let re = NON_NUMERIC.get_or_init(|| Regex::new(r"[^\d.]").expect("currency regex compiles"));

    let cleaned = re.replace_all(value, "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Compare estimated costs against budget plus subsidy. Advisory only: a
/// shortfall is logged, never surfaced as an error, and unparseable values
/// skip the check.
fn budget_check(recommendation: &SolarRecommendation, budget: f64) {
    let panel_cost = parse_currency(&recommendation.solar_panel_setup.estimated_cost);
    let battery_cost = parse_currency(&recommendation.battery_solution.estimated_cost);
    let subsidy = parse_currency(&recommendation.installation_details.subsidy_available);

    match (panel_cost, battery_cost, subsidy) {
        (Some(panel), Some(battery), Some(subsidy)) => {
            let total_cost = panel + battery;
            let available = budget + subsidy;
            tracing::debug!(
                "Budget check: total cost={}, subsidy={}, budget={}, available={}",
                total_cost,
                subsidy,
                budget,
                available
            );
            if available < total_cost {
                tracing::warn!(
                    "Budget insufficient by approx ₹{:.2}",
                    total_cost - available
                );
            }
        }
        _ => {
            tracing::warn!("Could not parse all cost/subsidy values for budget check");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{GENERAL_FILE, SUBSIDY_FILE};
    use crate::llm::testing::ScriptedProvider;

    fn valid_payload() -> String {
        serde_json::json!({
            "solar_panel_setup": {
                "recommended_capacity": "5kW",
                "panel_type": "Monocrystalline",
                "number_of_panels": 15,
                "estimated_cost": "₹3,50,000"
            },
            "battery_solution": {
                "battery_type": "Lithium-ion",
                "capacity": "10kWh",
                "backup_duration": "8-10 hours",
                "estimated_cost": "₹2,50,000"
            },
            "installation_details": {
                "installation_time": "3-4 days",
                "warranty": "25 years",
                "annual_maintenance": "₹5,000",
                "subsidy_available": "₹78,000",
                "subsidy_breakdown": "First 2kW: 2 * ₹30,000 = ₹60,000. Next 1kW: ₹18,000. Total: ₹78,000."
            }
        })
        .to_string()
    }

    fn sample_request() -> RecommendationRequest {
        RecommendationRequest {
            pin: "110001".to_string(),
            district_state: "New Delhi, Delhi".to_string(),
            roof_size: 500.0,
            monthly_bill: 2500.0,
            budget: 500000.0,
            timeout: None,
        }
    }

    fn engine_with(replies: Vec<String>) -> (tempfile::TempDir, RecommendationEngine) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SUBSIDY_FILE), "₹30,000 per kW up to 2kW.").unwrap();
        std::fs::write(dir.path().join(GENERAL_FILE), "Panels last 25 years.").unwrap();
        let engine = RecommendationEngine::new(
            Arc::new(ScriptedProvider::new(replies)),
            ContextStore::new(dir.path().to_path_buf()),
        );
        (dir, engine)
    }

    #[test]
    fn parse_currency_handles_rupee_formatting() {
        assert_eq!(parse_currency("₹3,50,000"), Some(350000.0));
        assert_eq!(parse_currency("₹5,000.50"), Some(5000.50));
        assert_eq!(parse_currency("Budget too low"), None);
        assert_eq!(parse_currency(""), None);
    }

    #[test]
    fn strips_json_code_fences() {
        let fenced = format!("```json\n{}\n```", valid_payload());
        assert_eq!(strip_code_fences(&fenced), valid_payload());
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("{}"), "{}");
    }

    #[test]
    fn parse_rejects_schema_violations() {
        // number_of_panels must be an integer
        let bad = valid_payload().replace("15", "\"fifteen\"");
        let err = parse_recommendation(&bad).unwrap_err();
        assert!(err.contains("schema violation"), "got: {}", err);
    }

    #[tokio::test]
    async fn first_valid_reply_is_returned() {
        let (_dir, engine) = engine_with(vec![valid_payload()]);
        let rec = engine
            .generate(&sample_request(), &GenerateOptions::default())
            .await
            .unwrap();
        assert_eq!(rec.solar_panel_setup.recommended_capacity, "5kW");
        assert_eq!(rec.installation_details.subsidy_available, "₹78,000");
    }

    #[tokio::test]
    async fn retries_until_valid_json() {
        let (_dir, engine) = engine_with(vec![
            "Here is your recommendation!".to_string(),
            format!("```json\n{}\n```", valid_payload()),
        ]);
        let rec = engine
            .generate(&sample_request(), &GenerateOptions::default())
            .await
            .unwrap();
        assert_eq!(rec.battery_solution.battery_type, "Lithium-ion");
    }

    #[tokio::test]
    async fn exhausted_retries_surface_last_error() {
        let (_dir, engine) = engine_with(vec![
            "not json".to_string(),
            "still not json".to_string(),
            "{\"wrong\": true}".to_string(),
        ]);
        let err = engine
            .generate(&sample_request(), &GenerateOptions::default())
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("after 3 attempts"), "got: {}", message);
        assert!(message.contains("{\"wrong\": true}"), "got: {}", message);
    }

    #[test]
    fn prompt_carries_user_details_and_schema() {
        let prompt = build_prompt(&sample_request(), "CTX");
        assert!(prompt.contains("Pincode: 110001"));
        assert!(prompt.contains("Available Roof Size: 500 sq ft"));
        assert!(prompt.contains("solar_panel_setup"));
        assert!(prompt.contains("CTX"));
    }
}
