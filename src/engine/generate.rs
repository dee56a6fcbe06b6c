//! Structured generation: prompt → model → parse → validate, with bounded
//! retries, plus the memoized portrait / daily-transit entry points.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::*;
use crate::traits::{Message, ModelProvider};

/// Outcome of a single generation attempt. Transport failures are not an
/// outcome — they propagate as errors and are never retried.
enum Attempt<T> {
    Valid(T),
    Invalid,
}

/// Wraps a single-shot prompt→model→parse→validate cycle with bounded
/// retries. Validation is structural: the returned text must parse as
/// JSON and deserialize into the target record exactly.
pub struct StructuredGenerator {
    transport: Arc<dyn ModelProvider>,
    model: String,
    max_attempts: u32,
}

impl StructuredGenerator {
    pub fn new(transport: Arc<dyn ModelProvider>, model: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            transport,
            model: model.into(),
            max_attempts,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    async fn attempt<T: DeserializeOwned>(&self, prompt: &str) -> anyhow::Result<Attempt<T>> {
        let response = self
            .transport
            .chat(&self.model, &[Message::user(prompt)], &[])
            .await?;
        let text = response.content.unwrap_or_default();
        match serde_json::from_str::<T>(&text) {
            Ok(value) => Ok(Attempt::Valid(value)),
            Err(err) => {
                debug!(error = %err, "Model output failed structural validation");
                Ok(Attempt::Invalid)
            }
        }
    }

    /// Run up to `max_attempts` attempts; `None` means every attempt
    /// produced non-conforming output. Invalid output is discarded whole —
    /// no repair, no partial credit.
    pub async fn generate<T: DeserializeOwned>(&self, prompt: &str) -> anyhow::Result<Option<T>> {
        for attempt in 1..=self.max_attempts {
            match self.attempt(prompt).await? {
                Attempt::Valid(value) => return Ok(Some(value)),
                Attempt::Invalid => {
                    debug!(attempt, max = self.max_attempts, "Retrying structured generation")
                }
            }
        }
        Ok(None)
    }
}

impl ZodiacEngine {
    /// Generate (or recall) the natal portrait for a birth datetime +
    /// coordinates pair. A cache hit skips both the chart fetch and the
    /// model call.
    pub async fn ai_portrait(
        &self,
        datetime: &str,
        coordinates: &str,
    ) -> anyhow::Result<Portrait> {
        let key = (datetime.to_string(), coordinates.to_string());
        if let Some(hit) = self.portraits.get(&key).await {
            debug!(datetime, coordinates, "Portrait cache hit");
            return Ok(hit);
        }

        let chart = self.natal_chart(datetime, coordinates).await?;
        let prompt = prompts::portrait_prompt(&serde_json::to_string(&chart)?);
        let portrait: Portrait = self
            .generator
            .generate(&prompt)
            .await?
            .ok_or(EngineError::PortraitGeneration {
                attempts: self.generator.max_attempts(),
            })?;
        info!(datetime, "Generated natal portrait");

        self.portraits.insert(key, portrait.clone()).await;
        Ok(portrait)
    }

    /// Generate (or recall) the daily vibe check. When the caller already
    /// holds a portrait it is used as-is (and participates in the cache
    /// key by value); otherwise one is generated through `ai_portrait`.
    pub async fn ai_daily_transit(
        &self,
        birth_datetime: &str,
        birth_coordinates: &str,
        transit_datetime: &str,
        current_coordinates: &str,
        portrait: Option<Portrait>,
    ) -> anyhow::Result<DailyTransit> {
        let key = DailyTransitKey {
            birth_datetime: birth_datetime.to_string(),
            birth_coordinates: birth_coordinates.to_string(),
            transit_datetime: transit_datetime.to_string(),
            current_coordinates: current_coordinates.to_string(),
            portrait,
        };
        if let Some(hit) = self.daily_transits.get(&key).await {
            debug!(transit_datetime, "Daily transit cache hit");
            return Ok(hit);
        }

        let transits = self
            .transit_natal_aspects(
                birth_datetime,
                birth_coordinates,
                transit_datetime,
                current_coordinates,
            )
            .await?;
        let portrait = match key.portrait.clone() {
            Some(p) => p,
            None => self.ai_portrait(birth_datetime, birth_coordinates).await?,
        };

        let prompt = prompts::daily_transit_prompt(
            &serde_json::to_string(&portrait)?,
            &serde_json::to_string(&transits)?,
        );
        let daily: DailyTransit = self
            .generator
            .generate(&prompt)
            .await?
            .ok_or(EngineError::DailyTransitGeneration {
                attempts: self.generator.max_attempts(),
            })?;
        info!(transit_datetime, "Generated daily transit");

        self.daily_transits.insert(key, daily.clone()).await;
        Ok(daily)
    }
}
