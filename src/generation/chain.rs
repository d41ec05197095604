//! Primary/fallback sequencing for article generation.

use super::{GenerationRequest, InstructionPrompt, TextGenerator};
use crate::config::Prompts;
use crate::strategy::{non_empty, Method, Provider, StrategyFailure};
use tracing::{debug, error, info, instrument, warn};

/// Raw article text and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArticle {
    pub text: String,
    pub method: Method,
    /// Name of the service that wrote the text.
    pub service: String,
    /// Why the primary service was passed over, when the fallback wrote the text.
    pub primary_failure: Option<StrategyFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Generated(GeneratedArticle),
    Failed {
        primary: StrategyFailure,
        fallback: StrategyFailure,
    },
}

/// Tries the primary chat service, then the fallback, with one shared prompt.
pub struct GenerationChain {
    primary: Provider<dyn TextGenerator>,
    fallback: Provider<dyn TextGenerator>,
    prompts: Prompts,
}

impl GenerationChain {
    pub fn new(
        primary: Provider<dyn TextGenerator>,
        fallback: Provider<dyn TextGenerator>,
        prompts: Prompts,
    ) -> Self {
        Self {
            primary,
            fallback,
            prompts,
        }
    }

    #[instrument(skip_all, fields(format = %request.output_format))]
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        let prompt = InstructionPrompt::build(&self.prompts, request);
        info!(
            "Generating article (tone: {:?}, audience: {:?})",
            request.tone, request.audience
        );

        let primary = match attempt(&self.primary, &prompt).await {
            Ok((text, service)) => {
                return GenerationOutcome::Generated(GeneratedArticle {
                    text,
                    method: Method::Primary,
                    service,
                    primary_failure: None,
                });
            }
            Err(failure) => failure,
        };

        warn!("Primary generation failed ({}), trying fallback", primary);

        match attempt(&self.fallback, &prompt).await {
            Ok((text, service)) => GenerationOutcome::Generated(GeneratedArticle {
                text,
                method: Method::Fallback,
                service,
                primary_failure: Some(primary),
            }),
            Err(fallback) => {
                error!(
                    "Both generation services failed: primary: {}; fallback: {}",
                    primary, fallback
                );
                GenerationOutcome::Failed { primary, fallback }
            }
        }
    }
}

async fn attempt(
    provider: &Provider<dyn TextGenerator>,
    prompt: &InstructionPrompt,
) -> Result<(String, String), StrategyFailure> {
    let generator = provider.get()?;
    let service = generator.name().to_string();

    info!("Requesting article from {}", service);
    let text = generator
        .complete(prompt)
        .await
        .map_err(|e| StrategyFailure::ServiceError(e.to_string()))?;
    debug!("Raw output from {}: {:?}", service, text);

    let text = non_empty(text)?;
    info!("Article generated by {} ({} chars)", service, text.len());
    Ok((text, service))
}
