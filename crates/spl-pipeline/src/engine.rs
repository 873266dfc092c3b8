//! Translation pipeline orchestration.
//!
//! One `translate` call runs one query through every stage:
//! classification, enhancement, context selection, field normalization
//! alongside example retrieval, generation, and validation. Executions
//! share only the read-only catalogs and index, so any number of them
//! can run concurrently.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use spl_adapters::{CompletionProvider, EmbeddingProvider, RerankProvider};
use spl_core::{AppResult, CatalogSet, PipelineConfig, Query, RetrievalResult, Translation};
use spl_context::{ContextSelector, ExampleIndex, RetrieverConfig};
use spl_nlp::{ClassifierConfig, FieldNormalizer, QueryEnhancer, RelevanceClassifier};

use crate::generator::{GeneratorConfig, QueryGenerator};
use crate::validator::SyntaxValidator;

pub struct TranslationPipeline {
    classifier: RelevanceClassifier,
    enhancer: QueryEnhancer,
    selector: ContextSelector,
    normalizer: FieldNormalizer,
    index: ExampleIndex,
    generator: QueryGenerator,
    validator: SyntaxValidator,
}

impl TranslationPipeline {
    /// Wire the pipeline from its providers and catalogs. Embeds the
    /// intent anchors and the training corpus, so this is a startup
    /// cost, not a per-query one.
    pub async fn build(
        llm: Arc<dyn CompletionProvider>,
        embeddings: Arc<dyn EmbeddingProvider>,
        reranker: Arc<dyn RerankProvider>,
        catalog: Arc<CatalogSet>,
        config: &PipelineConfig,
    ) -> AppResult<Self> {
        let classifier_config = ClassifierConfig {
            decision_threshold: config.decision_threshold,
            similarity_threshold: config.similarity_threshold,
            max_query_chars: config.max_query_chars,
            ..ClassifierConfig::default()
        };
        let classifier =
            RelevanceClassifier::build(embeddings.clone(), Some(llm.clone()), classifier_config)
                .await?;

        let retriever_config = RetrieverConfig {
            candidates: config.retrieval_candidates,
            ..RetrieverConfig::default()
        };
        let index = ExampleIndex::build(
            catalog.corpus.clone(),
            embeddings,
            reranker,
            retriever_config,
        )
        .await?;

        info!(
            organizations = catalog.organizations.len(),
            corpus = index.corpus_size(),
            "Translation pipeline ready"
        );

        Ok(Self {
            classifier,
            enhancer: QueryEnhancer::new(llm.clone()),
            selector: ContextSelector::new(&catalog),
            normalizer: FieldNormalizer::new(&catalog),
            index,
            generator: QueryGenerator::new(llm, catalog, GeneratorConfig::default()),
            validator: SyntaxValidator::new(),
        })
    }

    /// Translate one query end to end.
    ///
    /// Irrelevant queries short-circuit after classification. Matcher,
    /// enhancer, and retrieval outages degrade; only invalid input and
    /// generation failures surface as errors.
    #[instrument(skip(self, query), fields(query_id = %query.id))]
    pub async fn translate(&self, query: &Query) -> AppResult<Translation> {
        let relevance = self.classifier.classify(query).await?;
        if query.verbose {
            info!(signals = ?relevance.signals, "Matcher signals");
        }
        if !relevance.is_relevant {
            debug!(
                confidence = relevance.confidence,
                "Query not in scope, skipping generation"
            );
            return Ok(Translation {
                query_id: query.id,
                relevant: false,
                confidence: relevance.confidence,
                method: relevance.winning_method,
                enhancement: None,
                organization: None,
                generated: None,
                validation: None,
            });
        }

        let enhanced = self.enhancer.enhance(query).await;
        let profile = self
            .selector
            .select(&enhanced.rewritten, query.organization_hint.as_deref());

        // Field planning is local; retrieval suspends on the embedding
        // call. Run them side by side.
        let (plan, retrieval) = tokio::join!(
            async { self.normalizer.map_fields(&enhanced.rewritten, profile) },
            self.index.retrieve(&enhanced.rewritten, None)
        );
        let retrieval = match retrieval {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Example retrieval failed, generating without few-shot examples");
                RetrievalResult::default()
            }
        };

        let generated = self
            .generator
            .generate(&enhanced, profile, &plan, &retrieval)
            .await?;
        let validation = self.validator.validate(&generated);

        info!(
            index = %generated.index,
            valid = validation.is_valid,
            "Query translated"
        );
        Ok(Translation {
            query_id: query.id,
            relevant: true,
            confidence: relevance.confidence,
            method: relevance.winning_method,
            organization: profile.map(|p| p.name.clone()),
            enhancement: Some(enhanced),
            generated: Some(generated),
            validation: Some(validation),
        })
    }
}
