//! Application wiring: config, catalogs, providers, pipeline.

use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;
use tracing::info;

use spl_adapters::{
    CompletionClient, CompletionProvider, EmbeddingClient, EmbeddingProvider, EmbeddingReranker,
    MockCompletionProvider, MockEmbeddingProvider, MockRerankProvider, RerankProvider,
};
use spl_core::{AppConfig, CatalogSet, Query, Translation};
use spl_pipeline::TranslationPipeline;

use crate::cli::Args;

pub struct App {
    pipeline: TranslationPipeline,
    args: Args,
}

impl App {
    pub async fn build(args: Args) -> Result<Self> {
        let config = AppConfig::load().context("Failed to load configuration")?;

        let catalog = match args.data_dir.as_deref() {
            Some(dir) => CatalogSet::load(dir)
                .with_context(|| format!("Failed to load catalogs from {}", dir))?,
            None => {
                let dir = std::path::Path::new(&config.catalog.data_dir);
                if dir.join("organizations.json").exists() {
                    CatalogSet::load(dir).with_context(|| {
                        format!("Failed to load catalogs from {}", config.catalog.data_dir)
                    })?
                } else {
                    CatalogSet::builtin()
                }
            }
        };
        let catalog = Arc::new(catalog);

        let (llm, embeddings, reranker) = if args.mock {
            info!("Using in-process mock providers");
            mock_providers()
        } else {
            let llm = CompletionClient::new(config.llm.clone())
                .context("Failed to build completion client")?;
            let embeddings: Arc<dyn EmbeddingProvider> = Arc::new(
                EmbeddingClient::new(config.embedding.clone())
                    .context("Failed to build embedding client")?,
            );
            let reranker: Arc<dyn RerankProvider> =
                Arc::new(EmbeddingReranker::new(embeddings.clone()));
            (Arc::new(llm) as Arc<dyn CompletionProvider>, embeddings, reranker)
        };

        let pipeline =
            TranslationPipeline::build(llm, embeddings, reranker, catalog, &config.pipeline)
                .await
                .context("Failed to build translation pipeline")?;

        Ok(Self { pipeline, args })
    }

    pub async fn run(&self) -> Result<()> {
        let mut query = Query::new(self.args.question.clone()).with_verbose(self.args.verbose);
        if let Some(org) = &self.args.organization {
            query = query.with_organization_hint(org.clone());
        }

        let translation = self
            .pipeline
            .translate(&query)
            .await
            .context("Translation failed")?;

        if self.args.json {
            println!("{}", serde_json::to_string_pretty(&translation)?);
        } else {
            print_translation(&translation);
        }
        Ok(())
    }
}

fn mock_providers() -> (
    Arc<dyn CompletionProvider>,
    Arc<dyn EmbeddingProvider>,
    Arc<dyn RerankProvider>,
) {
    let llm = MockCompletionProvider::new()
        .with_rule(
            "Rewrite the following question",
            "Show all failed login events in the last 24 hours",
        )
        .with_rule("Classify intent", r#"{"is_related": false, "confidence": 0.1}"#)
        .with_default(
            "index=techcorp_win sourcetype=WinEventLog EventCode=4625 earliest=-24h \
             | stats count by TargetUserName | sort -count",
        );
    (
        Arc::new(llm),
        Arc::new(MockEmbeddingProvider::default()),
        Arc::new(MockRerankProvider::new()),
    )
}

fn print_translation(translation: &Translation) {
    if !translation.relevant {
        println!(
            "{} (confidence {:.2} via {})",
            "Not a Splunk question".yellow(),
            translation.confidence,
            translation.method
        );
        return;
    }

    println!(
        "{} (confidence {:.2} via {})",
        "Splunk question".green(),
        translation.confidence,
        translation.method
    );
    if let Some(org) = &translation.organization {
        println!("Organization: {}", org.cyan());
    } else {
        println!("Organization: {}", "all (wildcard scope)".cyan());
    }
    if let Some(enhancement) = &translation.enhancement {
        if enhancement.was_rewritten() {
            println!("Rewritten as: {}", enhancement.rewritten.italic());
        }
    }
    if let Some(generated) = &translation.generated {
        println!("\n{}", generated.raw.bold());
    }
    if let Some(validation) = &translation.validation {
        if validation.is_valid {
            println!("\n{}", "Syntax OK".green());
        } else {
            println!("\n{}", "Syntax issues:".red());
            for issue in &validation.issues {
                println!("  - {}", issue);
            }
        }
        for suggestion in &validation.suggestions {
            println!("  {} {}", "hint:".blue(), suggestion);
        }
    }
}
