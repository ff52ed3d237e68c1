use std::path::PathBuf;
use std::time::Instant;

use adslot::{
    precompute, validate_question, AdResponse, CategoryRegistry, CentroidCache, Classifier,
    OpenAiEmbedder,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the precomputed centroid file
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decide which ad, if any, to show for a question
    Classify {
        question: String,
        /// Minimum similarity for showing an ad
        #[arg(short, long)]
        threshold: Option<f32>,
        /// Ignore precomputed centroids and embed seed phrases on the fly
        #[arg(long)]
        no_cache: bool,
        /// Print the response as JSON
        #[arg(long)]
        json: bool,
        /// Print the similarity of every category
        #[arg(short, long)]
        verbose: bool,
    },
    /// Embed all seed phrases and write the centroid file
    Precompute,
    /// List the registered categories
    Categories,
}

fn centroid_path(data_dir: Option<PathBuf>) -> PathBuf {
    match data_dir {
        Some(dir) => dir.join(adslot::centroid_cache::CENTROIDS_FILE_NAME),
        None => CentroidCache::default_path(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let path = centroid_path(args.data_dir);

    match args.command {
        Command::Classify { question, threshold, no_cache, json, verbose } => {
            let question = validate_question(Some(question.as_str()))?;
            let mut builder = Classifier::builder().with_embedder(OpenAiEmbedder::from_env());
            if let Some(threshold) = threshold {
                builder = builder.with_threshold(threshold)?;
            }
            if !no_cache {
                builder = builder.with_centroid_cache(&path);
            }
            let classifier = builder.build()?;

            let start = Instant::now();
            let scores = classifier.scores(question).await
                .context("classification failed")?;
            if verbose {
                let mut sorted = scores.clone();
                sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
                println!("Similarity scores (sorted):");
                for (key, score) in sorted {
                    println!("  {}: {:.4}", key, score);
                }
            }
            let result = classifier.decide(&scores);
            info!("Classified in {:.2?}", start.elapsed());
            let response = AdResponse::resolve(result, classifier.registry());

            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else if let Some(creative) = response.creative.as_ref().filter(|_| response.should_render()) {
                println!("Confidence: {:.4}", response.result.confidence);
                println!("{}", creative);
            } else {
                println!(
                    "No ad ({}), confidence {:.4}",
                    response.result.reason.as_deref().unwrap_or("no creative"),
                    response.result.confidence
                );
            }
        }
        Command::Precompute => {
            let embedder = OpenAiEmbedder::from_env();
            let registry = CategoryRegistry::builtin();
            let start = Instant::now();
            let file = precompute::precompute_to(&embedder, &registry, &path).await
                .context("centroid precomputation failed")?;
            println!(
                "Wrote {} centroids ({} dimensions, {}) to {} in {:.2?}",
                file.centroids.len(),
                file.dimension,
                file.model,
                path.display(),
                start.elapsed()
            );
        }
        Command::Categories => {
            let registry = CategoryRegistry::builtin();
            for category in registry.categories() {
                println!(
                    "{:<30} {:<32} {:<10} {} ({} seed phrases)",
                    category.key,
                    category.name,
                    category.sponsor,
                    category.creative_id,
                    category.seed_phrases.len()
                );
            }
        }
    }

    Ok(())
}
