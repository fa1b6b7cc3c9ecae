use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result, bail};
use clap::Parser;
use client::{HttpApi, VocabApi, view::WordView};
use models::{
    DictionaryData, VocabularyEntry,
    remote::{DICTIONARY_URL, DictionaryClient},
};
use tokio::time::timeout;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// Runs the run/jog scenario against a live server.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, env = "VOCAB_URL", default_value = "http://localhost:1111")]
    base_url: String,

    /// Look definitions up in a dictionary instead of using canned ones.
    /// Without a value the public dictionary API is used.
    #[arg(
        long,
        env = "DICTIONARY_URL",
        num_args = 0..=1,
        default_missing_value = DICTIONARY_URL
    )]
    dictionary_url: Option<String>,

    /// Keep the created words instead of deleting them at the end.
    #[arg(long)]
    keep: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let api = Arc::new(HttpApi::new(&args.base_url)?);
    let dictionary = args.dictionary_url.as_deref().map(DictionaryClient::new);

    let run = create(&api, dictionary.as_ref(), "run", "to move fast").await?;
    let mut view = WordView::load(api.clone(), &run.id).await?;

    let found = search(&mut view, "run").await?;
    if !found.is_empty() {
        bail!("search for run should exclude run itself, got {found:?}");
    }
    info!("Self excluded from search");

    let jog = create(&api, dictionary.as_ref(), "jog", "to run slowly").await?;

    let found = search(&mut view, "jo").await?;
    if !found.iter().any(|entry| entry.id == jog.id) {
        bail!("search for jo should find jog, got {found:?}");
    }

    view.toggle(&jog.id).await?;
    view.commit().await?;

    let relation = view
        .snapshot()
        .similar_words
        .iter()
        .find(|relation| relation.related_id == jog.id)
        .map(|relation| relation.id.clone())
        .context("relation run -> jog missing after commit")?;
    info!("Related run -> jog as {relation}");

    view.remove_relation(&relation).await?;
    if !view.snapshot().similar_words.is_empty() {
        bail!("relation still present after removal");
    }
    info!("Relation removed");

    if !args.keep {
        api.delete_word(&run.id).await?;
        api.delete_word(&jog.id).await?;
    }

    println!("Scenario passed against {}", args.base_url);
    Ok(())
}

async fn create(
    api: &HttpApi,
    dictionary: Option<&DictionaryClient>,
    word: &str,
    fallback: &str,
) -> Result<VocabularyEntry> {
    let data = match dictionary {
        Some(dictionary) => match dictionary.lookup(word).await {
            Ok(data) => data,
            Err(e) => {
                warn!("Dictionary lookup for {word} failed, using fallback: {e}");
                canned(word, fallback)
            }
        },
        None => canned(word, fallback),
    };

    api.create_entry(word, &data).await?;

    api.list_words()
        .await?
        .into_iter()
        .find(|entry| entry.word == data.word)
        .with_context(|| format!("{word} missing after creation"))
}

fn canned(word: &str, definition: &str) -> DictionaryData {
    DictionaryData {
        word: word.to_string(),
        definition: Some(definition.to_string()),
        ..Default::default()
    }
}

async fn search(view: &mut WordView<HttpApi>, q: &str) -> Result<Vec<VocabularyEntry>> {
    let mut results = view.subscribe_results();

    view.search(q);
    timeout(Duration::from_secs(5), results.changed())
        .await
        .context("search timed out")??;

    Ok(view.search_results())
}
