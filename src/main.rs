use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;

use email_classifier::config::ClassifierConfig;
use email_classifier::error::Error;
use email_classifier::input::{read_email_file, read_email_from, validate_email_text};
use email_classifier::llm::create_provider;
use email_classifier::pipeline::{EmailClassifier, ensure_resources_loaded};

/// Characters of the original email echoed back in the output.
const ORIGINAL_TEXT_CHARS: usize = 500;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the JSON results.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = ClassifierConfig::from_env().map_err(Error::from)?;
    ensure_resources_loaded();

    let llm = create_provider(&config).map_err(Error::from)?;
    let classifier = Arc::new(EmailClassifier::new(llm, &config));

    let paths: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();

    let inputs: Vec<(String, Result<String, Error>)> = if paths.is_empty() {
        let text = read_email_from(std::io::stdin().lock()).map_err(Error::from);
        vec![("<stdin>".to_string(), text)]
    } else {
        paths
            .iter()
            .map(|p| (p.display().to_string(), read_email_file(p).map_err(Error::from)))
            .collect()
    };

    // One task per email so a backoff wait never stalls the others.
    let mut handles = Vec::with_capacity(inputs.len());
    for (source, text) in inputs {
        let classifier = Arc::clone(&classifier);
        handles.push(tokio::spawn(async move {
            let email = match text
                .and_then(|raw| validate_email_text(&raw).map(str::to_string).map_err(Error::from))
            {
                Ok(email) => email,
                Err(e) => {
                    tracing::warn!(source = %source, error = %e, "Rejected input");
                    return json!({ "source": source, "error": e.to_string() });
                }
            };

            let result = classifier.classify_and_respond(&email).await;
            json!({
                "source": source,
                "original_text": email.chars().take(ORIGINAL_TEXT_CHARS).collect::<String>(),
                "category": result.category,
                "suggested_response": result.response,
                "preprocessed_text": result.preprocessed_preview,
                "method": result.method,
            })
        }));
    }

    for handle in handles {
        let output = handle.await?;
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}
