mod config;
mod heuristics;
mod llm_extract;
mod pdf_text;

use std::path::Path;

use config::{Config, LlmBackend, LlmSection};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // init tracing
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter("info")
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(document) = args.get(1) else {
        eprintln!("usage: invoice_extract <invoice.pdf|ocr.txt> [config.toml]");
        std::process::exit(2);
    };

    let cfg = match args.get(2) {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let text = pdf_text::load_document(Path::new(document))?;
    info!(chars = text.len(), "Document text loaded");

    let fields = extract_fields(&text, &cfg.llm).await;

    let (filled, total) = fields.coverage();
    info!(
        filled,
        total,
        invoice_number = %fields.get(heuristics::Field::InvoiceNumber),
        vendor = %fields.get(heuristics::Field::Vendor),
        "Extraction complete"
    );

    println!("{}", serde_json::to_string_pretty(&fields)?);

    Ok(())
}

/// Dispatch to the configured backend. Any LLM failure degrades to the
/// regex heuristics, which always produce a result.
async fn extract_fields(text: &str, llm: &LlmSection) -> heuristics::InvoiceFields {
    match llm.backend {
        LlmBackend::Heuristics => {
            info!("Backend set to heuristics — using regex extraction");
            heuristics::extract_all(text)
        }
        _ => match llm_extract::run_llm_extraction(text, llm).await {
            Ok(fields) => fields,
            Err(e) => {
                warn!(error = %e, "LLM extraction failed — falling back to heuristics");
                heuristics::extract_all(text)
            }
        },
    }
}
