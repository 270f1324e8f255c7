use std::path::Path;

use anyhow::{Context, Result};

use docrag_lib::rag::RetrievalIndex;

use crate::app::App;
use crate::render::terminal::{paint, preview, Color};
use crate::OutputFormat;

pub fn run(
    app: &App,
    file: &Path,
    question: &str,
    k: Option<usize>,
    context: bool,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let k = k.unwrap_or(app.config.top_k);
    let (index, report) = app.build_index(file)?;
    log::info!("Indexed {} chunks from {}", report.chunk_count, file.display());

    let hits = index
        .search_text_scored(question, k)
        .context("Failed to search for question")?;

    if context {
        let chunks: Vec<_> = hits.into_iter().map(|hit| hit.chunk).collect();
        let block = RetrievalIndex::format_context(&chunks);
        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "context": block }))?);
            }
            OutputFormat::Plain => println!("{}", block),
        }
        return Ok(());
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&hits)?);
        }
        OutputFormat::Plain => {
            if hits.is_empty() {
                println!("No results found for '{}'.", question);
                return Ok(());
            }

            println!("{:<5} {:<8} {:<10} {}", "Rank", "Chunk", "Distance", "Text");
            println!(
                "{} {} {} {}",
                "\u{2500}".repeat(5),
                "\u{2500}".repeat(8),
                "\u{2500}".repeat(10),
                "\u{2500}".repeat(40)
            );

            for (rank, hit) in hits.iter().enumerate() {
                let rank = format!("{:<5}", rank + 1);
                println!(
                    "{} {:<8} {:<10.4} {}",
                    paint(&rank, Color::BOLD, use_color),
                    hit.chunk.display_position(),
                    hit.distance,
                    preview(&hit.chunk.text, 60)
                );
            }

            println!("\n{} of {} chunks", hits.len(), report.chunk_count);
        }
    }

    Ok(())
}
