use std::path::Path;

use anyhow::Result;

use docrag_lib::rag::Chunker;

use crate::app::App;
use crate::render::terminal::{paint, preview, Color};
use crate::OutputFormat;

pub fn run(
    app: &App,
    file: &Path,
    size: Option<usize>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let text = app.load_text(file)?;
    let chunker = Chunker::new(size.unwrap_or(app.config.chunk_size))?;
    let chunks = chunker.split(&text);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&chunks)?);
        }
        OutputFormat::Plain => {
            if chunks.is_empty() {
                println!("{} has no text to chunk.", file.display());
                return Ok(());
            }

            for chunk in &chunks {
                let label = format!("{:>4}", chunk.display_position());
                println!(
                    "{} {} {}",
                    paint(&label, Color::CYAN, use_color),
                    paint(&format!("({} chars)", chunk.text.chars().count()), Color::DIM, use_color),
                    preview(&chunk.text, 60)
                );
            }

            println!("\n{} chunks of up to {} characters", chunks.len(), chunker.size());
        }
    }

    Ok(())
}
