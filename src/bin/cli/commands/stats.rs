use std::path::Path;

use anyhow::Result;

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, file: &Path, format: &OutputFormat) -> Result<()> {
    let (index, _) = app.build_index(file)?;
    let stats = index.stats();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        OutputFormat::Plain => {
            println!("Document:   {}", file.display());
            println!("Chunks:     {}", stats.chunk_count);
            println!("Chunk size: {} characters", stats.chunk_size);
            println!("Dimensions: {}", stats.dimensions);
            println!("Embedding:  {}", app.config.embedding.model);
        }
    }

    Ok(())
}
