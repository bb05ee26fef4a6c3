//! Demonstrates parsing an annotation template and printing its model.
//!
//! Run with: `cargo run --example dump_model -p oboe-annotation -- template.csv`

use std::path::PathBuf;

use oboe_annotation::Template;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path: PathBuf = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from("annotation.csv"), PathBuf::from);
    let template = Template::from_path(&path)?;
    let model = &template.model;

    println!("Annotation template {}", path.display());
    println!("  Dataset:       {}", model.data_identifier().unwrap_or("(none)"));
    println!("  Namespaces:    {}", model.namespaces.len());
    println!("  Observations:  {}", model.observation_count());
    println!("  Measurements:  {}", model.measurement_count());
    println!("  Mappings:      {}", model.mappings.len());
    println!("  Skipped rows:  {}", template.skipped.len());
    println!();

    for (key, observation) in &model.measurements {
        println!(
            "  {:12} of {:12} {:30} {}",
            key,
            observation,
            model.characteristics.get(key).map_or("-", String::as_str),
            model.standards.get(key).map_or("-", String::as_str),
        );
    }
    for row in &template.skipped {
        println!("  line {:>4}: {}", row.line, row.reason);
    }

    println!();
    println!("{}", serde_json::to_string_pretty(model)?);
    Ok(())
}
