use botforge::prelude::*;
use clap::Parser;
use std::fs;
use std::time::Instant;

/// Compile a visual bot-builder graph into a runnable aiogram program
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the bot graph JSON document
    bot_path: String,

    /// Path to write the generated Python program to
    #[arg(short, long)]
    output: Option<String>,

    /// Optional path to save the full generation artifact (bincode)
    #[arg(long)]
    artifact: Option<String>,

    /// Only validate the document, without generating
    #[arg(long)]
    check: bool,
}

fn main() {
    let cli = Cli::parse();
    let total_start = Instant::now();

    // --- 1. File Loading and Parsing ---
    let document = fs::read_to_string(&cli.bot_path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read bot file '{}': {}", &cli.bot_path, e))
    });
    let definition: BotDefinition = serde_json::from_str(&document)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse bot JSON: {}", e)));

    let builder = Generator::builder(definition);

    // --- 2. Validation ---
    let issues = builder.validate();
    if !issues.is_empty() {
        println!("Validation findings:");
        for issue in &issues {
            println!("  - {}", issue);
        }
    }
    if cli.check {
        std::process::exit(if issues.is_empty() { 0 } else { 1 });
    }

    // --- 3. Generation ---
    println!("\nStarting bot code generation...");
    let generate_start = Instant::now();
    let generator = builder.build();
    let result = generator.generate();
    let generate_duration = generate_start.elapsed();

    for warning in &result.warnings {
        println!("Warning: {}", warning);
    }
    for error in &result.errors {
        eprintln!("Error: {}", error);
    }

    if !result.success && result.code.is_empty() {
        exit_with_error("Generation refused; fix the validation errors above.");
    }

    // --- 4. Output ---
    if let Some(output_path) = &cli.output {
        fs::write(output_path, &result.code).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to write output '{}': {}", output_path, e))
        });
        println!("Wrote generated program to {}", output_path);
    } else {
        println!("\n{}", result.code);
    }

    if let Some(artifact_path) = &cli.artifact {
        let bot_name = generator.context().config.name.clone();
        let project_id = generator.context().config.project_id.clone();
        let artifact = GeneratedArtifact::from_result(bot_name, project_id, &result);
        artifact.save(artifact_path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to save artifact '{}': {}", artifact_path, e))
        });
        println!("Saved generation artifact to {}", artifact_path);
    }

    // --- 5. Summary ---
    println!("\n--- Generation Summary ---");
    println!("Nodes processed:   {}", result.metadata.nodes_processed);
    println!("Handlers emitted:  {}", result.metadata.handlers_count);
    println!("Lines generated:   {}", result.metadata.lines_generated);
    println!("Errors:            {}", result.errors.len());
    println!("Warnings:          {}", result.warnings.len());
    println!("--------------------------");
    println!("Generation:        {:?}", generate_duration);
    println!("Total Execution:   {:?}", total_start.elapsed());

    if !result.success {
        std::process::exit(1);
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
