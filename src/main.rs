//! Command-line interface for smartform

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use serde::Deserialize;
#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use std::rc::Rc;

#[cfg(feature = "cli")]
use smartform::dom::{ElementId, MemoryElement};
#[cfg(feature = "cli")]
use smartform::{FieldCollection, FieldSet, Rule};

/// Exit code for a valid form
#[cfg(feature = "cli")]
const EXIT_VALID: i32 = 0;
/// Exit code for an invalid form
#[cfg(feature = "cli")]
const EXIT_INVALID: i32 = 1;
/// Exit code for unreadable input
#[cfg(feature = "cli")]
const EXIT_USAGE: i32 = 2;

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "smartform")]
#[command(author, version, about = "Form field validation tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the fields described in a JSON file
    Check {
        /// Path to the JSON description
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Input file: `{"fields": [...]}`
#[cfg(feature = "cli")]
#[derive(Debug, Deserialize)]
struct CheckInput {
    fields: Vec<FieldEntry>,
}

#[cfg(feature = "cli")]
#[derive(Debug, Deserialize)]
struct FieldEntry {
    id: ElementId,
    #[serde(rename = "type", default)]
    input_type: Option<String>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    checked: bool,
    #[serde(default)]
    rule: Option<Rule>,
}

#[cfg(feature = "cli")]
impl FieldEntry {
    fn element(&self) -> MemoryElement {
        let element = match self.input_type.as_deref() {
            Some("checkbox") => MemoryElement::checkbox(self.id.clone()),
            Some("submit") => MemoryElement::submit().with_id(self.id.clone()),
            Some(other) => MemoryElement::input(self.id.clone()).with_type(other),
            None => MemoryElement::input(self.id.clone()),
        };
        if let Some(value) = &self.value {
            element.set_value(value);
        }
        element.set_checked(self.checked);
        element
    }
}

#[cfg(feature = "cli")]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { file, json } => cmd_check(file, json),
    };

    match result {
        Ok(true) => std::process::exit(EXIT_VALID),
        Ok(false) => std::process::exit(EXIT_INVALID),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_USAGE);
        }
    }
}

#[cfg(feature = "cli")]
fn cmd_check(path: PathBuf, json_output: bool) -> Result<bool, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(&path)?;
    let input: CheckInput = serde_json::from_str(&content)?;

    let mut set = FieldSet::new();
    for entry in &input.fields {
        let element: Rc<MemoryElement> = Rc::new(entry.element());
        set.add_field(element, entry.rule.clone())?;
    }

    let mut report = Vec::new();
    let mut valid = true;
    for field in set.get_fields().iter().filter(|f| !f.is_submit_button()) {
        let passed = field.validate()?;
        valid &= passed;
        report.push((field.id().unwrap_or_default().to_string(), passed));
    }

    if json_output {
        let fields: Vec<_> = report
            .iter()
            .map(|(id, passed)| serde_json::json!({ "id": id, "valid": passed }))
            .collect();
        let output = serde_json::json!({ "valid": valid, "fields": fields });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for (id, passed) in &report {
            let mark = if *passed { "✓" } else { "✗" };
            println!("{} {}", mark, id);
        }
        println!();
        if valid {
            println!("Form is valid");
        } else {
            println!("Form is invalid");
        }
    }

    Ok(valid)
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
