use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::config::{get_config_path, QuoteDefinition};
use crate::form::{ChoiceOption, Condition, Form, Literal, NumericBounds, Question, QuestionType};
use crate::pricing::{EstimationMode, PriceGuide, PriceRule};

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Prompt user with a yes/no question. Returns bool based on input and default.
fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    let input = input.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

/// Prompt until the user enters a non-negative amount.
fn prompt_amount(message: &str, default: &str) -> Result<f64> {
    loop {
        let raw = prompt_with_default(message, default)?;
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => return Ok(v),
            _ => println!("  Invalid: must be a non-negative number. Try again."),
        }
    }
}

fn question(id: &str, label: &str, kind: QuestionType, order: i64) -> Question {
    Question {
        id: id.to_string(),
        label: label.to_string(),
        kind,
        required: false,
        order,
        help: None,
        options: Vec::new(),
        bounds: None,
        show_if: None,
    }
}

/// A small working definition to edit from: a cleaning form with one
/// conditional question and a rule of each kind.
pub fn starter_definition(currency: &str, base_price: f64, callout_fee: f64) -> QuoteDefinition {
    let mut rooms = question("rooms", "How many rooms need cleaning?", QuestionType::Number, 1);
    rooms.required = true;
    rooms.bounds = Some(NumericBounds {
        min: Some(1.0),
        max: Some(50.0),
        step: Some(1.0),
        unit: Some("rooms".to_string()),
    });

    let pets = question("pets", "Do you have pets?", QuestionType::YesNo, 2);

    let mut pet_kind = question("pet_kind", "Which pets?", QuestionType::MultiSelect, 3);
    pet_kind.options = ["dog", "cat", "other"]
        .iter()
        .map(|id| ChoiceOption {
            id: id.to_string(),
            label: id.to_string(),
            value: None,
        })
        .collect();
    pet_kind.show_if = Some(Condition::Equals {
        question: "pets".to_string(),
        value: Literal::Bool(true),
    });

    let mut visit = question("visit", "Preferred visit time", QuestionType::DateTime, 4);
    visit.help = Some("e.g. 2026-05-01T09:00:00Z".to_string());

    let form = Form {
        id: "home-cleaning".to_string(),
        title: Some("Home cleaning quote".to_string()),
        version: 1,
        published: false,
        questions: vec![rooms, pets, pet_kind, visit],
    };

    let rule = |id: &str, order: i64, when: Condition, action: &str, note: &str| PriceRule {
        id: id.to_string(),
        order,
        enabled: true,
        when,
        action: action.to_string(),
        note: Some(note.to_string()),
    };

    let guide = PriceGuide {
        mode: EstimationMode::Range,
        show_to_customer: true,
        base_price: Some(base_price),
        base_callout_fee: Some(callout_fee),
        currency: currency.to_string(),
        rules: vec![
            rule(
                "medium-home",
                10,
                Condition::Between {
                    question: "rooms".to_string(),
                    min: 4.0,
                    max: 8.0,
                },
                "+40..80",
                "Medium home",
            ),
            rule(
                "dogs",
                20,
                Condition::Equals {
                    question: "pet_kind".to_string(),
                    value: Literal::Text("dog".to_string()),
                },
                "x1.15",
                "Dog hair takes longer",
            ),
            rule(
                "large-home",
                30,
                Condition::GreaterThan {
                    question: "rooms".to_string(),
                    value: 8.0,
                },
                "=400..600",
                "Large homes are quoted as a band",
            ),
        ],
        ..PriceGuide::default()
    };

    QuoteDefinition { form, guide }
}

/// Serialize a definition and write it atomically, creating parent directories.
pub fn write_definition(path: &Path, definition: &QuoteDefinition) -> Result<()> {
    let yaml = serde_saphyr::to_string(definition)
        .map_err(|e| anyhow::anyhow!("Failed to serialize quote definition: {}", e))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(yaml.as_bytes())
        .with_context(|| format!("Failed to write quote definition to {}", path.display()))?;
    file.commit().context("Failed to save quote definition")?;

    Ok(())
}

/// Run the interactive init wizard to create a starter quote definition.
///
/// If `default_path` is Some, it is offered as the save location.
/// Otherwise the default config path is offered.
pub fn run_init_wizard(default_path: Option<PathBuf>) -> Result<()> {
    println!();
    println!("Quote Guide Setup");
    println!("=================");
    println!();
    println!("This writes a starter quote form and price guide you can edit.");
    println!();

    let currency = loop {
        let code = prompt_with_default("Currency (ISO 4217 code)", "USD")?.to_uppercase();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            break code;
        }
        println!("  Invalid: use a three-letter code such as USD, EUR or GBP.");
    };
    let base_price = prompt_amount("Base price", "80")?;
    let callout_fee = prompt_amount("Call-out fee", "0")?;

    let default_config_path = match default_path {
        Some(p) => p,
        None => get_config_path()?,
    };
    println!();
    let path_str = prompt_with_default(
        "Where should the definition be saved?",
        &default_config_path.display().to_string(),
    )?;
    let config_path = PathBuf::from(&path_str);

    if config_path.exists() {
        let overwrite = prompt_yes_no(
            &format!(
                "Definition already exists at {}. Overwrite?",
                config_path.display()
            ),
            false,
        )?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    let definition = starter_definition(&currency, base_price, callout_fee);
    write_definition(&config_path, &definition)?;

    println!();
    println!("Definition written to {}", config_path.display());
    println!("Edit the form and rules, then run `quote-guide check` to validate.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_definition;

    #[test]
    fn test_starter_definition_is_valid() {
        let def = starter_definition("GBP", 80.0, 15.0);
        assert!(def.validate().is_ok(), "{:?}", def.validate());
        assert_eq!(def.guide.base_amount(), 95.0);
        assert_eq!(def.guide.currency, "GBP");
    }

    #[test]
    fn test_write_then_load_definition() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("quote.yaml");
        let def = starter_definition("EUR", 60.0, 0.0);

        write_definition(&path, &def).unwrap();
        let loaded = load_definition(Some(path)).unwrap();
        assert_eq!(loaded, def);
    }
}
