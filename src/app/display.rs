//! Output formatting for resolved options

use crate::app::cli::OutputFormat;
use crate::engine::SelectView;
use crate::source::option::SelectOption;
use colored::Colorize;

/// Render `view` in the requested format
pub fn render_view(view: &SelectView, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(view),
        OutputFormat::Text => Ok(render_text(view)),
    }
}

fn render_text(view: &SelectView) -> String {
    if view.final_options.is_empty() {
        return format!("{}", "No options.".dimmed());
    }

    let width = view
        .final_options
        .iter()
        .map(|option| option.value.to_string().len())
        .max()
        .unwrap_or(0);

    let mut lines: Vec<String> = view
        .final_options
        .iter()
        .map(|option| render_option(option, width, view))
        .collect();
    lines.push(format!(
        "{} option(s){}",
        view.final_options.len(),
        if view.loading { " (loading)" } else { "" }
    ));
    lines.join("\n")
}

fn render_option(option: &SelectOption, width: usize, view: &SelectView) -> String {
    let selected = view
        .final_value
        .as_ref()
        .is_some_and(|value| value.values().iter().any(|v| v.dedupe_key() == option.value.dedupe_key()));
    let marker = if selected {
        "*".green().bold().to_string()
    } else if view.final_default_value.as_ref() == Some(&option.value) {
        ">".cyan().to_string()
    } else {
        " ".to_string()
    };
    let value = format!("{:>width$}", option.value.to_string(), width = width);
    let label = if option.disabled {
        option.label.dimmed().to_string()
    } else {
        option.label.clone()
    };
    format!("{} {}  {}", marker, value.yellow(), label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::option::{OptionValue, SelectValue};

    fn view() -> SelectView {
        SelectView {
            loading: false,
            final_options: vec![SelectOption::new("Alice", 1), SelectOption::new("Bob", 22)],
            final_value: Some(SelectValue::Single(OptionValue::Int(22))),
            final_default_value: None,
        }
    }

    #[test]
    fn test_text_output() {
        colored::control::set_override(false);
        let text = render_view(&view(), OutputFormat::Text).unwrap();
        assert_eq!(text, "   1  Alice\n* 22  Bob\n2 option(s)");
    }

    #[test]
    fn test_json_output() {
        let json = render_view(&view(), OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["final_options"][1]["label"], "Bob");
        assert_eq!(parsed["final_value"], 22);
    }

    #[test]
    fn test_empty_output() {
        colored::control::set_override(false);
        let view = SelectView {
            loading: false,
            final_options: vec![],
            final_value: None,
            final_default_value: None,
        };
        assert_eq!(render_view(&view, OutputFormat::Text).unwrap(), "No options.");
    }
}
