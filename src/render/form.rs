//! Terminal rendering of the configuration form.

use colored::Colorize;

use crate::editor::form::{CONTROLS, ConfigForm, ControlKind};

/// The form grouped by section, one `id: value` line per control.
pub fn render_form(form: &ConfigForm) -> String {
    let mut out = String::new();
    let mut section = "";

    for spec in CONTROLS {
        if spec.section != section {
            if !section.is_empty() {
                out.push('\n');
            }
            section = spec.section;
            out.push_str(&format!("{}\n", section.bold().cyan()));
        }

        let value = form.value(spec.id).map(|v| v.display()).unwrap_or_default();
        let value = if value.is_empty() {
            "(empty)".dimmed().to_string()
        } else {
            value
        };
        let suffix = match spec.kind {
            ControlKind::Range { label } => form
                .label(label)
                .map(|text| format!("  {}", format!("[{label}: {text}]").dimmed()))
                .unwrap_or_default(),
            _ => String::new(),
        };
        out.push_str(&format!("  {:<16} {value}{suffix}\n", format!("{}:", spec.id)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_control_under_its_section() {
        colored::control::set_override(false);
        let rendered = render_form(&ConfigForm::default());

        for spec in CONTROLS {
            assert!(rendered.contains(&format!("{}:", spec.id)), "missing {}", spec.id);
        }
        assert!(rendered.starts_with("Data\n"));
        assert!(rendered.contains("[dropout_value: 0.3]"));
        let augment = rendered.lines().find(|l| l.trim_start().starts_with("augment:")).unwrap();
        assert!(augment.ends_with("[ ]"));
    }
}
