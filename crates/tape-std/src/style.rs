use console::style;

/// The ways tape colors terminal text.
///
/// All styles are dropped when `NO_COLOR` or `TAPE_NO_COLOR` is set.
pub enum Style {
    /// Operation names, flags, and commands.
    Command,
    /// File paths.
    Path,
    /// Values a recording holds.
    Expected,
    /// Values a live response holds.
    Actual,
    InfoPrefix,
    WarningPrefix,
    ErrorPrefix,
    SuccessPrefix,
}

impl Style {
    pub fn paint<S: AsRef<str>>(&self, message: S) -> String {
        let message = message.as_ref();
        if is_no_color_set() {
            return message.to_string();
        }

        let styled = match self {
            Style::Command | Style::WarningPrefix => style(message).yellow(),
            Style::Path => style(message).bold(),
            Style::Expected => style(message).green(),
            Style::Actual => style(message).red(),
            Style::InfoPrefix => style(message).blue().bold(),
            Style::ErrorPrefix => style(message).red().bold(),
            Style::SuccessPrefix => style(message).green().bold(),
        };
        styled.to_string()
    }
}

fn is_no_color_set() -> bool {
    is_truthy_env_var("NO_COLOR") || is_truthy_env_var("TAPE_NO_COLOR")
}

fn is_truthy_env_var(key: &str) -> bool {
    match std::env::var(key) {
        Ok(value) => !matches!(value.as_str(), "" | "0" | "false" | "False" | "FALSE"),
        Err(_) => false,
    }
}
