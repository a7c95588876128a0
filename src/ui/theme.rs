use owo_colors::Style;
use std::sync::OnceLock;

static PALETTE: OnceLock<Palette> = OnceLock::new();

/// Styles for the status lines in [`crate::ui::output`]
#[derive(Debug, Clone)]
pub struct Palette {
    pub heading: Style,
    pub good: Style,
    pub bad: Style,
    pub caution: Style,
    pub faint: Style,
}

impl Palette {
    pub fn new(colored: bool) -> Self {
        if !colored {
            return Self {
                heading: Style::new(),
                good: Style::new(),
                bad: Style::new(),
                caution: Style::new(),
                faint: Style::new(),
            };
        }
        Self {
            heading: Style::new().cyan().bold(),
            good: Style::new().green().bold(),
            bad: Style::new().red().bold(),
            caution: Style::new().yellow(),
            faint: Style::new().bright_black(),
        }
    }
}

/// Colored only when stdout is a terminal and `NO_COLOR` is unset
pub fn palette() -> &'static Palette {
    PALETTE.get_or_init(|| {
        let colored = console::Term::stdout().is_term() && std::env::var_os("NO_COLOR").is_none();
        Palette::new(colored)
    })
}
