use console::Style;
use once_cell::sync::Lazy;

pub struct Theme {
    pub index: Style,
    pub title: Style,
    pub category: Style,
    pub date: Style,
    pub meta: Style,
    pub border: Style,
    pub bar: Style,
    pub heading: Style,
    pub empty: Style,
}

pub static DIARCH_THEME: Lazy<Theme> = Lazy::new(|| Theme {
    index: Style::new().yellow(),
    title: Style::new().bold(),
    category: Style::new().cyan(),
    date: Style::new(),
    meta: Style::new().color256(246).italic(),
    border: Style::new().color256(240),
    bar: Style::new().red(),
    heading: Style::new().bold().underlined(),
    empty: Style::new().color256(246),
});
