use crate::ui::palette;
use owo_colors::OwoColorize;

pub const CHECK: &str = "✔";
pub const CROSS: &str = "✘";
pub const WARN: &str = "!";
pub const BULLET: &str = "•";

pub fn header(text: &str) {
    println!("{}", text.style(palette().heading.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", CHECK.style(palette().good.clone()), label);
}

pub fn error(label: &str) {
    eprintln!("{} {}", CROSS.style(palette().bad.clone()), label.style(palette().bad.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", WARN.style(palette().caution.clone()), label.style(palette().caution.clone()));
}

pub fn info(label: &str, value: &str) {
    println!("{} {}: {}", BULLET.style(palette().faint.clone()), label.style(palette().faint.clone()), value);
}

pub fn section(title: &str) {
    println!();
    println!("── {} ──", title.style(palette().heading.clone()));
}

pub fn empty(label: &str) {
    println!("{}", label.style(palette().faint.clone()));
}
