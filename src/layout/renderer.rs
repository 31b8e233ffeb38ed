//! Placeholder renderers.
//!
//! The catalog is intentionally small. Every renderer additionally accepts the
//! wrapper options `uppercase`, `lowercase`, `padding` and `padcharacter`.

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::Utc;

use crate::event::LogEvent;
use crate::layout::template::TemplateSyntaxError;

const LONGDATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
const SHORTDATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.3f";
const DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S%.3f";
const MAX_PADDING: u32 = 1024;

/// An option as written in the placeholder, before the renderer interprets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawOption {
    pub key: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LevelFormat {
    Name,
    Ordinal,
    FirstCharacter,
}

#[derive(Debug, Clone)]
enum RendererKind {
    Level(LevelFormat),
    Message,
    Logger { short_name: bool },
    Date { format: String, utc: bool },
    Exception,
    Newline,
    Literal(String),
    EventProperty { item: String, default: String },
    AllEventProperties { json: bool, separator: String },
    ProcessId,
    Unknown,
}

#[derive(Debug, Clone)]
struct Wrappers {
    uppercase: bool,
    lowercase: bool,
    padding: i32,
    pad_character: char,
}

impl Default for Wrappers {
    fn default() -> Self {
        Self {
            uppercase: false,
            lowercase: false,
            padding: 0,
            pad_character: ' ',
        }
    }
}

impl Wrappers {
    fn is_identity(&self) -> bool {
        !self.uppercase && !self.lowercase && self.padding == 0
    }

    fn apply(&self, text: String, out: &mut String) {
        let text = if self.uppercase {
            text.to_uppercase()
        } else if self.lowercase {
            text.to_lowercase()
        } else {
            text
        };

        let width = self.padding.unsigned_abs() as usize;
        let len = text.chars().count();
        if len >= width {
            out.push_str(&text);
            return;
        }

        let fill = std::iter::repeat(self.pad_character).take(width - len);
        if self.padding > 0 {
            out.extend(fill);
            out.push_str(&text);
        } else {
            out.push_str(&text);
            out.extend(fill);
        }
    }
}

/// Options left over after the wrapper options were consumed.
struct OptionBag<'a> {
    renderer: &'a str,
    position: usize,
    entries: Vec<RawOption>,
}

impl OptionBag<'_> {
    /// Remove `key`, falling back to the first bare option when the renderer
    /// has a default parameter (`${literal:hello}` means `text=hello`).
    fn take(&mut self, key: &str, default_parameter: bool) -> Option<String> {
        if let Some(index) = self.entries.iter().position(|o| o.key.eq_ignore_ascii_case(key)) {
            let option = self.entries.remove(index);
            return Some(option.value.unwrap_or_else(|| "true".to_string()));
        }
        if default_parameter {
            if let Some(index) = self.entries.iter().position(|o| o.value.is_none()) {
                return Some(self.entries.remove(index).key);
            }
        }
        None
    }

    fn flag(&mut self, key: &str) -> Result<bool, TemplateSyntaxError> {
        match self.take(key, false) {
            None => Ok(false),
            Some(value) => parse_flag(self.renderer, key, &value, self.position),
        }
    }

    fn invalid(&self, option: &str, value: &str) -> TemplateSyntaxError {
        invalid_option(self.renderer, option, value, self.position)
    }

    fn warn_unused(&self) {
        for option in &self.entries {
            tracing::warn!(
                renderer = %self.renderer,
                option = %option.key,
                "Ignoring unknown template option"
            );
        }
    }
}

/// A single compiled placeholder.
#[derive(Debug, Clone)]
pub(crate) struct Renderer {
    kind: RendererKind,
    wrappers: Wrappers,
}

impl Renderer {
    pub(crate) fn build(
        name: &str,
        options: Vec<RawOption>,
        position: usize,
    ) -> Result<Self, TemplateSyntaxError> {
        let mut wrappers = Wrappers::default();
        let mut rest = Vec::with_capacity(options.len());

        for option in options {
            let value = option.value.clone().unwrap_or_else(|| "true".to_string());
            match option.key.to_ascii_lowercase().as_str() {
                "uppercase" => wrappers.uppercase = parse_flag(name, &option.key, &value, position)?,
                "lowercase" => wrappers.lowercase = parse_flag(name, &option.key, &value, position)?,
                "padding" => {
                    wrappers.padding = value
                        .trim()
                        .parse::<i32>()
                        .ok()
                        .filter(|width| width.unsigned_abs() <= MAX_PADDING)
                        .ok_or_else(|| invalid_option(name, &option.key, &value, position))?;
                }
                "padcharacter" => {
                    let mut chars = value.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => wrappers.pad_character = c,
                        _ => return Err(invalid_option(name, &option.key, &value, position)),
                    }
                }
                _ => rest.push(option),
            }
        }

        let mut bag = OptionBag {
            renderer: name,
            position,
            entries: rest,
        };

        let kind = match name.to_ascii_lowercase().as_str() {
            "level" => match bag.take("format", true).as_deref() {
                None => RendererKind::Level(LevelFormat::Name),
                Some(v) if v.eq_ignore_ascii_case("name") => RendererKind::Level(LevelFormat::Name),
                Some(v) if v.eq_ignore_ascii_case("ordinal") => RendererKind::Level(LevelFormat::Ordinal),
                Some(v) if v.eq_ignore_ascii_case("firstcharacter") => {
                    RendererKind::Level(LevelFormat::FirstCharacter)
                }
                Some(v) => return Err(bag.invalid("format", v)),
            },
            "message" => RendererKind::Message,
            "logger" => RendererKind::Logger {
                short_name: bag.flag("shortname")?,
            },
            "longdate" => RendererKind::Date {
                format: LONGDATE_FORMAT.to_string(),
                utc: bag.flag("universaltime")?,
            },
            "shortdate" => RendererKind::Date {
                format: SHORTDATE_FORMAT.to_string(),
                utc: bag.flag("universaltime")?,
            },
            "time" => RendererKind::Date {
                format: TIME_FORMAT.to_string(),
                utc: bag.flag("universaltime")?,
            },
            "date" => {
                let format = bag.take("format", true).unwrap_or_else(|| DATE_FORMAT.to_string());
                if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
                    return Err(bag.invalid("format", &format));
                }
                RendererKind::Date {
                    format,
                    utc: bag.flag("universaltime")?,
                }
            }
            "exception" => RendererKind::Exception,
            "newline" => RendererKind::Newline,
            "literal" => RendererKind::Literal(bag.take("text", true).unwrap_or_default()),
            "event-property" | "event-properties" => RendererKind::EventProperty {
                item: bag.take("item", true).unwrap_or_default(),
                default: bag.take("default", false).unwrap_or_default(),
            },
            "all-event-properties" => {
                let json = match bag.take("format", false).as_deref() {
                    None => false,
                    Some(v) if v.eq_ignore_ascii_case("json") => true,
                    Some(v) if v.eq_ignore_ascii_case("text") => false,
                    Some(v) => return Err(bag.invalid("format", v)),
                };
                RendererKind::AllEventProperties {
                    json,
                    separator: bag.take("separator", false).unwrap_or_else(|| ", ".to_string()),
                }
            }
            "processid" => RendererKind::ProcessId,
            _ => {
                tracing::warn!(renderer = %name, "Unknown template renderer, it will render empty");
                bag.entries.clear();
                RendererKind::Unknown
            }
        };

        bag.warn_unused();
        Ok(Self { kind, wrappers })
    }

    pub(crate) fn render(&self, event: &LogEvent, out: &mut String) {
        if self.wrappers.is_identity() {
            self.render_raw(event, out);
        } else {
            let mut buffer = String::new();
            self.render_raw(event, &mut buffer);
            self.wrappers.apply(buffer, out);
        }
    }

    fn render_raw(&self, event: &LogEvent, out: &mut String) {
        match &self.kind {
            RendererKind::Level(LevelFormat::Name) => out.push_str(event.level.as_str()),
            RendererKind::Level(LevelFormat::Ordinal) => {
                let _ = write!(out, "{}", event.level.ordinal());
            }
            RendererKind::Level(LevelFormat::FirstCharacter) => {
                out.extend(event.level.as_str().chars().next());
            }
            RendererKind::Message => out.push_str(&event.message),
            RendererKind::Logger { short_name } => {
                let name = event.logger_name.as_str();
                if *short_name {
                    let short = name
                        .rsplit(|c: char| c == ':' || c == '.')
                        .next()
                        .unwrap_or(name);
                    out.push_str(short);
                } else {
                    out.push_str(name);
                }
            }
            RendererKind::Date { format, utc } => {
                // Formats were validated at compile time, a write error cannot happen.
                let _ = if *utc {
                    write!(out, "{}", event.timestamp.with_timezone(&Utc).format(format))
                } else {
                    write!(out, "{}", event.timestamp.format(format))
                };
            }
            RendererKind::Exception => {
                if let Some(exception) = &event.exception {
                    out.push_str(exception);
                }
            }
            RendererKind::Newline => out.push('\n'),
            RendererKind::Literal(text) => out.push_str(text),
            RendererKind::EventProperty { item, default } => {
                out.push_str(event.property(item).unwrap_or(default));
            }
            RendererKind::AllEventProperties { json, separator } => {
                if *json {
                    out.push_str(&serde_json::to_string(&event.properties).unwrap_or_default());
                } else {
                    for (i, (key, value)) in event.properties.iter().enumerate() {
                        if i > 0 {
                            out.push_str(separator);
                        }
                        let _ = write!(out, "{}={}", key, value);
                    }
                }
            }
            RendererKind::ProcessId => {
                let _ = write!(out, "{}", std::process::id());
            }
            RendererKind::Unknown => {}
        }
    }
}

fn parse_flag(
    renderer: &str,
    option: &str,
    value: &str,
    position: usize,
) -> Result<bool, TemplateSyntaxError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(invalid_option(renderer, option, value, position)),
    }
}

fn invalid_option(renderer: &str, option: &str, value: &str, position: usize) -> TemplateSyntaxError {
    TemplateSyntaxError::InvalidOption {
        renderer: renderer.to_string(),
        option: option.to_string(),
        value: value.to_string(),
        position,
    }
}
