//! Display and Debug implementations for Value

use std::fmt;

use super::*;

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Char(c) => write!(f, "'{}'", c),
            Value::Sequence(seq) => match text_of(seq) {
                Some(text) => write!(f, "{:?}", text),
                None => write_items(f, "[", seq.iter(), "]", ItemFormat::Debug),
            },
            Value::Promise(promise) => write!(f, "{:?}", promise),
            other => render(other, f, ItemFormat::Debug),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Char(c) => write!(f, "{}", c),
            Value::Sequence(seq) => match text_of(seq) {
                Some(text) => write!(f, "{}", text),
                None => write_items(f, "[", seq.iter(), "]", ItemFormat::Display),
            },
            Value::Promise(_) => write!(f, "<promise>"),
            other => render(other, f, ItemFormat::Display),
        }
    }
}

#[derive(Clone, Copy)]
enum ItemFormat {
    Debug,
    Display,
}

/// Non-empty sequences made only of characters render as text.
fn text_of(seq: &Seq) -> Option<String> {
    if seq.is_empty() {
        None
    } else {
        seq.as_string()
    }
}

fn render(value: &Value, f: &mut fmt::Formatter<'_>, items: ItemFormat) -> fmt::Result {
    match value {
        Value::Unit => write!(f, "()"),
        Value::Bool(b) => write!(f, "{}", b),
        Value::Byte(b) => write!(f, "{}b", b),
        Value::Integer(n) => write!(f, "{}", n),
        Value::Float(n) => write!(f, "{:?}", n),
        Value::Symbol(s) => write!(f, "{}", s),
        Value::Tuple(elements) => {
            if elements.len() == 1 {
                write!(f, "(")?;
                write_item(f, &elements[0], items)?;
                return write!(f, ",)");
            }
            write_items(f, "(", elements.iter(), ")", items)
        }
        Value::Set(set) => write_items(f, "{", set.iter(), "}", items),
        Value::Dict(dict) => {
            write!(f, "{{")?;
            for (i, (key, value)) in dict.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_item(f, key, items)?;
                write!(f, " = ")?;
                write_item(f, value, items)?;
            }
            write!(f, "}}")
        }
        Value::Function(func) => write!(f, "<{:?}>", func),
        Value::Module(module) => write!(f, "<module {}>", module.fqn()),
        // Handled by the callers
        Value::Char(_) | Value::Sequence(_) | Value::Promise(_) => fmt::Debug::fmt(value, f),
    }
}

fn write_item(f: &mut fmt::Formatter<'_>, value: &Value, items: ItemFormat) -> fmt::Result {
    match items {
        ItemFormat::Debug => write!(f, "{:?}", value),
        ItemFormat::Display => write!(f, "{}", value),
    }
}

fn write_items<'a>(
    f: &mut fmt::Formatter<'_>,
    open: &str,
    values: impl Iterator<Item = &'a Value>,
    close: &str,
    items: ItemFormat,
) -> fmt::Result {
    write!(f, "{}", open)?;
    for (i, value) in values.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write_item(f, value, items)?;
    }
    write!(f, "{}", close)
}
