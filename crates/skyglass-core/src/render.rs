//! Host-agnostic render tree produced by modules.

use std::fmt;

/// A fragment of widget output. Classes are styling hints for the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text { class: String, text: String },
    Block { class: String, children: Vec<Node> },
    /// Pre-rendered SVG markup with its pixel size
    Svg {
        class: String,
        width: u32,
        height: u32,
        markup: String,
    },
}

impl Node {
    pub fn text(class: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Text {
            class: class.into(),
            text: text.into(),
        }
    }

    pub fn block(class: impl Into<String>, children: Vec<Node>) -> Self {
        Self::Block {
            class: class.into(),
            children,
        }
    }

    pub fn class(&self) -> &str {
        match self {
            Self::Text { class, .. } | Self::Block { class, .. } | Self::Svg { class, .. } => class,
        }
    }

    /// Depth-first search for the first node carrying `class`.
    pub fn find(&self, class: &str) -> Option<&Node> {
        if self.class().split_whitespace().any(|c| c == class) {
            return Some(self);
        }
        match self {
            Self::Block { children, .. } => children.iter().find_map(|c| c.find(class)),
            _ => None,
        }
    }

    /// All text content, in document order.
    pub fn text_content(&self) -> String {
        let mut out = Vec::new();
        self.collect_text(&mut out);
        out.join(" ")
    }

    fn collect_text<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Text { text, .. } if !text.is_empty() => out.push(text),
            Self::Block { children, .. } => children.iter().for_each(|c| c.collect_text(out)),
            _ => {}
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match self {
            Self::Text { text, .. } => writeln!(f, "{indent}{text}"),
            Self::Block { children, .. } => {
                // Blocks of plain text print as a single line
                if children.iter().all(|c| matches!(c, Self::Text { .. })) {
                    let line = self.text_content();
                    if !line.is_empty() {
                        writeln!(f, "{indent}{line}")?;
                    }
                    return Ok(());
                }
                for child in children {
                    child.write_indented(f, depth + 1)?;
                }
                Ok(())
            }
            Self::Svg {
                class,
                width,
                height,
                ..
            } => writeln!(f, "{indent}[{class} {width}x{height}]"),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}
