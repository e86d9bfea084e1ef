//! Fragments - the atomic units of generated source text.
//!
//! A fragment is literal text or a layout marker. Markers carry no text of
//! their own; [`FragmentStream::linearize`] turns them into line breaks and
//! leading indentation.

/// One piece of generated output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    /// Lines started after this are one level deeper.
    Indent,
    /// Undo one [`Fragment::Indent`].
    Outdent,
    Newline,
}

/// A stream of fragments that can be linearized to text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentStream {
    fragments: Vec<Fragment>,
}

impl FragmentStream {
    /// Create an empty fragment stream.
    pub fn new() -> Self {
        Self { fragments: vec![] }
    }

    /// Push a single fragment.
    pub fn push(&mut self, fragment: Fragment) -> &mut Self {
        self.fragments.push(fragment);
        self
    }

    /// Append another fragment stream.
    pub fn append(&mut self, other: &FragmentStream) -> &mut Self {
        self.fragments.extend(other.fragments.iter().cloned());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// True if the stream contains a line break.
    pub fn is_multiline(&self) -> bool {
        self.fragments.contains(&Fragment::Newline)
    }

    /// Render to text with `tab_width` spaces per indentation level. Blank
    /// lines are left without indentation.
    pub fn linearize(&self, tab_width: usize) -> String {
        let mut out = String::new();
        let mut depth = 0usize;
        let mut line_start = true;

        for fragment in &self.fragments {
            match fragment {
                Fragment::Text(text) => {
                    if text.is_empty() {
                        continue;
                    }
                    if line_start {
                        out.push_str(&" ".repeat(depth * tab_width));
                        line_start = false;
                    }
                    out.push_str(text);
                }
                Fragment::Indent => depth += 1,
                Fragment::Outdent => depth = depth.saturating_sub(1),
                Fragment::Newline => {
                    out.push('\n');
                    line_start = true;
                }
            }
        }

        out
    }

    // Convenience methods for common fragments
    pub fn text(&mut self, text: impl Into<String>) -> &mut Self {
        self.push(Fragment::Text(text.into()))
    }
    pub fn newline(&mut self) -> &mut Self {
        self.push(Fragment::Newline)
    }
    pub fn indent(&mut self) -> &mut Self {
        self.push(Fragment::Indent)
    }
    pub fn outdent(&mut self) -> &mut Self {
        self.push(Fragment::Outdent)
    }
}
