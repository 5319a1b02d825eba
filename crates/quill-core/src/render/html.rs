use std::fmt;

/// A fragment of markup that is already safe to embed.
///
/// Only [`Html::text`], [`Html::pre`] and [`Html::link`] take untrusted text,
/// and they escape it. Concatenating fragments never escapes again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Html(String);

impl Html {
    pub fn new() -> Self {
        Self::default()
    }

    /// Escape plain text for element content.
    pub fn text(text: &str) -> Self {
        Html(html_escape::encode_text(text).into_owned())
    }

    /// Trusted markup, used as is.
    pub fn markup(markup: impl Into<String>) -> Self {
        Html(markup.into())
    }

    /// Escaped text in a `<pre>` block.
    pub fn pre(text: &str) -> Self {
        Html(format!("<pre>{}</pre>", html_escape::encode_text(text)))
    }

    pub fn link(href: &str, text: &str) -> Self {
        Html(format!(
            "<a href=\"{}\">{}</a>",
            html_escape::encode_double_quoted_attribute(href),
            html_escape::encode_text(text)
        ))
    }

    /// Wrap `inner` in `<tag>…</tag>`.
    pub fn element(tag: &str, inner: Html) -> Self {
        Html(format!("<{tag}>{}</{tag}>", inner.0))
    }

    pub fn push(&mut self, fragment: Html) {
        self.0.push_str(&fragment.0);
    }

    pub fn push_markup(&mut self, markup: &str) {
        self.0.push_str(markup);
    }

    /// Join fragments with a trusted separator.
    pub fn join(parts: impl IntoIterator<Item = Html>, separator: &str) -> Self {
        let mut out = Html::new();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                out.push_markup(separator);
            }
            out.push(part);
        }
        out
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Html {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromIterator<Html> for Html {
    fn from_iter<I: IntoIterator<Item = Html>>(iter: I) -> Self {
        let mut out = Html::new();
        for fragment in iter {
            out.push(fragment);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_escapes_and_composition_does_not() {
        let inner = Html::text("<script>alert(1)</script>");
        assert_eq!(inner.as_str(), "&lt;script&gt;alert(1)&lt;/script&gt;");

        let wrapped = Html::element("td", inner.clone());
        assert_eq!(wrapped.as_str(), format!("<td>{inner}</td>"));
    }

    #[test]
    fn link_escapes_attribute_and_text() {
        let link = Html::link("/ns/a\"b", "x<y");
        assert_eq!(link.as_str(), "<a href=\"/ns/a&quot;b\">x&lt;y</a>");
    }

    #[test]
    fn join_places_separator_between_fragments_only() {
        let joined = Html::join(["1", "2", "3"].map(Html::text), " ");
        assert_eq!(joined.as_str(), "1 2 3");
        assert_eq!(Html::join(Vec::new(), ", ").as_str(), "");
    }
}
