//! Type-directed hypertext rendering
//!
//! A [`Renderer`] maps a value's type tag to a rule. Rules for collections
//! call back into the renderer for their elements, so nesting works for any
//! mix of registered and built-in rules. Tags without a rule fall back to the
//! escaped readable form of the value.
//!
//! Sequences are walked once, front to back, without asking for their length.
//! Rendering an unbounded sequence would not terminate; Quill Lisp cannot
//! build one.

mod html;

pub use html::Html;

use crate::reflect::ReflectionProvider;
use quill_lisp::printer::pr_str;
use quill_lisp::{Symbol, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// A rendering rule for one type tag.
pub type RenderRule = Arc<dyn Fn(&Renderer, &Value) -> Html + Send + Sync>;

/// Link target of an interned symbol's page.
pub fn symbol_href(namespace: &str, name: &str) -> String {
    format!(
        "/ns/{}/{}",
        urlencoding::encode(namespace),
        urlencoding::encode(name)
    )
}

/// Link target of a namespace's page.
pub fn namespace_href(namespace: &str) -> String {
    format!("/ns/{}", urlencoding::encode(namespace))
}

pub struct Renderer {
    rules: HashMap<&'static str, RenderRule>,
    fallback: RenderRule,
    reflection: Option<Arc<dyn ReflectionProvider>>,
    search_namespaces: Vec<String>,
}

impl Renderer {
    /// Built-in rules only. Symbols render as plain text.
    pub fn new() -> Self {
        let mut renderer = Self {
            rules: HashMap::new(),
            fallback: Arc::new(render_readable),
            reflection: None,
            search_namespaces: Vec::new(),
        };
        renderer
            .register("list", render_list)
            .register("vector", render_vector)
            .register("map", render_map)
            .register("var", render_var)
            .register("namespace", render_namespace)
            .register("symbol", render_symbol);
        renderer
    }

    /// Built-in rules, with symbols linked when `provider` can resolve them.
    /// Unqualified symbols are looked up in `search_namespaces`, in order.
    pub fn with_reflection(
        provider: Arc<dyn ReflectionProvider>,
        search_namespaces: Vec<String>,
    ) -> Self {
        let mut renderer = Self::new();
        renderer.reflection = Some(provider);
        renderer.search_namespaces = search_namespaces;
        renderer
    }

    /// Add or replace the rule for `tag`. Other rules are untouched.
    pub fn register<F>(&mut self, tag: &'static str, rule: F) -> &mut Self
    where
        F: Fn(&Renderer, &Value) -> Html + Send + Sync + 'static,
    {
        self.rules.insert(tag, Arc::new(rule));
        self
    }

    pub fn render(&self, value: &Value) -> Html {
        let rule = self.rules.get(value.type_tag()).unwrap_or(&self.fallback);
        (**rule)(self, value)
    }

    /// `open`, the rendered items joined by `separator`, then `close`.
    pub fn render_seq<'v>(
        &self,
        open: &str,
        items: impl IntoIterator<Item = &'v Value>,
        separator: &str,
        close: &str,
    ) -> Html {
        let mut out = Html::text(open);
        out.push(Html::join(
            items.into_iter().map(|item| self.render(item)),
            separator,
        ));
        out.push(Html::text(close));
        out
    }

    /// Namespace and local name `sym` refers to, if reflection knows it.
    pub fn resolve_symbol(&self, sym: &Symbol) -> Option<(String, String)> {
        let provider = self.reflection.as_ref()?;
        let found = match sym.ns() {
            Some(ns) => provider.describe(ns, sym.name()),
            None => self
                .search_namespaces
                .iter()
                .find_map(|ns| provider.describe(ns, sym.name())),
        }?;
        Some((found.namespace, found.name))
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn render_readable(_: &Renderer, value: &Value) -> Html {
    Html::text(&pr_str(value))
}

fn render_list(renderer: &Renderer, value: &Value) -> Html {
    let items = value.as_sequential().unwrap_or_default();
    renderer.render_seq("(", items, " ", ")")
}

fn render_vector(renderer: &Renderer, value: &Value) -> Html {
    let items = value.as_sequential().unwrap_or_default();
    renderer.render_seq("[", items, " ", "]")
}

fn render_map(renderer: &Renderer, value: &Value) -> Html {
    let Value::Map(entries) = value else {
        return render_readable(renderer, value);
    };
    let pairs = entries.iter().map(|(k, v)| {
        let mut pair = renderer.render(k);
        pair.push_markup(" ");
        pair.push(renderer.render(v));
        pair
    });
    let mut out = Html::text("{");
    out.push(Html::join(pairs, ", "));
    out.push(Html::text("}"));
    out
}

fn render_var(renderer: &Renderer, value: &Value) -> Html {
    match value {
        Value::Var(var) => Html::link(&symbol_href(var.ns_name(), var.name()), var.name()),
        other => render_readable(renderer, other),
    }
}

fn render_namespace(renderer: &Renderer, value: &Value) -> Html {
    match value {
        Value::Namespace(ns) => Html::link(&namespace_href(ns.name()), ns.name()),
        other => render_readable(renderer, other),
    }
}

fn render_symbol(renderer: &Renderer, value: &Value) -> Html {
    let Value::Symbol(sym) = value else {
        return render_readable(renderer, value);
    };
    match renderer.resolve_symbol(sym) {
        Some((namespace, name)) => Html::link(&symbol_href(&namespace, &name), &name),
        None => render_readable(renderer, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::RuntimeReflection;
    use quill_lisp::{reader, Runtime, CORE_NS, USER_NS};

    fn read(src: &str) -> Value {
        reader::read_one(src).unwrap()
    }

    fn linked_renderer() -> (Arc<Runtime>, Renderer) {
        let runtime = Arc::new(Runtime::new().unwrap());
        let provider = Arc::new(RuntimeReflection::new(runtime.clone()));
        let renderer =
            Renderer::with_reflection(provider, vec![USER_NS.to_string(), CORE_NS.to_string()]);
        (runtime, renderer)
    }

    #[test]
    fn nested_sequences_render_bracketed() {
        let renderer = Renderer::new();
        assert_eq!(renderer.render(&read("[1 [2 3] 4]")).as_str(), "[1 [2 3] 4]");
        assert_eq!(renderer.render(&read("(1 (2) [])")).as_str(), "(1 (2) [])");
        assert_eq!(
            renderer.render(&read("{:a [1 2], :b nil}")).as_str(),
            "{:a [1 2], :b nil}"
        );
    }

    #[test]
    fn default_rule_escapes_readable_text() {
        let renderer = Renderer::new();
        assert_eq!(
            renderer.render(&Value::string("<b>&")).as_str(),
            "\"&lt;b&gt;&amp;\""
        );
    }

    #[test]
    fn symbols_link_only_when_resolvable() {
        let (_runtime, renderer) = linked_renderer();
        assert_eq!(
            renderer.render(&read("swap!")).as_str(),
            "<a href=\"/ns/quill.core/swap%21\">swap!</a>"
        );
        assert_eq!(
            renderer.render(&read("quill.core/map")).as_str(),
            "<a href=\"/ns/quill.core/map\">map</a>"
        );
        assert_eq!(renderer.render(&read("not-defined")).as_str(), "not-defined");

        // Without reflection nothing resolves.
        assert_eq!(Renderer::new().render(&read("map")).as_str(), "map");
    }

    #[test]
    fn search_order_prefers_earlier_namespaces() {
        let (runtime, renderer) = linked_renderer();
        runtime.eval_str("(def first 1)", USER_NS).unwrap();
        assert_eq!(
            renderer.render(&read("first")).as_str(),
            "<a href=\"/ns/user/first\">first</a>"
        );
    }

    #[test]
    fn vars_and_namespaces_link_to_their_pages() {
        let (runtime, renderer) = linked_renderer();
        let var = runtime.eval_str("#'quill.core/inc", USER_NS).unwrap();
        assert_eq!(
            renderer.render(&var).as_str(),
            "<a href=\"/ns/quill.core/inc\">inc</a>"
        );
        let var = runtime.eval_str("(def <b> 1)", USER_NS).unwrap();
        assert_eq!(
            renderer.render(&var).as_str(),
            "<a href=\"/ns/user/%3Cb%3E\">&lt;b&gt;</a>"
        );
        let ns = runtime.eval_str("(find-ns 'user)", USER_NS).unwrap();
        assert_eq!(renderer.render(&ns).as_str(), "<a href=\"/ns/user\">user</a>");
    }

    #[test]
    fn registering_a_rule_leaves_others_alone() {
        let mut renderer = Renderer::new();
        renderer.register("integer", |_, value| {
            Html::element("b", Html::text(&pr_str(value)))
        });
        assert_eq!(
            renderer.render(&read("[1 :k]")).as_str(),
            "[<b>1</b> :k]"
        );
    }
}
