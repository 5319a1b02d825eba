//! Full HTML documents for the REPL and the namespace browser

use crate::history::HistoryRecord;
use crate::reflect::SymbolDescriptor;
use crate::render::{namespace_href, symbol_href, Html, Renderer};
use quill_lisp::printer::pr_str;
use quill_lisp::Value;
use std::sync::Arc;

const STYLE: &str = "body{font-family:sans-serif;margin:2em}\
pre{margin:0;white-space:pre-wrap}\
table{border-collapse:collapse;width:100%}\
td,th{border:1px solid #ccc;padding:4px;vertical-align:top;text-align:left}\
.stderr{color:#b00}\
dt{font-weight:bold}";

/// Wrap `body` in a document with the shared navigation bar.
pub fn layout(title: &str, body: Html) -> Html {
    let mut page = Html::markup("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>");
    page.push(Html::text(title));
    page.push_markup("</title><style>");
    page.push_markup(STYLE);
    page.push_markup("</style></head><body><nav>");
    page.push(Html::link("/repl", "REPL"));
    page.push_markup(" | ");
    page.push(Html::link("/ns", "Namespaces"));
    page.push_markup("</nav>");
    page.push(body);
    page.push_markup("</body></html>\n");
    page
}

/// Input form followed by the history table, oldest record first.
pub fn repl_page(records: &[Arc<HistoryRecord>]) -> Html {
    let mut body = Html::element("h1", Html::text("Quill REPL"));
    body.push_markup(
        "<form method=\"post\" action=\"/repl\">\
<textarea name=\"expr\" rows=\"4\" cols=\"80\" autofocus></textarea><br>\
<button type=\"submit\">Evaluate</button></form>",
    );
    body.push_markup(
        "<table><thead><tr><th>Expression</th><th>Result</th><th>Output</th></tr></thead><tbody>",
    );
    for record in records {
        body.push(history_rows(record));
    }
    body.push_markup("</tbody></table>");
    layout("Quill REPL", body)
}

/// Expression, result and stdout on one row; stderr on the next, under the
/// first two columns.
fn history_rows(record: &HistoryRecord) -> Html {
    let result = match &record.result_html {
        Some(markup) => Html::markup(markup.as_str()),
        None => Html::text(&record.result),
    };
    let mut rows = Html::markup("<tr>");
    rows.push(Html::element("td", Html::pre(&record.expression)));
    rows.push(Html::element("td", result));
    rows.push(Html::element("td", Html::pre(&record.stdout)));
    rows.push_markup("</tr><tr><td colspan=\"2\" class=\"stderr\">");
    rows.push(Html::pre(&record.stderr));
    rows.push_markup("</td><td></td></tr>");
    rows
}

pub fn namespace_index(names: &[String]) -> Html {
    let items: Html = names
        .iter()
        .map(|name| Html::element("li", Html::link(&namespace_href(name), name)))
        .collect();
    let mut body = Html::element("h1", Html::text("Namespaces"));
    body.push(Html::element("ol", items));
    layout("Namespaces", body)
}

pub fn namespace_page(namespace: &str, symbols: &[SymbolDescriptor]) -> Html {
    let items: Html = symbols
        .iter()
        .map(|symbol| {
            let mut item = Html::link(&symbol_href(namespace, &symbol.name), &symbol.name);
            if let Some(line) = symbol.doc().and_then(|doc| doc.lines().next()) {
                item.push_markup(": ");
                item.push(Html::text(line));
            }
            Html::element("li", item)
        })
        .collect();
    let mut body = Html::element("h1", Html::text(namespace));
    body.push(Html::element("ul", items));
    layout(namespace, body)
}

/// Name heading, source block, then the metadata as a definition list.
pub fn symbol_page(renderer: &Renderer, symbol: &SymbolDescriptor) -> Html {
    let mut body = Html::element("h1", Html::text(&symbol.name));
    if let Some(source) = &symbol.source {
        body.push(Html::pre(source));
    }
    let entries: Html = symbol
        .meta
        .iter()
        .map(|(key, value)| {
            let mut entry = Html::element("dt", Html::text(&pr_str(key)));
            entry.push(Html::element("dd", meta_value(renderer, key, value)));
            entry
        })
        .collect();
    body.push(Html::element("dl", entries));
    layout(&format!("{}/{}", symbol.namespace, symbol.name), body)
}

fn meta_value(renderer: &Renderer, key: &Value, value: &Value) -> Html {
    match (key, value) {
        (Value::Keyword(k), _) if k.ns().is_none() && k.name() == "ns" => renderer.render(value),
        (Value::Keyword(k), Value::Str(doc)) if k.ns().is_none() && k.name() == "doc" => {
            Html::pre(doc)
        }
        _ => Html::text(&pr_str(value)),
    }
}

pub fn not_found_page(message: &str) -> Html {
    let mut body = Html::element("h1", Html::text("Not found"));
    body.push(Html::element("p", Html::text(message)));
    layout("Not found", body)
}
