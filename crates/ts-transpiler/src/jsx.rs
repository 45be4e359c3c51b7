//! JSX lowering to factory calls.
//!
//! Only the outermost JSX node of an expression becomes a text edit; nested
//! elements and expression containers are rendered recursively, splicing the
//! original text of embedded expressions.

use crate::edit::Edit;
use crate::parse::SpanBase;
use source_map::Span;
use swc_common::Spanned;
use swc_ecma_ast::{
    Expr, JSXAttrName, JSXAttrOrSpread, JSXAttrValue, JSXElement, JSXElementChild, JSXElementName,
    JSXExpr, JSXFragment, Module,
};
use swc_ecma_visit::{Visit, VisitWith};

pub(crate) struct JsxContext<'a> {
    pub source: &'a str,
    pub base: SpanBase,
    pub factory: &'a str,
    pub fragment_factory: &'a str,
}

/// Collects one replacement edit per outermost JSX node in the module.
pub(crate) fn collect_jsx_edits(module: &Module, ctx: &JsxContext<'_>) -> Vec<Edit> {
    let mut collector = OutermostJsx {
        ctx,
        edits: Vec::new(),
    };
    module.visit_with(&mut collector);
    collector.edits
}

struct OutermostJsx<'a, 'b> {
    ctx: &'a JsxContext<'b>,
    edits: Vec<Edit>,
}

impl Visit for OutermostJsx<'_, '_> {
    fn visit_jsx_element(&mut self, n: &JSXElement) {
        let span = self.ctx.base.rel(n.span);
        self.edits.push(Edit::Replace(span, render_element(n, self.ctx)));
    }

    fn visit_jsx_fragment(&mut self, n: &JSXFragment) {
        let span = self.ctx.base.rel(n.span);
        self.edits.push(Edit::Replace(span, render_fragment(n, self.ctx)));
    }
}

fn render_element(el: &JSXElement, ctx: &JsxContext<'_>) -> String {
    let tag = tag_text(&el.opening.name, ctx);
    let mut parts = vec![tag, render_attrs(&el.opening.attrs, ctx)];
    render_children(&el.children, ctx, &mut parts);
    format!("{}({})", ctx.factory, parts.join(", "))
}

fn render_fragment(fragment: &JSXFragment, ctx: &JsxContext<'_>) -> String {
    let mut parts = vec![ctx.fragment_factory.to_owned(), "null".to_owned()];
    render_children(&fragment.children, ctx, &mut parts);
    format!("{}({})", ctx.factory, parts.join(", "))
}

fn tag_text(name: &JSXElementName, ctx: &JsxContext<'_>) -> String {
    match name {
        JSXElementName::Ident(ident) => {
            let sym = ident.sym.as_str();
            // Lowercase tags are intrinsic elements and become string tags.
            if sym.starts_with(|c: char| c.is_ascii_lowercase()) {
                format!("\"{sym}\"")
            } else {
                sym.to_owned()
            }
        }
        JSXElementName::JSXMemberExpr(member) => {
            ctx.base.rel(member.span()).slice(ctx.source).to_owned()
        }
        JSXElementName::JSXNamespacedName(ns) => {
            format!("\"{}\"", ctx.base.rel(ns.span()).slice(ctx.source))
        }
    }
}

fn render_attrs(attrs: &[JSXAttrOrSpread], ctx: &JsxContext<'_>) -> String {
    if attrs.is_empty() {
        return "null".to_owned();
    }
    let mut entries = Vec::with_capacity(attrs.len());
    for attr in attrs {
        match attr {
            JSXAttrOrSpread::JSXAttr(attr) => {
                let key = match &attr.name {
                    JSXAttrName::Ident(ident) => {
                        let sym = ident.sym.as_str();
                        if sym.contains('-') {
                            format!("\"{sym}\"")
                        } else {
                            sym.to_owned()
                        }
                    }
                    JSXAttrName::JSXNamespacedName(ns) => {
                        format!("\"{}\"", ctx.base.rel(ns.span()).slice(ctx.source))
                    }
                };
                let value = match &attr.value {
                    None => "true".to_owned(),
                    Some(JSXAttrValue::Str(lit)) => {
                        ctx.base.rel(lit.span()).slice(ctx.source).to_owned()
                    }
                    Some(JSXAttrValue::JSXExprContainer(container)) => {
                        match &container.expr {
                            JSXExpr::Expr(expr) => render_expr(expr, ctx),
                            JSXExpr::JSXEmptyExpr(_) => "undefined".to_owned(),
                        }
                    }
                    Some(JSXAttrValue::JSXElement(el)) => render_element(el, ctx),
                    Some(JSXAttrValue::JSXFragment(fragment)) => render_fragment(fragment, ctx),
                };
                entries.push(format!("{key}: {value}"));
            }
            JSXAttrOrSpread::SpreadElement(spread) => {
                entries.push(format!("...{}", render_expr(&spread.expr, ctx)));
            }
        }
    }
    format!("{{ {} }}", entries.join(", "))
}

fn render_children(children: &[JSXElementChild], ctx: &JsxContext<'_>, parts: &mut Vec<String>) {
    for child in children {
        match child {
            JSXElementChild::JSXText(text) => {
                if let Some(literal) = text_literal(&text.value) {
                    parts.push(literal);
                }
            }
            JSXElementChild::JSXExprContainer(container) => {
                if let JSXExpr::Expr(expr) = &container.expr {
                    parts.push(render_expr(expr, ctx));
                }
            }
            JSXElementChild::JSXElement(el) => parts.push(render_element(el, ctx)),
            JSXElementChild::JSXFragment(fragment) => parts.push(render_fragment(fragment, ctx)),
            JSXElementChild::JSXSpreadChild(spread) => {
                parts.push(format!("...{}", render_expr(&spread.expr, ctx)));
            }
        }
    }
}

/// Collapses JSX text the way the TS emitter does: lines are trimmed,
/// whitespace-only text disappears, remaining lines join with single spaces.
fn text_literal(raw: &str) -> Option<String> {
    let joined = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        return None;
    }
    let escaped = joined
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n");
    Some(format!("\"{escaped}\""))
}

/// Renders an embedded expression by splicing its source text, replacing any
/// JSX found inside it recursively.
fn render_expr(expr: &Expr, ctx: &JsxContext<'_>) -> String {
    let span = ctx.base.rel(expr.span());
    let mut finder = OutermostJsx {
        ctx,
        edits: Vec::new(),
    };
    expr.visit_with(&mut finder);

    let mut replacements: Vec<(Span, String)> = finder
        .edits
        .into_iter()
        .filter_map(|edit| match edit {
            Edit::Replace(span, text) => Some((span, text)),
            _ => None,
        })
        .collect();
    replacements.sort_by_key(|(span, _)| span.start);

    let mut out = String::new();
    let mut cursor = span.start;
    for (inner, text) in replacements {
        out.push_str(Span::new(cursor, inner.start).slice(ctx.source));
        out.push_str(&text);
        cursor = inner.end;
    }
    out.push_str(Span::new(cursor, span.end).slice(ctx.source));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::FileKind;
    use crate::parse::parse_module;
    use pretty_assertions::assert_eq;

    fn lower(source: &str) -> String {
        let parsed = parse_module(source, FileKind::Tsx);
        let module = parsed.module.expect("fixture must parse");
        let ctx = JsxContext {
            source,
            base: parsed.base,
            factory: "React.createElement",
            fragment_factory: "React.Fragment",
        };
        let edits = collect_jsx_edits(&module, &ctx);
        let (out, _) = crate::edit::apply_edits(source, edits);
        out
    }

    #[test]
    fn test_intrinsic_element() {
        assert_eq!(
            lower("const el = <div>hi</div>"),
            "const el = React.createElement(\"div\", null, \"hi\")"
        );
    }

    #[test]
    fn test_component_with_attrs() {
        assert_eq!(
            lower("const el = <App title=\"x\" count={1 + 2} active />"),
            "const el = React.createElement(App, { title: \"x\", count: 1 + 2, active: true })"
        );
    }

    #[test]
    fn test_nested_elements() {
        assert_eq!(
            lower("const el = <ul>{items.map(i => <li key={i}>{i}</li>)}</ul>"),
            "const el = React.createElement(\"ul\", null, items.map(i => React.createElement(\"li\", { key: i }, i)))"
        );
    }

    #[test]
    fn test_fragment() {
        assert_eq!(
            lower("const el = <><b>a</b></>"),
            "const el = React.createElement(React.Fragment, null, React.createElement(\"b\", null, \"a\"))"
        );
    }

    #[test]
    fn test_spread_attrs() {
        assert_eq!(
            lower("const el = <div {...rest} />"),
            "const el = React.createElement(\"div\", { ...rest })"
        );
    }

    #[test]
    fn test_multiline_text_collapses() {
        let out = lower("const el = <p>\n  hello\n  world\n</p>");
        assert_eq!(out, "const el = React.createElement(\"p\", null, \"hello world\")");
    }
}
