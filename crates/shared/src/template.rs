//! Render contexts for the dashboard's HTML fragments.
//!
//! The dashboard only builds contexts; turning them into markup is the job of
//! a [`Templates`] implementation. Contexts are `Serialize` so a template
//! engine can take them as-is.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearOption {
    pub year: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetOption {
    pub dataset_id: String,
    pub dataset: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedCode {
    pub base_url: String,
    pub state_params: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoBox {
    pub title: String,
    /// Already rendered HTML.
    pub text: String,
    /// Rendered embed code, empty for plain info triggers.
    pub embed_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceBox {
    pub year: String,
    pub name: String,
    pub slug: String,
    pub score: Option<i64>,
    pub rank: Option<i64>,
    pub improvement_phrase: String,
    pub previous_score: Option<i64>,
}

pub trait Templates {
    fn year_option(&self, ctx: &YearOption) -> String;
    fn dataset_option(&self, ctx: &DatasetOption) -> String;
    fn embed_code(&self, ctx: &EmbedCode) -> String;
    fn info_box(&self, ctx: &InfoBox) -> String;
    fn place_box(&self, ctx: &PlaceBox) -> String;
}

/// Plain HTML fragments.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTemplates;

impl Templates for HtmlTemplates {
    fn year_option(&self, ctx: &YearOption) -> String {
        format!(
            r#"<option value="{0}"{1}>{0}</option>"#,
            escape(&ctx.year),
            selected_attr(ctx.selected)
        )
    }

    fn dataset_option(&self, ctx: &DatasetOption) -> String {
        format!(
            r#"<option value="{}"{}>{}</option>"#,
            escape(&ctx.dataset_id),
            selected_attr(ctx.selected),
            escape(&ctx.dataset)
        )
    }

    fn embed_code(&self, ctx: &EmbedCode) -> String {
        let src = format!("{}/embed{}", ctx.base_url, ctx.state_params);
        format!(
            r#"<iframe src="{}" width="100%" height="360" frameborder="0"></iframe>"#,
            escape(&src)
        )
    }

    fn info_box(&self, ctx: &InfoBox) -> String {
        let mut html = format!(
            r#"<div class="odi-vis-info-content"><h3>{}</h3>{}"#,
            escape(&ctx.title),
            ctx.text
        );
        if !ctx.embed_code.is_empty() {
            html.push_str(&format!(
                r#"<textarea class="odi-vis-embed-code" readonly>{}</textarea>"#,
                escape(&ctx.embed_code)
            ));
        }
        html.push_str("</div>");
        html
    }

    fn place_box(&self, ctx: &PlaceBox) -> String {
        let number = |v: Option<i64>| v.map(|n| n.to_string()).unwrap_or_else(|| "n/a".into());
        let mut html = format!(
            r#"<h3><a href="/place/{}">{}</a></h3><p class="score">Score in {}: <strong>{}</strong></p><p class="rank">Rank: {}</p>"#,
            escape(&ctx.slug),
            escape(&ctx.name),
            escape(&ctx.year),
            number(ctx.score),
            number(ctx.rank)
        );
        if let Some(previous) = ctx.previous_score {
            html.push_str(&format!(
                r#"<p class="trend">This is {} {} last year.</p>"#,
                escape(&ctx.improvement_phrase),
                previous
            ));
        }
        html
    }
}

fn selected_attr(selected: bool) -> &'static str {
    if selected {
        " selected"
    } else {
        ""
    }
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Render markdown info text to HTML.
#[cfg(feature = "markdown")]
pub fn markdown(text: &str) -> String {
    let parser = pulldown_cmark::Parser::new(text);
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, parser);
    html
}

#[cfg(not(feature = "markdown"))]
pub fn markdown(text: &str) -> String {
    format!("<p>{}</p>", escape(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_option_selected() {
        let html = HtmlTemplates.year_option(&YearOption {
            year: "2014".into(),
            selected: true,
        });
        assert_eq!(html, r#"<option value="2014" selected>2014</option>"#);
    }

    #[test]
    fn test_dataset_option_escapes_title() {
        let html = HtmlTemplates.dataset_option(&DatasetOption {
            dataset_id: "budget".into(),
            dataset: "Budget <2014> & spending".into(),
            selected: false,
        });
        assert_eq!(
            html,
            r#"<option value="budget">Budget &lt;2014&gt; &amp; spending</option>"#
        );
    }

    #[test]
    fn test_embed_code_carries_state_params() {
        let html = HtmlTemplates.embed_code(&EmbedCode {
            base_url: "https://index.example".into(),
            state_params: "?panel_tools=false&panel_share=false".into(),
        });
        assert!(html.contains("https://index.example/embed?panel_tools=false&amp;panel_share=false"));
    }

    #[test]
    fn test_info_box_without_embed_code() {
        let html = HtmlTemplates.info_box(&InfoBox {
            title: "About".into(),
            text: "<p>hi</p>".into(),
            embed_code: String::new(),
        });
        assert!(html.contains("<h3>About</h3><p>hi</p>"));
        assert!(!html.contains("textarea"));
    }

    #[test]
    fn test_place_box_trend_only_with_previous_score() {
        let mut ctx = PlaceBox {
            year: "2014".into(),
            name: "United Kingdom".into(),
            slug: "gb".into(),
            score: Some(94),
            rank: Some(1),
            improvement_phrase: "an improvement on".into(),
            previous_score: None,
        };
        assert!(!HtmlTemplates.place_box(&ctx).contains("trend"));
        ctx.previous_score = Some(90);
        assert!(HtmlTemplates
            .place_box(&ctx)
            .contains("This is an improvement on 90 last year."));
    }

    #[cfg(feature = "markdown")]
    #[test]
    fn test_markdown_renders_emphasis() {
        assert_eq!(markdown("some **bold** text"), "<p>some <strong>bold</strong> text</p>\n");
    }
}
