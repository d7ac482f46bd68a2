// src/export/html.rs
use std::collections::HashMap;

use crate::template_processor::TemplateProcessor;
use crate::template_system::TemplateStyle;
use crate::utils::escape_html;

const DOCUMENT_SHELL: &str = r#"<!DOCTYPE html>
<html lang="fr">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{title}}</title>
<style>
{{style}}
</style>
</head>
<body>
<main class="letter">
{{content}}
</main>
</body>
</html>
"#;

const PRINT_CSS: &str = r#"@page { size: A4; margin: 20mm; }
* { box-sizing: border-box; }
body { margin: 0; background: #ffffff; }
.letter { max-width: 210mm; margin: 0 auto; padding: 20mm; }
.letter p { margin: 0 0 0.8em 0; }
.letter b, .letter strong { font-weight: bold; }
.letter i, .letter em { font-style: italic; }
.letter u { text-decoration: underline; }
.letter .align-left { text-align: left; }
.letter .align-center { text-align: center; }
.letter .align-right { text-align: right; }
.letter .align-justify { text-align: justify; }
.letter ul, .letter ol { margin: 0 0 0.8em 0; padding-left: 2em; }
.letter li { margin-bottom: 0.3em; }
.letter a { color: #1d4ed8; text-decoration: underline; }
.letter img { max-width: 100%; height: auto; }
@media print {
  .letter { padding: 0; max-width: none; }
  .letter a { color: inherit; }
}"#;

/// Wrap editor content in a standalone HTML document with print styles
pub fn render_standalone(content: &str, style: &TemplateStyle, title: &str) -> String {
    let css = format!(".letter {{ {} }}\n{}", style.to_css(), PRINT_CSS);

    let mut shell_vars = HashMap::new();
    shell_vars.insert("title".to_string(), escape_html(title));
    shell_vars.insert("style".to_string(), css);
    let shell = TemplateProcessor::process_variables(DOCUMENT_SHELL, &shell_vars);

    let mut content_vars = HashMap::new();
    content_vars.insert("content".to_string(), content.to_string());
    TemplateProcessor::process_variables(&shell, &content_vars)
}
